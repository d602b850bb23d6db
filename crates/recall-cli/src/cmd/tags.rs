//! `recall tags`: browse the hierarchical tags of the blog collection.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use recall_core::config::ProjectConfig;
use recall_core::content::{self, BlogEntry, BlogFrontmatter};
use recall_core::error::ErrorCode;
use recall_core::tags::{
    TagTreeNode, all_tags, build_tag_tree, posts_by_tag, root_tags, slug_to_tag, tag_to_slug,
};
use serde::Serialize;

use crate::cmd::content_root;
use crate::output::{CliError, OutputMode, pretty_section, render, render_error, render_mode};

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Content root holding `blog/` (defaults to `[catalog] content_dir`).
    #[arg(long, global = true, value_name = "DIR")]
    pub content: Option<PathBuf>,

    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagsCommand {
    #[command(about = "Show the tag hierarchy with per-post counts")]
    Tree,

    #[command(about = "List every tag, including implied parents")]
    List,

    #[command(about = "List top-level tags")]
    Roots,

    #[command(about = "List posts under a tag or any of its descendants")]
    Posts {
        /// Tag path, e.g. `개발/React`.
        tag: String,
    },

    #[command(about = "Encode a tag as a URL path")]
    Slug {
        tag: String,
    },

    #[command(about = "Decode a URL path back into a tag")]
    Unslug {
        slug: String,
    },
}

#[derive(Debug, Clone, Serialize)]
struct TagRow {
    tag: String,
    slug: String,
    count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct TaggedPost {
    slug: String,
    title: String,
    pub_date: DateTime<Utc>,
    tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct TagPosts {
    tag: String,
    slug: String,
    posts: Vec<TaggedPost>,
}

#[derive(Debug, Clone, Serialize)]
struct SlugPair {
    tag: String,
    slug: String,
}

/// Published blog posts under `root`.
fn load_posts(root: &Path) -> anyhow::Result<Vec<BlogEntry>> {
    let mut posts = content::load_collection::<BlogFrontmatter>(root, "blog")?;
    posts.retain(|post| !post.data.draft);
    Ok(posts)
}

fn tag_rows(tags: Vec<String>, tree: &TagTreeNode) -> Vec<TagRow> {
    tags.into_iter()
        .map(|tag| TagRow {
            slug: tag_to_slug(&tag),
            count: tree.get(&tag).map_or(0, |node| node.count),
            tag,
        })
        .collect()
}

fn write_rows(rows: &Vec<TagRow>, w: &mut dyn Write) -> io::Result<()> {
    for row in rows {
        writeln!(w, "{}\t{}\t{}", row.tag, row.count, row.slug)?;
    }
    Ok(())
}

fn write_tree(node: &TagTreeNode, depth: usize, w: &mut dyn Write) -> io::Result<()> {
    for (segment, child) in &node.children {
        writeln!(w, "{:indent$}{segment} ({})", "", child.count, indent = depth * 2)?;
        write_tree(child, depth + 1, w)?;
    }
    Ok(())
}

fn write_posts(found: &TagPosts, w: &mut dyn Write) -> io::Result<()> {
    for post in &found.posts {
        writeln!(
            w,
            "{}\t{}\t{}",
            post.pub_date.format("%Y-%m-%d"),
            post.slug,
            post.title
        )?;
    }
    Ok(())
}

fn tag_posts(posts: &[BlogEntry], tag: &str) -> TagPosts {
    let mut found: Vec<TaggedPost> = posts_by_tag(posts, tag)
        .into_iter()
        .map(|post| TaggedPost {
            slug: post.slug.clone(),
            title: post.data.title.clone(),
            pub_date: post.data.pub_date,
            tags: post.data.tags.clone(),
        })
        .collect();
    found.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    TagPosts {
        tag: tag.to_string(),
        slug: tag_to_slug(tag),
        posts: found,
    }
}

pub fn run_tags(
    args: &TagsArgs,
    output: OutputMode,
    config: &ProjectConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    match &args.command {
        TagsCommand::Slug { tag } => {
            let pair = SlugPair {
                slug: tag_to_slug(tag),
                tag: tag.clone(),
            };
            return render(output, &pair, |pair, w| writeln!(w, "{}", pair.slug));
        }
        TagsCommand::Unslug { slug } => {
            let tag = match slug_to_tag(slug) {
                Ok(tag) => tag,
                Err(err) => {
                    render_error(
                        output,
                        &CliError::with_code(err.to_string(), ErrorCode::InvalidTagSlug),
                    )?;
                    return Err(err.into());
                }
            };
            let pair = SlugPair {
                tag,
                slug: slug.clone(),
            };
            return render(output, &pair, |pair, w| writeln!(w, "{}", pair.tag));
        }
        TagsCommand::Tree | TagsCommand::List | TagsCommand::Roots | TagsCommand::Posts { .. } => {}
    }

    let root = content_root(args.content.as_deref(), config, project_root)?;
    let posts = match load_posts(&root) {
        Ok(posts) => posts,
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ContentParseError),
            )?;
            return Err(err);
        }
    };

    match &args.command {
        TagsCommand::Tree => {
            let tree = build_tag_tree(&posts);
            render_mode(
                output,
                &tree,
                |tree, w| write_tree(tree, 0, w),
                |tree, w| {
                    pretty_section(w, &format!("Tags across {} posts", posts.len()))?;
                    write_tree(tree, 0, w)
                },
            )
        }
        TagsCommand::List => {
            let rows = tag_rows(all_tags(&posts), &build_tag_tree(&posts));
            render(output, &rows, write_rows)
        }
        TagsCommand::Roots => {
            let rows = tag_rows(root_tags(&posts), &build_tag_tree(&posts));
            render(output, &rows, write_rows)
        }
        TagsCommand::Posts { tag } => {
            let found = tag_posts(&posts, tag);
            render_mode(output, &found, write_posts, |found, w| {
                pretty_section(w, &format!("{} ({} posts)", found.tag, found.posts.len()))?;
                write_posts(found, w)
            })
        }
        TagsCommand::Slug { .. } | TagsCommand::Unslug { .. } => Ok(()),
    }
}
