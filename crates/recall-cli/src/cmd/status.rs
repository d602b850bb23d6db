//! `recall status`: where every post sits in the schedule.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use recall_core::catalog;
use recall_core::config::{EnvSource, ProjectConfig};
use recall_core::leitner::{due_at, is_due_for_review};
use recall_core::model::{BlogPost, ReviewBox, ReviewHistory};
use serde::Serialize;

use crate::cmd::{open_catalog, open_history, parse_instant};
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Only list posts that could be picked today.
    #[arg(long)]
    pub due: bool,

    /// Evaluate due dates at this instant (RFC 3339) instead of now.
    #[arg(long, value_name = "RFC3339", value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Standing {
    Unseen,
    Due,
    Waiting,
}

impl Standing {
    const fn label(self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Due => "due",
            Self::Waiting => "waiting",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct PostStatus {
    slug: String,
    title: String,
    standing: Standing,
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    review_box: Option<ReviewBox>,
    times_reviewed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
struct StatusReport {
    now: DateTime<Utc>,
    total: usize,
    unseen: usize,
    due: usize,
    waiting: usize,
    posts: Vec<PostStatus>,
}

fn build_report(posts: &[BlogPost], history: &ReviewHistory, now: DateTime<Utc>) -> StatusReport {
    let rows: Vec<PostStatus> = posts
        .iter()
        .map(|post| match history.get(&post.slug) {
            None => PostStatus {
                slug: post.slug.clone(),
                title: post.title.clone(),
                standing: Standing::Unseen,
                review_box: None,
                times_reviewed: 0,
                last_seen: None,
                due_at: None,
            },
            Some(state) => PostStatus {
                slug: post.slug.clone(),
                title: post.title.clone(),
                standing: if is_due_for_review(state, now) {
                    Standing::Due
                } else {
                    Standing::Waiting
                },
                review_box: Some(state.review_box),
                times_reviewed: state.times_reviewed,
                last_seen: Some(state.last_seen),
                due_at: Some(due_at(state)),
            },
        })
        .collect();

    let count = |standing| rows.iter().filter(|row| row.standing == standing).count();
    StatusReport {
        now,
        total: rows.len(),
        unseen: count(Standing::Unseen),
        due: count(Standing::Due),
        waiting: count(Standing::Waiting),
        posts: rows,
    }
}

fn short_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |ts| ts.format("%Y-%m-%d %H:%M").to_string())
}

fn render_text(report: &StatusReport, w: &mut dyn Write) -> io::Result<()> {
    for row in &report.posts {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            row.standing.label(),
            row.review_box.map_or_else(|| "-".to_string(), |b| b.to_string()),
            row.times_reviewed,
            row.due_at
                .map_or_else(|| "-".to_string(), |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            row.slug
        )?;
    }
    Ok(())
}

fn render_pretty(report: &StatusReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{} posts: {} unseen, {} due, {} waiting",
            report.total, report.unseen, report.due, report.waiting
        ),
    )?;
    writeln!(
        w,
        "{:<8} {:>3} {:>7}  {:<16}  {:<16}  SLUG",
        "STATE", "BOX", "REVIEWS", "LAST SEEN", "DUE AT"
    )?;
    for row in &report.posts {
        writeln!(
            w,
            "{:<8} {:>3} {:>7}  {:<16}  {:<16}  {}",
            row.standing.label(),
            row.review_box.map_or_else(|| "-".to_string(), |b| b.to_string()),
            row.times_reviewed,
            short_date(row.last_seen),
            short_date(row.due_at),
            row.slug
        )?;
    }
    pretty_rule(w)
}

pub fn run_status(
    args: &StatusArgs,
    output: OutputMode,
    config: &ProjectConfig,
    project_root: &Path,
    env: &dyn EnvSource,
) -> anyhow::Result<()> {
    let entries = open_catalog(config, project_root, env)?.entries()?;
    let posts = catalog::blog_posts(&entries);
    let history = open_history(config, project_root, env).load()?;

    let mut report = build_report(&posts, &history, args.now.unwrap_or_else(Utc::now));
    if args.due {
        report.posts.retain(|row| row.standing != Standing::Waiting);
    }

    render_mode(output, &report, render_text, render_pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use recall_core::model::PostReviewState;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn fixture() -> (Vec<BlogPost>, ReviewHistory) {
        let posts = vec![
            BlogPost::new("fresh", "Fresh", "d"),
            BlogPost::new("due", "Due", "d"),
            BlogPost::new("later", "Later", "d"),
        ];
        let mut history = ReviewHistory::new();
        history.insert(
            "due".to_string(),
            PostReviewState {
                slug: "due".to_string(),
                title: "Due".to_string(),
                review_box: ReviewBox::Two,
                last_seen: now() - Duration::days(3),
                times_reviewed: 2,
            },
        );
        history.insert(
            "later".to_string(),
            PostReviewState {
                slug: "later".to_string(),
                title: "Later".to_string(),
                review_box: ReviewBox::Three,
                last_seen: now() - Duration::days(6),
                times_reviewed: 5,
            },
        );
        (posts, history)
    }

    #[test]
    fn classifies_each_post() {
        let (posts, history) = fixture();
        let report = build_report(&posts, &history, now());
        let standings: Vec<_> = report.posts.iter().map(|row| row.standing).collect();
        assert_eq!(
            standings,
            vec![Standing::Unseen, Standing::Due, Standing::Waiting]
        );
        assert_eq!((report.unseen, report.due, report.waiting), (1, 1, 1));
        assert_eq!(report.posts[2].due_at, Some(now() + Duration::days(1)));
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let (posts, history) = fixture();
        let report = build_report(&posts, &history, now());
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        let out = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "unseen\t-\t0\t-\tfresh");
        assert_eq!(lines[1], "due\t2\t2\t2024-06-15T12:00:00Z\tdue");
    }

    #[test]
    fn json_omits_schedule_fields_for_unseen_posts() {
        let (posts, history) = fixture();
        let report = build_report(&posts, &history, now());
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["posts"][0]["standing"], "unseen");
        assert!(value["posts"][0].get("box").is_none());
        assert_eq!(value["posts"][1]["box"], 2);
    }
}
