//! Review email rendering.

use std::fmt::Write as _;

use crate::leitner::next_review_days;
use crate::model::{BlogPost, PostReviewState};

/// Site details that appear in the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo<'a> {
    pub url: &'a str,
    pub name: &'a str,
}

#[must_use]
pub fn subject(post: &BlogPost) -> String {
    format!("복습할 시간: {}", post.title)
}

/// Link to the post on the live site.
#[must_use]
pub fn post_url(site_url: &str, slug: &str) -> String {
    format!("{}/blog/{slug}/", site_url.trim_end_matches('/'))
}

/// HTML body for `post` after it has been advanced to `state`.
#[must_use]
pub fn html(post: &BlogPost, state: &PostReviewState, site: &SiteInfo<'_>) -> String {
    let url = escape_html(&post_url(site.url, &post.slug));
    let next_days = next_review_days(state.review_box);

    let mut out = String::with_capacity(2048);
    out.push_str(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\" /></head>\n\
         <body style=\"margin:0;padding:0;background:#ffffff;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;\">\n\
         \x20 <div style=\"max-width:560px;margin:0 auto;padding:48px 24px;\">\n\n",
    );

    // `write!` into a String cannot fail.
    let _ = write!(
        out,
        "    <p style=\"font-size:12px;color:#a3a3a3;letter-spacing:2px;text-transform:uppercase;margin:0 0 40px;\">\n\
         \x20     {name} 블로그 복습\n\
         \x20   </p>\n\n\
         \x20   <p style=\"font-size:14px;color:#a3a3a3;margin:0 0 8px;\">오늘의 복습 글</p>\n\n\
         \x20   <h1 style=\"font-size:28px;font-weight:700;color:#000000;margin:0 0 12px;line-height:1.3;\">\n\
         \x20     {title}\n\
         \x20   </h1>\n\n\
         \x20   <p style=\"font-size:16px;color:#666666;line-height:1.6;margin:0 0 32px;\">\n\
         \x20     {description}\n\
         \x20   </p>\n\n\
         \x20   <a href=\"{url}\"\n\
         \x20      style=\"display:inline-block;padding:14px 28px;background:#FF4800;color:#ffffff;text-decoration:none;font-size:14px;font-weight:600;border-radius:4px;\">\n\
         \x20     다시 읽기\n\
         \x20   </a>\n\n\
         \x20   <hr style=\"border:none;border-top:1px solid #e4e4e4;margin:40px 0 20px;\" />\n\n\
         \x20   <p style=\"font-size:12px;color:#a3a3a3;margin:0;\">\n\
         \x20     Box {review_box} &middot; {times}회째 복습 &middot; 다음 복습: {next_days}일 후\n\
         \x20   </p>\n\n",
        name = escape_html(site.name),
        title = escape_html(&post.title),
        description = escape_html(&post.description),
        review_box = state.review_box,
        times = state.times_reviewed,
    );

    out.push_str("  </div>\n</body>\n</html>");
    out
}

/// Escape the characters that matter inside element text and quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewBox;
    use chrono::{TimeZone, Utc};

    fn fixture() -> (BlogPost, PostReviewState) {
        let post = BlogPost::new("rust/ownership", "Ownership <101>", "Borrow & move \"rules\"");
        let state = PostReviewState {
            slug: post.slug.clone(),
            title: post.title.clone(),
            review_box: ReviewBox::Two,
            last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date"),
            times_reviewed: 4,
        };
        (post, state)
    }

    const SITE: SiteInfo<'static> = SiteInfo {
        url: "https://blog.example.com/",
        name: "chan99k",
    };

    #[test]
    fn subject_names_the_post() {
        let (post, _) = fixture();
        assert_eq!(subject(&post), "복습할 시간: Ownership <101>");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain 한글"), "plain 한글");
    }

    #[test]
    fn body_escapes_post_fields_and_links_to_post() {
        let (post, state) = fixture();
        let body = html(&post, &state, &SITE);

        assert!(body.starts_with("<!doctype html>"));
        assert!(body.ends_with("</html>"));
        assert!(body.contains("Ownership &lt;101&gt;"));
        assert!(body.contains("Borrow &amp; move &quot;rules&quot;"));
        assert!(body.contains(r#"href="https://blog.example.com/blog/rust/ownership/""#));
        assert!(body.contains("chan99k 블로그 복습"));
        assert!(!body.contains("<101>"));
    }

    #[test]
    fn footer_reports_box_count_and_next_interval() {
        let (post, state) = fixture();
        let body = html(&post, &state, &SITE);
        assert!(body.contains("Box 2 &middot; 4회째 복습 &middot; 다음 복습: 7일 후"));
    }
}
