//! `recall run`: the daily review trigger.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use rand::{SeedableRng, rngs::StdRng};
use recall_core::catalog::{Catalog, CatalogEntry};
use recall_core::config::{EnvSource, ProjectConfig};
use recall_core::email;
use recall_core::error::ErrorCode;
use recall_core::notify::ResendDispatcher;
use recall_core::trigger::{RunMode, SkipReason, TriggerOutcome, run_daily_review};

use crate::cmd::{open_catalog, open_history, parse_instant};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Select and render today's email without sending it or writing history.
    #[arg(long)]
    pub dry_run: bool,

    /// Evaluate the schedule at this instant (RFC 3339) instead of now.
    #[arg(long, value_name = "RFC3339", value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,

    /// Seed the random choice among unseen posts.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Print the rendered HTML body after the summary (dry run only).
    #[arg(long, requires = "dry_run")]
    pub html: bool,
}

/// Run one review. Skips exit zero; hard failures are rendered and returned.
pub fn run_review(
    args: &RunArgs,
    output: OutputMode,
    config: &ProjectConfig,
    project_root: &Path,
    env: &dyn EnvSource,
) -> anyhow::Result<()> {
    let settings = config.review_settings(env);
    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Deliver
    };
    let now = args.now.unwrap_or_else(Utc::now);
    let mut rng = args
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    // An unresolvable catalog is reported by the trigger, after the mail
    // settings check, so unconfigured installs still skip quietly.
    let catalog = open_catalog(config, project_root, env).unwrap_or_else(|err| -> Box<dyn Catalog> {
        Box::new(UnresolvedCatalog {
            reason: format!("{err:#}"),
        })
    });
    let store = open_history(config, project_root, env);
    let dispatcher = ResendDispatcher::new(&config.mail.endpoint);

    let outcome = match run_daily_review(
        &settings,
        catalog.as_ref(),
        store.as_ref(),
        &dispatcher,
        &mut rng,
        now,
        mode,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err).context("review run failed");
        }
    };

    render_mode(output, &outcome, render_text, |outcome, w| {
        render_pretty(outcome, &settings.site_url, w)
    })?;

    if args.html {
        if let TriggerOutcome::Previewed { review } = &outcome {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{}", review.html)?;
        }
    }
    Ok(())
}

struct UnresolvedCatalog {
    reason: String,
}

impl Catalog for UnresolvedCatalog {
    fn entries(&self) -> anyhow::Result<Vec<CatalogEntry>> {
        anyhow::bail!("{}", self.reason)
    }
}

fn render_text(outcome: &TriggerOutcome, w: &mut dyn Write) -> io::Result<()> {
    match outcome {
        TriggerOutcome::Sent {
            review,
            delivery_id,
        } => writeln!(
            w,
            "sent\t{}\tbox={}\treviews={}\tnext={}d\tid={delivery_id}",
            review.slug, review.review_box, review.times_reviewed, review.next_review_days
        ),
        TriggerOutcome::Previewed { review } => writeln!(
            w,
            "dry-run\t{}\tbox={}\treviews={}\tnext={}d",
            review.slug, review.review_box, review.times_reviewed, review.next_review_days
        ),
        TriggerOutcome::Skipped { reason } => {
            write!(w, "skipped\t{}", reason.describe())?;
            if let SkipReason::ConfigurationMissing { missing } = reason {
                write!(w, "\tmissing={}", missing.join(","))?;
            }
            writeln!(w)
        }
    }
}

fn render_pretty(outcome: &TriggerOutcome, site_url: &str, w: &mut dyn Write) -> io::Result<()> {
    let review = match outcome {
        TriggerOutcome::Sent { review, .. } => {
            pretty_section(w, "Review email sent")?;
            review
        }
        TriggerOutcome::Previewed { review } => {
            pretty_section(w, "Dry run (nothing sent, history unchanged)")?;
            review
        }
        TriggerOutcome::Skipped { reason } => {
            pretty_section(w, "Review skipped")?;
            pretty_kv(w, "reason", reason.describe())?;
            if let SkipReason::ConfigurationMissing { missing } = reason {
                pretty_kv(w, "missing", missing.join(", "))?;
                if let Some(hint) = ErrorCode::ConfigurationMissing.hint() {
                    pretty_kv(w, "hint", hint)?;
                }
            }
            return Ok(());
        }
    };

    pretty_kv(w, "post", &review.title)?;
    pretty_kv(w, "subject", &review.subject)?;
    if !site_url.is_empty() {
        pretty_kv(w, "link", email::post_url(site_url, &review.slug))?;
    }
    pretty_kv(w, "box", review.review_box.to_string())?;
    pretty_kv(w, "reviews", review.times_reviewed.to_string())?;
    pretty_kv(w, "next", format!("in {} days", review.next_review_days))?;
    if let TriggerOutcome::Sent { delivery_id, .. } = outcome {
        pretty_kv(w, "delivery", delivery_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::{PostReviewState, ReviewBox};
    use recall_core::trigger::ReviewSelection;

    fn review() -> ReviewSelection {
        let last_seen = parse_instant("2024-06-01T00:00:00Z").expect("instant");
        ReviewSelection {
            slug: "rust/ownership".to_string(),
            title: "Ownership".to_string(),
            review_box: ReviewBox::Two,
            times_reviewed: 2,
            next_review_days: 7,
            subject: "복습할 시간: Ownership".to_string(),
            html: "<html></html>".to_string(),
            state: PostReviewState {
                slug: "rust/ownership".to_string(),
                title: "Ownership".to_string(),
                review_box: ReviewBox::Two,
                last_seen,
                times_reviewed: 2,
            },
        }
    }

    fn text(outcome: &TriggerOutcome) -> String {
        let mut buf = Vec::new();
        render_text(outcome, &mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    fn pretty(outcome: &TriggerOutcome) -> String {
        let mut buf = Vec::new();
        render_pretty(outcome, "https://blog.example.com", &mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn sent_text_row() {
        let outcome = TriggerOutcome::Sent {
            review: review(),
            delivery_id: "abc".to_string(),
        };
        assert_eq!(
            text(&outcome),
            "sent\trust/ownership\tbox=2\treviews=2\tnext=7d\tid=abc\n"
        );
    }

    #[test]
    fn skipped_text_lists_missing_settings() {
        let outcome = TriggerOutcome::Skipped {
            reason: SkipReason::ConfigurationMissing {
                missing: vec!["RESEND_API_KEY", "REVIEW_EMAIL_TO"],
            },
        };
        assert_eq!(
            text(&outcome),
            "skipped\tmail settings are not configured\tmissing=RESEND_API_KEY,REVIEW_EMAIL_TO\n"
        );
    }

    #[test]
    fn pretty_preview_links_to_the_post() {
        let out = pretty(&TriggerOutcome::Previewed { review: review() });
        assert!(out.starts_with("Dry run"));
        assert!(out.contains("https://blog.example.com/blog/rust/ownership/"));
        assert!(out.contains("in 7 days"));
        assert!(!out.contains("delivery"));
    }

    #[test]
    fn pretty_skip_shows_hint_for_missing_settings() {
        let out = pretty(&TriggerOutcome::Skipped {
            reason: SkipReason::ConfigurationMissing {
                missing: vec!["RESEND_API_KEY"],
            },
        });
        assert!(out.contains("RESEND_API_KEY"));
        assert!(out.contains("hint:"));
    }
}
