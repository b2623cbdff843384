//! Pure formatting functions for UI output.
//!
//! `render_*` functions build strings and are testable; `display_*` functions
//! print with `console` styling.

use crate::analyzer::NextVersion;
use crate::boundary::BoundaryWarning;
use crate::config::ChangelogCategory;
use crate::domain::{Changelog, LabelSet, PullRequest, Segment};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// The next-version line: `old => new`, or only `new`.
pub fn render_next_version(next: &NextVersion, next_version_only: bool) -> String {
    if next_version_only {
        next.new_tag.clone()
    } else {
        format!("{} => {}", next.old_tag, next.new_tag)
    }
}

/// Release body: one `- title (#number)` line per pull request.
pub fn render_release_body(pull_requests: &[PullRequest]) -> String {
    pull_requests
        .iter()
        .map(|pr| format!("- {} (#{})\n", pr.title, pr.number))
        .collect()
}

fn render_pull_request_line(out: &mut String, pr: &PullRequest) {
    let reference = if pr.url.is_empty() {
        format!("#{}", pr.number)
    } else {
        format!("[#{}]({})", pr.number, pr.url)
    };
    out.push_str(&format!("- {} ({})", pr.title, reference));
    if !pr.author_login.is_empty() {
        out.push_str(&format!(" by @{}", pr.author_login));
    }
    out.push('\n');
}

fn render_section(out: &mut String, title: &str, pull_requests: &[&PullRequest]) {
    if pull_requests.is_empty() {
        return;
    }
    out.push_str(&format!("### {}\n\n", title));
    for pr in pull_requests {
        render_pull_request_line(out, pr);
    }
    out.push('\n');
}

fn render_segment(out: &mut String, segment: &Segment, categories: &[(String, LabelSet)]) {
    match &segment.boundary_tag {
        Some(tag) => {
            out.push_str(&format!("## {} ({})\n\n", tag.name, tag.time.format("%Y-%m-%d")));
        }
        None => out.push_str("## Unreleased\n\n"),
    }

    if segment.pull_requests.is_empty() {
        out.push_str("No pull request.\n\n");
        return;
    }

    let mut known = LabelSet::new();
    for (title, labels) in categories {
        render_section(out, title, &segment.with_any_label(labels));
        known = known.union(labels);
    }
    render_section(out, "Other", &segment.with_none_of_labels(&known));
}

/// Markdown changelog, newest release first.
///
/// The unreleased section is omitted when it holds no pull request.
pub fn render_changelog(changelog: &Changelog, categories: &[ChangelogCategory]) -> String {
    let categories: Vec<(String, LabelSet)> = categories
        .iter()
        .map(|c| (c.title.clone(), c.labels.iter().map(String::as_str).collect()))
        .collect();

    let mut out = String::from("# Changelog\n\n");
    for segment in changelog.reversed_segments() {
        if segment.is_future() && segment.pull_requests.is_empty() {
            continue;
        }
        render_segment(&mut out, segment, &categories);
    }
    out
}
