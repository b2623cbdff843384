//! Partitioning of pull requests into tag-bounded segments
//!
//! Each tag closes a segment holding the pull requests merged after the
//! previous tag and up to this one. An optional trailing "future" segment
//! (no boundary tag) collects everything merged after the last tag plus the
//! pull requests that are still open.
//!
//! Lightweight tags often carry a commit time a few seconds earlier than the
//! merge time of the pull requests they were meant to release. The
//! `minimal_delay_seconds` slack attributes a pull request merged within that
//! many seconds after a tag to the older side of the boundary.

use crate::domain::pull_request::{merge_order, LabelSet, PullRequest};
use crate::domain::tag::Tag;
use chrono::Duration;

/// Configuration of the segment builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentConfig {
    pub minimal_delay_seconds: u32,
    pub include_future: bool,
}

/// Pull requests attached to one tag, or to the unreleased future
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Closing tag; `None` designates the future segment
    pub boundary_tag: Option<Tag>,
    /// Ascending merge order, still-open pull requests last
    pub pull_requests: Vec<PullRequest>,
}

impl Segment {
    pub fn is_future(&self) -> bool {
        self.boundary_tag.is_none()
    }

    /// Pull requests carrying at least one of `labels`
    pub fn with_any_label(&self, labels: &LabelSet) -> Vec<&PullRequest> {
        self.pull_requests
            .iter()
            .filter(|pr| pr.has_any_label(labels))
            .collect()
    }

    /// Pull requests carrying none of `labels`
    pub fn with_none_of_labels(&self, labels: &LabelSet) -> Vec<&PullRequest> {
        self.pull_requests
            .iter()
            .filter(|pr| !pr.has_any_label(labels))
            .collect()
    }
}

/// Ordered list of segments, oldest first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Changelog {
    pub segments: Vec<Segment>,
}

impl Changelog {
    /// Segments newest first
    pub fn reversed_segments(&self) -> Vec<&Segment> {
        self.segments.iter().rev().collect()
    }

    /// Pull requests of the future segment, if there is one
    pub fn future_pull_requests(&self) -> Option<&[PullRequest]> {
        self.segments
            .iter()
            .find(|segment| segment.is_future())
            .map(|segment| segment.pull_requests.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Builds a [Changelog] from ascending tags and pull requests
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentBuilder {
    config: SegmentConfig,
}

impl SegmentBuilder {
    pub fn new(config: SegmentConfig) -> Self {
        SegmentBuilder { config }
    }

    /// Partition `pull_requests` into one segment per tag (same order as
    /// `tags`) plus the future segment when enabled.
    ///
    /// `tags` must already be filtered and sorted ascending.
    pub fn build(&self, tags: &[Tag], pull_requests: &[PullRequest]) -> Changelog {
        let mut ordered: Vec<&PullRequest> = pull_requests.iter().collect();
        ordered.sort_by(|a, b| merge_order(a, b));

        let mut boundaries: Vec<Option<&Tag>> = tags.iter().map(Some).collect();
        if self.config.include_future {
            boundaries.push(None);
        }

        let delay = Duration::seconds(i64::from(self.config.minimal_delay_seconds));
        let mut segments = Vec::with_capacity(boundaries.len());
        let mut previous: Option<&Tag> = None;

        for boundary in boundaries {
            let pull_requests: Vec<PullRequest> = ordered
                .iter()
                .filter(|pr| is_included(pr, previous, boundary, delay))
                .map(|pr| (*pr).clone())
                .collect();

            tracing::debug!(
                tag = boundary.map(|t| t.name.as_str()).unwrap_or("<future>"),
                count = pull_requests.len(),
                "segment built"
            );

            segments.push(Segment {
                boundary_tag: boundary.cloned(),
                pull_requests,
            });
            previous = boundary;
        }

        Changelog { segments }
    }
}

/// True when `pr` belongs to the segment opened by `previous` and closed by
/// `boundary` (`None` = future).
///
/// Open pull requests only ever land in the future segment.
pub fn is_included(
    pr: &PullRequest,
    previous: Option<&Tag>,
    boundary: Option<&Tag>,
    delay: Duration,
) -> bool {
    let merged_at = match pr.merged_at {
        Some(merged_at) => merged_at,
        None => return boundary.is_none(),
    };
    // a bound past the representable range lies after every merge time
    if let Some(previous) = previous {
        match previous.time.checked_add_signed(delay) {
            Some(start) if merged_at >= start => {}
            _ => return false,
        }
    }
    if let Some(boundary) = boundary {
        if let Some(end) = boundary.time.checked_add_signed(delay) {
            if end < merged_at {
                return false;
            }
        }
    }
    true
}
