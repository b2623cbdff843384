use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Set of pull-request labels with plain membership semantics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    pub fn new() -> Self {
        LabelSet(BTreeSet::new())
    }

    /// Build a set from a comma separated list ("major, Type: Major").
    ///
    /// Items are trimmed and empty items are dropped.
    pub fn from_comma_separated(value: &str) -> Self {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.0.insert(label.into())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// True when the two sets share at least one label
    pub fn intersects(&self, other: &LabelSet) -> bool {
        let (small, large) = if self.0.len() <= other.0.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|label| large.contains(label))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn union(&self, other: &LabelSet) -> LabelSet {
        self.0.union(&other.0).cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        LabelSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Represents a pull request read from the code-hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Merge date; `None` while the pull request is still open
    pub merged_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub labels: LabelSet,
    pub url: String,
    pub author_login: String,
    pub author_url: String,
    pub branch: String,
}

impl PullRequest {
    /// Create a pull request with empty display fields
    pub fn new(
        number: u64,
        title: impl Into<String>,
        merged_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        PullRequest {
            number,
            title: title.into(),
            merged_at,
            updated_at,
            labels: LabelSet::new(),
            url: String::new(),
            author_login: String::new(),
            author_url: String::new(),
            branch: String::new(),
        }
    }

    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn has_any_label(&self, labels: &LabelSet) -> bool {
        self.labels.intersects(labels)
    }
}

/// Merge order: ascending merge date, still-open pull requests last.
pub fn merge_order(a: &PullRequest, b: &PullRequest) -> Ordering {
    match (a.merged_at, b.merged_at) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
