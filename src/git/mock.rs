use crate::domain::Tag;
use crate::error::{NextVersionError, Result};
use crate::git::TagSource;
use chrono::{DateTime, Utc};
use std::cell::Cell;

/// Mock repository for testing without actual git operations
///
/// A tag registered without branches is reachable from every branch.
pub struct MockRepository {
    tags: Vec<(Tag, Vec<String>)>,
    default_branch: Option<String>,
    identity: Option<(String, String)>,
    failure: Option<String>,
    calls: Cell<usize>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            tags: Vec::new(),
            default_branch: Some("main".to_string()),
            identity: None,
            failure: None,
            calls: Cell::new(0),
        }
    }

    /// Add a tag reachable from every branch
    pub fn add_tag(&mut self, name: &str, time: DateTime<Utc>) {
        self.tags.push((Tag::new(name, time), Vec::new()));
    }

    /// Add a tag reachable from the given branches only
    pub fn add_branch_tag(&mut self, name: &str, time: DateTime<Utc>, branches: &[&str]) {
        let branches = branches.iter().map(|b| b.to_string()).collect();
        self.tags.push((Tag::new(name, time), branches));
    }

    pub fn set_default_branch(&mut self, branch: Option<&str>) {
        self.default_branch = branch.map(str::to_string);
    }

    pub fn set_identity(&mut self, owner: &str, name: &str) {
        self.identity = Some((owner.to_string(), name.to_string()));
    }

    /// Make every `contained_tags` call fail with a remote error
    pub fn fail_with(&mut self, message: &str) {
        self.failure = Some(message.to_string());
    }

    /// Number of `contained_tags` calls so far
    pub fn contained_tags_calls(&self) -> usize {
        self.calls.get()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TagSource for MockRepository {
    fn contained_tags(&self, branch: Option<&str>) -> Result<Vec<Tag>> {
        self.calls.set(self.calls.get() + 1);
        if let Some(message) = &self.failure {
            return Err(NextVersionError::remote(message.clone()));
        }

        Ok(self
            .tags
            .iter()
            .filter(|(_, branches)| match branch {
                None => true,
                Some(b) => branches.is_empty() || branches.iter().any(|x| x == b),
            })
            .map(|(tag, _)| tag.clone())
            .collect())
    }

    fn guess_default_branch(&self) -> Option<String> {
        self.default_branch.clone()
    }

    fn guess_repo_identity(&self) -> Option<(String, String)> {
        self.identity.clone()
    }
}
