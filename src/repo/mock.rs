use crate::domain::PullRequest;
use crate::error::{NextVersionError, Result};
use crate::repo::PullRequestSource;
use std::cell::{Cell, RefCell};

/// A release recorded by [StubSource]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub base: String,
    pub tag_name: String,
    pub body: String,
    pub draft: bool,
}

/// In-memory pull-request source counting the calls it receives
///
/// Without an explicit recent page, `last_updated_pull_requests` returns the
/// full list ordered by descending `updated_at`. The base branch is ignored.
#[derive(Default)]
pub struct StubSource {
    pull_requests: RefCell<Vec<PullRequest>>,
    recent: RefCell<Option<Vec<PullRequest>>>,
    releases: RefCell<Vec<ReleaseRequest>>,
    failure: RefCell<Option<String>>,
    full_calls: Cell<usize>,
    recent_calls: Cell<usize>,
}

impl StubSource {
    pub fn new(pull_requests: Vec<PullRequest>) -> Self {
        StubSource {
            pull_requests: RefCell::new(pull_requests),
            ..StubSource::default()
        }
    }

    pub fn set_pull_requests(&self, pull_requests: Vec<PullRequest>) {
        *self.pull_requests.borrow_mut() = pull_requests;
    }

    pub fn set_recent(&self, recent: Vec<PullRequest>) {
        *self.recent.borrow_mut() = Some(recent);
    }

    /// Make every subsequent call fail with a remote error
    pub fn fail_with(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_string());
    }

    pub fn full_fetch_calls(&self) -> usize {
        self.full_calls.get()
    }

    pub fn recent_fetch_calls(&self) -> usize {
        self.recent_calls.get()
    }

    pub fn releases(&self) -> Vec<ReleaseRequest> {
        self.releases.borrow().clone()
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.borrow().as_ref() {
            Some(message) => Err(NextVersionError::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn select(prs: &[PullRequest], only_merged: bool) -> Vec<PullRequest> {
        prs.iter()
            .filter(|pr| !only_merged || pr.is_merged())
            .cloned()
            .collect()
    }
}

impl PullRequestSource for StubSource {
    fn pull_requests(&self, _base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        self.full_calls.set(self.full_calls.get() + 1);
        self.check_failure()?;
        Ok(Self::select(&self.pull_requests.borrow(), only_merged))
    }

    fn last_updated_pull_requests(
        &self,
        _base: &str,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        self.recent_calls.set(self.recent_calls.get() + 1);
        self.check_failure()?;
        if let Some(recent) = self.recent.borrow().as_ref() {
            return Ok(Self::select(recent, only_merged));
        }
        let mut prs = Self::select(&self.pull_requests.borrow(), only_merged);
        prs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(prs)
    }

    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()> {
        self.check_failure()?;
        self.releases.borrow_mut().push(ReleaseRequest {
            base: base.to_string(),
            tag_name: tag_name.to_string(),
            body: body.to_string(),
            draft,
        });
        Ok(())
    }
}
