//! Repo collaborator: pull requests and releases of the hosting service
//!
//! - [github::GitHubClient]: the GitHub REST API through blocking `reqwest`
//! - [cache::PullRequestCache]: an on-disk snapshot cache decorating any source
//! - [mock::StubSource]: an in-memory source with call counters for tests

pub mod cache;
pub mod github;
pub mod mock;

pub use cache::{evaluate_snapshot, CacheDecision, CacheOptions, PullRequestCache, RefetchReason};
pub use github::GitHubClient;
pub use mock::{ReleaseRequest, StubSource};

use crate::domain::PullRequest;
use crate::error::Result;

/// Access to the pull requests of one repository
pub trait PullRequestSource {
    /// Every pull request targeting `base`: merged ones, plus still-open ones
    /// unless `only_merged` is set
    fn pull_requests(&self, base: &str, only_merged: bool) -> Result<Vec<PullRequest>>;

    /// A single bounded page of the most recently updated pull requests,
    /// ordered by descending `updated_at`
    fn last_updated_pull_requests(&self, base: &str, only_merged: bool)
        -> Result<Vec<PullRequest>>;

    /// Publish a release named `tag_name` on top of `base`
    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()>;
}

impl<T: PullRequestSource + ?Sized> PullRequestSource for &T {
    fn pull_requests(&self, base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        (**self).pull_requests(base, only_merged)
    }

    fn last_updated_pull_requests(
        &self,
        base: &str,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        (**self).last_updated_pull_requests(base, only_merged)
    }

    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()> {
        (**self).create_release(base, tag_name, body, draft)
    }
}

impl<T: PullRequestSource + ?Sized> PullRequestSource for Box<T> {
    fn pull_requests(&self, base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        (**self).pull_requests(base, only_merged)
    }

    fn last_updated_pull_requests(
        &self,
        base: &str,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        (**self).last_updated_pull_requests(base, only_merged)
    }

    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()> {
        (**self).create_release(base, tag_name, body, draft)
    }
}
