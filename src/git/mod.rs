//! Git collaborator
//!
//! The [TagSource] trait is everything the rest of the crate needs from a
//! local repository: the tags reachable from a branch, a guess of the default
//! branch and a guess of the hosting-service identity. Implementations:
//!
//! - [repository::Git2Repository]: a real repository read through `git2`
//! - [mock::MockRepository]: an in-memory implementation for tests
//!
//! ```rust
//! # use git_next_version::git::TagSource;
//! # fn example<G: TagSource>(git: &G) -> git_next_version::Result<()> {
//! let branch = git.guess_default_branch();
//! let tags = git.contained_tags(branch.as_deref())?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Tag;
use crate::error::Result;

/// Read access to the tags of a repository
pub trait TagSource {
    /// Tags whose commit is reachable from `branch`, or every tag of the
    /// repository when `branch` is `None`. No particular order.
    fn contained_tags(&self, branch: Option<&str>) -> Result<Vec<Tag>>;

    /// Default branch of the remote, `None` when it can't be determined
    fn guess_default_branch(&self) -> Option<String>;

    /// `(owner, name)` read from the remote URL, `None` when it is not a
    /// recognizable GitHub URL
    fn guess_repo_identity(&self) -> Option<(String, String)>;
}

/// Extract `(owner, name)` from a GitHub remote URL.
///
/// Accepts `git@github.com:owner/name.git` and
/// `https://[user@]github.com/owner/name[.git]`.
pub fn parse_github_remote_url(url: &str) -> Option<(String, String)> {
    let url = url.trim();
    let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
        rest.strip_suffix(".git")?
    } else if let Some(rest) = url.strip_prefix("https://") {
        let (_, path) = rest.split_once("github.com/")?;
        path.strip_suffix(".git").unwrap_or(path)
    } else {
        return None;
    };

    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some((owner.to_string(), name.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(owner: &str, name: &str) -> Option<(String, String)> {
        Some((owner.to_string(), name.to_string()))
    }

    #[test]
    fn test_parse_ssh_url() {
        assert_eq!(
            parse_github_remote_url("git@github.com:fabien-marty/github-next-semantic-version.git"),
            pair("fabien-marty", "github-next-semantic-version")
        );
        assert_eq!(
            parse_github_remote_url("git@github.com:fabien-martygithub-next-semantic-version.git"),
            None
        );
        assert_eq!(parse_github_remote_url("git@github.com:owner/repo"), None);
    }

    #[test]
    fn test_parse_https_url() {
        assert_eq!(
            parse_github_remote_url("https://github.com/owner/repo.git"),
            pair("owner", "repo")
        );
        assert_eq!(
            parse_github_remote_url("https://foo@github.com/owner/repo.git"),
            pair("owner", "repo")
        );
        assert_eq!(
            parse_github_remote_url("https://github.com/owner/repo"),
            pair("owner", "repo")
        );
        assert_eq!(parse_github_remote_url("https://gitlab.com/owner/repo.git"), None);
        assert_eq!(parse_github_remote_url("https://github.com/owner/repo/extra.git"), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_github_remote_url("foobar"), None);
        assert_eq!(parse_github_remote_url(""), None);
    }
}
