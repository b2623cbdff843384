use crate::domain::Tag;
use crate::error::{NextVersionError, Result};
use crate::git::{parse_github_remote_url, TagSource};
use chrono::{DateTime, Utc};
use git2::{Oid, Repository as Git2Repo};
use std::path::Path;

/// Wrapper around git2::Repository implementing [TagSource]
pub struct Git2Repository {
    repo: Git2Repo,
    remote: String,
}

impl Git2Repository {
    /// Open or discover a git repository; `remote` names the remote used for
    /// branch lookups and identity guessing (usually "origin")
    pub fn open<P: AsRef<Path>>(path: P, remote: impl Into<String>) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository {
            repo,
            remote: remote.into(),
        })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo, remote: impl Into<String>) -> Self {
        Git2Repository {
            repo,
            remote: remote.into(),
        }
    }

    /// Tip of `branch`, preferring the remote-tracking reference
    fn branch_tip(&self, branch: &str) -> Result<Oid> {
        let remote_ref = format!("refs/remotes/{}/{}", self.remote, branch);
        if let Ok(oid) = self.repo.refname_to_id(&remote_ref) {
            return Ok(oid);
        }
        tracing::debug!(reference = %remote_ref, "no remote-tracking branch, trying the local one");

        let local_ref = format!("refs/heads/{}", branch);
        self.repo.refname_to_id(&local_ref).map_err(|e| {
            NextVersionError::remote(format!("Cannot find branch '{}': {}", branch, e.message()))
        })
    }

    fn commit_time(commit: &git2::Commit<'_>) -> Result<DateTime<Utc>> {
        let seconds = commit.committer().when().seconds();
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
            NextVersionError::remote(format!(
                "Commit {} has an invalid time ({})",
                commit.id(),
                seconds
            ))
        })
    }
}

impl TagSource for Git2Repository {
    fn contained_tags(&self, branch: Option<&str>) -> Result<Vec<Tag>> {
        let tip = branch.map(|b| self.branch_tip(b)).transpose()?;
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            let commit = match reference.peel_to_commit() {
                Ok(commit) => commit,
                Err(e) => {
                    tracing::debug!(tag = name, error = %e.message(), "tag does not point to a commit => ignoring");
                    continue;
                }
            };

            if let Some(tip) = tip {
                let reachable =
                    commit.id() == tip || self.repo.graph_descendant_of(tip, commit.id())?;
                if !reachable {
                    tracing::debug!(tag = name, "tag not reachable from branch => ignoring");
                    continue;
                }
            }

            tags.push(Tag::new(name, Self::commit_time(&commit)?));
        }

        tracing::debug!(branch = branch.unwrap_or("<all>"), count = tags.len(), "tags read");
        Ok(tags)
    }

    fn guess_default_branch(&self) -> Option<String> {
        let remote_head = format!("refs/remotes/{}/HEAD", self.remote);
        let remote_prefix = format!("refs/remotes/{}/", self.remote);
        if let Ok(reference) = self.repo.find_reference(&remote_head) {
            if let Some(target) = reference.symbolic_target() {
                if let Some(branch) = target.strip_prefix(&remote_prefix) {
                    return Some(branch.to_string());
                }
            }
        }

        let head = self.repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(str::to_string)
        } else {
            None
        }
    }

    fn guess_repo_identity(&self) -> Option<(String, String)> {
        let remote = self.repo.find_remote(&self.remote).ok()?;
        let url = remote.url()?;
        let identity = parse_github_remote_url(url);
        if identity.is_none() {
            tracing::debug!(remote = %self.remote, url, "remote URL is not a GitHub URL");
        }
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{RepositoryInitOptions, Signature, Time};
    use tempfile::TempDir;

    fn init() -> (TempDir, Git2Repo) {
        let dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Git2Repo::init_opts(dir.path(), &opts).unwrap();
        (dir, repo)
    }

    fn commit(repo: &Git2Repo, update_ref: Option<&str>, secs: i64, parents: &[Oid]) -> Oid {
        let sig = Signature::new("Test", "test@example.com", &Time::new(secs, 0)).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> =
            parents.iter().map(|oid| repo.find_commit(*oid).unwrap()).collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(update_ref, &sig, &sig, "commit", &tree, &parent_refs)
            .unwrap()
    }

    fn tag(repo: &Git2Repo, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn names(mut tags: Vec<Tag>) -> Vec<String> {
        tags.sort();
        tags.into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_contained_tags_follow_branch() {
        let (_dir, repo) = init();
        let c1 = commit(&repo, Some("HEAD"), 1_000, &[]);
        let c2 = commit(&repo, Some("HEAD"), 2_000, &[c1]);
        let side = commit(&repo, None, 3_000, &[c1]);
        tag(&repo, "v1.0.0", c1);
        tag(&repo, "v1.1.0", c2);
        tag(&repo, "v9.0.0", side);

        let git = Git2Repository::from_git2(repo, "origin");

        assert_eq!(names(git.contained_tags(Some("main")).unwrap()), vec!["v1.0.0", "v1.1.0"]);
        assert_eq!(
            names(git.contained_tags(None).unwrap()),
            vec!["v1.0.0", "v1.1.0", "v9.0.0"]
        );
    }

    #[test]
    fn test_tag_time_is_commit_time() {
        let (_dir, repo) = init();
        let c1 = commit(&repo, Some("HEAD"), 1_700_000_000, &[]);
        tag(&repo, "v1.0.0", c1);

        {
            let sig =
                Signature::new("Test", "test@example.com", &Time::new(1_800_000_000, 0)).unwrap();
            let object = repo.find_object(c1, None).unwrap();
            repo.tag("v1.0.1", &object, &sig, "annotated", false).unwrap();
        }

        let git = Git2Repository::from_git2(repo, "origin");
        let tags = git.contained_tags(Some("main")).unwrap();
        assert_eq!(tags.len(), 2);
        for tag in tags {
            assert_eq!(tag.time.timestamp(), 1_700_000_000, "tag {}", tag.name);
        }
    }

    #[test]
    fn test_remote_tracking_branch_is_preferred() {
        let (_dir, repo) = init();
        let c1 = commit(&repo, Some("HEAD"), 1_000, &[]);
        let c2 = commit(&repo, Some("HEAD"), 2_000, &[c1]);
        tag(&repo, "v1.0.0", c1);
        tag(&repo, "v1.1.0", c2);
        repo.reference("refs/remotes/origin/main", c1, true, "test").unwrap();

        let git = Git2Repository::from_git2(repo, "origin");
        assert_eq!(names(git.contained_tags(Some("main")).unwrap()), vec!["v1.0.0"]);
    }

    #[test]
    fn test_unknown_branch_is_an_error() {
        let (_dir, repo) = init();
        commit(&repo, Some("HEAD"), 1_000, &[]);
        let git = Git2Repository::from_git2(repo, "origin");

        let err = git.contained_tags(Some("nope")).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_guess_default_branch() {
        let (_dir, repo) = init();
        commit(&repo, Some("HEAD"), 1_000, &[]);
        let git = Git2Repository::from_git2(repo, "origin");
        assert_eq!(git.guess_default_branch().as_deref(), Some("main"));

        let (_dir, repo) = init();
        let c1 = commit(&repo, Some("HEAD"), 1_000, &[]);
        repo.reference("refs/remotes/origin/develop", c1, true, "test").unwrap();
        repo.reference_symbolic(
            "refs/remotes/origin/HEAD",
            "refs/remotes/origin/develop",
            true,
            "test",
        )
        .unwrap();
        let git = Git2Repository::from_git2(repo, "origin");
        assert_eq!(git.guess_default_branch().as_deref(), Some("develop"));
    }

    #[test]
    fn test_guess_repo_identity() {
        let (_dir, repo) = init();
        repo.remote("origin", "git@github.com:octo/widgets.git").unwrap();
        repo.remote("mirror", "https://example.com/octo/widgets.git").unwrap();

        let git = Git2Repository::from_git2(repo, "origin");
        assert_eq!(
            git.guess_repo_identity(),
            Some(("octo".to_string(), "widgets".to_string()))
        );

        let (_dir, repo) = init();
        repo.remote("mirror", "https://example.com/octo/widgets.git").unwrap();
        let git = Git2Repository::from_git2(repo, "mirror");
        assert_eq!(git.guess_repo_identity(), None);
    }
}
