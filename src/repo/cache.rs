//! On-disk snapshot cache for pull-request lists
//!
//! One snapshot file per `(owner, repo, base, only_merged)` selector, named
//! after the SHA-256 of the selector and holding a `bincode` encoded list.
//! The file modification time is the TTL anchor.
//!
//! On a hit, a single page of recently updated pull requests is fetched. If the
//! least recently updated entry of that page is cached with the same
//! `updated_at`, nothing older can have changed and the page is merged into the
//! snapshot. Otherwise the full list is fetched again.
//!
//! Snapshot I/O failures never surface: they are logged and the cache behaves
//! as a miss. Concurrent processes sharing a cache directory are not
//! synchronized.

use crate::boundary::BoundaryWarning;
use crate::domain::PullRequest;
use crate::error::Result;
use crate::repo::PullRequestSource;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Bumped whenever the snapshot encoding changes
pub const CACHE_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_CACHE_LIFETIME_SECONDS: i64 = 3600;

/// User-facing cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Snapshot directory; `None` or empty means the current directory
    pub location: Option<PathBuf>,
    /// Snapshot lifetime; values `<= 0` fall back to one hour
    pub lifetime_seconds: i64,
    /// Trust a fresh snapshot without checking recently updated PRs
    pub dont_try_to_update: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            location: None,
            lifetime_seconds: DEFAULT_CACHE_LIFETIME_SECONDS,
            dont_try_to_update: false,
        }
    }
}

/// Why a snapshot can't be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchReason {
    EmptyCachedSet,
    EmptyRecentSet,
    /// The watermark pull request is absent from the snapshot
    WatermarkNotCached,
    /// The watermark pull request was updated since the snapshot was taken
    WatermarkChanged,
}

impl fmt::Display for RefetchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefetchReason::EmptyCachedSet => write!(f, "cached set is empty"),
            RefetchReason::EmptyRecentSet => write!(f, "recent set is empty"),
            RefetchReason::WatermarkNotCached => write!(f, "watermark not found in cache"),
            RefetchReason::WatermarkChanged => write!(f, "watermark updated since snapshot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    UseCachedSnapshot,
    Refetch(RefetchReason),
}

/// Decide whether `cached` is still valid given the `recent` page.
pub fn evaluate_snapshot(cached: &[PullRequest], recent: &[PullRequest]) -> CacheDecision {
    if cached.is_empty() {
        return CacheDecision::Refetch(RefetchReason::EmptyCachedSet);
    }
    let watermark = match recent.iter().min_by_key(|pr| pr.updated_at) {
        Some(watermark) => watermark,
        None => return CacheDecision::Refetch(RefetchReason::EmptyRecentSet),
    };

    match cached.iter().find(|pr| pr.number == watermark.number) {
        None => CacheDecision::Refetch(RefetchReason::WatermarkNotCached),
        Some(pr) if pr.updated_at != watermark.updated_at => {
            CacheDecision::Refetch(RefetchReason::WatermarkChanged)
        }
        Some(_) => CacheDecision::UseCachedSnapshot,
    }
}

/// `recent` followed by the cached entries it doesn't supersede
pub fn merge_snapshot(cached: Vec<PullRequest>, recent: Vec<PullRequest>) -> Vec<PullRequest> {
    let mut seen: HashSet<u64> = HashSet::with_capacity(recent.len());
    let mut merged = Vec::with_capacity(cached.len() + recent.len());
    for pr in recent.into_iter().chain(cached) {
        if seen.insert(pr.number) {
            merged.push(pr);
        }
    }
    merged
}

/// [PullRequestSource] decorator keeping snapshots on disk
pub struct PullRequestCache<S> {
    upstream: S,
    owner: String,
    name: String,
    directory: Option<PathBuf>,
    lifetime: Duration,
    dont_try_to_update: bool,
    warning: Option<BoundaryWarning>,
}

impl<S: PullRequestSource> PullRequestCache<S> {
    pub fn new(
        upstream: S,
        owner: impl Into<String>,
        name: impl Into<String>,
        options: CacheOptions,
    ) -> Self {
        let (directory, warning) = match resolve_directory(options.location.as_deref()) {
            Ok(directory) => (Some(directory), None),
            Err(warning) => {
                tracing::warn!(%warning, "cache disabled");
                (None, Some(warning))
            }
        };
        let lifetime_seconds = if options.lifetime_seconds <= 0 {
            DEFAULT_CACHE_LIFETIME_SECONDS
        } else {
            options.lifetime_seconds
        };

        PullRequestCache {
            upstream,
            owner: owner.into(),
            name: name.into(),
            directory,
            lifetime: Duration::from_secs(lifetime_seconds.unsigned_abs()),
            dont_try_to_update: options.dont_try_to_update,
            warning,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.directory.is_some()
    }

    /// Set when the configured location was unusable
    pub fn warning(&self) -> Option<&BoundaryWarning> {
        self.warning.as_ref()
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn upstream(&self) -> &S {
        &self.upstream
    }

    /// Snapshot file of a selector, `None` when caching is disabled
    pub fn snapshot_path(&self, base: &str, only_merged: bool) -> Option<PathBuf> {
        let directory = self.directory.as_ref()?;
        let key = format!(
            "{}-{}/{}-{}-{}",
            CACHE_SCHEMA_VERSION, self.owner, self.name, base, only_merged
        );
        let digest = Sha256::digest(key.as_bytes());
        Some(directory.join(format!("{}.cache", hex::encode(digest))))
    }

    fn read_snapshot(&self, path: &Path) -> Option<Vec<PullRequest>> {
        let metadata = fs::metadata(path).ok()?;
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        if age > self.lifetime {
            tracing::debug!(path = %path.display(), age = age.as_secs(), "expired cache");
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "can't delete expired cache file");
            }
            return None;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "can't read the cache file");
                return None;
            }
        };
        match bincode::deserialize::<Vec<PullRequest>>(&bytes) {
            Ok(prs) => {
                tracing::debug!(path = %path.display(), count = prs.len(), "cache hit");
                Some(prs)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "can't decode the cache file");
                None
            }
        }
    }

    fn write_snapshot(&self, path: &Path, prs: &[PullRequest]) {
        let bytes = match bincode::serialize(prs) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "can't encode the cache file");
                return;
            }
        };
        match fs::write(path, bytes) {
            Ok(()) => tracing::debug!(path = %path.display(), count = prs.len(), "cache saved"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "can't write the cache file")
            }
        }
    }

    fn refetch(&self, path: &Path, base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        let prs = self.upstream.pull_requests(base, only_merged)?;
        self.write_snapshot(path, &prs);
        Ok(prs)
    }
}

impl<S: PullRequestSource> PullRequestSource for PullRequestCache<S> {
    fn pull_requests(&self, base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        let span = tracing::debug_span!("repo_cache", base, only_merged);
        let _enter = span.enter();

        let path = match self.snapshot_path(base, only_merged) {
            Some(path) => path,
            None => return self.upstream.pull_requests(base, only_merged),
        };

        let cached = match self.read_snapshot(&path) {
            Some(cached) => cached,
            None => {
                tracing::debug!("cache miss");
                return self.refetch(&path, base, only_merged);
            }
        };
        if self.dont_try_to_update {
            return Ok(cached);
        }

        let recent = self.upstream.last_updated_pull_requests(base, only_merged)?;
        match evaluate_snapshot(&cached, &recent) {
            CacheDecision::UseCachedSnapshot => {
                tracing::debug!(recent = recent.len(), "snapshot still valid => merging");
                let merged = merge_snapshot(cached, recent);
                self.write_snapshot(&path, &merged);
                Ok(merged)
            }
            CacheDecision::Refetch(reason) => {
                tracing::debug!(%reason, "bypass the cache");
                self.refetch(&path, base, only_merged)
            }
        }
    }

    fn last_updated_pull_requests(
        &self,
        base: &str,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        self.upstream.last_updated_pull_requests(base, only_merged)
    }

    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()> {
        self.upstream.create_release(base, tag_name, body, draft)
    }
}

fn resolve_directory(location: Option<&Path>) -> std::result::Result<PathBuf, BoundaryWarning> {
    let disabled = |location: &Path, reason: String| BoundaryWarning::CacheDisabled {
        location: location.display().to_string(),
        reason,
    };

    let location = match location {
        Some(location) if !location.as_os_str().is_empty() => location,
        _ => {
            return std::env::current_dir()
                .map_err(|e| disabled(Path::new("."), e.to_string()));
        }
    };

    let metadata = fs::metadata(location).map_err(|e| disabled(location, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(disabled(location, "not a directory".to_string()));
    }
    fs::canonicalize(location).map_err(|e| disabled(location, e.to_string()))
}
