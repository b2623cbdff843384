//! Main workflow orchestration logic
//!
//! Turns parsed arguments and the loaded [Config] into a wired
//! [NextVersionService], runs one command and reports what to print. Kept
//! apart from `main.rs` so the workflow can be driven with in-memory
//! collaborators.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::boundary::BoundaryWarning;
use crate::cli::args::{Cli, Command};
use crate::config::{load_config, ChangelogCategory, Config, RepositoryConfig};
use crate::error::{NextVersionError, Result};
use crate::git::{Git2Repository, TagSource};
use crate::repo::{CacheOptions, GitHubClient, PullRequestCache, PullRequestSource};
use crate::service::{NextVersionService, ReleaseOutcome, ServiceConfig, SinceTag};
use crate::ui;

/// How a successful command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The next tag equals the current one, nothing was released
    NoReleaseNeeded,
}

impl CommandStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::NoReleaseNeeded => 2,
        }
    }
}

/// What a command produced: stdout text, status and warnings for the user
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReport {
    pub output: Option<String>,
    pub status: CommandStatus,
    pub warnings: Vec<BoundaryWarning>,
}

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_labels(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Log filter for `--log-level`; unknown levels fall back to `info`.
pub fn log_filter(level: &str) -> EnvFilter {
    let level = match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Override configuration file values with the flags that were set.
pub fn apply_overrides(cli: &Cli, config: &mut Config) {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

    if let Some(owner) = non_empty(&cli.repo_owner) {
        config.repository.owner = Some(owner);
    }
    if let Some(name) = non_empty(&cli.repo_name) {
        config.repository.name = Some(name);
    }
    if let Some(remote) = non_empty(&cli.remote) {
        config.repository.remote = remote;
    }
    let branches: Vec<String> = cli
        .branches
        .iter()
        .flat_map(|b| split_labels(b))
        .collect();
    if !branches.is_empty() {
        config.repository.branches = branches;
    }

    if let Some(labels) = &cli.major_labels {
        config.labels.major = split_labels(labels);
    }
    if let Some(labels) = &cli.minor_labels {
        config.labels.minor = split_labels(labels);
    }
    if let Some(labels) = &cli.ignore_labels {
        config.labels.ignore = split_labels(labels);
    }
    if let Some(labels) = &cli.must_have_labels {
        config.labels.must_have = split_labels(labels);
    }

    if let Some(regex) = &cli.tag_regex {
        config.tags.regex = regex.clone();
    }
    if let Some(delay) = cli.minimal_delay_seconds {
        config.tags.minimal_delay_seconds = delay;
    }

    if cli.cache {
        config.cache.enabled = true;
    }
    if let Some(lifetime) = cli.cache_lifetime {
        config.cache.lifetime_seconds = lifetime;
    }
    if let Some(location) = &cli.cache_location {
        config.cache.location = location.clone();
    }
    if cli.cache_dont_try_to_update {
        config.cache.dont_try_to_update = true;
    }
}

/// Identity published by GitHub Actions (`GITHUB_REPOSITORY_OWNER` and
/// `GITHUB_REPOSITORY`), only when `GITHUB_ACTIONS` is `true`.
pub fn identity_from_github_env(
    actions: Option<&str>,
    owner: Option<&str>,
    repository: Option<&str>,
) -> Option<(String, String)> {
    if actions != Some("true") {
        return None;
    }
    let owner = owner.filter(|o| !o.is_empty())?;
    let name = repository?.strip_prefix(owner)?.strip_prefix('/')?;
    if name.is_empty() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

fn github_actions_identity() -> Option<(String, String)> {
    let var = |key: &str| std::env::var(key).ok();
    identity_from_github_env(
        var("GITHUB_ACTIONS").as_deref(),
        var("GITHUB_REPOSITORY_OWNER").as_deref(),
        var("GITHUB_REPOSITORY").as_deref(),
    )
}

/// Repository identity: configuration, then GitHub Actions, then the remote URL.
pub fn resolve_identity<G: TagSource>(
    repository: &RepositoryConfig,
    git: &G,
) -> Result<(String, String)> {
    if let (Some(owner), Some(name)) = (&repository.owner, &repository.name) {
        if !owner.is_empty() && !name.is_empty() {
            return Ok((owner.clone(), name.clone()));
        }
    }
    github_actions_identity()
        .or_else(|| git.guess_repo_identity())
        .ok_or_else(|| {
            NextVersionError::config(
                "can't guess the repository owner and name, please provide them with --repo-owner and --repo-name",
            )
        })
}

/// Configured branches, or the guessed default branch.
pub fn resolve_branches<G: TagSource>(
    repository: &RepositoryConfig,
    git: &G,
) -> Result<Vec<String>> {
    if !repository.branches.is_empty() {
        return Ok(repository.branches.clone());
    }
    git.guess_default_branch()
        .map(|branch| vec![branch])
        .ok_or_else(|| {
            NextVersionError::config("can't guess the default branch, please provide it with --branch")
        })
}

/// A service ready to run one command
pub struct Workflow<G, R> {
    pub service: NextVersionService<G, R>,
    pub branches: Vec<String>,
    pub only_merged: bool,
    pub categories: Vec<ChangelogCategory>,
    /// Raised while wiring, reported with the command's own warnings
    pub warnings: Vec<BoundaryWarning>,
}

impl<G: TagSource, R: PullRequestSource> Workflow<G, R> {
    pub fn new(config: &Config, git: G, repo: R, only_merged: bool) -> Result<Self> {
        let branches = resolve_branches(&config.repository, &git)?;
        tracing::debug!(?branches, only_merged, "branches selected");

        Ok(Workflow {
            service: NextVersionService::new(ServiceConfig::from_config(config), git, repo),
            branches,
            only_merged,
            categories: config.changelog.categories.clone(),
            warnings: Vec::new(),
        })
    }

    pub fn execute(&self, command: &Command) -> Result<CommandReport> {
        match command {
            Command::NextVersion(args) => {
                let next = self.service.next_version(
                    &self.branches,
                    self.only_merged,
                    args.dont_increment_if_no_pr,
                )?;
                let line = ui::render_next_version(&next, args.next_version_only);
                Ok(CommandReport {
                    output: Some(format!("{}\n", line)),
                    status: CommandStatus::Success,
                    warnings: next.warnings,
                })
            }
            Command::Changelog(args) => {
                let changelog = self.service.changelog(
                    &self.branches,
                    self.only_merged,
                    args.future,
                    &SinceTag::parse(&args.since_tag),
                )?;
                Ok(CommandReport {
                    output: Some(ui::render_changelog(&changelog, &self.categories)),
                    status: CommandStatus::Success,
                    warnings: Vec::new(),
                })
            }
            Command::CreateRelease(args) => {
                match self
                    .service
                    .create_next_release(&self.branches, !args.force, args.draft)?
                {
                    ReleaseOutcome::Created { next, .. } => Ok(CommandReport {
                        output: Some(format!("{}\n", next.new_tag)),
                        status: CommandStatus::Success,
                        warnings: next.warnings,
                    }),
                    ReleaseOutcome::NoActionNeeded(next) => Ok(CommandReport {
                        output: None,
                        status: CommandStatus::NoReleaseNeeded,
                        warnings: next.warnings,
                    }),
                }
            }
        }
    }
}

/// Wire the real collaborators: `git2` repository, GitHub client and the
/// optional on-disk cache.
pub fn build_workflow(
    cli: &Cli,
    config: &Config,
) -> Result<Workflow<Git2Repository, Box<dyn PullRequestSource>>> {
    let path = cli.command.local_git_repo_path();
    let git = Git2Repository::open(path, config.repository.remote.clone())?;
    let (owner, name) = resolve_identity(&config.repository, &git)?;
    tracing::debug!(%owner, %name, "repository identity");

    let client = GitHubClient::new(owner.clone(), name.clone(), cli.github_token.clone())?
        .with_api_url(config.repository.api_url.clone());

    let mut warnings = Vec::new();
    let repo: Box<dyn PullRequestSource> = if config.cache.enabled {
        let options = CacheOptions {
            location: Some(PathBuf::from(&config.cache.location)),
            lifetime_seconds: config.cache.lifetime_seconds,
            dont_try_to_update: config.cache.dont_try_to_update,
        };
        let cache = PullRequestCache::new(client, owner, name, options);
        if let Some(warning) = cache.warning() {
            warnings.push(warning.clone());
        }
        Box::new(cache)
    } else {
        Box::new(client)
    };

    let mut workflow = Workflow::new(config, git, repo, !cli.consider_also_non_merged_prs)?;
    workflow.warnings = warnings;
    Ok(workflow)
}

/// Run the parsed command end to end and print its results.
pub fn run(cli: &Cli) -> Result<CommandStatus> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(cli, &mut config);

    let workflow = build_workflow(cli, &config)?;
    let report = workflow.execute(&cli.command)?;

    for warning in workflow.warnings.iter().chain(&report.warnings) {
        ui::display_boundary_warning(warning);
    }
    if report.status == CommandStatus::NoReleaseNeeded {
        ui::display_status("No need to create a release, use --force to bump the version anyway");
    }
    if let Some(output) = &report.output {
        print!("{}", output);
    }
    Ok(report.status)
}
