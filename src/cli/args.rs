//! Command-line arguments
//!
//! Every global flag but `--config` has an environment fallback. Unset flags
//! leave the value loaded from the configuration file untouched.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "git-next-version",
    version,
    about = "Compute the next semantic version of a GitHub repository from pull-request labels"
)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    pub config: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "INFO", global = true, help = "Log level (ERROR, WARN, INFO, DEBUG, TRACE)")]
    pub log_level: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true, help = "GitHub token")]
    pub github_token: Option<String>,

    #[arg(long, env = "GNSV_REPO_OWNER", global = true, help = "Repository owner (guessed when unset)")]
    pub repo_owner: Option<String>,

    #[arg(long, env = "GNSV_REPO_NAME", global = true, help = "Repository name (guessed when unset)")]
    pub repo_name: Option<String>,

    #[arg(long, env = "GNSV_REMOTE", global = true, help = "Git remote holding the branches")]
    pub remote: Option<String>,

    #[arg(long = "branch", env = "GNSV_BRANCH_NAME", value_delimiter = ',', global = true, help = "Branch names, comma separated (default branch when unset)")]
    pub branches: Vec<String>,

    #[arg(long, env = "GNSV_CONSIDER_ALSO_NON_MERGED_PRS", global = true, help = "Also consider open pull requests")]
    pub consider_also_non_merged_prs: bool,

    #[arg(long, env = "GNSV_TAG_REGEX", global = true, help = "Only consider tags matching this regex")]
    pub tag_regex: Option<String>,

    #[arg(long, env = "GNSV_MAJOR_LABELS", global = true, help = "Labels of major pull requests, comma separated")]
    pub major_labels: Option<String>,

    #[arg(long, env = "GNSV_MINOR_LABELS", global = true, help = "Labels of minor pull requests, comma separated")]
    pub minor_labels: Option<String>,

    #[arg(long, env = "GNSV_HIDDEN_LABELS", global = true, help = "Labels of ignored pull requests, comma separated")]
    pub ignore_labels: Option<String>,

    #[arg(long, env = "GNSV_MUST_HAVE_LABELS", global = true, help = "Only consider pull requests with one of these labels, comma separated")]
    pub must_have_labels: Option<String>,

    #[arg(long = "minimal-delay-in-seconds", env = "GNSV_MINIMAL_DELAY_IN_SECONDS", global = true, help = "Minimal delay between a tag and a merge to consider them distinct")]
    pub minimal_delay_seconds: Option<u32>,

    #[arg(long, env = "GNSV_CACHE", global = true, help = "Cache pull requests on disk")]
    pub cache: bool,

    #[arg(long, env = "GNSV_CACHE_LIFETIME", global = true, help = "Cache lifetime in seconds")]
    pub cache_lifetime: Option<i64>,

    #[arg(long, env = "GNSV_CACHE_LOCATION", global = true, help = "Existing directory holding the cache files")]
    pub cache_location: Option<String>,

    #[arg(long, env = "GNSV_CACHE_DONT_TRY_TO_UPDATE", global = true, help = "Trust the cache until it expires")]
    pub cache_dont_try_to_update: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the next version
    NextVersion(NextVersionArgs),
    /// Print a Markdown changelog
    Changelog(ChangelogArgs),
    /// Create a GitHub release for the next version
    CreateRelease(CreateReleaseArgs),
}

impl Command {
    pub fn local_git_repo_path(&self) -> &str {
        match self {
            Command::NextVersion(args) => &args.path,
            Command::Changelog(args) => &args.path,
            Command::CreateRelease(args) => &args.path,
        }
    }
}

#[derive(Debug, Args)]
pub struct NextVersionArgs {
    #[arg(long, env = "GNSV_DONT_INCREMENT_IF_NO_PR", help = "Keep the version when there is no new pull request")]
    pub dont_increment_if_no_pr: bool,

    #[arg(long, env = "GNSV_NEXT_VERSION_ONLY", help = "Print only the next version")]
    pub next_version_only: bool,

    #[arg(value_name = "LOCAL_GIT_REPO_PATH", default_value = ".")]
    pub path: String,
}

#[derive(Debug, Args)]
pub struct ChangelogArgs {
    #[arg(long, env = "GNSV_CHANGELOG_FUTURE", help = "Add an unreleased section")]
    pub future: bool,

    #[arg(long, default_value = "", help = "Start after this tag (LATEST for the latest one)")]
    pub since_tag: String,

    #[arg(value_name = "LOCAL_GIT_REPO_PATH", default_value = ".")]
    pub path: String,
}

#[derive(Debug, Args)]
pub struct CreateReleaseArgs {
    #[arg(long, env = "GNSV_RELEASE_DRAFT", help = "Create the release as a draft")]
    pub draft: bool,

    #[arg(long, help = "Bump the version and release even without new pull request")]
    pub force: bool,

    #[arg(value_name = "LOCAL_GIT_REPO_PATH", default_value = ".")]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
