//! Application service: next version, release creation and changelog
//!
//! Wires a [TagSource] and a [PullRequestSource] with the tag filters, the
//! label rules, the segment builder and the version analyzer.

use crate::analyzer::{LabelRules, NextVersion, VersionAnalyzer};
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::{
    merge_order, Changelog, LabelSet, PullRequest, SegmentBuilder, SegmentConfig, Tag,
    DEFAULT_FIRST_TAG,
};
use crate::error::{NextVersionError, Result};
use crate::git::TagSource;
use crate::repo::PullRequestSource;
use crate::ui::formatter::render_release_body;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;

/// Settings of the service, usually derived from [Config]
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub major_labels: LabelSet,
    pub minor_labels: LabelSet,
    pub ignore_labels: LabelSet,
    /// Empty means no filtering
    pub must_have_labels: LabelSet,
    /// Empty means every tag qualifies
    pub tag_regex: String,
    pub minimal_delay_seconds: u32,
}

fn label_set(values: &[String]) -> LabelSet {
    values.iter().map(String::as_str).collect()
}

impl ServiceConfig {
    pub fn from_config(config: &Config) -> Self {
        ServiceConfig {
            major_labels: label_set(&config.labels.major),
            minor_labels: label_set(&config.labels.minor),
            ignore_labels: label_set(&config.labels.ignore),
            must_have_labels: label_set(&config.labels.must_have),
            tag_regex: config.tags.regex.clone(),
            minimal_delay_seconds: config.tags.minimal_delay_seconds,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig::from_config(&Config::default())
    }
}

/// Where a changelog starts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SinceTag {
    /// The whole history
    #[default]
    Beginning,
    /// After the latest qualifying tag; only meaningful with the future segment
    Latest,
    /// After the named tag
    Named(String),
}

impl SinceTag {
    /// `""` is the whole history and `"LATEST"` the latest tag
    pub fn parse(value: &str) -> Self {
        match value {
            "" => SinceTag::Beginning,
            "LATEST" => SinceTag::Latest,
            name => SinceTag::Named(name.to_string()),
        }
    }
}

/// Result of a release request
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Created { next: NextVersion, body: String },
    /// The computed tag equals the current one
    NoActionNeeded(NextVersion),
}

pub struct NextVersionService<G, R> {
    config: ServiceConfig,
    git: G,
    repo: R,
    analyzer: VersionAnalyzer,
}

impl<G: TagSource, R: PullRequestSource> NextVersionService<G, R> {
    pub fn new(config: ServiceConfig, git: G, repo: R) -> Self {
        let analyzer = VersionAnalyzer::new(LabelRules {
            major: config.major_labels.clone(),
            minor: config.minor_labels.clone(),
        });
        NextVersionService {
            config,
            git,
            repo,
            analyzer,
        }
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn segment_builder(&self, include_future: bool) -> SegmentBuilder {
        SegmentBuilder::new(SegmentConfig {
            minimal_delay_seconds: self.config.minimal_delay_seconds,
            include_future,
        })
    }

    /// Semantic non-prerelease tags of `branches` (every tag when empty)
    /// matching the tag regex and strictly newer than `since`, ascending.
    pub fn qualifying_tags(
        &self,
        branches: &[String],
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Tag>> {
        let regex = Regex::new(&self.config.tag_regex)?;
        let selectors: Vec<Option<&str>> = if branches.is_empty() {
            vec![None]
        } else {
            branches.iter().map(|b| Some(b.as_str())).collect()
        };

        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        for selector in selectors {
            for tag in self.git.contained_tags(selector)? {
                if !regex.is_match(&tag.name) {
                    tracing::debug!(name = %tag.name, regex = %self.config.tag_regex, "tag doesn't match the regex => ignoring");
                    continue;
                }
                if !tag.is_semantic() {
                    tracing::debug!(name = %tag.name, "tag doesn't have a semantic version => ignoring");
                    continue;
                }
                if tag.is_prerelease() {
                    tracing::debug!(name = %tag.name, "tag is a prerelease => ignoring");
                    continue;
                }
                if since.is_some_and(|since| tag.time <= since) {
                    tracing::debug!(name = %tag.name, time = %tag.time, "tag too old => ignoring");
                    continue;
                }
                if seen.insert(tag.name.clone()) {
                    tags.push(tag);
                }
            }
        }
        tags.sort();
        Ok(tags)
    }

    /// Greatest qualifying tag, or [NextVersionError::NoQualifyingTag]
    pub fn latest_qualifying_tag(&self, branches: &[String]) -> Result<Tag> {
        let mut tags = self.qualifying_tags(branches, None)?;
        tracing::debug!(count = tags.len(), "qualifying tags found");
        tags.pop().ok_or(NextVersionError::NoQualifyingTag)
    }

    /// Pull requests targeting `branches`, without those merged before
    /// `since` or filtered out by the label rules, deduplicated and in merge
    /// order.
    pub fn pull_requests(
        &self,
        branches: &[String],
        since: Option<DateTime<Utc>>,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for branch in branches {
            for pr in self.repo.pull_requests(branch, only_merged)? {
                if let (Some(since), Some(merged_at)) = (since, pr.merged_at) {
                    if merged_at < since {
                        continue;
                    }
                }
                if pr.has_any_label(&self.config.ignore_labels) {
                    tracing::debug!(number = pr.number, "the pr has an ignored label");
                    continue;
                }
                if !self.config.must_have_labels.is_empty()
                    && !pr.has_any_label(&self.config.must_have_labels)
                {
                    tracing::debug!(number = pr.number, "the pr doesn't have one of the required labels");
                    continue;
                }
                if seen.insert(pr.number) {
                    result.push(pr);
                }
            }
        }

        result.sort_by(merge_order);
        Ok(result)
    }

    /// Compute the tag following the latest qualifying one.
    ///
    /// Without a qualifying tag, `v0.0.0` at the Unix epoch is used and a
    /// [BoundaryWarning::NoQualifyingTag] is attached to the result.
    pub fn next_version(
        &self,
        branches: &[String],
        only_merged: bool,
        dont_increment_if_no_pr: bool,
    ) -> Result<NextVersion> {
        let span = tracing::debug_span!("next_version", ?branches, only_merged);
        let _enter = span.enter();

        let mut warnings = Vec::new();
        let latest = match self.latest_qualifying_tag(branches) {
            Ok(tag) => tag,
            Err(NextVersionError::NoQualifyingTag) => {
                tracing::warn!("no tag found => let's use the default first version");
                warnings.push(BoundaryWarning::NoQualifyingTag {
                    default_tag: DEFAULT_FIRST_TAG.to_string(),
                });
                Tag::default_first()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(tag = %latest.name, time = %latest.time, "latest semantic (non-prerelease) tag");

        let prs = self.pull_requests(branches, Some(latest.time), only_merged)?;
        let changelog = self
            .segment_builder(true)
            .build(std::slice::from_ref(&latest), &prs);
        let future = changelog.future_pull_requests().unwrap_or_default();
        tracing::debug!(count = future.len(), "PRs to consider");

        let mut next = self
            .analyzer
            .next_version(&latest, future, dont_increment_if_no_pr);
        warnings.append(&mut next.warnings);
        next.warnings = warnings;
        Ok(next)
    }

    /// Create a release for the next version of a single branch, from merged
    /// pull requests only.
    pub fn create_next_release(
        &self,
        branches: &[String],
        dont_increment_if_no_pr: bool,
        draft: bool,
    ) -> Result<ReleaseOutcome> {
        let base = match branches {
            [base] => base,
            _ => return Err(NextVersionError::config("only one branch is supported")),
        };

        let next = self.next_version(branches, true, dont_increment_if_no_pr)?;
        if !next.is_bump() {
            return Ok(ReleaseOutcome::NoActionNeeded(next));
        }

        let body = render_release_body(&next.considered);
        self.repo.create_release(base, &next.new_tag, &body, draft)?;
        Ok(ReleaseOutcome::Created { next, body })
    }

    /// Partition the pull requests of `branches` by qualifying tag.
    pub fn changelog(
        &self,
        branches: &[String],
        only_merged: bool,
        include_future: bool,
        since_tag: &SinceTag,
    ) -> Result<Changelog> {
        if branches.is_empty() {
            return Err(NextVersionError::config("at least one branch is required"));
        }

        let mut since = None;
        if *since_tag == SinceTag::Latest {
            if !include_future {
                return Err(NextVersionError::config(
                    "since tag LATEST is only compatible with the future section",
                ));
            }
            match self.latest_qualifying_tag(branches) {
                Ok(tag) => since = Some(tag.time),
                Err(NextVersionError::NoQualifyingTag) => {}
                Err(e) => return Err(e),
            }
        }

        let mut tags = self.qualifying_tags(branches, since)?;
        if let SinceTag::Named(name) = since_tag {
            match tags.iter().position(|tag| &tag.name == name) {
                Some(index) => {
                    since = Some(tags[index].time);
                    tags.drain(..=index);
                }
                None => tracing::warn!(tag = %name, "since tag not found among qualifying tags => ignoring"),
            }
        }

        let prs = self.pull_requests(branches, since, only_merged)?;
        Ok(self.segment_builder(include_future).build(&tags, &prs))
    }
}
