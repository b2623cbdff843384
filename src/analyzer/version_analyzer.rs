use crate::boundary::BoundaryWarning;
use crate::domain::{LabelSet, PullRequest, Tag, VersionBump};
use std::fmt;

/// Increment found by scanning a list of pull requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Increment {
    Nothing,
    Patch,
    Minor,
    Major,
}

impl Increment {
    /// Bump to apply to the latest tag, `None` meaning "keep the tag as is"
    pub fn to_bump(self, dont_increment_if_no_pr: bool) -> Option<VersionBump> {
        match self {
            Increment::Nothing if dont_increment_if_no_pr => None,
            Increment::Nothing | Increment::Patch => Some(VersionBump::Patch),
            Increment::Minor => Some(VersionBump::Minor),
            Increment::Major => Some(VersionBump::Major),
        }
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Increment::Nothing => write!(f, "nothing"),
            Increment::Patch => write!(f, "patch"),
            Increment::Minor => write!(f, "minor"),
            Increment::Major => write!(f, "major"),
        }
    }
}

/// Labels promoting a pull request to a major or minor change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRules {
    pub major: LabelSet,
    pub minor: LabelSet,
}

/// Outcome of a scan: the increment and the pull requests actually inspected
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub increment: Increment,
    pub considered: Vec<PullRequest>,
}

/// Result of the next-version computation
#[derive(Debug, Clone, PartialEq)]
pub struct NextVersion {
    pub old_tag: String,
    pub new_tag: String,
    pub increment: Increment,
    pub considered: Vec<PullRequest>,
    pub warnings: Vec<BoundaryWarning>,
}

impl NextVersion {
    /// False when the computed tag equals the current one (no release needed)
    pub fn is_bump(&self) -> bool {
        self.old_tag != self.new_tag
    }
}

/// Scans pull requests to decide the version increment
pub struct VersionAnalyzer {
    rules: LabelRules,
}

impl VersionAnalyzer {
    /// Create a new version analyzer
    pub fn new(rules: LabelRules) -> Self {
        VersionAnalyzer { rules }
    }

    /// Scan `pull_requests` (ascending merge order) and pick the increment.
    ///
    /// The first major pull request stops the scan; it is the last entry of
    /// `considered`.
    pub fn analyze(&self, pull_requests: &[PullRequest]) -> Analysis {
        let mut increment = Increment::Nothing;
        let mut considered = Vec::with_capacity(pull_requests.len());

        for pr in pull_requests {
            considered.push(pr.clone());
            if pr.has_any_label(&self.rules.major) {
                tracing::debug!(number = pr.number, title = %pr.title, "major PR found => break");
                increment = Increment::Major;
                break;
            } else if pr.has_any_label(&self.rules.minor) {
                tracing::debug!(number = pr.number, title = %pr.title, "minor PR found");
                if increment < Increment::Minor {
                    increment = Increment::Minor;
                }
            } else {
                tracing::debug!(number = pr.number, title = %pr.title, "patch PR found");
                if increment == Increment::Nothing {
                    increment = Increment::Patch;
                }
            }
        }

        Analysis {
            increment,
            considered,
        }
    }

    /// Compute the tag following `latest` given the pull requests merged since.
    pub fn next_version(
        &self,
        latest: &Tag,
        pull_requests: &[PullRequest],
        dont_increment_if_no_pr: bool,
    ) -> NextVersion {
        let Analysis {
            increment,
            considered,
        } = self.analyze(pull_requests);

        let mut warnings = Vec::new();
        if increment == Increment::Nothing {
            warnings.push(BoundaryWarning::NoNewPullRequests {
                latest_tag: latest.name.clone(),
            });
        }

        let new_tag = increment
            .to_bump(dont_increment_if_no_pr)
            .and_then(|bump| latest.bumped_name(bump))
            .unwrap_or_else(|| latest.name.clone());

        tracing::debug!(
            old = %latest.name,
            new = %new_tag,
            increment = %increment,
            considered = considered.len(),
            "next version decided"
        );

        NextVersion {
            old_tag: latest.name.clone(),
            new_tag,
            increment,
            considered,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
    }

    fn pr(number: u64, minutes: i64, labels: &[&str]) -> PullRequest {
        let at = t0() + Duration::minutes(minutes);
        PullRequest::new(number, format!("PR{}", number), Some(at), at)
            .with_labels(labels.iter().copied())
    }

    fn analyzer() -> VersionAnalyzer {
        VersionAnalyzer::new(LabelRules {
            major: LabelSet::from_comma_separated("major1,major2"),
            minor: LabelSet::from_comma_separated("minor1,minor2"),
        })
    }

    fn numbers(prs: &[PullRequest]) -> Vec<u64> {
        prs.iter().map(|pr| pr.number).collect()
    }

    #[test]
    fn test_analyze_empty_is_nothing() {
        let analysis = analyzer().analyze(&[]);
        assert_eq!(analysis.increment, Increment::Nothing);
        assert!(analysis.considered.is_empty());
    }

    #[test]
    fn test_analyze_patch() {
        let prs = vec![pr(1, 0, &["foo"]), pr(2, 1, &[])];
        let analysis = analyzer().analyze(&prs);
        assert_eq!(analysis.increment, Increment::Patch);
        assert_eq!(numbers(&analysis.considered), vec![1, 2]);
    }

    #[test]
    fn test_analyze_minor_wins_over_patch_in_any_order() {
        let before = vec![pr(1, 0, &["foo", "bar"]), pr(2, 1, &["foo", "minor1"])];
        assert_eq!(analyzer().analyze(&before).increment, Increment::Minor);

        let after = vec![pr(1, 0, &["minor1", "bar"]), pr(2, 1, &["foo"])];
        assert_eq!(analyzer().analyze(&after).increment, Increment::Minor);
    }

    #[test]
    fn test_analyze_major_stops_the_scan() {
        let prs = vec![
            pr(1, 0, &["foo", "minor1"]),
            pr(2, 1, &["foo", "major2"]),
            pr(3, 2, &["foo", "minor1"]),
        ];
        let analysis = analyzer().analyze(&prs);
        assert_eq!(analysis.increment, Increment::Major);
        assert_eq!(numbers(&analysis.considered), vec![1, 2]);
    }

    #[test]
    fn test_major_label_takes_priority_on_same_pr() {
        let prs = vec![pr(1, 0, &["minor1", "major1"])];
        assert_eq!(analyzer().analyze(&prs).increment, Increment::Major);
    }

    #[test]
    fn test_labels_are_exact_match() {
        let prs = vec![pr(1, 0, &["Major1", "minor"])];
        assert_eq!(analyzer().analyze(&prs).increment, Increment::Patch);
    }

    #[test]
    fn test_next_version_bumps() {
        let tag = Tag::new("v1.0.0", t0());
        let a = analyzer();

        let minor = a.next_version(&tag, &[pr(1, 0, &["minor2"])], true);
        assert_eq!(minor.old_tag, "v1.0.0");
        assert_eq!(minor.new_tag, "v1.1.0");
        assert!(minor.is_bump());
        assert!(minor.warnings.is_empty());

        let major = a.next_version(&Tag::new("1.0.0", t0()), &[pr(1, 0, &["major1"])], true);
        assert_eq!(major.new_tag, "2.0.0");

        let patch = a.next_version(&tag, &[pr(1, 0, &[])], true);
        assert_eq!(patch.new_tag, "v1.0.1");
    }

    #[test]
    fn test_next_version_without_pr() {
        let tag = Tag::new("1.0.0", t0());
        let a = analyzer();

        let bumped = a.next_version(&tag, &[], false);
        assert_eq!(bumped.new_tag, "1.0.1");
        assert!(bumped.is_bump());

        let kept = a.next_version(&tag, &[], true);
        assert_eq!(kept.new_tag, "1.0.0");
        assert!(!kept.is_bump());
        assert_eq!(
            kept.warnings,
            vec![BoundaryWarning::NoNewPullRequests {
                latest_tag: "1.0.0".to_string()
            }]
        );
    }

    #[test]
    fn test_next_version_keeps_prefix_and_drops_prerelease() {
        let tag = Tag::new("apps/api/v2.3.4", t0());
        let next = analyzer().next_version(&tag, &[pr(1, 0, &["minor1"])], false);
        assert_eq!(next.new_tag, "apps/api/v2.4.0");
    }

    #[test]
    fn test_increment_to_bump() {
        assert_eq!(Increment::Nothing.to_bump(true), None);
        assert_eq!(Increment::Nothing.to_bump(false), Some(VersionBump::Patch));
        assert_eq!(Increment::Patch.to_bump(true), Some(VersionBump::Patch));
        assert_eq!(Increment::Minor.to_bump(true), Some(VersionBump::Minor));
        assert_eq!(Increment::Major.to_bump(false), Some(VersionBump::Major));
    }
}
