use std::fmt;

/// Non-fatal conditions met while computing a version or a changelog.
/// These are carried on results and reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryWarning {
    /// No semantic non-prerelease tag exists, a default one was synthesized
    NoQualifyingTag { default_tag: String },
    /// Nothing was merged since the latest tag
    NoNewPullRequests { latest_tag: String },
    /// The pull-request cache can't be used and was switched off
    CacheDisabled { location: String, reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoQualifyingTag { default_tag } => {
                write!(
                    f,
                    "No semantic (non-prerelease) tag found, using '{}' as the starting point",
                    default_tag
                )
            }
            BoundaryWarning::NoNewPullRequests { latest_tag } => {
                write!(f, "No pull request found since tag '{}'", latest_tag)
            }
            BoundaryWarning::CacheDisabled { location, reason } => {
                write!(
                    f,
                    "Cache disabled, location '{}' is not usable: {}",
                    location, reason
                )
            }
        }
    }
}
