use thiserror::Error;

/// Unified error type for git-next-version operations
#[derive(Error, Debug)]
pub enum NextVersionError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid tag regex: {0}")]
    TagRegex(#[from] regex::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No existing semantic (non-prerelease) tag found")]
    NoQualifyingTag,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-next-version
pub type Result<T> = std::result::Result<T, NextVersionError>;

impl NextVersionError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        NextVersionError::Config(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        NextVersionError::Remote(msg.into())
    }

    /// True for failures coming from the Git or Repo collaborators.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NextVersionError::Git(_) | NextVersionError::Http(_) | NextVersionError::Remote(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NextVersionError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NextVersionError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_regex() {
        let regex_err = regex::Regex::new("v(").unwrap_err();
        let err: NextVersionError = regex_err.into();
        assert!(err.to_string().starts_with("Invalid tag regex"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        assert!(NextVersionError::remote("503").is_transport());
        assert!(NextVersionError::Git(git2::Error::from_str("boom")).is_transport());
        assert!(!NextVersionError::NoQualifyingTag.is_transport());
        assert!(!NextVersionError::config("x").is_transport());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (NextVersionError::config("x"), "Configuration error"),
            (NextVersionError::remote("x"), "Remote operation failed"),
            (NextVersionError::NoQualifyingTag, "No existing semantic"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
