use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

impl VersionBump {
    /// Bump version according to bump type.
    ///
    /// Prerelease and build metadata are always dropped on increment.
    pub fn apply(self, version: &Version) -> Version {
        let (major, minor, patch) = match self {
            VersionBump::Major => (version.major + 1, 0, 0),
            VersionBump::Minor => (version.major, version.minor + 1, 0),
            VersionBump::Patch => (version.major, version.minor, version.patch + 1),
        };
        Version {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_bump_major() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Major.apply(&v), Version::new(2, 0, 0));
    }

    #[test]
    fn test_version_bump_minor() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Minor.apply(&v), Version::new(1, 3, 0));
    }

    #[test]
    fn test_version_bump_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Patch.apply(&v), Version::new(1, 2, 4));
    }

    #[test]
    fn test_version_bump_drops_prerelease_and_build() {
        let v = Version::parse("1.2.3-rc.1+build.7").unwrap();
        assert_eq!(VersionBump::Patch.apply(&v).to_string(), "1.2.4");
        assert_eq!(VersionBump::Minor.apply(&v).to_string(), "1.3.0");
    }

    #[test]
    fn test_bump_ordering() {
        assert!(VersionBump::Major > VersionBump::Minor);
        assert!(VersionBump::Minor > VersionBump::Patch);
    }
}
