use crate::domain::version::VersionBump;
use chrono::{DateTime, Utc};
use semver::Version;
use std::cmp::Ordering;

/// Name of the tag synthesized when a repository has no qualifying tag yet.
pub const DEFAULT_FIRST_TAG: &str = "v0.0.0";

/// Represents a git tag with its commit time and the semantic version read
/// from its name.
///
/// The name is split into a literal `prefix` (path-like part up to the last
/// `/`, plus a leading `v`) and a remainder parsed as a semantic version.
/// `version` is `None` when the remainder is not a valid semantic version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub time: DateTime<Utc>,
    pub prefix: String,
    pub version: Option<Version>,
}

impl Tag {
    /// Create a new tag from its name and commit time
    ///
    /// Examples: "v1.2.3" -> prefix "v", "foo/bar/v1.2.3" -> prefix "foo/bar/v",
    /// "1.2.3" -> empty prefix, "release" -> no version.
    pub fn new(name: impl Into<String>, time: DateTime<Utc>) -> Self {
        let name = name.into();
        let (mut prefix, rest) = match name.rfind('/') {
            Some(idx) => (name[..=idx].to_string(), &name[idx + 1..]),
            None => (String::new(), name.as_str()),
        };
        let rest = match rest.strip_prefix('v') {
            Some(stripped) => {
                prefix.push('v');
                stripped
            }
            None => rest,
        };
        let version = parse_version(rest);

        Tag {
            time,
            prefix,
            version,
            name,
        }
    }

    /// The tag used when no qualifying tag exists: `v0.0.0` at the Unix epoch.
    pub fn default_first() -> Self {
        Tag::new(DEFAULT_FIRST_TAG, DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_semantic(&self) -> bool {
        self.version.is_some()
    }

    pub fn is_prerelease(&self) -> bool {
        self.version.as_ref().is_some_and(|v| !v.pre.is_empty())
    }

    /// Name of a sibling tag carrying `new_version` with the same prefix
    pub fn new_name(&self, new_version: &Version) -> String {
        format!("{}{}", self.prefix, new_version)
    }

    /// Name of the tag obtained by bumping this tag's version.
    ///
    /// Returns `None` for a tag without a semantic version.
    pub fn bumped_name(&self, bump: VersionBump) -> Option<String> {
        self.version
            .as_ref()
            .map(|version| self.new_name(&bump.apply(version)))
    }

    pub fn less_than(&self, other: &Tag) -> bool {
        self.cmp(other) == Ordering::Less
    }
}

/// Parse a semantic version, accepting a `MAJOR` or `MAJOR.MINOR` core
/// (`1.2` is read as `1.2.0`). Prerelease and build suffixes are kept.
fn parse_version(value: &str) -> Option<Version> {
    let core_end = value.find(['-', '+']).unwrap_or(value.len());
    let (core, suffix) = value.split_at(core_end);

    let parts: Vec<&str> = core.split('.').collect();
    let numeric = parts
        .iter()
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if !numeric || parts.len() >= 3 {
        return Version::parse(value).ok();
    }

    let mut padded = core.to_string();
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded).ok()
}

/// Total order over tags.
///
/// Versioned tags compare by semantic version precedence, then by time. A tag
/// without a version sorts before any versioned tag; two unversioned tags
/// compare by time. Name is the final tie breaker.
impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_version = match (&self.version, &other.version) {
            (Some(a), Some(b)) => a.cmp_precedence(b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_version
            .then_with(|| self.time.cmp(&other.time))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_tag_new_with_v_prefix() {
        let tag = Tag::new("v1.2.3", at(0));
        assert_eq!(tag.name, "v1.2.3");
        assert_eq!(tag.prefix, "v");
        assert_eq!(tag.version, Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_tag_new_without_prefix() {
        let tag = Tag::new("1.2.3", at(0));
        assert_eq!(tag.prefix, "");
        assert_eq!(tag.version, Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_tag_new_path_like_prefix() {
        let tag = Tag::new("foo/bar/v1.2.3", at(0));
        assert_eq!(tag.prefix, "foo/bar/v");
        assert_eq!(tag.version, Some(Version::new(1, 2, 3)));

        let tag = Tag::new("component/2.0.0", at(0));
        assert_eq!(tag.prefix, "component/");
        assert_eq!(tag.version, Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_tag_new_not_semantic() {
        let tag = Tag::new("release-123", at(0));
        assert!(!tag.is_semantic());
        assert_eq!(tag.name, "release-123");

        let tag = Tag::new("", at(0));
        assert!(!tag.is_semantic());
    }

    #[test]
    fn test_tag_new_short_versions() {
        let tag = Tag::new("v1.2", at(0));
        assert_eq!(tag.name, "v1.2");
        assert_eq!(tag.prefix, "v");
        assert_eq!(tag.version, Some(Version::new(1, 2, 0)));
        assert_eq!(tag.bumped_name(VersionBump::Patch).unwrap(), "v1.2.1");

        let tag = Tag::new("2", at(0));
        assert_eq!(tag.prefix, "");
        assert_eq!(tag.version, Some(Version::new(2, 0, 0)));
        assert_eq!(tag.bumped_name(VersionBump::Minor).unwrap(), "2.1.0");

        let tag = Tag::new("v1.2-beta.1", at(0));
        assert_eq!(tag.version, Some(Version::parse("1.2.0-beta.1").unwrap()));
        assert!(tag.is_prerelease());

        assert!(!Tag::new("v1.x", at(0)).is_semantic());
        assert!(!Tag::new("v1..2", at(0)).is_semantic());
        assert!(!Tag::new("v1.2.3.4", at(0)).is_semantic());
    }

    #[test]
    fn test_tag_prerelease() {
        assert!(Tag::new("v1.1.0-beta", at(0)).is_prerelease());
        assert!(!Tag::new("v1.1.0", at(0)).is_prerelease());
        assert!(!Tag::new("foo", at(0)).is_prerelease());
    }

    #[test]
    fn test_new_name_keeps_prefix() {
        let tag = Tag::new("foo/v1.2.3", at(0));
        assert_eq!(tag.new_name(&Version::new(2, 0, 0)), "foo/v2.0.0");
        assert_eq!(tag.bumped_name(VersionBump::Minor).unwrap(), "foo/v1.3.0");
        assert_eq!(Tag::new("1.0.0", at(0)).bumped_name(VersionBump::Major).unwrap(), "2.0.0");
        assert_eq!(Tag::new("latest", at(0)).bumped_name(VersionBump::Patch), None);
    }

    #[test]
    fn test_default_first_tag() {
        let tag = Tag::default_first();
        assert_eq!(tag.name, "v0.0.0");
        assert_eq!(tag.time.timestamp(), 0);
        assert_eq!(tag.bumped_name(VersionBump::Patch).unwrap(), "v0.0.1");
    }

    #[test]
    fn test_less_than_by_version() {
        let v1 = Tag::new("v1.0.0", at(100));
        let v2 = Tag::new("v2.0.0", at(0));
        assert!(v1.less_than(&v2));
        assert!(!v2.less_than(&v1));
    }

    #[test]
    fn test_less_than_same_version_uses_time() {
        let early = Tag::new("v1.0.0", at(0));
        let late = Tag::new("foo/v1.0.0", at(10));
        assert!(early.less_than(&late));
        assert!(!late.less_than(&early));
    }

    #[test]
    fn test_less_than_unversioned_first() {
        let plain = Tag::new("nightly", at(1000));
        let versioned = Tag::new("v0.0.1", at(0));
        assert!(plain.less_than(&versioned));
        assert!(!versioned.less_than(&plain));
    }

    #[test]
    fn test_less_than_is_antisymmetric_without_versions() {
        let a = Tag::new("alpha", at(0));
        let b = Tag::new("beta", at(0) + Duration::seconds(1));
        assert!(a.less_than(&b));
        assert!(!b.less_than(&a));
        assert!(!a.less_than(&a));
    }

    #[test]
    fn test_sort_tags() {
        let mut tags = vec![
            Tag::new("v1.10.0", at(3)),
            Tag::new("v1.2.0", at(2)),
            Tag::new("v1.2.0-rc.1", at(1)),
            Tag::new("junk", at(4)),
        ];
        tags.sort();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["junk", "v1.2.0-rc.1", "v1.2.0", "v1.10.0"]);
    }
}
