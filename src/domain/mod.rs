//! Domain logic - pure business rules independent of git and the hosting service

pub mod pull_request;
pub mod segment;
pub mod tag;
pub mod version;

pub use pull_request::{merge_order, LabelSet, PullRequest};
pub use segment::{Changelog, Segment, SegmentBuilder, SegmentConfig};
pub use tag::{Tag, DEFAULT_FIRST_TAG};
pub use version::VersionBump;
