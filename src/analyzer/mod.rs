//! Decision engine turning labeled pull requests into a version increment

pub mod version_analyzer;

pub use version_analyzer::{Analysis, Increment, LabelRules, NextVersion, VersionAnalyzer};
