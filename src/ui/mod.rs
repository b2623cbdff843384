//! User interface module - output rendering and console messages.
//!
//! Everything that reaches stdout goes through `render_*`; diagnostics for the
//! user go to stderr through `display_*`.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_status, display_success, render_changelog,
    render_next_version, render_release_body,
};
