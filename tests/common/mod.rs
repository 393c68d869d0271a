//! Common test utilities for injectlint integration tests
//!
//! This module provides:
//! - `TestProject` builder for laying out temporary Python projects
//! - Source snippets shared across test files

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod project;

pub use project::TestProject;

/// A module with one eager provider and one function that misuses it.
pub const SELF_CONTAINED_OFFENDER: &str = "\
@instance
def settings():
    return {}

def run():
    return settings
";
