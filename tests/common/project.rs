//! TestProject builder for integration tests
//!
//! Lays out a throwaway directory of Python files so resolver and
//! aggregator behavior can be exercised against real paths.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Builder for temporary Python project structures
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create a new empty project
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the path to the project root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file with the given content, creating parent directories.
    /// Returns the absolute path of the new file.
    pub fn add_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Drop a `pyproject.toml` at the root so import resolution treats
    /// this directory as the project root
    pub fn mark_root(&self) -> &Self {
        self.add_file("pyproject.toml", "[project]\nname = \"fixture\"\n");
        self
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
