//! Runtime settings for an analysis run.

use std::path::Path;

/// Options controlling a lint run
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Maximum number of files analyzed concurrently
    pub concurrency: usize,

    /// Marker files that identify a project root during import resolution
    pub root_markers: Vec<String>,

    /// Conventional source directory checked alongside the root markers
    pub source_dir: String,

    /// File names excluded from batch runs (entry-point scripts)
    pub excluded_files: Vec<String>,

    /// Directory names skipped during file discovery
    pub skip_dirs: Vec<String>,
}

pub const DEFAULT_CONCURRENCY: usize = 10;

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            root_markers: vec!["pyproject.toml".to_string(), "setup.py".to_string()],
            source_dir: "src".to_string(),
            excluded_files: vec!["__main__.py".to_string()],
            skip_dirs: vec![
                "venv".to_string(),
                ".venv".to_string(),
                "site-packages".to_string(),
                ".tox".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "__pycache__".to_string(),
            ],
        }
    }
}

impl LintOptions {
    /// Clamp concurrency to a sane lower bound
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// True when the file's name is on the exclusion list
    pub fn is_excluded_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.excluded_files.iter().any(|e| e == name))
            .unwrap_or(false)
    }
}
