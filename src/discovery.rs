//! Python source discovery.
//!
//! Walks a directory tree collecting `.py` files while honoring gitignore
//! rules and pruning virtualenv and build directories that never hold
//! project code.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::config::LintOptions;
use crate::error::{LintError, Result};

/// Collects every Python file under `root`, sorted by path.
///
/// `root` may also be a single file; it is returned as-is when it has a
/// `.py` extension and yields an empty list otherwise. Directories named in
/// [`LintOptions::skip_dirs`] are pruned wherever they appear below `root`.
pub fn python_files(root: &Path, options: &LintOptions) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(LintError::FileNotFound {
            path: root.display().to_string(),
        });
    }

    if root.is_file() {
        if is_python_file(root) {
            return Ok(vec![root.to_path_buf()]);
        }
        return Ok(Vec::new());
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        // Skip directories (file_type is None for stdin, treat as skip)
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }

        let path = entry.path();
        if !is_python_file(path) || in_skipped_dir(path, root, options) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn is_python_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("py")
}

/// True when any directory component between `root` and the file matches a
/// configured skip name.
fn in_skipped_dir(path: &Path, root: &Path, options: &LintOptions) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components: Vec<_> = relative.components().collect();
    components.pop();

    components.iter().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|name| options.skip_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x = 1\n").unwrap();
    }

    #[test]
    fn collects_python_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.py"));
        touch(&root.join("a.py"));
        touch(&root.join("pkg/mod.py"));
        touch(&root.join("notes.txt"));

        let files = python_files(root, &LintOptions::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.py"),
                PathBuf::from("b.py"),
                PathBuf::from("pkg/mod.py"),
            ]
        );
    }

    #[test]
    fn prunes_environment_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app.py"));
        touch(&root.join("venv/lib/site.py"));
        touch(&root.join("build/out.py"));
        touch(&root.join("__pycache__/app.cpython-311.py"));

        let files = python_files(root, &LintOptions::default()).unwrap();
        assert_eq!(files, vec![root.join("app.py")]);
    }

    #[test]
    fn single_file_root_is_returned_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.py");
        touch(&file);

        let files = python_files(&file, &LintOptions::default()).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn non_python_file_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("readme.md");
        fs::write(&file, "hello").unwrap();

        let files = python_files(&file, &LintOptions::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let missing = Path::new("/nonexistent/injectlint-discovery-test");
        let err = python_files(missing, &LintOptions::default()).unwrap_err();
        assert!(matches!(err, LintError::FileNotFound { .. }));
    }
}
