//! Batch analysis across many files.
//!
//! Fans file checks out over a bounded worker pool and merges the results
//! into one deterministically ordered list.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::detect::{Linter, Violation};
use crate::discovery;
use crate::error::Result;

/// Callback invoked after each file finishes: `(completed, total)`.
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// A violation tied to the file it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub file: PathBuf,
    #[serde(flatten)]
    pub violation: Violation,
}

impl Linter {
    /// Checks a batch of files with at most `concurrency` workers.
    ///
    /// Unreadable or unparsable files are logged and skipped so one bad file
    /// never aborts the batch. Findings come back sorted by file path, then
    /// line, then symbol name.
    pub fn check_files(&self, files: &[PathBuf], progress: Option<ProgressFn>) -> Vec<Finding> {
        let total = files.len();
        let completed = AtomicUsize::new(0);

        let run = || {
            files
                .par_iter()
                .map(|file| {
                    let violations = match self.check_file(file) {
                        Ok(violations) => violations,
                        Err(e) => {
                            warn!(file = %file.display(), error = %e, "skipping file");
                            Vec::new()
                        }
                    };
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(report) = &progress {
                        report(done, total);
                    }
                    violations
                        .into_iter()
                        .map(|violation| Finding {
                            file: file.clone(),
                            violation,
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        };

        // A dedicated pool caps the fan-out; the global pool sizes itself to
        // the machine instead of the configured limit.
        let limit = self.options().effective_concurrency();
        let nested = match rayon::ThreadPoolBuilder::new().num_threads(limit).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(error = %e, "falling back to the global thread pool");
                run()
            }
        };

        let mut findings: Vec<Finding> = nested.into_iter().flatten().collect();
        findings.sort_by(|a, b| {
            (&a.file, a.violation.line, &a.violation.symbol).cmp(&(
                &b.file,
                b.violation.line,
                &b.violation.symbol,
            ))
        });
        findings
    }

    /// Discovers Python files under `root` and checks them all.
    ///
    /// Entry-point scripts named in [`crate::config::LintOptions::excluded_files`]
    /// are dropped before the batch runs.
    pub fn check_project(
        &self,
        root: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<Finding>> {
        let mut files = discovery::python_files(root, self.options())?;
        files.retain(|f| !self.options().is_excluded_file(f));
        info!(files = files.len(), root = %root.display(), "checking project");
        Ok(self.check_files(&files, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ViolationKind;
    use std::fs;
    use std::sync::Arc;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    const OFFENDER: &str = "@instance\ndef settings():\n    return {}\n\ndef run():\n    return settings\n";

    #[test]
    fn batch_merges_and_sorts_by_file_then_line() {
        let dir = tempfile::tempdir().unwrap();
        let b = write(dir.path(), "b.py", OFFENDER);
        let a = write(
            dir.path(),
            "a.py",
            "@instance\ndef db():\n    return None\n\ndef late():\n    x = 1\n    return db\n\ndef early():\n    return db\n",
        );

        let linter = Linter::with_defaults();
        let findings = linter.check_files(&[b.clone(), a.clone()], None);

        let keys: Vec<_> = findings
            .iter()
            .map(|f| (f.file.clone(), f.violation.line))
            .collect();
        assert_eq!(keys, vec![(a.clone(), 7), (a, 10), (b, 6)]);
        assert!(findings
            .iter()
            .all(|f| f.violation.kind == ViolationKind::DirectAccess));
    }

    #[test]
    fn unreadable_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.py", OFFENDER);
        let missing = dir.path().join("gone.py");

        let linter = Linter::with_defaults();
        let findings = linter.check_files(&[missing, good], None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].violation.symbol, "good.settings");
    }

    #[test]
    fn parse_errors_do_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write(dir.path(), "broken.py", "def broken(:\n    pass\n");
        let good = write(dir.path(), "ok.py", OFFENDER);

        let linter = Linter::with_defaults();
        let findings = linter.check_files(&[broken, good.clone()], None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file, good);
        assert_eq!(findings[0].violation.symbol, "ok.settings");
    }

    #[test]
    fn progress_callback_sees_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<_> = (0..5)
            .map(|i| write(dir.path(), &format!("m{i}.py"), "x = 1\n"))
            .collect();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let progress: ProgressFn = Box::new(move |done, total| {
            assert!(done <= total);
            assert_eq!(total, 5);
            seen.fetch_add(1, Ordering::Relaxed);
        });

        let linter = Linter::with_defaults();
        linter.check_files(&files, Some(progress));
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn project_run_skips_entry_point_scripts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pkg/app.py", OFFENDER);
        write(dir.path(), "pkg/__main__.py", OFFENDER);

        let linter = Linter::with_defaults();
        let findings = linter.check_project(dir.path(), None).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].file.ends_with("pkg/app.py"));
    }

    #[test]
    fn missing_project_root_is_an_error() {
        let linter = Linter::with_defaults();
        let err = linter
            .check_project(Path::new("/nonexistent/injectlint-batch-test"), None)
            .unwrap_err();
        assert!(matches!(err, crate::error::LintError::FileNotFound { .. }));
    }
}
