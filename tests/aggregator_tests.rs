//! Project-level aggregation behavior

mod common;

use common::{TestProject, SELF_CONTAINED_OFFENDER};
use injectlint::{Linter, LintOptions};

#[test]
fn project_run_orders_findings_and_skips_noise() {
    let project = TestProject::new();
    project.mark_root();
    project.add_file("b.py", SELF_CONTAINED_OFFENDER);
    project.add_file("a.py", SELF_CONTAINED_OFFENDER);
    // Neither of these may contribute findings.
    project.add_file("pkg/__main__.py", SELF_CONTAINED_OFFENDER);
    project.add_file("venv/lib/dep.py", SELF_CONTAINED_OFFENDER);
    project.add_file("__pycache__/stale.py", SELF_CONTAINED_OFFENDER);

    let linter = Linter::with_defaults();
    let findings = linter.check_project(project.path(), None).unwrap();

    let files: Vec<_> = findings
        .iter()
        .map(|f| f.file.strip_prefix(project.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        files,
        vec![
            std::path::PathBuf::from("a.py"),
            std::path::PathBuf::from("b.py"),
        ]
    );
    assert!(findings.iter().all(|f| f.violation.line == 6));
}

#[test]
fn single_file_target_works_like_a_tiny_project() {
    let project = TestProject::new();
    let file = project.add_file("only.py", SELF_CONTAINED_OFFENDER);

    let linter = Linter::with_defaults();
    let findings = linter.check_project(&file, None).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].file, file);
    assert_eq!(findings[0].violation.symbol, "only.settings");
}

#[test]
fn serial_run_parses_identical_sources_once() {
    let project = TestProject::new();
    project.mark_root();
    project.add_file("a.py", SELF_CONTAINED_OFFENDER);
    project.add_file("b.py", SELF_CONTAINED_OFFENDER);

    let options = LintOptions {
        concurrency: 1,
        ..LintOptions::default()
    };
    let linter = Linter::new(options);
    let findings = linter.check_project(project.path(), None).unwrap();

    assert_eq!(findings.len(), 2);
    // With one worker the second file must hit the tree cache.
    assert_eq!(linter.cache().stats().parses, 1);
}

#[test]
fn clean_project_produces_no_findings() {
    let project = TestProject::new();
    project.mark_root();
    project.add_file("app.py", "def main():\n    return 0\n");
    project.add_file("util.py", "def helper(x):\n    return x\n");

    let linter = Linter::with_defaults();
    let findings = linter.check_project(project.path(), None).unwrap();
    assert!(findings.is_empty());
}
