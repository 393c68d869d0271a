//! From-import resolution.
//!
//! Collects `from X import ...` statements, maps each `X` onto a file
//! inside the project, and classifies the resolved files so their
//! symbols become visible to the misuse detector. Resolution is one
//! level deep: imported modules are classified, their own imports are
//! not followed.

use std::path::{Path, PathBuf};

use ahash::AHashSet;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::cache::AnalysisCache;
use crate::classify::{classify_file, module_stem, SymbolRegistry};
use crate::config::LintOptions;
use crate::discovery;
use crate::parsing::{get_node_text, node_line, visit_all, ParsedSource};

/// Standard-library and third-party modules that never resolve to a
/// project file. First dotted segment is enough to match.
static EXTERNAL_MODULES: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "dataclasses",
        "pathlib",
        "typing",
        "loguru",
        "ast",
        "os",
        "sys",
        "collections",
        "re",
        "json",
        "time",
        "datetime",
        "logging",
        "pinjected",
    ]
    .into_iter()
    .collect()
});

/// One `from X import ...` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromImport {
    /// Dotted module path. Absent for `from . import x`.
    pub module: Option<String>,
    /// Number of leading dots. Zero for absolute imports.
    pub level: usize,
    pub line: usize,
}

/// Project root and optional `src` directory governing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub src_dir: Option<PathBuf>,
}

/// Walk upward from `start_dir` until a directory carries a root
/// marker or a `src` directory. Falls back to `start_dir` itself when
/// nothing matches all the way up.
pub fn find_project_layout(start_dir: &Path, options: &LintOptions) -> ProjectLayout {
    let mut current = start_dir.to_path_buf();

    loop {
        let src = current.join(&options.source_dir);
        let has_src = src.is_dir();

        if options.root_markers.iter().any(|m| current.join(m).exists()) {
            return ProjectLayout {
                root: current,
                src_dir: has_src.then_some(src),
            };
        }
        if has_src {
            return ProjectLayout {
                root: current,
                src_dir: Some(src),
            };
        }

        let Some(parent) = current.parent().map(Path::to_path_buf) else {
            break;
        };
        current = parent;
    }

    ProjectLayout {
        root: start_dir.to_path_buf(),
        src_dir: None,
    }
}

/// Collect every from-import in the tree, at any nesting depth.
/// Function-local imports count the same as module-level ones.
pub fn collect_from_imports(parsed: &ParsedSource) -> Vec<FromImport> {
    let mut imports = Vec::new();

    visit_all(&parsed.root(), |node| {
        if node.kind() != "import_from_statement" {
            return;
        }
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };

        match module_node.kind() {
            "dotted_name" => imports.push(FromImport {
                module: Some(get_node_text(&module_node, &parsed.text)),
                level: 0,
                line: node_line(node),
            }),
            "relative_import" => {
                let mut level = 0;
                let mut module = None;
                let mut cursor = module_node.walk();
                for child in module_node.children(&mut cursor) {
                    match child.kind() {
                        "import_prefix" => {
                            level = get_node_text(&child, &parsed.text).matches('.').count();
                        }
                        "dotted_name" => {
                            module = Some(get_node_text(&child, &parsed.text));
                        }
                        _ => {}
                    }
                }
                imports.push(FromImport {
                    module,
                    level,
                    line: node_line(node),
                });
            }
            _ => {}
        }
    });

    imports
}

/// Resolve one from-import to a file on disk.
///
/// Absolute imports try `a/b.py` then `a/b/__init__.py` under the
/// importing file's directory, the project `src` directory, and the
/// project root, in that order, with a recursive search for the last
/// path segment as a final fallback. Relative imports climb
/// `level - 1` directories from the importing file's directory first.
/// External modules and misses resolve to `None`.
pub fn resolve_module(import: &FromImport, file: &Path, options: &LintOptions) -> Option<PathBuf> {
    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));

    if import.level == 0 {
        let module = import.module.as_deref()?;
        if is_external(module) {
            debug!(module, "skipping external import");
            return None;
        }
        let resolved = resolve_absolute(module, base_dir, options);
        if resolved.is_none() {
            debug!(module, line = import.line, "unresolved absolute import");
        }
        resolved
    } else {
        resolve_relative(import, base_dir)
    }
}

fn resolve_absolute(module: &str, base_dir: &Path, options: &LintOptions) -> Option<PathBuf> {
    let layout = find_project_layout(base_dir, options);
    let rel: PathBuf = module.split('.').collect();

    let mut bases = vec![base_dir.to_path_buf()];
    if let Some(src) = &layout.src_dir {
        bases.push(src.clone());
    }
    if layout.root != base_dir {
        bases.push(layout.root.clone());
    }

    for base in &bases {
        let file_candidate = base.join(&rel).with_extension("py");
        if file_candidate.is_file() {
            return Some(file_candidate);
        }
        let init_candidate = base.join(&rel).join("__init__.py");
        if init_candidate.is_file() {
            return Some(init_candidate);
        }
    }

    // Last resort: hunt for the final segment anywhere under src (or
    // the project root when there is no src layout).
    let last = module.rsplit('.').next()?;
    let search_root = layout.src_dir.as_deref().unwrap_or(&layout.root);
    let target = format!("{last}.py");
    let mut matches: Vec<PathBuf> = discovery::python_files(search_root, options)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(target.as_str()))
        .collect();
    matches.sort();

    if let Some(found) = matches.into_iter().next() {
        debug!(module, path = %found.display(), "resolved import by filename search");
        return Some(found);
    }

    None
}

fn resolve_relative(import: &FromImport, base_dir: &Path) -> Option<PathBuf> {
    let mut dir = base_dir.to_path_buf();
    for _ in 1..import.level {
        dir = dir.parent()?.to_path_buf();
    }

    let target = match &import.module {
        Some(module) => {
            let rel: PathBuf = module.split('.').collect();
            dir.join(rel)
        }
        None => dir,
    };

    let file_candidate = target.with_extension("py");
    if file_candidate.is_file() {
        return Some(file_candidate);
    }
    let init_candidate = target.join("__init__.py");
    if init_candidate.is_file() {
        return Some(init_candidate);
    }

    debug!(
        level = import.level,
        module = ?import.module,
        line = import.line,
        "unresolved relative import"
    );
    None
}

/// Build the registry of everything `file` imports.
///
/// Each resolvable import is classified and merged into one registry.
/// Unresolvable imports and imported files that fail to read or parse
/// are logged and skipped; they never fail the importing file.
pub fn imported_registry(
    cache: &AnalysisCache,
    parsed: &ParsedSource,
    file: &Path,
    options: &LintOptions,
) -> SymbolRegistry {
    let mut merged = SymbolRegistry::new(module_stem(file));

    for import in collect_from_imports(parsed) {
        let Some(path) = resolve_module(&import, file, options) else {
            continue;
        };
        match classify_file(cache, &path) {
            Ok(registry) => merged.merge(&registry),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unclassifiable import");
            }
        }
    }

    merged
}

fn is_external(module: &str) -> bool {
    let first = module.split('.').next().unwrap_or(module);
    EXTERNAL_MODULES.contains(module) || EXTERNAL_MODULES.contains(first)
}
