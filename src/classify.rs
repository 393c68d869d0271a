//! Top-level symbol classification.
//!
//! Walks the direct children of a module node and records every
//! function and class definition together with the role its decorators
//! assign to it. The resulting [`SymbolRegistry`] is what the misuse
//! detector consults when it sees a bare name.

use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use tree_sitter::Node;

use crate::cache::AnalysisCache;
use crate::error::{LintError, Result};
use crate::parsing::{get_node_text, ParsedSource};

/// Role a top-level symbol plays in the injection graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    /// `@injected` function. Dependencies come before the `/` marker;
    /// calling or referencing it directly yields a proxy, not a value.
    Injected,
    /// `@instance` provider. Every parameter is a dependency and the
    /// container builds the value eagerly.
    Instance,
    /// `@injected_pytest` test function. Every parameter is a dependency.
    InjectedPytest,
    /// Function without a recognized decorator.
    Plain,
    /// Class definition. Decorators on classes are not inspected.
    Class,
}

impl SymbolRole {
    /// Whether a direct reference to a symbol of this role is a misuse.
    pub fn is_injectable(&self) -> bool {
        matches!(
            self,
            SymbolRole::Injected | SymbolRole::Instance | SymbolRole::InjectedPytest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolRole::Injected => "injected",
            SymbolRole::Instance => "instance",
            SymbolRole::InjectedPytest => "injected_pytest",
            SymbolRole::Plain => "plain",
            SymbolRole::Class => "class",
        }
    }
}

/// Classification record for one top-level symbol.
#[derive(Debug, Clone)]
pub struct SymbolTag {
    pub role: SymbolRole,
    /// Module the symbol was defined in, as a file stem.
    pub module: String,
}

/// Symbols keyed by `module.symbol`, for one module or a merged view
/// of a module plus everything it imports.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    module: String,
    symbols: AHashMap<String, SymbolTag>,
}

impl SymbolRegistry {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            symbols: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, role: SymbolRole) {
        let tag = SymbolTag {
            role,
            module: self.module.clone(),
        };
        self.symbols.insert(format!("{}.{}", self.module, name), tag);
    }

    /// Absorb another registry's symbols. Keys collide on equal
    /// `module.symbol` pairs, in which case the newer entry wins.
    pub fn merge(&mut self, other: &SymbolRegistry) {
        for (key, tag) in &other.symbols {
            self.symbols.insert(key.clone(), tag.clone());
        }
    }

    /// Resolve a bare name to its tag.
    ///
    /// Tries `{module}.{name}` first, then the bare name, then scans
    /// for any key ending in `.{name}`. The suffix scan means a name
    /// imported from elsewhere still resolves; when several modules
    /// define the same symbol the winner is unspecified.
    pub fn lookup(&self, name: &str) -> Option<(String, &SymbolTag)> {
        let qualified = format!("{}.{}", self.module, name);
        if let Some(tag) = self.symbols.get(&qualified) {
            return Some((qualified, tag));
        }
        // Bare hits are still reported under the current module.
        if let Some(tag) = self.symbols.get(name) {
            return Some((qualified, tag));
        }
        let suffix = format!(".{name}");
        for (full, tag) in &self.symbols {
            if full.ends_with(&suffix) {
                return Some((full.clone(), tag));
            }
        }
        None
    }

    /// Exact-key access, mainly for tests.
    pub fn get(&self, qualified: &str) -> Option<&SymbolTag> {
        self.symbols.get(qualified)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Module name for a file, taken from its stem. `pkg/config.py`
/// becomes `config`; `pkg/__init__.py` becomes `__init__`.
pub fn module_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Classify a source text, going through the shared caches.
///
/// Parses at most once per distinct text and reuses a previously built
/// registry when the same text/module pair was classified before.
pub fn classify_source(
    cache: &AnalysisCache,
    source: &str,
    module: &str,
) -> Result<Arc<SymbolRegistry>> {
    if let Some(hit) = cache.registry(source, module) {
        return Ok(hit);
    }
    let parsed = cache.parse(source)?;
    let registry = Arc::new(build_registry(&parsed, module));
    cache.store_registry(source, module, Arc::clone(&registry));
    Ok(registry)
}

/// Classify a file on disk, deriving the module name from its stem.
pub fn classify_file(cache: &AnalysisCache, path: &Path) -> Result<Arc<SymbolRegistry>> {
    let source = std::fs::read_to_string(path).map_err(|_| LintError::FileNotFound {
        path: path.display().to_string(),
    })?;
    classify_source(cache, &source, &module_stem(path))
}

/// Build a registry from the top-level definitions of a parsed module.
///
/// Only direct children of the module node are considered. Nested
/// functions and conditionally defined symbols stay out of the
/// registry; the detector evaluates those from their own decorators
/// when it walks into them.
pub fn build_registry(parsed: &ParsedSource, module: &str) -> SymbolRegistry {
    let mut registry = SymbolRegistry::new(module);
    let root = parsed.root();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        match child.kind() {
            "decorated_definition" => {
                let Some(def) = child.child_by_field_name("definition") else {
                    continue;
                };
                let Some(name) = def.child_by_field_name("name") else {
                    continue;
                };
                let role = match def.kind() {
                    "function_definition" => role_from_decorators(&child, &parsed.text),
                    "class_definition" => SymbolRole::Class,
                    _ => continue,
                };
                registry.insert(&get_node_text(&name, &parsed.text), role);
            }
            "function_definition" => {
                if let Some(name) = def_name(&child, &parsed.text) {
                    registry.insert(&name, SymbolRole::Plain);
                }
            }
            "class_definition" => {
                if let Some(name) = def_name(&child, &parsed.text) {
                    registry.insert(&name, SymbolRole::Class);
                }
            }
            _ => {}
        }
    }

    registry
}

fn def_name(node: &Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| get_node_text(&name, source))
}

/// Determine the role of a decorated function from its decorator list.
///
/// Recognizes `@injected`, `@instance`, and `@injected_pytest`, in
/// both bare and call form (`@injected_pytest(design)`). When several
/// recognized decorators are stacked, `@instance` takes precedence
/// over `@injected`, which takes precedence over `@injected_pytest`.
pub fn role_from_decorators(decorated: &Node, source: &str) -> SymbolRole {
    let mut role = SymbolRole::Plain;
    let mut cursor = decorated.walk();

    for child in decorated.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(found) = decorator_role(&child, source) else {
            continue;
        };
        role = match (role, found) {
            (_, SymbolRole::Instance) => SymbolRole::Instance,
            (SymbolRole::Instance, _) => SymbolRole::Instance,
            (_, SymbolRole::Injected) => SymbolRole::Injected,
            (SymbolRole::Injected, _) => SymbolRole::Injected,
            (_, found) => found,
        };
    }

    role
}

fn decorator_role(decorator: &Node, source: &str) -> Option<SymbolRole> {
    let expr = decorator.named_child(0)?;
    let name = match expr.kind() {
        "identifier" => get_node_text(&expr, source),
        "call" => {
            let func = expr.child_by_field_name("function")?;
            if func.kind() != "identifier" {
                return None;
            }
            get_node_text(&func, source)
        }
        // Attribute decorators like `@pinjected.injected` are not
        // recognized; only plain names participate.
        _ => return None,
    };

    match name.as_str() {
        "injected" => Some(SymbolRole::Injected),
        "instance" => Some(SymbolRole::Instance),
        "injected_pytest" => Some(SymbolRole::InjectedPytest),
        _ => None,
    }
}
