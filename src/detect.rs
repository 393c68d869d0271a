//! Misuse detection.
//!
//! Walks function bodies with a stack of enclosing function frames and
//! flags bare-name references to symbols whose role requires them to be
//! requested as dependencies instead. A reference is exempt when any
//! enclosing frame declares the name as a dependency, shares its name
//! with it, or is annotated to return `IProxy`.

use std::path::Path;

use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use tree_sitter::Node;

use crate::cache::AnalysisCache;
use crate::classify::{
    classify_source, module_stem, role_from_decorators, SymbolRegistry, SymbolRole,
};
use crate::config::LintOptions;
use crate::error::Result;
use crate::imports::imported_registry;
use crate::parsing::{get_node_text, node_line, ParsedSource};

/// Marker comment that exempts a whole file from analysis, e.g.
/// `# injectlint: skip` anywhere in the source.
static IGNORE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#\s*injectlint:\s*(ignore|skip)").unwrap());

/// Why a reference was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A dependency-role symbol was referenced directly.
    DirectAccess,
    /// The symbol was requested, but as a regular parameter of an
    /// `@injected` function instead of before the `/` marker.
    WrongParameterPlacement,
}

impl ViolationKind {
    pub fn message(&self) -> &'static str {
        match self {
            ViolationKind::DirectAccess => {
                "direct access to an injected symbol; request it in the function arguments"
            }
            ViolationKind::WrongParameterPlacement => {
                "dependency placed after `/`; dependencies of an @injected function go before `/`"
            }
        }
    }
}

/// One flagged reference inside a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Outermost enclosing function of the reference.
    pub function: String,
    /// Qualified `module.symbol` name the reference resolved to.
    pub symbol: String,
    /// 1-based source line of the reference.
    pub line: usize,
    pub kind: ViolationKind,
}

/// Whether `source` opts out of analysis via the ignore marker.
pub fn is_ignored(source: &str) -> bool {
    IGNORE_MARKER.is_match(source)
}

struct Frame {
    name: String,
    role: SymbolRole,
    /// Parameters that count as declared dependencies for this role.
    dependencies: AHashSet<String>,
    /// Named parameters in non-dependency positions; meaningful only
    /// for `@injected` frames.
    misplaced_params: AHashSet<String>,
    returns_deferred: bool,
}

/// Detect misuses in a parsed module against a merged registry.
///
/// Violations come back sorted by line, then symbol.
pub fn detect_misuses(parsed: &ParsedSource, registry: &SymbolRegistry) -> Vec<Violation> {
    let mut detector = Detector {
        source: &parsed.text,
        registry,
        stack: Vec::new(),
        violations: Vec::new(),
    };
    detector.walk(parsed.root());

    let mut violations = detector.violations;
    violations.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.symbol.cmp(&b.symbol)));
    violations
}

struct Detector<'a> {
    source: &'a str,
    registry: &'a SymbolRegistry,
    stack: Vec<Frame>,
    violations: Vec<Violation>,
}

impl<'a> Detector<'a> {
    fn walk(&mut self, node: Node<'a>) {
        match node.kind() {
            "decorated_definition" => {
                let Some(def) = node.child_by_field_name("definition") else {
                    return;
                };
                match def.kind() {
                    "function_definition" => self.walk_function(def, Some(node)),
                    "class_definition" => self.walk_class(def),
                    _ => {}
                }
            }
            "function_definition" => self.walk_function(node, None),
            "class_definition" => self.walk_class(node),

            // Import clauses, global/nonlocal declarations, and
            // parameter lists bind names rather than read them.
            "import_statement" | "import_from_statement" | "future_import_statement" => {}
            "global_statement" | "nonlocal_statement" => {}

            "attribute" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.walk(object);
                }
            }
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.walk(value);
                }
            }
            "assignment" | "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.walk_target(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right);
                }
            }
            "for_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.walk_target(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
                if let Some(alternative) = node.child_by_field_name("alternative") {
                    self.walk(alternative);
                }
            }
            "for_in_clause" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.walk_target(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.walk(right);
                }
            }
            "named_expression" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.walk(value);
                }
            }
            "as_pattern" => {
                if let Some(value) = node.named_child(0) {
                    self.walk(value);
                }
            }
            "lambda" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk(body);
                }
            }

            "identifier" => {
                let name = get_node_text(&node, self.source);
                self.on_reference(&name, node_line(&node));
            }

            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child);
                }
            }
        }
    }

    /// Assignment targets bind names; only the value reads buried in
    /// them (attribute bases, subscript indexes) count as references.
    fn walk_target(&mut self, node: Node<'a>) {
        match node.kind() {
            "identifier" => {}
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk_target(child);
                }
            }
            "list_splat_pattern" => {
                if let Some(inner) = node.named_child(0) {
                    self.walk_target(inner);
                }
            }
            _ => self.walk(node),
        }
    }

    fn walk_function(&mut self, def: Node<'a>, decorated: Option<Node<'a>>) {
        let name = def
            .child_by_field_name("name")
            .map(|n| get_node_text(&n, self.source))
            .unwrap_or_default();
        let role = decorated
            .map(|d| role_from_decorators(&d, self.source))
            .unwrap_or(SymbolRole::Plain);

        let (before_slash, after_slash) = split_parameters(&def, self.source);
        let (dependencies, misplaced_params) = match role {
            SymbolRole::Instance | SymbolRole::InjectedPytest => (
                before_slash.into_iter().chain(after_slash).collect(),
                AHashSet::new(),
            ),
            SymbolRole::Injected => (
                before_slash.into_iter().collect(),
                after_slash.into_iter().collect(),
            ),
            SymbolRole::Plain | SymbolRole::Class => (AHashSet::new(), AHashSet::new()),
        };

        self.stack.push(Frame {
            name,
            role,
            dependencies,
            misplaced_params,
            returns_deferred: returns_deferred(&def, self.source),
        });
        if let Some(body) = def.child_by_field_name("body") {
            self.walk(body);
        }
        self.stack.pop();
    }

    /// Class bodies are walked without a frame of their own; methods
    /// inside push frames as ordinary functions.
    fn walk_class(&mut self, def: Node<'a>) {
        if let Some(body) = def.child_by_field_name("body") {
            self.walk(body);
        }
    }

    fn on_reference(&mut self, name: &str, line: usize) {
        // Module-level and class-level references are configuration,
        // not function-body misuse.
        let Some(innermost) = self.stack.last() else {
            return;
        };
        // Own-name recursion and the deferred-result opt-out are
        // properties of the innermost frame only; declared dependencies
        // are visible from every frame on the path.
        if innermost.name == name || innermost.returns_deferred {
            return;
        }
        if self.stack.iter().any(|f| f.dependencies.contains(name)) {
            return;
        }

        let Some((qualified, tag)) = self.registry.lookup(name) else {
            return;
        };
        if !tag.role.is_injectable() {
            return;
        }

        let kind = if innermost.role == SymbolRole::Injected
            && innermost.misplaced_params.contains(name)
        {
            ViolationKind::WrongParameterPlacement
        } else {
            ViolationKind::DirectAccess
        };

        let function = self.stack[0].name.clone();
        warn!(
            function = %function,
            symbol = %qualified,
            role = tag.role.as_str(),
            line,
            "misuse of injected symbol"
        );
        self.violations.push(Violation {
            function,
            symbol: qualified,
            line,
            kind,
        });
    }
}

/// Named parameters of a function, split at the `/` marker. Splat
/// parameters (`*args`, `**kwargs`) and tuple patterns are dropped.
fn split_parameters(def: &Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let Some(params) = def.child_by_field_name("parameters") else {
        return (before, after);
    };

    let mut seen_slash = false;
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        let name = match child.kind() {
            "positional_separator" => {
                seen_slash = true;
                continue;
            }
            "keyword_separator" => continue,
            "identifier" => Some(get_node_text(&child, source)),
            "typed_parameter" => child
                .named_child(0)
                .filter(|n| n.kind() == "identifier")
                .map(|n| get_node_text(&n, source)),
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
                .map(|n| get_node_text(&n, source)),
            _ => None,
        };

        if let Some(name) = name {
            if seen_slash {
                after.push(name);
            } else {
                before.push(name);
            }
        }
    }

    // Without a `/` marker nothing is positional-only.
    if !seen_slash {
        return (Vec::new(), before);
    }
    (before, after)
}

/// Whether the function's return annotation is `IProxy` or `IProxy[...]`.
fn returns_deferred(def: &Node, source: &str) -> bool {
    let Some(annotation) = def.child_by_field_name("return_type") else {
        return false;
    };
    let text = get_node_text(&annotation, source);
    let text = text.trim();
    text == "IProxy" || text.starts_with("IProxy[")
}

/// Shared front end over the classifier, resolver, and detector.
///
/// Owns the caches for a run; batch workers borrow it concurrently.
pub struct Linter {
    options: LintOptions,
    cache: AnalysisCache,
}

impl Linter {
    pub fn new(options: LintOptions) -> Self {
        Self {
            options,
            cache: AnalysisCache::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LintOptions::default())
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Check one file on disk.
    ///
    /// A path that does not exist yields no violations and touches
    /// neither the parser nor the caches.
    pub fn check_file(&self, path: &Path) -> Result<Vec<Violation>> {
        if !path.exists() {
            warn!(path = %path.display(), "file does not exist; nothing to check");
            return Ok(Vec::new());
        }
        let source = std::fs::read_to_string(path)?;
        self.check_source(&source, path)
    }

    /// Check already-loaded source text attributed to `path`.
    pub fn check_source(&self, source: &str, path: &Path) -> Result<Vec<Violation>> {
        if is_ignored(source) {
            info!(path = %path.display(), "ignore marker present; skipping file");
            return Ok(Vec::new());
        }

        let module = module_stem(path);
        let local = classify_source(&self.cache, source, &module)?;
        let parsed = self.cache.parse(source)?;

        // Imported entries override local ones on key collisions.
        let mut registry = SymbolRegistry::new(module);
        registry.merge(&local);
        registry.merge(&imported_registry(
            &self.cache,
            &parsed,
            path,
            &self.options,
        ));

        Ok(detect_misuses(&parsed, &registry))
    }
}
