//! injectlint: decorator-aware misuse linting for Python dependency injection
//!
//! This library statically analyzes Python sources that use decorator-based
//! dependency injection (`@injected`, `@instance`, `@injected_pytest`). A
//! decorated function must not be referenced directly; it has to be requested
//! as a dependency parameter so the injection framework can supply it.
//! injectlint parses sources with tree-sitter, classifies top-level symbols,
//! resolves from-imports one level deep, and reports every direct reference
//! to an injectable symbol that was not declared as a dependency.
//!
//! # Example
//!
//! ```ignore
//! use injectlint::Linter;
//! use std::path::Path;
//!
//! let linter = Linter::with_defaults();
//! let violations = linter.check_file(Path::new("src/app.py"))?;
//! for v in &violations {
//!     println!("{}: {} in {}", v.line, v.symbol, v.function);
//! }
//! ```

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod detect;
pub mod discovery;
pub mod error;
pub mod imports;
pub mod parsing;
pub mod report;

// Re-export commonly used types
pub use aggregate::{Finding, ProgressFn};
pub use cache::{AnalysisCache, CacheStats};
pub use classify::{SymbolRegistry, SymbolRole, SymbolTag};
pub use config::LintOptions;
pub use detect::{Linter, Violation, ViolationKind};
pub use error::{LintError, Result};
