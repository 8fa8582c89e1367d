//! ptrequality
//!
//! Reports comparisons against the address of a newly allocated variable in
//! Go source: `p == &T{}`, `new(T) != q` and `errors.Is(err, &T{})`. The
//! result of such a comparison is always false, or undefined for zero-size
//! types. Sources are lexed, parsed and type checked by the front end in
//! [`compiler`], then handed to the [`analysis::Analyzer`].

pub mod analysis;
pub mod compiler;
pub mod diagnostics;

use compiler::ast::SourceFile;
use compiler::check::{check_package, CheckedPackage};
use compiler::lexer::Lexer;
use compiler::parser::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const NAME: &str = "ptrequality";

pub const DOC: &str = "check for comparisons against the address of a newly allocated variable

Comparing a pointer with the address of a variable created by &T{} or new(T)
is always false: the new variable cannot be aliased yet. Pointers to
distinct zero-size variables may or may not compare equal, so for those the
result is false or undefined. Calls to errors.Is compare by identity unless
an Is method on the error chain intercepts the comparison.";

// ── Configuration ─────────────────────────────────────────────────

/// Options of a run, read from `ptrequality.toml` or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Consider `Is` and `Unwrap` methods that may intercept `errors.Is`.
    pub check_is: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { check_is: true }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}

// ── Loading ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{file}: {source}")]
    Lex { file: String, source: compiler::lexer::LexError },
    #[error("{file}: {source}")]
    Parse { file: String, source: compiler::parser::ParseError },
    #[error("{file}: found package {found}, expected {expected}")]
    PackageMismatch { file: String, found: String, expected: String },
    #[error("no source files")]
    NoFiles,
}

impl CompileError {
    /// File the error was found in, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            CompileError::Lex { file, .. }
            | CompileError::Parse { file, .. }
            | CompileError::PackageMismatch { file, .. } => Some(file),
            CompileError::NoFiles => None,
        }
    }

    /// 1-based line and column of the error, if known.
    pub fn position(&self) -> Option<(usize, usize)> {
        use compiler::lexer::LexError;
        use compiler::parser::ParseError;
        match self {
            CompileError::Lex { source, .. } => match *source {
                LexError::UnexpectedChar { line, col, .. }
                | LexError::UnterminatedString { line, col }
                | LexError::UnterminatedChar { line, col }
                | LexError::UnterminatedComment { line, col }
                | LexError::InvalidNumber { line, col } => Some((line, col)),
            },
            CompileError::Parse { source, .. } => match *source {
                ParseError::Unexpected { line, col, .. } | ParseError::Invalid { line, col, .. } => Some((line, col)),
                ParseError::UnexpectedEof => None,
            },
            _ => None,
        }
    }
}

/// Parse `(file name, source)` pairs as one package and type check it.
///
/// All files must declare the same package; its name is the package path.
pub fn load_package(sources: &[(&str, &str)]) -> Result<CheckedPackage, CompileError> {
    let mut files: Vec<SourceFile> = Vec::with_capacity(sources.len());
    let mut next_id = 0;
    for (name, source) in sources {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|source| CompileError::Lex { file: name.to_string(), source })?;
        let mut parser = Parser::with_id_base(tokens, next_id);
        let file = parser
            .parse_file(name)
            .map_err(|source| CompileError::Parse { file: name.to_string(), source })?;
        next_id = parser.next_id();
        if let Some(first) = files.first() {
            if first.package.name != file.package.name {
                return Err(CompileError::PackageMismatch {
                    file: name.to_string(),
                    found: file.package.name.clone(),
                    expected: first.package.name.clone(),
                });
            }
        }
        files.push(file);
    }
    let path = files.first().map(|f| f.package.name.clone()).ok_or(CompileError::NoFiles)?;
    debug!(package = %path, files = files.len(), "parsed package");
    Ok(check_package(&path, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;

    #[test]
    fn test_config_defaults_and_overrides() {
        assert!(Config::default().check_is);
        assert!(Config::from_toml_str("").unwrap().check_is);
        assert!(!Config::from_toml_str("check-is = false\n").unwrap().check_is);
        assert!(matches!(Config::from_toml_str("check-is = \"no\"\n"), Err(ConfigError::Toml(_))));
        assert!(Config::from_toml_str("check_is = false\n").is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = Config::load("/nonexistent/ptrequality.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/ptrequality.toml"));
    }

    #[test]
    fn test_load_package_assigns_unique_ids_across_files() {
        let pkg = load_package(&[
            ("a.go", "package a\n\nfunc f() bool { return new(int) == nil }\n"),
            ("b.go", "package a\n\nfunc g() bool { return new(int) == nil }\n"),
        ])
        .unwrap();
        assert_eq!(pkg.path, "a");
        let mut ids = Vec::new();
        analysis::walk::for_each_expr(&pkg, |e| ids.push(e.id));
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(Analyzer::default().run(&pkg).len(), 2);
    }

    #[test]
    fn test_load_package_errors() {
        let err = load_package(&[("a.go", "package a\n\nvar s = \"open\n")]).unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
        assert_eq!(err.file(), Some("a.go"));
        assert_eq!(err.position().map(|p| p.0), Some(3));

        let err = load_package(&[("a.go", "package a\n\nfunc {\n")]).unwrap_err();
        assert!(matches!(err, CompileError::Parse { .. }));

        let err = load_package(&[("a.go", "package a\n"), ("b.go", "package b\n")]).unwrap_err();
        assert!(matches!(err, CompileError::PackageMismatch { .. }));
        assert!(matches!(load_package(&[]), Err(CompileError::NoFiles)));
    }
}
