//! Rendering of findings and load errors, with optional source excerpts and
//! colors.

use crate::analysis::report::Finding;
use crate::compiler::parser::ParseError;
use crate::CompileError;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A rendered diagnostic with source context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
    /// Numbered source lines shown below the header
    pub excerpt: Vec<(usize, String)>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// `file:line:col: message`, the location part shortened when unknown.
    fn header(&self) -> String {
        match (&self.file, self.line, self.col) {
            (Some(file), Some(line), Some(col)) => format!("{}:{}:{}: {}", file, line, col, self.message),
            (Some(file), Some(line), None) => format!("{}:{}: {}", file, line, self.message),
            (Some(file), None, _) => format!("{}: {}", file, self.message),
            (None, ..) => self.message.clone(),
        }
    }

    /// Render with ANSI colors for terminal
    pub fn render_ansi(&self) -> String {
        let label = match self.severity {
            Severity::Error => red("error"),
            Severity::Warning => yellow("warning"),
        };
        let mut out = format!("{}: {}\n", label, bold(&self.header()));
        for (n, text) in &self.excerpt {
            let number = format!("{:>4}", n);
            if Some(*n) == self.line {
                out.push_str(&format!("{} {} {}\n", bold(&number), cyan("|"), text));
            } else {
                out.push_str(&format!("{} {} {}\n", cyan(&number), cyan("|"), text));
            }
        }
        for suggestion in &self.suggestions {
            out.push_str(&format!("     {} {}: {}\n", cyan("="), cyan("help"), suggestion));
        }
        out
    }

    /// Render without colors, the `go vet` way
    pub fn render_plain(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for (n, text) in &self.excerpt {
            out.push_str(&format!("\t{}\t{}\n", n, text));
        }
        for suggestion in &self.suggestions {
            out.push_str(&format!("\thelp: {}\n", suggestion));
        }
        out
    }
}

// ANSI color helpers
fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}

fn yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}

fn cyan(s: &str) -> String {
    format!("\x1b[36m{}\x1b[0m", s)
}

fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// Lines `line - context ..= line + context` of `source`; nothing for a
/// negative context.
fn excerpt(source: &str, line: usize, context: i64) -> Vec<(usize, String)> {
    if context < 0 || line == 0 {
        return Vec::new();
    }
    let context = usize::try_from(context).unwrap_or(usize::MAX);
    let first = line.saturating_sub(context).max(1);
    let last = line.saturating_add(context);
    source
        .lines()
        .enumerate()
        .map(|(i, text)| (i + 1, text))
        .skip(first - 1)
        .take_while(|(n, _)| *n <= last)
        .map(|(n, text)| (n, text.to_string()))
        .collect()
}

// Edit distance for suggestions
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    #[allow(clippy::needless_range_loop)]
    for i in 0..=a_len {
        matrix[i][0] = i;
    }
    #[allow(clippy::needless_range_loop)]
    for j in 0..=b_len {
        matrix[0][j] = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}

fn suggest_similar(name: &str, candidates: &[&str], max_distance: usize) -> Vec<String> {
    let mut matches: Vec<(usize, String)> = candidates
        .iter()
        .filter_map(|c| {
            let d = edit_distance(name, c);
            (d <= max_distance).then(|| (d, c.to_string()))
        })
        .collect();

    matches.sort_by_key(|(d, _)| *d);
    matches.into_iter().map(|(_, s)| s).take(3).collect()
}

// Go keywords for suggestions
const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough", "for",
    "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

/// A finding with `context` lines of source around it (`-1` for none).
pub fn format_finding(finding: &Finding, source: Option<&str>, context: i64) -> Diagnostic {
    Diagnostic {
        severity: Severity::Warning,
        message: finding.message.clone(),
        file: Some(finding.file.clone()),
        line: Some(finding.span.line),
        col: Some(finding.span.col),
        excerpt: source.map(|s| excerpt(s, finding.span.line, context)).unwrap_or_default(),
        suggestions: Vec::new(),
    }
}

/// A load error, with the offending line when the source is at hand.
pub fn format_compile_error(error: &CompileError, source: Option<&str>) -> Diagnostic {
    let position = error.position();
    let message = match error {
        CompileError::Lex { source, .. } => source.to_string(),
        CompileError::Parse { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    let suggestions = match error {
        // a misspelled keyword usually shows up as an unexpected identifier
        CompileError::Parse { source: ParseError::Unexpected { found, .. }, .. } => {
            suggest_similar(found, KEYWORDS, 2)
                .into_iter()
                .filter(|s| s != found)
                .map(|s| format!("did you mean `{}`?", s))
                .collect()
        }
        _ => Vec::new(),
    };
    Diagnostic {
        severity: Severity::Error,
        message,
        file: error.file().map(str::to_string),
        line: position.map(|p| p.0),
        col: position.map(|p| p.1),
        excerpt: match (source, position) {
            (Some(s), Some((line, _))) => excerpt(s, line, 0),
            _ => Vec::new(),
        },
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::Severity as FindingSeverity;
    use crate::compiler::tokens::Span;

    fn finding(line: usize, col: usize) -> Finding {
        Finding {
            file: "a.go".into(),
            span: Span::new(0, 0, line, col),
            severity: FindingSeverity::AlwaysFalse,
            message: "result of comparison with address of new variable of type \"int\" is always false".into(),
        }
    }

    #[test]
    fn test_excerpt() {
        let source = "line 1\nline 2\nline 3\nline 4\n";
        assert!(excerpt(source, 2, -1).is_empty());
        assert_eq!(excerpt(source, 2, 0), vec![(2, "line 2".to_string())]);
        assert_eq!(
            excerpt(source, 1, 1),
            vec![(1, "line 1".to_string()), (2, "line 2".to_string())]
        );
        assert_eq!(excerpt(source, 4, 5).len(), 4);
        assert!(excerpt(source, 9, 0).is_empty());
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("a", ""), 1);
        assert_eq!(edit_distance("", "a"), 1);
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("abc", "abd"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_suggest_similar() {
        let suggestions = suggest_similar("fucn", KEYWORDS, 2);
        assert_eq!(suggestions.first().map(String::as_str), Some("func"));
        assert!(suggestions.len() <= 3);
        assert!(suggest_similar("xyzzy", KEYWORDS, 1).is_empty());
    }

    #[test]
    fn test_render_finding_plain() {
        let source = "package a\n\nfunc f() bool {\n\treturn new(int) == nil\n}\n";
        let plain = format_finding(&finding(4, 9), Some(source), 1).render_plain();
        assert_eq!(
            plain,
            "a.go:4:9: result of comparison with address of new variable of type \"int\" is always false\n\
             \t3\tfunc f() bool {\n\t4\t\treturn new(int) == nil\n\t5\t}\n"
        );
        let bare = format_finding(&finding(4, 9), Some(source), -1).render_plain();
        assert_eq!(bare.lines().count(), 1);
    }

    #[test]
    fn test_render_ansi_has_colors() {
        let ansi = format_finding(&finding(1, 1), None, -1).render_ansi();
        assert!(ansi.contains("\x1b[33mwarning"));
        assert!(ansi.contains("a.go:1:1"));
    }

    #[test]
    fn test_format_compile_error() {
        let err = CompileError::Parse {
            file: "a.go".into(),
            source: ParseError::Unexpected {
                found: "fucn".into(),
                expected: "declaration".into(),
                line: 3,
                col: 1,
            },
        };
        let diag = format_compile_error(&err, Some("package a\n\nfucn f() {}\n"));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!((diag.line, diag.col), (Some(3), Some(1)));
        assert_eq!(diag.excerpt, vec![(3, "fucn f() {}".to_string())]);
        assert_eq!(diag.suggestions, vec!["did you mean `func`?".to_string()]);
        assert!(diag.render_plain().starts_with("a.go:3:1: unexpected token fucn"));
    }
}
