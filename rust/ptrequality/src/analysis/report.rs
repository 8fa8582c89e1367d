//! Findings and their messages.

use crate::compiler::tokens::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The allocated type is never zero-size, so the addresses always differ
    AlwaysFalse,
    /// Zero-size types may share an address, or a method decides the result
    FalseOrUndefined,
}

impl Severity {
    pub fn describe(self) -> &'static str {
        match self {
            Severity::AlwaysFalse => "always false",
            Severity::FalseOrUndefined => "false or undefined",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub file: String,
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

/// Method named in the message when a comparison may be intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptNote {
    pub method: &'static str,
    pub owner: String,
}

pub fn message(ty: &str, severity: Severity, note: Option<&InterceptNote>) -> String {
    let mut msg = format!(
        "result of comparison with address of new variable of type \"{}\" is {}",
        ty,
        severity.describe()
    );
    if let Some(n) = note {
        msg.push_str(&format!(
            "; method \"{}\" of type \"{}\" may intercept the comparison",
            n.method, n.owner
        ));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            message("struct{_ int}", Severity::AlwaysFalse, None),
            "result of comparison with address of new variable of type \"struct{_ int}\" is always false"
        );
        let note = InterceptNote { method: "Is", owner: "myErrorWithIs".into() };
        assert_eq!(
            message("myErrorWithIs", Severity::FalseOrUndefined, Some(&note)),
            "result of comparison with address of new variable of type \"myErrorWithIs\" is false or undefined; \
             method \"Is\" of type \"myErrorWithIs\" may intercept the comparison"
        );
    }

    #[test]
    fn severity_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Severity::FalseOrUndefined).unwrap(), "\"false_or_undefined\"");
    }
}
