//! Detection of comparisons against the address of a freshly allocated
//! variable.
//!
//! `&T{}` and `new(T)` create a new variable, so comparing the resulting
//! pointer with anything is always false, except that pointers to distinct
//! zero-size variables may or may not be equal. Calls to `errors.Is` and
//! friends compare by identity too unless an `Is` method along the error
//! chain decides otherwise.

pub mod alloc;
pub mod chain;
pub mod report;
pub mod resolve;
pub mod size;
pub mod walk;

use crate::analysis::alloc::{classify, classify_argument, Classification};
use crate::analysis::chain::Interception;
use crate::analysis::report::{message, Finding, InterceptNote, Severity};
use crate::analysis::size::{size_class, SizeClass};
use crate::analysis::walk::{collect_sites, ComparisonSite, SiteKind};
use crate::compiler::check::CheckedPackage;
use crate::Config;
use tracing::debug;

/// Runs the check over checked packages. Holds nothing but its
/// configuration, so one analyzer can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: Config,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Findings for `pkg` in source order, at most one per site.
    pub fn run(&self, pkg: &CheckedPackage) -> Vec<Finding> {
        let sites = collect_sites(pkg);
        debug!(package = %pkg.path, sites = sites.len(), "analysing");
        sites.iter().filter_map(|site| self.judge(pkg, site)).collect()
    }

    fn judge(&self, pkg: &CheckedPackage, site: &ComparisonSite<'_>) -> Option<Finding> {
        let (fresh, interception) = match site.kind {
            SiteKind::Equal | SiteKind::NotEqual => {
                let fresh = site.operands.iter().map(|e| classify(pkg, e)).find(Classification::is_fresh)?;
                (fresh, None)
            }
            SiteKind::Call(func) => {
                let fresh = site
                    .operands
                    .iter()
                    .map(|e| classify_argument(pkg, func, e))
                    .find(Classification::is_fresh)?;
                if !func.compares() || site.operands.len() != 2 {
                    debug!(line = site.span.line, col = site.span.col, func = func.name(), "call does not compare");
                    return None;
                }
                (fresh, self.interception(pkg, site))
            }
        };
        let elem = fresh.elem()?;
        let size = size_class(&pkg.types, elem);
        let severity = match (interception, size) {
            (Some(_), _) | (None, SizeClass::Zero) => Severity::FalseOrUndefined,
            (None, SizeClass::NonZero | SizeClass::Unknown) => Severity::AlwaysFalse,
        };
        let note = interception.map(|i| InterceptNote { method: i.method_name(), owner: pkg.type_string(i.owner) });
        let ty = pkg.type_string(elem);
        debug!(
            file = site.file,
            line = site.span.line,
            col = site.span.col,
            ty = %ty,
            ?size,
            %severity,
            intercepted = note.is_some(),
            "comparison with fresh address"
        );
        Some(Finding {
            file: site.file.to_string(),
            span: site.span,
            severity,
            message: message(&ty, severity, note.as_ref()),
        })
    }

    /// First argument, then second, whose static type may intercept the call.
    fn interception(&self, pkg: &CheckedPackage, site: &ComparisonSite<'_>) -> Option<Interception> {
        if !self.config.check_is {
            return None;
        }
        site.operands
            .iter()
            .filter_map(|e| pkg.info.type_of(e.id))
            .find_map(|t| chain::interception(&pkg.types, t.ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_package;

    fn run(config: Config, src: &str) -> Vec<(usize, Severity, String)> {
        let pkg = load_package(&[("a.go", src)]).expect("load");
        Analyzer::new(config)
            .run(&pkg)
            .into_iter()
            .map(|f| (f.span.line, f.severity, f.message))
            .collect()
    }

    const ERRORS: &str = "package a

import \"errors\"

type withIs struct{}

func (*withIs) Error() string { return \"\" }

func (*withIs) Is(error) bool { return true }

type plain struct{ _ int }

func (*plain) Error() string { return \"\" }

func f(err error) {
	_ = errors.Is(err, &withIs{})
	_ = errors.Is(err, &plain{})
	_ = errors.As(err, &plain{})
}
";

    #[test]
    fn zero_size_comparisons_are_false_or_undefined() {
        let got = run(Config::default(), "package a\n\nfunc f() {\n\t_ = &struct{}{} == new(struct{})\n\t_ = new(struct{ x int }) != nil\n}\n");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].1, Severity::FalseOrUndefined);
        assert!(got[0].2.contains("\"struct{}\""));
        assert_eq!(got[1].1, Severity::AlwaysFalse);
        assert!(got[1].2.ends_with("\"struct{x int}\" is always false"));
    }

    #[test]
    fn is_methods_intercept_membership_tests() {
        let got = run(Config::default(), ERRORS);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, 16);
        assert_eq!(got[0].1, Severity::FalseOrUndefined);
        assert!(got[0].2.ends_with("; method \"Is\" of type \"withIs\" may intercept the comparison"));
        assert_eq!(got[1].1, Severity::AlwaysFalse);
    }

    #[test]
    fn interception_can_be_disabled() {
        let got = run(Config { check_is: false }, ERRORS);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].1, Severity::FalseOrUndefined);
        assert!(!got[0].2.contains("intercept"));
    }

    #[test]
    fn unwrap_accessors_returning_errors_intercept() {
        let src = "package a

import \"errors\"

type single struct{ x int }

func (single) Error() string { return \"\" }

func (single) Unwrap() error { return nil }

type multi struct{ x int }

func (multi) Error() string { return \"\" }

func (multi) Unwrap() []error { return nil }

func f(err error) {
	_ = errors.Is(&single{}, err)
	_ = errors.Is(err, &multi{})
}
";
        let got = run(Config::default(), src);
        assert_eq!(got.len(), 2);
        assert_eq!((got[0].0, got[0].1), (18, Severity::FalseOrUndefined));
        assert!(got[0].2.ends_with("\"single\" is false or undefined; method \"Unwrap\" of type \"single\" may intercept the comparison"));
        assert_eq!((got[1].0, got[1].1), (19, Severity::FalseOrUndefined));
        assert!(got[1].2.ends_with("method \"Unwrap\" of type \"multi\" may intercept the comparison"));

        let got = run(Config { check_is: false }, src);
        assert!(got.iter().all(|(_, severity, _)| *severity == Severity::AlwaysFalse));
    }

    #[test]
    fn first_fresh_operand_decides() {
        let got = run(Config::default(), "package a\n\nfunc f() {\n\t_ = new(int) == &struct{}{}\n}\n");
        assert_eq!(got, vec![(
            4,
            Severity::AlwaysFalse,
            "result of comparison with address of new variable of type \"int\" is always false".to_string()
        )]);
    }

    #[test]
    fn analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
    }
}
