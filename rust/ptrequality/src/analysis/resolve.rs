//! Identifier resolution for callees.
//!
//! Scoping was decided by the checker; this maps the recorded use of a
//! callee expression to what the analysis cares about.

use crate::compiler::ast::{Expr, ExprKind};
use crate::compiler::check::CheckedPackage;
use crate::compiler::scope::{Builtin, ObjKind};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Builtin(Builtin),
    /// Package-level function, e.g. `errors.Is` or a dot-imported `Is`
    PackageFunc { path: String, name: String },
    /// Declared by the analysed code: variables, parameters, local
    /// functions and types, methods and fields of local values
    Local,
    Unknown,
}

impl Binding {
    pub fn is_builtin(&self, b: Builtin) -> bool {
        matches!(self, Binding::Builtin(x) if *x == b)
    }
}

/// Binding of the function part of a call.
pub fn binding_of(pkg: &CheckedPackage, callee: &Expr) -> Binding {
    let callee = callee.unparen();
    let binding = match &callee.kind {
        ExprKind::Ident(_) => object_binding(pkg, callee),
        ExprKind::Selector(x, _) => {
            let x = x.unparen();
            match x.kind {
                ExprKind::Ident(_) => match pkg.info.use_of(x.id).and_then(|id| pkg.object(id)) {
                    Some(obj) if matches!(obj.kind, ObjKind::PkgName(_)) => object_binding(pkg, callee),
                    Some(_) => Binding::Local,
                    None => Binding::Unknown,
                },
                _ => Binding::Local,
            }
        }
        _ => Binding::Unknown,
    };
    trace!(line = callee.span.line, col = callee.span.col, ?binding, "resolved callee");
    binding
}

fn object_binding(pkg: &CheckedPackage, e: &Expr) -> Binding {
    let Some(obj) = pkg.info.use_of(e.id).and_then(|id| pkg.object(id)) else {
        return Binding::Unknown;
    };
    match (&obj.kind, &obj.pkg) {
        (ObjKind::Builtin(b), None) => Binding::Builtin(*b),
        (ObjKind::Func, Some(path)) if !obj.local => Binding::PackageFunc { path: path.clone(), name: obj.name.clone() },
        (ObjKind::Nil | ObjKind::PkgName(_), _) => Binding::Unknown,
        _ => Binding::Local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_package;

    fn callees(src: &str) -> Vec<Binding> {
        let pkg = load_package(&[("a.go", src)]).expect("load");
        let mut out = Vec::new();
        crate::analysis::walk::for_each_expr(&pkg, |e| {
            if let ExprKind::Call { func, .. } = &e.kind {
                out.push(binding_of(&pkg, func));
            }
        });
        out
    }

    #[test]
    fn builtin_and_package_functions() {
        let got = callees(
            "package a\n\nimport \"errors\"\n\nfunc f(err error) {\n\t_ = new(int)\n\t_ = (new)(int)\n\t_ = errors.Is(err, err)\n}\n",
        );
        assert_eq!(
            got,
            vec![
                Binding::Builtin(Builtin::New),
                Binding::Builtin(Builtin::New),
                Binding::PackageFunc { path: "errors".into(), name: "Is".into() },
            ]
        );
    }

    #[test]
    fn shadowed_names_are_local() {
        let got = callees(
            "package a\n\nimport \"errors\"\n\nfunc f() {\n\tnew := func(int) int { return 0 }\n\t_ = new(1)\n\terrors := struct{ Is func() bool }{}\n\t_ = errors.Is()\n}\n",
        );
        assert_eq!(got, vec![Binding::Local, Binding::Local]);
    }

    #[test]
    fn parameters_shadow_packages() {
        let got = callees("package a\n\nfunc f(errors interface{ Is(error) bool }) {\n\t_ = errors.Is(nil)\n}\n");
        assert_eq!(got, vec![Binding::Local]);
    }

    #[test]
    fn unresolved_names_are_unknown() {
        let got = callees("package a\n\nimport \"net/http\"\n\nfunc f() {\n\t_ = http.Get(\"x\")\n\t_ = nowhere()\n}\n");
        assert_eq!(got, vec![Binding::Unknown, Binding::Unknown]);
    }
}
