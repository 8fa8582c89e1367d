//! Fresh-allocation classification of operands.

use crate::analysis::chain::ChainFunc;
use crate::analysis::resolve::binding_of;
use crate::compiler::ast::{Expr, ExprKind, UnaryOp};
use crate::compiler::check::{CheckedPackage, Mode};
use crate::compiler::scope::Builtin;
use crate::compiler::types::TypeId;
use tracing::trace;

/// Whether an operand is a pointer to a variable created right there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotFresh,
    /// `&T{...}`
    FreshCompositeLiteral(TypeId),
    /// `new(T)`
    FreshZeroAllocation(TypeId),
    /// A fresh pointer handed to an error-chain function
    FreshViaChain { func: ChainFunc, elem: TypeId },
}

impl Classification {
    pub fn is_fresh(&self) -> bool {
        !matches!(self, Classification::NotFresh)
    }

    /// Type of the allocated variable.
    pub fn elem(&self) -> Option<TypeId> {
        match *self {
            Classification::NotFresh => None,
            Classification::FreshCompositeLiteral(t)
            | Classification::FreshZeroAllocation(t)
            | Classification::FreshViaChain { elem: t, .. } => Some(t),
        }
    }
}

/// Classify an operand of `==` or `!=`.
pub fn classify(pkg: &CheckedPackage, e: &Expr) -> Classification {
    let e = e.unparen();
    let class = match &e.kind {
        ExprKind::Unary(UnaryOp::Addr, x) => {
            let lit = x.unparen();
            match lit.kind {
                ExprKind::CompositeLit { .. } => match known_type(pkg, lit) {
                    Some(t) => Classification::FreshCompositeLiteral(t),
                    None => Classification::NotFresh,
                },
                _ => Classification::NotFresh,
            }
        }
        ExprKind::Call { func, args, ellipsis: false } if args.len() == 1 => {
            if !binding_of(pkg, func).is_builtin(Builtin::New) {
                return Classification::NotFresh;
            }
            match pkg.info.type_of(args[0].id) {
                Some(t) if t.mode == Mode::TypeExpr && !pkg.types.is_invalid(t.ty) => {
                    Classification::FreshZeroAllocation(t.ty)
                }
                _ => Classification::NotFresh,
            }
        }
        _ => Classification::NotFresh,
    };
    if class.is_fresh() {
        trace!(line = e.span.line, col = e.span.col, ?class, "fresh operand");
    }
    class
}

/// Classify an argument of a recognized chain function.
pub fn classify_argument(pkg: &CheckedPackage, func: ChainFunc, arg: &Expr) -> Classification {
    match classify(pkg, arg).elem() {
        Some(elem) => Classification::FreshViaChain { func, elem },
        None => Classification::NotFresh,
    }
}

fn known_type(pkg: &CheckedPackage, e: &Expr) -> Option<TypeId> {
    let t = pkg.info.type_of(e.id)?;
    if pkg.types.is_invalid(t.ty) {
        trace!(line = e.span.line, col = e.span.col, "literal of unknown type");
        return None;
    }
    Some(t.ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::walk::for_each_expr;
    use crate::compiler::ast::BinaryOp;
    use crate::load_package;

    /// Classification of every `==` operand, rendered as (tag, type).
    fn operands(src: &str) -> Vec<(&'static str, String)> {
        let pkg = load_package(&[("a.go", src)]).expect("load");
        let mut out = Vec::new();
        for_each_expr(&pkg, |e| {
            if let ExprKind::Binary(BinaryOp::Eq, l, r) = &e.kind {
                for side in [l, r] {
                    let c = classify(&pkg, side);
                    let tag = match c {
                        Classification::NotFresh => "none",
                        Classification::FreshCompositeLiteral(_) => "lit",
                        Classification::FreshZeroAllocation(_) => "new",
                        Classification::FreshViaChain { .. } => "chain",
                    };
                    out.push((tag, c.elem().map(|t| pkg.type_string(t)).unwrap_or_default()));
                }
            }
        });
        out
    }

    #[test]
    fn literals_and_new_are_fresh() {
        let got = operands("package a\n\nfunc f() {\n\t_ = &struct{}{} == new(struct{})\n}\n");
        assert_eq!(got, vec![("lit", "struct{}".to_string()), ("new", "struct{}".to_string())]);
    }

    #[test]
    fn parentheses_do_not_matter() {
        let got = operands(
            "package a\n\ntype T struct{ _ int }\n\nfunc f() {\n\t_ = nil == (&T{})\n\t_ = nil == &(T{})\n\t_ = nil == ((new)(T))\n}\n",
        );
        let fresh: Vec<_> = got.into_iter().filter(|(tag, _)| *tag != "none").collect();
        assert_eq!(
            fresh,
            vec![("lit", "T".to_string()), ("lit", "T".to_string()), ("new", "T".to_string())]
        );
    }

    #[test]
    fn shadowed_new_and_plain_values_are_not_fresh() {
        let got = operands(
            "package a\n\nfunc f(p *int) {\n\tnew := func(_ int) *struct{} { return nil }\n\tvar x struct{}\n\t_ = new(1) == nil\n\t_ = &x == nil\n\t_ = p == nil\n}\n",
        );
        assert!(got.iter().all(|(tag, _)| *tag == "none"), "{:?}", got);
    }

    #[test]
    fn chain_arguments_carry_the_function() {
        let pkg = load_package(&[(
            "a.go",
            "package a\n\nimport \"errors\"\n\ntype E struct{}\n\nfunc (E) Error() string { return \"\" }\n\nfunc f(err error) {\n\t_ = errors.Is(err, &E{})\n}\n",
        )])
        .expect("load");
        let mut got = Vec::new();
        for_each_expr(&pkg, |e| {
            if let ExprKind::Call { args, .. } = &e.kind {
                if args.len() == 2 {
                    got.push(classify_argument(&pkg, ChainFunc::Is, &args[1]));
                    got.push(classify_argument(&pkg, ChainFunc::Is, &args[0]));
                }
            }
        });
        assert!(matches!(got[0], Classification::FreshViaChain { func: ChainFunc::Is, .. }));
        assert_eq!(got[1], Classification::NotFresh);
    }
}
