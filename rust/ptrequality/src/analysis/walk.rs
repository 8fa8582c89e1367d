//! Source-order traversal and comparison-site collection.

use crate::analysis::chain::{self, ChainFunc};
use crate::analysis::resolve::binding_of;
use crate::compiler::ast::*;
use crate::compiler::check::CheckedPackage;
use crate::compiler::tokens::Span;

/// Call `f` on every expression of the package, pre-order, files in the
/// order they were given.
pub fn for_each_expr<'p>(pkg: &'p CheckedPackage, mut f: impl FnMut(&'p Expr)) {
    for file in &pkg.files {
        for_each_expr_in(file, &mut f);
    }
}

/// Call `f` on every expression of one file, pre-order.
pub fn for_each_expr_in<'p>(file: &'p SourceFile, f: impl FnMut(&'p Expr)) {
    let mut w = Walker { f };
    for d in &file.decls {
        w.decl(d);
    }
}

struct Walker<F> {
    f: F,
}

impl<'p, F: FnMut(&'p Expr)> Walker<F> {
    fn decl(&mut self, d: &'p Decl) {
        match d {
            Decl::Func(fd) => {
                if let Some(body) = &fd.body {
                    self.block(body);
                }
            }
            Decl::Var(spec) | Decl::Const(spec) => self.exprs(&spec.values),
            Decl::Type(_) => {}
        }
    }

    fn block(&mut self, b: &'p Block) {
        self.stmts(&b.stmts);
    }

    fn stmts(&mut self, stmts: &'p [Stmt]) {
        for s in stmts {
            self.stmt(s);
        }
    }

    fn opt_stmt(&mut self, s: &'p Option<Box<Stmt>>) {
        if let Some(s) = s {
            self.stmt(s);
        }
    }

    fn stmt(&mut self, s: &'p Stmt) {
        match s {
            Stmt::Decl(decls) => decls.iter().for_each(|d| self.decl(d)),
            Stmt::Define { values, .. } => self.exprs(values),
            Stmt::Assign { lhs, rhs, .. } => {
                self.exprs(lhs);
                self.exprs(rhs);
            }
            Stmt::IncDec { expr, .. } => self.expr(expr),
            Stmt::Expr(e) | Stmt::Go(e, _) | Stmt::Defer(e, _) => self.expr(e),
            Stmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.expr(value);
            }
            Stmt::Return { values, .. } => self.exprs(values),
            Stmt::Block(b) => self.block(b),
            Stmt::If(i) => {
                self.opt_stmt(&i.init);
                self.expr(&i.cond);
                self.block(&i.then);
                self.opt_stmt(&i.els);
            }
            Stmt::For(fs) => {
                self.opt_stmt(&fs.init);
                if let Some(c) = &fs.cond {
                    self.expr(c);
                }
                self.opt_stmt(&fs.post);
                self.block(&fs.body);
            }
            Stmt::Range(r) => {
                self.opt_expr(r.key.as_ref());
                self.opt_expr(r.value.as_ref());
                self.expr(&r.expr);
                self.block(&r.body);
            }
            Stmt::Switch(sw) => {
                self.opt_stmt(&sw.init);
                self.opt_expr(sw.tag.as_ref());
                for clause in &sw.clauses {
                    self.exprs(&clause.exprs);
                    self.stmts(&clause.body);
                }
            }
            Stmt::TypeSwitch(ts) => {
                self.opt_stmt(&ts.init);
                self.expr(&ts.expr);
                for clause in &ts.clauses {
                    self.stmts(&clause.body);
                }
            }
            Stmt::Labeled { stmt, .. } => self.stmt(stmt),
            Stmt::Branch { .. } | Stmt::Empty(_) => {}
        }
    }

    fn exprs(&mut self, es: &'p [Expr]) {
        for e in es {
            self.expr(e);
        }
    }

    fn opt_expr(&mut self, e: Option<&'p Expr>) {
        if let Some(e) = e {
            self.expr(e);
        }
    }

    fn expr(&mut self, e: &'p Expr) {
        (self.f)(e);
        match &e.kind {
            ExprKind::Paren(x) | ExprKind::Selector(x, _) | ExprKind::TypeAssert(x, _) | ExprKind::Unary(_, x) => {
                self.expr(x)
            }
            ExprKind::Index(x, indices) => {
                self.expr(x);
                self.exprs(indices);
            }
            ExprKind::SliceExpr { expr, low, high, max } => {
                self.expr(expr);
                for part in [low, high, max].into_iter().flatten() {
                    self.expr(part);
                }
            }
            ExprKind::Call { func, args, .. } => {
                self.expr(func);
                self.exprs(args);
            }
            ExprKind::Binary(_, l, r) => {
                self.expr(l);
                self.expr(r);
            }
            ExprKind::CompositeLit { elts, .. } => {
                for el in elts {
                    self.opt_expr(el.key.as_ref());
                    self.expr(&el.value);
                }
            }
            ExprKind::FuncLit { body, .. } => self.block(body),
            ExprKind::Ident(_) | ExprKind::BasicLit(..) | ExprKind::Type(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Equal,
    NotEqual,
    Call(ChainFunc),
}

/// An `==`/`!=` expression or a call to a recognized chain function.
#[derive(Debug, Clone)]
pub struct ComparisonSite<'p> {
    pub kind: SiteKind,
    pub operands: Vec<&'p Expr>,
    pub file: &'p str,
    pub span: Span,
    pub id: ExprId,
}

/// Every comparison site of the package in source order.
pub fn collect_sites(pkg: &CheckedPackage) -> Vec<ComparisonSite<'_>> {
    let mut sites = Vec::new();
    for file in &pkg.files {
        let name = file.name.as_str();
        for_each_expr_in(file, |e| {
            let (kind, operands) = match &e.kind {
                ExprKind::Binary(op @ (BinaryOp::Eq | BinaryOp::NotEq), l, r) => {
                    let kind = if *op == BinaryOp::Eq { SiteKind::Equal } else { SiteKind::NotEqual };
                    (kind, vec![&**l, &**r])
                }
                ExprKind::Call { func, args, .. } => match chain::recognize(&binding_of(pkg, func)) {
                    Some(f) => (SiteKind::Call(f), args.iter().collect()),
                    None => return,
                },
                _ => return,
            };
            sites.push(ComparisonSite { kind, operands, file: name, span: e.span, id: e.id });
        });
    }
    sites
}
