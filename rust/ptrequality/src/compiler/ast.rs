use crate::compiler::tokens::Span;
use serde::{Deserialize, Serialize};

/// Identifies an expression node within one package; assigned by the parser.
pub type ExprId = u32;

/// One parsed `.go` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// `import name "path"`; `name` is an alias, `.` or `_`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    pub path: String,
    pub span: Span,
}

/// Top-level or local declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
    Var(ValueSpec),
    Const(ValueSpec),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Type(t) => t.span,
            Decl::Func(f) => f.span,
            Decl::Var(v) | Decl::Const(v) => v.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Vec<TypeParamDecl>,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeParamDecl {
    pub names: Vec<Ident>,
    pub constraint: TypeExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub type_params: Vec<TypeParamDecl>,
    pub sig: FuncType,
    /// `None` for declarations without body (assembly or stub packages)
    pub body: Option<Block>,
    pub span: Span,
}

/// Method receiver, e.g. `(g *genericError[T])`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub pointer: bool,
    pub base: Ident,
    pub type_params: Vec<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncType {
    pub params: Vec<ParamDecl>,
    pub results: Vec<ParamDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

/// `var`/`const` spec: `a, b T = x, y`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

// ── Types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeExpr {
    /// `T`, `pkg.T`, `T[A, B]`
    Name { pkg: Option<Ident>, name: Ident, args: Vec<TypeExpr>, span: Span },
    Pointer(Box<TypeExpr>, Span),
    Slice(Box<TypeExpr>, Span),
    Array(ArrayLen, Box<TypeExpr>, Span),
    Map(Box<TypeExpr>, Box<TypeExpr>, Span),
    Chan(Box<TypeExpr>, Span),
    Func(FuncType),
    Struct(Vec<FieldDecl>, Span),
    Interface(Vec<InterfaceElem>, Span),
    /// Type-set term list in constraints: `~int | string`
    Union(Vec<TypeExpr>, Span),
    /// `~T` in constraints
    Tilde(Box<TypeExpr>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { span, .. } => *span,
            TypeExpr::Pointer(_, s)
            | TypeExpr::Slice(_, s)
            | TypeExpr::Array(_, _, s)
            | TypeExpr::Map(_, _, s)
            | TypeExpr::Chan(_, s)
            | TypeExpr::Struct(_, s)
            | TypeExpr::Interface(_, s)
            | TypeExpr::Union(_, s)
            | TypeExpr::Tilde(_, s) => *s,
            TypeExpr::Func(f) => f.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArrayLen {
    Expr(Box<Expr>),
    /// `[...]T` inside a composite literal
    Ellipsis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Empty for embedded fields
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub embedded: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InterfaceElem {
    Method { name: Ident, sig: FuncType },
    Embed(TypeExpr),
}

// ── Statements ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// `var`, `const` or `type` inside a function; grouped forms yield several
    Decl(Vec<Decl>),
    /// `a, b := x, y`
    Define { names: Vec<Ident>, values: Vec<Expr>, span: Span },
    /// `a = x`, `a += x`
    Assign { lhs: Vec<Expr>, op: Option<BinaryOp>, rhs: Vec<Expr>, span: Span },
    IncDec { expr: Expr, inc: bool, span: Span },
    Expr(Expr),
    Send { chan: Expr, value: Expr, span: Span },
    Return { values: Vec<Expr>, span: Span },
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Go(Expr, Span),
    Defer(Expr, Span),
    Branch { kind: BranchKind, label: Option<Ident>, span: Span },
    Labeled { label: Ident, stmt: Box<Stmt>, span: Span },
    Empty(Span),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either another `If` or a `Block`
    pub els: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `:=` rather than `=`
    pub define: bool,
    pub expr: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub clauses: Vec<CaseClause>,
    pub span: Span,
}

/// `case a, b:`; an empty `exprs` list is the `default` clause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub default: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<Stmt>>,
    /// `x` in `switch x := y.(type)`
    pub bind: Option<Ident>,
    pub expr: Expr,
    pub clauses: Vec<TypeCaseClause>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCaseClause {
    /// `None` entries are `nil`
    pub types: Vec<Option<TypeExpr>>,
    pub default: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ── Expressions ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    LogOr,
    LogAnd,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::LogOr => "||",
            BinaryOp::LogAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `&x`
    Addr,
    /// `*x`, also a pointer type in expression position
    Deref,
    Neg,
    Plus,
    Not,
    Complement,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    Char,
    String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    BasicLit(LitKind, String),
    /// `T{...}`; `ty` is `None` for elided types of nested literals
    CompositeLit { ty: Option<TypeExpr>, elts: Vec<Element> },
    FuncLit { sig: FuncType, body: Block },
    Paren(Box<Expr>),
    Selector(Box<Expr>, Ident),
    /// Index expression or generic instantiation `f[T, U]`
    Index(Box<Expr>, Vec<Expr>),
    SliceExpr { expr: Box<Expr>, low: Option<Box<Expr>>, high: Option<Box<Expr>>, max: Option<Box<Expr>> },
    /// `x.(T)`; `None` is the `x.(type)` of a type switch
    TypeAssert(Box<Expr>, Option<TypeExpr>),
    Call { func: Box<Expr>, args: Vec<Expr>, ellipsis: bool },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// A type literal in expression position: `struct{}`, `[]T`, `map[K]V`, `func()`, ...
    Type(TypeExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

impl Expr {
    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut e = self;
        while let ExprKind::Paren(inner) = &e.kind {
            e = inner;
        }
        e
    }

    pub fn is_nil(&self) -> bool {
        matches!(&self.unparen().kind, ExprKind::Ident(name) if name == "nil")
    }

    /// Reinterpret an expression as the type it spells, e.g. the operand of
    /// `new(pkg.T)` or the `G[int]` of a composite literal.
    pub fn to_type_expr(&self) -> Option<TypeExpr> {
        match &self.kind {
            ExprKind::Ident(name) => Some(TypeExpr::Name {
                pkg: None,
                name: Ident { name: name.clone(), span: self.span },
                args: vec![],
                span: self.span,
            }),
            ExprKind::Selector(x, sel) => match &x.kind {
                ExprKind::Ident(pkg) => Some(TypeExpr::Name {
                    pkg: Some(Ident { name: pkg.clone(), span: x.span }),
                    name: sel.clone(),
                    args: vec![],
                    span: self.span,
                }),
                _ => None,
            },
            ExprKind::Index(x, indices) => match x.to_type_expr()? {
                TypeExpr::Name { pkg, name, args, .. } if args.is_empty() => {
                    let args = indices.iter().map(Expr::to_type_expr).collect::<Option<Vec<_>>>()?;
                    Some(TypeExpr::Name { pkg, name, args, span: self.span })
                }
                _ => None,
            },
            ExprKind::Unary(UnaryOp::Deref, x) => Some(TypeExpr::Pointer(Box::new(x.to_type_expr()?), self.span)),
            ExprKind::Paren(x) => x.to_type_expr(),
            ExprKind::Type(t) => Some(t.clone()),
            _ => None,
        }
    }
}
