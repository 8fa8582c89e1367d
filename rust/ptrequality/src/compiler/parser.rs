//! Recursive descent parser for the Go subset, with precedence climbing for
//! binary expressions.

use crate::compiler::ast::*;
use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, col {col}; expected {expected}")]
    Unexpected { found: String, expected: String, line: usize, col: usize },
    #[error("{message} at line {line}, col {col}")]
    Invalid { message: String, line: usize, col: usize },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// Result of a simple statement in a `for` header, which may turn out to be
/// a range clause.
enum Simple {
    Stmt(Stmt),
    Range { key: Option<Expr>, value: Option<Expr>, define: bool, expr: Expr },
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: ExprId,
    /// < 0 inside control clause headers, where `T {` opens a block
    expr_lev: i32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_id_base(tokens, 0)
    }

    /// Start numbering expressions at `base`, so ids stay unique across the
    /// files of one package.
    pub fn with_id_base(mut tokens: Vec<Token>, base: ExprId) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let span = tokens.last().map(|t| t.span).unwrap_or_else(Span::dummy);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self { tokens, pos: 0, next_id: base, expr_lev: 0 }
    }

    /// First id not handed out yet.
    pub fn next_id(&self) -> ExprId { self.next_id }

    fn current(&self) -> &Token { &self.tokens[self.pos.min(self.tokens.len() - 1)] }

    fn peek_kind(&self) -> &TokenKind { &self.current().kind }

    fn peek_at(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn prev_span(&self) -> Span { self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("{}", kind)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        if tok.kind == TokenKind::Eof {
            return ParseError::UnexpectedEof;
        }
        ParseError::Unexpected {
            found: format!("{}", tok.kind), expected: expected.into(),
            line: tok.span.line, col: tok.span.col,
        }
    }

    fn invalid(&self, message: &str, span: Span) -> ParseError {
        ParseError::Invalid { message: message.into(), line: span.line, col: span.col }
    }

    /// A `;` or the closing token of the enclosing list.
    fn expect_semi(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Semi => { self.advance(); Ok(()) }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected(";")),
        }
    }

    fn at_end(&self) -> bool { matches!(self.peek_kind(), TokenKind::Eof) }

    fn mk(&mut self, kind: ExprKind, start: Span) -> Expr {
        let id = self.next_id;
        self.next_id += 1;
        Expr { id, kind, span: start.merge(self.prev_span()) }
    }

    /// Run `f` one bracket level deeper, where composite literals are always allowed.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        let old = self.expr_lev;
        self.expr_lev = old.max(0) + 1;
        let result = f(self);
        self.expr_lev = old;
        result
    }

    fn header<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        let old = self.expr_lev;
        self.expr_lev = -1;
        let result = f(self);
        self.expr_lev = old;
        result
    }

    // ── Files and declarations ──

    pub fn parse_file(&mut self, name: &str) -> Result<SourceFile, ParseError> {
        let start = self.current().span;
        self.expect(&TokenKind::Package)?;
        let package = self.expect_ident()?;
        self.expect_semi()?;
        let mut imports = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Import) {
            self.advance();
            if self.eat(&TokenKind::LParen) {
                while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
                    imports.push(self.parse_import_spec()?);
                    self.expect_semi()?;
                }
                self.expect(&TokenKind::RParen)?;
            } else {
                imports.push(self.parse_import_spec()?);
            }
            self.expect_semi()?;
        }
        let mut decls = Vec::new();
        while !self.at_end() {
            if self.eat(&TokenKind::Semi) { continue; }
            if matches!(self.peek_kind(), TokenKind::Func) {
                decls.push(Decl::Func(self.parse_func_decl()?));
            } else {
                decls.extend(self.parse_decl_group()?);
            }
            self.expect_semi()?;
        }
        Ok(SourceFile { name: name.into(), package, imports, decls, span: start.merge(self.prev_span()) })
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let start = self.current().span;
        let name = match self.peek_kind().clone() {
            TokenKind::Dot => { let s = self.advance().span; Some(Ident { name: ".".into(), span: s }) }
            TokenKind::Ident(_) => Some(self.expect_ident()?),
            _ => None,
        };
        let path = match self.peek_kind().clone() {
            TokenKind::StringLit(p) => { self.advance(); p }
            _ => return Err(self.unexpected("import path")),
        };
        Ok(ImportSpec { name, path, span: start.merge(self.prev_span()) })
    }

    /// `type`, `var` or `const`, single or grouped.
    fn parse_decl_group(&mut self) -> Result<Vec<Decl>, ParseError> {
        let keyword = self.advance();
        let mut decls = Vec::new();
        let one = |p: &mut Self| -> Result<Decl, ParseError> {
            match keyword.kind {
                TokenKind::Type => Ok(Decl::Type(p.parse_type_spec()?)),
                TokenKind::Var => Ok(Decl::Var(p.parse_value_spec()?)),
                TokenKind::Const => Ok(Decl::Const(p.parse_value_spec()?)),
                _ => Err(ParseError::Unexpected {
                    found: format!("{}", keyword.kind), expected: "declaration".into(),
                    line: keyword.span.line, col: keyword.span.col,
                }),
            }
        };
        if self.eat(&TokenKind::LParen) {
            while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
                if self.eat(&TokenKind::Semi) { continue; }
                decls.push(one(self)?);
                self.expect_semi()?;
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            decls.push(one(self)?);
        }
        Ok(decls)
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let start = self.current().span;
        let name = self.expect_ident()?;
        let type_params = if matches!(self.peek_kind(), TokenKind::LBracket) && self.looks_like_type_params() {
            self.parse_type_params()?
        } else {
            vec![]
        };
        let alias = self.eat(&TokenKind::Assign);
        let ty = self.parse_type()?;
        Ok(TypeSpec { name, type_params, alias, ty, span: start.merge(self.prev_span()) })
    }

    /// `type A[T any] ...` versus the array type in `type A [N]int`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek_at(1), TokenKind::Ident(_))
            && matches!(
                self.peek_at(2),
                TokenKind::Ident(_) | TokenKind::Comma | TokenKind::Interface | TokenKind::Tilde
                    | TokenKind::LBracket | TokenKind::Map | TokenKind::Chan | TokenKind::Func | TokenKind::Struct
            )
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParamDecl>, ParseError> {
        self.expect(&TokenKind::LBracket)?;
        let mut groups = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBracket | TokenKind::Eof) {
            let mut names = vec![self.expect_ident()?];
            while self.eat(&TokenKind::Comma) {
                names.push(self.expect_ident()?);
            }
            let constraint = self.parse_constraint()?;
            groups.push(TypeParamDecl { names, constraint });
            if !self.eat(&TokenKind::Comma) { break; }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(groups)
    }

    fn parse_constraint(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current().span;
        let mut terms = Vec::new();
        loop {
            let term_start = self.current().span;
            if self.eat(&TokenKind::Tilde) {
                let ty = self.parse_type()?;
                terms.push(TypeExpr::Tilde(Box::new(ty), term_start.merge(self.prev_span())));
            } else {
                terms.push(self.parse_type()?);
            }
            if !self.eat(&TokenKind::Pipe) { break; }
        }
        if terms.len() == 1 {
            if let Some(term) = terms.pop() { return Ok(term); }
        }
        Ok(TypeExpr::Union(terms, start.merge(self.prev_span())))
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec, ParseError> {
        let start = self.current().span;
        let mut names = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        let ty = if matches!(self.peek_kind(), TokenKind::Assign | TokenKind::Semi | TokenKind::RParen | TokenKind::RBrace) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let values = if self.eat(&TokenKind::Assign) { self.parse_expr_list()? } else { vec![] };
        Ok(ValueSpec { names, ty, values, span: start.merge(self.prev_span()) })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        let start = self.expect(&TokenKind::Func)?;
        let recv = if matches!(self.peek_kind(), TokenKind::LParen) { Some(self.parse_receiver()?) } else { None };
        let name = self.expect_ident()?;
        let type_params = if matches!(self.peek_kind(), TokenKind::LBracket) { self.parse_type_params()? } else { vec![] };
        let sig = self.parse_signature(start)?;
        let body = if matches!(self.peek_kind(), TokenKind::LBrace) { Some(self.parse_func_body()?) } else { None };
        Ok(FuncDecl { recv, name, type_params, sig, body, span: start.merge(self.prev_span()) })
    }

    fn parse_receiver(&mut self) -> Result<Receiver, ParseError> {
        let start = self.expect(&TokenKind::LParen)?;
        let name = match (self.peek_kind(), self.peek_at(1)) {
            (TokenKind::Ident(_), TokenKind::Ident(_) | TokenKind::Star) => Some(self.expect_ident()?),
            _ => None,
        };
        let pointer = self.eat(&TokenKind::Star);
        let base = self.expect_ident()?;
        let mut type_params = Vec::new();
        if self.eat(&TokenKind::LBracket) {
            loop {
                type_params.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) { break; }
            }
            self.expect(&TokenKind::RBracket)?;
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Receiver { name, pointer, base, type_params, span: start.merge(self.prev_span()) })
    }

    fn parse_func_body(&mut self) -> Result<Block, ParseError> {
        let old = self.expr_lev;
        self.expr_lev = 0;
        let body = self.parse_block();
        self.expr_lev = old;
        body
    }

    // ── Signatures ──

    fn parse_signature(&mut self, start: Span) -> Result<FuncType, ParseError> {
        let params = self.parse_param_list()?;
        let results = if matches!(self.peek_kind(), TokenKind::LParen) {
            self.parse_param_list()?
        } else if self.at_type_start() {
            vec![ParamDecl { name: None, ty: self.parse_type()?, variadic: false }]
        } else {
            vec![]
        };
        Ok(FuncType { params, results, span: start.merge(self.prev_span()) })
    }

    fn at_type_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Ident(_) | TokenKind::Star | TokenKind::LBracket | TokenKind::Map | TokenKind::Chan
                | TokenKind::Func | TokenKind::Struct | TokenKind::Interface | TokenKind::Arrow
        )
    }

    fn parse_param_list(&mut self) -> Result<Vec<ParamDecl>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut items = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            items.push(self.parse_param_item()?);
            if !self.eat(&TokenKind::Comma) { break; }
        }
        self.expect(&TokenKind::RParen)?;
        if items.iter().all(|p| p.name.is_none()) {
            return Ok(items);
        }
        // `a, b int`: bare names before a named item share its type
        let mut params = Vec::new();
        let mut pending = Vec::new();
        for item in items {
            if item.name.is_some() {
                for name in pending.drain(..) {
                    params.push(ParamDecl { name: Some(name), ty: item.ty.clone(), variadic: item.variadic });
                }
                params.push(item);
                continue;
            }
            let span = item.ty.span();
            match item.ty {
                TypeExpr::Name { pkg: None, name, args, .. } if args.is_empty() && !item.variadic => pending.push(name),
                _ => return Err(self.invalid("mixed named and unnamed parameters", span)),
            }
        }
        if let Some(name) = pending.first() {
            return Err(self.invalid("mixed named and unnamed parameters", name.span));
        }
        Ok(params)
    }

    fn parse_param_item(&mut self) -> Result<ParamDecl, ParseError> {
        let (save_pos, save_id) = (self.pos, self.next_id);
        if matches!(self.peek_kind(), TokenKind::Ident(_))
            && !matches!(self.peek_at(1), TokenKind::Comma | TokenKind::RParen | TokenKind::Dot)
        {
            let name = self.expect_ident()?;
            let variadic = self.eat(&TokenKind::Ellipsis);
            if let Ok(ty) = self.parse_type() {
                if matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RParen) {
                    return Ok(ParamDecl { name: Some(name), ty, variadic });
                }
            }
            self.pos = save_pos;
            self.next_id = save_id;
        }
        let variadic = self.eat(&TokenKind::Ellipsis);
        let ty = self.parse_type()?;
        Ok(ParamDecl { name: None, ty, variadic })
    }

    // ── Types ──

    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current().span;
        match self.peek_kind() {
            TokenKind::Ident(_) => self.parse_type_name(),
            TokenKind::Star => {
                self.advance();
                let elem = self.parse_type()?;
                Ok(TypeExpr::Pointer(Box::new(elem), start.merge(self.prev_span())))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.eat(&TokenKind::RBracket) {
                    let elem = self.parse_type()?;
                    return Ok(TypeExpr::Slice(Box::new(elem), start.merge(self.prev_span())));
                }
                let len = if self.eat(&TokenKind::Ellipsis) {
                    ArrayLen::Ellipsis
                } else {
                    ArrayLen::Expr(Box::new(self.nested(|p| p.parse_expr())?))
                };
                self.expect(&TokenKind::RBracket)?;
                let elem = self.parse_type()?;
                Ok(TypeExpr::Array(len, Box::new(elem), start.merge(self.prev_span())))
            }
            TokenKind::Map => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value), start.merge(self.prev_span())))
            }
            TokenKind::Chan => {
                self.advance();
                self.eat(&TokenKind::Arrow);
                let elem = self.parse_type()?;
                Ok(TypeExpr::Chan(Box::new(elem), start.merge(self.prev_span())))
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(&TokenKind::Chan)?;
                let elem = self.parse_type()?;
                Ok(TypeExpr::Chan(Box::new(elem), start.merge(self.prev_span())))
            }
            TokenKind::Func => {
                self.advance();
                Ok(TypeExpr::Func(self.parse_signature(start)?))
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::LParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Ok(ty)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// `T`, `pkg.T`, `T[A, B]`
    fn parse_type_name(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current().span;
        let first = self.expect_ident()?;
        let (pkg, name) = if self.eat(&TokenKind::Dot) { (Some(first), self.expect_ident()?) } else { (None, first) };
        let mut args = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LBracket) && !matches!(self.peek_at(1), TokenKind::RBracket) {
            self.advance();
            loop {
                args.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma) || matches!(self.peek_kind(), TokenKind::RBracket) { break; }
            }
            self.expect(&TokenKind::RBracket)?;
        }
        Ok(TypeExpr::Name { pkg, name, args, span: start.merge(self.prev_span()) })
    }

    fn parse_struct_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.expect(&TokenKind::Struct)?;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            if self.eat(&TokenKind::Semi) { continue; }
            fields.push(self.parse_field_decl()?);
            self.expect_semi()?;
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(TypeExpr::Struct(fields, start.merge(self.prev_span())))
    }

    fn parse_field_decl(&mut self) -> Result<FieldDecl, ParseError> {
        let start = self.current().span;
        let embedded = |p: &mut Self| -> Result<FieldDecl, ParseError> {
            let ty = if p.eat(&TokenKind::Star) {
                let elem = p.parse_type_name()?;
                TypeExpr::Pointer(Box::new(elem), start.merge(p.prev_span()))
            } else {
                p.parse_type_name()?
            };
            Ok(FieldDecl { names: vec![], ty, embedded: true, span: start.merge(p.prev_span()) })
        };
        let field = match (self.peek_kind(), self.peek_at(1)) {
            (TokenKind::Star, _) => embedded(self)?,
            (TokenKind::Ident(_), TokenKind::Dot | TokenKind::Semi | TokenKind::RBrace | TokenKind::StringLit(_)) => embedded(self)?,
            (TokenKind::Ident(_), TokenKind::LBracket) => {
                // `a []T` / `a [N]T` versus an embedded instance `G[T]`
                let (save_pos, save_id) = (self.pos, self.next_id);
                match self.parse_named_fields(start) {
                    Ok(f) if matches!(self.peek_kind(), TokenKind::Semi | TokenKind::RBrace | TokenKind::StringLit(_)) => f,
                    _ => {
                        self.pos = save_pos;
                        self.next_id = save_id;
                        embedded(self)?
                    }
                }
            }
            _ => self.parse_named_fields(start)?,
        };
        if matches!(self.peek_kind(), TokenKind::StringLit(_)) {
            self.advance(); // tag
        }
        Ok(field)
    }

    fn parse_named_fields(&mut self, start: Span) -> Result<FieldDecl, ParseError> {
        let mut names = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        let ty = self.parse_type()?;
        Ok(FieldDecl { names, ty, embedded: false, span: start.merge(self.prev_span()) })
    }

    fn parse_interface_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.expect(&TokenKind::Interface)?;
        self.expect(&TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            if self.eat(&TokenKind::Semi) { continue; }
            if matches!((self.peek_kind(), self.peek_at(1)), (TokenKind::Ident(_), TokenKind::LParen)) {
                let name = self.expect_ident()?;
                let sig = self.parse_signature(name.span)?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Embed(self.parse_constraint()?));
            }
            self.expect_semi()?;
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(TypeExpr::Interface(elems, start.merge(self.prev_span())))
    }

    // ── Statements ──

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list()?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Block { stmts, span: start.merge(self.prev_span()) })
    }

    fn parse_stmt_list(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof) {
            if self.eat(&TokenKind::Semi) { continue; }
            stmts.push(self.parse_stmt()?);
            if !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Case | TokenKind::Default) {
                self.expect(&TokenKind::Semi)?;
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span;
        match self.peek_kind() {
            TokenKind::Var | TokenKind::Const | TokenKind::Type => Ok(Stmt::Decl(self.parse_decl_group()?)),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Return => {
                self.advance();
                let values = if matches!(self.peek_kind(), TokenKind::Semi | TokenKind::RBrace) {
                    vec![]
                } else {
                    self.parse_expr_list()?
                };
                Ok(Stmt::Return { values, span: start.merge(self.prev_span()) })
            }
            TokenKind::Go => {
                self.advance();
                let call = self.parse_expr()?;
                Ok(Stmt::Go(call, start.merge(self.prev_span())))
            }
            TokenKind::Defer => {
                self.advance();
                let call = self.parse_expr()?;
                Ok(Stmt::Defer(call, start.merge(self.prev_span())))
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let kind = match self.advance().kind {
                    TokenKind::Break => BranchKind::Break,
                    TokenKind::Continue => BranchKind::Continue,
                    TokenKind::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = if matches!(self.peek_kind(), TokenKind::Ident(_)) { Some(self.expect_ident()?) } else { None };
                Ok(Stmt::Branch { kind, label, span: start.merge(self.prev_span()) })
            }
            TokenKind::Semi => Ok(Stmt::Empty(start)),
            TokenKind::Ident(_) if matches!(self.peek_at(1), TokenKind::Colon) => {
                let label = self.expect_ident()?;
                self.advance();
                let stmt = if matches!(self.peek_kind(), TokenKind::RBrace) {
                    Stmt::Empty(self.prev_span())
                } else {
                    self.parse_stmt()?
                };
                Ok(Stmt::Labeled { label, stmt: Box::new(stmt), span: start.merge(self.prev_span()) })
            }
            _ => match self.parse_simple_stmt(false)? {
                Simple::Stmt(s) => Ok(s),
                Simple::Range { .. } => Err(self.invalid("range clause outside for", start)),
            },
        }
    }

    fn parse_simple_stmt(&mut self, range_ok: bool) -> Result<Simple, ParseError> {
        let start = self.current().span;
        if range_ok && self.eat(&TokenKind::Range) {
            let expr = self.parse_expr()?;
            return Ok(Simple::Range { key: None, value: None, define: false, expr });
        }
        let mut lhs = self.parse_expr_list()?;
        let assign_op = match self.peek_kind() {
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            TokenKind::PercentAssign => Some(BinaryOp::Rem),
            TokenKind::AmpAssign => Some(BinaryOp::And),
            TokenKind::PipeAssign => Some(BinaryOp::Or),
            TokenKind::CaretAssign => Some(BinaryOp::Xor),
            TokenKind::ShlAssign => Some(BinaryOp::Shl),
            TokenKind::ShrAssign => Some(BinaryOp::Shr),
            TokenKind::AndNotAssign => Some(BinaryOp::AndNot),
            _ => None,
        };
        if let Some(op) = assign_op {
            self.advance();
            let rhs = vec![self.parse_expr()?];
            return Ok(Simple::Stmt(Stmt::Assign { lhs, op: Some(op), rhs, span: start.merge(self.prev_span()) }));
        }
        match self.peek_kind() {
            TokenKind::Define | TokenKind::Assign => {
                let define = self.advance().kind == TokenKind::Define;
                if range_ok && self.eat(&TokenKind::Range) {
                    let expr = self.parse_expr()?;
                    if lhs.len() > 2 {
                        return Err(self.invalid("range clause permits at most two iteration variables", start));
                    }
                    let mut it = lhs.into_iter();
                    return Ok(Simple::Range { key: it.next(), value: it.next(), define, expr });
                }
                let rhs = self.parse_expr_list()?;
                let span = start.merge(self.prev_span());
                if !define {
                    return Ok(Simple::Stmt(Stmt::Assign { lhs, op: None, rhs, span }));
                }
                let names = lhs.iter().map(|e| self.expr_to_ident(e)).collect::<Result<Vec<_>, _>>()?;
                Ok(Simple::Stmt(Stmt::Define { names, values: rhs, span }))
            }
            TokenKind::Inc | TokenKind::Dec if lhs.len() == 1 => {
                let inc = self.advance().kind == TokenKind::Inc;
                let expr = lhs.remove(0);
                Ok(Simple::Stmt(Stmt::IncDec { expr, inc, span: start.merge(self.prev_span()) }))
            }
            TokenKind::Arrow if lhs.len() == 1 => {
                self.advance();
                let value = self.parse_expr()?;
                let chan = lhs.remove(0);
                Ok(Simple::Stmt(Stmt::Send { chan, value, span: start.merge(self.prev_span()) }))
            }
            _ if lhs.len() == 1 => Ok(Simple::Stmt(Stmt::Expr(lhs.remove(0)))),
            _ => Err(self.unexpected(":= or =")),
        }
    }

    fn expr_to_ident(&self, e: &Expr) -> Result<Ident, ParseError> {
        match &e.kind {
            ExprKind::Ident(name) => Ok(Ident { name: name.clone(), span: e.span }),
            _ => Err(self.invalid("non-name on left side of :=", e.span)),
        }
    }

    fn simple_to_stmt(&self, simple: Simple, span: Span) -> Result<Stmt, ParseError> {
        match simple {
            Simple::Stmt(s) => Ok(s),
            Simple::Range { .. } => Err(self.invalid("unexpected range clause", span)),
        }
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        let start = self.expect(&TokenKind::If)?;
        let (init, cond) = self.header(|p| {
            if p.eat(&TokenKind::Semi) {
                return Ok((None, p.parse_expr()?));
            }
            let first = p.parse_simple_stmt(false)?;
            let first = p.simple_to_stmt(first, start)?;
            if p.eat(&TokenKind::Semi) {
                Ok((Some(Box::new(first)), p.parse_expr()?))
            } else {
                match first {
                    Stmt::Expr(cond) => Ok((None, cond)),
                    _ => Err(p.invalid("missing condition in if statement", start)),
                }
            }
        })?;
        let then = self.parse_block()?;
        let els = if self.eat(&TokenKind::Else) {
            if matches!(self.peek_kind(), TokenKind::If) {
                Some(Box::new(Stmt::If(self.parse_if()?)))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        Ok(IfStmt { init, cond, then, els, span: start.merge(self.prev_span()) })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::For)?;
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            let body = self.parse_block()?;
            return Ok(Stmt::For(ForStmt { init: None, cond: None, post: None, body, span: start.merge(self.prev_span()) }));
        }
        enum Header {
            Range { key: Option<Expr>, value: Option<Expr>, define: bool, expr: Expr },
            Loop { init: Option<Box<Stmt>>, cond: Option<Expr>, post: Option<Box<Stmt>> },
        }
        let header = self.header(|p| {
            let first = if matches!(p.peek_kind(), TokenKind::Semi) {
                None
            } else {
                match p.parse_simple_stmt(true)? {
                    Simple::Range { key, value, define, expr } => return Ok(Header::Range { key, value, define, expr }),
                    Simple::Stmt(s) => Some(s),
                }
            };
            if !p.eat(&TokenKind::Semi) {
                return match first {
                    Some(Stmt::Expr(cond)) => Ok(Header::Loop { init: None, cond: Some(cond), post: None }),
                    _ => Err(p.invalid("expected for loop condition", start)),
                };
            }
            let cond = if matches!(p.peek_kind(), TokenKind::Semi) { None } else { Some(p.parse_expr()?) };
            p.expect(&TokenKind::Semi)?;
            let post = if matches!(p.peek_kind(), TokenKind::LBrace) {
                None
            } else {
                let s = p.parse_simple_stmt(false)?;
                Some(Box::new(p.simple_to_stmt(s, start)?))
            };
            Ok(Header::Loop { init: first.map(Box::new), cond, post })
        })?;
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(match header {
            Header::Range { key, value, define, expr } => Stmt::Range(RangeStmt { key, value, define, expr, body, span }),
            Header::Loop { init, cond, post } => Stmt::For(ForStmt { init, cond, post, body, span }),
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Switch)?;
        let (init, tag) = self.header(|p| {
            if matches!(p.peek_kind(), TokenKind::LBrace) {
                return Ok((None, None));
            }
            let first = if matches!(p.peek_kind(), TokenKind::Semi) {
                None
            } else {
                let s = p.parse_simple_stmt(false)?;
                Some(p.simple_to_stmt(s, start)?)
            };
            if !p.eat(&TokenKind::Semi) {
                return Ok((None, first));
            }
            let tag = if matches!(p.peek_kind(), TokenKind::LBrace) {
                None
            } else {
                let s = p.parse_simple_stmt(false)?;
                Some(p.simple_to_stmt(s, start)?)
            };
            Ok((first.map(Box::new), tag))
        })?;

        let guard = |e: &Expr| matches!(e.kind, ExprKind::TypeAssert(_, None));
        let (bind, guard_expr) = match tag {
            Some(Stmt::Define { mut names, mut values, .. }) if names.len() == 1 && values.len() == 1 && guard(&values[0]) => {
                (Some(names.remove(0)), Some(values.remove(0)))
            }
            Some(Stmt::Expr(e)) if guard(&e) => (None, Some(e)),
            Some(Stmt::Expr(e)) => return self.parse_expr_switch(start, init, Some(e)),
            None => return self.parse_expr_switch(start, init, None),
            Some(_) => return Err(self.invalid("switch expression must be an expression", start)),
        };
        let expr = match guard_expr.map(|e| e.kind) {
            Some(ExprKind::TypeAssert(x, None)) => *x,
            _ => return Err(self.invalid("malformed type switch guard", start)),
        };

        self.expect(&TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default) {
            let clause_start = self.current().span;
            let default = self.advance().kind == TokenKind::Default;
            let mut types = Vec::new();
            if !default {
                loop {
                    if matches!(self.peek_kind(), TokenKind::Ident(n) if n == "nil") {
                        self.advance();
                        types.push(None);
                    } else {
                        types.push(Some(self.parse_type()?));
                    }
                    if !self.eat(&TokenKind::Comma) { break; }
                }
            }
            self.expect(&TokenKind::Colon)?;
            let body = self.parse_stmt_list()?;
            clauses.push(TypeCaseClause { types, default, body, span: clause_start.merge(self.prev_span()) });
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Stmt::TypeSwitch(TypeSwitchStmt { init, bind, expr, clauses, span: start.merge(self.prev_span()) }))
    }

    fn parse_expr_switch(&mut self, start: Span, init: Option<Box<Stmt>>, tag: Option<Expr>) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default) {
            let clause_start = self.current().span;
            let default = self.advance().kind == TokenKind::Default;
            let exprs = if default { vec![] } else { self.parse_expr_list()? };
            self.expect(&TokenKind::Colon)?;
            let body = self.parse_stmt_list()?;
            clauses.push(CaseClause { exprs, default, body, span: clause_start.merge(self.prev_span()) });
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Stmt::Switch(SwitchStmt { init, tag, clauses, span: start.merge(self.prev_span()) }))
    }

    // ── Expressions ──

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(1)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
        Some(match kind {
            TokenKind::OrOr => (BinaryOp::LogOr, 1),
            TokenKind::AndAnd => (BinaryOp::LogAnd, 2),
            TokenKind::Eq => (BinaryOp::Eq, 3),
            TokenKind::NotEq => (BinaryOp::NotEq, 3),
            TokenKind::Lt => (BinaryOp::Lt, 3),
            TokenKind::LtEq => (BinaryOp::LtEq, 3),
            TokenKind::Gt => (BinaryOp::Gt, 3),
            TokenKind::GtEq => (BinaryOp::GtEq, 3),
            TokenKind::Plus => (BinaryOp::Add, 4),
            TokenKind::Minus => (BinaryOp::Sub, 4),
            TokenKind::Pipe => (BinaryOp::Or, 4),
            TokenKind::Caret => (BinaryOp::Xor, 4),
            TokenKind::Star => (BinaryOp::Mul, 5),
            TokenKind::Slash => (BinaryOp::Div, 5),
            TokenKind::Percent => (BinaryOp::Rem, 5),
            TokenKind::Shl => (BinaryOp::Shl, 5),
            TokenKind::Shr => (BinaryOp::Shr, 5),
            TokenKind::Amp => (BinaryOp::And, 5),
            TokenKind::AndNot => (BinaryOp::AndNot, 5),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let start = self.current().span;
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = Self::binary_op(self.peek_kind()) {
            if prec < min_prec { break; }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = self.mk(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), start);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span;
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Caret => UnaryOp::Complement,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::Amp => UnaryOp::Addr,
            TokenKind::Arrow if !matches!(self.peek_at(1), TokenKind::Chan) => UnaryOp::Recv,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(self.mk(ExprKind::Unary(op, Box::new(operand)), start))
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span;
        let kind = match self.peek_kind().clone() {
            TokenKind::IntLit(v) => { self.advance(); ExprKind::BasicLit(LitKind::Int, v) }
            TokenKind::FloatLit(v) => { self.advance(); ExprKind::BasicLit(LitKind::Float, v) }
            TokenKind::CharLit(c) => { self.advance(); ExprKind::BasicLit(LitKind::Char, c.to_string()) }
            TokenKind::StringLit(v) => { self.advance(); ExprKind::BasicLit(LitKind::String, v) }
            TokenKind::Ident(name) => { self.advance(); ExprKind::Ident(name) }
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(|p| p.parse_expr())?;
                self.expect(&TokenKind::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            TokenKind::Func => {
                self.advance();
                let sig = self.parse_signature(start)?;
                if matches!(self.peek_kind(), TokenKind::LBrace) {
                    let body = self.nested(|p| p.parse_func_body())?;
                    ExprKind::FuncLit { sig, body }
                } else {
                    ExprKind::Type(TypeExpr::Func(sig))
                }
            }
            TokenKind::LBracket | TokenKind::Struct | TokenKind::Map | TokenKind::Chan | TokenKind::Interface | TokenKind::Arrow => {
                ExprKind::Type(self.parse_type()?)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(self.mk(kind, start))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span;
        let mut x = self.parse_operand()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    if matches!(self.peek_kind(), TokenKind::LParen) {
                        self.advance();
                        let ty = if self.eat(&TokenKind::Type) { None } else { Some(self.parse_type()?) };
                        self.expect(&TokenKind::RParen)?;
                        x = self.mk(ExprKind::TypeAssert(Box::new(x), ty), start);
                    } else {
                        let sel = self.expect_ident()?;
                        x = self.mk(ExprKind::Selector(Box::new(x), sel), start);
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    x = self.nested(|p| p.parse_index_or_slice(x, start))?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let (args, ellipsis) = self.nested(|p| {
                        let mut args = Vec::new();
                        let mut ellipsis = false;
                        while !matches!(p.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
                            args.push(p.parse_expr()?);
                            ellipsis |= p.eat(&TokenKind::Ellipsis);
                            if !p.eat(&TokenKind::Comma) { break; }
                        }
                        Ok((args, ellipsis))
                    })?;
                    self.expect(&TokenKind::RParen)?;
                    x = self.mk(ExprKind::Call { func: Box::new(x), args, ellipsis }, start);
                }
                TokenKind::LBrace if self.literal_type_allowed(&x) => {
                    let ty = x.to_type_expr().ok_or_else(|| self.invalid("invalid composite literal type", x.span))?;
                    x = self.parse_composite_lit(Some(ty), start)?;
                }
                _ => break,
            }
        }
        Ok(x)
    }

    /// Called after `[`; parses up to and including `]`.
    fn parse_index_or_slice(&mut self, x: Expr, start: Span) -> Result<Expr, ParseError> {
        let low = if matches!(self.peek_kind(), TokenKind::Colon) { None } else { Some(self.parse_expr()?) };
        if self.eat(&TokenKind::Colon) {
            let high = if matches!(self.peek_kind(), TokenKind::Colon | TokenKind::RBracket) { None } else { Some(Box::new(self.parse_expr()?)) };
            let max = if self.eat(&TokenKind::Colon) { Some(Box::new(self.parse_expr()?)) } else { None };
            self.expect(&TokenKind::RBracket)?;
            return Ok(self.mk(ExprKind::SliceExpr { expr: Box::new(x), low: low.map(Box::new), high, max }, start));
        }
        let mut indices = Vec::new();
        indices.extend(low);
        while self.eat(&TokenKind::Comma) {
            if matches!(self.peek_kind(), TokenKind::RBracket) { break; }
            indices.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(self.mk(ExprKind::Index(Box::new(x), indices), start))
    }

    fn literal_type_allowed(&self, x: &Expr) -> bool {
        match &x.kind {
            ExprKind::Ident(_) | ExprKind::Selector(..) | ExprKind::Index(..) => self.expr_lev >= 0,
            ExprKind::Type(TypeExpr::Array(..) | TypeExpr::Slice(..) | TypeExpr::Struct(..) | TypeExpr::Map(..)) => true,
            _ => false,
        }
    }

    fn parse_composite_lit(&mut self, ty: Option<TypeExpr>, start: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let elts = self.nested(|p| {
            let mut elts = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                let first = p.parse_element_value()?;
                let elt = if p.eat(&TokenKind::Colon) {
                    Element { key: Some(first), value: p.parse_element_value()? }
                } else {
                    Element { key: None, value: first }
                };
                elts.push(elt);
                if !p.eat(&TokenKind::Comma) { break; }
            }
            Ok(elts)
        })?;
        self.expect(&TokenKind::RBrace)?;
        Ok(self.mk(ExprKind::CompositeLit { ty, elts }, start))
    }

    fn parse_element_value(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            let start = self.current().span;
            self.parse_composite_lit(None, start)
        } else {
            self.parse_expr()
        }
    }

    // ── Helpers ──

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => { let span = self.advance().span; Ok(Ident { name, span }) }
            _ => Err(self.unexpected("identifier")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;

    fn parse_src(src: &str) -> Result<SourceFile, ParseError> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse_file("a.go")
    }

    fn body_of(file: &SourceFile, name: &str) -> Vec<Stmt> {
        file.decls.iter().find_map(|d| match d {
            Decl::Func(f) if f.name.name == name => f.body.as_ref().map(|b| b.stmts.clone()),
            _ => None,
        }).unwrap()
    }

    fn collect_ids(e: &Expr, out: &mut Vec<ExprId>) {
        out.push(e.id);
        match &e.kind {
            ExprKind::Binary(_, l, r) => { collect_ids(l, out); collect_ids(r, out); }
            ExprKind::Unary(_, x) | ExprKind::Paren(x) | ExprKind::Selector(x, _) => collect_ids(x, out),
            ExprKind::Call { func, args, .. } => { collect_ids(func, out); for a in args { collect_ids(a, out); } }
            ExprKind::CompositeLit { elts, .. } => for el in elts { collect_ids(&el.value, out); },
            _ => {}
        }
    }

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse_src("package a\n\nimport (\n\t\"errors\"\n\tx \"golang.org/x/xerrors\"\n\t. \"golang.org/x/exp/errors\"\n\t_ \"os\"\n)\nimport \"fmt\"\n").unwrap();
        assert_eq!(file.package.name, "a");
        assert_eq!(file.imports.len(), 5);
        assert!(file.imports[0].name.is_none());
        assert_eq!(file.imports[1].name.as_ref().unwrap().name, "x");
        assert_eq!(file.imports[2].name.as_ref().unwrap().name, ".");
        assert_eq!(file.imports[3].name.as_ref().unwrap().name, "_");
        assert_eq!(file.imports[4].path, "fmt");
    }

    #[test]
    fn test_parse_comparison() {
        let file = parse_src("package a\nfunc f() {\n\t_ = &T{} == new(T)\n}\n").unwrap();
        let stmts = body_of(&file, "f");
        let Stmt::Assign { rhs, .. } = &stmts[0] else { panic!("expected assignment") };
        let ExprKind::Binary(BinaryOp::Eq, lhs, rhs) = &rhs[0].kind else { panic!("expected ==") };
        assert!(matches!(&lhs.kind, ExprKind::Unary(UnaryOp::Addr, inner) if matches!(inner.kind, ExprKind::CompositeLit { .. })));
        assert!(matches!(&rhs.kind, ExprKind::Call { args, .. } if args.len() == 1));
    }

    #[test]
    fn test_parse_composite_literal_in_header() {
        let src = "package a\nfunc f(x *T) {\n\tif x == y {\n\t}\n\tif x == (&T{}) {\n\t}\n\tfor _, v := range []int{1, 2} {\n\t\t_ = v\n\t}\n}\n";
        let file = parse_src(src).unwrap();
        let stmts = body_of(&file, "f");
        assert_eq!(stmts.len(), 3);
        let Stmt::If(first) = &stmts[0] else { panic!("expected if") };
        assert!(matches!(&first.cond.kind, ExprKind::Binary(BinaryOp::Eq, _, r) if matches!(&r.kind, ExprKind::Ident(n) if n == "y")));
        let Stmt::If(second) = &stmts[1] else { panic!("expected if") };
        assert!(matches!(&second.cond.kind, ExprKind::Binary(BinaryOp::Eq, _, r) if matches!(r.kind, ExprKind::Paren(_))));
        let Stmt::Range(range) = &stmts[2] else { panic!("expected range") };
        assert!(range.define);
        assert!(matches!(range.expr.kind, ExprKind::CompositeLit { .. }));
    }

    #[test]
    fn test_parse_generic_declarations() {
        let src = "package a\ntype genericError[T any] struct{ v T }\nfunc (g *genericError[T]) Error() string { return \"\" }\nfunc Make[T any, U comparable](t T) *genericError[T] { return &genericError[T]{} }\ntype Arr [4]byte\ntype Num interface{ ~int | ~int64 }\n";
        let file = parse_src(src).unwrap();
        let Decl::Type(g) = &file.decls[0] else { panic!("expected type") };
        assert_eq!(g.type_params.len(), 1);
        let Decl::Func(m) = &file.decls[1] else { panic!("expected func") };
        let recv = m.recv.as_ref().unwrap();
        assert!(recv.pointer);
        assert_eq!(recv.type_params[0].name, "T");
        let Decl::Func(make) = &file.decls[2] else { panic!("expected func") };
        assert_eq!(make.type_params.len(), 2);
        let Decl::Type(arr) = &file.decls[3] else { panic!("expected type") };
        assert!(arr.type_params.is_empty());
        assert!(matches!(arr.ty, TypeExpr::Array(..)));
        let Decl::Type(num) = &file.decls[4] else { panic!("expected type") };
        assert!(matches!(&num.ty, TypeExpr::Interface(elems, _) if matches!(&elems[0], InterfaceElem::Embed(TypeExpr::Union(terms, _)) if terms.len() == 2)));
    }

    #[test]
    fn test_parse_grouped_declarations() {
        let src = "package a\nvar (\n\tx = 1\n\ty, z int\n)\nconst (\n\tA = iota\n\tB\n)\ntype (\n\tT struct{}\n\tU = T\n)\nvar w int\n";
        let file = parse_src(src).unwrap();
        let kinds: Vec<&str> = file
            .decls
            .iter()
            .map(|d| match d {
                Decl::Var(_) => "var",
                Decl::Const(_) => "const",
                Decl::Type(_) => "type",
                Decl::Func(_) => "func",
            })
            .collect();
        assert_eq!(kinds, vec!["var", "var", "const", "const", "type", "type", "var"]);
        let Decl::Var(yz) = &file.decls[1] else { panic!("expected var") };
        assert_eq!(yz.names.len(), 2);
        assert!(yz.ty.is_some() && yz.values.is_empty());
    }

    #[test]
    fn test_parse_params_grouping() {
        let file = parse_src("package a\nfunc f(a, b int, c ...string) (n int, err error)\nfunc g(int, error) bool\nfunc h(x G[int], y []byte)\n").unwrap();
        let Decl::Func(f) = &file.decls[0] else { panic!() };
        let names: Vec<_> = f.sig.params.iter().map(|p| p.name.as_ref().unwrap().name.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(f.sig.params[2].variadic);
        assert_eq!(f.sig.results.len(), 2);
        assert!(f.body.is_none());
        let Decl::Func(g) = &file.decls[1] else { panic!() };
        assert!(g.sig.params.iter().all(|p| p.name.is_none()));
        let Decl::Func(h) = &file.decls[2] else { panic!() };
        assert!(matches!(&h.sig.params[0].ty, TypeExpr::Name { args, .. } if args.len() == 1));
    }

    #[test]
    fn test_parse_struct_fields() {
        let file = parse_src("package a\ntype S struct {\n\tmyError\n\t*other\n\tio.Reader\n\tG[int]\n\ta, b int `json:\"a\"`\n\tc []int\n\tIs func(error) bool\n}\n").unwrap();
        let Decl::Type(s) = &file.decls[0] else { panic!() };
        let TypeExpr::Struct(fields, _) = &s.ty else { panic!("expected struct") };
        let embedded: Vec<bool> = fields.iter().map(|f| f.embedded).collect();
        assert_eq!(embedded, vec![true, true, true, true, false, false, false]);
        assert_eq!(fields[4].names.len(), 2);
    }

    #[test]
    fn test_parse_type_switch_and_labels() {
        let src = "package a\nfunc f(x any) {\nouter:\n\tswitch v := x.(type) {\n\tcase *T, nil:\n\t\tbreak outer\n\tdefault:\n\t\t_ = v\n\t}\n\tswitch {\n\tcase x == nil:\n\t}\n}\n";
        let file = parse_src(src).unwrap();
        let stmts = body_of(&file, "f");
        let Stmt::Labeled { stmt, .. } = &stmts[0] else { panic!("expected label") };
        let Stmt::TypeSwitch(ts) = stmt.as_ref() else { panic!("expected type switch") };
        assert_eq!(ts.bind.as_ref().unwrap().name, "v");
        assert_eq!(ts.clauses[0].types.len(), 2);
        assert!(ts.clauses[0].types[1].is_none());
        assert!(ts.clauses[1].default);
        assert!(matches!(&stmts[1], Stmt::Switch(s) if s.tag.is_none()));
    }

    #[test]
    fn test_parse_statements() {
        let src = "package a\nfunc f() {\n\tvar (\n\t\tx = 1\n\t\ty int\n\t)\n\tx += 2\n\tx++\n\tfor i := 0; i < 3; i++ {\n\t\tcontinue\n\t}\n\tfor {\n\t\tbreak\n\t}\n\tdefer func() { recover() }()\n\tgo g(x, y)\n\tif err := g(); err != nil {\n\t} else if y > 0 {\n\t} else {\n\t}\n\treturn\n}\n";
        let file = parse_src(src).unwrap();
        let stmts = body_of(&file, "f");
        assert!(matches!(&stmts[0], Stmt::Decl(d) if d.len() == 2));
        assert!(matches!(&stmts[1], Stmt::Assign { op: Some(BinaryOp::Add), .. }));
        assert!(matches!(&stmts[2], Stmt::IncDec { inc: true, .. }));
        assert!(matches!(&stmts[3], Stmt::For(f) if f.init.is_some() && f.post.is_some()));
        assert!(matches!(&stmts[4], Stmt::For(f) if f.cond.is_none()));
        assert!(matches!(&stmts[5], Stmt::Defer(..)));
        assert!(matches!(&stmts[6], Stmt::Go(..)));
        assert!(matches!(&stmts[7], Stmt::If(i) if i.init.is_some() && i.els.is_some()));
        assert!(matches!(&stmts[8], Stmt::Return { values, .. } if values.is_empty()));
    }

    #[test]
    fn test_parse_type_literals_in_expressions() {
        let src = "package a\nfunc f() {\n\t_ = new(struct{}) == &struct{ x int }{}\n\t_ = new([0]byte)\n\t_ = (*T)(nil)\n\t_ = map[string]int{\"a\": 1}\n\t_ = []*T{{}, nil}\n}\n";
        let file = parse_src(src).unwrap();
        let stmts = body_of(&file, "f");
        assert_eq!(stmts.len(), 5);
        let Stmt::Assign { rhs, .. } = &stmts[0] else { panic!() };
        let ExprKind::Binary(_, l, _) = &rhs[0].kind else { panic!() };
        let ExprKind::Call { args, .. } = &l.kind else { panic!() };
        assert!(matches!(&args[0].kind, ExprKind::Type(TypeExpr::Struct(fields, _)) if fields.is_empty()));
        let Stmt::Assign { rhs, .. } = &stmts[4] else { panic!() };
        let ExprKind::CompositeLit { elts, .. } = &rhs[0].kind else { panic!() };
        assert!(matches!(&elts[0].value.kind, ExprKind::CompositeLit { ty: None, .. }));
    }

    #[test]
    fn test_expr_ids_unique() {
        let file = parse_src("package a\nfunc f() {\n\t_ = errors.Is(&T{}, new(T)) || a == b\n}\n").unwrap();
        let stmts = body_of(&file, "f");
        let Stmt::Assign { rhs, .. } = &stmts[0] else { panic!() };
        let mut ids = Vec::new();
        collect_ids(&rhs[0], &mut ids);
        let mut dedup = ids.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(ids.len(), dedup.len());
    }

    #[test]
    fn test_id_base_offsets() {
        let tokens = Lexer::new("package a\nvar x = y").tokenize().unwrap();
        let mut parser = Parser::with_id_base(tokens, 100);
        parser.parse_file("b.go").unwrap();
        assert_eq!(parser.next_id(), 101);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_src("func f() {}").is_err());
        assert!(parse_src("package a\nfunc {\n}\n").is_err());
        assert!(matches!(parse_src("package a\nfunc f() {\n\tx := \n"), Err(_)));
        assert!(matches!(parse_src("package a\nfunc f(a int, string) {}\n"), Err(ParseError::Invalid { .. })));
    }
}
