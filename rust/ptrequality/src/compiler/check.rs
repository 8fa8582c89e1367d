//! Lenient type checker for the Go subset.
//!
//! Checking never fails: names that do not resolve and expressions that do
//! not type become `Invalid` and are logged. What the analysis needs is the
//! scoping of every identifier use and the static type of every expression,
//! recorded in [`Info`].
//!
//! A package is checked in phases: imports, type declarations, methods,
//! function signatures, then (with the type table sealed) package variables
//! and function bodies.

use crate::compiler::ast::*;
use crate::compiler::lexer::Lexer;
use crate::compiler::parser::Parser;
use crate::compiler::scope::{Builtin, ObjId, ObjKind, Object, Objects, Scope};
use crate::compiler::types::*;
use crate::compiler::universe::{self, Universe};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// What an expression denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Invalid,
    /// Call without results
    NoValue,
    Builtin,
    TypeExpr,
    Value,
    Nil,
    Package,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAndMode {
    pub mode: Mode,
    pub ty: TypeId,
}

#[derive(Debug, Default)]
pub struct Info {
    /// Identifier or qualified identifier (`pkg.Name`) → the object it denotes
    pub uses: HashMap<ExprId, ObjId>,
    pub types: HashMap<ExprId, TypeAndMode>,
}

impl Info {
    pub fn use_of(&self, id: ExprId) -> Option<ObjId> {
        self.uses.get(&id).copied()
    }

    pub fn type_of(&self, id: ExprId) -> Option<TypeAndMode> {
        self.types.get(&id).copied()
    }
}

/// A parsed and checked package with everything the analysis reads.
#[derive(Debug)]
pub struct CheckedPackage {
    pub path: String,
    pub name: String,
    pub files: Vec<SourceFile>,
    pub info: Info,
    pub types: TypeTable,
    pub objects: Objects,
}

impl CheckedPackage {
    pub fn object(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(id)
    }

    /// Type string relative to this package.
    pub fn type_string(&self, ty: TypeId) -> String {
        self.types.type_string(ty, &self.path)
    }
}

/// Check `files` as the package at `path`.
pub fn check_package(path: &str, files: Vec<SourceFile>) -> CheckedPackage {
    let mut env = Env::new();
    let name = files
        .first()
        .map(|f| f.package.name.clone())
        .unwrap_or_else(|| universe::default_package_name(path).to_string());
    let (info, _) = env.check_files(path, &name, &files);
    debug!(package = path, types = env.types.len(), objects = env.objects.len(), "checked package");
    CheckedPackage { path: path.to_string(), name, files, info, types: env.types, objects: env.objects }
}

struct Package {
    name: String,
    scope: Scope,
    /// Imported path without a stub; members are unknown
    opaque: bool,
}

/// State shared by every package of one load.
struct Env {
    types: TypeTable,
    objects: Objects,
    universe: Scope,
    packages: HashMap<String, Package>,
    importing: Vec<String>,
    /// Type parameters of generic functions
    func_tparams: HashMap<ObjId, Vec<TypeId>>,
}

impl Env {
    fn new() -> Self {
        let mut types = TypeTable::new();
        let mut objects = Objects::new();
        let universe = Universe::build(&mut types, &mut objects).scope;
        Self {
            types,
            objects,
            universe,
            packages: HashMap::new(),
            importing: Vec::new(),
            func_tparams: HashMap::new(),
        }
    }

    fn check_files(&mut self, path: &str, name: &str, files: &[SourceFile]) -> (Info, Scope) {
        let mut checker = Checker::new(self, path, name);
        checker.check(files);
        let Checker { info, pkg_scope, .. } = checker;
        (info, pkg_scope)
    }

    /// Load `path` on first use. Returns the package name.
    fn import(&mut self, path: &str) -> String {
        if let Some(pkg) = self.packages.get(path) {
            return pkg.name.clone();
        }
        let fallback = universe::default_package_name(path).to_string();
        if self.importing.iter().any(|p| p == path) {
            warn!(path, "import cycle");
            return fallback;
        }
        let Some(src) = universe::stub_source(path) else {
            debug!(path, "no stub for import; treating it as opaque");
            self.packages.insert(path.to_string(), Package { name: fallback.clone(), scope: Scope::new(), opaque: true });
            return fallback;
        };
        let parsed = Lexer::new(src)
            .tokenize()
            .map_err(|e| e.to_string())
            .and_then(|tokens| Parser::new(tokens).parse_file(path).map_err(|e| e.to_string()));
        let file = match parsed {
            Ok(file) => file,
            Err(err) => {
                warn!(path, %err, "stub failed to parse");
                self.packages.insert(path.to_string(), Package { name: fallback.clone(), scope: Scope::new(), opaque: true });
                return fallback;
            }
        };
        let name = file.package.name.clone();
        trace!(path, "checking stub");
        self.importing.push(path.to_string());
        let (_, scope) = self.check_files(path, &name, std::slice::from_ref(&file));
        self.importing.pop();
        self.packages.insert(path.to_string(), Package { name: name.clone(), scope, opaque: false });
        name
    }
}

/// Operand produced by checking an expression
#[derive(Debug, Clone, Copy)]
struct Operand {
    mode: Mode,
    ty: TypeId,
    builtin: Option<Builtin>,
}

impl Operand {
    fn new(mode: Mode, ty: TypeId) -> Self {
        Self { mode, ty, builtin: None }
    }

    fn invalid() -> Self {
        Self::new(Mode::Invalid, TypeTable::INVALID)
    }

    fn value(ty: TypeId) -> Self {
        Self::new(Mode::Value, ty)
    }
}

struct FuncWork<'a> {
    file: usize,
    tparams: Scope,
    recv: Option<(&'a Ident, TypeId)>,
    ft: &'a FuncType,
    sig: TypeId,
    body: &'a Block,
}

struct Checker<'a, 'e> {
    env: &'e mut Env,
    path: String,
    pkg_ref: PkgRef,
    info: Info,
    pkg_scope: Scope,
    file_scopes: Vec<Scope>,
    cur_file: usize,
    /// Function-local scopes, innermost last
    scopes: Vec<Scope>,
    const_exprs: HashMap<ObjId, (&'a Expr, i128)>,
    /// `None` while being evaluated or when not an integer constant
    const_values: HashMap<ObjId, Option<i128>>,
    iota: Option<i128>,
}

impl<'a, 'e> Checker<'a, 'e> {
    fn new(env: &'e mut Env, path: &str, name: &str) -> Self {
        Self {
            env,
            path: path.to_string(),
            pkg_ref: PkgRef { path: path.to_string(), name: name.to_string() },
            info: Info::default(),
            pkg_scope: Scope::new(),
            file_scopes: Vec::new(),
            cur_file: 0,
            scopes: Vec::new(),
            const_exprs: HashMap::new(),
            const_values: HashMap::new(),
            iota: None,
        }
    }

    fn check(&mut self, files: &'a [SourceFile]) {
        for file in files {
            let scope = self.collect_imports(file);
            self.file_scopes.push(scope);
        }

        self.env.types.unseal();
        let mut type_decls = Vec::new();
        let mut methods = Vec::new();
        let mut funcs = Vec::new();
        let mut values = Vec::new();
        for (fi, file) in files.iter().enumerate() {
            for decl in &file.decls {
                match decl {
                    Decl::Type(spec) => {
                        let obj = self.declare_type_name(spec, false);
                        type_decls.push((fi, obj, spec));
                    }
                    Decl::Func(f) if f.recv.is_some() => methods.push((fi, f)),
                    Decl::Func(f) => {
                        let obj = if f.name.name == "init" || f.name.is_blank() {
                            None
                        } else {
                            Some(self.declare_package(&f.name, ObjKind::Func, TypeTable::INVALID))
                        };
                        funcs.push((fi, obj, f));
                    }
                    Decl::Var(spec) | Decl::Const(spec) => {
                        let kind = if matches!(decl, Decl::Var(_)) { ObjKind::Var } else { ObjKind::Const };
                        let objs: Vec<Option<ObjId>> = spec
                            .names
                            .iter()
                            .map(|n| (!n.is_blank()).then(|| self.declare_package(n, kind.clone(), TypeTable::INVALID)))
                            .collect();
                        values.push((fi, kind, objs, spec));
                    }
                }
            }
        }

        self.record_const_exprs(&values);
        let named_rhs = self.resolve_type_decls(&type_decls);

        let mut work = Vec::new();
        for (fi, f) in methods {
            if let Some(w) = self.collect_method(fi, f) {
                work.push((f.span, w));
            }
        }
        for (fi, obj, f) in funcs {
            self.cur_file = fi;
            self.scopes.push(Scope::new());
            let tparams = self.declare_type_params(&f.type_params);
            let sig = self.resolve_signature(&f.sig);
            let scope = self.scopes.pop().unwrap_or_default();
            if let Some(obj) = obj {
                self.set_obj_type(obj, sig);
                if !tparams.is_empty() {
                    self.env.func_tparams.insert(obj, tparams);
                }
            }
            if let Some(body) = &f.body {
                work.push((f.span, FuncWork { file: fi, tparams: scope, recv: None, ft: &f.sig, sig, body }));
            }
        }

        self.env.types.seal();
        self.settle_underlying(&named_rhs);

        for (fi, kind, objs, spec) in values {
            self.cur_file = fi;
            self.value_spec(&kind, &objs, spec);
        }

        work.sort_by_key(|(span, w)| (w.file, span.start));
        for (_, w) in &work {
            self.check_body(w);
        }
    }

    // ── Declarations ──

    fn collect_imports(&mut self, file: &SourceFile) -> Scope {
        let mut scope = Scope::new();
        for imp in &file.imports {
            let pkg_name = self.env.import(&imp.path);
            match imp.name.as_ref().map(|n| n.name.as_str()) {
                Some("_") => {}
                Some(".") => {
                    if let Some(pkg) = self.env.packages.get(&imp.path) {
                        for (name, id) in pkg.scope.iter() {
                            if name.starts_with(|c: char| c.is_uppercase()) {
                                scope.insert(name, id);
                            }
                        }
                    }
                }
                alias => {
                    let name = alias.unwrap_or(pkg_name.as_str()).to_string();
                    let span = imp.name.as_ref().map(|n| n.span).unwrap_or(imp.span);
                    let id = self.env.objects.alloc(Object {
                        name: name.clone(),
                        kind: ObjKind::PkgName(imp.path.clone()),
                        ty: TypeTable::INVALID,
                        pkg: Some(self.path.clone()),
                        local: false,
                        span,
                    });
                    scope.insert(&name, id);
                }
            }
        }
        scope
    }

    fn new_object(&mut self, name: &Ident, kind: ObjKind, ty: TypeId, local: bool) -> ObjId {
        self.env.objects.alloc(Object {
            name: name.name.clone(),
            kind,
            ty,
            pkg: Some(self.path.clone()),
            local,
            span: name.span,
        })
    }

    fn declare_package(&mut self, name: &Ident, kind: ObjKind, ty: TypeId) -> ObjId {
        let id = self.new_object(name, kind, ty, false);
        if let Some(prev) = self.pkg_scope.insert(&name.name, id) {
            warn!(name = %name.name, line = name.span.line, ?prev, "redeclared in this package");
        }
        id
    }

    /// Declare in the innermost function scope, or the package scope outside functions.
    fn declare_local(&mut self, name: &Ident, kind: ObjKind, ty: TypeId) -> ObjId {
        if self.scopes.is_empty() {
            return self.declare_package(name, kind, ty);
        }
        let id = self.new_object(name, kind, ty, true);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.name, id);
        }
        id
    }

    fn set_obj_type(&mut self, id: ObjId, ty: TypeId) {
        if let Some(obj) = self.env.objects.get_mut(id) {
            obj.ty = ty;
        }
    }

    fn obj_type(&self, id: ObjId) -> TypeId {
        self.env.objects.get(id).map(|o| o.ty).unwrap_or(TypeTable::INVALID)
    }

    fn declare_type_name(&mut self, spec: &TypeSpec, local: bool) -> ObjId {
        let ty = if spec.alias { TypeTable::INVALID } else { self.env.types.new_named(&spec.name.name, Some(self.pkg_ref.clone())) };
        if local { self.declare_local(&spec.name, ObjKind::TypeName, ty) } else { self.declare_package(&spec.name, ObjKind::TypeName, ty) }
    }

    /// Resolve the right-hand sides of type declarations. Returns the
    /// (named, rhs) pairs whose underlying types may still need settling.
    fn resolve_type_decls(&mut self, decls: &[(usize, ObjId, &'a TypeSpec)]) -> Vec<(TypeId, TypeId)> {
        // aliases may refer to aliases declared later
        for _ in 0..2 {
            for &(fi, obj, spec) in decls.iter().filter(|(_, _, s)| s.alias) {
                self.cur_file = fi;
                let ty = self.resolve_type(&spec.ty);
                self.set_obj_type(obj, ty);
            }
        }
        let mut named_rhs = Vec::new();
        for &(fi, obj, spec) in decls.iter().filter(|(_, _, s)| !s.alias) {
            self.cur_file = fi;
            let named = self.obj_type(obj);
            let rhs = self.resolve_type_spec_rhs(named, spec);
            named_rhs.push((named, rhs));
        }
        self.settle_underlying(&named_rhs);
        named_rhs
    }

    fn resolve_type_spec_rhs(&mut self, named: TypeId, spec: &TypeSpec) -> TypeId {
        self.scopes.push(Scope::new());
        if !spec.type_params.is_empty() {
            let tparams = self.declare_type_params(&spec.type_params);
            self.env.types.set_type_params(named, tparams);
        }
        let rhs = self.resolve_type(&spec.ty);
        self.scopes.pop();
        self.env.types.set_underlying(named, rhs);
        rhs
    }

    /// `type A B` needs B's underlying type, which may be declared later.
    fn settle_underlying(&mut self, named_rhs: &[(TypeId, TypeId)]) {
        for _ in 0..=named_rhs.len() {
            let mut changed = false;
            for &(named, rhs) in named_rhs {
                if self.env.types.underlying(named) == TypeTable::INVALID {
                    self.env.types.set_underlying(named, rhs);
                    changed |= self.env.types.underlying(named) != TypeTable::INVALID;
                }
            }
            changed |= self.env.types.recomplete();
            if !changed {
                break;
            }
        }
    }

    fn collect_method(&mut self, fi: usize, f: &'a FuncDecl) -> Option<FuncWork<'a>> {
        let recv = f.recv.as_ref()?;
        self.cur_file = fi;
        let base = self
            .pkg_scope
            .get(&recv.base.name)
            .and_then(|id| self.env.objects.get(id))
            .filter(|o| o.kind == ObjKind::TypeName)
            .map(|o| o.ty)
            .filter(|&t| self.env.types.named(t).is_some());
        let Some(base) = base else {
            warn!(receiver = %recv.base.name, method = %f.name.name, "method on unknown receiver type");
            return None;
        };
        let params = self.env.types.named(base).map(|n| n.type_params.clone()).unwrap_or_default();
        let mut scope = Scope::new();
        for (name, &tp) in recv.type_params.iter().zip(params.iter()) {
            let id = self.new_object(name, ObjKind::TypeName, tp, true);
            scope.insert(&name.name, id);
        }
        self.scopes.push(scope);
        let sig = self.resolve_signature(&f.sig);
        let scope = self.scopes.pop().unwrap_or_default();
        self.env.types.add_method(base, Method { name: f.name.name.clone(), sig, pointer_recv: recv.pointer });

        let body = f.body.as_ref()?;
        let recv_ty = if recv.pointer { self.env.types.pointer(base) } else { base };
        Some(FuncWork { file: fi, tparams: scope, recv: recv.name.as_ref().map(|n| (n, recv_ty)), ft: &f.sig, sig, body })
    }

    /// Declare type parameters in the innermost scope, then resolve their constraints.
    fn declare_type_params(&mut self, decls: &[TypeParamDecl]) -> Vec<TypeId> {
        let mut ids = Vec::new();
        for d in decls {
            for name in &d.names {
                let tp = self.env.types.new_type_param(&name.name, ids.len());
                self.declare_local(name, ObjKind::TypeName, tp);
                ids.push(tp);
            }
        }
        let mut index = 0;
        for d in decls {
            let constraint = self.resolve_constraint(&d.constraint);
            for _ in &d.names {
                if let Some(&tp) = ids.get(index) {
                    self.env.types.set_constraint(tp, constraint);
                }
                index += 1;
            }
        }
        ids
    }

    fn resolve_constraint(&mut self, t: &TypeExpr) -> TypeId {
        let ty = self.resolve_type(t);
        if self.env.types.is_interface(ty) {
            ty
        } else {
            self.env.types.intern(TypeKind::Interface(Interface { methods: vec![], embeddeds: vec![ty] }))
        }
    }

    fn record_const_exprs(&mut self, values: &[(usize, ObjKind, Vec<Option<ObjId>>, &'a ValueSpec)]) {
        let mut iota = 0;
        let mut last: Option<&'a [Expr]> = None;
        let mut prev_const = false;
        for (_, kind, objs, spec) in values {
            let spec: &'a ValueSpec = *spec;
            if *kind != ObjKind::Const {
                prev_const = false;
                continue;
            }
            if !prev_const {
                iota = 0;
                last = None;
            }
            let exprs: &'a [Expr] = if spec.values.is_empty() { last.unwrap_or(&[]) } else { &spec.values };
            for (obj, expr) in objs.iter().zip(exprs.iter()) {
                if let Some(obj) = obj {
                    self.const_exprs.insert(*obj, (expr, iota));
                }
            }
            last = Some(exprs);
            iota += 1;
            prev_const = true;
        }
    }

    fn value_spec(&mut self, kind: &ObjKind, objs: &[Option<ObjId>], spec: &'a ValueSpec) {
        let declared = spec.ty.as_ref().map(|t| self.resolve_type(t));
        let tys = if spec.values.is_empty() {
            let (iota_hint, exprs) = objs
                .iter()
                .flatten()
                .find_map(|o| self.const_exprs.get(o).map(|(e, i)| (*i, *e)))
                .map(|(i, e)| (Some(i), Some(e)))
                .unwrap_or((None, None));
            match (kind, exprs) {
                (ObjKind::Const, Some(e)) if declared.is_none() => {
                    let old = std::mem::replace(&mut self.iota, iota_hint);
                    let ty = self.expr(e).ty;
                    self.iota = old;
                    vec![ty; objs.len()]
                }
                _ => vec![declared.unwrap_or(TypeTable::INVALID); objs.len()],
            }
        } else {
            let hint = objs.iter().flatten().find_map(|o| self.const_exprs.get(o).map(|(_, i)| *i));
            let old = std::mem::replace(&mut self.iota, hint);
            let tys = self.value_types(&spec.values, objs.len(), declared);
            self.iota = old;
            tys
        };
        for (obj, ty) in objs.iter().zip(tys) {
            if let Some(obj) = obj {
                let ty = match (declared, kind) {
                    (Some(d), _) => d,
                    (None, ObjKind::Var) => self.default_type(ty),
                    (None, _) => ty,
                };
                self.set_obj_type(*obj, ty);
            }
        }
    }

    // ── Lookup ──

    fn lookup(&self, name: &str) -> Option<ObjId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.get(name))
            .or_else(|| self.file_scopes.get(self.cur_file).and_then(|s| s.get(name)))
            .or_else(|| self.pkg_scope.get(name))
            .or_else(|| self.env.universe.get(name))
    }

    fn package_member(&self, path: &str, name: &str) -> Option<ObjId> {
        self.env.packages.get(path).and_then(|p| p.scope.get(name))
    }

    fn is_opaque(&self, path: &str) -> bool {
        self.env.packages.get(path).map(|p| p.opaque).unwrap_or(true)
    }

    fn pkg_path_of(&self, name: &str) -> Option<String> {
        let obj = self.env.objects.get(self.lookup(name)?)?;
        match &obj.kind {
            ObjKind::PkgName(path) => Some(path.clone()),
            _ => None,
        }
    }

    // ── Types ──

    fn resolve_type(&mut self, t: &TypeExpr) -> TypeId {
        match t {
            TypeExpr::Name { pkg, name, args, span } => {
                let obj = match pkg {
                    None => self.lookup(&name.name),
                    Some(p) => match self.pkg_path_of(&p.name) {
                        Some(path) => {
                            let member = self.package_member(&path, &name.name);
                            if member.is_none() && self.is_opaque(&path) {
                                return TypeTable::INVALID;
                            }
                            member
                        }
                        None => None,
                    },
                };
                let obj = obj.and_then(|id| self.env.objects.get(id)).filter(|o| o.kind == ObjKind::TypeName);
                let Some(base) = obj.map(|o| o.ty) else {
                    warn!(name = %name.name, line = span.line, col = span.col, "undefined type");
                    return TypeTable::INVALID;
                };
                if args.is_empty() {
                    return base;
                }
                let args = args.iter().map(|a| self.resolve_type(a)).collect();
                self.env.types.instantiate(base, args)
            }
            TypeExpr::Pointer(elem, _) => {
                let elem = self.resolve_type(elem);
                self.env.types.pointer(elem)
            }
            TypeExpr::Slice(elem, _) => {
                let elem = self.resolve_type(elem);
                self.env.types.slice(elem)
            }
            TypeExpr::Array(len, elem, _) => {
                let n = match len {
                    ArrayLen::Expr(e) => self.const_int(e).and_then(|v| u64::try_from(v).ok()),
                    ArrayLen::Ellipsis => None,
                };
                let elem = self.resolve_type(elem);
                self.env.types.intern(TypeKind::Array(n, elem))
            }
            TypeExpr::Map(k, v, _) => {
                let (k, v) = (self.resolve_type(k), self.resolve_type(v));
                self.env.types.intern(TypeKind::Map(k, v))
            }
            TypeExpr::Chan(elem, _) => {
                let elem = self.resolve_type(elem);
                self.env.types.intern(TypeKind::Chan(elem))
            }
            TypeExpr::Func(ft) => self.resolve_signature(ft),
            TypeExpr::Struct(fields, _) => {
                let mut out = Vec::new();
                for f in fields {
                    let ty = self.resolve_type(&f.ty);
                    if f.embedded {
                        out.push(Field { name: embedded_name(&f.ty), ty, embedded: true });
                    } else {
                        out.extend(f.names.iter().map(|n| Field { name: n.name.clone(), ty, embedded: false }));
                    }
                }
                self.env.types.intern(TypeKind::Struct(out))
            }
            TypeExpr::Interface(elems, _) => {
                let mut methods = Vec::new();
                let mut embeddeds = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => methods.push((name.name.clone(), self.resolve_signature(sig))),
                        InterfaceElem::Embed(t) => embeddeds.push(self.resolve_type(t)),
                    }
                }
                self.env.types.intern(TypeKind::Interface(Interface { methods, embeddeds }))
            }
            TypeExpr::Union(terms, _) => {
                let embeddeds = terms.iter().map(|t| self.resolve_type(t)).collect();
                self.env.types.intern(TypeKind::Interface(Interface { methods: vec![], embeddeds }))
            }
            TypeExpr::Tilde(t, _) => self.resolve_type(t),
        }
    }

    fn resolve_signature(&mut self, ft: &FuncType) -> TypeId {
        let mut params = Vec::new();
        let mut variadic = false;
        for (i, p) in ft.params.iter().enumerate() {
            let ty = self.resolve_type(&p.ty);
            if p.variadic {
                variadic = i + 1 == ft.params.len();
                params.push(self.env.types.slice(ty));
            } else {
                params.push(ty);
            }
        }
        let results = ft.results.iter().map(|r| self.resolve_type(&r.ty)).collect();
        self.env.types.intern(TypeKind::Signature(Signature { params, results, variadic }))
    }

    fn default_type(&self, ty: TypeId) -> TypeId {
        match self.env.types.kind(ty) {
            TypeKind::Basic(BasicKind::UntypedNil) => TypeTable::INVALID,
            TypeKind::Basic(b) => self.env.types.basic(b.default_type()),
            _ => ty,
        }
    }

    // ── Constants ──

    fn const_value(&mut self, id: ObjId) -> Option<i128> {
        if let Some(&v) = self.const_values.get(&id) {
            return v;
        }
        let (expr, iota) = *self.const_exprs.get(&id)?;
        self.const_values.insert(id, None);
        let old = std::mem::replace(&mut self.iota, Some(iota));
        let value = self.const_int(expr);
        self.iota = old;
        self.const_values.insert(id, value);
        value
    }

    /// Integer value of a constant expression, when it is one.
    fn const_int(&mut self, e: &Expr) -> Option<i128> {
        match &e.kind {
            ExprKind::BasicLit(LitKind::Int, text) => parse_int_lit(text),
            ExprKind::BasicLit(LitKind::Char, text) => text.chars().next().map(|c| c as i128),
            ExprKind::Paren(x) => self.const_int(x),
            ExprKind::Ident(name) => {
                let id = self.lookup(name)?;
                let obj = self.env.objects.get(id)?;
                if obj.kind != ObjKind::Const {
                    return None;
                }
                if obj.pkg.is_none() {
                    return if name == "iota" { self.iota } else { None };
                }
                self.const_value(id)
            }
            ExprKind::Unary(op, x) => {
                let v = self.const_int(x)?;
                match op {
                    UnaryOp::Neg => Some(-v),
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Complement => Some(!v),
                    _ => None,
                }
            }
            ExprKind::Binary(op, l, r) => {
                let (l, r) = (self.const_int(l)?, self.const_int(r)?);
                match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    BinaryOp::Div => l.checked_div(r),
                    BinaryOp::Rem => l.checked_rem(r),
                    BinaryOp::Shl => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                    BinaryOp::Shr => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
                    BinaryOp::And => Some(l & r),
                    BinaryOp::Or => Some(l | r),
                    BinaryOp::Xor => Some(l ^ r),
                    BinaryOp::AndNot => Some(l & !r),
                    _ => None,
                }
            }
            // conversions such as `int(4)`
            ExprKind::Call { func, args, .. } if args.len() == 1 => {
                let name = match &func.unparen().kind {
                    ExprKind::Ident(name) => name,
                    _ => return None,
                };
                let is_type = self.lookup(name).and_then(|id| self.env.objects.get(id)).map(|o| o.kind == ObjKind::TypeName);
                if is_type == Some(true) { self.const_int(&args[0]) } else { None }
            }
            _ => None,
        }
    }

    // ── Function bodies ──

    fn check_body(&mut self, work: &FuncWork<'a>) {
        self.cur_file = work.file;
        let depth = self.scopes.len();
        self.scopes.push(work.tparams.clone());
        self.scopes.push(Scope::new());
        if let Some((name, ty)) = work.recv {
            self.declare_local(name, ObjKind::Var, ty);
        }
        self.declare_params(work.ft, work.sig);
        self.stmts(&work.body.stmts);
        self.scopes.truncate(depth);
    }

    fn declare_params(&mut self, ft: &FuncType, sig: TypeId) {
        let Some(sig) = self.env.types.signature(sig).cloned() else { return };
        for (p, ty) in ft.params.iter().zip(sig.params) {
            if let Some(name) = &p.name {
                self.declare_local(name, ObjKind::Var, ty);
            }
        }
        for (r, ty) in ft.results.iter().zip(sig.results) {
            if let Some(name) = &r.name {
                self.declare_local(name, ObjKind::Var, ty);
            }
        }
    }

    fn open(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn close(&mut self) {
        self.scopes.pop();
    }

    fn block(&mut self, b: &'a Block) {
        self.open();
        self.stmts(&b.stmts);
        self.close();
    }

    fn stmts(&mut self, stmts: &'a [Stmt]) {
        for s in stmts {
            self.stmt(s);
        }
    }

    fn stmt(&mut self, s: &'a Stmt) {
        match s {
            Stmt::Decl(decls) => self.local_decls(decls),
            Stmt::Define { names, values, .. } => {
                let tys = self.value_types(values, names.len(), None);
                for (name, ty) in names.iter().zip(tys) {
                    let redeclared = self.scopes.last().map(|sc| sc.contains(&name.name)).unwrap_or(false);
                    if name.is_blank() || redeclared {
                        continue;
                    }
                    let ty = self.default_type(ty);
                    self.declare_local(name, ObjKind::Var, ty);
                }
            }
            Stmt::Assign { lhs, rhs, .. } => {
                for e in lhs.iter().chain(rhs) {
                    self.expr(e);
                }
            }
            Stmt::IncDec { expr, .. } | Stmt::Expr(expr) | Stmt::Go(expr, _) | Stmt::Defer(expr, _) => {
                self.expr(expr);
            }
            Stmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.expr(value);
            }
            Stmt::Return { values, .. } => {
                for v in values {
                    self.expr(v);
                }
            }
            Stmt::Block(b) => self.block(b),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::For(f) => {
                self.open();
                if let Some(init) = &f.init {
                    self.stmt(init);
                }
                if let Some(cond) = &f.cond {
                    self.expr(cond);
                }
                if let Some(post) = &f.post {
                    self.stmt(post);
                }
                self.block(&f.body);
                self.close();
            }
            Stmt::Range(r) => self.range_stmt(r),
            Stmt::Switch(sw) => {
                self.open();
                if let Some(init) = &sw.init {
                    self.stmt(init);
                }
                if let Some(tag) = &sw.tag {
                    self.expr(tag);
                }
                for clause in &sw.clauses {
                    self.open();
                    for e in &clause.exprs {
                        self.expr(e);
                    }
                    self.stmts(&clause.body);
                    self.close();
                }
                self.close();
            }
            Stmt::TypeSwitch(ts) => self.type_switch(ts),
            Stmt::Labeled { stmt, .. } => self.stmt(stmt),
            Stmt::Branch { .. } | Stmt::Empty(_) => {}
        }
    }

    fn if_stmt(&mut self, s: &'a IfStmt) {
        self.open();
        if let Some(init) = &s.init {
            self.stmt(init);
        }
        self.expr(&s.cond);
        self.block(&s.then);
        if let Some(els) = &s.els {
            self.stmt(els);
        }
        self.close();
    }

    fn range_stmt(&mut self, r: &'a RangeStmt) {
        self.open();
        let x = self.expr(&r.expr);
        let (k, v) = self.range_types(x.ty);
        for (e, ty) in [(&r.key, k), (&r.value, v)] {
            let Some(e) = e else { continue };
            match (&e.kind, r.define) {
                (ExprKind::Ident(name), true) => {
                    self.info.types.insert(e.id, TypeAndMode { mode: Mode::Value, ty });
                    if name != "_" {
                        let ident = Ident { name: name.clone(), span: e.span };
                        self.declare_local(&ident, ObjKind::Var, ty);
                    }
                }
                _ => {
                    self.expr(e);
                }
            }
        }
        self.block(&r.body);
        self.close();
    }

    fn range_types(&mut self, ty: TypeId) -> (TypeId, TypeId) {
        let int = self.env.types.basic(BasicKind::Int);
        let kind = self.env.types.under_kind(ty).clone();
        match kind {
            TypeKind::Slice(e) | TypeKind::Array(_, e) => (int, e),
            TypeKind::Pointer(p) => match self.env.types.under_kind(p).clone() {
                TypeKind::Array(_, e) => (int, e),
                _ => (TypeTable::INVALID, TypeTable::INVALID),
            },
            TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => (int, self.env.types.basic(BasicKind::Rune)),
            TypeKind::Basic(b) if !matches!(b, BasicKind::Bool | BasicKind::UntypedBool) => {
                (self.env.types.basic(b.default_type()), TypeTable::INVALID)
            }
            TypeKind::Map(k, v) => (k, v),
            TypeKind::Chan(e) => (e, TypeTable::INVALID),
            // range-over-func: func(yield func(K, V) bool)
            TypeKind::Signature(sig) => {
                let yield_params = sig
                    .params
                    .first()
                    .and_then(|&y| self.env.types.signature(y))
                    .map(|s| s.params.clone())
                    .unwrap_or_default();
                let k = yield_params.first().copied().unwrap_or(TypeTable::INVALID);
                let v = yield_params.get(1).copied().unwrap_or(TypeTable::INVALID);
                (k, v)
            }
            _ => (TypeTable::INVALID, TypeTable::INVALID),
        }
    }

    fn type_switch(&mut self, ts: &'a TypeSwitchStmt) {
        self.open();
        if let Some(init) = &ts.init {
            self.stmt(init);
        }
        let x = self.expr(&ts.expr);
        for clause in &ts.clauses {
            self.open();
            let case_types: Vec<Option<TypeId>> = clause
                .types
                .iter()
                .map(|t| t.as_ref().map(|t| self.resolve_type(t)))
                .collect();
            if let Some(bind) = &ts.bind {
                let ty = match case_types.as_slice() {
                    [Some(t)] => *t,
                    _ => x.ty,
                };
                self.declare_local(bind, ObjKind::Var, ty);
            }
            self.stmts(&clause.body);
            self.close();
        }
        self.close();
    }

    fn local_decls(&mut self, decls: &'a [Decl]) {
        let mut last: Option<&'a [Expr]> = None;
        for (iota, decl) in decls.iter().enumerate() {
            match decl {
                Decl::Type(spec) => {
                    let obj = self.declare_type_name(spec, true);
                    if spec.alias {
                        let ty = self.resolve_type(&spec.ty);
                        self.set_obj_type(obj, ty);
                    } else {
                        let named = self.obj_type(obj);
                        self.resolve_type_spec_rhs(named, spec);
                    }
                }
                Decl::Var(spec) => {
                    let declared = spec.ty.as_ref().map(|t| self.resolve_type(t));
                    let tys = if spec.values.is_empty() {
                        vec![declared.unwrap_or(TypeTable::INVALID); spec.names.len()]
                    } else {
                        self.value_types(&spec.values, spec.names.len(), declared)
                    };
                    for (name, ty) in spec.names.iter().zip(tys) {
                        if !name.is_blank() {
                            let ty = declared.unwrap_or_else(|| self.default_type(ty));
                            self.declare_local(name, ObjKind::Var, ty);
                        }
                    }
                }
                Decl::Const(spec) => {
                    let exprs: &'a [Expr] = if spec.values.is_empty() { last.unwrap_or(&[]) } else { &spec.values };
                    last = Some(exprs);
                    let declared = spec.ty.as_ref().map(|t| self.resolve_type(t));
                    let old = std::mem::replace(&mut self.iota, Some(iota as i128));
                    let tys: Vec<TypeId> = exprs.iter().map(|e| self.expr(e).ty).collect();
                    self.iota = old;
                    for (i, name) in spec.names.iter().enumerate() {
                        if name.is_blank() {
                            continue;
                        }
                        let ty = declared.or_else(|| tys.get(i).copied()).unwrap_or(TypeTable::INVALID);
                        let id = self.declare_local(name, ObjKind::Const, ty);
                        if let Some(e) = exprs.get(i) {
                            self.const_exprs.insert(id, (e, iota as i128));
                        }
                    }
                }
                Decl::Func(f) => warn!(name = %f.name.name, "function declaration inside a function"),
            }
        }
    }

    /// Types of the values assigned to `want` names, splitting a single
    /// multi-valued expression and supporting the comma-ok forms.
    fn value_types(&mut self, values: &'a [Expr], want: usize, hint: Option<TypeId>) -> Vec<TypeId> {
        let mut tys: Vec<TypeId> = if values.len() == 1 && want > 1 {
            let op = self.expr_hint(&values[0], hint);
            match self.env.types.kind(op.ty) {
                TypeKind::Tuple(elems) => elems.clone(),
                _ => vec![op.ty, self.env.types.basic(BasicKind::Bool)],
            }
        } else {
            values.iter().map(|v| self.expr_hint(v, hint).ty).collect()
        };
        tys.resize(want, TypeTable::INVALID);
        tys
    }

    // ── Expressions ──

    fn record(&mut self, e: &Expr, op: Operand) -> Operand {
        self.info.types.insert(e.id, TypeAndMode { mode: op.mode, ty: op.ty });
        op
    }

    fn expr(&mut self, e: &'a Expr) -> Operand {
        self.expr_hint(e, None)
    }

    /// Check `e`; `hint` is the type an elided composite literal takes.
    fn expr_hint(&mut self, e: &'a Expr, hint: Option<TypeId>) -> Operand {
        let op = match &e.kind {
            ExprKind::Ident(name) => self.ident(e, name),
            ExprKind::BasicLit(kind, _) => {
                let basic = match kind {
                    LitKind::Int => BasicKind::UntypedInt,
                    LitKind::Float => BasicKind::UntypedFloat,
                    LitKind::Char => BasicKind::UntypedRune,
                    LitKind::String => BasicKind::UntypedString,
                };
                Operand::value(self.env.types.basic(basic))
            }
            ExprKind::CompositeLit { ty, elts } => Operand::value(self.composite_lit(ty.as_ref(), elts, hint)),
            ExprKind::FuncLit { sig, body } => {
                let sig_ty = self.resolve_signature(sig);
                self.open();
                self.declare_params(sig, sig_ty);
                self.stmts(&body.stmts);
                self.close();
                Operand::value(sig_ty)
            }
            ExprKind::Paren(x) => self.expr_hint(x, hint),
            ExprKind::Selector(x, sel) => self.selector(e, x, sel),
            ExprKind::Index(x, indices) => self.index(x, indices),
            ExprKind::SliceExpr { expr, low, high, max } => {
                let x = self.expr(expr);
                for part in [low, high, max].into_iter().flatten() {
                    self.expr(part);
                }
                let kind = self.env.types.under_kind(x.ty).clone();
                let ty = match kind {
                    TypeKind::Slice(_) | TypeKind::Basic(BasicKind::String) => x.ty,
                    TypeKind::Basic(BasicKind::UntypedString) => self.env.types.basic(BasicKind::String),
                    TypeKind::Array(_, elem) => self.env.types.slice(elem),
                    TypeKind::Pointer(p) => match self.env.types.under_kind(p).clone() {
                        TypeKind::Array(_, elem) => self.env.types.slice(elem),
                        _ => TypeTable::INVALID,
                    },
                    _ => TypeTable::INVALID,
                };
                Operand::value(ty)
            }
            ExprKind::TypeAssert(x, ty) => {
                let x = self.expr(x);
                match ty {
                    Some(t) => Operand::value(self.resolve_type(t)),
                    None => Operand::value(x.ty),
                }
            }
            ExprKind::Call { func, args, .. } => self.call(func, args),
            ExprKind::Unary(op, x) => self.unary(*op, x),
            ExprKind::Binary(op, l, r) => {
                let (l, r) = (self.expr(l), self.expr(r));
                let ty = if op.is_comparison() {
                    self.env.types.basic(BasicKind::UntypedBool)
                } else if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                    l.ty
                } else if self.is_untyped(l.ty) && !self.is_untyped(r.ty) {
                    r.ty
                } else {
                    l.ty
                };
                Operand::value(ty)
            }
            ExprKind::Type(t) => Operand::new(Mode::TypeExpr, self.resolve_type(t)),
        };
        self.record(e, op)
    }

    fn is_untyped(&self, ty: TypeId) -> bool {
        matches!(self.env.types.kind(ty), TypeKind::Basic(b) if b.is_untyped())
    }

    fn ident(&mut self, e: &Expr, name: &str) -> Operand {
        if name == "_" {
            return Operand::invalid();
        }
        let Some(id) = self.lookup(name) else {
            warn!(name, line = e.span.line, col = e.span.col, "undefined name");
            return Operand::invalid();
        };
        self.info.uses.insert(e.id, id);
        self.object_operand(id)
    }

    fn object_operand(&self, id: ObjId) -> Operand {
        let Some(obj) = self.env.objects.get(id) else { return Operand::invalid() };
        match &obj.kind {
            ObjKind::TypeName => Operand::new(Mode::TypeExpr, obj.ty),
            ObjKind::Var | ObjKind::Const | ObjKind::Func => Operand::value(obj.ty),
            ObjKind::Builtin(b) => Operand { mode: Mode::Builtin, ty: TypeTable::INVALID, builtin: Some(*b) },
            ObjKind::Nil => Operand::new(Mode::Nil, obj.ty),
            ObjKind::PkgName(_) => Operand::new(Mode::Package, TypeTable::INVALID),
        }
    }

    fn selector(&mut self, e: &Expr, x: &'a Expr, sel: &Ident) -> Operand {
        if let ExprKind::Ident(name) = &x.kind {
            if let Some(path) = self.pkg_path_of(name) {
                let pkg = self.ident(x, name);
                self.record(x, pkg);
                return match self.package_member(&path, &sel.name) {
                    Some(member) => {
                        self.info.uses.insert(e.id, member);
                        self.object_operand(member)
                    }
                    None => {
                        if !self.is_opaque(&path) {
                            warn!(package = %path, name = %sel.name, line = sel.span.line, "undefined package member");
                        }
                        Operand::invalid()
                    }
                };
            }
        }
        let x = self.expr(x);
        if x.mode == Mode::Invalid {
            return Operand::invalid();
        }
        match self.env.types.lookup_field_or_method(x.ty, &sel.name) {
            Lookup::Found(found) => {
                if x.mode == Mode::TypeExpr {
                    // method expression `T.M`: the receiver becomes the first parameter
                    let Some(sig) = self.env.types.signature(found.ty).cloned() else { return Operand::invalid() };
                    let mut params = vec![x.ty];
                    params.extend(sig.params);
                    let ty = self.env.types.intern(TypeKind::Signature(Signature { params, ..sig }));
                    return Operand::value(ty);
                }
                Operand::value(found.ty)
            }
            Lookup::Ambiguous => {
                warn!(name = %sel.name, line = sel.span.line, "ambiguous selector");
                Operand::invalid()
            }
            Lookup::NotFound => {
                if !self.env.types.is_invalid(x.ty) {
                    let ty = self.env.types.type_string(x.ty, &self.path);
                    warn!(name = %sel.name, ty = %ty, line = sel.span.line, "no field or method");
                }
                Operand::invalid()
            }
        }
    }

    fn index(&mut self, x: &'a Expr, indices: &'a [Expr]) -> Operand {
        let op = self.expr(x);
        if op.mode == Mode::TypeExpr {
            let args = indices.iter().map(|i| self.expr(i).ty).collect();
            return Operand::new(Mode::TypeExpr, self.env.types.instantiate(op.ty, args));
        }
        if let Some(tparams) = self.generic_func_params(x) {
            let args: Vec<TypeId> = indices.iter().map(|i| self.expr(i).ty).collect();
            let smap = tparams.into_iter().zip(args).collect();
            return Operand::value(self.env.types.subst(op.ty, &smap));
        }
        for i in indices {
            self.expr(i);
        }
        let kind = self.env.types.under_kind(op.ty).clone();
        let ty = match kind {
            TypeKind::Slice(e) | TypeKind::Array(_, e) | TypeKind::Map(_, e) => e,
            TypeKind::Pointer(p) => match self.env.types.under_kind(p) {
                TypeKind::Array(_, e) => *e,
                _ => TypeTable::INVALID,
            },
            TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => self.env.types.basic(BasicKind::Byte),
            _ => TypeTable::INVALID,
        };
        Operand::value(ty)
    }

    /// Type parameters of the generic function `func` names, if any.
    fn generic_func_params(&self, func: &Expr) -> Option<Vec<TypeId>> {
        let id = match &func.unparen().kind {
            ExprKind::Ident(_) | ExprKind::Selector(..) => self.info.use_of(func.unparen().id)?,
            _ => return None,
        };
        self.env.func_tparams.get(&id).cloned()
    }

    fn composite_lit(&mut self, ty: Option<&TypeExpr>, elts: &'a [Element], hint: Option<TypeId>) -> TypeId {
        let lit_ty = match ty {
            Some(TypeExpr::Array(ArrayLen::Ellipsis, elem, _)) => {
                let elem = self.resolve_type(elem);
                self.env.types.intern(TypeKind::Array(Some(elts.len() as u64), elem))
            }
            Some(t) => self.resolve_type(t),
            // elided `{...}` of a `*T` element is `&T{...}`
            None => hint.map(|h| self.env.types.pointer_elem(h).unwrap_or(h)).unwrap_or(TypeTable::INVALID),
        };
        let kind = self.env.types.under_kind(lit_ty).clone();
        match kind {
            TypeKind::Struct(fields) => {
                for (i, elt) in elts.iter().enumerate() {
                    let field_ty = match &elt.key {
                        Some(key) => match &key.kind {
                            ExprKind::Ident(name) => fields.iter().find(|f| &f.name == name).map(|f| f.ty),
                            _ => None,
                        },
                        None => fields.get(i).map(|f| f.ty),
                    };
                    self.expr_hint(&elt.value, field_ty);
                }
            }
            TypeKind::Slice(elem) | TypeKind::Array(_, elem) => {
                for elt in elts {
                    if let Some(key) = &elt.key {
                        self.expr(key);
                    }
                    self.expr_hint(&elt.value, Some(elem));
                }
            }
            TypeKind::Map(k, v) => {
                for elt in elts {
                    if let Some(key) = &elt.key {
                        self.expr_hint(key, Some(k));
                    }
                    self.expr_hint(&elt.value, Some(v));
                }
            }
            _ => {
                for elt in elts {
                    self.expr(&elt.value);
                }
            }
        }
        lit_ty
    }

    fn call(&mut self, func: &'a Expr, args: &'a [Expr]) -> Operand {
        let f = self.expr(func);
        match f.mode {
            Mode::TypeExpr => {
                for a in args {
                    self.expr(a);
                }
                return Operand::value(f.ty);
            }
            Mode::Builtin => return self.builtin_call(f.builtin, args),
            Mode::Invalid => {
                for a in args {
                    self.expr(a);
                }
                return Operand::invalid();
            }
            _ => {}
        }
        let Some(sig) = self.env.types.signature(f.ty).cloned() else {
            for a in args {
                self.expr(a);
            }
            return Operand::invalid();
        };
        let mut arg_tys = Vec::new();
        for (i, a) in args.iter().enumerate() {
            let param = match sig.params.get(i) {
                Some(&p) if sig.variadic && i + 1 >= sig.params.len() => {
                    match self.env.types.under_kind(p) { TypeKind::Slice(e) => Some(*e), _ => Some(p) }
                }
                Some(&p) => Some(p),
                None if sig.variadic => sig.params.last().and_then(|&p| match self.env.types.under_kind(p) {
                    TypeKind::Slice(e) => Some(*e),
                    _ => None,
                }),
                None => None,
            };
            arg_tys.push((param, self.expr_hint(a, param).ty));
        }
        let mut results = sig.results.clone();
        if let Some(tparams) = self.generic_func_params(func) {
            let mut smap = HashMap::new();
            for (param, arg) in &arg_tys {
                if let Some(param) = param {
                    self.unify(&tparams, *param, *arg, &mut smap);
                }
            }
            trace!(inferred = smap.len(), "inferred type arguments");
            results = results.into_iter().map(|r| self.env.types.subst(r, &smap)).collect();
        }
        match results.len() {
            0 => Operand::new(Mode::NoValue, TypeTable::INVALID),
            1 => Operand::value(results[0]),
            _ => Operand::value(self.env.types.tuple(results)),
        }
    }

    /// Infer type arguments from direct `T`, `*T`, `[]T` and `G[T]` parameters.
    fn unify(&self, tparams: &[TypeId], param: TypeId, arg: TypeId, smap: &mut HashMap<TypeId, TypeId>) {
        let types = &self.env.types;
        match (types.kind(param), types.kind(arg)) {
            (TypeKind::TypeParam(_), _) if tparams.contains(&param) => {
                let arg = self.default_type(arg);
                if !types.is_invalid(arg) {
                    smap.entry(param).or_insert(arg);
                }
            }
            (TypeKind::Pointer(p), TypeKind::Pointer(a)) | (TypeKind::Slice(p), TypeKind::Slice(a)) => {
                self.unify(tparams, *p, *a, smap)
            }
            (TypeKind::Named(p), TypeKind::Named(a)) if p.origin.is_some() && p.origin == a.origin => {
                for (p, a) in p.type_args.iter().zip(&a.type_args) {
                    self.unify(tparams, *p, *a, smap);
                }
            }
            _ => {}
        }
    }

    fn builtin_call(&mut self, builtin: Option<Builtin>, args: &'a [Expr]) -> Operand {
        let Some(b) = builtin else { return Operand::invalid() };
        let mut arg_ops = Vec::new();
        for a in args {
            arg_ops.push(self.expr(a));
        }
        let first = arg_ops.first().copied();
        let int = self.env.types.basic(BasicKind::Int);
        match b {
            Builtin::New => match first {
                Some(t) if t.mode == Mode::TypeExpr && args.len() == 1 => Operand::value(self.env.types.pointer(t.ty)),
                _ => {
                    warn!("new expects a single type argument");
                    Operand::invalid()
                }
            },
            Builtin::Make => Operand::value(first.map(|t| t.ty).unwrap_or(TypeTable::INVALID)),
            Builtin::Len | Builtin::Cap | Builtin::Copy => Operand::value(int),
            Builtin::Append | Builtin::Min | Builtin::Max => {
                Operand::value(first.map(|t| self.default_type(t.ty)).unwrap_or(TypeTable::INVALID))
            }
            Builtin::Recover => {
                let any = self.env.types.empty_interface();
                Operand::value(any)
            }
            Builtin::Real | Builtin::Imag => Operand::value(self.env.types.basic(BasicKind::Float64)),
            Builtin::Complex => Operand::value(self.env.types.basic(BasicKind::Complex128)),
            Builtin::Clear | Builtin::Close | Builtin::Delete | Builtin::Panic | Builtin::Print | Builtin::Println => {
                Operand::new(Mode::NoValue, TypeTable::INVALID)
            }
        }
    }

    fn unary(&mut self, op: UnaryOp, x: &'a Expr) -> Operand {
        let x = self.expr(x);
        match op {
            UnaryOp::Addr => Operand::value(self.env.types.pointer(x.ty)),
            UnaryOp::Deref if x.mode == Mode::TypeExpr => Operand::new(Mode::TypeExpr, self.env.types.pointer(x.ty)),
            UnaryOp::Deref => Operand::value(self.env.types.pointer_elem(x.ty).unwrap_or(TypeTable::INVALID)),
            UnaryOp::Recv => match self.env.types.under_kind(x.ty) {
                TypeKind::Chan(e) => Operand::value(*e),
                _ => Operand::invalid(),
            },
            UnaryOp::Not => Operand::value(x.ty),
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Complement => Operand::value(x.ty),
        }
    }
}

fn embedded_name(t: &TypeExpr) -> String {
    match t {
        TypeExpr::Name { name, .. } => name.name.clone(),
        TypeExpr::Pointer(inner, _) => embedded_name(inner),
        _ => String::new(),
    }
}

fn parse_int_lit(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i128::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}
