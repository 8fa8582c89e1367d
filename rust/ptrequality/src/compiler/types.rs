//! Type representation shared by the checker and the analysis.
//!
//! Structural types are interned in a single arena, so two structurally
//! identical types share a `TypeId`. Named types and type parameters are
//! nominal and always get a fresh id. Generic instances are cached per
//! (origin, arguments) and completed by substitution once the declaring
//! package has been collected.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use strum_macros::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Byte,
    Rune,
    #[strum(serialize = "unsafe.Pointer")]
    UnsafePointer,
    #[strum(serialize = "untyped bool")]
    UntypedBool,
    #[strum(serialize = "untyped int")]
    UntypedInt,
    #[strum(serialize = "untyped rune")]
    UntypedRune,
    #[strum(serialize = "untyped float")]
    UntypedFloat,
    #[strum(serialize = "untyped string")]
    UntypedString,
    #[strum(serialize = "untyped nil")]
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Declared in the universe scope under its own name.
    pub fn is_predeclared(self) -> bool {
        !self.is_untyped() && self != BasicKind::UnsafePointer
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool | BasicKind::UntypedInt | BasicKind::UntypedRune
                | BasicKind::UntypedFloat | BasicKind::UntypedString | BasicKind::UntypedNil
        )
    }

    /// Type an untyped constant takes when it needs one.
    pub fn default_type(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Rune,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// The last parameter is `...T`, stored as `[]T`
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interface {
    /// Explicitly declared methods, name and signature
    pub methods: Vec<(String, TypeId)>,
    /// Embedded interfaces and type-set terms
    pub embeddeds: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    pub sig: TypeId,
    pub pointer_recv: bool,
}

/// Package a named type belongs to; `None` for the universe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgRef {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Named {
    pub name: String,
    pub pkg: Option<PkgRef>,
    pub underlying: TypeId,
    pub methods: Vec<Method>,
    pub type_params: Vec<TypeId>,
    pub type_args: Vec<TypeId>,
    /// Generic type this is an instance of
    pub origin: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParam {
    pub name: String,
    pub index: usize,
    pub constraint: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Invalid,
    Basic(BasicKind),
    Pointer(TypeId),
    Slice(TypeId),
    /// `None` when the length is not a constant the checker could evaluate
    Array(Option<u64>, TypeId),
    Map(TypeId, TypeId),
    Chan(TypeId),
    Struct(Vec<Field>),
    Tuple(Vec<TypeId>),
    Signature(Signature),
    Interface(Interface),
    Named(Named),
    TypeParam(TypeParam),
}

impl TypeKind {
    fn is_structural(&self) -> bool {
        !matches!(self, TypeKind::Named(_) | TypeKind::TypeParam(_) | TypeKind::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Field,
    Method,
}

/// Result of a field or method lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub name: String,
    /// Field type, or method signature
    pub ty: TypeId,
    /// Type that declares the member
    pub owner: TypeId,
    /// A pointer was dereferenced on the way (receiver or embedded pointer)
    pub indirect: bool,
    pub pointer_recv: bool,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Selection),
    /// Several members of that name at the shallowest depth
    Ambiguous,
    NotFound,
}

static INVALID_KIND: TypeKind = TypeKind::Invalid;

#[derive(Debug)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    interned: HashMap<TypeKind, TypeId>,
    basics: HashMap<BasicKind, TypeId>,
    instances: HashMap<(TypeId, Vec<TypeId>), TypeId>,
    pending: Vec<TypeId>,
    sealed: bool,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub const INVALID: TypeId = TypeId(0);

    pub fn new() -> Self {
        let mut table = Self {
            kinds: vec![TypeKind::Invalid],
            interned: HashMap::new(),
            basics: HashMap::new(),
            instances: HashMap::new(),
            pending: Vec::new(),
            sealed: true,
        };
        for kind in <BasicKind as strum::IntoEnumIterator>::iter() {
            let id = table.intern(TypeKind::Basic(kind));
            table.basics.insert(kind, id);
        }
        table
    }

    pub fn len(&self) -> usize { self.kinds.len() }

    pub fn is_empty(&self) -> bool { self.kinds.is_empty() }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        self.kinds.get(id.0 as usize).unwrap_or(&INVALID_KIND)
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind);
        id
    }

    /// Structural types are deduplicated; nominal ones always get a new id.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if !kind.is_structural() {
            return self.push(kind);
        }
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = self.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics.get(&kind).copied().unwrap_or(Self::INVALID)
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId { self.intern(TypeKind::Pointer(elem)) }
    pub fn slice(&mut self, elem: TypeId) -> TypeId { self.intern(TypeKind::Slice(elem)) }
    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId { self.intern(TypeKind::Tuple(elems)) }

    pub fn empty_interface(&mut self) -> TypeId {
        self.intern(TypeKind::Interface(Interface { methods: vec![], embeddeds: vec![] }))
    }

    // ── Named types ──

    pub fn new_named(&mut self, name: &str, pkg: Option<PkgRef>) -> TypeId {
        self.push(TypeKind::Named(Named {
            name: name.into(),
            pkg,
            underlying: Self::INVALID,
            methods: vec![],
            type_params: vec![],
            type_args: vec![],
            origin: None,
        }))
    }

    pub fn new_type_param(&mut self, name: &str, index: usize) -> TypeId {
        self.push(TypeKind::TypeParam(TypeParam { name: name.into(), index, constraint: Self::INVALID }))
    }

    pub fn set_constraint(&mut self, tp: TypeId, constraint: TypeId) {
        if let Some(TypeKind::TypeParam(p)) = self.kinds.get_mut(tp.0 as usize) {
            p.constraint = constraint;
        }
    }

    pub fn set_type_params(&mut self, named: TypeId, params: Vec<TypeId>) {
        if let Some(TypeKind::Named(n)) = self.kinds.get_mut(named.0 as usize) {
            n.type_params = params;
        }
    }

    /// Set the underlying type, collapsing chains of named types.
    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) {
        let mut resolved = underlying;
        let mut seen = HashSet::new();
        while let TypeKind::Named(n) = self.kind(resolved) {
            if !seen.insert(resolved) || n.underlying == resolved {
                resolved = Self::INVALID;
                break;
            }
            resolved = n.underlying;
        }
        if resolved == named {
            resolved = Self::INVALID;
        }
        if let Some(TypeKind::Named(n)) = self.kinds.get_mut(named.0 as usize) {
            n.underlying = resolved;
        }
    }

    pub fn add_method(&mut self, named: TypeId, method: Method) {
        if let Some(TypeKind::Named(n)) = self.kinds.get_mut(named.0 as usize) {
            if !n.methods.iter().any(|m| m.name == method.name) {
                n.methods.push(method);
            }
        }
    }

    pub fn named(&self, id: TypeId) -> Option<&Named> {
        match self.kind(id) {
            TypeKind::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn type_param(&self, id: TypeId) -> Option<&TypeParam> {
        match self.kind(id) {
            TypeKind::TypeParam(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_type_param(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::TypeParam(_))
    }

    // ── Instantiation ──

    /// Defer completion of new instances until `seal`.
    pub fn unseal(&mut self) {
        self.sealed = false;
    }

    /// Complete every pending instance; instances created afterwards are
    /// completed immediately.
    pub fn seal(&mut self) {
        self.sealed = true;
        while let Some(inst) = self.pending.pop() {
            self.complete_instance(inst);
        }
    }

    /// Complete again the instances whose origin had no underlying type yet
    /// when they were first completed. Returns whether any of them changed.
    pub fn recomplete(&mut self) -> bool {
        let mut stale: Vec<TypeId> = self
            .instances
            .values()
            .copied()
            .filter(|&inst| self.underlying(inst) == Self::INVALID)
            .collect();
        stale.sort();
        let mut changed = false;
        for inst in stale {
            self.complete_instance(inst);
            changed |= self.underlying(inst) != Self::INVALID;
        }
        changed
    }

    /// `origin[args]`, cached. Non-generic origins are returned as is.
    pub fn instantiate(&mut self, origin: TypeId, args: Vec<TypeId>) -> TypeId {
        let Some(named) = self.named(origin) else { return origin };
        if named.type_params.is_empty() || args.is_empty() {
            return origin;
        }
        if named.type_params == args {
            return origin;
        }
        let key = (origin, args.clone());
        if let Some(&id) = self.instances.get(&key) {
            return id;
        }
        let (name, pkg) = (named.name.clone(), named.pkg.clone());
        let id = self.push(TypeKind::Named(Named {
            name,
            pkg,
            underlying: Self::INVALID,
            methods: vec![],
            type_params: vec![],
            type_args: args,
            origin: Some(origin),
        }));
        self.instances.insert(key, id);
        if self.sealed {
            self.complete_instance(id);
        } else {
            self.pending.push(id);
        }
        id
    }

    fn complete_instance(&mut self, inst: TypeId) {
        let Some(n) = self.named(inst) else { return };
        let Some(origin) = n.origin else { return };
        let args = n.type_args.clone();
        let Some(o) = self.named(origin) else { return };
        let smap: HashMap<TypeId, TypeId> = o.type_params.iter().copied().zip(args).collect();
        let (underlying, methods) = (o.underlying, o.methods.clone());
        let underlying = self.subst(underlying, &smap);
        let methods: Vec<Method> = methods
            .into_iter()
            .map(|m| Method { sig: self.subst(m.sig, &smap), ..m })
            .collect();
        if let Some(TypeKind::Named(n)) = self.kinds.get_mut(inst.0 as usize) {
            n.underlying = underlying;
            n.methods = methods;
        }
    }

    /// Replace type parameters according to `smap`.
    pub fn subst(&mut self, ty: TypeId, smap: &HashMap<TypeId, TypeId>) -> TypeId {
        if smap.is_empty() {
            return ty;
        }
        match self.kind(ty).clone() {
            TypeKind::TypeParam(_) => smap.get(&ty).copied().unwrap_or(ty),
            TypeKind::Invalid | TypeKind::Basic(_) => ty,
            TypeKind::Pointer(e) => { let e = self.subst(e, smap); self.pointer(e) }
            TypeKind::Slice(e) => { let e = self.subst(e, smap); self.slice(e) }
            TypeKind::Array(n, e) => { let e = self.subst(e, smap); self.intern(TypeKind::Array(n, e)) }
            TypeKind::Map(k, v) => {
                let (k, v) = (self.subst(k, smap), self.subst(v, smap));
                self.intern(TypeKind::Map(k, v))
            }
            TypeKind::Chan(e) => { let e = self.subst(e, smap); self.intern(TypeKind::Chan(e)) }
            TypeKind::Struct(fields) => {
                let fields = fields.into_iter().map(|f| Field { ty: self.subst(f.ty, smap), ..f }).collect();
                self.intern(TypeKind::Struct(fields))
            }
            TypeKind::Tuple(elems) => {
                let elems = elems.into_iter().map(|e| self.subst(e, smap)).collect();
                self.tuple(elems)
            }
            TypeKind::Signature(sig) => {
                let params = sig.params.into_iter().map(|p| self.subst(p, smap)).collect();
                let results = sig.results.into_iter().map(|r| self.subst(r, smap)).collect();
                self.intern(TypeKind::Signature(Signature { params, results, variadic: sig.variadic }))
            }
            TypeKind::Interface(iface) => {
                let methods = iface.methods.into_iter().map(|(n, s)| (n, self.subst(s, smap))).collect();
                let embeddeds = iface.embeddeds.into_iter().map(|e| self.subst(e, smap)).collect();
                self.intern(TypeKind::Interface(Interface { methods, embeddeds }))
            }
            TypeKind::Named(n) => match n.origin {
                Some(origin) if !n.type_args.is_empty() => {
                    let args = n.type_args.iter().map(|a| self.subst(*a, smap)).collect();
                    self.instantiate(origin, args)
                }
                // the generic type named inside its own declaration, e.g. `*List[T]`
                None if !n.type_params.is_empty() => {
                    let args = n.type_params.iter().map(|a| self.subst(*a, smap)).collect();
                    self.instantiate(ty, args)
                }
                _ => ty,
            },
        }
    }

    // ── Queries ──

    /// The underlying type; named types are resolved, everything else is returned as is.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Named(n) => n.underlying,
            _ => id,
        }
    }

    pub fn under_kind(&self, id: TypeId) -> &TypeKind {
        self.kind(self.underlying(id))
    }

    /// Element type if `id` is (or has underlying) a pointer.
    pub fn pointer_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.under_kind(id) {
            TypeKind::Pointer(e) => Some(*e),
            _ => None,
        }
    }

    pub fn signature(&self, id: TypeId) -> Option<&Signature> {
        match self.under_kind(id) {
            TypeKind::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.under_kind(id), TypeKind::Interface(_))
    }

    pub fn is_invalid(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Invalid)
    }

    pub fn is_bool(&self, id: TypeId) -> bool {
        matches!(self.under_kind(id), TypeKind::Basic(BasicKind::Bool | BasicKind::UntypedBool))
    }

    /// Full method list of an interface, including embedded interfaces.
    pub fn interface_methods(&self, id: TypeId) -> Vec<(String, TypeId)> {
        let mut out: Vec<(String, TypeId)> = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(t) = queue.pop_front() {
            if !seen.insert(t) {
                continue;
            }
            if let TypeKind::Interface(iface) = self.under_kind(t) {
                for (name, sig) in &iface.methods {
                    if !out.iter().any(|(n, _)| n == name) {
                        out.push((name.clone(), *sig));
                    }
                }
                queue.extend(iface.embeddeds.iter().copied());
            }
        }
        out
    }

    /// Field or method `name` of `ty`, following Go's promotion rules: the
    /// shallowest embedding depth wins and two hits at that depth are
    /// ambiguous. Pointer-receiver methods are reported with `pointer_recv`
    /// set; callers decide whether the receiver is addressable.
    pub fn lookup_field_or_method(&self, ty: TypeId, name: &str) -> Lookup {
        if name == "_" {
            return Lookup::NotFound;
        }
        let (start, indirect) = match self.kind(ty) {
            TypeKind::Pointer(e) if matches!(self.kind(*e), TypeKind::Named(_)) => (*e, true),
            TypeKind::Pointer(e) if matches!(self.kind(*e), TypeKind::Struct(_)) => (*e, true),
            _ => (ty, false),
        };
        if let TypeKind::TypeParam(p) = self.kind(start) {
            return self
                .interface_methods(p.constraint)
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(n, sig)| Lookup::Found(Selection {
                    kind: SelectionKind::Method, name: n, ty: sig, owner: start,
                    indirect, pointer_recv: false, depth: 0,
                }))
                .unwrap_or(Lookup::NotFound);
        }

        let mut current = vec![(start, indirect)];
        let mut seen: HashSet<TypeId> = HashSet::new();
        let mut depth = 0;
        while !current.is_empty() {
            let mut found: Option<Selection> = None;
            let mut hits = 0;
            let mut next = Vec::new();
            // a type reached twice at one depth makes anything it declares ambiguous
            let mut multiples: HashMap<TypeId, usize> = HashMap::new();
            for (t, _) in &current {
                *multiples.entry(*t).or_default() += 1;
            }
            for &(t, indirect) in &current {
                let mut typ = t;
                if let TypeKind::Named(n) = self.kind(t) {
                    if !seen.insert(t) {
                        continue;
                    }
                    if let Some(m) = n.methods.iter().find(|m| m.name == name) {
                        hits += multiples.get(&t).copied().unwrap_or(1);
                        found = Some(Selection {
                            kind: SelectionKind::Method, name: m.name.clone(), ty: m.sig, owner: t,
                            indirect, pointer_recv: m.pointer_recv, depth,
                        });
                        continue;
                    }
                    typ = n.underlying;
                }
                match self.kind(typ) {
                    TypeKind::Struct(fields) => {
                        for f in fields {
                            if f.name == name {
                                hits += multiples.get(&t).copied().unwrap_or(1);
                                found = Some(Selection {
                                    kind: SelectionKind::Field, name: f.name.clone(), ty: f.ty, owner: t,
                                    indirect, pointer_recv: false, depth,
                                });
                                continue;
                            }
                            if f.embedded && found.is_none() {
                                let (ft, ptr) = match self.kind(f.ty) {
                                    TypeKind::Pointer(e) => (*e, true),
                                    _ => (f.ty, false),
                                };
                                next.push((ft, indirect || ptr));
                            }
                        }
                    }
                    TypeKind::Interface(_) => {
                        if let Some((n, sig)) = self.interface_methods(typ).into_iter().find(|(n, _)| n == name) {
                            hits += multiples.get(&t).copied().unwrap_or(1);
                            found = Some(Selection {
                                kind: SelectionKind::Method, name: n, ty: sig, owner: t,
                                indirect, pointer_recv: false, depth,
                            });
                        }
                    }
                    _ => {}
                }
            }
            match (hits, found) {
                (0, _) | (_, None) => {}
                (1, Some(sel)) => return Lookup::Found(sel),
                _ => return Lookup::Ambiguous,
            }
            current = next;
            depth += 1;
        }
        Lookup::NotFound
    }

    /// Method `name` in the method set of `ty`: value-receiver methods are in
    /// every method set, pointer-receiver methods only when reached through a
    /// pointer.
    pub fn method_set_lookup(&self, ty: TypeId, name: &str) -> Option<Selection> {
        match self.lookup_field_or_method(ty, name) {
            Lookup::Found(sel) if sel.kind == SelectionKind::Method && (!sel.pointer_recv || sel.indirect) => Some(sel),
            _ => None,
        }
    }

    // ── Display ──

    /// go/types style type string; types of `rel_pkg` are unqualified.
    pub fn type_string(&self, id: TypeId, rel_pkg: &str) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, rel_pkg, &mut Vec::new());
        out
    }

    fn write_type(&self, out: &mut String, id: TypeId, rel: &str, stack: &mut Vec<TypeId>) {
        if stack.contains(&id) {
            out.push_str("...");
            return;
        }
        stack.push(id);
        match self.kind(id) {
            TypeKind::Invalid => out.push_str("invalid type"),
            TypeKind::Basic(b) => out.push_str(b.name()),
            TypeKind::Pointer(e) => { out.push('*'); self.write_type(out, *e, rel, stack); }
            TypeKind::Slice(e) => { out.push_str("[]"); self.write_type(out, *e, rel, stack); }
            TypeKind::Array(n, e) => {
                match n {
                    Some(n) => out.push_str(&format!("[{}]", n)),
                    None => out.push_str("[?]"),
                }
                self.write_type(out, *e, rel, stack);
            }
            TypeKind::Map(k, v) => {
                out.push_str("map[");
                self.write_type(out, *k, rel, stack);
                out.push(']');
                self.write_type(out, *v, rel, stack);
            }
            TypeKind::Chan(e) => { out.push_str("chan "); self.write_type(out, *e, rel, stack); }
            TypeKind::Struct(fields) => {
                out.push_str("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 { out.push_str("; "); }
                    if !f.embedded {
                        out.push_str(&f.name);
                        out.push(' ');
                    }
                    self.write_type(out, f.ty, rel, stack);
                }
                out.push('}');
            }
            TypeKind::Tuple(elems) => {
                out.push('(');
                self.write_list(out, elems, rel, stack);
                out.push(')');
            }
            TypeKind::Signature(sig) => {
                out.push_str("func");
                self.write_signature(out, sig, rel, stack);
            }
            TypeKind::Interface(iface) => {
                out.push_str("interface{");
                let mut first = true;
                for (name, sig) in &iface.methods {
                    if !first { out.push_str("; "); }
                    first = false;
                    out.push_str(name);
                    match self.kind(*sig) {
                        TypeKind::Signature(s) => self.write_signature(out, s, rel, stack),
                        _ => out.push_str("()"),
                    }
                }
                for e in &iface.embeddeds {
                    if !first { out.push_str("; "); }
                    first = false;
                    self.write_type(out, *e, rel, stack);
                }
                out.push('}');
            }
            TypeKind::Named(n) => {
                if let Some(pkg) = &n.pkg {
                    if pkg.path != rel {
                        out.push_str(&pkg.name);
                        out.push('.');
                    }
                }
                out.push_str(&n.name);
                let args = if n.type_args.is_empty() { &n.type_params } else { &n.type_args };
                if !args.is_empty() {
                    out.push('[');
                    self.write_list(out, args, rel, stack);
                    out.push(']');
                }
            }
            TypeKind::TypeParam(p) => out.push_str(&p.name),
        }
        stack.pop();
    }

    fn write_list(&self, out: &mut String, ids: &[TypeId], rel: &str, stack: &mut Vec<TypeId>) {
        for (i, t) in ids.iter().enumerate() {
            if i > 0 { out.push_str(", "); }
            self.write_type(out, *t, rel, stack);
        }
    }

    fn write_signature(&self, out: &mut String, sig: &Signature, rel: &str, stack: &mut Vec<TypeId>) {
        out.push('(');
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 { out.push_str(", "); }
            match self.kind(*p) {
                TypeKind::Slice(e) if sig.variadic && i + 1 == sig.params.len() => {
                    out.push_str("...");
                    self.write_type(out, *e, rel, stack);
                }
                _ => self.write_type(out, *p, rel, stack),
            }
        }
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [single] => { out.push(' '); self.write_type(out, *single, rel, stack); }
            many => {
                out.push_str(" (");
                self.write_list(out, many, rel, stack);
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(path: &str) -> Option<PkgRef> {
        Some(PkgRef { path: path.into(), name: path.rsplit('/').next().unwrap().into() })
    }

    fn sig(t: &mut TypeTable, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        t.intern(TypeKind::Signature(Signature { params, results, variadic: false }))
    }

    #[test]
    fn test_structural_interning() {
        let mut t = TypeTable::new();
        let int = t.basic(BasicKind::Int);
        let a = t.intern(TypeKind::Struct(vec![Field { name: "x".into(), ty: int, embedded: false }]));
        let b = t.intern(TypeKind::Struct(vec![Field { name: "x".into(), ty: int, embedded: false }]));
        assert_eq!(a, b);
        let n1 = t.new_named("T", pkg("a"));
        let n2 = t.new_named("T", pkg("a"));
        assert_ne!(n1, n2);
        assert_eq!(t.pointer(a), t.pointer(b));
    }

    #[test]
    fn test_type_string() {
        let mut t = TypeTable::new();
        let int = t.basic(BasicKind::Int);
        let byte = t.basic(BasicKind::Byte);
        let empty = t.intern(TypeKind::Struct(vec![]));
        let blank = t.intern(TypeKind::Struct(vec![Field { name: "_".into(), ty: int, embedded: false }]));
        let arr = t.intern(TypeKind::Array(Some(0), byte));
        assert_eq!(t.type_string(empty, "a"), "struct{}");
        assert_eq!(t.type_string(blank, "a"), "struct{_ int}");
        assert_eq!(t.type_string(arr, "a"), "[0]byte");
        let json = t.new_named("UnmarshalTypeError", pkg("encoding/json"));
        assert_eq!(t.type_string(json, "a"), "json.UnmarshalTypeError");
        let local = t.new_named("myError", pkg("a"));
        let p = t.pointer(local);
        assert_eq!(t.type_string(p, "a"), "*myError");
        let err = t.new_named("error", None);
        let boolean = t.basic(BasicKind::Bool);
        let f = sig(&mut t, vec![err], vec![boolean]);
        assert_eq!(t.type_string(f, "a"), "func(error) bool");
    }

    #[test]
    fn test_instantiate_substitutes_fields_and_methods() {
        let mut t = TypeTable::new();
        t.unseal();
        let g = t.new_named("genericError", pkg("a"));
        let tp = t.new_type_param("T", 0);
        t.set_type_params(g, vec![tp]);
        let inst = t.instantiate(g, vec![t.basic(BasicKind::Int)]);
        let body = t.intern(TypeKind::Struct(vec![Field { name: "v".into(), ty: tp, embedded: false }]));
        t.set_underlying(g, body);
        let m = sig(&mut t, vec![tp], vec![]);
        t.add_method(g, Method { name: "Set".into(), sig: m, pointer_recv: true });
        assert!(t.is_invalid(t.underlying(inst)));
        t.seal();
        let TypeKind::Struct(fields) = t.under_kind(inst) else { panic!("expected struct") };
        assert_eq!(fields[0].ty, t.basic(BasicKind::Int));
        assert_eq!(t.type_string(inst, "a"), "genericError[int]");
        assert_eq!(t.type_string(g, "a"), "genericError[T]");
        let Lookup::Found(sel) = t.lookup_field_or_method(inst, "Set") else { panic!("expected method") };
        assert_eq!(t.signature(sel.ty).unwrap().params[0], t.basic(BasicKind::Int));
        // cached
        let again = t.instantiate(g, vec![t.basic(BasicKind::Int)]);
        assert_eq!(inst, again);
    }

    #[test]
    fn test_promoted_methods_and_ambiguity() {
        let mut t = TypeTable::new();
        let boolean = t.basic(BasicKind::Bool);
        let err = t.empty_interface();
        let is = sig(&mut t, vec![err], vec![boolean]);

        let inner = t.new_named("inner", pkg("a"));
        let unit = t.intern(TypeKind::Struct(vec![]));
        t.set_underlying(inner, unit);
        t.add_method(inner, Method { name: "Is".into(), sig: is, pointer_recv: true });

        // outer embeds *inner: pointer method is promoted into the value method set
        let outer = t.new_named("outer", pkg("a"));
        let p_inner = t.pointer(inner);
        let body = t.intern(TypeKind::Struct(vec![Field { name: "inner".into(), ty: p_inner, embedded: true }]));
        t.set_underlying(outer, body);
        assert!(t.method_set_lookup(outer, "Is").is_some());

        // embedding by value: only through a pointer
        let byval = t.new_named("byval", pkg("a"));
        let body = t.intern(TypeKind::Struct(vec![Field { name: "inner".into(), ty: inner, embedded: true }]));
        t.set_underlying(byval, body);
        assert!(t.method_set_lookup(byval, "Is").is_none());
        let p = t.pointer(byval);
        assert!(t.method_set_lookup(p, "Is").is_some());

        // two embedded types declaring Is at the same depth
        let other = t.new_named("other", pkg("a"));
        t.set_underlying(other, unit);
        t.add_method(other, Method { name: "Is".into(), sig: is, pointer_recv: false });
        let both = t.intern(TypeKind::Struct(vec![
            Field { name: "inner".into(), ty: p_inner, embedded: true },
            Field { name: "other".into(), ty: other, embedded: true },
        ]));
        assert_eq!(t.lookup_field_or_method(both, "Is"), Lookup::Ambiguous);

        // a shallower field shadows a deeper method
        let shadow = t.intern(TypeKind::Struct(vec![
            Field { name: "Is".into(), ty: boolean, embedded: false },
            Field { name: "inner".into(), ty: p_inner, embedded: true },
        ]));
        let Lookup::Found(sel) = t.lookup_field_or_method(shadow, "Is") else { panic!("expected field") };
        assert_eq!(sel.kind, SelectionKind::Field);
        assert!(t.method_set_lookup(shadow, "Is").is_none());
    }

    #[test]
    fn test_interface_methods_include_embedded() {
        let mut t = TypeTable::new();
        let s = t.basic(BasicKind::String);
        let m = sig(&mut t, vec![], vec![s]);
        let base = t.intern(TypeKind::Interface(Interface { methods: vec![("Error".into(), m)], embeddeds: vec![] }));
        let named = t.new_named("error", None);
        t.set_underlying(named, base);
        let unwrap = sig(&mut t, vec![], vec![named]);
        let wrapper = t.intern(TypeKind::Interface(Interface { methods: vec![("Unwrap".into(), unwrap)], embeddeds: vec![named] }));
        let names: Vec<_> = t.interface_methods(wrapper).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Unwrap", "Error"]);
    }
}
