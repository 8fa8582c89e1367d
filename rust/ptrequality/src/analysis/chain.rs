//! Error-chain functions and the methods that intercept them.
//!
//! `errors.Is` walks the chain of its first argument, consulting `Is`
//! methods and following `Unwrap` accessors, so a custom method can turn a
//! pointer comparison into a value comparison.

use crate::analysis::resolve::Binding;
use crate::compiler::types::{TypeId, TypeKind, TypeTable};
use serde::Serialize;
use std::str::FromStr;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use tracing::trace;

/// Maximum number of `Unwrap` steps followed before giving up.
pub const MAX_UNWRAP_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr, Serialize)]
pub enum ChainFunc {
    Is,
    As,
    Join,
    Unwrap,
}

impl ChainFunc {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Only the membership test compares its arguments.
    pub fn compares(self) -> bool {
        self == ChainFunc::Is
    }
}

/// Packages exporting error-chain functions, with the functions recognized in each.
pub const NAMESPACES: &[(&str, &[ChainFunc])] = &[
    ("errors", &[ChainFunc::Is, ChainFunc::As, ChainFunc::Join, ChainFunc::Unwrap]),
    ("golang.org/x/xerrors", &[ChainFunc::Is, ChainFunc::As, ChainFunc::Unwrap]),
    ("golang.org/x/exp/errors", &[ChainFunc::Is, ChainFunc::As, ChainFunc::Unwrap]),
];

/// The chain function a callee binding denotes, if any.
pub fn recognize(binding: &Binding) -> Option<ChainFunc> {
    let Binding::PackageFunc { path, name } = binding else { return None };
    let (_, funcs) = NAMESPACES.iter().find(|(ns, _)| ns == path)?;
    let func = ChainFunc::from_str(name).ok()?;
    funcs.contains(&func).then_some(func)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, Serialize)]
pub enum InterceptKind {
    Is,
    Unwrap,
}

/// A method that may decide the comparison instead of pointer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interception {
    pub method: InterceptKind,
    /// Type declaring the method
    pub owner: TypeId,
}

impl Interception {
    pub fn method_name(&self) -> &'static str {
        self.method.into()
    }
}

/// Whether a value of type `ty` can intercept `errors.Is`: through an
/// `Is(error) bool` method, or through an `Unwrap` accessor. Concrete unwrap
/// targets are followed looking for an `Is` further down; an interface or
/// otherwise unresolved target, a cycle, or an overlong chain counts as
/// intercepting at the accessor's owner.
pub fn interception(types: &TypeTable, ty: TypeId) -> Option<Interception> {
    let mut path = vec![ty];
    walk(types, ty, 0, &mut path)
}

fn walk(types: &TypeTable, ty: TypeId, depth: usize, path: &mut Vec<TypeId>) -> Option<Interception> {
    let base = types.pointer_elem(ty).unwrap_or(ty);
    if types.is_type_param(base) || types.is_invalid(base) {
        return None;
    }
    if let Some(owner) = is_method(types, ty) {
        trace!(depth, "found Is method");
        return Some(Interception { method: InterceptKind::Is, owner });
    }
    let (owner, targets) = unwrap_method(types, ty)?;
    let stop = Interception { method: InterceptKind::Unwrap, owner };
    if depth + 1 >= MAX_UNWRAP_DEPTH {
        trace!(depth, "unwrap chain too deep");
        return Some(stop);
    }
    for target in targets {
        if unresolved(types, target) {
            trace!(depth, "unwrap target has no static type");
            return Some(stop);
        }
        if path.contains(&target) {
            trace!(depth, "unwrap cycle");
            return Some(stop);
        }
        path.push(target);
        let found = walk(types, target, depth + 1, path);
        path.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// The dynamic type behind `ty` is not known statically.
fn unresolved(types: &TypeTable, ty: TypeId) -> bool {
    let base = types.pointer_elem(ty).unwrap_or(ty);
    types.is_interface(base) || types.is_type_param(base) || types.is_invalid(base)
}

/// Owner of a qualifying `Is` method: one parameter, one `bool` result.
fn is_method(types: &TypeTable, ty: TypeId) -> Option<TypeId> {
    let sel = types.method_set_lookup(ty, "Is")?;
    let sig = types.signature(sel.ty)?;
    let qualifies = sig.params.len() == 1 && sig.results.len() == 1 && types.is_bool(sig.results[0]);
    qualifies.then_some(sel.owner)
}

/// Owner and unwrap targets of an `Unwrap() T` or `Unwrap() []T` method.
fn unwrap_method(types: &TypeTable, ty: TypeId) -> Option<(TypeId, Vec<TypeId>)> {
    let sel = types.method_set_lookup(ty, "Unwrap")?;
    let sig = types.signature(sel.ty)?;
    if !sig.params.is_empty() || sig.results.len() != 1 {
        return None;
    }
    let result = sig.results[0];
    let target = match types.under_kind(result) {
        TypeKind::Slice(elem) => *elem,
        _ => result,
    };
    Some((sel.owner, vec![target]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::types::{BasicKind, Interface, Method, PkgRef, Signature};
    use strum::IntoEnumIterator;

    fn pkg() -> Option<PkgRef> {
        Some(PkgRef { path: "a".into(), name: "a".into() })
    }

    fn sig(t: &mut TypeTable, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        t.intern(TypeKind::Signature(Signature { params, results, variadic: false }))
    }

    fn error_type(t: &mut TypeTable) -> TypeId {
        let string = t.basic(BasicKind::String);
        let error_sig = sig(t, vec![], vec![string]);
        let iface = t.intern(TypeKind::Interface(Interface { methods: vec![("Error".into(), error_sig)], embeddeds: vec![] }));
        let error = t.new_named("error", None);
        t.set_underlying(error, iface);
        error
    }

    fn named_struct(t: &mut TypeTable, name: &str) -> TypeId {
        let n = t.new_named(name, pkg());
        let empty = t.intern(TypeKind::Struct(vec![]));
        t.set_underlying(n, empty);
        n
    }

    #[test]
    fn recognizes_namespaced_functions() {
        let b = |path: &str, name: &str| Binding::PackageFunc { path: path.into(), name: name.into() };
        assert_eq!(recognize(&b("errors", "Is")), Some(ChainFunc::Is));
        assert_eq!(recognize(&b("errors", "Join")), Some(ChainFunc::Join));
        assert_eq!(recognize(&b("golang.org/x/xerrors", "Join")), None);
        assert_eq!(recognize(&b("golang.org/x/exp/errors", "As")), Some(ChainFunc::As));
        assert_eq!(recognize(&b("errors", "New")), None);
        assert_eq!(recognize(&b("a", "Is")), None);
        assert_eq!(recognize(&Binding::Local), None);
        assert_eq!(ChainFunc::iter().filter(|f| f.compares()).count(), 1);
    }

    #[test]
    fn one_parameter_is_intercepts() {
        let mut t = TypeTable::new();
        let error = error_type(&mut t);
        let boolean = t.basic(BasicKind::Bool);
        let one = sig(&mut t, vec![error], vec![boolean]);
        let two = sig(&mut t, vec![error, error], vec![boolean]);
        let with_is = named_struct(&mut t, "withIs");
        t.add_method(with_is, Method { name: "Is".into(), sig: one, pointer_recv: false });
        let two_arg = named_struct(&mut t, "twoArg");
        t.add_method(two_arg, Method { name: "Is".into(), sig: two, pointer_recv: false });

        let ptr = t.pointer(with_is);
        assert_eq!(interception(&t, ptr), Some(Interception { method: InterceptKind::Is, owner: with_is }));
        let ptr = t.pointer(two_arg);
        assert_eq!(interception(&t, ptr), None);
    }

    #[test]
    fn promoted_through_embedded_pointer() {
        let mut t = TypeTable::new();
        let error = error_type(&mut t);
        let boolean = t.basic(BasicKind::Bool);
        let one = sig(&mut t, vec![error], vec![boolean]);
        let with_is = named_struct(&mut t, "withIs");
        t.add_method(with_is, Method { name: "Is".into(), sig: one, pointer_recv: true });
        let embedded = t.pointer(with_is);
        let outer = t.intern(TypeKind::Struct(vec![crate::compiler::types::Field { name: "withIs".into(), ty: embedded, embedded: true }]));
        let ptr = t.pointer(outer);
        assert_eq!(interception(&t, ptr).map(|i| i.owner), Some(with_is));
        // the pointer-receiver method is not in the value's method set
        assert_eq!(interception(&t, with_is), None);
    }

    #[test]
    fn follows_unwrap_chains() {
        let mut t = TypeTable::new();
        let error = error_type(&mut t);
        let boolean = t.basic(BasicKind::Bool);
        let is_sig = sig(&mut t, vec![error], vec![boolean]);
        let leaf = named_struct(&mut t, "leaf");
        t.add_method(leaf, Method { name: "Is".into(), sig: is_sig, pointer_recv: false });
        let middle = named_struct(&mut t, "middle");
        let to_leaf = sig(&mut t, vec![], vec![leaf]);
        t.add_method(middle, Method { name: "Unwrap".into(), sig: to_leaf, pointer_recv: false });
        let outer = named_struct(&mut t, "outer");
        let middles = t.slice(middle);
        let to_middles = sig(&mut t, vec![], vec![middles]);
        t.add_method(outer, Method { name: "Unwrap".into(), sig: to_middles, pointer_recv: false });

        assert_eq!(interception(&t, outer), Some(Interception { method: InterceptKind::Is, owner: leaf }));

        // an unwrap chain ending in concrete types without Is does not intercept
        let bare = named_struct(&mut t, "bare");
        let wraps_bare = named_struct(&mut t, "wrapsBare");
        let to_bare = sig(&mut t, vec![], vec![bare]);
        t.add_method(wraps_bare, Method { name: "Unwrap".into(), sig: to_bare, pointer_recv: false });
        assert_eq!(interception(&t, wraps_bare), None);
    }

    #[test]
    fn unwrap_to_an_interface_may_intercept() {
        let mut t = TypeTable::new();
        let error = error_type(&mut t);
        let single = named_struct(&mut t, "single");
        let to_error = sig(&mut t, vec![], vec![error]);
        t.add_method(single, Method { name: "Unwrap".into(), sig: to_error, pointer_recv: false });
        let multi = named_struct(&mut t, "multi");
        let errors = t.slice(error);
        let to_errors = sig(&mut t, vec![], vec![errors]);
        t.add_method(multi, Method { name: "Unwrap".into(), sig: to_errors, pointer_recv: false });

        let ptr = t.pointer(single);
        assert_eq!(interception(&t, ptr), Some(Interception { method: InterceptKind::Unwrap, owner: single }));
        let ptr = t.pointer(multi);
        assert_eq!(interception(&t, ptr), Some(Interception { method: InterceptKind::Unwrap, owner: multi }));

        // one step removed: the owner is the type declaring the accessor
        let outer = named_struct(&mut t, "outer");
        let to_single = sig(&mut t, vec![], vec![single]);
        t.add_method(outer, Method { name: "Unwrap".into(), sig: to_single, pointer_recv: false });
        assert_eq!(interception(&t, outer), Some(Interception { method: InterceptKind::Unwrap, owner: single }));

        // the error interface itself has no accessor
        assert_eq!(interception(&t, error), None);
    }

    #[test]
    fn cycles_and_deep_chains_may_intercept() {
        let mut t = TypeTable::new();
        let looping = named_struct(&mut t, "looping");
        let to_self = sig(&mut t, vec![], vec![looping]);
        t.add_method(looping, Method { name: "Unwrap".into(), sig: to_self, pointer_recv: false });
        assert_eq!(interception(&t, looping), Some(Interception { method: InterceptKind::Unwrap, owner: looping }));

        let mut chain = Vec::new();
        for i in 0..MAX_UNWRAP_DEPTH + 2 {
            chain.push(named_struct(&mut t, &format!("e{}", i)));
        }
        for pair in chain.windows(2) {
            let s = sig(&mut t, vec![], vec![pair[1]]);
            t.add_method(pair[0], Method { name: "Unwrap".into(), sig: s, pointer_recv: false });
        }
        let got = interception(&t, chain[0]).map(|i| i.method);
        assert_eq!(got, Some(InterceptKind::Unwrap));
    }

    #[test]
    fn type_parameters_never_intercept() {
        let mut t = TypeTable::new();
        let error = error_type(&mut t);
        let boolean = t.basic(BasicKind::Bool);
        let is_sig = sig(&mut t, vec![error], vec![boolean]);
        let constraint = t.intern(TypeKind::Interface(Interface { methods: vec![("Is".into(), is_sig)], embeddeds: vec![] }));
        let tp = t.new_type_param("T", 0);
        t.set_constraint(tp, constraint);
        assert_eq!(interception(&t, tp), None);
        let ptr = t.pointer(tp);
        assert_eq!(interception(&t, ptr), None);
    }
}
