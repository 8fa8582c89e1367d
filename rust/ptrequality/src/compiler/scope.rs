//! Objects and lexical scopes.
//!
//! Every declared name (package, type, variable, constant, function, builtin)
//! becomes an [`Object`] in a per-load arena. Scopes map names to object ids;
//! the checker keeps a stack of them for block scoping.

use crate::compiler::tokens::Span;
use crate::compiler::types::TypeId;
use std::collections::HashMap;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32);

/// Predeclared functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjKind {
    /// Import name; holds the imported path
    PkgName(String),
    TypeName,
    Var,
    Const,
    Func,
    Builtin(Builtin),
    Nil,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub ty: TypeId,
    /// Path of the declaring package; `None` for the universe
    pub pkg: Option<String>,
    /// Declared inside a function (parameters included)
    pub local: bool,
    pub span: Span,
}

impl Object {
    pub fn is_package_level(&self) -> bool {
        self.pkg.is_some() && !self.local
    }
}

#[derive(Debug, Default)]
pub struct Objects {
    objs: Vec<Object>,
}

impl Objects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, obj: Object) -> ObjId {
        let id = ObjId(self.objs.len() as u32);
        self.objs.push(obj);
        id
    }

    pub fn get(&self, id: ObjId) -> Option<&Object> {
        self.objs.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.objs.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

/// One level of name bindings.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    names: HashMap<String, ObjId>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`; the blank identifier is never bound. Returns the
    /// previous binding in this scope, if any.
    pub fn insert(&mut self, name: &str, id: ObjId) -> Option<ObjId> {
        if name == "_" {
            return None;
        }
        self.names.insert(name.to_string(), id)
    }

    pub fn get(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjId)> {
        self.names.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn builtin_names_round_trip() {
        for b in Builtin::iter() {
            assert_eq!(Builtin::from_str(b.name()).ok(), Some(b));
        }
        assert_eq!(Builtin::New.name(), "new");
        assert!(Builtin::from_str("make_slice").is_err());
    }

    #[test]
    fn blank_is_never_bound() {
        let mut scope = Scope::new();
        assert_eq!(scope.insert("_", ObjId(1)), None);
        assert!(!scope.contains("_"));
        assert_eq!(scope.insert("x", ObjId(2)), None);
        assert_eq!(scope.insert("x", ObjId(3)), Some(ObjId(2)));
        assert_eq!(scope.get("x"), Some(ObjId(3)));
    }

    #[test]
    fn package_level_objects() {
        let mut objs = Objects::new();
        let id = objs.alloc(Object {
            name: "Is".into(),
            kind: ObjKind::Func,
            ty: TypeId(0),
            pkg: Some("errors".into()),
            local: false,
            span: Span::dummy(),
        });
        assert!(objs.get(id).map(|o| o.is_package_level()).unwrap_or(false));
        assert_eq!(objs.len(), 1);
    }
}
