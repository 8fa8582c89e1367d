//! Zero-size classification of types.

use crate::compiler::types::{TypeId, TypeKind, TypeTable};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Zero,
    NonZero,
    /// Depends on an unresolved type parameter
    Unknown,
}

impl SizeClass {
    /// Combine the fields of an aggregate: any non-zero field makes it
    /// non-zero, otherwise any unknown field makes it unknown.
    fn and(self, other: SizeClass) -> SizeClass {
        match (self, other) {
            (SizeClass::NonZero, _) | (_, SizeClass::NonZero) => SizeClass::NonZero,
            (SizeClass::Unknown, _) | (_, SizeClass::Unknown) => SizeClass::Unknown,
            _ => SizeClass::Zero,
        }
    }
}

pub fn size_class(types: &TypeTable, ty: TypeId) -> SizeClass {
    classify(types, ty, &mut HashSet::new())
}

fn classify(types: &TypeTable, ty: TypeId, visiting: &mut HashSet<TypeId>) -> SizeClass {
    if !visiting.insert(ty) {
        // only an invalid recursive type gets here
        return SizeClass::Unknown;
    }
    let class = match types.kind(ty) {
        TypeKind::Invalid | TypeKind::TypeParam(_) => SizeClass::Unknown,
        TypeKind::Named(n) => classify(types, n.underlying, visiting),
        TypeKind::Struct(fields) => fields
            .iter()
            .fold(SizeClass::Zero, |acc, f| acc.and(classify(types, f.ty, visiting))),
        TypeKind::Tuple(elems) => elems
            .iter()
            .fold(SizeClass::Zero, |acc, e| acc.and(classify(types, *e, visiting))),
        TypeKind::Array(Some(0), _) => SizeClass::Zero,
        TypeKind::Array(len, elem) => match (classify(types, *elem, visiting), len) {
            (SizeClass::Zero, _) => SizeClass::Zero,
            (SizeClass::Unknown, _) => SizeClass::Unknown,
            (SizeClass::NonZero, Some(_)) => SizeClass::NonZero,
            // length is not a constant we could evaluate
            (SizeClass::NonZero, None) => SizeClass::Unknown,
        },
        TypeKind::Basic(_)
        | TypeKind::Pointer(_)
        | TypeKind::Slice(_)
        | TypeKind::Map(..)
        | TypeKind::Chan(_)
        | TypeKind::Signature(_)
        | TypeKind::Interface(_) => SizeClass::NonZero,
    };
    visiting.remove(&ty);
    class
}
