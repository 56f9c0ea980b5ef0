use std::collections::HashMap;

use super::{
    elem_kind::ElemKind,
    type_desc::{Type, TypeRef},
};

// Uniquing table for types. Entries are never removed, so a TypeRef stays
// valid for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct TypeCache {
    types: Vec<Type>,
    lookup: HashMap<Type, TypeRef>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique_type(&mut self, elem_kind: ElemKind, dims: &[usize]) -> TypeRef {
        let ty = Type::new(elem_kind, dims);
        if let Some(existing) = self.lookup.get(&ty) {
            return *existing;
        }

        let type_ref = TypeRef(self.types.len());
        log::trace!("new type #{} {}", type_ref.0, ty);
        self.types.push(ty.clone());
        self.lookup.insert(ty, type_ref);
        type_ref
    }

    pub fn get(&self, type_ref: TypeRef) -> Option<&Type> {
        self.types.get(type_ref.0)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
