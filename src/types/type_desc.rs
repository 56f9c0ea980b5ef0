use std::fmt;

use super::elem_kind::ElemKind;

// Handle into a module's type cache. Two handles from the same module are
// equal exactly when the types they name are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    elem_kind: ElemKind,
    dims: Vec<usize>,
}

impl Type {
    pub fn new(elem_kind: ElemKind, dims: &[usize]) -> Self {
        Self {
            elem_kind,
            dims: dims.to_vec(),
        }
    }

    pub fn elem_kind(&self) -> ElemKind {
        self.elem_kind
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    // The empty dim list is a scalar and holds one element.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.num_elements() * self.elem_kind.size_in_bytes()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" x ");
        write!(f, "{}<{}>", self.elem_kind, dims)
    }
}
