use std::fmt;

// Scalar storage kinds. Order and names are relied on by the dump and by
// backends selecting kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElemKind {
    Float32,
    Float64,
    Int8,
    Int32,
    Index,
}

impl ElemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElemKind::Float32 => "float",
            ElemKind::Float64 => "double",
            ElemKind::Int8 => "i8",
            ElemKind::Int32 => "i32",
            ElemKind::Index => "index",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            ElemKind::Float32 => std::mem::size_of::<f32>(),
            ElemKind::Float64 => std::mem::size_of::<f64>(),
            ElemKind::Int8 => std::mem::size_of::<i8>(),
            ElemKind::Int32 => std::mem::size_of::<i32>(),
            ElemKind::Index => std::mem::size_of::<u64>(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ElemKind::Float32 | ElemKind::Float64)
    }
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
