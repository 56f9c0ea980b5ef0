pub mod elem_kind;
pub mod type_cache;
pub mod type_desc;

pub use elem_kind::ElemKind;
pub use type_cache::TypeCache;
pub use type_desc::{Type, TypeRef};
