#[allow(clippy::module_inception)]
pub mod builder;
pub mod ops;
pub mod shape;

pub use builder::IRBuilder;
pub use shape::{calculate_output_dims, flatten_cdr, ShapeNHWC};
