pub mod static_variable;
#[allow(clippy::module_inception)]
pub mod value;
pub mod weight_init;

pub use static_variable::{InitKind, ShareKind, StaticVariable};
pub use value::{Value, ValueId, ValueKind};
pub use weight_init::initial_values;
