pub mod dump;
#[allow(clippy::module_inception)]
pub mod module;

pub use module::Module;
