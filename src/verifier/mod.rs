#[allow(clippy::module_inception)]
pub mod verifier;

pub use verifier::{
    check_single_writer, verify_instruction, verify_instruction_with, verify_module,
};
