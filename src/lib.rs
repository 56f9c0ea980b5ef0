//! Mid-level instruction IR for the vkml engine.
//!
//! A [`Module`] holds a linear program of typed, shape-checked instructions
//! and the values they read and write. Programs are built through an
//! [`IRBuilder`], which infers output shapes and allocates learnable
//! parameters, and checked with [`verify_module`].

pub mod builder;
pub mod config;
pub mod error;
pub mod instruction;
pub mod module;
pub mod types;
pub mod value;
pub mod verifier;

pub use builder::IRBuilder;
pub use config::BuilderConfig;
pub use error::{IrError, Result, ShapeError, VerifyError};
pub use instruction::{
    ArithmeticKind, InstrId, InstrKind, Instruction, Opcode, Operand, OperandKind, PoolKind,
};
pub use module::Module;
pub use types::{ElemKind, Type, TypeRef};
pub use value::{InitKind, ShareKind, StaticVariable, Value, ValueId, ValueKind};
pub use verifier::{check_single_writer, verify_instruction, verify_module};
