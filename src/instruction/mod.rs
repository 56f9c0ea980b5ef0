pub mod instr_kind;
#[allow(clippy::module_inception)]
pub mod instruction;
pub mod operand;

pub use instr_kind::{ArithmeticKind, InstrKind, Opcode, PoolKind};
pub use instruction::{InstrId, Instruction};
pub use operand::{Operand, OperandKind};
