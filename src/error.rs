use thiserror::Error;

use crate::{
    instruction::{InstrId, Opcode},
    types::TypeRef,
    value::ValueId,
};

pub type Result<T> = std::result::Result<T, IrError>;

// Malformed operator requests, reported before anything is allocated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("{op} expects a rank {expected} input, got dims {actual:?}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        actual: Vec<usize>,
    },

    #[error("{op} input must have at least one dimension")]
    ScalarInput { op: &'static str },

    #[error("{op} kernel {kernel} is larger than the {height}x{width} input")]
    KernelTooLarge {
        op: &'static str,
        kernel: usize,
        height: usize,
        width: usize,
    },

    #[error("{op} stride must be non-zero")]
    ZeroStride { op: &'static str },

    #[error("{op} kernel must be non-zero")]
    ZeroKernel { op: &'static str },

    #[error("{op} shape does not fit in usize")]
    Overflow { op: &'static str },

    #[error("{op} operands differ: {lhs} vs {rhs}")]
    OperandMismatch {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("concat needs at least one input")]
    EmptyConcat,

    #[error("concat input {index} has dims {actual:?}, expected {expected:?}")]
    ConcatInputMismatch {
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{op} axis {axis} out of range for rank {rank}")]
    AxisOutOfRange {
        op: &'static str,
        axis: usize,
        rank: usize,
    },

    #[error("{shuffle:?} is not a permutation of {rank} axes")]
    InvalidPermutation { shuffle: Vec<usize>, rank: usize },

    #[error("cannot reshape {from:?} ({from_size} elements) into {to:?} ({to_size} elements)")]
    ReshapeSizeMismatch {
        from: Vec<usize>,
        from_size: usize,
        to: Vec<usize>,
        to_size: usize,
    },
}

// An instruction that breaks its own invariant. Not expected from code that
// goes through the operator-level builder methods.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("instruction {instr} ({opcode}): {message}")]
pub struct VerifyError {
    pub instr: InstrId,
    pub opcode: Opcode,
    pub message: String,
}

impl VerifyError {
    pub fn new(instr: InstrId, opcode: Opcode, message: impl Into<String>) -> Self {
        Self {
            instr,
            opcode,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("value {0} does not exist in this module")]
    UnknownValue(ValueId),

    #[error("type {0:?} does not exist in this module")]
    UnknownType(TypeRef),

    #[error("instruction {0} does not exist in this module")]
    UnknownInstruction(InstrId),

    #[error("invalid builder config: {0}")]
    InvalidConfig(String),

    #[error("cannot initialize value: {0}")]
    InvalidInitialization(String),
}
