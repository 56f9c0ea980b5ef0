use std::fmt;

use super::operand::OperandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Max,
    Avg,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::Max => "max",
            PoolKind::Avg => "avg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticKind {
    Add,
    Mul,
}

impl ArithmeticKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticKind::Add => "add",
            ArithmeticKind::Mul => "mul",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Copy,
    Convolution,
    Pool,
    FullyConnected,
    Relu,
    Sigmoid,
    Tanh,
    SoftMax,
    Regression,
    Reshape,
    Transpose,
    Concat,
    BatchNormalization,
    Arithmetic,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Copy => "copy",
            Opcode::Convolution => "convolution",
            Opcode::Pool => "pool",
            Opcode::FullyConnected => "fullyconnected",
            Opcode::Relu => "relu",
            Opcode::Sigmoid => "sigmoid",
            Opcode::Tanh => "tanh",
            Opcode::SoftMax => "softmax",
            Opcode::Regression => "regression",
            Opcode::Reshape => "reshape",
            Opcode::Transpose => "transpose",
            Opcode::Concat => "concat",
            Opcode::BatchNormalization => "batchnormalization",
            Opcode::Arithmetic => "arithmetic",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Opcode plus the immutable parameters of each instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    Copy,
    Convolution {
        kernel: usize,
        stride: usize,
        pad: usize,
        depth: usize,
    },
    Pool {
        kind: PoolKind,
        kernel: usize,
        stride: usize,
        pad: usize,
    },
    FullyConnected {
        depth: usize,
    },
    Relu,
    Sigmoid,
    Tanh,
    SoftMax,
    Regression,
    Reshape {
        dims: Vec<usize>,
    },
    Transpose {
        shuffle: Vec<usize>,
    },
    Concat {
        axis: usize,
    },
    BatchNormalization {
        channel_idx: usize,
        epsilon: f32,
        momentum: f32,
    },
    Arithmetic {
        kind: ArithmeticKind,
    },
}

const UNARY: &[OperandKind] = &[OperandKind::Out, OperandKind::In];
const BINARY: &[OperandKind] = &[OperandKind::Out, OperandKind::In, OperandKind::In];
const WITH_PARAMS: &[OperandKind] = &[
    OperandKind::Out,
    OperandKind::In,
    OperandKind::In,
    OperandKind::In,
];
const POOL: &[OperandKind] = &[OperandKind::Out, OperandKind::In, OperandKind::InOut];
const SOFT_MAX: &[OperandKind] = &[
    OperandKind::Out,
    OperandKind::In,
    OperandKind::InOut,
    OperandKind::In,
];
const BATCH_NORM: &[OperandKind] = &[
    OperandKind::Out,
    OperandKind::In,
    OperandKind::In,
    OperandKind::In,
    OperandKind::InOut,
    OperandKind::InOut,
];

impl InstrKind {
    pub fn opcode(&self) -> Opcode {
        match self {
            InstrKind::Copy => Opcode::Copy,
            InstrKind::Convolution { .. } => Opcode::Convolution,
            InstrKind::Pool { .. } => Opcode::Pool,
            InstrKind::FullyConnected { .. } => Opcode::FullyConnected,
            InstrKind::Relu => Opcode::Relu,
            InstrKind::Sigmoid => Opcode::Sigmoid,
            InstrKind::Tanh => Opcode::Tanh,
            InstrKind::SoftMax => Opcode::SoftMax,
            InstrKind::Regression => Opcode::Regression,
            InstrKind::Reshape { .. } => Opcode::Reshape,
            InstrKind::Transpose { .. } => Opcode::Transpose,
            InstrKind::Concat { .. } => Opcode::Concat,
            InstrKind::BatchNormalization { .. } => Opcode::BatchNormalization,
            InstrKind::Arithmetic { .. } => Opcode::Arithmetic,
        }
    }

    // Fixed operand roles, or None for concat which takes any number of
    // inputs after its destination.
    pub fn operand_layout(&self) -> Option<&'static [OperandKind]> {
        match self {
            InstrKind::Copy
            | InstrKind::Relu
            | InstrKind::Sigmoid
            | InstrKind::Tanh
            | InstrKind::Reshape { .. }
            | InstrKind::Transpose { .. } => Some(UNARY),
            InstrKind::Regression | InstrKind::Arithmetic { .. } => Some(BINARY),
            InstrKind::Convolution { .. } | InstrKind::FullyConnected { .. } => Some(WITH_PARAMS),
            InstrKind::Pool { .. } => Some(POOL),
            InstrKind::SoftMax => Some(SOFT_MAX),
            InstrKind::BatchNormalization { .. } => Some(BATCH_NORM),
            InstrKind::Concat { .. } => None,
        }
    }

    // Operator parameters as shown in dumps
    pub fn extra_desc(&self) -> String {
        match self {
            InstrKind::Convolution {
                kernel,
                stride,
                pad,
                depth,
            } => list_to_string(&[kernel, stride, pad, depth]),
            InstrKind::Pool {
                kind,
                kernel,
                stride,
                pad,
            } => format!("{} {}", kind.name(), list_to_string(&[kernel, stride, pad])),
            InstrKind::FullyConnected { depth } => list_to_string(&[depth]),
            InstrKind::Reshape { dims } => array_to_string(dims),
            InstrKind::Transpose { shuffle } => array_to_string(shuffle),
            InstrKind::Concat { axis } => format!("{{ {} }}", axis),
            InstrKind::BatchNormalization {
                channel_idx,
                epsilon,
                momentum,
            } => format!("[{} {} {}]", channel_idx, epsilon, momentum),
            InstrKind::Arithmetic { kind } => kind.name().to_string(),
            InstrKind::Copy
            | InstrKind::Relu
            | InstrKind::Sigmoid
            | InstrKind::Tanh
            | InstrKind::SoftMax
            | InstrKind::Regression => String::new(),
        }
    }
}

// "[a b c]"
fn list_to_string(items: &[&usize]) -> String {
    let joined = items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{}]", joined)
}

// "[a, b, c]"
fn array_to_string(items: &[usize]) -> String {
    let joined = items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", joined)
}
