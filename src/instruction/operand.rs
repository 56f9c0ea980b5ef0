use std::fmt;

use crate::value::ValueId;

// Access role of an operand. InOut marks caches an instruction both reads and
// updates, such as the pool index cache or batch-norm running statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    In,
    Out,
    InOut,
}

impl OperandKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperandKind::In => "in",
            OperandKind::Out => "out",
            OperandKind::InOut => "inout",
        }
    }

    pub fn writes(&self) -> bool {
        matches!(self, OperandKind::Out | OperandKind::InOut)
    }

    pub fn reads(&self) -> bool {
        matches!(self, OperandKind::In | OperandKind::InOut)
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    pub value: ValueId,
    pub kind: OperandKind,
}

impl Operand {
    pub fn new(value: ValueId, kind: OperandKind) -> Self {
        Self { value, kind }
    }

    pub fn input(value: ValueId) -> Self {
        Self::new(value, OperandKind::In)
    }

    pub fn output(value: ValueId) -> Self {
        Self::new(value, OperandKind::Out)
    }

    pub fn in_out(value: ValueId) -> Self {
        Self::new(value, OperandKind::InOut)
    }
}
