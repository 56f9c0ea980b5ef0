use std::fmt;

use crate::value::ValueId;

use super::{
    instr_kind::{InstrKind, Opcode},
    operand::{Operand, OperandKind},
};

// Position of an instruction in its module's program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub usize);

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    kind: InstrKind,
    operands: Vec<Operand>,
    // Assigned by the module on append
    result: Option<ValueId>,
}

impl Instruction {
    pub fn new(kind: InstrKind, operands: Vec<Operand>) -> Self {
        Self {
            kind,
            operands,
            result: None,
        }
    }

    pub fn kind(&self) -> &InstrKind {
        &self.kind
    }

    pub fn opcode(&self) -> Opcode {
        self.kind.opcode()
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn operand(&self, idx: usize) -> Option<&Operand> {
        self.operands.get(idx)
    }

    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    // Operand 0 is the destination by convention
    pub fn dest(&self) -> Option<ValueId> {
        self.operands
            .first()
            .filter(|op| op.kind == OperandKind::Out)
            .map(|op| op.value)
    }

    pub fn result(&self) -> Option<ValueId> {
        self.result
    }

    pub(crate) fn set_result(&mut self, value: ValueId) {
        self.result = Some(value);
    }

    pub fn extra_desc(&self) -> String {
        self.kind.extra_desc()
    }

    // Values this instruction reads, in operand order
    pub fn inputs(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.operands
            .iter()
            .filter(|op| op.kind.reads())
            .map(|op| op.value)
    }
}
