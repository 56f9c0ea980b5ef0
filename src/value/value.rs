use std::fmt;

use crate::{instruction::InstrId, types::TypeRef};

use super::static_variable::StaticVariable;

// Index into a module's value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub usize);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    StaticVariable(StaticVariable),
    // Defined by exactly one instruction, carries no init/share policy
    InstructionResult { instr: InstrId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: ValueId,
    ty: TypeRef,
    name: Option<String>,
    kind: ValueKind,
}

impl Value {
    pub fn new_static(id: ValueId, ty: TypeRef, var: StaticVariable) -> Self {
        Self {
            id,
            ty,
            name: None,
            kind: ValueKind::StaticVariable(var),
        }
    }

    pub fn new_result(id: ValueId, ty: TypeRef, instr: InstrId) -> Self {
        Self {
            id,
            ty,
            name: None,
            kind: ValueKind::InstructionResult { instr },
        }
    }

    pub fn get_type(&self) -> TypeRef {
        self.ty
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // Empty names are treated as no name
    pub fn set_name(&mut self, name: &str) {
        self.name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
    }

    pub fn as_static(&self) -> Option<&StaticVariable> {
        match &self.kind {
            ValueKind::StaticVariable(var) => Some(var),
            ValueKind::InstructionResult { .. } => None,
        }
    }

    pub fn producer(&self) -> Option<InstrId> {
        match &self.kind {
            ValueKind::InstructionResult { instr } => Some(*instr),
            ValueKind::StaticVariable(_) => None,
        }
    }

    // `%name` for named values, `%index` otherwise
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("%{}", name),
            None => self.id.to_string(),
        }
    }
}
