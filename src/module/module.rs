use crate::{
    error::{IrError, Result},
    instruction::{InstrId, Instruction},
    types::{ElemKind, Type, TypeCache, TypeRef},
    value::{StaticVariable, Value, ValueId},
};

// One compiled unit: the program (instructions in execution order), the
// values it reads and writes, and the types they use. Everything lives and
// dies with the module.
#[derive(Debug, Default)]
pub struct Module {
    instrs: Vec<Instruction>,
    values: Vec<Value>,
    types: TypeCache,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique_type(&mut self, elem_kind: ElemKind, dims: &[usize]) -> TypeRef {
        self.types.unique_type(elem_kind, dims)
    }

    pub fn get_type(&self, type_ref: TypeRef) -> Option<&Type> {
        self.types.get(type_ref)
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.0)
    }

    pub fn value_type(&self, id: ValueId) -> Option<&Type> {
        self.value(id).and_then(|v| self.types.get(v.get_type()))
    }

    pub fn dims(&self, id: ValueId) -> Option<&[usize]> {
        self.value_type(id).map(|t| t.dims())
    }

    pub fn elem_kind(&self, id: ValueId) -> Option<ElemKind> {
        self.value_type(id).map(|t| t.elem_kind())
    }

    pub fn instrs(&self) -> &[Instruction] {
        &self.instrs
    }

    pub fn instr(&self, id: InstrId) -> Option<&Instruction> {
        self.instrs.get(id.0)
    }

    // Destination value of an instruction, the usual input to the next op
    pub fn dest_of(&self, id: InstrId) -> Result<ValueId> {
        self.instr(id)
            .and_then(|instr| instr.dest())
            .ok_or(IrError::UnknownInstruction(id))
    }

    pub fn find_value(&self, name: &str) -> Option<ValueId> {
        self.values
            .iter()
            .find(|v| v.name() == Some(name))
            .map(|v| v.id)
    }

    pub fn static_variables(&self) -> impl Iterator<Item = (&Value, &StaticVariable)> + '_ {
        self.values
            .iter()
            .filter_map(|v| v.as_static().map(|var| (v, var)))
    }

    // Learnable parameters, in declaration order
    pub fn weights(&self) -> impl Iterator<Item = &Value> + '_ {
        self.static_variables()
            .filter(|(_, var)| var.is_weight())
            .map(|(v, _)| v)
    }

    pub fn parameter_count(&self) -> usize {
        self.weights()
            .filter_map(|v| self.types.get(v.get_type()))
            .map(|t| t.num_elements())
            .sum()
    }

    pub(crate) fn push_var(&mut self, ty: TypeRef, var: StaticVariable, name: &str) -> Result<ValueId> {
        if self.types.get(ty).is_none() {
            return Err(IrError::UnknownType(ty));
        }
        Ok(self.declare_var(ty, var, name))
    }

    // `ty` must come from this module's cache
    pub(crate) fn declare_var(&mut self, ty: TypeRef, var: StaticVariable, name: &str) -> ValueId {
        let id = ValueId(self.values.len());
        let mut value = Value::new_static(id, ty, var);
        value.set_name(name);
        log::trace!("declare {} {:?}", value.label(), var);
        self.values.push(value);
        id
    }

    pub(crate) fn check_operands(&self, instr: &Instruction) -> Result<()> {
        match instr
            .operands()
            .iter()
            .find(|op| self.value(op.value).is_none())
        {
            Some(missing) => Err(IrError::UnknownValue(missing.value)),
            None => Ok(()),
        }
    }

    // Appends in program order and creates the instruction's result value.
    // Every operand must already exist in this module.
    pub(crate) fn push_instr(&mut self, mut instr: Instruction) -> Result<InstrId> {
        self.check_operands(&instr)?;

        let dest_type = match instr.dest().and_then(|dest| self.value(dest)) {
            Some(dest) => dest.get_type(),
            // Malformed instructions are left for the verifier to report
            None => self.types.unique_type(ElemKind::Float32, &[]),
        };

        let id = InstrId(self.instrs.len());
        let result = ValueId(self.values.len());
        self.values.push(Value::new_result(result, dest_type, id));
        instr.set_result(result);

        log::trace!("append {} {} {}", id, instr.opcode(), instr.extra_desc());
        self.instrs.push(instr);
        Ok(id)
    }
}
