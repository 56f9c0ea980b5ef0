use std::collections::HashMap;

use crate::{
    builder::shape::{
        calculate_output_dims, channel_count, check_reshape, concat_dims, flatten_cdr,
        transpose_dims, ShapeNHWC,
    },
    error::{IrError, ShapeError, VerifyError},
    instruction::{InstrId, InstrKind, Instruction, Operand, OperandKind, PoolKind},
    module::Module,
    types::TypeRef,
    value::ValueId,
};

// Checks every instruction in program order plus the module-wide rules:
// each value has at most one writing instruction and every instruction owns
// a result value of its destination's type. Stops at the first violation.
pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    let mut writers: HashMap<ValueId, InstrId> = HashMap::new();

    for (idx, instr) in module.instrs().iter().enumerate() {
        let id = InstrId(idx);
        verify_instruction_with(module, id, instr)?;
        check_result(module, id, instr)?;

        for op in outputs(instr) {
            if let Some(previous) = writers.insert(op.value, id) {
                return Err(second_writer(id, instr, op.value, previous));
            }
        }
    }

    Ok(())
}

// Rejects `instr` if one of its `Out` operands is already written by an
// instruction of `module`. Used before appending, where `verify_module`
// would otherwise report the new instruction as a second writer.
pub fn check_single_writer(
    module: &Module,
    id: InstrId,
    instr: &Instruction,
) -> Result<(), VerifyError> {
    for op in outputs(instr) {
        let previous = module
            .instrs()
            .iter()
            .position(|other| outputs(other).any(|out| out.value == op.value));
        if let Some(previous) = previous {
            return Err(second_writer(id, instr, op.value, InstrId(previous)));
        }
    }
    Ok(())
}

fn outputs(instr: &Instruction) -> impl Iterator<Item = &Operand> + '_ {
    instr
        .operands()
        .iter()
        .filter(|op| op.kind == OperandKind::Out)
}

fn second_writer(id: InstrId, instr: &Instruction, value: ValueId, previous: InstrId) -> VerifyError {
    VerifyError::new(
        id,
        instr.opcode(),
        format!("{} is already written by instruction {}", value, previous),
    )
}

pub fn verify_instruction(module: &Module, id: InstrId) -> Result<(), IrError> {
    let instr = module.instr(id).ok_or(IrError::UnknownInstruction(id))?;
    verify_instruction_with(module, id, instr)?;
    Ok(())
}

// Verifies `instr` against the values of `module` without requiring it to be
// appended; `id` is only used for reporting.
pub fn verify_instruction_with(
    module: &Module,
    id: InstrId,
    instr: &Instruction,
) -> Result<(), VerifyError> {
    let check = Checker { module, id, instr };
    check.layout()?;

    match instr.kind() {
        InstrKind::Copy
        | InstrKind::Relu
        | InstrKind::Sigmoid
        | InstrKind::Tanh
        | InstrKind::SoftMax
        | InstrKind::Regression => check.same_type(0, 1),

        InstrKind::Convolution {
            kernel,
            stride,
            pad,
            depth,
        } => {
            let idim = check.shape(ShapeNHWC::from_dims("convolution", check.dims(1)?))?;
            let (out_h, out_w) = check.shape(calculate_output_dims(
                "convolution",
                idim.h,
                idim.w,
                *pad,
                *kernel,
                *stride,
            ))?;
            check.expect_dims(0, &[idim.n, out_h, out_w, *depth], "output")?;
            check.expect_dims(2, &[*depth, *kernel, *kernel, idim.c], "filter")?;
            check.expect_dims(3, &[*depth], "bias")
        }

        InstrKind::Pool {
            kind,
            kernel,
            stride,
            pad,
        } => {
            let idim = check.shape(ShapeNHWC::from_dims("pool", check.dims(1)?))?;
            let (out_h, out_w) = check.shape(calculate_output_dims(
                "pool", idim.h, idim.w, *pad, *kernel, *stride,
            ))?;
            check.expect_dims(0, &[idim.n, out_h, out_w, idim.c], "output")?;
            match kind {
                PoolKind::Max => {
                    check.expect_dims(2, &[idim.n, out_h, out_w, idim.c, 2], "srcXY")
                }
                PoolKind::Avg => check.expect_dims(2, &[], "srcXY"),
            }
        }

        InstrKind::FullyConnected { depth } => {
            let (batch, inner) = check.shape(flatten_cdr("fullyconnected", check.dims(1)?))?;
            check.expect_dims(0, &[batch, *depth], "output")?;
            check.expect_dims(2, &[*depth, inner], "weights")?;
            check.expect_dims(3, &[*depth], "bias")
        }

        InstrKind::Reshape { .. } => check.shape(check_reshape(check.dims(1)?, check.dims(0)?)),

        InstrKind::Transpose { shuffle } => {
            let expected = check.shape(transpose_dims(check.dims(1)?, shuffle))?;
            check.expect_dims(0, &expected, "output")
        }

        InstrKind::Concat { axis } => {
            let inputs = (1..instr.num_operands())
                .map(|idx| check.dims(idx))
                .collect::<Result<Vec<_>, _>>()?;
            let expected = check.shape(concat_dims(&inputs, *axis))?;
            check.expect_dims(0, &expected, "output")
        }

        InstrKind::BatchNormalization { channel_idx, .. } => {
            check.same_type(0, 1)?;
            let channels = check.shape(channel_count(check.dims(1)?, *channel_idx))?;
            check.expect_dims(2, &[channels], "scale")?;
            check.expect_dims(3, &[channels], "bias")?;
            check.expect_dims(4, &[channels], "mean")?;
            check.expect_dims(5, &[channels], "variance")
        }

        InstrKind::Arithmetic { .. } => {
            check.same_type(0, 1)?;
            check.same_type(0, 2)
        }
    }
}

fn check_result(module: &Module, id: InstrId, instr: &Instruction) -> Result<(), VerifyError> {
    let fail = |message: String| VerifyError::new(id, instr.opcode(), message);

    let result = instr
        .result()
        .ok_or_else(|| fail("instruction has no result value".to_string()))?;
    let value = module
        .value(result)
        .ok_or_else(|| fail(format!("result {} does not exist", result)))?;
    if value.producer() != Some(id) {
        return Err(fail(format!("result {} is not produced by this instruction", result)));
    }

    let dest_type = instr
        .dest()
        .and_then(|dest| module.value(dest))
        .map(|dest| dest.get_type());
    if dest_type != Some(value.get_type()) {
        return Err(fail(format!(
            "result {} does not have the destination's type",
            result
        )));
    }
    Ok(())
}

struct Checker<'a> {
    module: &'a Module,
    id: InstrId,
    instr: &'a Instruction,
}

impl<'a> Checker<'a> {
    fn fail(&self, message: impl Into<String>) -> VerifyError {
        VerifyError::new(self.id, self.instr.opcode(), message)
    }

    fn shape<T>(&self, result: Result<T, ShapeError>) -> Result<T, VerifyError> {
        result.map_err(|err| self.fail(err.to_string()))
    }

    // Operand count and roles match the opcode's layout
    fn layout(&self) -> Result<(), VerifyError> {
        let kinds = self
            .instr
            .operands()
            .iter()
            .map(|op| op.kind)
            .collect::<Vec<_>>();

        let valid = match self.instr.kind().operand_layout() {
            Some(layout) => kinds == layout,
            None => {
                kinds.len() > 1
                    && kinds[0] == OperandKind::Out
                    && kinds[1..].iter().all(|k| *k == OperandKind::In)
            }
        };

        if !valid {
            return Err(self.fail(format!("invalid operand layout {:?}", kinds)));
        }
        Ok(())
    }

    fn value_at(&self, idx: usize) -> Result<ValueId, VerifyError> {
        self.instr
            .operand(idx)
            .map(|op| op.value)
            .ok_or_else(|| self.fail(format!("missing operand {}", idx)))
    }

    fn type_ref(&self, idx: usize) -> Result<TypeRef, VerifyError> {
        let value = self.value_at(idx)?;
        self.module
            .value(value)
            .map(|v| v.get_type())
            .ok_or_else(|| self.fail(format!("operand {} refers to missing value {}", idx, value)))
    }

    fn dims(&self, idx: usize) -> Result<&'a [usize], VerifyError> {
        let value = self.value_at(idx)?;
        self.module
            .dims(value)
            .ok_or_else(|| self.fail(format!("operand {} refers to missing value {}", idx, value)))
    }

    // Types are uniqued, so handle equality is type equality
    fn same_type(&self, a: usize, b: usize) -> Result<(), VerifyError> {
        if self.type_ref(a)? != self.type_ref(b)? {
            return Err(self.fail(format!(
                "operand {} and operand {} have different types",
                a, b
            )));
        }
        Ok(())
    }

    fn expect_dims(&self, idx: usize, expected: &[usize], label: &str) -> Result<(), VerifyError> {
        let actual = self.dims(idx)?;
        if actual != expected {
            return Err(self.fail(format!(
                "invalid {} dims {:?}, expected {:?}",
                label, actual, expected
            )));
        }
        Ok(())
    }
}
