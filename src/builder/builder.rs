use crate::{
    config::BuilderConfig,
    error::{IrError, Result},
    instruction::{ArithmeticKind, InstrId, InstrKind, Instruction, Operand, PoolKind},
    module::Module,
    types::{ElemKind, TypeRef},
    value::{InitKind, ShareKind, StaticVariable, ValueId},
    verifier::{check_single_writer, verify_instruction_with},
};

// Construction session over one module. The builder is the only writer for
// as long as it holds the borrow; instructions are appended in call order.
pub struct IRBuilder<'m> {
    pub(super) module: &'m mut Module,
    pub(super) config: BuilderConfig,
}

impl<'m> IRBuilder<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Self::with_config(module, BuilderConfig::default())
    }

    pub fn with_config(module: &'m mut Module, config: BuilderConfig) -> Self {
        Self { module, config }
    }

    pub fn module(&self) -> &Module {
        &*self.module
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    //===------------------------------------------------------------------===//
    //                            Values
    //===------------------------------------------------------------------===//

    pub fn create_static_variable(
        &mut self,
        elem_kind: ElemKind,
        dims: &[usize],
        name: &str,
        init_kind: InitKind,
        share_kind: ShareKind,
        val: f32,
    ) -> ValueId {
        let ty = self.module.unique_type(elem_kind, dims);
        self.module
            .declare_var(ty, StaticVariable::new(init_kind, share_kind, val), name)
    }

    pub fn create_static_variable_of_type(
        &mut self,
        ty: TypeRef,
        name: &str,
        init_kind: InitKind,
        share_kind: ShareKind,
        val: f32,
    ) -> Result<ValueId> {
        self.module
            .push_var(ty, StaticVariable::new(init_kind, share_kind, val), name)
    }

    // Unnamed extern activation buffer
    pub fn create_variable(&mut self, elem_kind: ElemKind, dims: &[usize]) -> ValueId {
        self.create_named_variable(elem_kind, dims, "")
    }

    pub fn create_named_variable(&mut self, elem_kind: ElemKind, dims: &[usize], name: &str) -> ValueId {
        self.create_static_variable(
            elem_kind,
            dims,
            name,
            InitKind::Extern,
            ShareKind::Activation,
            0.0,
        )
    }

    pub fn create_variable_of_type(&mut self, ty: TypeRef, name: &str) -> Result<ValueId> {
        self.create_static_variable_of_type(ty, name, InitKind::Extern, ShareKind::Activation, 0.0)
    }

    //===------------------------------------------------------------------===//
    //                     Low level instructions
    //===------------------------------------------------------------------===//

    pub fn create_copy_inst(&mut self, dest: ValueId, src: ValueId) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::Copy,
            vec![Operand::output(dest), Operand::input(src)],
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_convolution_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        filter: ValueId,
        bias: ValueId,
        kernel: usize,
        stride: usize,
        pad: usize,
        depth: usize,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::Convolution {
                kernel,
                stride,
                pad,
                depth,
            },
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::input(filter),
                Operand::input(bias),
            ],
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_pool_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        src_xy: ValueId,
        kind: PoolKind,
        kernel: usize,
        stride: usize,
        pad: usize,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::Pool {
                kind,
                kernel,
                stride,
                pad,
            },
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::in_out(src_xy),
            ],
        ))
    }

    pub fn create_fully_connected_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        weights: ValueId,
        bias: ValueId,
        depth: usize,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::FullyConnected { depth },
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::input(weights),
                Operand::input(bias),
            ],
        ))
    }

    pub fn create_relu_inst(&mut self, dest: ValueId, src: ValueId) -> Result<InstrId> {
        self.append(unary(InstrKind::Relu, dest, src))
    }

    pub fn create_sigmoid_inst(&mut self, dest: ValueId, src: ValueId) -> Result<InstrId> {
        self.append(unary(InstrKind::Sigmoid, dest, src))
    }

    pub fn create_tanh_inst(&mut self, dest: ValueId, src: ValueId) -> Result<InstrId> {
        self.append(unary(InstrKind::Tanh, dest, src))
    }

    // `expected` is scratch the softmax fills for the backward pass,
    // `selected` holds the index of the selected class
    pub fn create_softmax_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        expected: ValueId,
        selected: ValueId,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::SoftMax,
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::in_out(expected),
                Operand::input(selected),
            ],
        ))
    }

    pub fn create_regression_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        expected: ValueId,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::Regression,
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::input(expected),
            ],
        ))
    }

    pub fn create_reshape_inst(&mut self, dest: ValueId, src: ValueId, dims: &[usize]) -> Result<InstrId> {
        self.append(unary(
            InstrKind::Reshape {
                dims: dims.to_vec(),
            },
            dest,
            src,
        ))
    }

    pub fn create_transpose_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        shuffle: &[usize],
    ) -> Result<InstrId> {
        self.append(unary(
            InstrKind::Transpose {
                shuffle: shuffle.to_vec(),
            },
            dest,
            src,
        ))
    }

    pub fn create_concat_inst(&mut self, dest: ValueId, srcs: &[ValueId], axis: usize) -> Result<InstrId> {
        let mut operands = Vec::with_capacity(srcs.len() + 1);
        operands.push(Operand::output(dest));
        operands.extend(srcs.iter().map(|src| Operand::input(*src)));
        self.append(Instruction::new(InstrKind::Concat { axis }, operands))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_batch_normalization_inst(
        &mut self,
        dest: ValueId,
        src: ValueId,
        scale: ValueId,
        bias: ValueId,
        mean: ValueId,
        variance: ValueId,
        channel_idx: usize,
        epsilon: f32,
        momentum: f32,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::BatchNormalization {
                channel_idx,
                epsilon,
                momentum,
            },
            vec![
                Operand::output(dest),
                Operand::input(src),
                Operand::input(scale),
                Operand::input(bias),
                Operand::in_out(mean),
                Operand::in_out(variance),
            ],
        ))
    }

    pub fn create_arithmetic_inst(
        &mut self,
        dest: ValueId,
        lhs: ValueId,
        rhs: ValueId,
        kind: ArithmeticKind,
    ) -> Result<InstrId> {
        self.append(Instruction::new(
            InstrKind::Arithmetic { kind },
            vec![
                Operand::output(dest),
                Operand::input(lhs),
                Operand::input(rhs),
            ],
        ))
    }

    // Dangling handles are always rejected. With verify_on_build the new
    // instruction must also pass the verifier and must not write a value
    // another instruction already writes; a rejected instruction never
    // reaches the module.
    fn append(&mut self, instr: Instruction) -> Result<InstrId> {
        self.module.check_operands(&instr)?;

        if self.config.verify_on_build {
            let next = InstrId(self.module.instrs().len());
            let verified = verify_instruction_with(&*self.module, next, &instr)
                .and_then(|_| check_single_writer(&*self.module, next, &instr));
            if let Err(err) = verified {
                log::warn!("rejecting {}: {}", instr.opcode(), err);
                return Err(IrError::Verify(err));
            }
        }

        self.module.push_instr(instr)
    }
}

fn unary(kind: InstrKind, dest: ValueId, src: ValueId) -> Instruction {
    Instruction::new(kind, vec![Operand::output(dest), Operand::input(src)])
}
