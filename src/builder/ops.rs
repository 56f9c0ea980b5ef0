use crate::{
    error::{IrError, Result, ShapeError},
    instruction::{ArithmeticKind, InstrId, PoolKind},
    types::{ElemKind, TypeRef},
    value::{InitKind, ShareKind, ValueId},
};

use super::{
    builder::IRBuilder,
    shape::{
        calculate_output_dims, channel_count, check_reshape, concat_dims, flatten_cdr,
        transpose_dims, ShapeNHWC,
    },
};

// Operator-level entry points. Each one computes every shape it needs before
// allocating anything, so a rejected request leaves the module untouched.
impl<'m> IRBuilder<'m> {
    pub fn create_conv_op(
        &mut self,
        input: ValueId,
        depth: usize,
        kernel: usize,
        stride: usize,
        pad: usize,
    ) -> Result<InstrId> {
        let idim = ShapeNHWC::from_dims("convolution", &self.dims_of(input)?)?;
        let (out_h, out_w) = calculate_output_dims("convolution", idim.h, idim.w, pad, kernel, stride)?;

        let out_dims = [idim.n, out_h, out_w, depth];
        let filter_dims = [depth, kernel, kernel, idim.c];
        let fan_in = kernel * kernel * idim.c;
        log::debug!(
            "convolution {:?} -> {:?}, filter {:?}, fan-in {}",
            idim,
            out_dims,
            filter_dims,
            fan_in
        );

        // Allocate the filter and bias tensors
        let filter = self.create_static_variable(
            ElemKind::Float32,
            &filter_dims,
            "filter",
            InitKind::Xavier,
            ShareKind::Weight,
            fan_in as f32,
        );
        let bias = self.create_static_variable(
            ElemKind::Float32,
            &[depth],
            "bias",
            InitKind::Broadcast,
            ShareKind::Weight,
            self.config.bias_fill,
        );

        let dest = self.create_variable(ElemKind::Float32, &out_dims);
        self.create_convolution_inst(dest, input, filter, bias, kernel, stride, pad, depth)
    }

    pub fn create_pool_op(
        &mut self,
        input: ValueId,
        kind: PoolKind,
        kernel: usize,
        stride: usize,
        pad: usize,
    ) -> Result<InstrId> {
        let idim = ShapeNHWC::from_dims("pool", &self.dims_of(input)?)?;
        let (out_h, out_w) = calculate_output_dims("pool", idim.h, idim.w, pad, kernel, stride)?;
        log::debug!("{} pool {:?} -> {}x{}", kind.name(), idim, out_h, out_w);

        // Max pooling remembers the x and y coordinates of the selected
        // element for every output so gradients can be routed back
        let src_xy = match kind {
            PoolKind::Max => self.create_named_variable(
                ElemKind::Index,
                &[idim.n, out_h, out_w, idim.c, 2],
                "srcXY",
            ),
            PoolKind::Avg => self.create_named_variable(ElemKind::Index, &[], "srcXY"),
        };

        let dest = self.create_variable(ElemKind::Float32, &[idim.n, out_h, out_w, idim.c]);
        self.create_pool_inst(dest, input, src_xy, kind, kernel, stride, pad)
    }

    pub fn create_fully_connected_op(&mut self, input: ValueId, depth: usize) -> Result<InstrId> {
        let elem_kind = self.elem_kind_of(input)?;
        let (batch, inner) = flatten_cdr("fullyconnected", &self.dims_of(input)?)?;
        log::debug!("fullyconnected ({}, {}) -> ({}, {})", batch, inner, batch, depth);

        let weights = self.create_static_variable(
            elem_kind,
            &[depth, inner],
            "weights",
            InitKind::Xavier,
            ShareKind::Weight,
            inner as f32,
        );
        let bias = self.create_static_variable(
            elem_kind,
            &[depth],
            "bias",
            InitKind::Broadcast,
            ShareKind::Weight,
            self.config.bias_fill,
        );

        let dest = self.create_variable(elem_kind, &[batch, depth]);
        self.create_fully_connected_inst(dest, input, weights, bias, depth)
    }

    pub fn create_relu_op(&mut self, input: ValueId) -> Result<InstrId> {
        let dest = self.like(input, "")?;
        self.create_relu_inst(dest, input)
    }

    pub fn create_sigmoid_op(&mut self, input: ValueId) -> Result<InstrId> {
        let dest = self.like(input, "")?;
        self.create_sigmoid_inst(dest, input)
    }

    pub fn create_tanh_op(&mut self, input: ValueId) -> Result<InstrId> {
        let dest = self.like(input, "")?;
        self.create_tanh_inst(dest, input)
    }

    pub fn create_softmax_op(&mut self, input: ValueId, selected: ValueId) -> Result<InstrId> {
        self.type_of(selected)?;
        let dest = self.like(input, "")?;
        let expected = self.like(input, "expected")?;
        self.create_softmax_inst(dest, input, expected, selected)
    }

    pub fn create_regression_op(&mut self, input: ValueId, expected: ValueId) -> Result<InstrId> {
        self.type_of(expected)?;
        let dest = self.like(input, "")?;
        self.create_regression_inst(dest, input, expected)
    }

    pub fn create_reshape_op(&mut self, input: ValueId, shape: &[usize]) -> Result<InstrId> {
        let elem_kind = self.elem_kind_of(input)?;
        check_reshape(&self.dims_of(input)?, shape)?;

        let dest = self.create_variable(elem_kind, shape);
        self.create_reshape_inst(dest, input, shape)
    }

    pub fn create_transpose_op(&mut self, input: ValueId, shuffle: &[usize]) -> Result<InstrId> {
        let elem_kind = self.elem_kind_of(input)?;
        let shape = transpose_dims(&self.dims_of(input)?, shuffle)?;

        let dest = self.create_variable(elem_kind, &shape);
        self.create_transpose_inst(dest, input, shuffle)
    }

    pub fn create_concat_op(&mut self, inputs: &[ValueId], axis: usize) -> Result<InstrId> {
        let first = *inputs.first().ok_or(ShapeError::EmptyConcat)?;
        let elem_kind = self.elem_kind_of(first)?;

        let input_dims = inputs
            .iter()
            .map(|input| self.dims_of(*input))
            .collect::<Result<Vec<_>>>()?;
        let dim_refs = input_dims.iter().map(|d| d.as_slice()).collect::<Vec<_>>();

        // Stacking along `axis` grows the tensor along that dimension only
        let shape = concat_dims(&dim_refs, axis)?;
        log::debug!("concat {} inputs along {} -> {:?}", inputs.len(), axis, shape);

        let dest = self.create_variable(elem_kind, &shape);
        self.create_concat_inst(dest, inputs, axis)
    }

    pub fn create_batch_normalization_op(
        &mut self,
        input: ValueId,
        channel_idx: usize,
        epsilon: f32,
        momentum: f32,
    ) -> Result<InstrId> {
        let channels = channel_count(&self.dims_of(input)?, channel_idx)?;
        log::debug!("batchnormalization over {} channels at axis {}", channels, channel_idx);

        // Learnable shift and scale
        let beta = self.create_static_variable(
            ElemKind::Float32,
            &[channels],
            "beta",
            InitKind::Broadcast,
            ShareKind::Weight,
            self.config.beta_fill,
        );
        let gamma = self.create_static_variable(
            ElemKind::Float32,
            &[channels],
            "gamma",
            InitKind::Broadcast,
            ShareKind::Weight,
            self.config.gamma_fill,
        );

        // Running statistics, populated by whoever executes the program
        let mean = self.create_named_variable(ElemKind::Float32, &[channels], "mean");
        let variance = self.create_named_variable(ElemKind::Float32, &[channels], "variance");

        let dest = self.like(input, "")?;
        self.create_batch_normalization_inst(
            dest,
            input,
            gamma,
            beta,
            mean,
            variance,
            channel_idx,
            epsilon,
            momentum,
        )
    }

    pub fn create_arithmetic_op(
        &mut self,
        lhs: ValueId,
        rhs: ValueId,
        kind: ArithmeticKind,
    ) -> Result<InstrId> {
        let lhs_type = self.type_of(lhs)?;
        let rhs_type = self.type_of(rhs)?;
        if lhs_type != rhs_type {
            return Err(ShapeError::OperandMismatch {
                op: kind.name(),
                lhs: self.type_string(lhs_type),
                rhs: self.type_string(rhs_type),
            }
            .into());
        }

        let dest = self.create_variable_of_type(lhs_type, "")?;
        self.create_arithmetic_inst(dest, lhs, rhs, kind)
    }

    //===------------------------------------------------------------------===//
    //                            Helpers
    //===------------------------------------------------------------------===//

    fn type_of(&self, value: ValueId) -> Result<TypeRef> {
        self.module
            .value(value)
            .map(|v| v.get_type())
            .ok_or(IrError::UnknownValue(value))
    }

    // Owned so callers can allocate while holding the shape
    fn dims_of(&self, value: ValueId) -> Result<Vec<usize>> {
        self.module
            .dims(value)
            .map(|dims| dims.to_vec())
            .ok_or(IrError::UnknownValue(value))
    }

    fn elem_kind_of(&self, value: ValueId) -> Result<ElemKind> {
        self.module
            .elem_kind(value)
            .ok_or(IrError::UnknownValue(value))
    }

    fn type_string(&self, ty: TypeRef) -> String {
        self.module
            .get_type(ty)
            .map(|t| t.to_string())
            .unwrap_or_else(|| format!("{:?}", ty))
    }

    // New extern activation with the same type as `value`
    fn like(&mut self, value: ValueId, name: &str) -> Result<ValueId> {
        let ty = self.type_of(value)?;
        self.create_variable_of_type(ty, name)
    }
}
