use vkml_ir::{
    verify_module, ArithmeticKind, BuilderConfig, ElemKind, IRBuilder, InitKind, InstrKind,
    IrError, Module, OperandKind, PoolKind, ShapeError, ShareKind, ValueId,
};

fn dims(module: &Module, value: ValueId) -> Vec<usize> {
    module.dims(value).expect("value must exist").to_vec()
}

fn operand(module: &Module, instr: vkml_ir::InstrId, idx: usize) -> ValueId {
    module
        .instr(instr)
        .and_then(|i| i.operand(idx))
        .map(|op| op.value)
        .expect("operand must exist")
}

#[test]
fn convolution_allocates_filter_bias_and_output() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_named_variable(ElemKind::Float32, &[1, 32, 32, 3], "input");
    let conv = builder
        .create_conv_op(input, 16, 5, 1, 2)
        .expect("convolution must build");

    let filter = operand(&module, conv, 2);
    let bias = operand(&module, conv, 3);
    assert_eq!(dims(&module, module.dest_of(conv).unwrap()), vec![1, 32, 32, 16]);
    assert_eq!(dims(&module, filter), vec![16, 5, 5, 3]);
    assert_eq!(dims(&module, bias), vec![16]);

    let filter_var = module.value(filter).unwrap().as_static().unwrap();
    assert_eq!(filter_var.init_kind, InitKind::Xavier);
    assert_eq!(filter_var.share_kind, ShareKind::Weight);
    assert_eq!(filter_var.val, 75.0);

    let bias_var = module.value(bias).unwrap().as_static().unwrap();
    assert_eq!(bias_var.init_kind, InitKind::Broadcast);
    assert_eq!(bias_var.val, 0.1);

    vkml_ir::verify_instruction(&module, conv).expect("conv must verify");
    verify_module(&module).expect("module must verify");
}

#[test]
fn max_pool_allocates_index_cache() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[1, 32, 32, 16]);
    let pool = builder
        .create_pool_op(input, PoolKind::Max, 2, 2, 0)
        .expect("pool must build");

    let cache = operand(&module, pool, 2);
    assert_eq!(dims(&module, module.dest_of(pool).unwrap()), vec![1, 16, 16, 16]);
    assert_eq!(dims(&module, cache), vec![1, 16, 16, 16, 2]);
    assert_eq!(module.elem_kind(cache), Some(ElemKind::Index));
    assert_eq!(
        module.instr(pool).unwrap().operand(2).unwrap().kind,
        OperandKind::InOut
    );
    verify_module(&module).unwrap();
}

#[test]
fn avg_pool_uses_scalar_cache() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[2, 9, 9, 4]);
    let pool = builder.create_pool_op(input, PoolKind::Avg, 3, 2, 1).unwrap();

    assert_eq!(dims(&module, module.dest_of(pool).unwrap()), vec![2, 5, 5, 4]);
    assert!(dims(&module, operand(&module, pool, 2)).is_empty());
    verify_module(&module).unwrap();
}

#[test]
fn fully_connected_flattens_trailing_dims() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[8, 4, 4, 3]);
    let fc = builder.create_fully_connected_op(input, 10).unwrap();

    let weights = operand(&module, fc, 2);
    assert_eq!(dims(&module, module.dest_of(fc).unwrap()), vec![8, 10]);
    assert_eq!(dims(&module, weights), vec![10, 48]);
    assert_eq!(dims(&module, operand(&module, fc, 3)), vec![10]);
    assert_eq!(module.value(weights).unwrap().as_static().unwrap().val, 48.0);
    verify_module(&module).unwrap();
}

#[test]
fn activations_keep_the_input_type() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[4, 10]);
    let relu = builder.create_relu_op(input).unwrap();
    let sigmoid = builder.create_sigmoid_op(input).unwrap();
    let tanh = builder.create_tanh_op(input).unwrap();

    let input_type = module.value(input).unwrap().get_type();
    for instr in [relu, sigmoid, tanh] {
        let dest = module.dest_of(instr).unwrap();
        assert_eq!(module.value(dest).unwrap().get_type(), input_type);
    }
    verify_module(&module).unwrap();
}

#[test]
fn softmax_allocates_expected_scratch() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[4, 10]);
    let selected = builder.create_named_variable(ElemKind::Index, &[4, 1], "selected");
    let softmax = builder.create_softmax_op(input, selected).unwrap();

    let instr = module.instr(softmax).unwrap();
    assert_eq!(instr.num_operands(), 4);
    let expected = instr.operand(2).unwrap().value;
    assert_eq!(module.value(expected).unwrap().name(), Some("expected"));
    assert_eq!(instr.operand(3).unwrap().value, selected);
    verify_module(&module).unwrap();
}

#[test]
fn regression_reads_expected_values() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[4, 1]);
    let expected = builder.create_variable(ElemKind::Float32, &[4, 1]);
    let regression = builder.create_regression_op(input, expected).unwrap();

    assert_eq!(operand(&module, regression, 2), expected);
    verify_module(&module).unwrap();
}

#[test]
fn reshape_transpose_and_concat_shapes() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[1, 16, 16, 3]);

    let reshape = builder.create_reshape_op(input, &[1, 768]).unwrap();
    let transpose = builder.create_transpose_op(input, &[0, 3, 1, 2]).unwrap();
    let other = builder.create_variable(ElemKind::Float32, &[1, 16, 16, 3]);
    let concat = builder.create_concat_op(&[input, other, input], 3).unwrap();

    assert_eq!(dims(&module, module.dest_of(reshape).unwrap()), vec![1, 768]);
    assert_eq!(dims(&module, module.dest_of(transpose).unwrap()), vec![1, 3, 16, 16]);
    assert_eq!(dims(&module, module.dest_of(concat).unwrap()), vec![1, 16, 16, 9]);
    assert_eq!(
        module.instr(transpose).unwrap().kind(),
        &InstrKind::Transpose {
            shuffle: vec![0, 3, 1, 2]
        }
    );
    verify_module(&module).unwrap();
}

#[test]
fn batch_normalization_allocates_parameters() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[2, 8, 8, 6]);
    let bn = builder
        .create_batch_normalization_op(input, 3, 0.001, 0.9)
        .unwrap();

    let gamma = operand(&module, bn, 2);
    let beta = operand(&module, bn, 3);
    let mean = operand(&module, bn, 4);
    let variance = operand(&module, bn, 5);
    for value in [gamma, beta, mean, variance] {
        assert_eq!(dims(&module, value), vec![6]);
    }

    let gamma_var = module.value(gamma).unwrap().as_static().unwrap();
    assert_eq!(module.value(gamma).unwrap().name(), Some("gamma"));
    assert_eq!((gamma_var.init_kind, gamma_var.val), (InitKind::Broadcast, 1.0));
    let beta_var = module.value(beta).unwrap().as_static().unwrap();
    assert_eq!((beta_var.init_kind, beta_var.val), (InitKind::Broadcast, 0.0));
    let mean_var = module.value(mean).unwrap().as_static().unwrap();
    assert_eq!(mean_var.init_kind, InitKind::Extern);
    assert_eq!(mean_var.share_kind, ShareKind::Activation);

    verify_module(&module).unwrap();
}

#[test]
fn arithmetic_rejects_mismatched_operands_without_appending() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let lhs = builder.create_variable(ElemKind::Float32, &[4, 4]);
    let rhs = builder.create_variable(ElemKind::Float32, &[4, 5]);
    let values_before = builder.module().values().len();

    let err = builder
        .create_arithmetic_op(lhs, rhs, ArithmeticKind::Add)
        .unwrap_err();
    assert!(matches!(
        err,
        IrError::Shape(ShapeError::OperandMismatch { op: "add", .. })
    ));
    assert!(module.instrs().is_empty());
    assert_eq!(module.values().len(), values_before);
}

#[test]
fn arithmetic_rejects_mixed_element_kinds() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let lhs = builder.create_variable(ElemKind::Float32, &[4]);
    let rhs = builder.create_variable(ElemKind::Int32, &[4]);
    assert!(builder
        .create_arithmetic_op(lhs, rhs, ArithmeticKind::Mul)
        .is_err());

    let same = builder.create_variable(ElemKind::Float32, &[4]);
    builder
        .create_arithmetic_op(lhs, same, ArithmeticKind::Mul)
        .unwrap();
    verify_module(&module).unwrap();
}

#[test]
fn rejected_requests_leave_the_module_untouched() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let small = builder.create_variable(ElemKind::Float32, &[1, 4, 4, 3]);
    let flat = builder.create_variable(ElemKind::Float32, &[4, 4]);
    let other = builder.create_variable(ElemKind::Float32, &[4, 5]);
    let values_before = builder.module().values().len();

    assert!(matches!(
        builder.create_conv_op(small, 8, 5, 1, 2),
        Err(IrError::Shape(ShapeError::KernelTooLarge { kernel: 5, .. }))
    ));
    assert!(matches!(
        builder.create_pool_op(small, PoolKind::Max, 2, 0, 0),
        Err(IrError::Shape(ShapeError::ZeroStride { .. }))
    ));
    assert!(matches!(
        builder.create_conv_op(flat, 8, 1, 1, 0),
        Err(IrError::Shape(ShapeError::RankMismatch { expected: 4, .. }))
    ));
    assert!(matches!(
        builder.create_reshape_op(flat, &[3, 5]),
        Err(IrError::Shape(ShapeError::ReshapeSizeMismatch { .. }))
    ));
    assert!(matches!(
        builder.create_transpose_op(flat, &[1, 1]),
        Err(IrError::Shape(ShapeError::InvalidPermutation { .. }))
    ));
    assert!(matches!(
        builder.create_concat_op(&[flat, other], 0),
        Err(IrError::Shape(ShapeError::ConcatInputMismatch { index: 1, .. }))
    ));
    assert!(matches!(
        builder.create_concat_op(&[], 0),
        Err(IrError::Shape(ShapeError::EmptyConcat))
    ));
    assert!(matches!(
        builder.create_batch_normalization_op(flat, 2, 0.001, 0.9),
        Err(IrError::Shape(ShapeError::AxisOutOfRange { axis: 2, rank: 2, .. }))
    ));
    assert!(matches!(
        builder.create_relu_op(ValueId(999)),
        Err(IrError::UnknownValue(ValueId(999)))
    ));

    assert!(module.instrs().is_empty());
    assert_eq!(module.values().len(), values_before);
}

#[test]
fn identical_types_share_a_handle() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let a = builder.create_variable(ElemKind::Float32, &[3, 3]);
    let b = builder.create_named_variable(ElemKind::Float32, &[3, 3], "b");
    let c = builder.create_variable(ElemKind::Index, &[3, 3]);

    let ty = |v: ValueId| module.value(v).unwrap().get_type();
    assert_eq!(ty(a), ty(b));
    assert_ne!(ty(a), ty(c));
}

#[test]
fn config_controls_parameter_fills() {
    let config = BuilderConfig {
        bias_fill: 0.0,
        gamma_fill: 0.5,
        ..Default::default()
    }
    .build()
    .unwrap();

    let mut module = Module::new();
    let mut builder = IRBuilder::with_config(&mut module, config);
    let input = builder.create_variable(ElemKind::Float32, &[2, 3]);
    let fc = builder.create_fully_connected_op(input, 4).unwrap();
    let bn = builder
        .create_batch_normalization_op(input, 1, 0.001, 0.9)
        .unwrap();

    let bias = operand(&module, fc, 3);
    let gamma = operand(&module, bn, 2);
    assert_eq!(module.value(bias).unwrap().as_static().unwrap().val, 0.0);
    assert_eq!(module.value(gamma).unwrap().as_static().unwrap().val, 0.5);
}

#[test]
fn small_network_end_to_end() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_named_variable(ElemKind::Float32, &[8, 28, 28, 1], "input");
    let selected = builder.create_named_variable(ElemKind::Index, &[8, 1], "selected");

    let conv = builder.create_conv_op(input, 8, 5, 1, 2).unwrap();
    let x = builder.module().dest_of(conv).unwrap();
    let relu = builder.create_relu_op(x).unwrap();
    let x = builder.module().dest_of(relu).unwrap();
    let pool = builder.create_pool_op(x, PoolKind::Max, 2, 2, 0).unwrap();
    let x = builder.module().dest_of(pool).unwrap();
    let fc = builder.create_fully_connected_op(x, 10).unwrap();
    let x = builder.module().dest_of(fc).unwrap();
    builder.create_softmax_op(x, selected).unwrap();

    assert_eq!(module.instrs().len(), 5);
    assert_eq!(dims(&module, module.dest_of(pool).unwrap()), vec![8, 14, 14, 8]);
    assert_eq!(
        module.parameter_count(),
        8 * 5 * 5 + 8 + 10 * 14 * 14 * 8 + 10
    );
    verify_module(&module).unwrap();
}

#[test]
fn oversized_shapes_are_rejected_without_appending() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let image = builder.create_variable(ElemKind::Float32, &[1, 8, 8, 3]);
    let flat = builder.create_variable(ElemKind::Float32, &[4]);
    let huge = builder.create_variable(ElemKind::Float32, &[usize::MAX / 2 + 1, 3]);
    let values_before = builder.module().values().len();

    assert_eq!(
        builder.create_conv_op(image, 4, 3, 1, usize::MAX / 2 + 1),
        Err(IrError::Shape(ShapeError::Overflow { op: "convolution" }))
    );
    assert_eq!(
        builder.create_reshape_op(flat, &[usize::MAX, 2]),
        Err(IrError::Shape(ShapeError::Overflow { op: "reshape" }))
    );
    assert_eq!(
        builder.create_concat_op(&[huge, huge], 0),
        Err(IrError::Shape(ShapeError::Overflow { op: "concat" }))
    );

    assert!(module.instrs().is_empty());
    assert_eq!(module.values().len(), values_before);
}

#[test]
fn zero_sized_windows_are_rejected() {
    let mut module = Module::new();
    let mut builder = IRBuilder::new(&mut module);
    let input = builder.create_variable(ElemKind::Float32, &[1, 8, 8, 3]);
    let values_before = builder.module().values().len();

    assert_eq!(
        builder.create_conv_op(input, 4, 0, 1, 0),
        Err(IrError::Shape(ShapeError::ZeroKernel { op: "convolution" }))
    );
    assert_eq!(
        builder.create_pool_op(input, PoolKind::Avg, 0, 1, 0),
        Err(IrError::Shape(ShapeError::ZeroKernel { op: "pool" }))
    );
    assert!(module.instrs().is_empty());
    assert_eq!(module.values().len(), values_before);
}
