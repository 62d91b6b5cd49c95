//! Action stream decoding benchmarks
//!
//! Run with: `cargo bench -p lark-vm-bytecode`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lark_vm_bytecode::{ActionCode, ActionStreamBuilder, PreloadFlags, PushValue, decode_actions};
use std::hint::black_box;

fn straight_line(records: usize) -> Vec<u8> {
    let mut builder = ActionStreamBuilder::new().constant_pool(&["x", "y", "total"]);
    for i in 0..records {
        builder = builder
            .push(&[PushValue::Constant(0), PushValue::Integer(i as i32)])
            .action(ActionCode::SetVariable)
            .push(&[PushValue::Constant(0)])
            .action(ActionCode::GetVariable)
            .action(ActionCode::Increment)
            .store_register(1)
            .action(ActionCode::Pop);
    }
    builder.finish()
}

fn nested_functions(depth: usize) -> Vec<u8> {
    let mut body = ActionStreamBuilder::new()
        .push(&[PushValue::Register(1)])
        .action(ActionCode::Return);
    for level in 0..depth {
        let name = format!("f{level}");
        body = ActionStreamBuilder::new().define_function2(
            &name,
            4,
            PreloadFlags::new(PreloadFlags::PRELOAD_THIS),
            &[(2, "a")],
            body,
        );
    }
    body.finish()
}

fn bench_straight_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_straight_line");
    for records in [16usize, 256, 4096] {
        let bytes = straight_line(records);
        group.bench_with_input(BenchmarkId::from_parameter(records), &bytes, |b, bytes| {
            b.iter(|| black_box(decode_actions(black_box(bytes))))
        });
    }
    group.finish();
}

fn bench_nested_functions(c: &mut Criterion) {
    let bytes = nested_functions(32);
    c.bench_function("decode_nested_functions_32", |b| {
        b.iter(|| black_box(decode_actions(black_box(&bytes))))
    });
}

criterion_group!(benches, bench_straight_line, bench_nested_functions);
criterion_main!(benches);
