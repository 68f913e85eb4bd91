//! Bridge Benchmarks
//!
//! Measures the hot paths of the bridge:
//!
//! - **Annotations**: parsing native annotation text
//! - **Compile**: native function to `FunctionSpec` and DDL
//! - **DDL Reading**: parsing `CREATE FUNCTION` statements back
//! - **Execution**: argument validation, call building and result decoding
//!   against an in-memory catalog and a stub backend
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run one group
//! cargo bench compile
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use udf_bridge::ddl::parse_create_function;
use udf_bridge::types::parse_annotation;
use udf_bridge::{
    ArgumentBinding, BackendError, InMemoryCatalog, NativeFunction, NativeParameter, RawOutput, SqlCall, Value,
    compile, create_native_function, execute_function,
};

fn add() -> NativeFunction {
    NativeFunction::new("add")
        .param(NativeParameter::typed("a", "int"))
        .param(NativeParameter::typed("b", "int"))
        .returns("int")
        .body("return a + b")
}

fn wide() -> NativeFunction {
    let mut function = NativeFunction::new("wide")
        .returns("dict[str, list[float]]")
        .doc("Wide function.\n\nArgs:\n    p0: first\n    p1: second\n");
    for i in 0..32 {
        let parameter = match i % 4 {
            0 => NativeParameter::typed(format!("p{i}"), "int"),
            1 => NativeParameter::typed(format!("p{i}"), "Optional[str]").with_default(Value::Null),
            2 => NativeParameter::typed(format!("p{i}"), "list[datetime.date]"),
            _ => NativeParameter::typed(format!("p{i}"), "float").with_default(1.5),
        };
        function = function.param(parameter);
    }
    function.body("return {}")
}

// ============================================================================
// Annotation Benchmarks
// ============================================================================

fn bench_annotations(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotations");

    let annotations = vec![
        ("scalar", "int"),
        ("optional", "Optional[str]"),
        ("pipe_union", "list[int] | None"),
        ("nested", "dict[str, list[dict[str, Decimal]]]"),
    ];

    for (name, text) in annotations {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, t| {
            b.iter(|| parse_annotation(black_box(t)));
        });
    }

    group.finish();
}

// ============================================================================
// Compile Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    let functions = vec![("add", add()), ("wide", wide())];
    for (name, function) in functions {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &function, |b, f| {
            b.iter(|| compile(black_box(f), "main", "default", None));
        });
    }

    group.finish();
}

// ============================================================================
// DDL Reading Benchmarks
// ============================================================================

fn bench_ddl_reading(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddl_reading");

    for (name, function) in [("add", add()), ("wide", wide())] {
        let Ok(spec) = compile(&function, "main", "default", None) else {
            continue;
        };
        group.throughput(Throughput::Bytes(spec.raw_ddl.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &spec.raw_ddl, |b, ddl| {
            b.iter(|| parse_create_function(black_box(ddl)));
        });
    }

    group.finish();
}

// ============================================================================
// Execution Benchmarks
// ============================================================================

fn bench_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution");

    let catalog = InMemoryCatalog::new();
    if create_native_function(&catalog, &add(), "main", "default", None).is_err() {
        return;
    }
    let backend = |_: &SqlCall| -> Result<RawOutput, BackendError> { Ok(RawOutput::scalar("3")) };
    let args = ArgumentBinding::new().with("a", 1_i64).with("b", 2_i64);

    group.throughput(Throughput::Elements(1));
    group.bench_function("add", |b| {
        b.iter(|| execute_function(&catalog, &backend, black_box("main.default.add"), black_box(&args)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_annotations,
    bench_compile,
    bench_ddl_reading,
    bench_execution
);
criterion_main!(benches);
