//! Performance benchmarks for the FOOL compiler pipeline.
//!
//! Workloads are generated syntax trees:
//! - Deep class hierarchies with an overriding method per level
//! - Long chains of nested functions
//! - Wide arithmetic expressions
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fool::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// `C0 <- C1 <- ... <- Cn`, each with a field and an overriding `get`.
fn class_hierarchy(depth: usize) -> Program {
    let classes = (0..depth)
        .map(|level| {
            let superclass = level.checked_sub(1).map(|parent| format!("C{parent}"));
            let fields = if level == 0 {
                vec![FieldDecl::new("v", TypeNode::Int, 1)]
            } else {
                vec![]
            };
            let get = MethodDecl::new(
                "get",
                TypeNode::Int,
                vec![],
                vec![],
                Expr::binary(BinaryOp::Add, Expr::id("v", 1), Expr::int(level as i64, 1), 1),
                1,
            );
            ClassDecl::new(format!("C{level}"), superclass, fields, vec![get], 1)
        })
        .collect();
    let last = format!("C{}", depth - 1);
    let object = Declaration::Var(VarDecl::new(
        "o",
        TypeNode::reference("C0"),
        Expr::new_object(last, vec![Expr::int(1, 2)], 2),
        2,
    ));
    Program::let_in(classes, vec![object], Expr::method_call("o", "get", vec![], 3))
}

/// `f0` declares `f1` which declares `f2` ..., the innermost reads every parameter.
fn nested_functions(depth: usize) -> Program {
    let mut body = (0..depth).fold(Expr::int(0, 1), |acc, level| {
        Expr::binary(BinaryOp::Add, acc, Expr::id(format!("p{level}"), 1), 1)
    });
    let mut declarations = vec![];
    for level in (0..depth).rev() {
        let name = format!("f{level}");
        let fun = FunDecl::new(
            name.clone(),
            TypeNode::Int,
            vec![ParamDecl::new(format!("p{level}"), TypeNode::Int, 1)],
            declarations,
            body,
            1,
        );
        body = Expr::call(name, vec![Expr::int(level as i64, 1)], 1);
        declarations = vec![Declaration::Fun(fun)];
    }
    Program::let_in(vec![], declarations, body)
}

fn wide_expression(terms: usize) -> Program {
    let expr = (1..terms).fold(Expr::int(0, 1), |acc, term| {
        let op = if term % 2 == 0 { BinaryOp::Add } else { BinaryOp::Mul };
        Expr::binary(op, acc, Expr::int(term as i64, 1), 1)
    });
    Program::body(Expr::print(expr, 1))
}

fn bench_workload(c: &mut Criterion, group_name: &str, sizes: &[usize], build: fn(usize) -> Program) {
    let mut group = c.benchmark_group(group_name);
    for &size in sizes {
        let program = build(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &program, |b, program| {
            b.iter(|| {
                let mut program = program.clone();
                let compiled = fool::compile(black_box(&mut program)).unwrap();
                end_profiling_frame();
                black_box(compiled.code.len())
            });
        });
    }
    group.finish();
}

fn pipeline_benchmarks(c: &mut Criterion) {
    setup_profiler();
    bench_workload(c, "pipeline/class_hierarchy", &[4, 32, 128], class_hierarchy);
    bench_workload(c, "pipeline/nested_functions", &[4, 16, 64], nested_functions);
    bench_workload(c, "pipeline/wide_expression", &[16, 256, 1024], wide_expression);
}

criterion_group!(benches, pipeline_benchmarks);
criterion_main!(benches);
