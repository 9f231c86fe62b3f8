//! Performance benchmarks for litweave

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use litweave::config::Markers;
use litweave::engine::execute;
use litweave::host::Interpreter;
use litweave::interface::{weave_source, Context};
use litweave::readers::scan;

/// A script with `sections` rounds of code, hidden code, prose and output.
fn generate_source(sections: usize) -> String {
    let mut src = String::from("total = 0\n");
    for i in 0..sections {
        src.push_str(&format!("for k in range({}):\n    total += k\n", i % 20));
        src.push_str(&format!("#% hidden value{} = total * {}\n", i, i + 1));
        src.push_str(&format!("#' Section {}: total is {{{{ total }}}}, value {{{{ value{} }}}}.\n", i, i));
        src.push_str("#' A second line of prose.\n");
        src.push_str("print(total)\n#>\n");
    }
    src
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let markers = Markers::default();

    for sections in [10, 100, 1000].iter() {
        let src = generate_source(*sections);
        group.bench_with_input(BenchmarkId::new("sections", sections), &src, |b, src| {
            b.iter(|| scan(black_box(src), &markers))
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");
    let markers = Markers::default();

    for sections in [10, 100, 500].iter() {
        let scanned = scan(&generate_source(*sections), &markers);
        group.bench_with_input(
            BenchmarkId::new("sections", sections),
            &scanned,
            |b, scanned| b.iter(|| execute(black_box(scanned))),
        );
    }

    group.finish();
}

fn bench_weave(c: &mut Criterion) {
    let mut group = c.benchmark_group("weave");
    let ctx = Context::default_for_dir(PathBuf::from("."));

    for sections in [10, 100, 500].iter() {
        let src = generate_source(*sections);
        group.bench_with_input(BenchmarkId::new("sections", sections), &src, |b, src| {
            b.iter(|| weave_source(&ctx, black_box(src), None))
        });
    }

    group.finish();
}

fn bench_interpreter(c: &mut Criterion) {
    let program = "\
def fib(n):
    if n < 2:
        return n
    return fib(n - 1) + fib(n - 2)
result = fib(15)";

    c.bench_function("interpreter_fib15", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new();
            interp
                .run(program.lines().enumerate().map(|(i, l)| (i + 1, l)))
                .unwrap();
            interp
        })
    });
}

criterion_group!(benches, bench_scan, bench_execute, bench_weave, bench_interpreter);

criterion_main!(benches);
