use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reg_dfa::{compile, compile_with_flags, CompileFlags, Matcher};

const PATTERN: &str = "(a|b)*abb(a|b)*(c|d)+";

fn input_text(len: usize) -> String {
    let mut text: String = "ab".chars().cycle().take(len).collect();
    text.push_str("abbcdc");
    text
}

fn criterion_benchmark_compile(c: &mut Criterion) {
    c.bench_function("compile minimized", |b| {
        b.iter(|| compile(black_box(PATTERN)).unwrap())
    });
    c.bench_function("compile without minimization", |b| {
        b.iter(|| compile_with_flags(black_box(PATTERN), CompileFlags::NO_FLAG).unwrap())
    });
}

fn criterion_benchmark_match(c: &mut Criterion) {
    let matcher: Matcher = compile(PATTERN).unwrap();
    let text = input_text(200000);
    assert!(matcher.accepts(&text));
    c.bench_function("match long input", |b| {
        b.iter(|| matcher.accepts(black_box(&text)))
    });
}

criterion_group!(benches, criterion_benchmark_compile, criterion_benchmark_match);
criterion_main!(benches);
