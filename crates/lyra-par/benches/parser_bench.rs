//! Parser benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lyra_lex::Scanner;
use lyra_par::Parser;
use lyra_util::Handler;

fn sample_program() -> String {
    let mut source = String::new();
    source.push_str("fn adder(x: int32): int32 { return x + 1; }\n");
    for i in 0..200 {
        source.push_str(&format!(
            "let v{i} : uint32 = ({i} + 2) * 3; print(v{i} < 100 && v{i} != 7);\n"
        ));
    }
    source
}

fn bench_parser(c: &mut Criterion) {
    let source = sample_program();
    let tokens = Scanner::new(&source).scan();
    c.bench_function("parse_sample_program", |b| {
        b.iter(|| {
            let handler = Handler::new();
            Parser::new(black_box(tokens.clone()), &handler).parse()
        })
    });
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
