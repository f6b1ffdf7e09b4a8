use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use larch_syntax::{CancellationToken, ParseOptions};

fn benchmark_parser(c: &mut Criterion) {
    let medium: String = (0..20)
        .map(|i| {
            format!(
                "int f{i}(int a, bool b) {{\n    if (b && a > {i}) {{ return a * 2; }}\n    \
                 while (a < 10) {{ a = a + 1; }}\n    return f{i}(a - 1, !b);\n}}\n\n"
            )
        })
        .collect();
    let files = [
        ("Simple", "int foo() {\n    return 42;\n}\n".to_owned()),
        ("Medium", medium),
        (
            "Directives",
            "#define A\n#if A && !B\nclass C { int x; }\n#else\nskipped text\n#endif\n\
             #pragma warning disable 1030\nint y = 1;\n"
                .to_owned(),
        ),
    ];

    let mut group = c.benchmark_group("Parser Benchmark");
    let options = ParseOptions::default();
    let cancel = CancellationToken::none();

    for (name, text) in &files {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_code", name), text, |b, text| {
            b.iter(|| {
                let result = larch_parse::parse(text, &options, &cancel);
                black_box(result.is_ok());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
