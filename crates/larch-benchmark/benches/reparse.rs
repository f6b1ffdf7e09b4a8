use std::hint::black_box;

use codspeed_criterion_compat::{Criterion, Throughput, criterion_group, criterion_main};
use larch_parse::parse_tree;
use larch_syntax::{CancellationToken, ParseOptions};

fn statements(n: usize) -> String {
    (0..n).map(|i| format!("int v{i} = v{i} * 2 + {i};\n")).collect()
}

fn benchmark_reparse(c: &mut Criterion) {
    let text = statements(1000);
    let edited = text.replacen("v500 =", "w500 =", 1);
    let tree = parse_tree(&text, ParseOptions::default());
    let cancel = CancellationToken::none();

    let mut group = c.benchmark_group("Reparse Benchmark");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("rename_one_statement", |b| {
        b.iter(|| {
            let new = tree.with_changed_text(&edited, &cancel);
            black_box(new.is_ok());
        });
    });

    group.bench_function("parse_from_scratch", |b| {
        b.iter(|| black_box(parse_tree(&edited, ParseOptions::default())));
    });

    let new = parse_tree(&edited, ParseOptions::default());
    group.bench_function("get_changes", |b| {
        b.iter(|| black_box(new.get_changes(&tree)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_reparse);
criterion_main!(benches);
