//! Baseline lexing throughput over representative selector shapes.

use criterion::{Criterion, criterion_group, criterion_main};
use gossamer_selectors::lex;
use std::hint::black_box;

fn bench_lex(criterion: &mut Criterion) {
    criterion.bench_function("lex_single_tag", |bencher| {
        bencher.iter(|| lex(black_box("div")))
    });
    criterion.bench_function("lex_child_chain", |bencher| {
        bencher.iter(|| lex(black_box("body div > p + span ~ em")))
    });
    criterion.bench_function("lex_compound_with_attributes", |bencher| {
        bencher.iter(|| lex(black_box("div.fred#p2[role=\"main\"][data-k=\"v 1\"]")))
    });
    criterion.bench_function("lex_selector_list", |bencher| {
        bencher.iter(|| lex(black_box("header,nav a,main .content > p,footer [role]")))
    });
}

criterion_group!(benches, bench_lex);
criterion_main!(benches);
