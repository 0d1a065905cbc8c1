//! Benchmark for condition parsing, rendering and wire decoding

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::net::Ipv4Addr;
use traffic_class_core::condition::cache::clear_cache;
use traffic_class_core::condition::{
    check, decode, encode, get_or_parse, parse, render, NoClasses, Packet,
};

const EXPRESSIONS: &[&str] = &[
    "src=10.0.0.0/8",
    "ALL(src=10.0.0.0/8,dst=192.168.0.0/16,dscp=0x2e)",
    "ANY(NOT(cls=4),ALL(dscp=0x0,src=172.16.0.0/12),true)",
    "NOT(ANY(ALL(src=10.1.0.0/16,NOT(dst=10.1.2.0/24)),dscp=0x12,bool=false))",
];

/// A wide tree of a few hundred nodes
fn large_expression() -> String {
    let leaves: Vec<String> = (0..64)
        .map(|i| format!("ALL(src=10.{}.0.0/16,NOT(dscp={:#x}))", i, i))
        .collect();
    format!("ANY({})", leaves.join(","))
}

fn benchmark_parsing(c: &mut Criterion) {
    c.bench_function("expression_parsing_cold", |b| {
        b.iter(|| {
            clear_cache();
            for expr in EXPRESSIONS {
                let _ = black_box(get_or_parse(expr));
            }
        })
    });

    c.bench_function("expression_parsing_cached", |b| {
        // Warm up cache
        for expr in EXPRESSIONS {
            let _ = get_or_parse(expr);
        }

        b.iter(|| {
            for expr in EXPRESSIONS {
                let _ = black_box(get_or_parse(expr));
            }
        })
    });

    let large = large_expression();
    c.bench_function("expression_parsing_large", |b| {
        b.iter(|| black_box(parse(&large)))
    });
}

fn benchmark_render(c: &mut Criterion) {
    let trees: Vec<_> = EXPRESSIONS.iter().filter_map(|e| parse(e).ok()).collect();
    let large = parse(&large_expression()).ok();

    c.bench_function("render", |b| {
        b.iter(|| {
            for tree in &trees {
                black_box(render(tree));
            }
        })
    });

    if let Some(large) = large {
        c.bench_function("render_large", |b| b.iter(|| black_box(render(&large))));
    }
}

fn benchmark_codec(c: &mut Criterion) {
    let wires: Vec<_> = EXPRESSIONS
        .iter()
        .filter_map(|e| parse(e).ok())
        .filter_map(|tree| encode(&tree).ok())
        .collect();

    c.bench_function("wire_decode", |b| {
        b.iter(|| {
            for wire in &wires {
                let _ = black_box(decode(wire));
            }
        })
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let trees: Vec<_> = EXPRESSIONS.iter().filter_map(|e| parse(e).ok()).collect();
    let packet = Packet::new(Ipv4Addr::new(10, 1, 3, 4), Ipv4Addr::new(192, 168, 1, 1), 0x2e << 2);

    c.bench_function("evaluate", |b| {
        b.iter(|| {
            for tree in &trees {
                black_box(check(tree, &packet, &NoClasses));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_render,
    benchmark_codec,
    benchmark_evaluation
);
criterion_main!(benches);
