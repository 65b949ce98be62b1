use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dxf_generator::sanitize;

fn sample_response(lines: usize) -> String {
    let mut body = String::from("0\nSECTION\n2\nENTITIES\n");
    for i in 0..lines {
        body.push_str(&format!(
            "0\nLINE\n8\nWALLS\n10\n{i}.0\n20\n0.0\n11\n{i}.0\n21\n100.0\n"
        ));
    }
    body.push_str("0\nENDSEC\n0\nEOF");
    format!(
        "Here is the drawing you asked for.\n```json\n{{\"status\": \"ok\"}}\n```\n```dxf\n{}\n```\nHope this helps!",
        body
    )
}

fn bench_sanitize(c: &mut Criterion) {
    let small = sample_response(10);
    let large = sample_response(5_000);

    c.bench_function("sanitize_small", |b| b.iter(|| sanitize(black_box(&small))));
    c.bench_function("sanitize_large", |b| b.iter(|| sanitize(black_box(&large))));
}

criterion_group!(benches, bench_sanitize);
criterion_main!(benches);
