use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dom::{markup, selector, DomSerializer, StyleResolver};

fn build_page(rows: usize) -> String {
    let mut html = String::from("<style>.row:nth-child(odd) { color: red }</style><table>");
    for i in 0..rows {
        html.push_str(&format!(
            "<tr class=\"row\" data-i=\"{i}\"><td><a href=\"#{i}\">{i}</a></td></tr>"
        ));
    }
    html.push_str("</table>");
    html
}

fn bench_queries(c: &mut Criterion) {
    let arena = markup::parse_document(&build_page(500));

    c.bench_function("select_all descendant", |b| {
        b.iter(|| selector::select_all(black_box(&arena), "table tr.row > td a").unwrap())
    });

    c.bench_function("select attribute", |b| {
        b.iter(|| selector::select(black_box(&arena), "[data-i$='99']").unwrap())
    });

    let resolver = StyleResolver::from_document(&arena);
    let link = arena.find_by_tag("a")[250];
    c.bench_function("computed color", |b| {
        b.iter(|| resolver.compute(black_box(&arena), link, "color"))
    });

    let root = arena.root_id().unwrap();
    c.bench_function("serialize document", |b| {
        b.iter(|| DomSerializer::new().inner_html(black_box(&arena), root).unwrap())
    });
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
