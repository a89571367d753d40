//! Benchmarks for list reconciliation on large lists.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::{json, Value};

use trellis_core::template::{Descriptor, SectionDescriptor};
use trellis_core::{Mutation, RenderOptions, Template, View};

const ROWS: usize = 1_000;

fn view() -> View {
    let template = Template::new(vec![Descriptor::element(
        "ul",
        vec![SectionDescriptor::new("items")
            .index_ref("i")
            .children(vec![Descriptor::element(
                "li",
                vec![Descriptor::interpolator("i"), Descriptor::interpolator(".")],
            )])
            .into()],
    )]);
    let items: Vec<Value> = (0..ROWS).map(|n| json!(format!("row {n}"))).collect();
    View::new(template, json!({ "items": items }), RenderOptions::default())
        .expect("benchmark template renders")
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    group.bench_function("append", |b| {
        b.iter_batched(
            view,
            |mut view| {
                view.mutate("items", Mutation::Append(vec![json!("new")]))
                    .expect("append");
                black_box(view)
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("prepend", |b| {
        b.iter_batched(
            view,
            |mut view| {
                view.mutate("items", Mutation::Prepend(vec![json!("new")]))
                    .expect("prepend");
                black_box(view)
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("middle_splice", |b| {
        b.iter_batched(
            view,
            |mut view| {
                view.mutate(
                    "items",
                    Mutation::Splice {
                        start: (ROWS / 2) as i64,
                        delete_count: Some(3),
                        items: vec![json!("x")],
                    },
                )
                .expect("splice");
                black_box(view)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_mutations);
criterion_main!(benches);
