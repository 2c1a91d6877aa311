use cancionero_rs::view::{bar_rows, cloud_words, numero_es, page_range};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn bench_page_range(c: &mut Criterion) {
    const CASES: &[(u32, u32)] = &[(1, 5), (10, 20), (250, 500)];
    for &(current, total) in CASES {
        let label = format!("{current}_of_{total}");
        c.bench_with_input(
            BenchmarkId::new("page_range", label),
            &(current, total),
            |b, &(current, total)| {
                b.iter(|| black_box(page_range(current, total)));
            },
        );
    }
}

fn bench_bar_rows(c: &mut Criterion) {
    let datos: Vec<(String, u64)> = (0..100)
        .map(|i| (format!("etiqueta-{i}"), (i * 7 + 3) as u64))
        .collect();
    c.bench_function("bar_rows::100_rows", |b| {
        b.iter(|| black_box(bar_rows(datos.clone())));
    });
}

fn bench_cloud_layout(c: &mut Criterion) {
    let items: Vec<(String, u64)> = (0..200)
        .map(|i| (format!("palabra{i}"), i + 1))
        .collect();
    c.bench_function("cloud_words::200_terms", |b| {
        let mut rng = SmallRng::seed_from_u64(42);
        b.iter(|| black_box(cloud_words(&items, &mut rng)));
    });
}

fn bench_numero_es(c: &mut Criterion) {
    c.bench_function("numero_es::millions", |b| {
        b.iter(|| black_box(numero_es(1_234_567)));
    });
}

criterion_group!(
    benches,
    bench_page_range,
    bench_bar_rows,
    bench_cloud_layout,
    bench_numero_es
);
criterion_main!(benches);
