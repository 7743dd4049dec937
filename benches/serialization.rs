use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_form::{from_form, to_form, Engine};

#[derive(Serialize, Deserialize, Clone, Default)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone, Default)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone, Default)]
struct Catalog {
    products: Vec<Product>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
struct NestedData {
    id: u32,
    metadata: Metadata,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
struct Metadata {
    created: String,
    updated: String,
    version: u32,
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn nested() -> NestedData {
    NestedData {
        id: 42,
        metadata: Metadata {
            created: "2023-01-01T00:00:00Z".to_string(),
            updated: "2023-12-31T23:59:59Z".to_string(),
            version: 3,
        },
        tags: vec![
            "important".to_string(),
            "verified".to_string(),
            "production".to_string(),
        ],
    }
}

fn catalog(size: u32) -> Catalog {
    Catalog {
        products: (0..size)
            .map(|i| Product {
                sku: format!("SKU{i}"),
                name: format!("Product {i}"),
                price: 9.99 + f64::from(i),
                quantity: i,
            })
            .collect(),
    }
}

fn benchmark_encode_simple(c: &mut Criterion) {
    let user = user();

    c.bench_function("encode_simple_struct", |b| {
        b.iter(|| to_form(black_box(&user)))
    });
}

fn benchmark_decode_simple(c: &mut Criterion) {
    let form = to_form(&user()).unwrap();

    c.bench_function("decode_simple_struct", |b| {
        b.iter(|| from_form::<User>(black_box(&form)))
    });
}

fn benchmark_encode_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_sequence");
    let engine = Engine::new();

    for size in [10, 50, 100, 500].iter() {
        let catalog = catalog(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| engine.encode(black_box(catalog)))
        });
    }
    group.finish();
}

fn benchmark_decode_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_sequence");
    let engine = Engine::new();

    for size in [10, 50, 100, 500].iter() {
        let form = to_form(&catalog(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &form, |b, form| {
            b.iter(|| engine.decode_new::<Catalog>(black_box(form)))
        });
    }
    group.finish();
}

fn benchmark_nested(c: &mut Criterion) {
    let data = nested();
    let form = to_form(&data).unwrap();

    c.bench_function("encode_nested_struct", |b| {
        b.iter(|| to_form(black_box(&data)))
    });

    c.bench_function("decode_nested_struct", |b| {
        b.iter(|| from_form::<NestedData>(black_box(&form)))
    });
}

fn benchmark_in_place_decode(c: &mut Criterion) {
    let engine = Engine::new();
    let form = serde_form::form! { "metadata.version" => ["4"], "tags" => ["a", "b"] };

    c.bench_function("decode_in_place", |b| {
        b.iter(|| {
            let mut data = nested();
            engine.decode(black_box(&form), &mut data)
        })
    });
}

fn benchmark_isolated_failures(c: &mut Criterion) {
    let engine = Engine::new();
    let form = serde_form::form! {
        "id" => ["x"],
        "name" => ["Bob"],
        "active" => ["maybe"],
    };

    c.bench_function("decode_with_field_errors", |b| {
        b.iter(|| engine.decode_new::<User>(black_box(&form)))
    });
}

criterion_group!(
    benches,
    benchmark_encode_simple,
    benchmark_decode_simple,
    benchmark_encode_sequence,
    benchmark_decode_sequence,
    benchmark_nested,
    benchmark_in_place_decode,
    benchmark_isolated_failures
);
criterion_main!(benches);
