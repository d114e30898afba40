//! Benchmark: storefront read paths over the in-memory store.
//!
//! Run with:
//! ```bash
//! cargo bench -p vitrine --bench query_bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use vitrine::params::RequestParams;
use vitrine::storefront::{self, Identity};
use vitrine::{Client, Direction, Record};

fn build_catalog(products: usize) -> Client {
    let client = Client::in_memory(storefront::schema());

    let categories = (1..=8)
        .map(|i| {
            Record::new()
                .with("id", i)
                .with("name", format!("Category {}", i))
                .with("slug", format!("category-{}", i))
        })
        .collect::<Vec<_>>();
    client.from("categories").insert(categories).execute().into_result().unwrap();

    let rows = (0..products as i64)
        .map(|i| {
            Record::new()
                .with("id", i + 1)
                .with("name", format!("Product {}", i))
                .with("slug", format!("product-{}", i))
                .with("price", 1000 + (i * 37) % 9000)
                .with("category_id", i % 8 + 1)
                .with("is_active", i % 10 != 0)
                .with("is_featured", i % 7 == 0)
                .with("created_at", format!("2026-01-01T00:00:{:06}Z", i))
        })
        .collect::<Vec<_>>();
    client.from("products").insert(rows).execute().into_result().unwrap();

    let variants = (0..products as i64)
        .flat_map(|i| {
            ["S", "M", "L"].into_iter().map(move |size| {
                Record::new()
                    .with("product_id", i + 1)
                    .with("size", size)
                    .with("sku", format!("P{}-{}", i, size))
                    .with("stock", i % 5)
            })
        })
        .collect::<Vec<_>>();
    client.from("product_variants").insert(variants).execute().into_result().unwrap();

    let orders = (0..50)
        .map(|i| {
            Record::new()
                .with("user_id", 1)
                .with("status", "paid")
                .with("total", 4200)
                .with("created_at", format!("2026-02-{:02}", i % 28 + 1))
        })
        .collect::<Vec<_>>();
    client.from("orders").insert(orders).execute().into_result().unwrap();

    client
}

fn bench_filtered_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("query/filtered_read");

    for n in [100usize, 1_000] {
        let client = build_catalog(n);

        group.bench_with_input(BenchmarkId::new("active_by_price", n), &n, |b, _| {
            b.iter(|| {
                client
                    .from("products")
                    .select("id, name, price")
                    .eq("is_active", true)
                    .order("price", Direction::Descending)
                    .limit(24)
                    .execute()
            });
        });

        group.bench_with_input(BenchmarkId::new("with_variants", n), &n, |b, _| {
            b.iter(|| {
                client
                    .from("products")
                    .select("id, name, variants:product_variants(size, stock)")
                    .eq("category.slug", "category-3")
                    .range(0, 23)
                    .execute()
            });
        });
    }

    group.finish();
}

fn bench_loaders(c: &mut Criterion) {
    let client = build_catalog(1_000);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let identity = Identity::new(1);

    c.bench_function("storefront.featured_products", |b| {
        b.iter(|| runtime.block_on(storefront::featured_products(&client, 12)));
    });

    c.bench_function("storefront.account_orders", |b| {
        b.iter(|| runtime.block_on(storefront::account_orders(&client, &identity, 10)));
    });
}

fn bench_param_parsing(c: &mut Criterion) {
    c.bench_function("params.parse", |b| {
        b.iter(|| {
            RequestParams::parse(
                "select=id,name,price&category_id=eq.3&size=in.(S,M,L)&order=price.desc&limit=20",
            )
        });
    });
}

criterion_group!(benches, bench_filtered_reads, bench_loaders, bench_param_parsing);
criterion_main!(benches);
