// Write performance benchmarks for luamdb

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use luamdb::{Options, Store, WriteFlags};
use std::hint::black_box;
use tempfile::TempDir;

fn bench_options() -> Options {
    Options::new().map_size(256 * 1024 * 1024).no_sync(true)
}

fn benchmark_sequential_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_write");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let store = Store::open(temp_dir.path(), bench_options()).unwrap();

                for i in 0..size {
                    let key = format!("key{:08}", i);
                    let value = format!("value{:08}", i);
                    store
                        .put(key.as_bytes(), value.as_bytes(), WriteFlags::default())
                        .unwrap();
                }

                black_box(&store);
            });
        });
    }

    group.finish();
}

fn benchmark_random_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_write");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let store = Store::open(temp_dir.path(), bench_options()).unwrap();

                use rand::Rng;
                let mut rng = rand::rng();

                for _ in 0..size {
                    let key_num: u32 = rng.random();
                    let key = format!("key{:08}", key_num);
                    let value = format!("value{:08}", key_num);
                    store
                        .put(key.as_bytes(), value.as_bytes(), WriteFlags::default())
                        .unwrap();
                }

                black_box(&store);
            });
        });
    }

    group.finish();
}

fn benchmark_append_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_write");

    for (name, flags) in [
        ("plain", WriteFlags::new()),
        ("append", WriteFlags::new().append(true)),
        ("reserve", WriteFlags::new().reserve(true)),
    ] {
        group.throughput(Throughput::Elements(1000));
        group.bench_function(name, |b| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let store = Store::open(temp_dir.path(), bench_options()).unwrap();

                // Keys arrive in ascending order, as append requires
                for i in 0..1000 {
                    let key = format!("key{:08}", i);
                    let value = vec![b'x'; 100];
                    store.put(key.as_bytes(), &value, flags).unwrap();
                }

                black_box(&store);
            });
        });
    }

    group.finish();
}

fn benchmark_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite");

    group.throughput(Throughput::Elements(1000));
    group.bench_function("overwrite_1000", |b| {
        // Setup store once for all iterations
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(temp_dir.path(), bench_options()).unwrap();

        for i in 0..1000 {
            let key = format!("key{:08}", i);
            let value = format!("initial_value{:08}", i);
            store
                .put(key.as_bytes(), value.as_bytes(), WriteFlags::default())
                .unwrap();
        }

        b.iter(|| {
            for i in 0..1000 {
                let key = format!("key{:08}", i);
                let value = format!("updated_value{:08}", i);
                store
                    .put(key.as_bytes(), value.as_bytes(), WriteFlags::default())
                    .unwrap();
            }
            black_box(&store);
        });
    });

    group.finish();
}

fn benchmark_durable_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("durable_write");
    group.sample_size(10);

    group.bench_function("fsync_per_commit", |b| {
        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let store = Store::open(temp_dir.path(), Options::default()).unwrap();

            for i in 0..100 {
                let key = format!("key{:08}", i);
                store.put(key.as_bytes(), b"value", WriteFlags::default()).unwrap();
            }

            black_box(&store);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_write,
    benchmark_random_write,
    benchmark_append_write,
    benchmark_overwrite,
    benchmark_durable_write
);
criterion_main!(benches);
