// Read performance benchmarks for luamdb

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use luamdb::{Options, Store, WriteFlags};
use std::convert::Infallible;
use std::hint::black_box;
use tempfile::TempDir;

fn populated_store(size: usize) -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let options = Options::new().map_size(256 * 1024 * 1024).no_sync(true);
    let store = Store::open(temp_dir.path(), options).unwrap();

    for i in 0..size {
        let key = format!("key{:08}", i);
        let value = format!("value{:08}", i);
        store
            .put(key.as_bytes(), value.as_bytes(), WriteFlags::default())
            .unwrap();
    }
    (temp_dir, store)
}

fn benchmark_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_read");

    for size in [100, 1000, 10000].iter() {
        let (_temp_dir, store) = populated_store(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    let key = format!("key{:08}", i);
                    let value = store.get(key.as_bytes()).unwrap();
                    black_box(value);
                }
            });
        });
    }

    group.finish();
}

fn benchmark_random_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_read");

    for size in [100, 1000, 10000].iter() {
        let (_temp_dir, store) = populated_store(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                use rand::Rng;
                let mut rng = rand::rng();

                for _ in 0..size {
                    let key_num: usize = rng.random_range(0..size);
                    let key = format!("key{:08}", key_num);
                    let value = store.get(key.as_bytes()).unwrap();
                    black_box(value);
                }
            });
        });
    }

    group.finish();
}

fn benchmark_read_missing_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_missing");

    // Keys 0-999 exist
    let (_temp_dir, store) = populated_store(1000);

    group.throughput(Throughput::Elements(1000));
    group.bench_function("missing_keys", |b| {
        b.iter(|| {
            for i in 1000..2000 {
                let key = format!("key{:08}", i);
                let value = store.get(key.as_bytes()).unwrap();
                black_box(value);
            }
        });
    });

    group.finish();
}

fn benchmark_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    for size in [100, 1000, 10000].iter() {
        let (_temp_dir, store) = populated_store(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("each", size), size, |b, _| {
            b.iter(|| {
                store
                    .each(|key, value| {
                        black_box((key, value));
                        Ok::<_, Infallible>(())
                    })
                    .unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("reduce", size), size, |b, _| {
            b.iter(|| {
                let total = store
                    .reduce(0usize, |_, value, acc| Ok::<_, Infallible>(acc + value.len()))
                    .unwrap();
                black_box(total);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_read,
    benchmark_random_read,
    benchmark_read_missing_keys,
    benchmark_traversal
);
criterion_main!(benches);
