use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tokio::time::Duration;

use emberkv_store::Store;

fn bench_write_read_sequential(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("write_read_sequential_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Store::new(Duration::from_secs(60));
                for i in 0..10_000 {
                    let key = format!("key:{i}");
                    let value = Bytes::from(format!("value:{i}"));
                    store.write(key.clone(), value);
                    black_box(store.read(&key));
                }
            });
        })
    });
}

fn bench_overwrite_same_key(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("overwrite_same_key_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Store::new(Duration::from_secs(60));
                for i in 0..10_000 {
                    store.write("hot".into(), Bytes::from(format!("value:{i}")));
                }
                black_box(store.len())
            });
        })
    });
}

fn bench_write_concurrent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("write_concurrent_4_tasks_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Store::new(Duration::from_secs(60));
                let mut handles = Vec::new();

                for t in 0..4 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        for i in 0..2_500 {
                            store.write(format!("key:{t}:{i}"), Bytes::from_static(b"v"));
                        }
                    }));
                }

                for h in handles {
                    h.await.unwrap();
                }
            });
        })
    });
}

fn bench_write_take(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("write_take_1k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Store::new(Duration::from_secs(60));
                for i in 0..1_000 {
                    store.write(format!("key:{i}"), Bytes::from_static(b"v"));
                }
                for i in 0..1_000 {
                    black_box(store.take(&format!("key:{i}")));
                }
            });
        })
    });
}

criterion_group!(
    benches,
    bench_write_read_sequential,
    bench_overwrite_same_key,
    bench_write_concurrent,
    bench_write_take,
);
criterion_main!(benches);
