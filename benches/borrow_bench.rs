use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use runtime_borrows::{Owner, SharedView};
use std::time::Duration;

fn bench_owner_get(c: &mut Criterion) {
    c.bench_function("owner_get", |b| {
        let owner = Owner::new(42u64);
        b.iter(|| black_box(*owner.get()))
    });
}

fn bench_shared_borrow_release(c: &mut Criterion) {
    c.bench_function("shared_borrow_release", |b| {
        let owner = Owner::new(42u64);
        b.iter(|| {
            let v = owner.borrow();
            black_box(*v.get())
        })
    });
}

fn bench_exclusive_borrow_write(c: &mut Criterion) {
    c.bench_function("exclusive_borrow_write", |b| {
        let mut owner = Owner::new(0u64);
        b.iter(|| {
            let mut w = owner.borrow_mut();
            let next = w.get().wrapping_add(1);
            *w.get_mut() = next;
        });
        black_box(*owner.get());
    });
}

fn bench_many_readers(c: &mut Criterion) {
    c.bench_function("shared_fan_out_1k", |b| {
        let owner = Owner::new(vec![0u8; 64]);
        b.iter(|| {
            let views: Vec<SharedView<Vec<u8>>> = (0..1_000).map(|_| owner.borrow()).collect();
            black_box(views.iter().map(|v| v.len()).sum::<usize>())
        })
    });
}

fn bench_delegate_cycle(c: &mut Criterion) {
    c.bench_function("owner_delegate_drop", |b| {
        b.iter_batched(
            || Owner::new(String::from("payload")),
            |mut owner| {
                let token = owner.delegate();
                black_box(token.get().len());
                drop(token);
                owner
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_owner_get,
        bench_shared_borrow_release,
        bench_exclusive_borrow_write,
        bench_many_readers,
        bench_delegate_cycle
}
criterion_main!(benches);
