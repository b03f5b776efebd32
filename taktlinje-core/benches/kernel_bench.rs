#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use taktlinje_config::{DistKind, DistSpec, LineConfig};
use taktlinje_core::kernel::{HeapKernel, Kernel, OrderedKernel};

fn bench_line() -> LineConfig {
    LineConfig {
        n_stations: 5,
        buffer_caps: vec![4, 4, 4, 4],
        proc_means: vec![2.0, 2.5, 3.0, 2.5, 2.0],
        proc_dists: DistSpec::All(DistKind::Exp),
        util_alpha: 0.1,
        fail_rate: 0.05,
        repair_time: 8.0,
        workers: 2,
    }
}

/// Run a seeded episode to completion on both queue backends.
fn benchmark_run_to_finish(c: &mut Criterion) {
    let config = bench_line();
    let n_jobs = 1_000;
    let seed = 42;

    c.bench_function("run_to_finish_heap", |b| {
        b.iter(|| {
            let mut kernel = HeapKernel::new(&config).unwrap();
            kernel.reset(Some(seed), n_jobs);
            black_box(kernel.run_to_finish());
        })
    });

    c.bench_function("run_to_finish_ordered", |b| {
        b.iter(|| {
            let mut kernel = OrderedKernel::new(&config).unwrap();
            kernel.reset(Some(seed), n_jobs);
            black_box(kernel.run_to_finish());
        })
    });
}

criterion_group!(benches, benchmark_run_to_finish);
criterion_main!(benches);
