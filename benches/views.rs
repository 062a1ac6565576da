/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Benchmarks of the hot view paths: element addressing, iteration over
//! packed and strided layouts, and the restructuring casts.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use ndspan::{Array, Geo, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIDE: isize = 256;

fn square(rng: &mut StdRng) -> Array<f32, Geo<2, 2>> {
    let data: Vec<f32> = (0..SIDE * SIDE).map(|_| rng.random()).collect();
    Array::from_vec(Vector::from([SIDE, SIDE]), data).unwrap()
}

fn benchmark_indexing(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc0ff33);
    let a = square(&mut rng);

    let mut group = c.benchmark_group("indexing");

    group.bench_function("full-tuple", |f| {
        f.iter(|| {
            let mut total = 0.0f32;
            for i in 0..SIDE {
                for j in 0..SIDE {
                    total += a[[i, j]];
                }
            }
            black_box(total)
        })
    });

    group.bench_function("row-then-column", |f| {
        f.iter(|| {
            let mut total = 0.0f32;
            for i in 0..SIDE {
                let row = a.sub(i);
                for j in 0..SIDE {
                    total += row[j];
                }
            }
            black_box(total)
        })
    });

    group.finish();
}

fn benchmark_iteration(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc0ff33);
    let a = square(&mut rng);
    let t = a.transposed();

    let mut group = c.benchmark_group("iteration");

    group.bench_function("packed-slice", |f| {
        f.iter(|| black_box(a.as_slice().unwrap().iter().sum::<f32>()))
    });

    group.bench_function("packed-elements", |f| {
        f.iter(|| black_box(a.iter().sum::<f32>()))
    });

    group.bench_function("transposed-elements", |f| {
        f.iter(|| black_box(t.iter().sum::<f32>()))
    });

    group.bench_function("outer-rows", |f| {
        f.iter(|| {
            let mut total = 0.0f32;
            for row in a.outer_iter() {
                total += row.iter().sum::<f32>();
            }
            black_box(total)
        })
    });

    group.finish();
}

fn benchmark_restructuring(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc0ff33);
    let a = square(&mut rng);
    let relaxed = a.relaxed();

    let mut group = c.benchmark_group("restructuring");

    group.bench_function("transpose", |f| {
        f.iter(|| black_box(a.transposed().shape()))
    });

    group.bench_function("dynamic-cast", |f| {
        f.iter(|| {
            let packed = relaxed.dynamic_dimension_cast::<Geo<2, 2>>();
            black_box(packed.is_empty())
        })
    });

    group.bench_function("copy-transposed", |f| {
        f.iter(|| black_box(a.transposed().to_dense()))
    });

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(5));
    targets = benchmark_indexing, benchmark_iteration, benchmark_restructuring,
);
criterion_main!(benches);
