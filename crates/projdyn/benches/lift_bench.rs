//! Criterion benchmarks for lifting and preimages.
//! Focus: one seed at increasing precision, the full periodic search, and
//! preimage closure on the 29/16 quadratic.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use projdyn::api::{all_rational_preimages, rational_periodic_points, rational_preimages};
use projdyn::arith::PrimeField;
use projdyn::lifting::{HeightBound, Lifter};
use projdyn::preimage::ClosureCfg;
use projdyn::space::{parse_point, FpPoint};
use projdyn::{Endomorphism, PeriodicCfg};

fn three_cycle_map() -> Endomorphism {
    Endomorphism::parse(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]).expect("valid map")
}

fn bench_lift(c: &mut Criterion) {
    let f = three_cycle_map();
    let bound = HeightBound::compute(&f).expect("degree 2");
    let seed = FpPoint::new(PrimeField::new(23), vec![7, 1]).expect("nonzero");
    let mut group = c.benchmark_group("lift");
    for &extra in &[0u32, 4, 8] {
        let base = Lifter::new(&f, 23, &bound);
        let lifter = base.clone().with_precision(base.precision() + extra);
        group.bench_with_input(
            BenchmarkId::new("lift_seed", lifter.precision()),
            &lifter,
            |b, lifter| {
                b.iter(|| {
                    let _out = lifter.lift_seed(&seed, 3).expect("lift");
                })
            },
        );
    }
    let cfg = PeriodicCfg {
        workers: 1,
        ..PeriodicCfg::default()
    };
    group.bench_function("rational_periodic_points", |b| {
        b.iter(|| {
            let _pts = rational_periodic_points(&f, &cfg).expect("periodic points");
        })
    });
    let q = parse_point("(-1/4 : 1)").expect("point");
    group.bench_function("rational_preimages", |b| {
        b.iter(|| {
            let _pre = rational_preimages(&f, &q).expect("preimages");
        })
    });
    group.bench_function("closure", |b| {
        b.iter(|| {
            let _out = all_rational_preimages(&f, std::slice::from_ref(&q), ClosureCfg::default())
                .expect("closure");
        })
    });
    group.finish();
}

criterion_group!(benches, bench_lift);
criterion_main!(benches);
