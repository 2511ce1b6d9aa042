//! Possible periods of a split map of P² as the prime range grows.
//!
//! Purpose
//! - Show how intersecting over more primes tightens the candidate set, and
//!   what each step costs.
//!
//! References
//! - Code: crates/projdyn/src/reduction/intersect.rs::possible_periods

use std::time::Instant;

use projdyn::cfg::default_workers;
use projdyn::reduction::{possible_periods, reduce_and_classify, PrimeRange};
use projdyn::Endomorphism;

fn main() {
    let f = Endomorphism::parse(
        &["x", "y", "z"],
        &["x^2 - 21/16*z^2", "y^2 - 2*z^2", "z^2"],
    )
    .expect("valid map");
    println!("map={f}");

    for p in [3u64, 5, 7] {
        let report = reduce_and_classify(&f, p).expect("good prime");
        println!("p={p} cycles={} periods={:?}", report.cycles.len(), report.periods());
    }

    let workers = default_workers();
    for hi in [10u64, 20, 40, 80] {
        let start = Instant::now();
        let periods = possible_periods(&f, PrimeRange::from(hi), &[], workers).expect("good primes");
        let elapsed = start.elapsed().as_secs_f64() * 1e3;
        println!("primes<= {hi} periods={periods:?} workers={workers} time_ms={elapsed:.1}");
    }
}
