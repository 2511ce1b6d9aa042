//! Preperiodic structure across the quadratic family x ↦ x² + c.
//!
//! Purpose
//! - Tabulate, for c = a/16 with small a, how many rational periodic and
//!   preperiodic points the map has and how long the search takes.
//! - A quick sanity probe: c = -29/16 must show a 3-cycle (Morton–Poonen
//!   examples), and no c in the range may show a rational 4-cycle.
//!
//! Why this shape
//! - One line per c in `key=value` form, so output greps and diffs cleanly.
//!
//! References
//! - Code: crates/projdyn/src/api.rs::rational_preperiodic_graph

use std::time::Instant;

use projdyn::api::rational_preperiodic_graph;
use projdyn::{Endomorphism, PeriodicCfg};

fn main() {
    let cfg = PeriodicCfg::default();
    for a in -40i64..=8 {
        let forms = [format!("16*x^2 + {a}*y^2"), "16*y^2".to_string()];
        let forms: Vec<&str> = forms.iter().map(String::as_str).collect();
        let f = Endomorphism::parse(&["x", "y"], &forms).expect("quadratic polynomials are morphisms");

        let start = Instant::now();
        let graph = rational_preperiodic_graph(&f, &cfg).expect("search succeeds");
        let elapsed = start.elapsed().as_secs_f64() * 1e3;

        let mut cycle_lengths: Vec<usize> = graph.cycles().iter().map(Vec::len).collect();
        cycle_lengths.sort_unstable();
        let periodic: usize = cycle_lengths.iter().sum();
        println!(
            "c={a}/16 preperiodic={} periodic={periodic} cycles={cycle_lengths:?} time_ms={elapsed:.1}",
            graph.len()
        );
        assert!(cycle_lengths.iter().all(|&n| n != 4), "rational 4-cycle for c={a}/16");
    }
}
