//! Rational periodic and preperiodic points of endomorphisms of Pᴺ over ℚ.
//!
//! Pipeline: bound the possible periods by reducing modulo many primes
//! (`reduction`), lift the cycles found modulo one prime to p-adic precision
//! and round them to rational points (`lifting`), close the periodic points
//! under rational preimages (`preimage`), then assemble the orbit graph
//! (`graph`). `arith` holds the exact arithmetic all of this runs on.
//!
//! References
//! - B. Hutz, "Determination of all rational preperiodic points for morphisms
//!   of PN", Math. Comp. 84 (2015).
//!
//! API Policy
//! - `api` is the curated surface; the module paths below it may change.

pub mod api;
pub mod arith;
pub mod cfg;
pub mod error;
pub mod graph;
pub mod lifting;
pub mod linearize;
pub mod preimage;
pub mod reduction;
pub mod space;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::PeriodicCfg;
pub use error::{DynamicsError, Result};
pub use space::{Endomorphism, ProjectivePoint};

/// Common exports for callers.
pub mod prelude {
    pub use crate::api::{
        all_rational_preimages, connected_rational_component, cyclegraph, height_bound,
        multiplier, possible_periods, rational_periodic_points, rational_preimages,
        rational_preperiodic_graph, rational_preperiodic_points, ClosureCfg, PrimeRange,
    };
    pub use crate::cfg::PeriodicCfg;
    pub use crate::error::{DynamicsError, Result};
    pub use crate::graph::CycleGraph;
    pub use crate::space::{parse_point, Endomorphism, FpPoint, ProjectivePoint, SelfMap};
}
