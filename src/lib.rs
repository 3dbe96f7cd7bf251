//! Sequential index-configuration scheduling for physical database design.
//!
//! Given an ordered workload of queries and a pool of candidate indexes,
//! this crate computes a cost-minimal sequence of index configurations
//! (one per query) under a global storage budget, where switching
//! configurations between consecutive queries pays index create/drop
//! costs.
//!
//! ## Core idea
//! 1. Model the schedule as a layered lattice: one [`lattice::Step`] per
//!    query, each holding candidate configurations.
//! 2. Run the Viterbi-style forward pass in [`solver`] to find the
//!    cheapest source-to-destination path.
//! 3. Keep the per-step candidate sets small: split the problem into
//!    independent groups ([`split`]), build paths one index at a time
//!    ([`greedy`]), union pairs of paths ([`unioner`]), and re-solve only
//!    the windows that break the budget ([`merge`]).
//!
//! Only the exhaustive strategy certifies optimality, and only while the
//! index pool is small enough to enumerate; the others are polynomial
//! approximations.
//!
//! ## Quick start
//! ```
//! use idxsched::{recommend, CostModelBuilder, Strategy};
//!
//! let mut b = CostModelBuilder::new();
//! let i0 = b.add_index("I0", 10.0, 2.0, 5.0);
//! let i1 = b.add_index("I1", 8.0, 1.0, 5.0);
//! let q0 = b.add_query("Q0", 100.0, vec![i0, i1]);
//! b.add_cost_row(q0, vec![i0], 40.0);
//! b.add_cost_row(q0, vec![i1], 60.0);
//! b.add_cost_row(q0, vec![i0, i1], 35.0);
//! let mut model = b.with_storage_constraint(8.0).build();
//!
//! let path = recommend(&mut model, Strategy::Exhaustive).unwrap();
//! assert_eq!(path.total_cost(), 52.0);
//! ```
//!
//! Workloads can also be read from the line-oriented cost-table format via
//! [`parse::parse_cost_table`], or fed by a live what-if optimizer through
//! the [`CostOracle`] trait.

pub mod advisor;
pub mod builder;
pub mod cost;
pub mod error;
pub mod greedy;
pub mod lattice;
pub mod merge;
pub mod model;
pub mod parse;
pub mod solver;
pub mod split;
pub mod unioner;

pub use crate::advisor::{recommend, Strategy};
pub use crate::builder::CostModelBuilder;
pub use crate::cost::{CostModel, CostOracle};
pub use crate::error::{Error, ParseError, Result};
pub use crate::model::{ConfigId, ConfigSpace, Cost, Index, IndexId, Query};
pub use crate::solver::{best_path, Path, PathEntry, Solver};
