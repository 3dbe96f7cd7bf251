//! End-to-end scheduling strategies.
//!
//! Every strategy builds lattices and hands them to the one solver kernel;
//! they differ only in how they keep the per-step candidate sets small.
//! `Exhaustive` is exact but limited to pools the bitmask enumeration can
//! handle; `Greedy` and `Partitioned` trade certified optimality for
//! polynomial work.

use crate::cost::CostModel;
use crate::error::Result;
use crate::greedy::{GreedyOptions, GreedyPathBuilder};
use crate::lattice::uniform_steps;
use crate::merge::merge_groups;
use crate::model::{ConfigId, IndexId};
use crate::solver::{best_path, Path, Solver};
use crate::split::split;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Full power-set enumeration per step; exact, O(n · 4^k), and rejected
    /// with an overflow error past 31 indexes.
    Exhaustive,
    /// Greedy incremental construction over the whole workload.
    Greedy,
    /// Split into independent groups, solve each greedily, merge under the
    /// global budget.
    Partitioned,
}

/// Compute a schedule with the given strategy and default greedy knobs.
pub fn recommend(model: &mut CostModel, strategy: Strategy) -> Result<Path> {
    match strategy {
        Strategy::Exhaustive => solve_exhaustive(model),
        Strategy::Greedy => solve_greedy(model, GreedyOptions::default()),
        Strategy::Partitioned => solve_partitioned(model, GreedyOptions::default()),
    }
}

/// Exact solve over the full feasible power set of the index pool.
pub fn solve_exhaustive(model: &mut CostModel) -> Result<Path> {
    let pool: Vec<IndexId> = (0..model.indexes().len()).collect();
    let candidates = model.all_configurations(&pool)?;
    let queries: Vec<usize> = (0..model.queries().len()).collect();
    let mut steps = uniform_steps(&queries, &candidates, model.source(), model.destination());
    Solver::new(model).solve(&mut steps)?;
    Ok(best_path(&mut steps))
}

/// Greedy incremental solve over the whole workload and index pool.
pub fn solve_greedy(model: &mut CostModel, opts: GreedyOptions) -> Result<Path> {
    let queries: Vec<usize> = (0..model.queries().len()).collect();
    let indexes: Vec<IndexId> = (0..model.indexes().len()).collect();
    let source = model.source();
    let destination = model.destination();
    let mut builder =
        GreedyPathBuilder::new(model, &queries, &indexes, source, destination, opts)?;
    builder.run(model)?;
    builder.finish(model)
}

/// Split the workload into independent groups, solve each greedily with
/// boundaries restricted to the group's indexes, and merge the results
/// under the global storage budget.
pub fn solve_partitioned(model: &mut CostModel, opts: GreedyOptions) -> Result<Path> {
    let groups = split(model);
    let mut solved = Vec::with_capacity(groups.len());
    for group in groups {
        let source = restrict_boundary(model, model.source(), &group.indexes);
        let destination = restrict_boundary(model, model.destination(), &group.indexes);
        let mut builder = GreedyPathBuilder::new(
            model,
            &group.queries,
            &group.indexes,
            source,
            destination,
            opts,
        )?;
        builder.run(model)?;
        let path = builder.finish(model)?;
        solved.push((group, path));
    }
    merge_groups(model, &solved)
}

/// A group's view of a boundary configuration: the members it shares with
/// the group's index set.
fn restrict_boundary(model: &mut CostModel, boundary: ConfigId, indexes: &[IndexId]) -> ConfigId {
    let members: Vec<IndexId> = model
        .space()
        .members(boundary)
        .iter()
        .copied()
        .filter(|idx| indexes.binary_search(idx).is_ok())
        .collect();
    model.config(members)
}
