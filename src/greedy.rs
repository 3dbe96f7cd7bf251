//! Greedy incremental path construction.
//!
//! Instead of enumerating the power set of the index pool, the builder
//! solves one trivial lattice per individual index (candidates `{∅,
//! {index}}` at every position), seeds a pool with the resulting paths,
//! and then repeatedly unions the pool's best path with each other path
//! via [`crate::unioner`], keeping the best combination. The per-position
//! configurations of every path that has been the pool best are
//! accumulated, and `finish` solves one final lattice over exactly that
//! accumulated candidate set.
//!
//! The result is a locally-improving, polynomial-time approximation, not a
//! certified optimum: the loop stops as soon as the best union fails to
//! strictly beat the current pool best, even if a momentarily
//! non-improving union could have helped later.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::cost::CostModel;
use crate::error::Result;
use crate::lattice::{uniform_steps, Step};
use crate::model::{ConfigId, IndexId};
use crate::solver::{best_path, Path, Solver};
use crate::unioner::union_paths;

/// Knobs for the greedy builder and its pairwise unions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyOptions {
    /// Cap on the index count of union configurations; `None` leaves the
    /// storage budget as the only guard.
    pub max_indexes_per_config: Option<usize>,
}

/// Incrementally builds a near-optimal path, one index at a time.
pub struct GreedyPathBuilder {
    queries: Vec<usize>,
    source: ConfigId,
    destination: ConfigId,
    pool: Vec<Path>,
    /// Per query position: every configuration ever accepted there.
    accepted: Vec<FxHashSet<ConfigId>>,
    opts: GreedyOptions,
}

impl GreedyPathBuilder {
    /// Solve one single-index lattice per entry of `indexes` and seed the
    /// pool and the accepted per-position sets with the results.
    ///
    /// `queries` are strictly increasing workload positions; `source` and
    /// `destination` are the boundary configurations every candidate path
    /// is pinned to.
    pub fn new(
        model: &mut CostModel,
        queries: &[usize],
        indexes: &[IndexId],
        source: ConfigId,
        destination: ConfigId,
        opts: GreedyOptions,
    ) -> Result<Self> {
        for pair in queries.windows(2) {
            assert!(
                pair[0] < pair[1],
                "query positions must strictly increase"
            );
        }
        let mut pool = Vec::with_capacity(indexes.len());
        for &index in indexes {
            // {∅} or {∅, {index}} once the budget filter has spoken
            let candidates = model.all_configurations(&[index])?;
            let mut steps = uniform_steps(queries, &candidates, source, destination);
            Solver::new(model).solve(&mut steps)?;
            pool.push(best_path(&mut steps));
        }

        let mut accepted = vec![FxHashSet::default(); queries.len()];
        for path in &pool {
            for (pos, entry) in path.query_entries().iter().enumerate() {
                accepted[pos].insert(entry.config);
            }
        }
        // with no indexes at all the only candidate anywhere is ∅
        if pool.is_empty() {
            let empty = model.empty_config();
            for set in &mut accepted {
                set.insert(empty);
            }
        }

        debug!(
            paths = pool.len(),
            queries = queries.len(),
            "seeded greedy pool with single-index paths"
        );
        Ok(GreedyPathBuilder {
            queries: queries.to_vec(),
            source,
            destination,
            pool,
            accepted,
            opts,
        })
    }

    /// One improvement iteration: fold the pool's best path into the
    /// accepted sets, union it with every other pooled path, and adopt the
    /// best combination if it strictly improves. Returns whether an
    /// improvement was adopted; `false` means the loop has converged.
    pub fn step(&mut self, model: &mut CostModel) -> Result<bool> {
        let Some(best_idx) = self.pool_best() else {
            return Ok(false);
        };
        self.fold(best_idx);
        if self.pool.len() < 2 {
            return Ok(false);
        }
        let best_cost = self.pool[best_idx].total_cost();

        let mut winner: Option<(usize, Path)> = None;
        for other in 0..self.pool.len() {
            if other == best_idx {
                continue;
            }
            let combined = union_paths(
                model,
                &self.pool[best_idx],
                &self.pool[other],
                self.opts.max_indexes_per_config,
            )?;
            let improves_winner = winner
                .as_ref()
                .map_or(true, |(_, w)| combined.total_cost() < w.total_cost());
            if improves_winner {
                winner = Some((other, combined));
            }
        }

        match winner {
            Some((other, combined)) if combined.total_cost() < best_cost => {
                trace!(
                    cost = combined.total_cost(),
                    previous = best_cost,
                    "adopted improving union path"
                );
                self.pool.remove(other);
                self.pool.push(combined);
                Ok(true)
            }
            _ => {
                trace!(cost = best_cost, "greedy pool converged");
                Ok(false)
            }
        }
    }

    /// Iterate [`GreedyPathBuilder::step`] to convergence.
    pub fn run(&mut self, model: &mut CostModel) -> Result<()> {
        while self.step(model)? {}
        Ok(())
    }

    /// Solve one final lattice whose per-position candidates are exactly
    /// the accepted configuration sets, and report its best path.
    pub fn finish(&mut self, model: &mut CostModel) -> Result<Path> {
        if let Some(best_idx) = self.pool_best() {
            self.fold(best_idx);
        }
        let mut steps = Vec::with_capacity(self.queries.len() + 2);
        steps.push(Step::boundary(self.source));
        for (pos, &query) in self.queries.iter().enumerate() {
            let mut candidates: Vec<ConfigId> = self.accepted[pos].iter().copied().collect();
            candidates.sort_unstable();
            steps.push(Step::for_query(query, candidates));
        }
        steps.push(Step::boundary(self.destination));
        Solver::new(model).solve(&mut steps)?;
        Ok(best_path(&mut steps))
    }

    /// Total cost of the cheapest pooled path, if any.
    pub fn best_cost(&self) -> Option<f64> {
        self.pool_best().map(|idx| self.pool[idx].total_cost())
    }

    /// Position of the cheapest pooled path, ties to the first.
    fn pool_best(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, path) in self.pool.iter().enumerate() {
            if best.map_or(true, |b| path.total_cost() < self.pool[b].total_cost()) {
                best = Some(idx);
            }
        }
        best
    }

    /// Fold a pooled path's per-position configurations into the accepted
    /// sets.
    fn fold(&mut self, pool_idx: usize) {
        for (pos, entry) in self.pool[pool_idx].query_entries().iter().enumerate() {
            self.accepted[pos].insert(entry.config);
        }
    }
}
