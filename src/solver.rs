//! The layered shortest-path solver: a single forward Viterbi-style pass
//! over a configuration lattice, followed by a back-pointer walk.
//!
//! This is the one computational kernel in the crate; every higher-level
//! strategy (exhaustive, greedy, pairwise union, window re-solve) builds a
//! lattice and hands it here. Complexity is O(n · maxConfigsPerStep²),
//! which is exactly why those strategies exist.

use tracing::debug;

use crate::cost::CostModel;
use crate::error::Result;
use crate::lattice::Step;
use crate::model::{ConfigId, Cost};

/// Drives one forward pass over a lattice, borrowing the cost model for
/// its memoized cost queries.
pub struct Solver<'m> {
    model: &'m mut CostModel,
    /// Edges whose transition cost exceeds this are treated as disallowed.
    max_transition_cost: Option<Cost>,
}

impl<'m> Solver<'m> {
    pub fn new(model: &'m mut CostModel) -> Self {
        Solver {
            model,
            max_transition_cost: None,
        }
    }

    /// Disallow transitions costing more than `cutoff`.
    pub fn with_transition_cutoff(mut self, cutoff: Cost) -> Self {
        self.max_transition_cost = Some(cutoff);
        self
    }

    /// Solve the lattice in place: fill every cell's cumulative cost and
    /// back-pointer.
    ///
    /// # Panics
    /// Panics if the lattice lacks its two boundary steps or if query ids
    /// do not strictly increase along it.
    pub fn solve(&mut self, steps: &mut [Step]) -> Result<()> {
        assert!(steps.len() >= 2, "lattice needs source and destination boundaries");
        assert!(steps.first().unwrap().query().is_none(), "first step must be a boundary");
        assert!(steps.last().unwrap().query().is_none(), "last step must be a boundary");
        let mut prev_query = None;
        for step in steps.iter() {
            if let Some(q) = step.query() {
                assert!(
                    prev_query.map_or(true, |p| p < q),
                    "query ids must strictly increase along the lattice"
                );
                prev_query = Some(q);
            }
        }

        debug!(
            steps = steps.len(),
            max_width = steps.iter().map(|s| s.confs().len()).max().unwrap_or(0),
            "solving configuration lattice"
        );

        for sc in steps[0].confs_mut() {
            sc.cost_until = 0.0;
        }

        for i in 1..steps.len() {
            let (head, tail) = steps.split_at_mut(i);
            let prev = &head[i - 1];
            let cur = &mut tail[0];
            let query = cur.query();
            let boost = cur.boost();
            for sc in cur.confs_mut() {
                let query_cost = match query {
                    Some(q) => self.model.query_cost(q, sc.config)?,
                    None => 0.0,
                };
                let mut best = Cost::INFINITY;
                let mut best_back = None;
                let mut best_transition = 0.0;
                for (pi, pc) in prev.confs().iter().enumerate() {
                    if pc.cost_until.is_infinite() {
                        continue;
                    }
                    let transition = self.model.transition_cost(pc.config, sc.config);
                    if let Some(cutoff) = self.max_transition_cost {
                        if transition > cutoff {
                            continue;
                        }
                    }
                    let candidate = pc.cost_until + boost * (transition + query_cost);
                    if candidate < best {
                        best = candidate;
                        best_back = Some(pi);
                        best_transition = transition;
                    }
                }
                sc.cost_until = best;
                sc.back = best_back;
                if best_back.is_some() {
                    sc.transition_cost = best_transition;
                    sc.query_cost = query_cost;
                }
            }
        }
        Ok(())
    }
}

/// One position of a reconstructed best path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    /// Workload position of the query at this step, `None` at boundaries.
    pub query: Option<usize>,
    pub config: ConfigId,
    pub cost_until: Cost,
    pub transition_cost: Cost,
    pub query_cost: Cost,
}

/// An ordered best path from source to destination: per position, the
/// chosen configuration, its query cost, the transition cost from the
/// previous position, and the running cumulative cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub entries: Vec<PathEntry>,
}

impl Path {
    /// Total cost of the schedule; infinite when the lattice is infeasible.
    pub fn total_cost(&self) -> Cost {
        self.entries.last().map_or(Cost::INFINITY, |e| e.cost_until)
    }

    pub fn is_feasible(&self) -> bool {
        self.total_cost().is_finite()
    }

    /// Entries at query positions, boundaries excluded.
    pub fn query_entries(&self) -> &[PathEntry] {
        if self.entries.len() < 2 {
            &[]
        } else {
            &self.entries[1..self.entries.len() - 1]
        }
    }
}

/// Reconstruct the best path of a solved lattice, marking every visited
/// cell.
///
/// The destination step must hold exactly one candidate (the global
/// destination configuration). An infeasible lattice still yields a path:
/// the walk stops where the back-pointer chain ends and the final
/// cumulative cost is infinite, so callers detect infeasibility by
/// inspecting the cost rather than catching an error.
///
/// # Panics
/// Panics if the destination step holds more than one candidate.
pub fn best_path(steps: &mut [Step]) -> Path {
    let last = steps.len() - 1;
    assert_eq!(
        steps[last].confs().len(),
        1,
        "destination step must hold exactly one configuration"
    );
    let mut entries = Vec::with_capacity(steps.len());
    let mut step_idx = last;
    let mut conf_idx = 0usize;
    loop {
        let step = &mut steps[step_idx];
        let query = step.query();
        let sc = &mut step.confs_mut()[conf_idx];
        sc.on_best_path = true;
        entries.push(PathEntry {
            query,
            config: sc.config,
            cost_until: sc.cost_until,
            transition_cost: sc.transition_cost,
            query_cost: sc.query_cost,
        });
        match sc.back {
            Some(back) if step_idx > 0 => {
                conf_idx = back;
                step_idx -= 1;
            }
            _ => break,
        }
    }
    entries.reverse();
    Path { entries }
}
