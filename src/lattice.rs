//! The layered lattice the shortest-path solver runs over.
//!
//! A lattice is a sequence of [`Step`]s: a source boundary, one step per
//! workload query, and a destination boundary. Each step holds its
//! candidate configurations as [`StepConf`] cells in an arena `Vec`;
//! back-pointers are positions into the *previous* step's arena, never
//! further back, and are only ever traversed backward within a single
//! solve.

use crate::model::{ConfigId, Cost};

/// One DP cell: a candidate configuration at a step together with the
/// solver's bookkeeping for it.
#[derive(Debug, Clone)]
pub struct StepConf {
    pub config: ConfigId,
    /// Cumulative minimum cost to reach this cell; `f64::INFINITY` until
    /// solved, and still infinite if no predecessor is feasible.
    pub cost_until: Cost,
    /// Position of the predecessor cell in the previous step's arena, or
    /// `None` when infeasible (or at the source).
    pub back: Option<usize>,
    /// Transition cost that produced `cost_until`.
    pub transition_cost: Cost,
    /// Query cost that produced `cost_until`.
    pub query_cost: Cost,
    /// Set by path reconstruction for cells on the best path.
    pub on_best_path: bool,
}

impl StepConf {
    fn new(config: ConfigId) -> Self {
        StepConf {
            config,
            cost_until: Cost::INFINITY,
            back: None,
            transition_cost: 0.0,
            query_cost: 0.0,
            on_best_path: false,
        }
    }
}

/// One position in the lattice: a boundary (no query) or a query position
/// with its candidate configurations.
#[derive(Debug, Clone)]
pub struct Step {
    query: Option<usize>,
    boost: f64,
    confs: Vec<StepConf>,
}

impl Step {
    /// Boundary step holding exactly the given configuration.
    pub fn boundary(config: ConfigId) -> Self {
        Step {
            query: None,
            boost: 1.0,
            confs: vec![StepConf::new(config)],
        }
    }

    /// Step for the query at workload position `query` with the given
    /// candidate configurations (duplicates are dropped).
    ///
    /// # Panics
    /// Panics if `candidates` is empty; a query step must offer at least
    /// one configuration.
    pub fn for_query(query: usize, candidates: impl IntoIterator<Item = ConfigId>) -> Self {
        let mut confs: Vec<StepConf> = Vec::new();
        for c in candidates {
            if !confs.iter().any(|sc| sc.config == c) {
                confs.push(StepConf::new(c));
            }
        }
        assert!(!confs.is_empty(), "a query step needs at least one candidate configuration");
        Step {
            query: Some(query),
            boost: 1.0,
            confs,
        }
    }

    /// Scale this step's transition+query cost by `boost` during the solve.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Add a candidate configuration if not already present.
    pub fn add_candidate(&mut self, config: ConfigId) {
        if !self.confs.iter().any(|sc| sc.config == config) {
            self.confs.push(StepConf::new(config));
        }
    }

    /// Workload position of this step's query, `None` for boundaries.
    pub fn query(&self) -> Option<usize> {
        self.query
    }

    pub fn boost(&self) -> f64 {
        self.boost
    }

    pub fn confs(&self) -> &[StepConf] {
        &self.confs
    }

    pub(crate) fn confs_mut(&mut self) -> &mut [StepConf] {
        &mut self.confs
    }
}

/// Build the standard lattice: a source boundary, one step per entry of
/// `queries` (strictly increasing workload positions) all sharing the same
/// candidate set, and a destination boundary.
pub fn uniform_steps(
    queries: &[usize],
    candidates: &[ConfigId],
    source: ConfigId,
    destination: ConfigId,
) -> Vec<Step> {
    let mut steps = Vec::with_capacity(queries.len() + 2);
    steps.push(Step::boundary(source));
    for &q in queries {
        steps.push(Step::for_query(q, candidates.iter().copied()));
    }
    steps.push(Step::boundary(destination));
    steps
}
