//! The cost model: owns the candidate indexes, the workload, the storage
//! budget, and every cost query the strategies ask.
//!
//! All memoization lives here as explicit maps keyed by interned
//! [`ConfigId`] handles. The caches carry no invariant beyond "a cached
//! value equals what a fresh computation would produce"; they are mutated
//! only by the single thread driving a solve.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::model::{is_sorted_subset, ConfigId, ConfigSpace, Cost, Index, IndexId, Query};

/// Largest index pool the bitmask-encoded power-set enumeration supports.
pub const MAX_ENUMERABLE_INDEXES: usize = 31;

/// External what-if optimizer consulted for query costs when no precomputed
/// table is available. The call is assumed synchronous and side-effect-free
/// on the database; errors are propagated unchanged and never retried here.
pub trait CostOracle {
    /// Cost of executing `query` when exactly `indexes` are materialized.
    fn cost(
        &mut self,
        query: &Query,
        indexes: &[&Index],
    ) -> std::result::Result<Cost, Box<dyn std::error::Error + Send + Sync>>;
}

/// Owns indexes, queries, the global storage constraint, and the cost
/// caches. Built through [`crate::builder::CostModelBuilder`] or the text
/// parser in [`crate::parse`].
pub struct CostModel {
    indexes: Vec<Index>,
    queries: Vec<Query>,
    space: ConfigSpace,
    /// Global storage budget; `<= 0` means unconstrained.
    storage_constraint: Cost,
    source: ConfigId,
    destination: ConfigId,
    oracle: Option<Box<dyn CostOracle>>,
    /// Memoized transition costs, one inner map per `from` configuration.
    transition_memo: FxHashMap<ConfigId, FxHashMap<ConfigId, Cost>>,
    query_memo: FxHashMap<(usize, ConfigId), Cost>,
}

impl std::fmt::Debug for CostModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostModel")
            .field("indexes", &self.indexes)
            .field("queries", &self.queries)
            .field("space", &self.space)
            .field("storage_constraint", &self.storage_constraint)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("oracle", &self.oracle.as_ref().map(|_| "<oracle>"))
            .field("transition_memo", &self.transition_memo)
            .field("query_memo", &self.query_memo)
            .finish()
    }
}

impl CostModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        indexes: Vec<Index>,
        queries: Vec<Query>,
        storage_constraint: Cost,
        source_members: Vec<IndexId>,
        destination_members: Vec<IndexId>,
        oracle: Option<Box<dyn CostOracle>>,
    ) -> Self {
        for (pos, q) in queries.iter().enumerate() {
            assert_eq!(q.id, pos, "query ids must match workload positions");
        }
        let mut space = ConfigSpace::new();
        let source = space.intern(source_members, &indexes);
        let destination = space.intern(destination_members, &indexes);
        CostModel {
            indexes,
            queries,
            space,
            storage_constraint,
            source,
            destination,
            oracle,
            transition_memo: FxHashMap::default(),
            query_memo: FxHashMap::default(),
        }
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn space(&self) -> &ConfigSpace {
        &self.space
    }

    pub fn storage_constraint(&self) -> Cost {
        self.storage_constraint
    }

    /// Boundary configuration the schedule starts from.
    pub fn source(&self) -> ConfigId {
        self.source
    }

    /// Boundary configuration the schedule must end in.
    pub fn destination(&self) -> ConfigId {
        self.destination
    }

    pub fn empty_config(&self) -> ConfigId {
        ConfigSpace::EMPTY
    }

    /// Intern the configuration with the given members.
    pub fn config(&mut self, members: impl IntoIterator<Item = IndexId>) -> ConfigId {
        self.space.intern(members.into_iter().collect(), &self.indexes)
    }

    /// Set union of two configurations.
    pub fn combine(&mut self, a: ConfigId, b: ConfigId) -> ConfigId {
        self.space.combine(a, b, &self.indexes)
    }

    /// True when `config` fits the global storage budget (a non-positive
    /// budget means unconstrained).
    pub fn within_budget(&self, config: ConfigId) -> bool {
        self.storage_constraint <= 0.0
            || self.space.storage_cost(config) <= self.storage_constraint
    }

    /// Every subset of `indexes` that fits the storage budget.
    ///
    /// Subsets are enumerated as machine-word bitmasks, so at most
    /// [`MAX_ENUMERABLE_INDEXES`] indexes are supported; larger pools are
    /// rejected with [`Error::Overflow`] and should go through the splitter
    /// and the greedy builder instead. The empty configuration is always
    /// the shared interned instance.
    pub fn all_configurations(&mut self, indexes: &[IndexId]) -> Result<Vec<ConfigId>> {
        if indexes.len() > MAX_ENUMERABLE_INDEXES {
            return Err(Error::Overflow(indexes.len()));
        }
        let mut out = Vec::with_capacity(1usize << indexes.len());
        for mask in 0u64..(1u64 << indexes.len()) {
            let members: Vec<IndexId> = indexes
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &idx)| idx)
                .collect();
            let id = self.config(members);
            if self.within_budget(id) && !out.contains(&id) {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Cost of switching from one configuration to another: the creation
    /// costs of the indexes gained plus the drop costs of the indexes lost.
    /// Memoized per `from` configuration.
    pub fn transition_cost(&mut self, from: ConfigId, to: ConfigId) -> Cost {
        if let Some(cached) = self.transition_memo.get(&from).and_then(|m| m.get(&to)) {
            return *cached;
        }
        let mut cost = 0.0;
        for &idx in self.space.members(to) {
            if !self.space.contains(from, idx) {
                cost += self.indexes[idx].create_cost;
            }
        }
        for &idx in self.space.members(from) {
            if !self.space.contains(to, idx) {
                cost += self.indexes[idx].drop_cost;
            }
        }
        self.transition_memo.entry(from).or_default().insert(to, cost);
        cost
    }

    /// Cost of executing the query at workload position `query` under
    /// `config`. Memoized per `(query, config)`.
    ///
    /// With a live oracle, the configuration is first restricted to the
    /// query's relevant indexes so equivalent configurations share a what-if
    /// call. Without one, the lowest-cost precomputed row whose required
    /// indexes are contained in `config` wins, defaulting to
    /// `cost_without_index` when none matches.
    pub fn query_cost(&mut self, query: usize, config: ConfigId) -> Result<Cost> {
        if let Some(&cached) = self.query_memo.get(&(query, config)) {
            return Ok(cached);
        }
        let q = &self.queries[query];
        let cost = match self.oracle.as_mut() {
            Some(oracle) => {
                let members: Vec<IndexId> = self
                    .space
                    .members(config)
                    .iter()
                    .copied()
                    .filter(|idx| q.relevant.binary_search(idx).is_ok())
                    .collect();
                let refs: Vec<&Index> = members.iter().map(|&idx| &self.indexes[idx]).collect();
                oracle.cost(q, &refs).map_err(|source| Error::Oracle {
                    query: q.name.clone(),
                    source,
                })?
            }
            None => {
                let members = self.space.members(config);
                q.cost_rows
                    .iter()
                    .filter(|row| is_sorted_subset(&row.indexes, members))
                    .map(|row| row.cost)
                    .fold(None, |best: Option<Cost>, c| {
                        Some(best.map_or(c, |b| b.min(c)))
                    })
                    .unwrap_or(q.cost_without_index)
            }
        };
        self.query_memo.insert((query, config), cost);
        Ok(cost)
    }

    /// Human-readable label for a configuration, e.g. `{I0,I2}`.
    pub fn config_label(&self, config: ConfigId) -> String {
        let names: Vec<&str> = self
            .space
            .members(config)
            .iter()
            .map(|&idx| self.indexes[idx].name.as_str())
            .collect();
        format!("{{{}}}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CostModelBuilder;

    /// The two-index, one-query model used in several places: I0 is cheaper
    /// to use, I1 cheaper to build, and both together blow the budget.
    fn demo_model() -> CostModel {
        let mut b = CostModelBuilder::new();
        let i0 = b.add_index("I0", 10.0, 2.0, 5.0);
        let i1 = b.add_index("I1", 8.0, 1.0, 5.0);
        let q0 = b.add_query("Q0", 100.0, vec![i0, i1]);
        b.add_cost_row(q0, vec![i0], 40.0);
        b.add_cost_row(q0, vec![i1], 60.0);
        b.add_cost_row(q0, vec![i0, i1], 35.0);
        b.with_storage_constraint(8.0).build()
    }

    #[test]
    fn power_set_has_two_to_the_k_configurations() {
        let mut b = CostModelBuilder::new();
        for k in 0..4 {
            b.add_index(format!("I{k}"), 1.0, 1.0, 1.0);
        }
        let mut model = b.build();
        let all = model.all_configurations(&[0, 1, 2, 3]).unwrap();
        assert_eq!(all.len(), 16);
        // handles are deduplicated, so distinct handles mean distinct sets
        let mut sorted = all.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 16);
    }

    #[test]
    fn storage_budget_filters_configurations() {
        let mut model = demo_model();
        let all = model.all_configurations(&[0, 1]).unwrap();
        // {I0,I1} has storage 10 > 8 and is filtered out
        assert_eq!(all.len(), 3);
        let both = model.config([0, 1]);
        assert!(!all.contains(&both));
    }

    #[test]
    fn non_positive_budget_means_unconstrained() {
        let mut b = CostModelBuilder::new();
        b.add_index("I0", 1.0, 1.0, 100.0);
        b.add_index("I1", 1.0, 1.0, 100.0);
        let mut model = b.with_storage_constraint(0.0).build();
        assert_eq!(model.all_configurations(&[0, 1]).unwrap().len(), 4);
    }

    #[test]
    fn enumeration_overflows_past_31_indexes() {
        let mut b = CostModelBuilder::new();
        for k in 0..32 {
            b.add_index(format!("I{k}"), 1.0, 1.0, 1.0);
        }
        let mut model = b.build();
        let pool: Vec<IndexId> = (0..32).collect();
        match model.all_configurations(&pool) {
            Err(Error::Overflow(32)) => {}
            other => panic!("expected Overflow(32), got {other:?}"),
        }
    }

    #[test]
    fn transition_to_self_is_free() {
        let mut model = demo_model();
        let configs = [
            model.empty_config(),
            model.config([0]),
            model.config([0, 1]),
        ];
        for c in configs {
            assert_eq!(model.transition_cost(c, c), 0.0);
        }
    }

    #[test]
    fn transition_sums_creates_and_drops() {
        let mut model = demo_model();
        let empty = model.empty_config();
        let i0 = model.config([0]);
        let i1 = model.config([1]);
        assert_eq!(model.transition_cost(empty, i0), 10.0);
        assert_eq!(model.transition_cost(i0, empty), 2.0);
        // swap I0 for I1: create I1 (8) + drop I0 (2)
        assert_eq!(model.transition_cost(i0, i1), 10.0);
        // memo hit returns the same value
        assert_eq!(model.transition_cost(i0, i1), 10.0);
    }

    #[test]
    fn query_cost_picks_cheapest_contained_row() {
        let mut model = demo_model();
        let empty = model.empty_config();
        let i0 = model.config([0]);
        let i1 = model.config([1]);
        let both = model.config([0, 1]);
        assert_eq!(model.query_cost(0, empty).unwrap(), 100.0);
        assert_eq!(model.query_cost(0, i0).unwrap(), 40.0);
        assert_eq!(model.query_cost(0, i1).unwrap(), 60.0);
        // {I0,I1} matches every row; the cheapest (35) wins
        assert_eq!(model.query_cost(0, both).unwrap(), 35.0);
    }

    struct FixedOracle(Cost);

    impl CostOracle for FixedOracle {
        fn cost(
            &mut self,
            _query: &Query,
            indexes: &[&Index],
        ) -> std::result::Result<Cost, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.0 - indexes.len() as Cost)
        }
    }

    struct FailingOracle;

    impl CostOracle for FailingOracle {
        fn cost(
            &mut self,
            _query: &Query,
            _indexes: &[&Index],
        ) -> std::result::Result<Cost, Box<dyn std::error::Error + Send + Sync>> {
            Err("connection reset".into())
        }
    }

    #[test]
    fn oracle_sees_only_relevant_indexes() {
        let mut b = CostModelBuilder::new();
        let i0 = b.add_index("I0", 1.0, 1.0, 1.0);
        let _i1 = b.add_index("I1", 1.0, 1.0, 1.0);
        b.add_query("Q0", 50.0, vec![i0]);
        let mut model = b.with_oracle(Box::new(FixedOracle(50.0))).build();
        // I1 is not relevant to Q0, so {I0,I1} restricts to {I0}
        let both = model.config([0, 1]);
        assert_eq!(model.query_cost(0, both).unwrap(), 49.0);
    }

    #[test]
    fn oracle_errors_propagate() {
        let mut b = CostModelBuilder::new();
        let i0 = b.add_index("I0", 1.0, 1.0, 1.0);
        b.add_query("Q0", 50.0, vec![i0]);
        let mut model = b.with_oracle(Box::new(FailingOracle)).build();
        let c = model.config([0]);
        match model.query_cost(0, c) {
            Err(Error::Oracle { query, .. }) => assert_eq!(query, "Q0"),
            other => panic!("expected oracle error, got {other:?}"),
        }
    }

    #[test]
    fn config_labels_use_index_names() {
        let mut model = demo_model();
        let both = model.config([0, 1]);
        assert_eq!(model.config_label(both), "{I0,I1}");
        assert_eq!(model.config_label(model.empty_config()), "{}");
    }
}
