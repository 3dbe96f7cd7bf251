//! Programmatic construction of a [`CostModel`].
//!
//! The text parser in [`crate::parse`] is a thin client of this builder, so
//! embedders that already hold workload metadata in memory skip the text
//! format entirely.
//!
//! Name collisions and dangling ids are programmer errors here and panic;
//! the parser performs its own checks first and reports them as
//! [`crate::error::ParseError`] with line numbers.

use rustc_hash::FxHashMap;

use crate::cost::{CostModel, CostOracle};
use crate::model::{Cost, CostRow, Index, IndexId, Query};

pub struct CostModelBuilder {
    indexes: Vec<Index>,
    index_names: FxHashMap<String, IndexId>,
    queries: Vec<Query>,
    query_names: FxHashMap<String, usize>,
    storage_constraint: Cost,
    source: Vec<IndexId>,
    destination: Vec<IndexId>,
    oracle: Option<Box<dyn CostOracle>>,
}

impl CostModelBuilder {
    pub fn new() -> Self {
        CostModelBuilder {
            indexes: Vec::new(),
            index_names: FxHashMap::default(),
            queries: Vec::new(),
            query_names: FxHashMap::default(),
            storage_constraint: 0.0,
            source: Vec::new(),
            destination: Vec::new(),
            oracle: None,
        }
    }

    /// Declare a candidate index; returns its id.
    ///
    /// # Panics
    /// Panics on a duplicate name or a negative cost.
    pub fn add_index(
        &mut self,
        name: impl Into<String>,
        create_cost: Cost,
        drop_cost: Cost,
        storage_cost: Cost,
    ) -> IndexId {
        let name = name.into();
        assert!(
            create_cost >= 0.0 && drop_cost >= 0.0 && storage_cost >= 0.0,
            "index costs must be non-negative"
        );
        let id = self.indexes.len();
        let previous = self.index_names.insert(name.clone(), id);
        assert!(previous.is_none(), "duplicate index `{name}`");
        self.indexes.push(Index {
            name,
            create_cost,
            drop_cost,
            storage_cost,
        });
        id
    }

    /// Append a query to the workload sequence; returns its position.
    ///
    /// # Panics
    /// Panics on a duplicate name or an out-of-range relevant index.
    pub fn add_query(
        &mut self,
        name: impl Into<String>,
        cost_without_index: Cost,
        mut relevant: Vec<IndexId>,
    ) -> usize {
        let name = name.into();
        for &idx in &relevant {
            assert!(idx < self.indexes.len(), "unknown index id {idx} in query `{name}`");
        }
        relevant.sort_unstable();
        relevant.dedup();
        let id = self.queries.len();
        let previous = self.query_names.insert(name.clone(), id);
        assert!(previous.is_none(), "duplicate query `{name}`");
        self.queries.push(Query {
            id,
            name,
            cost_without_index,
            relevant,
            cost_rows: Vec::new(),
        });
        id
    }

    /// Attach a precomputed cost row to a query.
    pub fn add_cost_row(&mut self, query: usize, mut indexes: Vec<IndexId>, cost: Cost) {
        for &idx in &indexes {
            assert!(idx < self.indexes.len(), "unknown index id {idx} in cost row");
        }
        indexes.sort_unstable();
        indexes.dedup();
        self.queries[query].cost_rows.push(CostRow { indexes, cost });
    }

    pub fn index_id(&self, name: &str) -> Option<IndexId> {
        self.index_names.get(name).copied()
    }

    pub fn query_id(&self, name: &str) -> Option<usize> {
        self.query_names.get(name).copied()
    }

    /// Global storage budget; `<= 0` means unconstrained.
    pub fn with_storage_constraint(mut self, constraint: Cost) -> Self {
        self.storage_constraint = constraint;
        self
    }

    /// Boundary configuration the schedule starts from (defaults to empty).
    pub fn with_source(mut self, indexes: Vec<IndexId>) -> Self {
        self.source = indexes;
        self
    }

    /// Boundary configuration the schedule must end in (defaults to empty).
    pub fn with_destination(mut self, indexes: Vec<IndexId>) -> Self {
        self.destination = indexes;
        self
    }

    /// Route query costs through a live what-if oracle instead of the
    /// precomputed cost rows.
    pub fn with_oracle(mut self, oracle: Box<dyn CostOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn build(self) -> CostModel {
        CostModel::new(
            self.indexes,
            self.queries,
            self.storage_constraint,
            self.source,
            self.destination,
            self.oracle,
        )
    }
}

impl Default for CostModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_model_with_boundaries() {
        let mut b = CostModelBuilder::new();
        let i0 = b.add_index("I0", 1.0, 1.0, 2.0);
        let i1 = b.add_index("I1", 1.0, 1.0, 2.0);
        b.add_query("Q0", 10.0, vec![i1, i0, i0]);
        let model = b
            .with_storage_constraint(4.0)
            .with_source(vec![i0])
            .with_destination(vec![i0, i1])
            .build();
        assert_eq!(model.space().members(model.source()), &[0]);
        assert_eq!(model.space().members(model.destination()), &[0, 1]);
        // relevant sets come out sorted and deduplicated
        assert_eq!(model.queries()[0].relevant, vec![0, 1]);
    }

    #[test]
    #[should_panic(expected = "duplicate index")]
    fn duplicate_index_names_panic() {
        let mut b = CostModelBuilder::new();
        b.add_index("I0", 1.0, 1.0, 1.0);
        b.add_index("I0", 2.0, 2.0, 2.0);
    }

    #[test]
    #[should_panic(expected = "duplicate query")]
    fn duplicate_query_names_panic() {
        let mut b = CostModelBuilder::new();
        b.add_query("Q0", 1.0, vec![]);
        b.add_query("Q0", 1.0, vec![]);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_costs_panic() {
        let mut b = CostModelBuilder::new();
        b.add_index("I0", -1.0, 1.0, 1.0);
    }
}
