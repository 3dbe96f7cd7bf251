//! Core data model: candidate indexes, workload queries, and interned
//! index configurations.
//!
//! A [`Configuration`] is an immutable, order-irrelevant set of indexes.
//! Configurations are deduplicated by their sorted member vector inside a
//! [`ConfigSpace`], so the rest of the crate passes around cheap [`ConfigId`]
//! handles and uses handle equality where set equality is meant. This keeps
//! the transition-cost and query-cost memo tables correct under a by-value
//! representation.

use rustc_hash::FxHashMap;

/// All costs in this crate are non-negative `f64` values; `f64::INFINITY`
/// is the sentinel for an infeasible cumulative cost.
pub type Cost = f64;

/// Position of an index in the cost model's index table.
pub type IndexId = usize;

/// One candidate physical index. Immutable once the cost model is built;
/// the bookkeeping the splitter needs lives in a per-pass side table, not
/// here.
#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub create_cost: Cost,
    pub drop_cost: Cost,
    pub storage_cost: Cost,
}

/// One row of a query's precomputed cost table: the cost of the query when
/// at least `indexes` (sorted) are materialized.
#[derive(Debug, Clone)]
pub struct CostRow {
    pub indexes: Vec<IndexId>,
    pub cost: Cost,
}

/// One workload statement. `id` is the ordinal position in the workload
/// sequence and is strictly increasing along it; several components assert
/// this precondition.
#[derive(Debug, Clone)]
pub struct Query {
    pub id: usize,
    pub name: String,
    pub cost_without_index: Cost,
    /// Indexes relevant to this query, sorted.
    pub relevant: Vec<IndexId>,
    /// Precomputed cost rows; ignored when a live oracle is configured.
    pub cost_rows: Vec<CostRow>,
}

/// Interned handle to a configuration. Two handles are equal iff their
/// member sets are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(u32);

/// The deduplicating store of configurations.
///
/// The empty configuration is interned at construction and always has the
/// same handle, [`ConfigSpace::EMPTY`].
#[derive(Debug)]
pub struct ConfigSpace {
    members: Vec<Vec<IndexId>>,
    storage: Vec<Cost>,
    interned: FxHashMap<Vec<IndexId>, ConfigId>,
}

impl ConfigSpace {
    /// Handle of the shared empty configuration.
    pub const EMPTY: ConfigId = ConfigId(0);

    pub fn new() -> Self {
        let mut space = ConfigSpace {
            members: Vec::new(),
            storage: Vec::new(),
            interned: FxHashMap::default(),
        };
        let empty = space.insert(Vec::new(), 0.0);
        debug_assert_eq!(empty, Self::EMPTY);
        space
    }

    /// Intern a member set (any order, duplicates allowed) and return its
    /// canonical handle. `indexes` supplies the storage costs.
    pub fn intern(&mut self, mut members: Vec<IndexId>, indexes: &[Index]) -> ConfigId {
        members.sort_unstable();
        members.dedup();
        if let Some(&id) = self.interned.get(&members) {
            return id;
        }
        let storage = members.iter().map(|&i| indexes[i].storage_cost).sum();
        self.insert(members, storage)
    }

    fn insert(&mut self, members: Vec<IndexId>, storage: Cost) -> ConfigId {
        let id = ConfigId(u32::try_from(self.members.len()).expect("configuration space exhausted"));
        self.interned.insert(members.clone(), id);
        self.members.push(members);
        self.storage.push(storage);
        id
    }

    /// Sorted member indexes of a configuration.
    pub fn members(&self, id: ConfigId) -> &[IndexId] {
        &self.members[id.0 as usize]
    }

    /// Sum of the members' storage costs.
    pub fn storage_cost(&self, id: ConfigId) -> Cost {
        self.storage[id.0 as usize]
    }

    pub fn index_count(&self, id: ConfigId) -> usize {
        self.members[id.0 as usize].len()
    }

    pub fn contains(&self, id: ConfigId, index: IndexId) -> bool {
        self.members(id).binary_search(&index).is_ok()
    }

    /// Set union of two configurations.
    pub fn combine(&mut self, a: ConfigId, b: ConfigId, indexes: &[Index]) -> ConfigId {
        if a == b {
            return a;
        }
        let mut merged = Vec::with_capacity(self.index_count(a) + self.index_count(b));
        merged.extend_from_slice(self.members(a));
        merged.extend_from_slice(self.members(b));
        self.intern(merged, indexes)
    }

    /// Number of interned configurations (the empty one included).
    pub fn config_count(&self) -> usize {
        self.members.len()
    }
}

impl Default for ConfigSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// True if every element of sorted `needle` occurs in sorted `haystack`.
pub(crate) fn is_sorted_subset(needle: &[IndexId], haystack: &[IndexId]) -> bool {
    let mut it = haystack.iter();
    'outer: for n in needle {
        for h in it.by_ref() {
            match h.cmp(n) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => continue 'outer,
                std::cmp::Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}
