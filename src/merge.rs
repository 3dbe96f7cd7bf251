//! Reassembling independently solved group paths into one global,
//! budget-feasible schedule.
//!
//! Each group's best path only mentions the group's own queries. The
//! merger pins every group's configuration onto the global query timeline,
//! fills the gaps between a group's consecutive occurrences (an index
//! present on both sides of a gap stays materialized across it), sums the
//! per-position storage, and re-solves every maximal window that exceeds
//! the global budget over just the indexes active inside it. The result is
//! globally feasible, though not globally optimal.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::cost::CostModel;
use crate::error::Result;
use crate::lattice::uniform_steps;
use crate::model::{Cost, IndexId};
use crate::solver::{best_path, Path, PathEntry, Solver};
use crate::split::Group;

/// Merge per-group best paths into a global schedule.
///
/// `solved` pairs each group with the path over exactly that group's
/// queries (boundaries included), ordered as [`crate::split::split`]
/// produced them.
pub fn merge_groups(model: &mut CostModel, solved: &[(Group, Path)]) -> Result<Path> {
    let n = model.queries().len();

    // per global position: the indexes each group keeps materialized there
    let mut active: Vec<FxHashSet<IndexId>> = vec![FxHashSet::default(); n];
    for (group, path) in solved {
        let interior = path.query_entries();
        assert_eq!(
            interior.len(),
            group.queries.len(),
            "group path does not cover the group's queries"
        );
        for (entry, &pos) in interior.iter().zip(&group.queries) {
            assert_eq!(
                entry.query,
                Some(pos),
                "group path visits a query outside its group"
            );
            for &idx in model.space().members(entry.config) {
                active[pos].insert(idx);
            }
        }
        // an index present immediately before and after a gap persists
        // through the skipped positions
        for pair in group.queries.windows(2) {
            let (before, after) = (pair[0], pair[1]);
            if after > before + 1 {
                let carried: Vec<IndexId> = active[before]
                    .iter()
                    .copied()
                    .filter(|idx| active[after].contains(idx))
                    .collect();
                for pos in before + 1..after {
                    active[pos].extend(carried.iter().copied());
                }
            }
        }
    }

    let budget = model.storage_constraint();
    if budget > 0.0 {
        let storage: Vec<Cost> = active
            .iter()
            .map(|set| {
                set.iter()
                    .map(|&idx| model.indexes()[idx].storage_cost)
                    .sum()
            })
            .collect();
        let mut pos = 0;
        while pos < n {
            if storage[pos] <= budget {
                pos += 1;
                continue;
            }
            let lo = pos;
            let mut hi = pos;
            while hi + 1 < n && storage[hi + 1] > budget {
                hi += 1;
            }
            resolve_window(model, &mut active, lo, hi)?;
            pos = hi + 1;
        }
    }

    assemble(model, &active)
}

/// Re-solve positions `lo..=hi` over the indexes active inside the window,
/// pinned to the configurations immediately before and after it.
fn resolve_window(
    model: &mut CostModel,
    active: &mut [FxHashSet<IndexId>],
    lo: usize,
    hi: usize,
) -> Result<()> {
    debug!(lo, hi, "re-solving over-budget window");
    let n = active.len();
    let source = if lo == 0 {
        model.source()
    } else {
        let members: Vec<IndexId> = active[lo - 1].iter().copied().collect();
        model.config(members)
    };
    let destination = if hi + 1 == n {
        model.destination()
    } else {
        let members: Vec<IndexId> = active[hi + 1].iter().copied().collect();
        model.config(members)
    };
    let mut window_indexes: Vec<IndexId> = active[lo..=hi]
        .iter()
        .flat_map(|set| set.iter().copied())
        .collect();
    window_indexes.sort_unstable();
    window_indexes.dedup();

    let candidates = model.all_configurations(&window_indexes)?;
    let queries: Vec<usize> = (lo..=hi).collect();
    let mut steps = uniform_steps(&queries, &candidates, source, destination);
    Solver::new(model).solve(&mut steps)?;
    let window_path = best_path(&mut steps);

    for (entry, slot) in window_path.query_entries().iter().zip(&mut active[lo..=hi]) {
        slot.clear();
        slot.extend(model.space().members(entry.config).iter().copied());
    }
    Ok(())
}

/// Turn the per-position index sets into a reported path with transition,
/// query, and cumulative costs.
fn assemble(model: &mut CostModel, active: &[FxHashSet<IndexId>]) -> Result<Path> {
    let mut entries = Vec::with_capacity(active.len() + 2);
    let mut previous = model.source();
    let mut cumulative = 0.0;
    entries.push(PathEntry {
        query: None,
        config: previous,
        cost_until: 0.0,
        transition_cost: 0.0,
        query_cost: 0.0,
    });
    for (pos, set) in active.iter().enumerate() {
        let members: Vec<IndexId> = set.iter().copied().collect();
        let config = model.config(members);
        let transition_cost = model.transition_cost(previous, config);
        let query_cost = model.query_cost(pos, config)?;
        cumulative += transition_cost + query_cost;
        entries.push(PathEntry {
            query: Some(pos),
            config,
            cost_until: cumulative,
            transition_cost,
            query_cost,
        });
        previous = config;
    }
    let destination = model.destination();
    let transition_cost = model.transition_cost(previous, destination);
    cumulative += transition_cost;
    entries.push(PathEntry {
        query: None,
        config: destination,
        cost_until: cumulative,
        transition_cost,
        query_cost: 0.0,
    });
    Ok(Path { entries })
}
