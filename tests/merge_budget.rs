//! Merging two groups whose naive union of schedules blows the storage
//! budget must re-solve the offending window into a feasible one.

use idxsched::merge::merge_groups;
use idxsched::split::{split, Group};
use idxsched::{CostModel, CostModelBuilder, Path, PathEntry};

/// Two interleaved groups: A touches positions 0 and 2, B touches 1 and 3.
/// Each index is worth holding across its group's gap, but both together
/// exceed the budget.
fn interleaved_model() -> CostModel {
    let mut b = CostModelBuilder::new();
    let a = b.add_index("IA", 20.0, 20.0, 5.0);
    let ib = b.add_index("IB", 20.0, 20.0, 5.0);
    let q0 = b.add_query("Q0", 100.0, vec![a]);
    let q1 = b.add_query("Q1", 100.0, vec![ib]);
    let q2 = b.add_query("Q2", 100.0, vec![a]);
    let q3 = b.add_query("Q3", 100.0, vec![ib]);
    b.add_cost_row(q0, vec![a], 1.0);
    b.add_cost_row(q1, vec![ib], 1.0);
    b.add_cost_row(q2, vec![a], 1.0);
    b.add_cost_row(q3, vec![ib], 1.0);
    b.with_storage_constraint(8.0).build()
}

fn entry(query: Option<usize>, config: idxsched::ConfigId) -> PathEntry {
    PathEntry {
        query,
        config,
        cost_until: 0.0,
        transition_cost: 0.0,
        query_cost: 0.0,
    }
}

#[test]
fn over_budget_windows_are_resolved() {
    let mut model = interleaved_model();
    let empty = model.empty_config();
    let ca = model.config([0]);
    let cb = model.config([1]);

    // each group holds its index across both of its occurrences, which the
    // gap fill extends into the skipped position
    let group_a = Group {
        queries: vec![0, 2],
        indexes: vec![0],
    };
    let path_a = Path {
        entries: vec![
            entry(None, empty),
            entry(Some(0), ca),
            entry(Some(2), ca),
            entry(None, empty),
        ],
    };
    let group_b = Group {
        queries: vec![1, 3],
        indexes: vec![1],
    };
    let path_b = Path {
        entries: vec![
            entry(None, empty),
            entry(Some(1), cb),
            entry(Some(3), cb),
            entry(None, empty),
        ],
    };

    let merged = merge_groups(&mut model, &[(group_a, path_a), (group_b, path_b)]).unwrap();
    assert!(merged.is_feasible());
    assert_eq!(merged.entries.len(), 6);
    let budget = model.storage_constraint();
    for e in merged.query_entries() {
        let storage = model.space().storage_cost(e.config);
        assert!(
            storage <= budget + 1e-9,
            "position {:?} stores {storage} over budget {budget}",
            e.query
        );
    }
    // the naive union {IA,IB} (storage 10) can survive nowhere
    let both = model.config([0, 1]);
    assert!(merged.query_entries().iter().all(|e| e.config != both));
}

#[test]
fn within_budget_merges_are_left_alone() {
    // budget 10 fits both indexes at once; the gap-filled union survives
    let mut b = CostModelBuilder::new();
    let a = b.add_index("IA", 20.0, 20.0, 5.0);
    let ib = b.add_index("IB", 20.0, 20.0, 5.0);
    let q0 = b.add_query("Q0", 100.0, vec![a]);
    let q1 = b.add_query("Q1", 100.0, vec![ib]);
    let q2 = b.add_query("Q2", 100.0, vec![a]);
    b.add_cost_row(q0, vec![a], 1.0);
    b.add_cost_row(q1, vec![ib], 1.0);
    b.add_cost_row(q2, vec![a], 1.0);
    let mut model = b.with_storage_constraint(10.0).build();
    let empty = model.empty_config();
    let ca = model.config([0]);
    let cb = model.config([1]);

    let group_a = Group {
        queries: vec![0, 2],
        indexes: vec![0],
    };
    let path_a = Path {
        entries: vec![
            entry(None, empty),
            entry(Some(0), ca),
            entry(Some(2), ca),
            entry(None, empty),
        ],
    };
    let group_b = Group {
        queries: vec![1],
        indexes: vec![1],
    };
    let path_b = Path {
        entries: vec![
            entry(None, empty),
            entry(Some(1), cb),
            entry(None, empty),
        ],
    };

    let merged = merge_groups(&mut model, &[(group_a, path_a), (group_b, path_b)]).unwrap();
    let both = model.config([0, 1]);
    assert_eq!(merged.entries[2].config, both);
    // IA transitions once in and once out around the whole schedule
    assert_eq!(merged.entries[1].transition_cost, 20.0);
    assert_eq!(merged.entries[2].transition_cost, 20.0);
    assert_eq!(merged.entries[3].transition_cost, 20.0);
}

#[test]
fn splitter_and_merger_round_trip_the_workload() {
    let model = interleaved_model();
    let groups = split(&model);
    assert_eq!(groups.len(), 2);
    let mut queries: Vec<usize> = groups.iter().flat_map(|g| g.queries.clone()).collect();
    queries.sort_unstable();
    assert_eq!(queries, vec![0, 1, 2, 3]);
}
