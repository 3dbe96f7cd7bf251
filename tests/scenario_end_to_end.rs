//! The worked two-index scenario, driven end-to-end through the text
//! format and every strategy.

use idxsched::parse::parse_cost_table;
use idxsched::{recommend, Strategy};

const WORKLOAD: &str = "\
I0 10 2 5
I1 8 1 5
Q0 100 I0,I1
SEQ Q0
SOURCE
DESTINATION
STORAGE-CONSTRIANT 8
COST
Q0 I0 40
Q0 I1 60
Q0 I0,I1 35
";

#[test]
fn the_budget_excludes_the_two_index_configuration() {
    let mut model = parse_cost_table(WORKLOAD).unwrap();
    let all = model.all_configurations(&[0, 1]).unwrap();
    assert_eq!(all.len(), 3);
    let both = model.config([0, 1]);
    assert!(!all.contains(&both));
}

#[test]
fn every_strategy_schedules_i0_for_52() {
    for strategy in [Strategy::Exhaustive, Strategy::Greedy, Strategy::Partitioned] {
        let mut model = parse_cost_table(WORKLOAD).unwrap();
        let path = recommend(&mut model, strategy).unwrap();
        assert_eq!(path.total_cost(), 52.0, "strategy {strategy:?}");
        assert_eq!(path.entries.len(), 3);
        let i0 = model.config([0]);
        let empty = model.empty_config();
        assert_eq!(path.entries[0].config, empty);
        assert_eq!(path.entries[1].config, i0);
        assert_eq!(path.entries[1].transition_cost, 10.0);
        assert_eq!(path.entries[1].query_cost, 40.0);
        assert_eq!(path.entries[2].config, empty);
        assert_eq!(path.entries[2].transition_cost, 2.0);
    }
}

#[test]
fn boundary_configurations_are_honored() {
    let text = "\
I0 10 2 5
I1 8 1 5
Q0 100 I0,I1
SOURCE I0
DESTINATION I1
STORAGE-CONSTRIANT 8
COST
Q0 I0 40
Q0 I1 60
";
    let mut model = parse_cost_table(text).unwrap();
    let path = recommend(&mut model, Strategy::Exhaustive).unwrap();
    assert_eq!(path.entries[0].config, model.config([0]));
    assert_eq!(path.entries.last().unwrap().config, model.config([1]));
    // I0 is already materialized: run Q0 on it (40), then swap to I1
    // (drop 2 + create 8) at the destination
    assert_eq!(path.total_cost(), 50.0);
}

#[test]
fn an_unconstrained_budget_admits_everything() {
    let text = "\
I0 10 2 5
I1 8 1 5
Q0 100 I0,I1
STORAGE-CONSTRIANT 0
COST
Q0 I0,I1 35
";
    let mut model = parse_cost_table(text).unwrap();
    assert_eq!(model.all_configurations(&[0, 1]).unwrap().len(), 4);
    let path = recommend(&mut model, Strategy::Exhaustive).unwrap();
    // both indexes together: create 18 + query 35 + drop 3
    assert_eq!(path.total_cost(), 56.0);
}
