//! Pairwise path unioning: combine two best paths over the same workload
//! into one that may mix their decisions.
//!
//! At every query position the combined lattice offers three candidates:
//! the first path's configuration, the second's, and their set union. The
//! union joins only when it fits the storage budget and, if configured, a
//! maximum index count. A single solver pass over this reduced lattice
//! yields the best combined path.

use crate::cost::CostModel;
use crate::error::Result;
use crate::lattice::Step;
use crate::solver::{best_path, Path, Solver};

/// Combine `a` and `b` into the best path over their per-position
/// candidates and unions.
///
/// # Panics
/// Panics when the two paths do not cover the same query sequence
/// position-by-position, or disagree on the boundary configurations;
/// both are internal-consistency violations.
pub fn union_paths(
    model: &mut CostModel,
    a: &Path,
    b: &Path,
    max_indexes: Option<usize>,
) -> Result<Path> {
    assert_eq!(
        a.entries.len(),
        b.entries.len(),
        "paths cover different workloads"
    );
    assert!(a.entries.len() >= 2, "paths must include both boundaries");
    for (ea, eb) in a.entries.iter().zip(&b.entries) {
        assert_eq!(ea.query, eb.query, "paths disagree on the query sequence");
    }
    assert_eq!(
        a.entries[0].config, b.entries[0].config,
        "paths start from different source configurations"
    );
    let last = a.entries.len() - 1;
    assert_eq!(
        a.entries[last].config, b.entries[last].config,
        "paths end in different destination configurations"
    );

    let mut steps = Vec::with_capacity(a.entries.len());
    steps.push(Step::boundary(a.entries[0].config));
    for pos in 1..last {
        let ca = a.entries[pos].config;
        let cb = b.entries[pos].config;
        let query = a.entries[pos]
            .query
            .expect("interior path positions carry queries");
        let mut step = Step::for_query(query, [ca, cb]);
        let union = model.combine(ca, cb);
        let within_count =
            max_indexes.map_or(true, |m| model.space().index_count(union) <= m);
        if model.within_budget(union) && within_count {
            step.add_candidate(union);
        }
        steps.push(step);
    }
    steps.push(Step::boundary(a.entries[last].config));

    Solver::new(model).solve(&mut steps)?;
    Ok(best_path(&mut steps))
}
