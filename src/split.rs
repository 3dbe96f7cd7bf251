//! Partitioning the workload into independent subproblems.
//!
//! Two indexes are related when some query's relevant-index set contains
//! both; the connected components of that co-usage relation (over indexes
//! and queries together) can be scheduled independently and merged
//! afterwards by [`crate::merge`].
//!
//! The transient marking state lives in a side table built per pass and
//! discarded with it, so independent solves never see each other's
//! bookkeeping.

use tracing::debug;

use crate::cost::CostModel;
use crate::model::IndexId;

/// One independent subproblem: the queries and indexes of a connected
/// component, both sorted. A query with no relevant indexes, or an index
/// used by no query, forms its own singleton group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub queries: Vec<usize>,
    pub indexes: Vec<IndexId>,
}

/// Compute the connected components of the co-usage relation.
///
/// Every query and every index ends up in exactly one group; a query
/// already claimed by a different group is an internal-consistency
/// violation and panics.
pub fn split(model: &CostModel) -> Vec<Group> {
    let n_indexes = model.indexes().len();
    let n_queries = model.queries().len();

    // side table: which queries use each index
    let mut used_by: Vec<Vec<usize>> = vec![Vec::new(); n_indexes];
    for (qi, query) in model.queries().iter().enumerate() {
        for &idx in &query.relevant {
            used_by[idx].push(qi);
        }
    }

    let mut index_group: Vec<Option<usize>> = vec![None; n_indexes];
    let mut query_group: Vec<Option<usize>> = vec![None; n_queries];
    let mut groups: Vec<Group> = Vec::new();

    for seed in 0..n_indexes {
        if index_group[seed].is_some() {
            continue;
        }
        let gid = groups.len();
        let mut group = Group {
            queries: Vec::new(),
            indexes: Vec::new(),
        };
        let mut stack = vec![seed];
        index_group[seed] = Some(gid);
        while let Some(idx) = stack.pop() {
            group.indexes.push(idx);
            for &qi in &used_by[idx] {
                match query_group[qi] {
                    Some(g) if g == gid => {}
                    Some(other) => panic!(
                        "query {} claimed by groups {other} and {gid}",
                        model.queries()[qi].name
                    ),
                    None => {
                        query_group[qi] = Some(gid);
                        group.queries.push(qi);
                        for &co in &model.queries()[qi].relevant {
                            if index_group[co].is_none() {
                                index_group[co] = Some(gid);
                                stack.push(co);
                            }
                        }
                    }
                }
            }
        }
        group.queries.sort_unstable();
        group.indexes.sort_unstable();
        groups.push(group);
    }

    // queries touching no index become singletons
    for qi in 0..n_queries {
        if query_group[qi].is_none() {
            query_group[qi] = Some(groups.len());
            groups.push(Group {
                queries: vec![qi],
                indexes: Vec::new(),
            });
        }
    }

    debug!(groups = groups.len(), "split workload into independent groups");
    groups
}
