//! Reconciliation of way skeletons against their node geometry
//!
//! Takes whatever elements the batched queries managed to return and resolves
//! each requested building id into a materialized footprint, or classifies it
//! as errored. Pure and total: every input id lands in exactly one of the two
//! outputs, and the same input always produces the same split.

use std::collections::{BTreeSet, HashMap};

use crate::core::model::{Building, Node, RawElement, Way};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Buildings with a fully resolved, non-empty node list
    pub buildings: Vec<Building>,

    /// Building ids that could not be resolved from `elements`
    pub errored: BTreeSet<u64>,
}

/// Resolve each building id against the returned elements.
///
/// The element list is demultiplexed once into nodes-by-id and ways-by-id
/// maps. Duplicate ids across overlapping batches are harmless; the last
/// occurrence in scan order wins. A building errors when its way is missing
/// entirely or when none of the way's node ids resolve to coordinates;
/// individually unresolvable node ids are skipped, not fatal.
pub fn reconcile(building_ids: &[u64], elements: &[RawElement]) -> Reconciliation {
    let mut nodes_by_id: HashMap<u64, &Node> = HashMap::new();
    let mut ways_by_id: HashMap<u64, &Way> = HashMap::new();

    for element in elements {
        match element {
            RawElement::Node(node) => {
                nodes_by_id.insert(node.id, node);
            }
            RawElement::Way(way) => {
                ways_by_id.insert(way.id, way);
            }
        }
    }

    let mut buildings = Vec::new();
    let mut errored = BTreeSet::new();

    for &id in building_ids {
        let Some(way) = ways_by_id.get(&id) else {
            errored.insert(id);
            continue;
        };

        let nodes: Vec<Node> = way
            .nodes
            .iter()
            .filter_map(|node_id| nodes_by_id.get(node_id).map(|&&node| node))
            .collect();

        if nodes.is_empty() {
            errored.insert(id);
        } else {
            buildings.push(Building { id: way.id, nodes });
        }
    }

    Reconciliation {
        buildings,
        errored,
    }
}
