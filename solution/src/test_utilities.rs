use model::base_types::{ArcIdx, NodeIdx};
use model::network::ActivityNetwork;

use crate::column::Column;

/// The arcs connecting the given nodes, start and end node are added.
pub fn arcs_along(network: &ActivityNetwork, nodes: &[NodeIdx]) -> Vec<ArcIdx> {
    let mut path = vec![network.start()];
    path.extend_from_slice(nodes);
    path.push(network.end());
    path.windows(2)
        .map(|pair| network.arc_between(pair[0], pair[1]).unwrap())
        .collect()
}

pub fn column_along(network: &ActivityNetwork, nodes: &[NodeIdx]) -> Column {
    Column::new(network, arcs_along(network, nodes)).unwrap()
}
