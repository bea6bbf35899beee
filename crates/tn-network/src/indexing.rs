//! Stable indexing for solver integration.
//!
//! Maps mass nodes to contiguous state-vector positions (0..N) and back.
//! Reference nodes have no state position.

use tn_core::NodeId;

use crate::network::{Network, NodeKind};

/// Bidirectional map between mass `NodeId`s and state positions.
///
/// Positions follow node insertion order, so they are stable across runs of
/// the same network.
#[derive(Debug, Clone)]
pub struct StateIndex {
    /// position -> NodeId
    mass_ids: Vec<NodeId>,
    /// NodeId.index() -> position; None for references
    node_to_pos: Vec<Option<usize>>,
}

impl StateIndex {
    pub fn from_network(network: &Network) -> Self {
        let mut mass_ids = Vec::new();
        let mut node_to_pos = vec![None; network.nodes().len()];

        for node in network.nodes() {
            if node.kind == NodeKind::Mass {
                node_to_pos[node.id.index()] = Some(mass_ids.len());
                mass_ids.push(node.id);
            }
        }

        Self {
            mass_ids,
            node_to_pos,
        }
    }

    /// Number of state variables (mass nodes).
    pub fn len(&self) -> usize {
        self.mass_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass_ids.is_empty()
    }

    /// State position of a node, `None` for references or foreign IDs.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.node_to_pos.get(id.index()).copied().flatten()
    }

    pub fn node_at(&self, position: usize) -> Option<NodeId> {
        self.mass_ids.get(position).copied()
    }

    pub fn mass_ids(&self) -> &[NodeId] {
        &self.mass_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkBuilder;

    #[test]
    fn references_are_skipped() {
        let mut b = NetworkBuilder::new();
        b.add_reference("ground", 290.0).unwrap();
        b.add_mass("a", 1.0, 290.0).unwrap();
        b.add_reference("ground2", 290.0).unwrap();
        b.add_mass("b", 1.0, 290.0).unwrap();
        b.add_link("a", "ground", 1.0).unwrap();
        b.add_link("b", "ground2", 1.0).unwrap();
        let net = b.build().unwrap();

        let idx = StateIndex::from_network(&net);
        assert_eq!(idx.len(), 2);

        let a = net.node_id("a").unwrap();
        let b_id = net.node_id("b").unwrap();
        let g = net.node_id("ground").unwrap();
        assert_eq!(idx.position(a), Some(0));
        assert_eq!(idx.position(b_id), Some(1));
        assert_eq!(idx.position(g), None);
        assert_eq!(idx.node_at(1), Some(b_id));
        assert_eq!(idx.node_at(2), None);
    }
}
