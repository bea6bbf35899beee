//! Core network data structures.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tn_core::{LinkId, NodeId, SourceId};

use crate::profile::PowerProfile;

/// Role of a node in the thermal network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Finite thermal capacitance; temperature evolves with net heat flow.
    Mass,
    /// Fixed temperature acting as thermal ground.
    Reference,
}

/// A point in the network with a single temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// J/K; `Some` for every mass node, `None` for references.
    pub capacitance_j_per_k: Option<f64>,
    /// Initial temperature for masses, fixed temperature for references (K).
    pub temperature_k: f64,
}

impl Node {
    pub fn is_reference(&self) -> bool {
        self.kind == NodeKind::Reference
    }
}

/// Undirected conductive coupling between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub a: NodeId,
    pub b: NodeId,
    /// W/K, never negative.
    pub conductance_w_per_k: f64,
}

/// Heat injection into one mass node.
#[derive(Clone)]
pub struct Source {
    pub id: SourceId,
    pub node: NodeId,
    pub profile: Arc<dyn PowerProfile>,
}

impl Source {
    pub fn power_w(&self, t: f64) -> f64 {
        self.profile.power_w(t)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("profile", &self.profile.label())
            .finish()
    }
}

/// A validated, immutable thermal network.
///
/// Stores nodes, links and sources in vectors indexed by their IDs.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) sources: Vec<Source>,
    pub(crate) by_name: HashMap<String, NodeId>,
}

impl Network {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Number of nodes, references included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node handle by its unique name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    /// Mass nodes in insertion order.
    pub fn mass_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Mass)
    }

    pub fn mass_count(&self) -> usize {
        self.mass_nodes().count()
    }

    /// Temperature shared by every reference node (validated on build).
    pub fn reference_temperature_k(&self) -> f64 {
        self.nodes
            .iter()
            .find(|n| n.is_reference())
            .map(|n| n.temperature_k)
            .unwrap_or(f64::NAN)
    }

    /// Initial (or fixed) temperature of every node, indexed by node ID.
    pub fn initial_temperatures_k(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.temperature_k).collect()
    }
}
