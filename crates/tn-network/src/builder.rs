//! Incremental network builder.

use std::collections::HashMap;
use std::sync::Arc;

use tn_core::{LinkId, NodeId, SourceId, ensure_non_negative, ensure_positive};

use crate::error::{NetworkError, NetworkResult};
use crate::network::{Link, Network, Node, NodeKind, Source};
use crate::profile::{Constant, PowerProfile};
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Every `add_*` call checks its own arguments and fails immediately on a bad
/// value. Whole-network rules (references, connectivity) are checked by
/// `validate()`, which `build()` runs before freezing the network.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    sources: Vec<Source>,
    by_name: HashMap<String, NodeId>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of either kind.
    ///
    /// `capacitance_j_per_k` is required for `Mass` nodes and ignored for
    /// `Reference` nodes. `temperature_k` is the initial temperature of a mass
    /// or the fixed temperature of a reference.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        capacitance_j_per_k: Option<f64>,
        temperature_k: f64,
    ) -> NetworkResult<NodeId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(NetworkError::DuplicateNode { id: name });
        }

        let capacitance = match kind {
            NodeKind::Mass => {
                let c = capacitance_j_per_k.ok_or_else(|| {
                    NetworkError::invalid("capacitance", format!("mass node {name} needs one"))
                })?;
                Some(ensure_positive(c, "capacitance")?)
            }
            NodeKind::Reference => None,
        };
        let temperature_k = ensure_positive(temperature_k, "temperature")?;

        let id = NodeId::from_position(self.nodes.len())
            .ok_or_else(|| NetworkError::invalid("node count", "too many nodes"))?;
        self.nodes.push(Node {
            id,
            name: name.clone(),
            kind,
            capacitance_j_per_k: capacitance,
            temperature_k,
        });
        self.by_name.insert(name, id);
        Ok(id)
    }

    pub fn add_mass(
        &mut self,
        name: impl Into<String>,
        capacitance_j_per_k: f64,
        initial_temperature_k: f64,
    ) -> NetworkResult<NodeId> {
        self.add_node(
            name,
            NodeKind::Mass,
            Some(capacitance_j_per_k),
            initial_temperature_k,
        )
    }

    pub fn add_reference(
        &mut self,
        name: impl Into<String>,
        temperature_k: f64,
    ) -> NetworkResult<NodeId> {
        self.add_node(name, NodeKind::Reference, None, temperature_k)
    }

    /// Connect two nodes with a conductance (W/K).
    pub fn add_link(
        &mut self,
        node_a: &str,
        node_b: &str,
        conductance_w_per_k: f64,
    ) -> NetworkResult<LinkId> {
        let a = self.resolve(node_a)?;
        let b = self.resolve(node_b)?;
        if a == b {
            return Err(NetworkError::invalid(
                "link",
                format!("node {node_a} cannot be linked to itself"),
            ));
        }
        let conductance = ensure_non_negative(conductance_w_per_k, "conductance")?;

        let id = LinkId::from_position(self.links.len())
            .ok_or_else(|| NetworkError::invalid("link count", "too many links"))?;
        self.links.push(Link {
            id,
            a,
            b,
            conductance_w_per_k: conductance,
        });
        Ok(id)
    }

    /// Attach a heat source to a mass node.
    pub fn add_source(
        &mut self,
        node: &str,
        profile: impl PowerProfile + 'static,
    ) -> NetworkResult<SourceId> {
        self.add_shared_source(node, Arc::new(profile))
    }

    /// Attach a heat source whose profile is shared with other sources.
    pub fn add_shared_source(
        &mut self,
        node: &str,
        profile: Arc<dyn PowerProfile>,
    ) -> NetworkResult<SourceId> {
        let target = self.resolve(node)?;
        if self.nodes[target.index()].is_reference() {
            return Err(NetworkError::invalid(
                "source target",
                format!("{node} is a reference node"),
            ));
        }

        let id = SourceId::from_position(self.sources.len())
            .ok_or_else(|| NetworkError::invalid("source count", "too many sources"))?;
        self.sources.push(Source {
            id,
            node: target,
            profile,
        });
        Ok(id)
    }

    pub fn add_constant_source(&mut self, node: &str, watts: f64) -> NetworkResult<SourceId> {
        self.add_source(node, Constant::new(watts)?)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Check whole-network rules without consuming the builder.
    ///
    /// Repeated calls on an unchanged builder return the same result.
    pub fn validate(&self) -> NetworkResult<()> {
        validate::validate_network(&self.nodes, &self.links)
    }

    /// Validate and freeze into an immutable `Network`.
    pub fn build(self) -> NetworkResult<Network> {
        self.validate()?;

        Ok(Network {
            nodes: self.nodes,
            links: self.links,
            sources: self.sources,
            by_name: self.by_name,
        })
    }

    fn resolve(&self, name: &str) -> NetworkResult<NodeId> {
        self.node_id(name).ok_or_else(|| NetworkError::UnknownNode {
            id: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> NetworkBuilder {
        let mut b = NetworkBuilder::new();
        b.add_mass("mass", 9000.0, 298.15).unwrap();
        b.add_reference("ambient", 298.15).unwrap();
        b
    }

    #[test]
    fn builder_basic() {
        let mut b = minimal();
        let l = b.add_link("mass", "ambient", 0.0).unwrap();
        let s = b.add_constant_source("mass", 50.0).unwrap();

        assert_eq!(b.node_id("mass").unwrap().index(), 0);
        assert_eq!(b.node_id("ambient").unwrap().index(), 1);
        assert_eq!(l.index(), 0);
        assert_eq!(s.index(), 0);
        assert_eq!(b.nodes.len(), 2);
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut b = minimal();
        assert_eq!(
            b.add_reference("mass", 300.0),
            Err(NetworkError::DuplicateNode { id: "mass".into() })
        );
    }

    #[test]
    fn mass_needs_positive_finite_capacitance() {
        let mut b = NetworkBuilder::new();
        for c in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = b.add_mass("m", c, 300.0).unwrap_err();
            assert!(matches!(err, NetworkError::InvalidParameter { .. }));
        }
        let err = b.add_node("m", NodeKind::Mass, None, 300.0).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidParameter { .. }));
        // failed adds leave no trace
        assert!(b.add_mass("m", 1.0, 300.0).is_ok());
    }

    #[test]
    fn reference_ignores_capacitance() {
        let mut b = NetworkBuilder::new();
        let id = b
            .add_node("r", NodeKind::Reference, Some(-5.0), 300.0)
            .unwrap();
        assert_eq!(b.nodes[id.index()].capacitance_j_per_k, None);
    }

    #[test]
    fn link_checks() {
        let mut b = minimal();
        assert_eq!(
            b.add_link("mass", "nowhere", 1.0),
            Err(NetworkError::UnknownNode {
                id: "nowhere".into()
            })
        );
        assert!(matches!(
            b.add_link("mass", "ambient", -0.1),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            b.add_link("mass", "mass", 1.0),
            Err(NetworkError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn source_on_reference_rejected() {
        let mut b = minimal();
        assert!(matches!(
            b.add_constant_source("ambient", 10.0),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            b.add_constant_source("ghost", 10.0),
            Err(NetworkError::UnknownNode { .. })
        ));
    }

    #[test]
    fn build_keeps_links_in_insertion_order() {
        let mut b = minimal();
        b.add_mass("wall", 100.0, 298.15).unwrap();
        b.add_link("mass", "wall", 2.0).unwrap();
        b.add_link("wall", "ambient", 3.0).unwrap();
        let net = b.build().unwrap();

        let wall = net.node_id("wall").unwrap();
        assert_eq!(net.node_count(), 3);
        assert_eq!(net.links().len(), 2);
        assert_eq!(net.links()[0].b, wall);
        assert_eq!(net.links()[1].a, wall);
        let g: f64 = net.links().iter().map(|l| l.conductance_w_per_k).sum();
        assert_eq!(g, 5.0);
    }
}
