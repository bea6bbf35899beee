//! Network validation logic.

use std::collections::VecDeque;

use tn_core::{Tolerances, nearly_equal};

use crate::error::{NetworkError, NetworkResult};
use crate::network::{Link, Node, NodeKind};

/// Two reference temperatures closer than this are considered equal.
const REFERENCE_TOL: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 1e-12,
};

/// Validate the reference set: at least one, all at the same temperature.
pub(crate) fn validate_references(nodes: &[Node]) -> NetworkResult<()> {
    let mut refs = nodes.iter().filter(|n| n.kind == NodeKind::Reference);
    let first = refs.next().ok_or(NetworkError::NoReference)?;

    for other in refs {
        if !nearly_equal(first.temperature_k, other.temperature_k, REFERENCE_TOL) {
            return Err(NetworkError::MultipleReferenceTemperatures {
                first: first.name.clone(),
                first_k: first.temperature_k,
                second: other.name.clone(),
                second_k: other.temperature_k,
            });
        }
    }

    Ok(())
}

/// Validate that every mass node reaches a reference through links.
///
/// Zero-conductance links count as a path: they are legal, inert couplings.
pub(crate) fn validate_connectivity(nodes: &[Node], links: &[Link]) -> NetworkResult<()> {
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for link in links {
        let (a, b) = (link.a.index(), link.b.index());
        neighbors[a].push(b);
        neighbors[b].push(a);
    }

    // Multi-source BFS from every reference
    let mut reached = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.kind == NodeKind::Reference {
            reached[i] = true;
            queue.push_back(i);
        }
    }
    while let Some(i) = queue.pop_front() {
        for &j in &neighbors[i] {
            if !reached[j] {
                reached[j] = true;
                queue.push_back(j);
            }
        }
    }

    match nodes.iter().zip(&reached).find(|(_, r)| !**r) {
        Some((node, _)) => Err(NetworkError::DisconnectedNetwork {
            id: node.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Full structural validation, in a fixed order.
pub(crate) fn validate_network(nodes: &[Node], links: &[Link]) -> NetworkResult<()> {
    validate_references(nodes)?;
    validate_connectivity(nodes, links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_core::Id;

    fn mass(i: u32, name: &str) -> Node {
        Node {
            id: Id::from_index(i).unwrap(),
            name: name.into(),
            kind: NodeKind::Mass,
            capacitance_j_per_k: Some(1.0),
            temperature_k: 300.0,
        }
    }

    fn reference(i: u32, name: &str, t: f64) -> Node {
        Node {
            id: Id::from_index(i).unwrap(),
            name: name.into(),
            kind: NodeKind::Reference,
            capacitance_j_per_k: None,
            temperature_k: t,
        }
    }

    fn link(i: u32, a: u32, b: u32) -> Link {
        Link {
            id: Id::from_index(i).unwrap(),
            a: Id::from_index(a).unwrap(),
            b: Id::from_index(b).unwrap(),
            conductance_w_per_k: 0.0,
        }
    }

    #[test]
    fn validate_empty_network_has_no_reference() {
        assert_eq!(validate_network(&[], &[]), Err(NetworkError::NoReference));
    }

    #[test]
    fn validate_reference_disagreement() {
        let nodes = vec![reference(0, "r1", 300.0), reference(1, "r2", 301.0)];
        let err = validate_references(&nodes).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::MultipleReferenceTemperatures { .. }
        ));
    }

    #[test]
    fn validate_shared_reference_temperature_ok() {
        let nodes = vec![reference(0, "r1", 300.0), reference(1, "r2", 300.0)];
        assert!(validate_references(&nodes).is_ok());
    }

    #[test]
    fn validate_transitive_connectivity() {
        // r0 - m1 - m2, m3 isolated
        let nodes = vec![
            reference(0, "r0", 300.0),
            mass(1, "m1"),
            mass(2, "m2"),
            mass(3, "m3"),
        ];
        let links = vec![link(0, 0, 1), link(1, 1, 2)];
        let err = validate_connectivity(&nodes, &links).unwrap_err();
        assert_eq!(
            err,
            NetworkError::DisconnectedNetwork { id: "m3".into() }
        );

        let links = vec![link(0, 0, 1), link(1, 1, 2), link(2, 3, 2)];
        assert!(validate_connectivity(&nodes, &links).is_ok());
    }
}
