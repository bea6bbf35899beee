//! Integration tests for network construction and validation.

use proptest::prelude::*;
use tn_network::{Constant, NetworkBuilder, NetworkError, NodeKind, Tabulated};

fn residential_builder() -> NetworkBuilder {
    let mut b = NetworkBuilder::new();
    b.add_mass("tes", 1.35e8, 293.15).unwrap();
    b.add_reference("load", 293.15).unwrap();
    b.add_link("tes", "load", 500.0).unwrap();
    b.add_source("tes", Constant::new(1775.0).unwrap()).unwrap();
    b
}

#[test]
fn valid_network_builds() {
    let net = residential_builder().build().unwrap();
    assert_eq!(net.nodes().len(), 2);
    assert_eq!(net.links().len(), 1);
    assert_eq!(net.sources().len(), 1);
    assert_eq!(net.mass_count(), 1);
    assert_eq!(net.reference_temperature_k(), 293.15);

    let tes = net.node_by_name("tes").unwrap();
    assert_eq!(tes.kind, NodeKind::Mass);
    assert_eq!(tes.capacitance_j_per_k, Some(1.35e8));
    assert_eq!(net.sources()[0].power_w(0.0), 1775.0);
}

#[test]
fn validate_is_idempotent_on_valid_network() {
    let b = residential_builder();
    assert!(b.validate().is_ok());
    assert!(b.validate().is_ok());
}

#[test]
fn validate_is_idempotent_on_invalid_network() {
    let mut b = NetworkBuilder::new();
    b.add_mass("island", 10.0, 300.0).unwrap();
    b.add_reference("ambient", 300.0).unwrap();

    let first = b.validate().unwrap_err();
    let second = b.validate().unwrap_err();
    assert_eq!(first, second);
    assert_eq!(
        first,
        NetworkError::DisconnectedNetwork {
            id: "island".into()
        }
    );
}

#[test]
fn missing_reference_detected_before_connectivity() {
    let mut b = NetworkBuilder::new();
    b.add_mass("a", 10.0, 300.0).unwrap();
    b.add_mass("b", 10.0, 300.0).unwrap();
    b.add_link("a", "b", 1.0).unwrap();
    assert_eq!(b.validate(), Err(NetworkError::NoReference));
    assert_eq!(b.build().unwrap_err(), NetworkError::NoReference);
}

#[test]
fn conflicting_references_detected() {
    let mut b = residential_builder();
    b.add_reference("sky", 270.0).unwrap();
    b.add_link("tes", "sky", 1.0).unwrap();
    assert!(matches!(
        b.validate(),
        Err(NetworkError::MultipleReferenceTemperatures { .. })
    ));
}

#[test]
fn reference_disagreement_is_reported_before_disconnection() {
    let mut b = residential_builder();
    b.add_reference("sky", 270.0).unwrap();
    b.add_mass("attic", 5e5, 280.0).unwrap();
    assert!(matches!(
        b.validate(),
        Err(NetworkError::MultipleReferenceTemperatures { .. })
    ));

    // same defect without the conflicting reference
    let mut b = residential_builder();
    b.add_mass("attic", 5e5, 280.0).unwrap();
    assert_eq!(
        b.validate(),
        Err(NetworkError::DisconnectedNetwork { id: "attic".into() })
    );
}

#[test]
fn tabulated_source_attaches() {
    let mut b = residential_builder();
    let day = Tabulated::new([(0.0, 0.0), (43_200.0, 3550.0), (86_400.0, 0.0)]).unwrap();
    b.add_source("tes", day).unwrap();
    let net = b.build().unwrap();
    assert_eq!(net.sources().len(), 2);
    assert_eq!(net.sources()[1].power_w(21_600.0), 1775.0);
}

#[test]
fn network_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<tn_network::Network>();
}

#[derive(Debug, Clone)]
enum Op {
    Node(u8),
    Link(u8, u8),
    Source(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Node),
        (0u8..6, 0u8..6).prop_map(|(a, b)| Op::Link(a, b)),
        (0u8..6).prop_map(Op::Source),
    ]
}

proptest! {
    // Whatever the call order, a duplicate add fails with DuplicateNode and a
    // reference to a name never added fails with UnknownNode.
    #[test]
    fn topology_errors_are_order_independent(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut b = NetworkBuilder::new();
        let mut added = std::collections::HashSet::new();
        for op in ops {
            match op {
                Op::Node(n) => {
                    let name = format!("n{n}");
                    let res = b.add_mass(name.clone(), 10.0, 300.0);
                    if added.contains(&n) {
                        prop_assert_eq!(res, Err(NetworkError::DuplicateNode { id: name }));
                    } else {
                        prop_assert!(res.is_ok());
                        added.insert(n);
                    }
                }
                Op::Link(x, y) => {
                    let res = b.add_link(&format!("n{x}"), &format!("n{y}"), 1.0);
                    if !added.contains(&x) {
                        prop_assert_eq!(res, Err(NetworkError::UnknownNode { id: format!("n{x}") }));
                    } else if !added.contains(&y) {
                        prop_assert_eq!(res, Err(NetworkError::UnknownNode { id: format!("n{y}") }));
                    } else if x == y {
                        let is_invalid = matches!(res, Err(NetworkError::InvalidParameter { .. }));
                        prop_assert!(is_invalid);
                    } else {
                        prop_assert!(res.is_ok());
                    }
                }
                Op::Source(x) => {
                    let res = b.add_constant_source(&format!("n{x}"), 5.0);
                    if added.contains(&x) {
                        prop_assert!(res.is_ok());
                    } else {
                        prop_assert_eq!(res, Err(NetworkError::UnknownNode { id: format!("n{x}") }));
                    }
                }
            }
        }
    }
}
