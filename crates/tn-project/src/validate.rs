//! Scenario validation logic.
//!
//! Checks what the file itself can get wrong (ids, references, numbers).
//! Network-level rules such as connectivity are enforced when the network
//! is built.

use std::collections::{HashMap, HashSet};

use crate::schema::{NodeKindDef, ProfileDef, Scenario, SolverDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::schema::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    let mut kinds = HashMap::new();
    for node in &scenario.nodes {
        if kinds.insert(node.id.as_str(), &node.kind).is_some() {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: "nodes".to_string(),
            });
        }
        match &node.kind {
            NodeKindDef::Mass {
                capacitance_j_per_k,
                initial_temperature_c,
            } => {
                positive(
                    &format!("{}.capacitance_j_per_k", node.id),
                    *capacitance_j_per_k,
                )?;
                finite(
                    &format!("{}.initial_temperature_c", node.id),
                    *initial_temperature_c,
                )?;
            }
            NodeKindDef::Reference { temperature_c } => {
                finite(&format!("{}.temperature_c", node.id), *temperature_c)?;
            }
        }
    }

    for link in &scenario.links {
        for end in [&link.a, &link.b] {
            if !kinds.contains_key(end.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: end.clone(),
                    context: "link endpoint".to_string(),
                });
            }
        }
        let field = format!("link {}-{}.conductance_w_per_k", link.a, link.b);
        finite(&field, link.conductance_w_per_k)?;
        if link.conductance_w_per_k < 0.0 {
            return Err(invalid(&field, link.conductance_w_per_k, "must be >= 0"));
        }
    }

    for source in &scenario.sources {
        match kinds.get(source.node.as_str()) {
            None => {
                return Err(ValidationError::MissingReference {
                    id: source.node.clone(),
                    context: "source node".to_string(),
                });
            }
            Some(NodeKindDef::Reference { .. }) => {
                return Err(ValidationError::InvalidValue {
                    field: format!("source {}", source.node),
                    value: source.node.clone(),
                    reason: "sources must target a mass node".to_string(),
                });
            }
            Some(NodeKindDef::Mass { .. }) => {}
        }
        if let Some(scale) = source.scale {
            finite(&format!("source {}.scale", source.node), scale)?;
        }
        validate_profile(&source.node, &source.profile)?;
    }

    let mut signal_names = HashSet::new();
    for signal in &scenario.signals {
        if !signal_names.insert(signal.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: signal.name.clone(),
                context: "signals".to_string(),
            });
        }
        if !kinds.contains_key(signal.node.as_str()) {
            return Err(ValidationError::MissingReference {
                id: signal.node.clone(),
                context: format!("signal '{}'", signal.name),
            });
        }
    }

    validate_solver(&scenario.solver)
}

fn validate_profile(node: &str, profile: &ProfileDef) -> Result<(), ValidationError> {
    match profile {
        ProfileDef::Constant { power_w } => finite(&format!("source {node}.power_w"), *power_w),
        ProfileDef::Tabulated { points } => {
            let field = format!("source {node}.points");
            if points.is_empty() {
                return Err(invalid(&field, 0.0, "needs at least one breakpoint"));
            }
            for (t, p) in points {
                finite(&field, *t)?;
                finite(&field, *p)?;
            }
            if points.windows(2).any(|w| w[1].0 <= w[0].0) {
                return Err(ValidationError::InvalidValue {
                    field,
                    value: format!("{points:?}"),
                    reason: "times must strictly increase".to_string(),
                });
            }
            Ok(())
        }
    }
}

fn validate_solver(solver: &SolverDef) -> Result<(), ValidationError> {
    finite("solver.t0_s", solver.t0_s)?;
    finite("solver.t_stop_s", solver.t_stop_s)?;
    if solver.t_stop_s <= solver.t0_s {
        return Err(invalid(
            "solver.t_stop_s",
            solver.t_stop_s,
            "must be greater than t0_s",
        ));
    }
    for (field, value) in [
        ("solver.h_init_s", solver.h_init_s),
        ("solver.h_min_s", solver.h_min_s),
        ("solver.h_max_s", solver.h_max_s),
    ] {
        if let Some(v) = value {
            positive(field, v)?;
        }
    }
    for (field, value) in [("solver.rtol", solver.rtol), ("solver.atol", solver.atol)] {
        if let Some(v) = value {
            finite(field, v)?;
            if v < 0.0 {
                return Err(invalid(field, v, "must be >= 0"));
            }
        }
    }
    if solver.max_steps == Some(0) {
        return Err(invalid("solver.max_steps", 0.0, "must be positive"));
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be > 0"))
    }
}

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
