//! Scenario file schema.
//!
//! Temperatures are written in degrees Celsius and converted to kelvin when
//! the network is built.

use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub sources: Vec<SourceDef>,
    #[serde(default)]
    pub signals: Vec<SignalDef>,
    pub solver: SolverDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub kind: NodeKindDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NodeKindDef {
    Mass {
        capacitance_j_per_k: f64,
        initial_temperature_c: f64,
    },
    Reference {
        temperature_c: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub a: String,
    pub b: String,
    pub conductance_w_per_k: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDef {
    pub node: String,
    pub profile: ProfileDef,
    /// Multiplies the profile, e.g. the fraction of panel peak delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ProfileDef {
    Constant {
        power_w: f64,
    },
    /// Piecewise-linear `(time_s, power_w)` breakpoints.
    Tabulated {
        points: Vec<(f64, f64)>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalDef {
    pub name: String,
    pub node: String,
    #[serde(default)]
    pub quantity: SignalQuantity,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuantity {
    #[default]
    TemperatureK,
    TemperatureC,
    RiseRateKPerS,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MethodDef {
    #[default]
    DormandPrince,
    Trapezoidal,
}

/// Solver settings; unset fields keep the solver defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default)]
    pub method: MethodDef,
    #[serde(default)]
    pub t0_s: f64,
    pub t_stop_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_init_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_min_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_max_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}
