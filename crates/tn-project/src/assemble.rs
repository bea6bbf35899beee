//! Turns a validated scenario into runnable parts.

use std::sync::Arc;

use tn_core::celsius_to_kelvin;
use tn_network::{Constant, Network, NetworkBuilder, PowerProfile, Scaled, Tabulated};
use tn_sim::{Method, SignalLog, SolverOptions};

use crate::ProjectResult;
use crate::schema::{MethodDef, NodeKindDef, ProfileDef, Scenario, SignalQuantity, SolverDef};
use crate::validate::validate_scenario;

/// Network, probes and options ready for a `Solver`.
#[derive(Debug)]
pub struct PreparedScenario {
    pub name: String,
    pub network: Network,
    pub log: SignalLog,
    pub options: SolverOptions,
}

impl Scenario {
    /// Validate, then build the network, register signals and resolve options.
    pub fn prepare(&self) -> ProjectResult<PreparedScenario> {
        validate_scenario(self)?;
        let network = self.build_network()?;
        let log = self.build_log(&network)?;
        Ok(PreparedScenario {
            name: self.name.clone(),
            network,
            log,
            options: self.solver.to_options(),
        })
    }

    pub fn build_network(&self) -> ProjectResult<Network> {
        let mut builder = NetworkBuilder::new();
        for node in &self.nodes {
            match &node.kind {
                NodeKindDef::Mass {
                    capacitance_j_per_k,
                    initial_temperature_c,
                } => {
                    builder.add_mass(
                        node.id.clone(),
                        *capacitance_j_per_k,
                        celsius_to_kelvin(*initial_temperature_c),
                    )?;
                }
                NodeKindDef::Reference { temperature_c } => {
                    builder.add_reference(node.id.clone(), celsius_to_kelvin(*temperature_c))?;
                }
            }
        }
        for link in &self.links {
            builder.add_link(&link.a, &link.b, link.conductance_w_per_k)?;
        }
        for source in &self.sources {
            let base: Arc<dyn PowerProfile> = match &source.profile {
                ProfileDef::Constant { power_w } => Arc::new(Constant::new(*power_w)?),
                ProfileDef::Tabulated { points } => {
                    Arc::new(Tabulated::new(points.iter().copied())?)
                }
            };
            let profile: Arc<dyn PowerProfile> = match source.scale {
                Some(factor) => Arc::new(Scaled::new(base, factor)?),
                None => base,
            };
            builder.add_shared_source(&source.node, profile)?;
        }
        Ok(builder.build()?)
    }

    pub fn build_log(&self, network: &Network) -> ProjectResult<SignalLog> {
        let mut log = SignalLog::new();
        for signal in &self.signals {
            let name = signal.name.clone();
            match signal.quantity {
                SignalQuantity::TemperatureK => {
                    log.register_temperature(name, network, &signal.node)?
                }
                SignalQuantity::TemperatureC => {
                    log.register_temperature_celsius(name, network, &signal.node)?
                }
                SignalQuantity::RiseRateKPerS => {
                    log.register_rise_rate(name, network, &signal.node)?
                }
            }
        }
        Ok(log)
    }
}

impl From<MethodDef> for Method {
    fn from(method: MethodDef) -> Self {
        match method {
            MethodDef::DormandPrince => Method::DormandPrince,
            MethodDef::Trapezoidal => Method::Trapezoidal,
        }
    }
}

impl From<Method> for MethodDef {
    fn from(method: Method) -> Self {
        match method {
            Method::DormandPrince => MethodDef::DormandPrince,
            Method::Trapezoidal => MethodDef::Trapezoidal,
        }
    }
}

impl SolverDef {
    pub fn to_options(&self) -> SolverOptions {
        let defaults = SolverOptions::default();
        SolverOptions {
            method: self.method.into(),
            t0: self.t0_s,
            t_stop: self.t_stop_s,
            rtol: self.rtol.unwrap_or(defaults.rtol),
            atol: self.atol.unwrap_or(defaults.atol),
            h_init: self.h_init_s,
            h_min: self.h_min_s,
            h_max: self.h_max_s,
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
            ..defaults
        }
    }
}
