//! The two reference scenarios, built from physical inputs.

use tn_core::{
    capacitance_of_mass, capacitance_of_volume, heat_capacity_value, kg, kg_per_m3, m3,
};
use tn_sim::{NoLossPrediction, no_loss_prediction};

use crate::schema::{
    LATEST_VERSION, LinkDef, NodeDef, NodeKindDef, ProfileDef, Scenario, SignalDef,
    SignalQuantity, SolverDef, SourceDef,
};

pub const MINIMAL_SIGNAL: &str = "MinimalTemperature";
pub const STORAGE_SIGNAL: &str = "StorageTemperature";

/// Single heated mass with no losses.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalParams {
    pub mass_kg: f64,
    /// J/(kg K)
    pub specific_heat: f64,
    pub initial_temperature_c: f64,
    pub power_w: f64,
    pub duration_s: f64,
}

impl Default for MinimalParams {
    fn default() -> Self {
        Self {
            mass_kg: 10.0,
            specific_heat: 900.0,
            initial_temperature_c: 25.0,
            power_w: 50.0,
            duration_s: 3600.0,
        }
    }
}

impl MinimalParams {
    pub fn capacitance_j_per_k(&self) -> f64 {
        heat_capacity_value(capacitance_of_mass(kg(self.mass_kg), self.specific_heat))
    }

    /// Closed-form end state for comparison with the run.
    pub fn prediction(&self) -> NoLossPrediction {
        no_loss_prediction(
            tn_core::celsius_to_kelvin(self.initial_temperature_c),
            self.power_w,
            self.capacitance_j_per_k(),
            self.duration_s,
        )
    }

    pub fn scenario(&self) -> Scenario {
        Scenario {
            version: LATEST_VERSION,
            name: "minimal".to_string(),
            nodes: vec![
                NodeDef {
                    id: "mass".to_string(),
                    kind: NodeKindDef::Mass {
                        capacitance_j_per_k: self.capacitance_j_per_k(),
                        initial_temperature_c: self.initial_temperature_c,
                    },
                },
                NodeDef {
                    id: "ambient".to_string(),
                    kind: NodeKindDef::Reference {
                        temperature_c: self.initial_temperature_c,
                    },
                },
            ],
            // zero conductance: grounds the mass without any loss
            links: vec![LinkDef {
                a: "mass".to_string(),
                b: "ambient".to_string(),
                conductance_w_per_k: 0.0,
            }],
            sources: vec![SourceDef {
                node: "mass".to_string(),
                profile: ProfileDef::Constant {
                    power_w: self.power_w,
                },
                scale: None,
            }],
            signals: vec![SignalDef {
                name: MINIMAL_SIGNAL.to_string(),
                node: "mass".to_string(),
                quantity: SignalQuantity::TemperatureK,
            }],
            solver: SolverDef {
                t_stop_s: self.duration_s,
                h_max_s: Some(self.duration_s / 60.0),
                ..SolverDef::default()
            },
        }
    }
}

/// Solar-heated thermal store discharging into a load at ambient.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentialParams {
    pub storage_volume_m3: f64,
    pub storage_density_kg_per_m3: f64,
    /// J/(kg K)
    pub storage_specific_heat: f64,
    pub initial_temperature_c: f64,
    /// Heat-exchanger overall coefficient, W/(m² K)
    pub exchanger_u: f64,
    pub exchanger_area_m2: f64,
    pub panel_peak_w: f64,
    pub panel_count: u32,
    /// Share of installed peak delivered as heat
    pub panel_fraction: f64,
    pub load_temperature_c: f64,
    pub duration_s: f64,
}

impl Default for ResidentialParams {
    fn default() -> Self {
        Self {
            storage_volume_m3: 50.0,
            storage_density_kg_per_m3: 1800.0,
            storage_specific_heat: 1500.0,
            initial_temperature_c: 20.0,
            exchanger_u: 5.0,
            exchanger_area_m2: 100.0,
            panel_peak_w: 355.0,
            panel_count: 10,
            panel_fraction: 0.5,
            load_temperature_c: 20.0,
            duration_s: 86_400.0,
        }
    }
}

impl ResidentialParams {
    pub fn capacitance_j_per_k(&self) -> f64 {
        heat_capacity_value(capacitance_of_volume(
            m3(self.storage_volume_m3),
            kg_per_m3(self.storage_density_kg_per_m3),
            self.storage_specific_heat,
        ))
    }

    pub fn conductance_w_per_k(&self) -> f64 {
        self.exchanger_u * self.exchanger_area_m2
    }

    pub fn installed_peak_w(&self) -> f64 {
        self.panel_peak_w * f64::from(self.panel_count)
    }

    pub fn delivered_power_w(&self) -> f64 {
        self.panel_fraction * self.installed_peak_w()
    }

    /// Upper bound on the storage temperature: the same heating with no load.
    pub fn no_loss_bound(&self) -> NoLossPrediction {
        no_loss_prediction(
            tn_core::celsius_to_kelvin(self.initial_temperature_c),
            self.delivered_power_w(),
            self.capacitance_j_per_k(),
            self.duration_s,
        )
    }

    pub fn scenario(&self) -> Scenario {
        Scenario {
            version: LATEST_VERSION,
            name: "residential".to_string(),
            nodes: vec![
                NodeDef {
                    id: "tes".to_string(),
                    kind: NodeKindDef::Mass {
                        capacitance_j_per_k: self.capacitance_j_per_k(),
                        initial_temperature_c: self.initial_temperature_c,
                    },
                },
                NodeDef {
                    id: "load".to_string(),
                    kind: NodeKindDef::Reference {
                        temperature_c: self.load_temperature_c,
                    },
                },
            ],
            links: vec![LinkDef {
                a: "tes".to_string(),
                b: "load".to_string(),
                conductance_w_per_k: self.conductance_w_per_k(),
            }],
            sources: vec![SourceDef {
                node: "tes".to_string(),
                profile: ProfileDef::Constant {
                    power_w: self.installed_peak_w(),
                },
                scale: Some(self.panel_fraction),
            }],
            signals: vec![SignalDef {
                name: STORAGE_SIGNAL.to_string(),
                node: "tes".to_string(),
                quantity: SignalQuantity::TemperatureK,
            }],
            solver: SolverDef {
                t_stop_s: self.duration_s,
                h_max_s: Some(600.0),
                ..SolverDef::default()
            },
        }
    }
}
