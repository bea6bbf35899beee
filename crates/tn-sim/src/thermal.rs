//! Lumped thermal network as an ODE system.
//!
//! For every mass node i:
//!
//! ```text
//! dT_i/dt = [ P_i(t) + sum_j G_ij (T_j - T_i) ] / C_i
//! ```
//!
//! Only mass temperatures are states. Reference temperatures are folded into
//! a constant injection vector, so the system reads `C dT/dt = P(t) + b - K T`
//! with `K` the mass-mass block of the conductance Laplacian.

use nalgebra::{DMatrix, DVector};
use tn_core::NodeId;
use tn_network::{Network, StateIndex};

use crate::error::SimResult;
use crate::model::TransientModel;
use crate::sources::SourceEvaluator;

/// Assembled thermal network, ready to integrate.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    index: StateIndex,
    sources: SourceEvaluator,
    /// 1 / C_i (K/J)
    inv_capacitance: DVector<f64>,
    /// Mass-mass conductance Laplacian (W/K)
    conductance: DMatrix<f64>,
    /// sum over reference neighbors of G_ir * T_r (W)
    reference_injection: DVector<f64>,
    /// -diag(1/C) K, exact and constant
    jacobian: DMatrix<f64>,
    initial: DVector<f64>,
    /// Per-node temperature template; reference entries stay fixed.
    node_template: Vec<f64>,
}

impl ThermalModel {
    /// Assemble the ODE system once from a validated network.
    pub fn new(network: &Network) -> Self {
        let index = StateIndex::from_network(network);
        let n = index.len();

        let mut conductance = DMatrix::zeros(n, n);
        let mut reference_injection = DVector::zeros(n);

        for link in network.links() {
            let g = link.conductance_w_per_k;
            match (index.position(link.a), index.position(link.b)) {
                (Some(i), Some(j)) => {
                    conductance[(i, i)] += g;
                    conductance[(j, j)] += g;
                    conductance[(i, j)] -= g;
                    conductance[(j, i)] -= g;
                }
                (Some(i), None) => {
                    conductance[(i, i)] += g;
                    reference_injection[i] += g * temperature_of(network, link.b);
                }
                (None, Some(j)) => {
                    conductance[(j, j)] += g;
                    reference_injection[j] += g * temperature_of(network, link.a);
                }
                // reference-to-reference links carry no state
                (None, None) => {}
            }
        }

        let inv_capacitance = DVector::from_iterator(
            n,
            index.mass_ids().iter().map(|&id| {
                network
                    .node(id)
                    .and_then(|node| node.capacitance_j_per_k)
                    .map_or(0.0, |c| 1.0 / c)
            }),
        );
        let initial = DVector::from_iterator(
            n,
            index
                .mass_ids()
                .iter()
                .map(|&id| temperature_of(network, id)),
        );

        let mut jacobian = -conductance.clone();
        for (i, mut row) in jacobian.row_iter_mut().enumerate() {
            row *= inv_capacitance[i];
        }

        Self {
            sources: SourceEvaluator::new(network, &index),
            index,
            inv_capacitance,
            conductance,
            reference_injection,
            jacobian,
            initial,
            node_template: network.initial_temperatures_k(),
        }
    }

    pub fn index(&self) -> &StateIndex {
        &self.index
    }

    pub fn sources(&self) -> &SourceEvaluator {
        &self.sources
    }

    pub fn conductance_matrix(&self) -> &DMatrix<f64> {
        &self.conductance
    }

    /// Full per-node temperature vector (K) from a mass state vector.
    pub fn node_temperatures(&self, x: &DVector<f64>) -> Vec<f64> {
        let mut temps = self.node_template.clone();
        for (pos, &id) in self.index.mass_ids().iter().enumerate() {
            temps[id.index()] = x[pos];
        }
        temps
    }

    /// Full per-node rise rate (K/s); references are always zero.
    pub fn node_rates(&self, dxdt: &DVector<f64>) -> Vec<f64> {
        let mut rates = vec![0.0; self.node_template.len()];
        for (pos, &id) in self.index.mass_ids().iter().enumerate() {
            rates[id.index()] = dxdt[pos];
        }
        rates
    }

    /// Shortest thermal time constant `min_i C_i / sum_j G_ij` (s).
    ///
    /// Infinite when no mass node has any conductance.
    pub fn min_time_constant(&self) -> f64 {
        (0..self.index.len())
            .filter_map(|i| {
                let g = self.conductance[(i, i)];
                (g > 0.0).then(|| 1.0 / (self.inv_capacitance[i] * g))
            })
            .fold(f64::INFINITY, f64::min)
    }
}

impl TransientModel for ThermalModel {
    fn dimension(&self) -> usize {
        self.index.len()
    }

    fn initial_state(&self) -> DVector<f64> {
        self.initial.clone()
    }

    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        let mut net_flow = self.sources.power_at(t)?;
        net_flow += &self.reference_injection;
        net_flow -= &self.conductance * x;
        Ok(net_flow.component_mul(&self.inv_capacitance))
    }

    fn jacobian(&self, _t: f64, _x: &DVector<f64>) -> SimResult<DMatrix<f64>> {
        Ok(self.jacobian.clone())
    }
}

fn temperature_of(network: &Network, id: NodeId) -> f64 {
    network.node(id).map_or(f64::NAN, |n| n.temperature_k)
}
