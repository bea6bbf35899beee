//! Source evaluation: total heat flow into each mass node at a time.

use std::sync::Arc;

use nalgebra::DVector;
use tn_network::{Network, PowerProfile, StateIndex};

use crate::error::{SimError, SimResult};

/// Resolves source profiles to per-node heat flows.
///
/// Holds only shared, immutable profiles, so evaluating at any time (including
/// trial points that are later rejected) has no side effects.
#[derive(Clone)]
pub struct SourceEvaluator {
    /// (state position, profile) for every source in the network.
    targets: Vec<(usize, Arc<dyn PowerProfile>)>,
    dimension: usize,
}

impl SourceEvaluator {
    pub fn new(network: &Network, index: &StateIndex) -> Self {
        // The builder only lets sources target mass nodes, so every source has a position.
        let targets = network
            .sources()
            .iter()
            .filter_map(|s| index.position(s.node).map(|p| (p, Arc::clone(&s.profile))))
            .collect();
        Self {
            targets,
            dimension: index.len(),
        }
    }

    /// Total heat flow (W) into each mass node, by state position.
    pub fn power_at(&self, t: f64) -> SimResult<DVector<f64>> {
        let mut p = DVector::zeros(self.dimension);
        for (pos, profile) in &self.targets {
            let value = profile.power_w(t);
            if !value.is_finite() {
                return Err(SimError::NonFiniteSource { time: t, value });
            }
            p[*pos] += value;
        }
        Ok(p)
    }
}

impl std::fmt::Debug for SourceEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEvaluator")
            .field("sources", &self.targets.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}
