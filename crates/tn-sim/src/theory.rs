//! Closed-form references for simple circuits.

use tn_core::{ensure_finite, ensure_positive};

use crate::error::SimResult;

/// Lossless single-mass prediction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoLossPrediction {
    pub final_temperature_k: f64,
    pub rise_rate_k_per_s: f64,
}

impl NoLossPrediction {
    pub fn rise_rate_k_per_min(&self) -> f64 {
        self.rise_rate_k_per_s * 60.0
    }
}

/// `T_final = T_0 + P t / C`, `dT/dt = P / C` for a mass with no losses.
///
/// Pure arithmetic: no integration and no network checks. Callers pass a
/// positive capacitance.
pub fn no_loss_prediction(
    initial_temperature_k: f64,
    power_w: f64,
    capacitance_j_per_k: f64,
    t_stop_s: f64,
) -> NoLossPrediction {
    let rise_rate_k_per_s = power_w / capacitance_j_per_k;
    NoLossPrediction {
        final_temperature_k: initial_temperature_k + rise_rate_k_per_s * t_stop_s,
        rise_rate_k_per_s,
    }
}

/// Single mass, one link to a reference, constant power.
///
/// `T(t) = T_ss + (T_0 - T_ss) exp(-t / tau)` with `T_ss = T_ref + P / G`
/// and `tau = C / G`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirstOrderResponse {
    initial_k: f64,
    steady_state_k: f64,
    time_constant_s: f64,
}

impl FirstOrderResponse {
    pub fn new(
        initial_temperature_k: f64,
        reference_temperature_k: f64,
        power_w: f64,
        capacitance_j_per_k: f64,
        conductance_w_per_k: f64,
    ) -> SimResult<Self> {
        let c = ensure_positive(capacitance_j_per_k, "capacitance")?;
        let g = ensure_positive(conductance_w_per_k, "conductance")?;
        let t0 = ensure_finite(initial_temperature_k, "initial temperature")?;
        let t_ref = ensure_finite(reference_temperature_k, "reference temperature")?;
        let p = ensure_finite(power_w, "power")?;

        Ok(Self {
            initial_k: t0,
            steady_state_k: t_ref + p / g,
            time_constant_s: c / g,
        })
    }

    pub fn steady_state_k(&self) -> f64 {
        self.steady_state_k
    }

    pub fn time_constant_s(&self) -> f64 {
        self.time_constant_s
    }

    pub fn temperature_at(&self, t: f64) -> f64 {
        self.steady_state_k
            + (self.initial_k - self.steady_state_k) * (-t / self.time_constant_s).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use tn_core::{Tolerances, nearly_equal};

    fn close(a: f64, b: f64, abs: f64) -> bool {
        nearly_equal(a, b, Tolerances { abs, rel: 0.0 })
    }

    #[test]
    fn minimal_scenario_prediction() {
        let p = no_loss_prediction(298.15, 50.0, 9000.0, 3600.0);
        assert!(close(p.final_temperature_k, 318.15, 1e-9));
        assert!(close(p.rise_rate_k_per_s, 50.0 / 9000.0, 1e-15));
        assert!(close(p.rise_rate_k_per_min(), 1.0 / 3.0, 1e-12));
    }

    #[test]
    fn zero_power_keeps_temperature() {
        let p = no_loss_prediction(300.0, 0.0, 1.0, 1e6);
        assert_eq!(p.final_temperature_k, 300.0);
        assert_eq!(p.rise_rate_k_per_s, 0.0);
    }

    #[test]
    fn first_order_limits() {
        let r = FirstOrderResponse::new(300.0, 290.0, 20.0, 100.0, 2.0).unwrap();
        assert!(close(r.steady_state_k(), 300.0, 1e-12));
        assert!(close(r.time_constant_s(), 50.0, 1e-12));
        // already at steady state
        assert!(close(r.temperature_at(123.0), 300.0, 1e-12));

        let r = FirstOrderResponse::new(290.0, 290.0, 20.0, 100.0, 2.0).unwrap();
        assert_eq!(r.temperature_at(0.0), 290.0);
        let one_tau = 300.0 - 10.0 * (-1.0_f64).exp();
        assert!(close(r.temperature_at(50.0), one_tau, 1e-12));
    }

    #[test]
    fn first_order_rejects_zero_conductance() {
        assert!(matches!(
            FirstOrderResponse::new(300.0, 290.0, 1.0, 10.0, 0.0),
            Err(SimError::InvalidParameter { .. })
        ));
    }
}
