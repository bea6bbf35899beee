//! A user-defined nonlinear model through the generic runner.

use nalgebra::DVector;
use tn_sim::{Method, SimResult, SolverOptions, TransientModel, integrate};

/// Lumped body cooling by radiation: `C dT/dt = -k (T^4 - T_amb^4)`.
struct RadiativeBody {
    capacitance: f64,
    k: f64,
    ambient_k: f64,
    initial_k: f64,
}

impl TransientModel for RadiativeBody {
    fn dimension(&self) -> usize {
        1
    }

    fn initial_state(&self) -> DVector<f64> {
        DVector::from_element(1, self.initial_k)
    }

    fn rhs(&self, _t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        let flow = -self.k * (x[0].powi(4) - self.ambient_k.powi(4));
        Ok(DVector::from_element(1, flow / self.capacitance))
    }
}

fn final_temperature(model: &RadiativeBody, method: Method) -> (f64, usize) {
    let opts = SolverOptions::until(600.0).with_method(method);
    let mut last = f64::NAN;
    let stats = integrate(model, &opts, |_, x, _| {
        last = x[0];
        Ok(())
    })
    .unwrap();
    (last, stats.jacobian_evaluations)
}

#[test]
fn finite_difference_jacobian_drives_trapezoidal() {
    let body = RadiativeBody {
        capacitance: 500.0,
        k: 5.67e-8 * 0.9 * 0.5,
        ambient_k: 293.15,
        initial_k: 600.0,
    };

    let (explicit, explicit_jac) = final_temperature(&body, Method::DormandPrince);
    let (implicit, implicit_jac) = final_temperature(&body, Method::Trapezoidal);

    assert_eq!(explicit_jac, 0);
    assert!(implicit_jac > 0);
    assert!(explicit < 600.0 && explicit > 293.15);
    assert!((explicit - implicit).abs() < 1e-2, "{explicit} vs {implicit}");
}
