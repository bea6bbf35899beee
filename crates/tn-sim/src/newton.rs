//! Simplified Newton iteration for implicit stage equations.

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;

/// Newton configuration for implicit stages.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations before the stage is declared unconverged.
    pub max_iterations: usize,
    /// Convergence threshold on the weighted update norm.
    pub tolerance: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-2,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Weighted norm of the last update
    pub update_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Residual evaluations performed
    pub evaluations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Solve `residual(x) = 0` with a frozen iteration matrix.
///
/// The matrix is factored once and reused for every iteration. Convergence
/// is measured on the update weighted by `weights` (an update of size
/// `weights[i]` counts as 1). A singular matrix or a non-finite iterate
/// yields `converged = false` rather than an error so the caller can retry
/// with a smaller step.
pub fn newton_solve<F>(
    x0: DVector<f64>,
    residual_fn: F,
    iteration_matrix: DMatrix<f64>,
    weights: &DVector<f64>,
    config: &NewtonConfig,
) -> SimResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SimResult<DVector<f64>>,
{
    let lu = iteration_matrix.lu();
    let mut x = x0;
    let mut evaluations = 0;
    let mut update_norm = f64::INFINITY;

    for iter in 0..config.max_iterations {
        let r = residual_fn(&x)?;
        evaluations += 1;

        // Solve M * dx = -r
        let Some(dx) = lu.solve(&(-r)) else {
            return Ok(NewtonResult {
                x,
                update_norm,
                iterations: iter,
                evaluations,
                converged: false,
            });
        };

        update_norm = weighted_max_norm(&dx, weights);
        x += &dx;

        if !update_norm.is_finite() || x.iter().any(|v| !v.is_finite()) {
            break;
        }

        if update_norm <= config.tolerance {
            return Ok(NewtonResult {
                x,
                update_norm,
                iterations: iter + 1,
                evaluations,
                converged: true,
            });
        }
    }

    Ok(NewtonResult {
        x,
        update_norm,
        iterations: config.max_iterations,
        evaluations,
        converged: false,
    })
}

/// `max_i |v_i| / w_i`, zero for empty vectors.
pub(crate) fn weighted_max_norm(v: &DVector<f64>, weights: &DVector<f64>) -> f64 {
    v.iter()
        .zip(weights.iter())
        .map(|(a, w)| a.abs() / w)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_system_converges_in_one_update() {
        // 2x - 4 = 0 with exact matrix
        let residual = |x: &DVector<f64>| -> SimResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0] - 4.0))
        };
        let m = DMatrix::from_element(1, 1, 2.0);
        let w = DVector::from_element(1, 1e-6);
        let result = newton_solve(
            DVector::from_element(1, 0.0),
            residual,
            m,
            &w,
            &NewtonConfig::default(),
        )
        .unwrap();

        assert!(result.converged);
        assert!(result.iterations <= 2);
        assert!((result.x[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn nonlinear_with_frozen_matrix() {
        // Solve x^2 - 4 = 0 from x = 3 with J frozen at x0
        let residual = |x: &DVector<f64>| -> SimResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let m = DMatrix::from_element(1, 1, 6.0);
        let w = DVector::from_element(1, 1e-8);
        let config = NewtonConfig {
            max_iterations: 50,
            tolerance: 1.0,
        };
        let result = newton_solve(DVector::from_element(1, 3.0), residual, m, &w, &config).unwrap();

        assert!(result.converged);
        assert!((result.x[0] - 2.0).abs() < 1e-7);
    }

    #[test]
    fn singular_matrix_reports_unconverged() {
        let residual =
            |_x: &DVector<f64>| -> SimResult<DVector<f64>> { Ok(DVector::from_element(1, 1.0)) };
        let m = DMatrix::from_element(1, 1, 0.0);
        let w = DVector::from_element(1, 1.0);
        let result = newton_solve(
            DVector::from_element(1, 0.0),
            residual,
            m,
            &w,
            &NewtonConfig::default(),
        )
        .unwrap();
        assert!(!result.converged);
    }
}
