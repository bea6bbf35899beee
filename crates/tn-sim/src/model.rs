//! TransientModel trait for pluggable dynamic systems.

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;
use crate::jacobian::finite_difference_jacobian;

/// Relative perturbation used by the default finite-difference Jacobian.
const FD_EPSILON: f64 = 1e-7;

/// A system of first-order ODEs `dx/dt = f(t, x)`.
///
/// `rhs` takes `&self`: integrators evaluate it at trial points they may
/// reject, so it must not depend on call history.
pub trait TransientModel {
    /// Number of state variables.
    fn dimension(&self) -> usize;

    /// State at the start of the run.
    fn initial_state(&self) -> DVector<f64>;

    /// Compute the state derivative.
    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>>;

    /// Jacobian `df/dx`, used by implicit methods.
    ///
    /// Defaults to forward finite differences; models with a known
    /// Jacobian should override.
    fn jacobian(&self, t: f64, x: &DVector<f64>) -> SimResult<DMatrix<f64>> {
        finite_difference_jacobian(x, |y| self.rhs(t, y), FD_EPSILON)
    }
}
