//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;

/// Forward-difference Jacobian `df/dx` at `x`.
///
/// Column j perturbs `x[j]` by `epsilon * max(|x[j]|, 1)`, so temperatures
/// in the hundreds of kelvin get a step proportional to their magnitude.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SimResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SimResult<DVector<f64>>,
{
    let base = f(x)?;
    if x.is_empty() {
        return Ok(DMatrix::zeros(base.len(), 0));
    }

    let columns = (0..x.len())
        .map(|j| -> SimResult<DVector<f64>> {
            let step = perturbation(x[j], epsilon);
            let mut shifted = x.clone();
            shifted[j] += step;
            Ok((f(&shifted)? - &base) / step)
        })
        .collect::<SimResult<Vec<DVector<f64>>>>()?;

    Ok(DMatrix::from_columns(&columns))
}

fn perturbation(value: f64, epsilon: f64) -> f64 {
    epsilon * value.abs().max(1.0)
}
