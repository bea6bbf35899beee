//! Heat-flow profiles attached to network sources.
//!
//! Profiles are pure functions of simulation time: the integrator may evaluate
//! them at trial points it later discards, in any order, possibly from several
//! threads running independent networks.

use std::fmt;
use std::sync::Arc;

use tn_core::ensure_finite;

use crate::error::{NetworkError, NetworkResult};

/// Instantaneous heat flow (W) into a node as a function of time (s).
///
/// Positive values heat the node.
pub trait PowerProfile: Send + Sync {
    fn power_w(&self, t: f64) -> f64;

    /// Short label for diagnostics.
    fn label(&self) -> String {
        "custom".to_string()
    }
}

impl<P: PowerProfile + ?Sized> PowerProfile for Arc<P> {
    fn power_w(&self, t: f64) -> f64 {
        (**self).power_w(t)
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// Constant heat flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    watts: f64,
}

impl Constant {
    pub fn new(watts: f64) -> NetworkResult<Self> {
        let watts = ensure_finite(watts, "source power")?;
        Ok(Self { watts })
    }
}

impl PowerProfile for Constant {
    fn power_w(&self, _t: f64) -> f64 {
        self.watts
    }

    fn label(&self) -> String {
        format!("constant {} W", self.watts)
    }
}

/// Piecewise-linear profile through `(time, watts)` breakpoints.
///
/// Held constant before the first and after the last breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulated {
    times: Vec<f64>,
    watts: Vec<f64>,
}

impl Tabulated {
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> NetworkResult<Self> {
        let (times, watts): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        if times.is_empty() {
            return Err(NetworkError::invalid(
                "tabulated profile",
                "at least one breakpoint is required",
            ));
        }
        for (&t, &p) in times.iter().zip(&watts) {
            ensure_finite(t, "tabulated profile time")?;
            ensure_finite(p, "tabulated profile power")?;
        }
        if times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(NetworkError::invalid(
                "tabulated profile",
                "breakpoint times must be strictly increasing",
            ));
        }
        Ok(Self { times, watts })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl PowerProfile for Tabulated {
    fn power_w(&self, t: f64) -> f64 {
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return self.watts[0];
        }
        if t >= self.times[last] {
            return self.watts[last];
        }
        // first breakpoint strictly after t; 1..=last by the guards above
        let hi = self.times.partition_point(|&x| x <= t);
        let lo = hi - 1;
        let frac = (t - self.times[lo]) / (self.times[hi] - self.times[lo]);
        self.watts[lo] + frac * (self.watts[hi] - self.watts[lo])
    }

    fn label(&self) -> String {
        format!("tabulated ({} points)", self.times.len())
    }
}

/// Another profile multiplied by a constant factor.
#[derive(Clone)]
pub struct Scaled {
    inner: Arc<dyn PowerProfile>,
    factor: f64,
}

impl Scaled {
    pub fn new(inner: impl PowerProfile + 'static, factor: f64) -> NetworkResult<Self> {
        let factor = ensure_finite(factor, "profile scale factor")?;
        Ok(Self {
            inner: Arc::new(inner),
            factor,
        })
    }
}

impl PowerProfile for Scaled {
    fn power_w(&self, t: f64) -> f64 {
        self.factor * self.inner.power_w(t)
    }

    fn label(&self) -> String {
        format!("{} x {}", self.factor, self.inner.label())
    }
}

impl fmt::Debug for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scaled")
            .field("inner", &self.inner.label())
            .field("factor", &self.factor)
            .finish()
    }
}

/// Wraps a plain closure.
///
/// The closure must not keep hidden mutable state.
pub struct FnProfile<F> {
    f: F,
}

impl<F> FnProfile<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PowerProfile for FnProfile<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn power_w(&self, t: f64) -> f64 {
        (self.f)(t)
    }
}

impl<F> fmt::Debug for FnProfile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnProfile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_time() {
        let p = Constant::new(50.0).unwrap();
        assert_eq!(p.power_w(0.0), 50.0);
        assert_eq!(p.power_w(1e9), 50.0);
        assert!(Constant::new(f64::NAN).is_err());
    }

    #[test]
    fn tabulated_interpolates_and_clamps() {
        let p = Tabulated::new([(0.0, 0.0), (10.0, 100.0), (20.0, 100.0)]).unwrap();
        assert_eq!(p.power_w(-5.0), 0.0);
        assert!((p.power_w(2.5) - 25.0).abs() < 1e-12);
        assert_eq!(p.power_w(10.0), 100.0);
        assert_eq!(p.power_w(15.0), 100.0);
        assert_eq!(p.power_w(1e6), 100.0);
    }

    #[test]
    fn tabulated_single_point_is_constant() {
        let p = Tabulated::new([(5.0, 12.0)]).unwrap();
        assert_eq!(p.power_w(0.0), 12.0);
        assert_eq!(p.power_w(5.0), 12.0);
        assert_eq!(p.power_w(50.0), 12.0);
    }

    #[test]
    fn tabulated_rejects_bad_breakpoints() {
        assert!(Tabulated::new(Vec::<(f64, f64)>::new()).is_err());
        assert!(Tabulated::new([(0.0, 1.0), (0.0, 2.0)]).is_err());
        assert!(Tabulated::new([(1.0, 1.0), (0.0, 2.0)]).is_err());
        assert!(Tabulated::new([(0.0, f64::INFINITY)]).is_err());
    }

    #[test]
    fn scaled_multiplies_inner() {
        let peak = Constant::new(3550.0).unwrap();
        let half = Scaled::new(peak, 0.5).unwrap();
        assert_eq!(half.power_w(123.0), 1775.0);
    }

    #[test]
    fn closure_profile_is_pure() {
        let p = FnProfile::new(|t| 2.0 * t);
        assert_eq!(p.power_w(3.0), 6.0);
        assert_eq!(p.power_w(3.0), 6.0);
    }
}
