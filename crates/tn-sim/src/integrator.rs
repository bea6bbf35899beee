//! Single-step integration methods with embedded error estimates.
//!
//! Each method proposes a trial step of size `h` from an accepted point and
//! reports a local error estimate; accepting or rejecting the trial is the
//! runner's job (see `solver::integrate`).

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;
use crate::model::TransientModel;
use crate::newton::{NewtonConfig, newton_solve};

/// Integration method selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Explicit Runge-Kutta 5(4) (default; non-stiff networks).
    #[default]
    DormandPrince,
    /// Implicit trapezoidal rule with a backward-Euler error companion
    /// (stiff networks: time constants far below the horizon).
    Trapezoidal,
}

impl Method {
    /// Exponent `1 / (p + 1)` used by the step-size controller, where `p` is
    /// the order of the error estimate.
    pub fn controller_exponent(self) -> f64 {
        match self {
            Method::DormandPrince => 1.0 / 5.0,
            Method::Trapezoidal => 1.0 / 2.0,
        }
    }

    pub fn is_implicit(self) -> bool {
        matches!(self, Method::Trapezoidal)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::DormandPrince => f.write_str("dormand-prince"),
            Method::Trapezoidal => f.write_str("trapezoidal"),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dormand-prince" | "dopri" | "rk45" | "explicit" => Ok(Method::DormandPrince),
            "trapezoidal" | "trap" | "implicit" | "stiff" => Ok(Method::Trapezoidal),
            other => Err(format!("unknown integration method: {other}")),
        }
    }
}

/// Outcome of one trial step.
#[derive(Clone, Debug)]
pub struct Trial {
    /// Proposed state at `t + h`.
    pub x_new: DVector<f64>,
    /// Local error estimate, per component.
    pub error: DVector<f64>,
    /// RHS evaluations spent on this trial.
    pub rhs_evals: usize,
    /// Jacobian evaluations spent on this trial.
    pub jacobian_evals: usize,
    /// False when an implicit stage failed to converge.
    pub converged: bool,
}

/// Dormand-Prince 5(4) tableau.
#[derive(Clone, Debug, Default)]
pub struct DormandPrince;

impl DormandPrince {
    const C: [f64; 6] = [1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

    const A2: [f64; 1] = [1.0 / 5.0];
    const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
    const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
    const A5: [f64; 4] = [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
    ];
    const A6: [f64; 5] = [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ];
    // 5th-order weights (also the stage-7 row)
    const B: [f64; 6] = [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ];
    // b - b*, difference to the embedded 4th-order weights
    const E: [f64; 7] = [
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ];

    /// Trial step from `(t, x)` with `f0 = f(t, x)` already known.
    pub fn attempt<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        f0: &DVector<f64>,
        h: f64,
    ) -> SimResult<Trial> {
        let stage = |ks: &[&DVector<f64>], a: &[f64]| -> DVector<f64> {
            let mut y = x.clone();
            for (k, &coef) in ks.iter().zip(a) {
                if coef != 0.0 {
                    y.axpy(h * coef, *k, 1.0);
                }
            }
            y
        };

        let k1 = f0;
        let k2 = model.rhs(t + Self::C[0] * h, &stage(&[k1], &Self::A2))?;
        let k3 = model.rhs(t + Self::C[1] * h, &stage(&[k1, &k2], &Self::A3))?;
        let k4 = model.rhs(t + Self::C[2] * h, &stage(&[k1, &k2, &k3], &Self::A4))?;
        let k5 = model.rhs(
            t + Self::C[3] * h,
            &stage(&[k1, &k2, &k3, &k4], &Self::A5),
        )?;
        let k6 = model.rhs(
            t + Self::C[4] * h,
            &stage(&[k1, &k2, &k3, &k4, &k5], &Self::A6),
        )?;

        let x_new = stage(&[k1, &k2, &k3, &k4, &k5, &k6], &Self::B);
        let k7 = model.rhs(t + Self::C[5] * h, &x_new)?;

        let mut error = DVector::zeros(x.len());
        for (k, &e) in [k1, &k2, &k3, &k4, &k5, &k6, &k7].iter().zip(&Self::E) {
            if e != 0.0 {
                error.axpy(h * e, *k, 1.0);
            }
        }

        Ok(Trial {
            x_new,
            error,
            rhs_evals: 6,
            jacobian_evals: 0,
            converged: true,
        })
    }
}

/// Implicit trapezoidal rule.
///
/// The stage equation `y = x + h/2 (f(t, x) + f(t + h, y))` is solved by
/// simplified Newton with the iteration matrix `I - h/2 J`. A backward-Euler
/// solution `y = x + h f(t + h, y)` is computed alongside; the difference of
/// the two is the error estimate.
#[derive(Clone, Debug, Default)]
pub struct Trapezoidal {
    pub newton: NewtonConfig,
}

impl Trapezoidal {
    pub fn new(newton: NewtonConfig) -> Self {
        Self { newton }
    }

    /// Trial step from `(t, x)` with `f0 = f(t, x)` already known.
    ///
    /// `weights` scale the Newton convergence test per component.
    pub fn attempt<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        f0: &DVector<f64>,
        h: f64,
        weights: &DVector<f64>,
    ) -> SimResult<Trial> {
        let n = x.len();
        if n == 0 {
            return Ok(Trial {
                x_new: x.clone(),
                error: DVector::zeros(0),
                rhs_evals: 0,
                jacobian_evals: 0,
                converged: true,
            });
        }

        let t1 = t + h;
        let jac = model.jacobian(t1, x)?;
        let identity = DMatrix::<f64>::identity(n, n);

        // Explicit Euler predictor for both solves
        let mut guess = x.clone();
        guess.axpy(h, f0, 1.0);

        let trap = newton_solve(
            guess.clone(),
            |y| {
                let f1 = model.rhs(t1, y)?;
                let mut r = y - x;
                r.axpy(-0.5 * h, f0, 1.0);
                r.axpy(-0.5 * h, &f1, 1.0);
                Ok(r)
            },
            &identity - &jac * (0.5 * h),
            weights,
            &self.newton,
        )?;

        let euler = newton_solve(
            guess,
            |y| {
                let f1 = model.rhs(t1, y)?;
                let mut r = y - x;
                r.axpy(-h, &f1, 1.0);
                Ok(r)
            },
            &identity - &jac * h,
            weights,
            &self.newton,
        )?;

        let error = &trap.x - &euler.x;
        Ok(Trial {
            x_new: trap.x,
            error,
            rhs_evals: trap.evaluations + euler.evaluations,
            jacobian_evals: 1,
            converged: trap.converged && euler.converged,
        })
    }
}
