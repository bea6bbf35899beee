//! Adaptive integration runner and the network solver built on it.

use std::collections::BTreeMap;

use nalgebra::DVector;
use tn_network::Network;
use tracing::{debug, info, info_span, warn};

use crate::error::{SimError, SimResult};
use crate::integrator::{DormandPrince, Method, Trapezoidal};
use crate::model::TransientModel;
use crate::newton::NewtonConfig;
use crate::signal::{SignalLog, StateView};
use crate::thermal::ThermalModel;

/// Options for adaptive runs.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// Integration method (default: Dormand-Prince)
    pub method: Method,
    /// Start time (seconds)
    pub t0: f64,
    /// Final time (seconds)
    pub t_stop: f64,
    /// Relative tolerance on the local error
    pub rtol: f64,
    /// Absolute tolerance on the local error (K)
    pub atol: f64,
    /// First trial step; defaults to 1e-3 of the span
    pub h_init: Option<f64>,
    /// Smallest allowed step; defaults to 1e-12 of the span, and never
    /// below 4 ulps of the current time
    pub h_min: Option<f64>,
    /// Largest allowed step; defaults to the span
    pub h_max: Option<f64>,
    /// Limit on step attempts, accepted plus rejected
    pub max_steps: usize,
    /// Safety factor applied to the optimal step
    pub safety: f64,
    /// Smallest step change per attempt
    pub min_factor: f64,
    /// Largest step growth per accepted step
    pub max_factor: f64,
    /// Newton settings for implicit stages
    pub newton: NewtonConfig,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            t0: 0.0,
            t_stop: 3600.0,
            rtol: 1e-6,
            atol: 1e-6,
            h_init: None,
            h_min: None,
            h_max: None,
            max_steps: 1_000_000,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            newton: NewtonConfig::default(),
        }
    }
}

impl SolverOptions {
    /// Same defaults over `[0, t_stop]`.
    pub fn until(t_stop: f64) -> Self {
        Self {
            t_stop,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        let finite = [
            ("t0", self.t0),
            ("t_stop", self.t_stop),
            ("rtol", self.rtol),
            ("atol", self.atol),
            ("safety", self.safety),
            ("min_factor", self.min_factor),
            ("max_factor", self.max_factor),
        ];
        for (what, v) in finite {
            if !v.is_finite() {
                return Err(SimError::invalid(what, format!("must be finite, got {v}")));
            }
        }
        if self.t_stop <= self.t0 {
            return Err(SimError::invalid(
                "t_stop",
                format!("{} must be greater than t0 = {}", self.t_stop, self.t0),
            ));
        }
        if self.rtol < 0.0 || self.atol < 0.0 || (self.rtol == 0.0 && self.atol == 0.0) {
            return Err(SimError::invalid(
                "tolerances",
                "rtol and atol must be >= 0 and not both zero",
            ));
        }
        for (what, h) in [
            ("h_init", self.h_init),
            ("h_min", self.h_min),
            ("h_max", self.h_max),
        ] {
            if let Some(h) = h {
                if !(h.is_finite() && h > 0.0) {
                    return Err(SimError::invalid(what, format!("must be > 0, got {h}")));
                }
            }
        }
        if self.max_steps == 0 {
            return Err(SimError::invalid("max_steps", "must be positive"));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(SimError::invalid("safety", "must be in (0, 1]"));
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0 && self.max_factor > 1.0) {
            return Err(SimError::invalid(
                "step factors",
                "need 0 < min_factor < 1 < max_factor",
            ));
        }
        if self.newton.max_iterations == 0 || !(self.newton.tolerance > 0.0) {
            return Err(SimError::invalid(
                "newton",
                "need at least one iteration and a positive tolerance",
            ));
        }
        Ok(())
    }

    fn span(&self) -> f64 {
        self.t_stop - self.t0
    }
}

/// Counters for one integration run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
    pub jacobian_evaluations: usize,
    pub t_final: f64,
}

/// Integrate `model` over `[t0, t_stop]` with adaptive steps.
///
/// `on_accept(t, x, dxdt)` is called at `t0` and after every accepted step,
/// never for rejected trials. Divergence carries the last accepted time and
/// mass state.
pub fn integrate<M, F>(
    model: &M,
    opts: &SolverOptions,
    mut on_accept: F,
) -> SimResult<IntegrationStats>
where
    M: TransientModel,
    F: FnMut(f64, &DVector<f64>, &DVector<f64>) -> SimResult<()>,
{
    opts.validate()?;

    let span = opts.span();
    let h_max = opts.h_max.unwrap_or(span).min(span);
    let h_min = opts.h_min.unwrap_or(span * 1e-12);
    let mut h = opts.h_init.unwrap_or(span * 1e-3).min(h_max);
    if h < h_min {
        return Err(SimError::invalid(
            "h_init",
            format!("{h} is below h_min = {h_min}"),
        ));
    }

    let exponent = opts.method.controller_exponent();
    let explicit = DormandPrince;
    let implicit = Trapezoidal::new(opts.newton.clone());

    let mut stats = IntegrationStats {
        t_final: opts.t0,
        ..IntegrationStats::default()
    };
    let mut t = opts.t0;
    let mut x = model.initial_state();
    if !all_finite(&x) {
        return Err(diverged(t, &x, "non-finite initial state"));
    }
    let mut f = model.rhs(t, &x).map_err(|e| source_divergence(e, t, &x))?;
    stats.rhs_evaluations += 1;
    on_accept(t, &x, &f)?;

    let mut rejected_last = false;
    while t < opts.t_stop {
        if stats.accepted_steps + stats.rejected_steps >= opts.max_steps {
            warn!(t, max_steps = opts.max_steps, "step limit reached");
            return Err(diverged(
                t,
                &x,
                format!("exceeded max_steps = {}", opts.max_steps),
            ));
        }

        let remaining = opts.t_stop - t;
        let last = h >= remaining;
        let h_step = if last { remaining } else { h };

        let trial = match opts.method {
            Method::DormandPrince => explicit.attempt(model, t, &x, &f, h_step),
            Method::Trapezoidal => {
                let weights = x.map(|v| opts.atol + opts.rtol * v.abs());
                implicit.attempt(model, t, &x, &f, h_step, &weights)
            }
        }
        .map_err(|e| source_divergence(e, t, &x))?;
        stats.rhs_evaluations += trial.rhs_evals;
        stats.jacobian_evaluations += trial.jacobian_evals;

        let err = if trial.converged && all_finite(&trial.x_new) && all_finite(&trial.error) {
            error_norm(&trial.error, &x, &trial.x_new, opts.rtol, opts.atol)
        } else {
            f64::INFINITY
        };

        if err <= 1.0 {
            let t_next = if last {
                opts.t_stop
            } else {
                (t + h_step).min(opts.t_stop)
            };
            if t_next <= t {
                warn!(t, h = h_step, "step does not advance time");
                return Err(diverged(
                    t,
                    &x,
                    format!("step {h_step:e} s no longer advances t = {t} s"),
                ));
            }
            t = t_next;
            x = trial.x_new;
            f = model.rhs(t, &x).map_err(|e| source_divergence(e, t, &x))?;
            stats.rhs_evaluations += 1;
            stats.accepted_steps += 1;
            on_accept(t, &x, &f)?;

            let mut factor = step_factor(err, exponent, opts);
            if rejected_last {
                factor = factor.min(1.0);
            }
            h = (h_step * factor).min(h_max);
            rejected_last = false;
        } else {
            stats.rejected_steps += 1;
            let factor = step_factor(err, exponent, opts);
            debug!(t, h = h_step, err, converged = trial.converged, "step rejected");
            h = h_step * factor;
            rejected_last = true;
            // t itself only resolves steps of a few ulps
            let floor = h_min.max(t.abs() * 4.0 * f64::EPSILON);
            if h < floor {
                warn!(t, h, h_min = floor, "step size underflow");
                return Err(diverged(
                    t,
                    &x,
                    format!("step size {h:e} s fell below h_min = {floor:e} s"),
                ));
            }
        }
    }

    stats.t_final = t;
    Ok(stats)
}

/// `max_i |e_i| / (atol + rtol max(|x_i|, |x_new_i|))`
fn error_norm(
    error: &DVector<f64>,
    x: &DVector<f64>,
    x_new: &DVector<f64>,
    rtol: f64,
    atol: f64,
) -> f64 {
    error
        .iter()
        .zip(x.iter().zip(x_new.iter()))
        .map(|(e, (a, b))| e.abs() / (atol + rtol * a.abs().max(b.abs())))
        .fold(0.0, f64::max)
}

fn step_factor(err: f64, exponent: f64, opts: &SolverOptions) -> f64 {
    if err == 0.0 {
        opts.max_factor
    } else if !err.is_finite() {
        opts.min_factor
    } else {
        (opts.safety * err.powf(-exponent)).clamp(opts.min_factor, opts.max_factor)
    }
}

fn all_finite(x: &DVector<f64>) -> bool {
    x.iter().all(|v| v.is_finite())
}

fn diverged(time: f64, x: &DVector<f64>, reason: impl Into<String>) -> SimError {
    SimError::IntegrationDiverged {
        time,
        state: x.iter().copied().collect(),
        reason: reason.into(),
    }
}

fn source_divergence(err: SimError, t: f64, x: &DVector<f64>) -> SimError {
    match err {
        SimError::NonFiniteSource { time, value } => {
            warn!(time, value, "non-finite source power");
            diverged(
                t,
                x,
                format!("non-finite heat flow {value} W at t = {time} s"),
            )
        }
        other => other,
    }
}

/// Caller-visible solver lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub method: Method,
    pub stats: IntegrationStats,
    /// Final temperature (K) of every node, keyed by node name.
    pub final_temperatures_k: BTreeMap<String, f64>,
}

impl RunSummary {
    pub fn temperature_k(&self, node: &str) -> Option<f64> {
        self.final_temperatures_k.get(node).copied()
    }
}

/// Integrates one network once, logging into a caller-owned `SignalLog`.
pub struct Solver<'a> {
    network: &'a Network,
    model: ThermalModel,
    options: SolverOptions,
    status: SolverStatus,
}

impl<'a> Solver<'a> {
    /// Assemble the thermal model for `network`.
    ///
    /// Options are checked here so a bad configuration fails before any
    /// log is touched.
    pub fn new(network: &'a Network, options: SolverOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self {
            network,
            model: ThermalModel::new(network),
            options,
            status: SolverStatus::NotStarted,
        })
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn model(&self) -> &ThermalModel {
        &self.model
    }

    /// Integrate from `t0` to `t_stop`, appending to `log` at every
    /// accepted point. The log is sealed when the run ends, whether it
    /// succeeds or fails.
    pub fn run(&mut self, log: &mut SignalLog) -> SimResult<RunSummary> {
        if self.status != SolverStatus::NotStarted {
            return Err(SimError::invalid(
                "solver",
                format!("already run (status {:?})", self.status),
            ));
        }
        log.check_network(self.network)?;

        let span = info_span!(
            "run",
            method = %self.options.method,
            t_stop = self.options.t_stop,
            masses = self.model.dimension()
        );
        let _guard = span.enter();
        info!(
            signals = log.names().count(),
            min_time_constant_s = self.model.min_time_constant(),
            "starting integration"
        );

        self.status = SolverStatus::Running;
        let model = &self.model;
        let mut last_temperatures = Vec::new();
        let result = integrate(model, &self.options, |t, x, dxdt| {
            let temperatures = model.node_temperatures(x);
            let rates = model.node_rates(dxdt);
            log.append(&StateView {
                time: t,
                temperatures_k: &temperatures,
                rates_k_per_s: &rates,
            })?;
            last_temperatures = temperatures;
            Ok(())
        });
        log.seal();

        match result {
            Ok(stats) => {
                self.status = SolverStatus::Completed;
                info!(
                    accepted = stats.accepted_steps,
                    rejected = stats.rejected_steps,
                    rhs_evaluations = stats.rhs_evaluations,
                    "integration complete"
                );
                Ok(self.summary(stats, &last_temperatures))
            }
            Err(err) => {
                self.status = SolverStatus::Failed;
                warn!(error = %err, "integration failed");
                Err(match err {
                    SimError::IntegrationDiverged {
                        time,
                        state,
                        reason,
                    } => SimError::IntegrationDiverged {
                        time,
                        state: model.node_temperatures(&DVector::from_vec(state)),
                        reason,
                    },
                    other => other,
                })
            }
        }
    }

    fn summary(&self, stats: IntegrationStats, temperatures_k: &[f64]) -> RunSummary {
        let final_temperatures_k = self
            .network
            .nodes()
            .iter()
            .filter_map(|n| {
                temperatures_k
                    .get(n.id.index())
                    .map(|&t| (n.name.clone(), t))
            })
            .collect();
        RunSummary {
            method: self.options.method,
            stats,
            final_temperatures_k,
        }
    }
}
