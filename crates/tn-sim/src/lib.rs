//! Transient simulation of lumped thermal networks.
//!
//! Provides:
//! - Source evaluation (total heat flow per mass node at a time)
//! - Thermal model assembly: `dT/dt = (P(t) + b - K T) / C`
//! - Adaptive integrators: explicit Dormand-Prince 5(4) and implicit trapezoidal
//! - Solver runner with a caller-visible lifecycle
//! - Signal log for named time series
//! - Closed-form references for simple circuits

pub mod error;
pub mod integrator;
pub mod jacobian;
pub mod model;
pub mod newton;
pub mod signal;
pub mod solver;
pub mod sources;
pub mod theory;
pub mod thermal;

pub use error::{SimError, SimResult};
pub use integrator::{DormandPrince, Method, Trapezoidal, Trial};
pub use model::TransientModel;
pub use newton::{NewtonConfig, NewtonResult};
pub use signal::{Signal, SignalLog, StateView};
pub use solver::{IntegrationStats, RunSummary, Solver, SolverOptions, SolverStatus, integrate};
pub use sources::SourceEvaluator;
pub use theory::{FirstOrderResponse, NoLossPrediction, no_loss_prediction};
pub use thermal::ThermalModel;
