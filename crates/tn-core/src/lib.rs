//! tn-core: shared foundation for thermonet.
//!
//! Contains:
//! - units (uom SI types, constructors, Celsius/Kelvin boundary conversion)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact handles for network objects)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
