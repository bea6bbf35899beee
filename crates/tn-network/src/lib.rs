//! tn-network: thermal network model for thermonet.
//!
//! Provides:
//! - Node, link and source data structures (`Network`)
//! - Incremental builder with fail-fast parameter checks
//! - Structural validation (reference presence/agreement, connectivity)
//! - Power profiles attached to heat sources
//! - Stable state indexing for the solver
//!
//! # Example
//!
//! ```
//! use tn_network::{Constant, NetworkBuilder};
//!
//! let mut builder = NetworkBuilder::new();
//! builder.add_mass("mass", 9000.0, 298.15).unwrap();
//! builder.add_reference("ambient", 298.15).unwrap();
//! builder.add_link("mass", "ambient", 0.0).unwrap();
//! builder.add_source("mass", Constant::new(50.0).unwrap()).unwrap();
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.nodes().len(), 2);
//! assert_eq!(network.mass_count(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod indexing;
pub mod network;
pub mod profile;
pub(crate) mod validate;

pub use builder::NetworkBuilder;
pub use error::{NetworkError, NetworkResult};
pub use indexing::StateIndex;
pub use network::{Link, Network, Node, NodeKind, Source};
pub use profile::{Constant, FnProfile, PowerProfile, Scaled, Tabulated};
