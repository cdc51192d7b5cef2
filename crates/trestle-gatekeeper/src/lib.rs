//! Trestle Gatekeeper
//!
//! Validates raw LLM extraction output before it reaches the graph
//! store. The gatekeeper enforces:
//! - required fields on entities and relationships
//! - closed type vocabularies
//! - temp-id uniqueness and referential integrity
//! - no self-loop relationships
//!
//! Validation is pure filtering: invalid items are dropped with a
//! recorded reason, never errors.
//!
//! # Examples
//!
//! ```
//! use trestle_gatekeeper::{Gatekeeper, ValidationConfig};
//! use trestle_domain::Extraction;
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let outcome = gatekeeper.validate(&Extraction::default());
//! assert!(outcome.entities.is_empty());
//! ```

#![warn(missing_docs)]

mod config;
mod validator;

pub use config::ValidationConfig;
pub use validator::{Gatekeeper, Rejection, RejectionReason, ValidationOutcome};
