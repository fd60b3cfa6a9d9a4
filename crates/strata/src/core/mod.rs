//! Core building blocks of the layout engine
//!
//! Deterministic identity keys, the external graph snapshot types, error
//! taxonomy, and logging setup.

mod error;
mod keys;
pub mod logging;
mod types;

pub use error::*;
pub use keys::*;
pub use logging::*;
pub use types::*;
