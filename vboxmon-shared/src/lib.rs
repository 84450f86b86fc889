//! vboxmon shared - common types for the core library and its consumers
//!
//! This crate contains the error taxonomy and the hypervisor protocol
//! vocabulary used by the monitoring core (vboxmon), the command-line
//! front end and the test fixtures.

pub mod constants;
pub mod errors;

pub use errors::{VboxError, VboxResult};
