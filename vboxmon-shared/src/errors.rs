//! Error types for the monitoring core.
//!
//! Errors are categorized by how far they are allowed to travel:
//! - [`VboxError::Discovery`]: machine listing failed, the only fatal condition
//! - [`VboxError::Reload`]: one info dump failed, previous snapshot kept
//! - [`VboxError::MetricParse`] / [`VboxError::Process`]: contained to one
//!   counter query or one command invocation
//!
//! Everything else (unavailable metrics, collection timeouts, lifecycle
//! mismatches) is represented as a value, not an error.

use thiserror::Error;

/// Errors that can occur while talking to the hypervisor.
#[derive(Debug, Error)]
pub enum VboxError {
    /// The hypervisor executable could not be spawned or awaited.
    #[error("process: {0}")]
    Process(String),

    /// Listing machines failed. Without it nothing else can work.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Machine-readable info dump failed for one machine.
    #[error("reload of machine {machine_id} failed: {reason}")]
    Reload { machine_id: String, reason: String },

    /// Counter value text did not match its unit grammar.
    #[error("cannot parse metric value '{value}': {reason}")]
    MetricParse { value: String, reason: String },

    /// Options rejected during validation.
    #[error("config: {0}")]
    Config(String),

    /// Credential document could not be read or decoded.
    #[error("credentials: {0}")]
    Credentials(String),

    /// No machine with this id is known.
    #[error("machine not found: {0}")]
    NotFound(String),

    #[error("internal: {0}")]
    Internal(String),
}

/// Result alias used across the workspace.
pub type VboxResult<T> = Result<T, VboxError>;
