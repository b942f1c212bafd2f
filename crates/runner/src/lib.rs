//! Client library for the external generation worker runtime.
//!
//! The runner is the service that actually executes generation work and
//! reports task status back to the database. This crate only knows how
//! to hand work off to it: construct a [`client::RunnerClient`] (which
//! mints the short-lived dispatch credential) and fire one
//! start-generation call per unit of work.

pub mod client;

pub use client::{RunnerClient, RunnerConfig, RunnerIdentity, StartGeneration};

/// Errors raised while constructing or using the runner client.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The dispatch credential could not be minted.
    #[error("Dispatch credential error: {0}")]
    Credential(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Runner connection error: {0}")]
    Connection(String),

    /// A start-generation request failed.
    #[error("Runner request failed: {0}")]
    Request(String),
}
