//! Domain logic for the easel batch generation platform.
//!
//! This crate holds everything that does not touch the network or the
//! database: the error taxonomy, shared ID types, request config
//! sanitization, and batch seed allocation. Keeping these pure makes
//! them trivially testable and reusable from both the API and any
//! future worker-side tooling.

pub mod error;
pub mod files;
pub mod sanitize;
pub mod seeds;
pub mod types;

pub use error::CoreError;
