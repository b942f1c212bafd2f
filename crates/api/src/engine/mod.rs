//! Post-commit dispatch engine.

pub mod dispatch;

pub use dispatch::DispatchCoordinator;
