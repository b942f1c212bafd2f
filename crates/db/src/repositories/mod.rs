//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` (or, for writer-internal steps, the open
//! transaction) as the first argument.

pub mod batch_repo;
pub mod generation_repo;
pub mod task_repo;

pub use batch_repo::BatchRepo;
pub use generation_repo::GenerationRepo;
pub use task_repo::TaskRepo;
