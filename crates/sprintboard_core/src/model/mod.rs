//! Domain model for tasks, sprints, comments and notification preferences.
//!
//! # Responsibility
//! - Define the record shapes owned by the stores in `service`.
//! - Keep serialized field names compatible with the persisted snapshot format.
//!
//! # Invariants
//! - Ids are process-local integers; uniqueness is scoped to one store.
//! - Records are plain data; lifecycle rules live in the services.

pub mod comment;
pub mod preferences;
pub mod sprint;
pub mod task;
