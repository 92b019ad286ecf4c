//! Durable storage abstractions and snapshot codecs.
//!
//! # Responsibility
//! - Define the string-keyed storage contract used by persisting stores.
//! - Isolate SQLite details from service orchestration.
//! - Encode and decode whole-collection snapshots.
//!
//! # Invariants
//! - Keys are non-empty.
//! - Decode never masks invalid data; fallback policy belongs to callers.

pub mod kv_repo;
pub mod task_snapshot;
