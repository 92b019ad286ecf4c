//! Stores and use-case services.
//!
//! # Responsibility
//! - Own in-memory collections and their mutation rules.
//! - Derive projections and dispatch notifications over store state.
//! - Keep callers decoupled from storage details.

pub mod notification_service;
pub mod sprint_service;
pub mod stats;
pub mod task_service;
pub mod upload;
