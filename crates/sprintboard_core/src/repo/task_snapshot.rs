//! JSON snapshot codec for the task collection.
//!
//! # Invariants
//! - The snapshot is a JSON array of task records in store order.
//! - Decoding rejects records with missing fields and duplicate ids; no
//!   defaults or migrations are applied.

use crate::model::task::{Task, TaskId};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    DuplicateId(TaskId),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid task snapshot: {err}"),
            Self::DuplicateId(id) => write!(f, "invalid task snapshot: duplicate task id {id}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(tasks)?)
}

pub fn decode_tasks(raw: &str) -> Result<Vec<Task>, SnapshotError> {
    let tasks: Vec<Task> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(SnapshotError::DuplicateId(task.id));
        }
    }
    Ok(tasks)
}
