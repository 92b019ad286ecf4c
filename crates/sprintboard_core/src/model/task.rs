//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted by `TaskService`.
//! - Provide creation and partial-update request shapes.
//!
//! # Invariants
//! - `id` is assigned by the store and never changed by a patch.
//! - Wire names are camelCase (`dueDate`, `assignedTo`) and enum values are
//!   lowercase, so existing snapshots decode unchanged.
//! - `dueDate` is read as a plain date or an RFC 3339 timestamp and always
//!   written back as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Stable task identifier, derived from creation time in epoch milliseconds.
pub type TaskId = i64;

/// Task urgency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Task completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Calendar day the task is due; carries no time-of-day.
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Assignee display name or user id.
    pub assigned_to: String,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Applies every field set in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
    }
}

/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps such as
/// `2025-04-06T10:00:00.000Z`; the latter keeps only its calendar day.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid dueDate `{raw}`; expected YYYY-MM-DD or an RFC 3339 timestamp"
        ))
    })
}

fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|timestamp| timestamp.date_naive())
    })
}

/// Creation request for a task; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_to: String,
}

impl NewTask {
    /// Builds a pending task request with empty description and assignee.
    pub fn pending(title: impl Into<String>, due_date: NaiveDate, priority: Priority) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            priority,
            status: TaskStatus::Pending,
            assigned_to: String::new(),
        }
    }

    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to,
        }
    }
}

/// Partial update for a task. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
}
