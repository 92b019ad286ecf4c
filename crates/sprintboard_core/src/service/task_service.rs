//! Task store: in-memory collection with snapshot persistence.
//!
//! # Responsibility
//! - Own the task collection and its CRUD operations.
//! - Notify subscribers after each mutation, then persist the whole
//!   collection under one storage key.
//! - Serve the statistics projection over current state.
//!
//! # Invariants
//! - Task ids are unique within the store. They follow creation time
//!   unless a stored id already sits at `TaskId::MAX`.
//! - Mutations are applied in memory even when persisting them fails; the
//!   failure is logged and `flush` can retry.
//! - Reads return copies; callers never alias internal state.

use crate::event::{ChangeNotifier, SubscriptionId};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::repo::kv_repo::{KeyValueRepository, RepoError};
use crate::repo::task_snapshot::{decode_tasks, encode_tasks, SnapshotError};
use crate::service::stats::TaskStats;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Storage key used when none is configured.
pub const DEFAULT_TASKS_KEY: &str = "tasks";

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Persisted snapshot could not be decoded.
    Snapshot(SnapshotError),
    /// Storage read or write failure.
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TaskNotFound(_) => None,
            Self::Snapshot(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SnapshotError> for TaskServiceError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// What happened to the task collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskChangeKind {
    Added,
    Updated,
    Deleted,
    StatusToggled,
}

/// Event delivered to task subscribers after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskChange {
    pub kind: TaskChangeKind,
    pub task_id: TaskId,
}

/// Task store over a key/value repository.
pub struct TaskService<R: KeyValueRepository> {
    repo: R,
    storage_key: String,
    tasks: Vec<Task>,
    notifier: ChangeNotifier<TaskChange>,
}

impl<R: KeyValueRepository> TaskService<R> {
    /// Opens the store, falling back to an empty collection when the stored
    /// snapshot is missing, unreadable or corrupt.
    pub fn open(repo: R, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let tasks = match load_snapshot(&repo, &storage_key) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(
                    "event=task_store_load module=task_service status=fallback key={} error={}",
                    storage_key, err
                );
                Vec::new()
            }
        };
        Self::with_tasks(repo, storage_key, tasks)
    }

    /// Opens the store, surfacing snapshot and storage errors to the caller.
    pub fn open_strict(repo: R, storage_key: impl Into<String>) -> Result<Self, TaskServiceError> {
        let storage_key = storage_key.into();
        let tasks = load_snapshot(&repo, &storage_key)?;
        Ok(Self::with_tasks(repo, storage_key, tasks))
    }

    fn with_tasks(repo: R, storage_key: String, tasks: Vec<Task>) -> Self {
        info!(
            "event=task_store_load module=task_service status=ok key={} count={}",
            storage_key,
            tasks.len()
        );
        Self {
            repo,
            storage_key,
            tasks,
            notifier: ChangeNotifier::new("task_service"),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Returns a copy of every task in insertion order.
    pub fn list_tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.tasks.iter().find(|task| task.id == id).cloned()
    }

    /// Returns tasks due on `date`.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.due_date == date)
            .cloned()
            .collect()
    }

    /// Returns tasks due on the calendar day of `at`; time-of-day is ignored.
    pub fn tasks_due_on(&self, at: NaiveDateTime) -> Vec<Task> {
        self.tasks_for_date(at.date())
    }

    /// Adds a task with a fresh timestamp-derived id.
    pub fn add_task(&mut self, new_task: NewTask) -> Task {
        let id = next_task_id(Utc::now().timestamp_millis(), &self.tasks);
        let task = new_task.into_task(id);
        self.tasks.push(task.clone());
        debug!(
            "event=task_add module=task_service status=ok task_id={} priority={:?}",
            id, task.priority
        );
        self.commit(TaskChangeKind::Added, id);
        task
    }

    /// Applies `patch` to an existing task.
    ///
    /// # Errors
    /// - `TaskNotFound` when no task has `id`; nothing is notified.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task, TaskServiceError> {
        let task = self.find_mut(id)?;
        task.apply(patch);
        let updated = task.clone();
        self.commit(TaskChangeKind::Updated, id);
        Ok(updated)
    }

    /// Removes the task with `id`. Absent ids are not an error.
    pub fn delete_task(&mut self, id: TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        debug!(
            "event=task_delete module=task_service status=ok task_id={} removed={}",
            id,
            before - self.tasks.len()
        );
        self.commit(TaskChangeKind::Deleted, id);
    }

    /// Flips a task between pending and completed.
    ///
    /// # Errors
    /// - `TaskNotFound` when no task has `id`.
    pub fn toggle_task_status(&mut self, id: TaskId) -> Result<Task, TaskServiceError> {
        let task = self.find_mut(id)?;
        task.status = task.status.toggled();
        let toggled = task.clone();
        self.commit(TaskChangeKind::StatusToggled, id);
        Ok(toggled)
    }

    /// Computes statistics over the current collection.
    pub fn stats(&self) -> TaskStats {
        TaskStats::project(&self.tasks)
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&TaskChange) + 'static) -> SubscriptionId {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Writes the current collection to storage and reports failures.
    pub fn flush(&self) -> Result<(), TaskServiceError> {
        let raw = encode_tasks(&self.tasks)?;
        self.repo.put(&self.storage_key, &raw)?;
        Ok(())
    }

    fn find_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskServiceError> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    fn commit(&mut self, kind: TaskChangeKind, task_id: TaskId) {
        self.notifier.notify(&TaskChange { kind, task_id });
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.flush() {
            error!(
                "event=task_store_persist module=task_service status=error key={} count={} error={}",
                self.storage_key,
                self.tasks.len(),
                err
            );
        }
    }
}

impl<R: KeyValueRepository> Debug for TaskService<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService")
            .field("storage_key", &self.storage_key)
            .field("tasks", &self.tasks.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

fn load_snapshot<R: KeyValueRepository>(
    repo: &R,
    storage_key: &str,
) -> Result<Vec<Task>, TaskServiceError> {
    match repo.get(storage_key)? {
        Some(raw) => Ok(decode_tasks(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Picks the creation timestamp as id, bumped past the largest existing id
/// so two tasks created in the same millisecond stay distinct.
fn next_task_id(now_ms: i64, tasks: &[Task]) -> TaskId {
    match tasks.iter().map(|task| task.id).max() {
        Some(max) if max >= now_ms => max
            .checked_add(1)
            .unwrap_or_else(|| first_free_task_id(now_ms, tasks)),
        _ => now_ms,
    }
}

// Only reached when a stored id sits at `TaskId::MAX`.
fn first_free_task_id(start: TaskId, tasks: &[Task]) -> TaskId {
    let used: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
    let id = (start..=TaskId::MAX)
        .chain(TaskId::MIN..start)
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(start);
    warn!(
        "event=task_id_exhausted module=task_service status=fallback start={} assigned={}",
        start, id
    );
    id
}
