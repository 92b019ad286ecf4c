//! Derived task statistics.
//!
//! # Invariants
//! - `total_tasks == completed_tasks + pending_tasks`.
//! - Priority counts include pending tasks only.
//! - Every projection is recomputed from the given slice; nothing is cached.

use crate::model::task::{Priority, Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// Pending task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }

    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub tasks_by_priority: PriorityCounts,
}

impl TaskStats {
    /// Projects statistics over `tasks` in a single pass.
    pub fn project(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total_tasks: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::Pending => {
                    stats.pending_tasks += 1;
                    stats.tasks_by_priority.bump(task.priority);
                }
            }
        }
        stats
    }

    /// Share of completed tasks in `0.0..=1.0`; `0.0` for an empty store.
    pub fn completion_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.completed_tasks as f64 / self.total_tasks as f64
    }
}
