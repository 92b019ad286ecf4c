//! Sprint, resource and comment store.
//!
//! # Responsibility
//! - Own sprints, resource utilization and task comments for one session.
//! - Notify subscribers after each successful mutation.
//!
//! # Invariants
//! - Session-only: nothing here is written to durable storage.
//! - New ids are `largest existing id + 1`, so they never collide even if
//!   removal is added later.
//! - `utilized_hours` is recomputed on every assignment update.
//! - More than one active sprint is tolerated; `active_sprint` returns the
//!   first in insertion order.

use crate::event::{ChangeNotifier, SubscriptionId};
use crate::model::comment::{CommentId, NewComment, TaskComment};
use crate::model::sprint::{
    Assignment, Complexity, NewResource, NewSprint, ResourceId, ResourceUtilization, Sprint,
    SprintId, SprintStatus, SprintTask, SprintTaskId, SprintTaskStatus, TaskPrediction,
    MAX_PREDICTION,
};
use crate::model::task::TaskId;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default sprint length used by the seed data.
pub const SPRINT_LENGTH_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SprintServiceError {
    SprintNotFound(SprintId),
    ResourceNotFound(ResourceId),
    InvalidPrediction { task_id: SprintTaskId, value: u8 },
}

impl Display for SprintServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SprintNotFound(id) => write!(f, "sprint not found: {id}"),
            Self::ResourceNotFound(id) => write!(f, "resource not found: {id}"),
            Self::InvalidPrediction { task_id, value } => write!(
                f,
                "sprint task {task_id} prediction {value} is outside 0..={MAX_PREDICTION}"
            ),
        }
    }
}

impl Error for SprintServiceError {}

/// Event delivered to sprint-store subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintChange {
    SprintAdded(SprintId),
    SprintStatusChanged(SprintId, SprintStatus),
    ResourceAdded(ResourceId),
    AssignmentUpdated {
        resource_id: ResourceId,
        task_id: SprintTaskId,
    },
    CommentAdded {
        comment_id: CommentId,
        task_id: TaskId,
    },
}

#[derive(Debug)]
pub struct SprintService {
    sprints: Vec<Sprint>,
    resources: Vec<ResourceUtilization>,
    comments: Vec<TaskComment>,
    notifier: ChangeNotifier<SprintChange>,
}

impl Default for SprintService {
    fn default() -> Self {
        Self::new()
    }
}

impl SprintService {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            sprints: Vec::new(),
            resources: Vec::new(),
            comments: Vec::new(),
            notifier: ChangeNotifier::new("sprint_service"),
        }
    }

    /// Creates a store holding one active demo sprint starting at `now` and
    /// the team resource booked against it.
    pub fn with_seed_data(now: DateTime<Utc>) -> Self {
        let mut service = Self::new();
        service.sprints.push(Sprint {
            id: 1,
            name: "Sprint 1".to_string(),
            start_date: now,
            end_date: now + Duration::days(SPRINT_LENGTH_DAYS),
            story_points: 100,
            completed_points: 65,
            status: SprintStatus::Active,
            tasks: vec![SprintTask {
                id: 1,
                title: "API Integration".to_string(),
                story_points: 8,
                assignee: "Joe".to_string(),
                status: SprintTaskStatus::InProgress,
                dependencies: BTreeSet::new(),
                complexity: Complexity::High,
                prediction: 85,
            }],
        });
        service.resources.push(
            NewResource {
                name: "Frontend Team".to_string(),
                role: "Development".to_string(),
                available_hours: 40.0,
                assignments: vec![Assignment {
                    task_id: 1,
                    hours: 34.0,
                }],
            }
            .into_resource(1),
        );
        service
    }

    pub fn list_sprints(&self) -> Vec<Sprint> {
        self.sprints.clone()
    }

    pub fn get_sprint(&self, id: SprintId) -> Option<Sprint> {
        self.sprints.iter().find(|sprint| sprint.id == id).cloned()
    }

    /// Returns the first sprint whose status is active.
    pub fn active_sprint(&self) -> Option<Sprint> {
        self.sprints.iter().find(|sprint| sprint.is_active()).cloned()
    }

    /// Adds a sprint and assigns its id.
    ///
    /// # Errors
    /// - `InvalidPrediction` when a sprint task's prediction exceeds 100.
    pub fn add_sprint(&mut self, new_sprint: NewSprint) -> Result<Sprint, SprintServiceError> {
        if let Some(task) = new_sprint
            .tasks
            .iter()
            .find(|task| task.prediction > MAX_PREDICTION)
        {
            return Err(SprintServiceError::InvalidPrediction {
                task_id: task.id,
                value: task.prediction,
            });
        }

        let id = next_id(self.sprints.iter().map(|sprint| sprint.id));
        let sprint = new_sprint.into_sprint(id);
        self.sprints.push(sprint.clone());
        debug!("event=sprint_add module=sprint_service status=ok sprint_id={id}");
        self.notifier.notify(&SprintChange::SprintAdded(id));
        Ok(sprint)
    }

    /// Sets the status of an existing sprint.
    ///
    /// # Errors
    /// - `SprintNotFound` when no sprint has `id`; nothing is notified.
    pub fn update_sprint_status(
        &mut self,
        id: SprintId,
        status: SprintStatus,
    ) -> Result<Sprint, SprintServiceError> {
        let sprint = self
            .sprints
            .iter_mut()
            .find(|sprint| sprint.id == id)
            .ok_or(SprintServiceError::SprintNotFound(id))?;
        sprint.status = status;
        let updated = sprint.clone();
        debug!(
            "event=sprint_status module=sprint_service status=ok sprint_id={} sprint_status={:?}",
            id, status
        );
        self.notifier
            .notify(&SprintChange::SprintStatusChanged(id, status));
        Ok(updated)
    }

    pub fn list_resources(&self) -> Vec<ResourceUtilization> {
        self.resources.clone()
    }

    pub fn add_resource(&mut self, new_resource: NewResource) -> ResourceUtilization {
        let id = next_id(self.resources.iter().map(|resource| resource.id));
        let resource = new_resource.into_resource(id);
        self.resources.push(resource.clone());
        self.notifier.notify(&SprintChange::ResourceAdded(id));
        resource
    }

    /// Upserts the resource's assignment for `task_id` and recomputes its
    /// utilized hours.
    ///
    /// # Errors
    /// - `ResourceNotFound` when no resource has `resource_id`.
    pub fn update_resource_assignment(
        &mut self,
        resource_id: ResourceId,
        task_id: SprintTaskId,
        hours: f64,
    ) -> Result<ResourceUtilization, SprintServiceError> {
        let resource = self
            .resources
            .iter_mut()
            .find(|resource| resource.id == resource_id)
            .ok_or(SprintServiceError::ResourceNotFound(resource_id))?;
        resource.upsert_assignment(task_id, hours);
        let updated = resource.clone();
        debug!(
            "event=resource_assign module=sprint_service status=ok resource_id={} task_id={} utilized_hours={}",
            resource_id, task_id, updated.utilized_hours
        );
        self.notifier.notify(&SprintChange::AssignmentUpdated {
            resource_id,
            task_id,
        });
        Ok(updated)
    }

    /// Flattens every sprint task's completion confidence, sprint by sprint.
    pub fn task_predictions(&self) -> Vec<TaskPrediction> {
        self.sprints
            .iter()
            .flat_map(|sprint| sprint.tasks.iter())
            .map(|task| TaskPrediction {
                task_id: task.id,
                prediction: task.prediction,
            })
            .collect()
    }

    /// Stores a comment, assigning its id and extracting its mentions.
    pub fn add_comment(&mut self, new_comment: NewComment) -> TaskComment {
        let id = next_id(self.comments.iter().map(|comment| comment.id));
        let comment = new_comment.into_comment(id);
        self.comments.push(comment.clone());
        debug!(
            "event=comment_add module=sprint_service status=ok comment_id={} task_id={} mentions={}",
            id,
            comment.task_id,
            comment.mentions.len()
        );
        self.notifier.notify(&SprintChange::CommentAdded {
            comment_id: id,
            task_id: comment.task_id,
        });
        comment
    }

    /// Returns comments on `task_id` in insertion order.
    pub fn comments_for_task(&self, task_id: TaskId) -> Vec<TaskComment> {
        self.comments
            .iter()
            .filter(|comment| comment.task_id == task_id)
            .cloned()
            .collect()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&SprintChange) + 'static) -> SubscriptionId {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

fn next_id(existing: impl Iterator<Item = u64>) -> u64 {
    existing.max().map_or(1, |max| max + 1)
}
