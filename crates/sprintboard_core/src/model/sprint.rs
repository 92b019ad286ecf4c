//! Sprint, sprint task and resource utilization records.
//!
//! # Invariants
//! - `SprintTask::prediction` is a confidence percentage in `0..=100`.
//! - `ResourceUtilization::utilized_hours` equals the sum of assignment hours
//!   whenever it is read through `SprintService`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type SprintId = u64;
pub type SprintTaskId = u64;
pub type ResourceId = u64;

/// Upper bound for `SprintTask::prediction`.
pub const MAX_PREDICTION: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    Active,
    Completed,
    Planned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SprintTaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Unit of work planned inside a sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTask {
    pub id: SprintTaskId,
    pub title: String,
    pub story_points: u32,
    pub assignee: String,
    pub status: SprintTaskStatus,
    /// Ids of sprint tasks that must finish first.
    pub dependencies: BTreeSet<SprintTaskId>,
    pub complexity: Complexity,
    /// Completion confidence, `0..=100`.
    pub prediction: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: SprintId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub story_points: u32,
    pub completed_points: u32,
    pub status: SprintStatus,
    pub tasks: Vec<SprintTask>,
}

impl Sprint {
    pub fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }
}

/// Creation request for a sprint; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSprint {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub story_points: u32,
    pub completed_points: u32,
    pub status: SprintStatus,
    pub tasks: Vec<SprintTask>,
}

impl NewSprint {
    pub fn into_sprint(self, id: SprintId) -> Sprint {
        Sprint {
            id,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            story_points: self.story_points,
            completed_points: self.completed_points,
            status: self.status,
            tasks: self.tasks,
        }
    }
}

/// Hours booked by one resource against one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub task_id: SprintTaskId,
    pub hours: f64,
}

/// Team or person capacity with its current bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUtilization {
    pub id: ResourceId,
    pub name: String,
    pub role: String,
    pub utilized_hours: f64,
    pub available_hours: f64,
    pub assignments: Vec<Assignment>,
}

impl ResourceUtilization {
    /// Inserts or replaces the assignment for `task_id`, then recomputes
    /// `utilized_hours` from all assignments.
    pub fn upsert_assignment(&mut self, task_id: SprintTaskId, hours: f64) {
        match self.assignments.iter_mut().find(|a| a.task_id == task_id) {
            Some(existing) => existing.hours = hours,
            None => self.assignments.push(Assignment { task_id, hours }),
        }
        self.recompute_utilized_hours();
    }

    pub fn recompute_utilized_hours(&mut self) {
        self.utilized_hours = self.assignments.iter().map(|a| a.hours).sum();
    }
}

/// Creation request for a resource; utilized hours are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub name: String,
    pub role: String,
    pub available_hours: f64,
    pub assignments: Vec<Assignment>,
}

impl NewResource {
    pub fn into_resource(self, id: ResourceId) -> ResourceUtilization {
        let mut resource = ResourceUtilization {
            id,
            name: self.name,
            role: self.role,
            utilized_hours: 0.0,
            available_hours: self.available_hours,
            assignments: self.assignments,
        };
        resource.recompute_utilized_hours();
        resource
    }
}

/// Completion confidence for one sprint task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPrediction {
    pub task_id: SprintTaskId,
    pub prediction: u8,
}
