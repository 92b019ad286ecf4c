//! Per-user notification preferences.

use serde::{Deserialize, Serialize};

/// Notification switches for one user. Every flag defaults to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: String,
    pub email_notifications: bool,
    pub task_assignments: bool,
    pub task_comments: bool,
    pub sprint_updates: bool,
    pub daily_digest: bool,
}

impl NotificationPreferences {
    /// Preferences with every notification disabled.
    pub fn disabled(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email_notifications: false,
            task_assignments: false,
            task_comments: false,
            sprint_updates: false,
            daily_digest: false,
        }
    }

    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(value) = patch.email_notifications {
            self.email_notifications = value;
        }
        if let Some(value) = patch.task_assignments {
            self.task_assignments = value;
        }
        if let Some(value) = patch.task_comments {
            self.task_comments = value;
        }
        if let Some(value) = patch.sprint_updates {
            self.sprint_updates = value;
        }
        if let Some(value) = patch.daily_digest {
            self.daily_digest = value;
        }
    }
}

/// Partial preferences update. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub email_notifications: Option<bool>,
    pub task_assignments: Option<bool>,
    pub task_comments: Option<bool>,
    pub sprint_updates: Option<bool>,
    pub daily_digest: Option<bool>,
}

impl PreferencesPatch {
    /// Patch enabling every flag except the daily digest.
    pub fn all_realtime() -> Self {
        Self {
            email_notifications: Some(true),
            task_assignments: Some(true),
            task_comments: Some(true),
            sprint_updates: Some(true),
            daily_digest: Some(false),
        }
    }
}
