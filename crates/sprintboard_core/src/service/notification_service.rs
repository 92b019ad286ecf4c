//! Notification dispatch driven by per-user preferences.
//!
//! # Responsibility
//! - Decide who gets notified for assignments, comment mentions and sprint
//!   transitions.
//! - Hand messages to the configured `EmailTransport`.
//! - Own per-user `NotificationPreferences`.
//!
//! # Invariants
//! - Users without stored preferences receive nothing.
//! - Comment fan-out is best-effort: every send runs to completion and
//!   failures are reported, never propagated.
//! - Sprint updates go out as one email addressed to every opted-in user.

use crate::delivery::{
    AttachmentFile, AttachmentStorage, EmailNotification, EmailTransport, UploadError,
};
use crate::event::{ChangeNotifier, SubscriptionId};
use crate::model::comment::TaskComment;
use crate::model::preferences::{NotificationPreferences, PreferencesPatch};
use crate::model::sprint::SprintId;
use crate::model::task::TaskId;
use futures::future::join_all;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// User whose preferences `with_seed_preferences` installs.
pub const SEED_USER_ID: &str = "user1";

/// Sprint lifecycle transition announced to subscribers of sprint updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintUpdateKind {
    Start,
    End,
    Update,
}

impl SprintUpdateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Update => "update",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::End => "ended",
            Self::Update => "updated",
        }
    }
}

impl Display for SprintUpdateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one dispatch call, by recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl DispatchReport {
    /// True when nobody was eligible for the notification.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, recipients: &[String], delivered: bool) {
        let target = if delivered {
            &mut self.delivered
        } else {
            &mut self.failed
        };
        target.extend(recipients.iter().cloned());
    }
}

/// Event delivered to preference subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesChange {
    pub user_id: String,
}

pub struct NotificationService {
    transport: Arc<dyn EmailTransport>,
    storage: Arc<dyn AttachmentStorage>,
    preferences: BTreeMap<String, NotificationPreferences>,
    notifier: ChangeNotifier<PreferencesChange>,
}

impl NotificationService {
    pub fn new(transport: Arc<dyn EmailTransport>, storage: Arc<dyn AttachmentStorage>) -> Self {
        Self {
            transport,
            storage,
            preferences: BTreeMap::new(),
            notifier: ChangeNotifier::new("notification_service"),
        }
    }

    /// Creates a dispatcher with the demo user `user1` opted into every
    /// realtime notification.
    pub fn with_seed_preferences(
        transport: Arc<dyn EmailTransport>,
        storage: Arc<dyn AttachmentStorage>,
    ) -> Self {
        let mut service = Self::new(transport, storage);
        let mut prefs = NotificationPreferences::disabled(SEED_USER_ID);
        prefs.apply(&PreferencesPatch::all_realtime());
        service.preferences.insert(SEED_USER_ID.to_string(), prefs);
        service
    }

    /// Sends one email through the transport.
    pub async fn send_email_notification(&self, email: &EmailNotification) -> bool {
        let delivered = self.transport.send(email).await;
        if !delivered {
            warn!(
                "event=email_send module=notification_service status=error recipients={} subject={:?}",
                email.to.join(","),
                email.subject
            );
        }
        delivered
    }

    /// Notifies `assignee_id` of a new assignment if they opted in.
    pub async fn notify_task_assignment(&self, task_id: TaskId, assignee_id: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        if !self.is_enabled(assignee_id, |prefs| prefs.task_assignments) {
            return report;
        }

        let email = EmailNotification {
            to: vec![assignee_id.to_string()],
            subject: format!("New Task Assignment - Task #{task_id}"),
            content: format!(
                "You have been assigned to task #{task_id}. Please review and update the status accordingly."
            ),
            attachments: Vec::new(),
        };
        let delivered = self.send_email_notification(&email).await;
        report.record(&email.to, delivered);
        report
    }

    /// Emails every mentioned user who opted into comment notifications.
    ///
    /// Sends run concurrently; the call returns once all of them finish.
    pub async fn notify_new_comment(&self, comment: &TaskComment) -> DispatchReport {
        let attachments: Vec<String> = comment
            .attachments
            .iter()
            .map(|attachment| attachment.name.clone())
            .collect();
        let emails: Vec<EmailNotification> = comment
            .mentions
            .iter()
            .filter(|user_id| self.is_enabled(user_id, |prefs| prefs.task_comments))
            .map(|user_id| EmailNotification {
                to: vec![user_id.clone()],
                subject: format!("New Comment on Task #{}", comment.task_id),
                content: format!(
                    "{} mentioned you in a comment: \"{}\"",
                    comment.user_id, comment.content
                ),
                attachments: attachments.clone(),
            })
            .collect();

        let results = join_all(
            emails
                .iter()
                .map(|email| self.send_email_notification(email)),
        )
        .await;

        let mut report = DispatchReport::default();
        for (email, delivered) in emails.iter().zip(results) {
            report.record(&email.to, delivered);
        }
        info!(
            "event=comment_notify module=notification_service status=ok comment_id={} delivered={} failed={}",
            comment.id,
            report.delivered.len(),
            report.failed.len()
        );
        report
    }

    /// Sends one batched email to every user with sprint updates enabled.
    pub async fn notify_sprint_update(
        &self,
        sprint_id: SprintId,
        kind: SprintUpdateKind,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let recipients: Vec<String> = self
            .preferences
            .values()
            .filter(|prefs| prefs.sprint_updates)
            .map(|prefs| prefs.user_id.clone())
            .collect();
        if recipients.is_empty() {
            return report;
        }

        let email = EmailNotification {
            to: recipients,
            subject: format!("Sprint {sprint_id} {kind}"),
            content: format!(
                "Sprint {sprint_id} has been {}. Please review the sprint dashboard for details.",
                kind.past_tense()
            ),
            attachments: Vec::new(),
        };
        let delivered = self.send_email_notification(&email).await;
        report.record(&email.to, delivered);
        report
    }

    /// Uploads one attachment and returns its reference URL.
    pub async fn upload_attachment(&self, file: &AttachmentFile) -> Result<String, UploadError> {
        self.storage.upload(file).await
    }

    pub fn preferences(&self, user_id: &str) -> Option<NotificationPreferences> {
        self.preferences.get(user_id).cloned()
    }

    /// Returns stored preferences, or all-disabled ones for unknown users.
    pub fn preferences_or_default(&self, user_id: &str) -> NotificationPreferences {
        self.preferences(user_id)
            .unwrap_or_else(|| NotificationPreferences::disabled(user_id))
    }

    /// Merges `patch` into the user's preferences, creating all-disabled
    /// preferences first when none exist, then notifies subscribers.
    pub fn update_preferences(
        &mut self,
        user_id: &str,
        patch: PreferencesPatch,
    ) -> NotificationPreferences {
        let prefs = self
            .preferences
            .entry(user_id.to_string())
            .or_insert_with(|| NotificationPreferences::disabled(user_id));
        prefs.apply(&patch);
        let updated = prefs.clone();
        self.notifier.notify(&PreferencesChange {
            user_id: user_id.to_string(),
        });
        updated
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&PreferencesChange) + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn is_enabled(&self, user_id: &str, flag: impl Fn(&NotificationPreferences) -> bool) -> bool {
        self.preferences.get(user_id).is_some_and(flag)
    }
}
