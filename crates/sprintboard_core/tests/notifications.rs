use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sprintboard_core::{
    AttachmentFile, CommentAttachment, EmailNotification, EmailTransport, NewComment,
    NotificationPreferences, NotificationService, OutboxEmailTransport,
    PlaceholderAttachmentStorage, PreferencesPatch, SprintService, SprintUpdateKind,
    UploadBatch, UploadError, SEED_USER_ID,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

fn service_with_outbox() -> (NotificationService, Arc<OutboxEmailTransport>) {
    let outbox = Arc::new(OutboxEmailTransport::new());
    let service = NotificationService::new(
        outbox.clone(),
        Arc::new(PlaceholderAttachmentStorage::default()),
    );
    (service, outbox)
}

fn enable(service: &mut NotificationService, user: &str, patch: PreferencesPatch) {
    service.update_preferences(user, patch);
}

/// Rejects every message addressed to one user.
struct RejectingTransport {
    rejected: String,
    inner: OutboxEmailTransport,
}

#[async_trait]
impl EmailTransport for RejectingTransport {
    async fn send(&self, email: &EmailNotification) -> bool {
        if email.to.iter().any(|to| *to == self.rejected) {
            return false;
        }
        self.inner.send(email).await
    }
}

#[tokio::test]
async fn assignment_respects_assignee_preference() {
    let (mut service, outbox) = service_with_outbox();
    enable(
        &mut service,
        "alice",
        PreferencesPatch {
            task_assignments: Some(true),
            ..PreferencesPatch::default()
        },
    );

    let report = service.notify_task_assignment(42, "alice").await;
    assert_eq!(report.delivered, vec!["alice".to_string()]);

    let skipped = service.notify_task_assignment(42, "bob").await;
    assert!(skipped.is_empty());

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["alice".to_string()]);
    assert_eq!(sent[0].subject, "New Task Assignment - Task #42");
}

#[tokio::test]
async fn comment_fan_out_only_reaches_opted_in_mentions() {
    let (mut service, outbox) = service_with_outbox();
    enable(&mut service, "alice", PreferencesPatch::all_realtime());
    enable(
        &mut service,
        "bob",
        PreferencesPatch {
            task_comments: Some(false),
            sprint_updates: Some(true),
            ..PreferencesPatch::default()
        },
    );
    enable(&mut service, "carol", PreferencesPatch::all_realtime());

    let mut store = SprintService::new();
    let comment = store.add_comment(NewComment {
        task_id: 8,
        user_id: "joe".to_string(),
        content: "@alice @bob @carol @dave please review".to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0).unwrap(),
        attachments: vec![CommentAttachment {
            name: "spec.pdf".to_string(),
            url: "https://example.com/files/spec.pdf".to_string(),
            kind: "application/pdf".to_string(),
        }],
    });

    let report = service.notify_new_comment(&comment).await;

    assert_eq!(
        report.delivered,
        vec!["alice".to_string(), "carol".to_string()]
    );
    assert!(report.failed.is_empty());
    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|email| email.subject == "New Comment on Task #8"));
    assert!(sent
        .iter()
        .all(|email| email.attachments == vec!["spec.pdf".to_string()]));
    assert!(sent[0].content.starts_with("joe mentioned you in a comment"));
}

#[tokio::test]
async fn comment_fan_out_is_best_effort() {
    let transport = Arc::new(RejectingTransport {
        rejected: "bob".to_string(),
        inner: OutboxEmailTransport::new(),
    });
    let mut service = NotificationService::new(
        transport.clone(),
        Arc::new(PlaceholderAttachmentStorage::default()),
    );
    enable(&mut service, "alice", PreferencesPatch::all_realtime());
    enable(&mut service, "bob", PreferencesPatch::all_realtime());

    let mut store = SprintService::new();
    let comment = store.add_comment(NewComment {
        task_id: 1,
        user_id: "joe".to_string(),
        content: "@bob @alice".to_string(),
        timestamp: Utc::now(),
        attachments: Vec::new(),
    });

    let report = service.notify_new_comment(&comment).await;

    assert_eq!(report.delivered, vec!["alice".to_string()]);
    assert_eq!(report.failed, vec!["bob".to_string()]);
    assert_eq!(transport.inner.sent().len(), 1);
}

#[tokio::test]
async fn sprint_update_is_one_batched_email() {
    let (mut service, outbox) = service_with_outbox();
    let sprint_only = PreferencesPatch {
        sprint_updates: Some(true),
        ..PreferencesPatch::default()
    };
    enable(&mut service, "saran", sprint_only);
    enable(&mut service, "jabin", sprint_only);
    enable(
        &mut service,
        "joe",
        PreferencesPatch {
            task_comments: Some(true),
            ..PreferencesPatch::default()
        },
    );

    let report = service.notify_sprint_update(3, SprintUpdateKind::Start).await;

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["jabin".to_string(), "saran".to_string()]);
    assert_eq!(sent[0].subject, "Sprint 3 start");
    assert!(sent[0].content.contains("has been started"));
    assert_eq!(report.delivered.len(), 2);
}

#[tokio::test]
async fn sprint_update_without_subscribers_sends_nothing() {
    let (service, outbox) = service_with_outbox();
    let report = service.notify_sprint_update(1, SprintUpdateKind::End).await;
    assert!(report.is_empty());
    assert!(outbox.sent().is_empty());
}

#[test]
fn preferences_default_to_disabled_and_merge_patches() {
    let (mut service, _outbox) = service_with_outbox();
    assert!(service.preferences("alice").is_none());
    assert_eq!(
        service.preferences_or_default("alice"),
        NotificationPreferences::disabled("alice")
    );

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    service.subscribe(move |change| sink.borrow_mut().push(change.user_id.clone()));

    service.update_preferences(
        "alice",
        PreferencesPatch {
            daily_digest: Some(true),
            ..PreferencesPatch::default()
        },
    );
    let merged = service.update_preferences(
        "alice",
        PreferencesPatch {
            task_comments: Some(true),
            ..PreferencesPatch::default()
        },
    );

    assert!(merged.daily_digest);
    assert!(merged.task_comments);
    assert!(!merged.task_assignments);
    assert!(!merged.email_notifications);
    assert_eq!(*changes.borrow(), vec!["alice", "alice"]);
}

#[tokio::test]
async fn seeded_user_receives_realtime_notifications() {
    let outbox = Arc::new(OutboxEmailTransport::new());
    let service = NotificationService::with_seed_preferences(
        outbox.clone(),
        Arc::new(PlaceholderAttachmentStorage::default()),
    );

    let prefs = service.preferences(SEED_USER_ID).unwrap();
    assert!(prefs.email_notifications && prefs.task_assignments);
    assert!(prefs.task_comments && prefs.sprint_updates);
    assert!(!prefs.daily_digest);

    service.notify_task_assignment(3, SEED_USER_ID).await;
    service.notify_sprint_update(1, SprintUpdateKind::Update).await;

    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, vec![SEED_USER_ID.to_string()]);
    assert!(sent[1].content.contains("has been updated"));
}

#[tokio::test]
async fn upload_attachment_synthesizes_reference_url() {
    let (service, _outbox) = service_with_outbox();
    let url = service
        .upload_attachment(&AttachmentFile::new("notes.txt", "text/plain", b"hi".to_vec()))
        .await
        .unwrap();
    assert_eq!(url, "https://example.com/files/notes.txt");

    let err = service
        .upload_attachment(&AttachmentFile::new("  ", "text/plain", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, UploadError::EmptyFileName);
}

#[tokio::test]
async fn upload_batch_reports_progress_and_returns_urls_in_order() {
    let (service, _outbox) = service_with_outbox();
    let mut batch = UploadBatch::new(5, Duration::from_millis(1));
    batch
        .add_files(vec![
            AttachmentFile::new("a.png", "image/png", vec![1, 2, 3]),
            AttachmentFile::new("b.png", "image/png", vec![4]),
        ])
        .unwrap();

    let mut progress: Vec<(usize, u8)> = Vec::new();
    let urls = batch
        .upload_all(&service, |index, percent| progress.push((index, percent)))
        .await
        .unwrap();

    assert_eq!(
        urls,
        vec![
            "https://example.com/files/a.png".to_string(),
            "https://example.com/files/b.png".to_string()
        ]
    );
    for index in 0..2 {
        let steps: Vec<u8> = progress
            .iter()
            .filter(|(file, _)| *file == index)
            .map(|(_, percent)| *percent)
            .collect();
        assert_eq!(steps, (0..=100).step_by(10).collect::<Vec<u8>>());
    }
    assert!(batch.is_empty());
}

#[tokio::test]
async fn upload_batch_keeps_queue_when_a_file_fails() {
    let (service, _outbox) = service_with_outbox();
    let mut batch = UploadBatch::new(5, Duration::ZERO);
    batch
        .add_files(vec![
            AttachmentFile::new("ok.txt", "text/plain", Vec::new()),
            AttachmentFile::new("", "text/plain", Vec::new()),
        ])
        .unwrap();

    let err = batch.upload_all(&service, |_, _| {}).await.unwrap_err();

    assert_eq!(err, UploadError::EmptyFileName);
    assert_eq!(batch.len(), 2);
}
