//! Core domain logic for sprintboard.
//! Task, sprint and comment stores with change notification, task
//! statistics, and preference-driven notification dispatch.

pub mod config;
pub mod db;
pub mod delivery;
pub mod event;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use delivery::{
    AttachmentFile, AttachmentStorage, EmailNotification, EmailTransport, LoggingEmailTransport,
    OutboxEmailTransport, PlaceholderAttachmentStorage, UploadError,
};
pub use event::{ChangeNotifier, SubscriptionId};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::comment::{extract_mentions, CommentAttachment, NewComment, TaskComment};
pub use model::preferences::{NotificationPreferences, PreferencesPatch};
pub use model::sprint::{
    Assignment, Complexity, NewResource, NewSprint, ResourceUtilization, Sprint, SprintStatus,
    SprintTask, SprintTaskStatus, TaskPrediction,
};
pub use model::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus};
pub use repo::kv_repo::{
    InMemoryKeyValueRepository, KeyValueRepository, RepoError, RepoResult,
    SqliteKeyValueRepository,
};
pub use service::notification_service::{
    DispatchReport, NotificationService, SprintUpdateKind, SEED_USER_ID,
};
pub use service::sprint_service::{SprintChange, SprintService, SprintServiceError};
pub use service::stats::{PriorityCounts, TaskStats};
pub use service::task_service::{
    TaskChange, TaskChangeKind, TaskService, TaskServiceError, DEFAULT_TASKS_KEY,
};
pub use service::upload::UploadBatch;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
