//! Outbound delivery collaborators.
//!
//! # Responsibility
//! - Define the email transport and attachment storage seams used by the
//!   notification service.
//! - Provide stand-in implementations that log intent or record messages.
//!
//! # Invariants
//! - Implementations are `Send + Sync` so fan-out can run them concurrently.
//! - A transport reports delivery with a boolean; it never panics on failure.

pub mod attachment;
pub mod email;

pub use attachment::{AttachmentFile, AttachmentStorage, PlaceholderAttachmentStorage, UploadError};
pub use email::{EmailNotification, EmailTransport, LoggingEmailTransport, OutboxEmailTransport};
