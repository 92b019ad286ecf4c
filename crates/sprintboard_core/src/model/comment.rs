//! Task comment model and mention extraction.
//!
//! # Invariants
//! - `mentions` is derived from `content`; callers never supply it.
//! - Mentions are unique and ordered by first appearance.

use crate::model::task::TaskId;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type CommentId = u64;

static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid mention regex"));

/// File reference attached to a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAttachment {
    pub name: String,
    pub url: String,
    /// MIME type as reported by the uploader.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub user_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<CommentAttachment>,
    pub mentions: Vec<String>,
}

/// Creation request for a comment; id and mentions are derived by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub task_id: TaskId,
    pub user_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<CommentAttachment>,
}

impl NewComment {
    pub fn into_comment(self, id: CommentId) -> TaskComment {
        let mentions = extract_mentions(&self.content);
        TaskComment {
            id,
            task_id: self.task_id,
            user_id: self.user_id,
            content: self.content,
            timestamp: self.timestamp,
            attachments: self.attachments,
            mentions,
        }
    }
}

/// Extracts `@word` tokens (ASCII letters, digits, `_`) from `content`,
/// without the `@`, deduplicated in
/// order of first appearance.
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for caps in MENTION_RE.captures_iter(content) {
        let Some(token) = caps.get(1) else {
            continue;
        };
        if !mentions.iter().any(|existing| existing == token.as_str()) {
            mentions.push(token.as_str().to_string());
        }
    }
    mentions
}
