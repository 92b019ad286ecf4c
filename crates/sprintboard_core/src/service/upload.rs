//! Batched attachment upload with simulated progress.
//!
//! # Responsibility
//! - Queue up to `max_files` attachments before upload.
//! - Upload every queued file concurrently, reporting per-file progress in
//!   steps of 10 with a fixed tick between steps.
//!
//! # Invariants
//! - The queue is cleared only after every file uploaded successfully.
//! - Dropping the `upload_all` future leaves the queue untouched.

use crate::config::UploadConfig;
use crate::delivery::{AttachmentFile, UploadError};
use crate::service::notification_service::NotificationService;
use futures::future::try_join_all;
use log::info;
use std::cell::RefCell;
use std::time::Duration;

const PROGRESS_STEP: usize = 10;

/// Pending attachments waiting for upload.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    files: Vec<AttachmentFile>,
    max_files: usize,
    tick: Duration,
}

impl UploadBatch {
    pub fn new(max_files: usize, tick: Duration) -> Self {
        Self {
            files: Vec::new(),
            max_files,
            tick,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_files, Duration::from_millis(config.tick_ms))
    }

    pub fn files(&self) -> &[AttachmentFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Queues `files`. The whole selection is rejected if it would exceed
    /// the batch limit.
    pub fn add_files(&mut self, files: Vec<AttachmentFile>) -> Result<(), UploadError> {
        let requested = self.files.len() + files.len();
        if requested > self.max_files {
            return Err(UploadError::TooManyFiles {
                max_files: self.max_files,
                requested,
            });
        }
        self.files.extend(files);
        Ok(())
    }

    pub fn remove_file(&mut self, index: usize) -> Option<AttachmentFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    /// Uploads every queued file and returns their URLs in queue order.
    ///
    /// `on_progress(file_index, percent)` sees `0, 10, ..., 100` for each
    /// file before that file is handed to storage.
    ///
    /// # Errors
    /// - The first storage failure; the queue is kept for a retry.
    pub async fn upload_all(
        &mut self,
        service: &NotificationService,
        on_progress: impl FnMut(usize, u8),
    ) -> Result<Vec<String>, UploadError> {
        let progress = RefCell::new(on_progress);
        let tick = self.tick;
        let uploads = self.files.iter().enumerate().map(|(index, file)| {
            let progress = &progress;
            async move {
                for percent in (0..=100u8).step_by(PROGRESS_STEP) {
                    (progress.borrow_mut())(index, percent);
                    tokio::time::sleep(tick).await;
                }
                service.upload_attachment(file).await
            }
        });

        let urls = try_join_all(uploads).await?;
        info!(
            "event=upload_batch module=upload status=ok files={}",
            urls.len()
        );
        self.files.clear();
        Ok(urls)
    }
}
