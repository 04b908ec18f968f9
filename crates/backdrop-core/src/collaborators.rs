//! Seams to the subsystems the manager depends on but does not own.
//!
//! The transport and the stores are async; the file and reference
//! subsystems answer synchronously and report upload progress through an
//! [`UploadCallback`].

use async_trait::async_trait;
use backdrop_types::protocol::{RemoteDocument, Request, Response, UploadHandle};
use backdrop_types::{BackgroundId, FileId, ReferenceSourceId, RemoteError, Update};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Request/response channel to the server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, RemoteError>;

    /// Errors that are part of normal operation (authorization loss, flood
    /// control) and are not worth an error-level log line.
    fn is_expected_error(&self, error: &RemoteError) -> bool {
        matches!(error.code, 401 | 420) || error.is_flood_wait()
    }
}

/// What the file subsystem knows about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileView {
    /// Canonical id after any merges
    pub file_id: FileId,
    pub is_encrypted: bool,
    pub has_local_location: bool,
    pub has_generate_location: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to merge files: {0}")]
pub struct MergeError(pub String);

/// File-content subsystem.
pub trait FileService: Send + Sync {
    fn get_file_view(&self, file_id: FileId) -> FileView;

    /// Independent copy of `file_id` that can be uploaded and canceled
    /// without touching the original.
    fn dup_file_id(&self, file_id: FileId) -> FileId;

    fn upload(&self, file_id: FileId, callback: Arc<dyn UploadCallback>);

    fn cancel_upload(&self, file_id: FileId);

    fn delete_partial_remote_location(&self, file_id: FileId);

    /// Declare `other` to hold the same content as `canonical`.
    fn merge(&self, canonical: FileId, other: FileId) -> Result<FileId, MergeError>;

    /// Register a document received from the server. `None` when the
    /// document is unusable for a background of that kind.
    fn register_document(&self, document: &RemoteDocument, is_pattern: bool) -> Option<FileId>;

    /// Every file id belonging to a document (main file plus thumbnails).
    fn document_file_ids(&self, file_id: FileId) -> Vec<FileId> {
        vec![file_id]
    }
}

/// Upload progress reported by the file subsystem.
pub trait UploadCallback: Send + Sync {
    /// The content is transferred. `None` means the file already exists on
    /// the server and no new handle was produced.
    fn on_upload_ok(&self, file_id: FileId, upload: Option<UploadHandle>);

    fn on_upload_error(&self, file_id: FileId, error: RemoteError);
}

/// Reference-tracking subsystem used to refresh expired file references.
pub trait ReferenceTracker: Send + Sync {
    fn create_reference_source(&self, background_id: BackgroundId, access_hash: i64) -> ReferenceSourceId;

    fn add_reference(&self, file_id: FileId, source: ReferenceSourceId);
}

/// Outbound update bus.
pub trait UpdateSink: Send + Sync {
    fn send_update(&self, update: Update);
}

impl UpdateSink for mpsc::UnboundedSender<Update> {
    fn send_update(&self, update: Update) {
        if self.send(update).is_err() {
            tracing::debug!("Update receiver dropped");
        }
    }
}
