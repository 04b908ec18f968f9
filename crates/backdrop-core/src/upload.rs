//! Records of uploads started on behalf of a selection request.

use backdrop_types::{BackgroundId, BackgroundType, FileId};
use std::collections::HashMap;
use tracing::warn;

use crate::manager::Reply;

/// Progress of one upload. Finished uploads leave the pipeline, so only the
/// in-flight states are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Requested,
    Uploading,
}

/// What to do once the file content is on the server.
pub struct PendingUpload {
    pub background_type: BackgroundType,
    pub for_dark_theme: bool,
    pub reply: Reply<Option<BackgroundId>>,
    state: UploadState,
}

impl PendingUpload {
    pub fn new(
        background_type: BackgroundType,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundId>>,
    ) -> Self {
        Self { background_type, for_dark_theme, reply, state: UploadState::Requested }
    }

    pub const fn state(&self) -> UploadState {
        self.state
    }
}

#[derive(Default)]
pub struct UploadPipeline {
    uploads: HashMap<FileId, PendingUpload>,
}

impl UploadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new upload. A previous record for the same file is dropped,
    /// which aborts its caller.
    pub fn register(&mut self, file_id: FileId, upload: PendingUpload) {
        if self.uploads.insert(file_id, upload).is_some() {
            warn!(file_id = %file_id, "Replaced pending background upload");
        }
    }

    pub fn mark_uploading(&mut self, file_id: FileId) {
        if let Some(upload) = self.uploads.get_mut(&file_id) {
            upload.state = UploadState::Uploading;
        }
    }

    /// Remove the record of a finished upload.
    pub fn finish(&mut self, file_id: FileId) -> Option<PendingUpload> {
        self.uploads.remove(&file_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn test_lifecycle() {
        let mut pipeline = UploadPipeline::new();
        let (reply, _rx) = oneshot::channel();
        let (other_reply, _other_rx) = oneshot::channel();
        let wallpaper = BackgroundType::wallpaper(false, false);

        pipeline.register(FileId::new(5), PendingUpload::new(wallpaper.clone(), true, reply));
        pipeline.register(FileId::new(6), PendingUpload::new(wallpaper, false, other_reply));
        pipeline.mark_uploading(FileId::new(5));

        let uploading = pipeline.finish(FileId::new(5)).unwrap();
        assert_eq!(uploading.state(), UploadState::Uploading);
        assert!(uploading.for_dark_theme);
        assert!(pipeline.finish(FileId::new(5)).is_none());

        let requested = pipeline.finish(FileId::new(6)).unwrap();
        assert_eq!(requested.state(), UploadState::Requested);
    }

    #[test]
    fn test_replacing_aborts_previous_caller() {
        let mut pipeline = UploadPipeline::new();
        let file = FileId::new(5);
        let (first, mut first_rx) = oneshot::channel();
        let (second, _second_rx) = oneshot::channel();

        pipeline.register(file, PendingUpload::new(BackgroundType::wallpaper(false, false), false, first));
        pipeline.register(file, PendingUpload::new(BackgroundType::wallpaper(true, false), false, second));

        assert!(first_rx.try_recv().is_err());
        let kept = pipeline.finish(file).unwrap();
        assert_eq!(kept.background_type, BackgroundType::wallpaper(true, false));
        assert!(pipeline.finish(file).is_none());
    }
}
