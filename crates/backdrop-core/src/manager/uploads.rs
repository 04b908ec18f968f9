//! Selection from local files: validation, upload, and creation of the
//! background from the uploaded content.

use backdrop_types::protocol::{Request, Response, UploadHandle};
use backdrop_types::{BackgroundError, BackgroundId, BackgroundType, FileId, InputBackground, RemoteError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::command::{respond, Command, RemoteResult, Reply};
use super::BackgroundManager;
use crate::collaborators::UploadCallback;
use crate::upload::{PendingUpload, UploadState};

/// Forwards upload progress from the file subsystem to the manager task.
pub(super) struct UploadNotifier {
    mailbox: mpsc::WeakUnboundedSender<Command>,
}

impl UploadNotifier {
    pub(super) const fn new(mailbox: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { mailbox }
    }

    fn post(&self, command: Command) {
        match self.mailbox.upgrade() {
            Some(mailbox) => {
                let _ = mailbox.send(command);
            },
            None => debug!("Upload finished after background manager stopped"),
        }
    }
}

impl UploadCallback for UploadNotifier {
    fn on_upload_ok(&self, file_id: FileId, upload: Option<UploadHandle>) {
        self.post(Command::UploadSucceeded { file_id, upload });
    }

    fn on_upload_error(&self, file_id: FileId, error: RemoteError) {
        self.post(Command::UploadFailed { file_id, error });
    }
}

impl BackgroundManager {
    pub(super) async fn set_background(
        &mut self,
        input: Option<InputBackground>,
        background_type: Option<BackgroundType>,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundId>>,
    ) {
        match input {
            None => match background_type {
                None => {
                    info!(for_dark_theme, "Reset selected background");
                    let result = self.set_selection(for_dark_theme, None, BackgroundType::default()).await;
                    respond(reply, result.map(|()| None));
                },
                Some(background_type) => {
                    let Some(fill) = background_type.as_fill().cloned() else {
                        respond(reply, Err(BackgroundError::InputRequired));
                        return;
                    };
                    match self.add_fill_background(fill).await {
                        Ok(id) => {
                            let result = self.set_selection(for_dark_theme, Some(id), background_type).await;
                            respond(reply, result.map(|()| Some(id)));
                        },
                        Err(e) => respond(reply, Err(e)),
                    }
                },
            },
            Some(InputBackground::Remote(id)) => {
                self.set_background_by_id(id, background_type, for_dark_theme, reply).await;
            },
            Some(InputBackground::Local(file_id)) => {
                let Some(background_type) = background_type.filter(BackgroundType::has_file) else {
                    respond(reply, Err(BackgroundError::LocalFileNotAllowed));
                    return;
                };
                let file_id = match self.prepare_input_file(file_id) {
                    Ok(file_id) => file_id,
                    Err(e) => {
                        respond(reply, Err(e));
                        return;
                    },
                };
                if let Some(id) = self.registry.id_by_file(file_id) {
                    debug!(background_id = %id, "File content already belongs to a background");
                    self.set_background_by_id(id, Some(background_type), for_dark_theme, reply).await;
                    return;
                }
                self.request_upload(file_id, background_type, for_dark_theme, reply);
            },
        }
    }

    fn prepare_input_file(&self, file_id: FileId) -> Result<FileId> {
        if !file_id.is_valid() {
            return Err(BackgroundError::FileUnusable { reason: "Invalid file identifier".to_string() });
        }
        let view = self.files.get_file_view(file_id);
        if view.is_encrypted {
            return Err(BackgroundError::FileUnusable { reason: "Can't use encrypted file".to_string() });
        }
        if !view.has_local_location && !view.has_generate_location {
            return Err(BackgroundError::FileUnusable {
                reason: "Need local or generate location to upload background".to_string(),
            });
        }
        Ok(file_id)
    }

    fn request_upload(
        &mut self,
        file_id: FileId,
        background_type: BackgroundType,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundId>>,
    ) {
        let upload_file_id = self.files.dup_file_id(file_id);
        info!(file_id = %upload_file_id, "Ask to upload background file");
        self.uploads.register(upload_file_id, PendingUpload::new(background_type, for_dark_theme, reply));
        self.files.upload(upload_file_id, Arc::clone(&self.upload_callback));
        self.uploads.mark_uploading(upload_file_id);
    }

    pub(super) async fn on_upload_succeeded(&mut self, file_id: FileId, upload: Option<UploadHandle>) {
        info!(file_id = %file_id, "Background file has been uploaded");
        let pending = self.uploads.finish(file_id);
        debug_assert!(pending.is_some(), "uploaded background file must be pending");
        let Some(pending) = pending else {
            error!(file_id = %file_id, "Unknown uploaded background file");
            return;
        };
        debug_assert_eq!(pending.state(), UploadState::Uploading);

        let Some(upload) = upload else {
            // The content is already on the server.
            let canonical = self.files.get_file_view(file_id).file_id;
            match self.registry.id_by_file(canonical) {
                Some(id) => {
                    self.set_background_by_id(id, Some(pending.background_type), pending.for_dark_theme, pending.reply)
                        .await;
                },
                None => respond(pending.reply, Err(BackgroundError::ReuploadFailed)),
            }
            return;
        };

        let Some(mime_type) = pending.background_type.mime_type() else {
            self.files.cancel_upload(file_id);
            respond(
                pending.reply,
                Err(BackgroundError::InvalidUploadResult { message: "background type has no file".to_string() }),
            );
            return;
        };
        if self.closing {
            self.files.cancel_upload(file_id);
            respond(pending.reply, Err(BackgroundError::Aborted));
            return;
        }

        let request = Request::Upload {
            file: upload,
            mime_type: mime_type.to_string(),
            settings: pending.background_type.to_settings(),
        };
        let PendingUpload { background_type, for_dark_theme, reply, .. } = pending;
        self.send_request(request, move |result| Command::UploadedBackgroundReceived {
            file_id,
            background_type,
            for_dark_theme,
            result,
            reply,
        });
    }

    pub(super) fn on_upload_failed(&mut self, file_id: FileId, error: RemoteError) {
        let pending = self.uploads.finish(file_id);
        debug_assert!(pending.is_some(), "failed background file must be pending");
        let Some(pending) = pending else {
            error!(file_id = %file_id, "Unknown failed background file");
            return;
        };
        debug_assert_eq!(pending.state(), UploadState::Uploading);
        if self.closing {
            // Dropping the reply aborts the caller.
            return;
        }
        warn!(file_id = %file_id, "Background file has upload error: {}", error);
        respond(pending.reply, Err(error.into()));
    }

    pub(super) async fn on_uploaded_background_received(
        &mut self,
        file_id: FileId,
        background_type: BackgroundType,
        for_dark_theme: bool,
        result: RemoteResult,
        reply: Reply<Option<BackgroundId>>,
    ) {
        let wallpaper = match result {
            Ok(Response::Wallpaper(wallpaper)) => wallpaper,
            Ok(other) => {
                self.files.cancel_upload(file_id);
                respond(
                    reply,
                    Err(BackgroundError::InvalidUploadResult { message: format!("received {}", other.kind()) }),
                );
                return;
            },
            Err(e) => {
                if e.missing_file_part().is_some() {
                    // Partial uploads are restarted from scratch, never resumed.
                    debug!(file_id = %file_id, "Uploaded background file is missing a part: {}", e);
                } else if !e.is_flood_wait() && !e.is_server_error() && !self.closing {
                    self.files.delete_partial_remote_location(file_id);
                }
                self.files.cancel_upload(file_id);
                if self.closing {
                    return;
                }
                respond(reply, Err(e.into()));
                return;
            },
        };

        let Some(id) = self.on_get_background(None, "", wallpaper) else {
            self.files.cancel_upload(file_id);
            respond(
                reply,
                Err(BackgroundError::InvalidUploadResult { message: "Receive wrong uploaded background".to_string() }),
            );
            return;
        };
        let Some(canonical) = self.registry.get(id).and_then(|background| background.file_id()) else {
            self.files.cancel_upload(file_id);
            respond(
                reply,
                Err(BackgroundError::InvalidUploadResult { message: "Receive uploaded background without file".to_string() }),
            );
            return;
        };

        if let Err(e) = self.files.merge(canonical, file_id) {
            error!(file_id = %file_id, canonical = %canonical, "Failed to merge uploaded background file: {}", e);
        }
        self.mark_installed(id);
        let result = self.set_selection(for_dark_theme, Some(id), background_type).await;
        respond(reply, result.map(|()| Some(id)));
    }
}
