//! Messages processed by the manager task.

use backdrop_types::protocol::{Response, UploadHandle};
use backdrop_types::{
    BackgroundId, BackgroundType, BackgroundView, FileId, InputBackground, ReferenceSourceId, RemoteError, Result,
    Update,
};
use tokio::sync::oneshot;

use crate::error::StorageResult;

/// One-shot answer channel of a caller.
pub type Reply<T> = oneshot::Sender<Result<T>>;

pub(crate) type RemoteResult = std::result::Result<Response, RemoteError>;

/// Deliver `result`; a caller that stopped waiting is not an error.
pub(crate) fn respond<T>(reply: Reply<T>, result: Result<T>) {
    let _ = reply.send(result);
}

/// Caller waiting on a de-duplicated remote query.
pub(crate) enum RemoteWaiter {
    Catalog { for_dark_theme: bool, reply: Reply<Vec<BackgroundView>> },
    Search { name: String, reply: Reply<(BackgroundId, BackgroundType)> },
}

/// Caller waiting on a de-duplicated name cache lookup.
pub(crate) struct SearchWaiter {
    pub name: String,
    pub reply: Reply<(BackgroundId, BackgroundType)>,
}

pub(crate) enum Command {
    FetchCatalog {
        for_dark_theme: bool,
        reply: Reply<Vec<BackgroundView>>,
    },
    Search {
        name: String,
        reply: Reply<(BackgroundId, BackgroundType)>,
    },
    SetBackground {
        input: Option<InputBackground>,
        background_type: Option<BackgroundType>,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundId>>,
    },
    Remove {
        id: BackgroundId,
        reply: Reply<()>,
    },
    Reset {
        reply: Reply<()>,
    },
    Reload {
        id: BackgroundId,
        access_hash: i64,
        reply: Reply<()>,
    },
    GetBackground {
        id: BackgroundId,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundView>>,
    },
    GetSelected {
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundView>>,
    },
    BackgroundByFile {
        file_id: FileId,
        reply: Reply<Option<BackgroundId>>,
    },
    FileReferenceSource {
        id: BackgroundId,
        access_hash: i64,
        reply: Reply<ReferenceSourceId>,
    },
    CurrentState {
        reply: Reply<Vec<Update>>,
    },
    Close,

    // Completions posted by spawned tasks and collaborators.
    CatalogReceived {
        result: RemoteResult,
    },
    SlugReceived {
        slug: String,
        result: RemoteResult,
    },
    NameCacheLoaded {
        slug: String,
        value: StorageResult<Option<Vec<u8>>>,
    },
    ReloadReceived {
        id: BackgroundId,
        result: RemoteResult,
        reply: Reply<()>,
    },
    InstallFinished {
        id: BackgroundId,
        background_type: BackgroundType,
        for_dark_theme: bool,
        result: RemoteResult,
        reply: Reply<Option<BackgroundId>>,
    },
    RemoveFinished {
        id: BackgroundId,
        result: RemoteResult,
        reply: Reply<()>,
    },
    ResetFinished {
        result: RemoteResult,
        reply: Reply<()>,
    },
    UploadSucceeded {
        file_id: FileId,
        upload: Option<UploadHandle>,
    },
    UploadFailed {
        file_id: FileId,
        error: RemoteError,
    },
    UploadedBackgroundReceived {
        file_id: FileId,
        background_type: BackgroundType,
        for_dark_theme: bool,
        result: RemoteResult,
        reply: Reply<Option<BackgroundId>>,
    },
}

impl Command {
    /// Short name used in logs.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::FetchCatalog { .. } => "fetch_catalog",
            Self::Search { .. } => "search",
            Self::SetBackground { .. } => "set_background",
            Self::Remove { .. } => "remove",
            Self::Reset { .. } => "reset",
            Self::Reload { .. } => "reload",
            Self::GetBackground { .. } => "get_background",
            Self::GetSelected { .. } => "get_selected",
            Self::BackgroundByFile { .. } => "background_by_file",
            Self::FileReferenceSource { .. } => "file_reference_source",
            Self::CurrentState { .. } => "current_state",
            Self::Close => "close",
            Self::CatalogReceived { .. } => "catalog_received",
            Self::SlugReceived { .. } => "slug_received",
            Self::NameCacheLoaded { .. } => "name_cache_loaded",
            Self::ReloadReceived { .. } => "reload_received",
            Self::InstallFinished { .. } => "install_finished",
            Self::RemoveFinished { .. } => "remove_finished",
            Self::ResetFinished { .. } => "reset_finished",
            Self::UploadSucceeded { .. } => "upload_succeeded",
            Self::UploadFailed { .. } => "upload_failed",
            Self::UploadedBackgroundReceived { .. } => "uploaded_background_received",
        }
    }
}
