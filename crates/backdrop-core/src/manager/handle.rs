//! Caller-side handle of the manager task.

use backdrop_types::{
    background_url, BackgroundError, BackgroundId, BackgroundType, BackgroundView, FileId, InputBackground,
    ReferenceSourceId, Result, Update,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::command::{Command, Reply};

/// Cloneable entry point to a running [`super::BackgroundManager`].
///
/// Every method is answered by the manager task in submission order. When
/// the task is gone, methods fail with [`BackgroundError::Aborted`].
#[derive(Clone)]
pub struct BackgroundManagerHandle {
    commands: mpsc::UnboundedSender<Command>,
    link_base_url: Arc<str>,
}

impl BackgroundManagerHandle {
    pub(super) fn new(commands: mpsc::UnboundedSender<Command>, link_base_url: &str) -> Self {
        Self { commands, link_base_url: Arc::from(link_base_url) }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands.send(make(reply)).map_err(|_| BackgroundError::Aborted)?;
        response.await.map_err(|_| BackgroundError::Aborted)?
    }

    /// Installed backgrounds, ordered for display in the given theme variant.
    pub async fn fetch_catalog(&self, for_dark_theme: bool) -> Result<Vec<BackgroundView>> {
        self.request(|reply| Command::FetchCatalog { for_dark_theme, reply }).await
    }

    /// Resolve a background name (`slug[?params]` or a fill link) to an
    /// identifier and the type the name describes.
    pub async fn search_background(&self, name: &str) -> Result<(BackgroundId, BackgroundType)> {
        let name = name.to_string();
        self.request(|reply| Command::Search { name, reply }).await
    }

    /// Change the selection of one theme variant.
    ///
    /// - no input and no type clears the selection;
    /// - no input and a fill type selects a new local fill background;
    /// - a local file is uploaded (or matched to a known background) and
    ///   selected with the given file-backed type;
    /// - a remote id is installed with the given type, or its own type.
    ///
    /// Returns the selected identifier, `None` when cleared.
    pub async fn set_background(
        &self,
        input: Option<InputBackground>,
        background_type: Option<BackgroundType>,
        for_dark_theme: bool,
    ) -> Result<Option<BackgroundId>> {
        self.request(|reply| Command::SetBackground { input, background_type, for_dark_theme, reply }).await
    }

    /// Install a known background and select it.
    pub async fn install_background(
        &self,
        id: BackgroundId,
        background_type: Option<BackgroundType>,
        for_dark_theme: bool,
    ) -> Result<BackgroundId> {
        self.set_background(Some(InputBackground::Remote(id)), background_type, for_dark_theme)
            .await?
            .ok_or(BackgroundError::NotFound { id: id.get() })
    }

    pub async fn remove_background(&self, id: BackgroundId) -> Result<()> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    /// Restore the server's default installed list and clear both selections.
    pub async fn reset_backgrounds(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Refetch one background from the server.
    pub async fn reload_background(&self, id: BackgroundId, access_hash: i64) -> Result<()> {
        self.request(|reply| Command::Reload { id, access_hash, reply }).await
    }

    pub async fn get_background(&self, id: BackgroundId, for_dark_theme: bool) -> Result<Option<BackgroundView>> {
        self.request(|reply| Command::GetBackground { id, for_dark_theme, reply }).await
    }

    pub async fn selected_background(&self, for_dark_theme: bool) -> Result<Option<BackgroundView>> {
        self.request(|reply| Command::GetSelected { for_dark_theme, reply }).await
    }

    pub async fn background_by_file(&self, file_id: FileId) -> Result<Option<BackgroundId>> {
        self.request(|reply| Command::BackgroundByFile { file_id, reply }).await
    }

    pub async fn file_reference_source(&self, id: BackgroundId, access_hash: i64) -> Result<ReferenceSourceId> {
        self.request(|reply| Command::FileReferenceSource { id, access_hash, reply }).await
    }

    /// Updates describing the current selection of both variants.
    pub async fn current_state(&self) -> Result<Vec<Update>> {
        self.request(|reply| Command::CurrentState { reply }).await
    }

    pub fn background_url(&self, name: &str, background_type: &BackgroundType) -> String {
        background_url(&self.link_base_url, name, background_type)
    }

    /// Enter shutdown: new remote operations are refused and failures of
    /// in-flight ones are no longer reported.
    pub fn close(&self) {
        if self.commands.send(Command::Close).is_err() {
            tracing::debug!("Background manager already stopped");
        }
    }
}
