//! The background manager task.
//!
//! One tokio task owns every piece of mutable state; callers and
//! collaborators reach it only through [`Command`] messages. Remote requests
//! and name cache reads run in spawned tasks that post their completion
//! back, so no state is ever touched concurrently.
//!
//! ```text
//!  BackgroundManagerHandle ──┐
//!  UploadNotifier ───────────┼──► mpsc ──► BackgroundManager (owner task)
//!  spawned requests ─────────┘                 │
//!                                              ├── Transport
//!                                              ├── FileService / ReferenceTracker
//!                                              ├── PersistenceAdapter
//!                                              └── UpdateSink
//! ```

mod command;
mod gateway;
mod handle;
mod selection;
mod startup;
mod uploads;


pub use command::Reply;
pub use handle::BackgroundManagerHandle;

pub(crate) use command::Command;

use backdrop_types::protocol::Request;
use backdrop_types::{BackgroundId, ManagerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use self::command::{respond, RemoteResult, RemoteWaiter, SearchWaiter};
use self::uploads::UploadNotifier;
use crate::allocator::LocalIdAllocator;
use crate::collaborators::{FileService, ReferenceTracker, Transport, UpdateSink, UploadCallback};
use crate::pending::PendingQueries;
use crate::persistence::{KeyValueStore, PersistenceAdapter};
use crate::registry::BackgroundRegistry;
use crate::selection::SelectionSlots;
use crate::upload::UploadPipeline;

/// Subsystems the manager is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub files: Arc<dyn FileService>,
    pub references: Arc<dyn ReferenceTracker>,
    pub updates: Arc<dyn UpdateSink>,
    /// Allocator counter and selection slots
    pub binlog: Arc<dyn KeyValueStore>,
    /// By-slug cache; ignored unless `use_file_database` is set
    pub name_cache: Option<Arc<dyn KeyValueStore>>,
}

pub struct BackgroundManager {
    config: ManagerConfig,
    transport: Arc<dyn Transport>,
    files: Arc<dyn FileService>,
    updates: Arc<dyn UpdateSink>,
    persistence: PersistenceAdapter,
    allocator: LocalIdAllocator,
    registry: BackgroundRegistry,
    selection: SelectionSlots,
    /// Installed list in server order
    installed: Vec<BackgroundId>,
    /// Hash of the last catalog answer
    catalog_hash: i64,
    remote_queries: PendingQueries<RemoteWaiter>,
    name_cache_queries: PendingQueries<SearchWaiter>,
    uploads: UploadPipeline,
    upload_callback: Arc<dyn UploadCallback>,
    mailbox: mpsc::WeakUnboundedSender<Command>,
    closing: bool,
}

impl BackgroundManager {
    /// Start the manager task. It first restores the persisted state, then
    /// serves commands until every handle is dropped.
    pub fn spawn(config: ManagerConfig, collaborators: Collaborators) -> (BackgroundManagerHandle, JoinHandle<()>) {
        let (commands, mailbox) = mpsc::unbounded_channel();
        let handle = BackgroundManagerHandle::new(commands.clone(), &config.link_base_url);
        let manager = Self::new(config, collaborators, commands.downgrade());
        drop(commands);
        let task = tokio::spawn(manager.run(mailbox));
        (handle, task)
    }

    fn new(config: ManagerConfig, collaborators: Collaborators, mailbox: mpsc::WeakUnboundedSender<Command>) -> Self {
        let name_cache = if config.use_file_database { collaborators.name_cache } else { None };
        let persistence = PersistenceAdapter::new(collaborators.binlog, name_cache);
        Self {
            allocator: LocalIdAllocator::new(persistence.binlog()),
            registry: BackgroundRegistry::new(Arc::clone(&collaborators.files), collaborators.references),
            transport: collaborators.transport,
            files: collaborators.files,
            updates: collaborators.updates,
            persistence,
            selection: SelectionSlots::new(),
            installed: Vec::new(),
            catalog_hash: 0,
            remote_queries: PendingQueries::new(),
            name_cache_queries: PendingQueries::new(),
            uploads: UploadPipeline::new(),
            upload_callback: Arc::new(UploadNotifier::new(mailbox.clone())),
            mailbox,
            closing: false,
            config,
        }
    }

    async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<Command>) {
        self.start_up().await;
        info!(backgrounds = self.registry.len(), "Background manager started");

        while let Some(command) = mailbox.recv().await {
            self.handle(command).await;
        }
        info!("Background manager stopped");
    }

    async fn handle(&mut self, command: Command) {
        debug!(command = command.name(), "Handle command");
        match command {
            Command::FetchCatalog { for_dark_theme, reply } => self.fetch_catalog(for_dark_theme, reply),
            Command::Search { name, reply } => self.search(name, reply).await,
            Command::SetBackground { input, background_type, for_dark_theme, reply } => {
                self.set_background(input, background_type, for_dark_theme, reply).await;
            },
            Command::Remove { id, reply } => self.remove_background(id, reply).await,
            Command::Reset { reply } => self.reset_backgrounds(reply),
            Command::Reload { id, access_hash, reply } => self.reload_background(id, access_hash, reply),
            Command::GetBackground { id, for_dark_theme, reply } => {
                respond(reply, Ok(self.background_view(id, for_dark_theme)));
            },
            Command::GetSelected { for_dark_theme, reply } => {
                let view = self.selection.selected_id(for_dark_theme).and_then(|id| self.background_view(id, for_dark_theme));
                respond(reply, Ok(view));
            },
            Command::BackgroundByFile { file_id, reply } => respond(reply, Ok(self.registry.id_by_file(file_id))),
            Command::FileReferenceSource { id, access_hash, reply } => {
                respond(reply, Ok(self.registry.reference_source(id, access_hash)));
            },
            Command::CurrentState { reply } => respond(reply, Ok(self.current_state())),
            Command::Close => {
                info!("Background manager is closing");
                self.closing = true;
            },
            Command::CatalogReceived { result } => self.on_catalog_received(result),
            Command::SlugReceived { slug, result } => self.on_slug_received(&slug, result),
            Command::NameCacheLoaded { slug, value } => self.on_name_cache_loaded(&slug, value),
            Command::ReloadReceived { id, result, reply } => self.on_reload_received(id, result, reply),
            Command::InstallFinished { id, background_type, for_dark_theme, result, reply } => {
                self.on_install_finished(id, background_type, for_dark_theme, result, reply).await;
            },
            Command::RemoveFinished { id, result, reply } => self.on_remove_finished(id, result, reply).await,
            Command::ResetFinished { result, reply } => self.on_reset_finished(result, reply).await,
            Command::UploadSucceeded { file_id, upload } => self.on_upload_succeeded(file_id, upload).await,
            Command::UploadFailed { file_id, error } => self.on_upload_failed(file_id, error),
            Command::UploadedBackgroundReceived { file_id, background_type, for_dark_theme, result, reply } => {
                self.on_uploaded_background_received(file_id, background_type, for_dark_theme, result, reply).await;
            },
        }
    }

    /// Run `request` on its own task and post `complete(result)` back.
    fn send_request<F>(&self, request: Request, complete: F)
    where
        F: FnOnce(RemoteResult) -> Command + Send + 'static,
    {
        debug!(request = request.name(), "Send request");
        let transport = Arc::clone(&self.transport);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = transport.send(request).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(complete(result));
            }
        });
    }
}
