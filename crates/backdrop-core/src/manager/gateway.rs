//! Remote synchronization: catalog, lookups by slug or id, install, remove
//! and reset, plus validation of everything the server sends.

use backdrop_types::protocol::{CatalogResponse, InputWallpaper, RemoteWallpaper, Request, Response};
use backdrop_types::{
    is_local_background_name, Background, BackgroundError, BackgroundFill, BackgroundId, BackgroundType,
    BackgroundView, RemoteError, Result,
};
use tracing::{debug, error, info, warn};

use super::command::{respond, Command, RemoteResult, RemoteWaiter, Reply, SearchWaiter};
use super::BackgroundManager;
use crate::error::StorageResult;
use crate::persistence::{codec, name_key};

/// Pending-query key of the catalog; slugs are never empty.
const CATALOG_KEY: &str = "";

fn slug_of(name: &str) -> &str {
    name.split_once('?').map_or(name, |(slug, _)| slug)
}

fn unexpected_response(expected: &str, response: &Response) -> BackgroundError {
    BackgroundError::InvalidResponse { message: format!("expected {}, received {}", expected, response.kind()) }
}

impl BackgroundManager {
    fn log_remote_error(&self, request: &str, error: &RemoteError) {
        if self.transport.is_expected_error(error) {
            debug!(request, "Request failed: {}", error);
        } else {
            warn!(request, "Request failed: {}", error);
        }
    }

    pub(super) fn fetch_catalog(&mut self, for_dark_theme: bool, reply: Reply<Vec<BackgroundView>>) {
        if self.closing && !self.remote_queries.is_pending(CATALOG_KEY) {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        if self.remote_queries.enqueue(CATALOG_KEY, RemoteWaiter::Catalog { for_dark_theme, reply }) {
            let hash = self.catalog_hash;
            self.send_request(Request::GetCatalog { hash }, |result| Command::CatalogReceived { result });
        }
    }

    pub(super) fn on_catalog_received(&mut self, result: RemoteResult) {
        let waiters = self.remote_queries.take(CATALOG_KEY);
        let outcome = match result {
            Ok(Response::Catalog(CatalogResponse::NotModified)) => {
                debug!("Installed backgrounds are not modified");
                Ok(())
            },
            Ok(Response::Catalog(CatalogResponse::Wallpapers { hash, wallpapers })) => {
                self.installed.clear();
                for wallpaper in wallpapers {
                    if let Some(id) = self.on_get_background(None, "", wallpaper) {
                        self.installed.push(id);
                    }
                }
                self.catalog_hash = hash;
                info!(count = self.installed.len(), "Received installed backgrounds");
                Ok(())
            },
            Ok(other) => Err(unexpected_response("catalog", &other)),
            Err(e) => {
                if self.closing {
                    return;
                }
                self.log_remote_error("get_catalog", &e);
                Err(e.into())
            },
        };

        for waiter in waiters {
            self.resolve_remote_waiter(waiter, outcome.clone());
        }
    }

    fn resolve_remote_waiter(&self, waiter: RemoteWaiter, outcome: Result<()>) {
        match waiter {
            RemoteWaiter::Catalog { for_dark_theme, reply } => {
                respond(reply, outcome.map(|()| self.installed_views(for_dark_theme)));
            },
            RemoteWaiter::Search { name, reply } => {
                let found = outcome.and_then(|()| {
                    self.lookup_by_name(&name).ok_or_else(|| BackgroundError::InvalidResponse {
                        message: format!("no background received for {}", slug_of(&name)),
                    })
                });
                respond(reply, found);
            },
        }
    }

    /// Known background named by the slug of `name`, with the link
    /// parameters of `name` applied to its type.
    fn lookup_by_name(&self, name: &str) -> Option<(BackgroundId, BackgroundType)> {
        let id = self.registry.id_by_name(slug_of(name))?;
        let background = self.registry.get(id)?;
        let mut background_type = background.background_type().clone();
        background_type.apply_parameters_from_link(name);
        Some((id, background_type))
    }

    pub(super) async fn search(&mut self, name: String, reply: Reply<(BackgroundId, BackgroundType)>) {
        if let Some(found) = self.lookup_by_name(&name) {
            respond(reply, Ok(found));
            return;
        }

        let slug = slug_of(&name).to_string();
        if slug.is_empty() {
            respond(reply, Err(BackgroundError::EmptyName));
            return;
        }

        if is_local_background_name(&slug) {
            let result = match BackgroundFill::from_link(&name) {
                Ok(fill) => {
                    self.add_fill_background(fill.clone()).await.map(|id| (id, BackgroundType::fill(fill)))
                },
                Err(e) => Err(e),
            };
            respond(reply, result);
            return;
        }

        if self.persistence.name_cache().is_some() && !self.registry.is_name_cache_loaded(&slug) {
            if self.name_cache_queries.enqueue(&slug, SearchWaiter { name, reply }) {
                self.load_from_name_cache(slug);
            }
            return;
        }

        self.search_remote(slug, name, reply);
    }

    fn load_from_name_cache(&self, slug: String) {
        let Some(store) = self.persistence.name_cache() else {
            return;
        };
        debug!(slug = %slug, "Trying to load background from name cache");
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let value = store.get(&name_key(&slug)).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(Command::NameCacheLoaded { slug, value });
            }
        });
    }

    pub(super) fn on_name_cache_loaded(&mut self, slug: &str, value: StorageResult<Option<Vec<u8>>>) {
        let waiters = self.name_cache_queries.take(slug);
        self.registry.mark_name_cache_loaded(slug);
        if self.closing {
            debug!(slug, waiters = waiters.len(), "Drop name cache lookup while closing");
            return;
        }

        match value {
            Ok(Some(bytes)) if self.registry.id_by_name(slug).is_none() => match codec::decode_background(&bytes) {
                Ok(loaded) if loaded.background.background_type().has_file() => {
                    let background = loaded.background;
                    debug!(slug, background_id = %background.id, "Loaded background from name cache");
                    if background.name != slug {
                        error!(slug, "Expected background {}, but loaded {}", slug, background.name);
                        self.registry.alias_name(slug, background.id);
                    }
                    self.registry.upsert(background);
                },
                Ok(loaded) => error!(slug, "Cached background {} has no file", loaded.background.id),
                Err(e) => error!(slug, "Can't load background from name cache: {}", e),
            },
            Ok(_) => {},
            Err(e) => warn!(slug, "Failed to read name cache: {}", e),
        }

        for SearchWaiter { name, reply } in waiters {
            match self.lookup_by_name(&name) {
                Some(found) => respond(reply, Ok(found)),
                None => {
                    let slug = slug_of(&name).to_string();
                    self.search_remote(slug, name, reply);
                },
            }
        }
    }

    fn search_remote(&mut self, slug: String, name: String, reply: Reply<(BackgroundId, BackgroundType)>) {
        if self.closing && !self.remote_queries.is_pending(&slug) {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        if self.remote_queries.enqueue(&slug, RemoteWaiter::Search { name, reply }) {
            let request = Request::GetWallpaper { wallpaper: InputWallpaper::BySlug { slug: slug.clone() } };
            self.send_request(request, move |result| Command::SlugReceived { slug, result });
        }
    }

    pub(super) fn on_slug_received(&mut self, slug: &str, result: RemoteResult) {
        let waiters = self.remote_queries.take(slug);
        let outcome = match result {
            Ok(Response::Wallpaper(wallpaper)) => match self.on_get_background(None, slug, wallpaper) {
                Some(_) => Ok(()),
                None => Err(BackgroundError::InvalidResponse { message: "received invalid background".to_string() }),
            },
            Ok(other) => Err(unexpected_response("wallpaper", &other)),
            Err(e) => {
                if self.closing {
                    return;
                }
                self.log_remote_error("get_wallpaper", &e);
                Err(e.into())
            },
        };

        for waiter in waiters {
            self.resolve_remote_waiter(waiter, outcome.clone());
        }
    }

    pub(super) fn reload_background(&mut self, id: BackgroundId, access_hash: i64, reply: Reply<()>) {
        if self.closing {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        if !id.is_remote() {
            respond(reply, Err(BackgroundError::NotFound { id: id.get() }));
            return;
        }
        let request = Request::GetWallpaper { wallpaper: InputWallpaper::ById { id, access_hash } };
        self.send_request(request, move |result| Command::ReloadReceived { id, result, reply });
    }

    pub(super) fn on_reload_received(&mut self, id: BackgroundId, result: RemoteResult, reply: Reply<()>) {
        let outcome = match result {
            Ok(Response::Wallpaper(wallpaper)) => match self.on_get_background(Some(id), "", wallpaper) {
                Some(_) => Ok(()),
                None => Err(BackgroundError::InvalidResponse { message: "received invalid background".to_string() }),
            },
            Ok(other) => Err(unexpected_response("wallpaper", &other)),
            Err(e) => {
                if self.closing {
                    return;
                }
                self.log_remote_error("get_wallpaper", &e);
                Err(e.into())
            },
        };
        respond(reply, outcome);
    }

    /// Validate a background received from the server and register it.
    ///
    /// `expected_id` and `expected_name` describe what was asked for; a
    /// mismatching name is kept as an alias of the received background.
    pub(super) fn on_get_background(
        &mut self,
        expected_id: Option<BackgroundId>,
        expected_name: &str,
        wallpaper: RemoteWallpaper,
    ) -> Option<BackgroundId> {
        match wallpaper {
            RemoteWallpaper::NoFile { id, is_default, is_dark, settings } => {
                let Some(settings) = settings else {
                    error!(background_id = %id, "Receive fill background without settings");
                    return None;
                };
                if !is_default {
                    error!(background_id = %id, "Receive non-default fill background");
                    return None;
                }
                if !id.is_remote() {
                    error!(background_id = %id, "Receive fill background with invalid id");
                    return None;
                }
                let background_type = BackgroundType::from_settings(true, false, Some(&settings));
                let background = match Background::new(id, background_type.link(), background_type, None) {
                    Ok(background) => background.with_flags(false, true, is_dark),
                    Err(e) => {
                        error!(background_id = %id, "Receive invalid background: {}", e);
                        return None;
                    },
                };
                self.registry.upsert(background);
                Some(id)
            },
            RemoteWallpaper::File {
                id,
                access_hash,
                slug,
                is_creator,
                is_default,
                is_dark,
                is_pattern,
                document,
                settings,
            } => {
                if !id.is_remote() || is_local_background_name(&slug) {
                    error!(background_id = %id, slug = %slug, "Receive background with invalid id or name");
                    return None;
                }
                if let Some(expected_id) = expected_id.filter(|expected| *expected != id) {
                    error!("Expected {}, but receive {}", expected_id, id);
                }
                let Some(document) = document else {
                    error!(background_id = %id, "Receive background without document");
                    return None;
                };
                let Some(file_id) = self.files.register_document(&document, is_pattern) else {
                    error!(background_id = %id, document_id = document.id, "Receive background with wrong document");
                    return None;
                };

                let background_type = BackgroundType::from_settings(false, is_pattern, settings.as_ref());
                let background = match Background::new(id, slug, background_type, Some(file_id)) {
                    Ok(background) => {
                        background.with_access_hash(access_hash).with_flags(is_creator, is_default, is_dark)
                    },
                    Err(e) => {
                        error!(background_id = %id, "Receive invalid background: {}", e);
                        return None;
                    },
                };
                let name = background.name.clone();
                self.registry.upsert(background);

                if !expected_name.is_empty() && name != expected_name {
                    error!("Expected background {}, but receive {}", expected_name, name);
                    self.registry.alias_name(expected_name, id);
                }
                if let Some(background) = self.registry.get(id) {
                    self.persistence.save_by_name_detached(background);
                }
                Some(id)
            },
        }
    }

    /// Select a known background, installing it on the server when it is
    /// file-backed.
    pub(super) async fn set_background_by_id(
        &mut self,
        id: BackgroundId,
        requested_type: Option<BackgroundType>,
        for_dark_theme: bool,
        reply: Reply<Option<BackgroundId>>,
    ) {
        let Some(background) = self.registry.get(id) else {
            respond(reply, Err(BackgroundError::NotFound { id: id.get() }));
            return;
        };

        let access_hash = background.access_hash;
        let background_type = match requested_type {
            Some(requested) if requested.has_file() => {
                if !requested.same_kind(background.background_type()) {
                    respond(reply, Err(BackgroundError::TypeMismatch));
                    return;
                }
                requested
            },
            _ => background.background_type().clone(),
        };

        if self.selection.is_current(for_dark_theme, id, &background_type) {
            respond(reply, Ok(Some(id)));
            return;
        }

        if !background_type.has_file() {
            let result = self.set_selection(for_dark_theme, Some(id), background_type).await;
            respond(reply, result.map(|()| Some(id)));
            return;
        }

        if self.closing {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        info!(background_id = %id, for_dark_theme, "Install background");
        let request = Request::Install {
            wallpaper: InputWallpaper::ById { id, access_hash },
            settings: background_type.to_settings(),
        };
        self.send_request(request, move |result| Command::InstallFinished {
            id,
            background_type,
            for_dark_theme,
            result,
            reply,
        });
    }

    pub(super) async fn on_install_finished(
        &mut self,
        id: BackgroundId,
        background_type: BackgroundType,
        for_dark_theme: bool,
        result: RemoteResult,
        reply: Reply<Option<BackgroundId>>,
    ) {
        match result {
            Ok(Response::Bool(_)) => {
                self.mark_installed(id);
                let result = self.set_selection(for_dark_theme, Some(id), background_type).await;
                respond(reply, result.map(|()| Some(id)));
            },
            Ok(other) => respond(reply, Err(unexpected_response("bool", &other))),
            Err(e) => {
                if self.closing {
                    return;
                }
                self.log_remote_error("install", &e);
                respond(reply, Err(e.into()));
            },
        }
    }

    pub(super) async fn remove_background(&mut self, id: BackgroundId, reply: Reply<()>) {
        let Some(background) = self.registry.get(id) else {
            respond(reply, Err(BackgroundError::NotFound { id: id.get() }));
            return;
        };

        let wallpaper = if background.background_type().has_file() {
            InputWallpaper::ById { id, access_hash: background.access_hash }
        } else if id.is_local() {
            let result = self.forget_installed(id).await;
            respond(reply, result);
            return;
        } else {
            InputWallpaper::NoFile { id }
        };

        if self.closing {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        self.send_request(Request::Unsave { wallpaper }, move |result| Command::RemoveFinished { id, result, reply });
    }

    pub(super) async fn on_remove_finished(&mut self, id: BackgroundId, result: RemoteResult, reply: Reply<()>) {
        match result {
            Ok(Response::Bool(_)) => {
                let result = self.forget_installed(id).await;
                respond(reply, result);
            },
            Ok(other) => respond(reply, Err(unexpected_response("bool", &other))),
            Err(e) => {
                if !self.transport.is_expected_error(&e) {
                    error!(background_id = %id, "Receive error for unsave background: {}", e);
                }
                if self.closing {
                    return;
                }
                respond(reply, Err(e.into()));
            },
        }
    }

    /// Drop `id` from the installed list and from any slot selecting it.
    async fn forget_installed(&mut self, id: BackgroundId) -> Result<()> {
        self.installed.retain(|installed| *installed != id);
        for for_dark_theme in self.selection.variants_referencing(id) {
            self.set_selection(for_dark_theme, None, BackgroundType::default()).await?;
        }
        Ok(())
    }

    pub(super) fn reset_backgrounds(&mut self, reply: Reply<()>) {
        if self.closing {
            respond(reply, Err(BackgroundError::Aborted));
            return;
        }
        self.send_request(Request::ResetAll, move |result| Command::ResetFinished { result, reply });
    }

    pub(super) async fn on_reset_finished(&mut self, result: RemoteResult, reply: Reply<()>) {
        match result {
            Ok(Response::Bool(_)) => {
                info!("Installed backgrounds were reset");
                self.installed.clear();
                self.catalog_hash = 0;
                let light = self.set_selection(false, None, BackgroundType::default()).await;
                let dark = self.set_selection(true, None, BackgroundType::default()).await;
                respond(reply, light.and(dark));
            },
            Ok(other) => respond(reply, Err(unexpected_response("bool", &other))),
            Err(e) => {
                if self.closing {
                    return;
                }
                self.log_remote_error("reset_all", &e);
                respond(reply, Err(e.into()));
            },
        }
    }
}
