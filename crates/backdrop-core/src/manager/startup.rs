//! Restoring persisted state when the manager task starts.

use backdrop_types::Update;
use tracing::{error, info};

use super::BackgroundManager;
use crate::persistence::LoadedSelection;
use crate::selection::Selection;

impl BackgroundManager {
    /// Restore the allocator counter and both selection slots.
    ///
    /// Runs in two passes: the first raises the counter past every local id
    /// found in the slots, the second gives records written before the
    /// counter existed a fresh id. Slots that fail to decode are cleared on
    /// disk.
    pub(super) async fn start_up(&mut self) {
        if let Err(e) = self.allocator.load().await {
            error!("Failed to load local background id counter: {}", e);
        }

        let (light, dark) =
            futures::join!(self.persistence.load_selection(false), self.persistence.load_selection(true));

        let mut slots: [Option<LoadedSelection>; 2] = [None, None];
        let mut need_resave = [false, false];
        for (index, loaded) in [light, dark].into_iter().enumerate() {
            match loaded {
                Ok(Some(selection)) => {
                    let background = &selection.background;
                    if selection.has_new_local_id
                        && background.id.is_local()
                        && !background.background_type().has_file()
                    {
                        if let Err(e) = self.allocator.raise_to(background.id).await {
                            error!("Failed to raise local background id counter: {}", e);
                        }
                    }
                    slots[index] = Some(selection);
                },
                Ok(None) => {},
                Err(e) => {
                    error!(for_dark_theme = index == 1, "Failed to load selected background: {}", e);
                    need_resave[index] = true;
                },
            }
        }

        for (index, slot) in slots.into_iter().enumerate() {
            let for_dark_theme = index == 1;
            if let Some(mut loaded) = slot {
                if !loaded.has_new_local_id && !loaded.background.background_type().has_file() {
                    match self.allocator.next_local_id().await {
                        Ok(id) => {
                            info!(old_id = %loaded.background.id, new_id = %id, "Assigned new local id to background");
                            loaded.background.id = id;
                            need_resave[index] = true;
                        },
                        Err(e) => error!("Failed to allocate local background id: {}", e),
                    }
                }
                let id = loaded.background.id;
                self.registry.upsert(loaded.background);
                self.selection.set(for_dark_theme, Some(Selection::new(id, loaded.set_type)));
            }

            if need_resave[index] {
                self.save_selection(for_dark_theme).await;
            }
        }

        for update in self.current_state() {
            self.updates.send_update(update);
        }
    }

    /// Selection updates for both variants; empty for bots.
    pub(super) fn current_state(&self) -> Vec<Update> {
        if self.config.is_bot {
            return Vec::new();
        }
        vec![self.selection_update(false), self.selection_update(true)]
    }
}
