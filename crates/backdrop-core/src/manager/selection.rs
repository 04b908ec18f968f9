//! Selection transitions and the projections handed to callers.

use backdrop_types::{Background, BackgroundError, BackgroundFill, BackgroundId, BackgroundType, BackgroundView, Result, Update};
use tracing::{error, info};

use super::BackgroundManager;
use crate::selection::Selection;

impl BackgroundManager {
    /// Select `id` with `background_type` for one variant, or clear the slot.
    ///
    /// Unchanged selections are ignored. The new slot record is stored
    /// first; the in-memory slot and the change notification follow only
    /// when the write succeeded.
    pub(super) async fn set_selection(
        &mut self,
        for_dark_theme: bool,
        id: Option<BackgroundId>,
        background_type: BackgroundType,
    ) -> Result<()> {
        let selection = id.map(|id| Selection::new(id, background_type));
        if self.selection.get(for_dark_theme) == selection.as_ref() {
            return Ok(());
        }

        if let Err(e) = self.store_selection(for_dark_theme, selection.as_ref()).await {
            error!(for_dark_theme, "Failed to save selected background: {}", e);
            return Err(e);
        }
        self.selection.set(for_dark_theme, selection);
        info!(for_dark_theme, background_id = ?id, "Selected background changed");

        self.updates.send_update(self.selection_update(for_dark_theme));
        Ok(())
    }

    /// Rewrite the stored record of a slot from its in-memory state.
    pub(super) async fn save_selection(&self, for_dark_theme: bool) {
        if let Err(e) = self.store_selection(for_dark_theme, self.selection.get(for_dark_theme)).await {
            error!(for_dark_theme, "Failed to save selected background: {}", e);
        }
    }

    async fn store_selection(&self, for_dark_theme: bool, selection: Option<&Selection>) -> Result<()> {
        let record = match selection {
            Some(selection) => {
                let background = self.registry.get(selection.id);
                debug_assert!(background.is_some(), "selected background must be registered");
                let Some(background) = background else {
                    error!(background_id = %selection.id, "Selected background is unknown");
                    return Err(BackgroundError::NotFound { id: selection.id.get() });
                };
                Some((background, &selection.background_type))
            },
            None => None,
        };
        self.persistence.save_selection(for_dark_theme, record).await?;
        Ok(())
    }

    pub(super) fn selection_update(&self, for_dark_theme: bool) -> Update {
        let background = self.selection.get(for_dark_theme).and_then(|selection| {
            self.registry
                .get(selection.id)
                .map(|background| BackgroundView::project(background, &selection.background_type))
        });
        Update::SelectedBackground { for_dark_theme, background }
    }

    /// Projection of `id`, shown with the type it is selected with when a
    /// slot holds it.
    pub(super) fn background_view(&self, id: BackgroundId, for_dark_theme: bool) -> Option<BackgroundView> {
        let background = self.registry.get(id)?;
        let background_type =
            self.selection.type_for(id, for_dark_theme).unwrap_or_else(|| background.background_type());
        Some(BackgroundView::project(background, background_type))
    }

    /// Installed backgrounds ordered for display: the selected one first,
    /// then those matching the variant's darkness, then the rest.
    pub(super) fn installed_views(&self, for_dark_theme: bool) -> Vec<BackgroundView> {
        let selected = self.selection.selected_id(for_dark_theme);
        let mut views: Vec<BackgroundView> =
            self.installed.iter().filter_map(|&id| self.background_view(id, for_dark_theme)).collect();

        if let Some(selected) = selected.filter(|id| !self.installed.contains(id)) {
            views.extend(self.background_view(selected, for_dark_theme));
        }

        views.sort_by_key(|view| {
            if Some(view.id) == selected {
                0
            } else if view.is_dark == for_dark_theme {
                1
            } else {
                2
            }
        });
        views
    }

    /// Put `id` at the front of the installed list unless already there.
    pub(super) fn mark_installed(&mut self, id: BackgroundId) {
        if !self.installed.contains(&id) {
            self.installed.insert(0, id);
        }
    }

    /// Register a new local fill background.
    pub(super) async fn add_fill_background(&mut self, fill: BackgroundFill) -> Result<BackgroundId> {
        let id = self.allocator.next_local_id().await?;
        let is_dark = fill.is_dark();
        let background = Background::local_fill(id, BackgroundType::fill(fill), false, is_dark)
            .map_err(|e| BackgroundError::InvalidFill { message: e.to_string() })?;
        self.registry.upsert(background);
        Ok(id)
    }
}
