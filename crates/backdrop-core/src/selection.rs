//! Light and dark selection slots.

use backdrop_types::{BackgroundId, BackgroundType};

/// A selected background and the type it is shown with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: BackgroundId,
    pub background_type: BackgroundType,
}

impl Selection {
    pub const fn new(id: BackgroundId, background_type: BackgroundType) -> Self {
        Self { id, background_type }
    }
}

/// The two theme variants each hold at most one selection.
#[derive(Debug, Default)]
pub struct SelectionSlots {
    slots: [Option<Selection>; 2],
}

const fn slot_index(for_dark_theme: bool) -> usize {
    if for_dark_theme {
        1
    } else {
        0
    }
}

impl SelectionSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, for_dark_theme: bool) -> Option<&Selection> {
        self.slots[slot_index(for_dark_theme)].as_ref()
    }

    pub fn selected_id(&self, for_dark_theme: bool) -> Option<BackgroundId> {
        self.get(for_dark_theme).map(|s| s.id)
    }

    /// Replace a slot. Returns `false` when the slot already held exactly
    /// this selection.
    pub fn set(&mut self, for_dark_theme: bool, selection: Option<Selection>) -> bool {
        let slot = &mut self.slots[slot_index(for_dark_theme)];
        if *slot == selection {
            return false;
        }
        *slot = selection;
        true
    }

    pub fn is_current(&self, for_dark_theme: bool, id: BackgroundId, background_type: &BackgroundType) -> bool {
        self.get(for_dark_theme).is_some_and(|s| s.id == id && s.background_type == *background_type)
    }

    /// Variants whose slot references `id`.
    pub fn variants_referencing(&self, id: BackgroundId) -> Vec<bool> {
        [false, true].into_iter().filter(|&dark| self.selected_id(dark) == Some(id)).collect()
    }

    /// Type `id` is shown with when projected for `for_dark_theme`: this
    /// variant's slot type wins, then the other variant's.
    pub fn type_for(&self, id: BackgroundId, for_dark_theme: bool) -> Option<&BackgroundType> {
        [for_dark_theme, !for_dark_theme]
            .into_iter()
            .filter_map(|dark| self.get(dark))
            .find(|s| s.id == id)
            .map(|s| &s.background_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use backdrop_types::BackgroundFill;

    fn fill(color: u32) -> BackgroundType {
        BackgroundType::fill(BackgroundFill::solid(color).unwrap())
    }

    #[test]
    fn test_set_reports_changes() {
        let mut slots = SelectionSlots::new();
        let selection = Selection::new(BackgroundId::new(3), fill(1));

        assert!(slots.set(false, Some(selection.clone())));
        assert!(!slots.set(false, Some(selection)));
        assert!(slots.is_current(false, BackgroundId::new(3), &fill(1)));
        assert!(!slots.is_current(false, BackgroundId::new(3), &fill(2)));
        assert_eq!(slots.get(true), None);

        assert!(slots.set(false, None));
        assert!(!slots.set(false, None));
    }

    #[test]
    fn test_type_resolution_prefers_own_variant() {
        let mut slots = SelectionSlots::new();
        let id = BackgroundId::new(9);
        slots.set(false, Some(Selection::new(id, fill(1))));
        slots.set(true, Some(Selection::new(id, fill(2))));

        assert_eq!(slots.type_for(id, false), Some(&fill(1)));
        assert_eq!(slots.type_for(id, true), Some(&fill(2)));
        assert_eq!(slots.type_for(BackgroundId::new(10), true), None);
        assert_eq!(slots.variants_referencing(id), vec![false, true]);

        slots.set(true, None);
        assert_eq!(slots.type_for(id, false), Some(&fill(1)));
        assert_eq!(slots.type_for(id, true), Some(&fill(1)));
    }
}
