//! In-memory set of known backgrounds and their secondary indices.
//!
//! Only one writer exists (the manager task), so nothing here is
//! synchronized.

use backdrop_types::{is_local_background_name, Background, BackgroundId, FileId, ReferenceSourceId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

use crate::collaborators::{FileService, ReferenceTracker};

struct Entry {
    background: Background,
    reference_source: Option<ReferenceSourceId>,
}

pub struct BackgroundRegistry {
    backgrounds: HashMap<BackgroundId, Entry>,
    by_file: HashMap<FileId, BackgroundId>,
    by_name: HashMap<String, BackgroundId>,
    /// Reference sources requested before their background was known
    parked_sources: HashMap<BackgroundId, ReferenceSourceId>,
    /// Slugs already looked up in the name cache
    name_cache_loaded: HashSet<String>,
    files: Arc<dyn FileService>,
    references: Arc<dyn ReferenceTracker>,
}

impl BackgroundRegistry {
    pub fn new(files: Arc<dyn FileService>, references: Arc<dyn ReferenceTracker>) -> Self {
        Self {
            backgrounds: HashMap::new(),
            by_file: HashMap::new(),
            by_name: HashMap::new(),
            parked_sources: HashMap::new(),
            name_cache_loaded: HashSet::new(),
            files,
            references,
        }
    }

    pub fn len(&self) -> usize {
        self.backgrounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backgrounds.is_empty()
    }

    pub fn get(&self, id: BackgroundId) -> Option<&Background> {
        self.backgrounds.get(&id).map(|entry| &entry.background)
    }

    pub fn contains(&self, id: BackgroundId) -> bool {
        self.backgrounds.contains_key(&id)
    }

    pub fn id_by_name(&self, slug: &str) -> Option<BackgroundId> {
        self.by_name.get(slug).copied()
    }

    pub fn id_by_file(&self, file_id: FileId) -> Option<BackgroundId> {
        self.by_file.get(&file_id).copied()
    }

    /// Insert `background`, or merge it into the entry with the same id.
    ///
    /// A changed name keeps the previous name mapping; the first entity to
    /// claim a name or a file keeps it. A changed file (by canonical view)
    /// drops the old file mapping together with the reference source.
    pub fn upsert(&mut self, background: Background) {
        let id = background.id;
        debug!(background_id = %id, name = %background.name, "Add background");

        let (old_name, old_file, mut source) = match self.backgrounds.remove(&id) {
            Some(entry) => {
                let old_file = entry.background.file_id();
                (Some(entry.background.name), old_file, entry.reference_source)
            },
            None => (None, None, self.parked_sources.remove(&id)),
        };

        if old_name.as_deref() != Some(background.name.as_str()) {
            if let Some(old_name) = old_name {
                error!(background_id = %id, "Background name has changed from {} to {}", old_name, background.name);
            }
            if !is_local_background_name(&background.name) {
                self.by_name.entry(background.name.clone()).or_insert(id);
            }
            self.name_cache_loaded.remove(&background.name);
        }

        let new_file = background.file_id();
        if old_file != new_file {
            if let Some(old_file) = old_file {
                let old_view = self.files.get_file_view(old_file).file_id;
                let new_view = new_file.map(|f| self.files.get_file_view(f).file_id);
                if new_view != Some(old_view) {
                    error!(background_id = %id, "Background file has changed from {} to {:?}", old_file, new_file);
                    self.by_file.remove(&old_file);
                    source = None;
                }
            }
            if let Some(file_id) = new_file {
                let source =
                    *source.get_or_insert_with(|| self.references.create_reference_source(id, background.access_hash));
                for document_file in self.files.document_file_ids(file_id) {
                    self.references.add_reference(document_file, source);
                }
                self.by_file.entry(file_id).or_insert(id);
            }
        }

        self.backgrounds.insert(id, Entry { background, reference_source: source });
    }

    /// Map an additional slug onto `id` unless the slug is already taken.
    pub fn alias_name(&mut self, slug: &str, id: BackgroundId) {
        self.by_name.entry(slug.to_string()).or_insert(id);
    }

    pub fn is_name_cache_loaded(&self, slug: &str) -> bool {
        self.name_cache_loaded.contains(slug)
    }

    pub fn mark_name_cache_loaded(&mut self, slug: &str) {
        self.name_cache_loaded.insert(slug.to_string());
    }

    /// Reference source of `id`, created on first use. For an unknown id the
    /// source is parked until the background is first added.
    pub fn reference_source(&mut self, id: BackgroundId, access_hash: i64) -> ReferenceSourceId {
        let references = &self.references;
        match self.backgrounds.get_mut(&id) {
            Some(entry) => *entry
                .reference_source
                .get_or_insert_with(|| references.create_reference_source(id, access_hash)),
            None => *self
                .parked_sources
                .entry(id)
                .or_insert_with(|| references.create_reference_source(id, access_hash)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{MockFileService, MockReferenceTracker};
    use backdrop_types::{BackgroundFill, BackgroundType};

    fn registry() -> (BackgroundRegistry, Arc<MockFileService>, Arc<MockReferenceTracker>) {
        let files = Arc::new(MockFileService::new());
        let references = Arc::new(MockReferenceTracker::new());
        (BackgroundRegistry::new(files.clone(), references.clone()), files, references)
    }

    fn wallpaper(id: i64, name: &str, file: u64) -> Background {
        Background::new(BackgroundId::new(id), name, BackgroundType::wallpaper(false, false), Some(FileId::new(file)))
            .unwrap()
            .with_access_hash(id * 3)
    }

    const REMOTE: i64 = 1 << 40;

    #[test]
    fn test_insert_indexes_name_and_file() {
        let (mut registry, _, references) = registry();
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 10));

        assert_eq!(registry.id_by_name("AbCdEfGhIjKlMnOp"), Some(BackgroundId::new(REMOTE)));
        assert_eq!(registry.id_by_file(FileId::new(10)), Some(BackgroundId::new(REMOTE)));
        assert_eq!(references.created().len(), 1);
        assert_eq!(references.added().len(), 1);
    }

    #[test]
    fn test_local_names_are_not_indexed() {
        let (mut registry, _, _) = registry();
        let fill = BackgroundType::fill(BackgroundFill::solid(0xFF0000).unwrap());
        registry.upsert(Background::local_fill(BackgroundId::new(1), fill, false, false).unwrap());

        assert!(registry.contains(BackgroundId::new(1)));
        assert_eq!(registry.id_by_name("ff0000"), None);
    }

    #[test]
    fn test_name_change_keeps_old_mapping() {
        let (mut registry, _, _) = registry();
        registry.upsert(wallpaper(REMOTE, "OldNameOldName00", 10));
        registry.upsert(wallpaper(REMOTE, "NewNameNewName00", 10));

        let id = Some(BackgroundId::new(REMOTE));
        assert_eq!(registry.id_by_name("OldNameOldName00"), id);
        assert_eq!(registry.id_by_name("NewNameNewName00"), id);
        assert_eq!(registry.get(BackgroundId::new(REMOTE)).unwrap().name, "NewNameNewName00");
    }

    #[test]
    fn test_first_claim_of_a_name_wins() {
        let (mut registry, _, _) = registry();
        registry.upsert(wallpaper(REMOTE, "SharedSlugShared", 10));
        registry.upsert(wallpaper(REMOTE + 1, "SharedSlugShared", 11));

        assert_eq!(registry.id_by_name("SharedSlugShared"), Some(BackgroundId::new(REMOTE)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_file_change_drops_old_file_and_source() {
        let (mut registry, _, references) = registry();
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 10));
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 20));

        assert_eq!(registry.id_by_file(FileId::new(10)), None);
        assert_eq!(registry.id_by_file(FileId::new(20)), Some(BackgroundId::new(REMOTE)));
        assert_eq!(references.created().len(), 2);
    }

    #[test]
    fn test_merged_file_keeps_source() {
        let (mut registry, files, references) = registry();
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 10));
        files.merge_ids(FileId::new(10), FileId::new(20));
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 20));

        assert_eq!(registry.id_by_file(FileId::new(10)), Some(BackgroundId::new(REMOTE)));
        assert_eq!(registry.id_by_file(FileId::new(20)), Some(BackgroundId::new(REMOTE)));
        assert_eq!(references.created().len(), 1);
    }

    #[test]
    fn test_parked_source_is_adopted() {
        let (mut registry, _, references) = registry();
        let parked = registry.reference_source(BackgroundId::new(REMOTE), 5);
        assert_eq!(registry.reference_source(BackgroundId::new(REMOTE), 5), parked);

        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 10));
        assert_eq!(references.created().len(), 1);
        assert_eq!(references.added(), vec![(FileId::new(10), parked)]);
        assert_eq!(registry.reference_source(BackgroundId::new(REMOTE), 5), parked);
    }

    #[test]
    fn test_upsert_clears_name_cache_marker() {
        let (mut registry, _, _) = registry();
        registry.mark_name_cache_loaded("AbCdEfGhIjKlMnOp");
        registry.upsert(wallpaper(REMOTE, "AbCdEfGhIjKlMnOp", 10));
        assert!(!registry.is_name_cache_loaded("AbCdEfGhIjKlMnOp"));

        registry.alias_name("DriftedSlugDrift", BackgroundId::new(REMOTE));
        assert_eq!(registry.id_by_name("DriftedSlugDrift"), Some(BackgroundId::new(REMOTE)));
    }
}
