//! # Backdrop Core
//!
//! Client-side manager of chat background entities.
//!
//! ## Architecture
//!
//! ```text
//! backdrop-core/src/
//! ├── manager/          # Owner task: commands, remote sync, uploads, selection
//! ├── persistence/      # Versioned codec + key-value stores (SQLite, memory)
//! ├── registry.rs       # Entities and their name/file indices
//! ├── allocator.rs      # Durable local identifier counter
//! ├── selection.rs      # Light/dark selection slots
//! ├── pending.rs        # De-duplicated in-flight queries
//! ├── upload.rs         # Pending upload records
//! └── collaborators.rs  # Transport, file, reference and update seams
//! ```
//!
//! All mutable state lives inside one [`manager::BackgroundManager`] task.
//! Callers talk to it through the cloneable [`manager::BackgroundManagerHandle`].

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards in store backends are scoped to single statements"
)]

pub mod allocator;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod logger;
pub mod manager;
pub mod pending;
pub mod persistence;
pub mod registry;
pub mod selection;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub use collaborators::{FileService, FileView, MergeError, ReferenceTracker, Transport, UpdateSink, UploadCallback};
pub use error::{StorageError, StorageResult};
pub use manager::{BackgroundManager, BackgroundManagerHandle, Collaborators};
pub use persistence::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
