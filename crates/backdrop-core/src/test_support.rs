//! Scripted collaborators for tests.
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use backdrop_types::protocol::{RemoteDocument, Request, Response, UploadHandle};
use backdrop_types::{BackgroundId, FileId, ReferenceSourceId, RemoteError, Update};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

use crate::collaborators::{FileService, FileView, MergeError, ReferenceTracker, Transport, UpdateSink, UploadCallback};
use crate::error::{StorageError, StorageResult};
use crate::persistence::{KeyValueStore, MemoryKeyValueStore};

type Responder = Box<dyn Fn(&Request) -> Result<Response, RemoteError> + Send + Sync>;

/// Transport answering from a closure. A gated transport holds every
/// request until [`MockTransport::release`] is called.
pub(crate) struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<Request>>,
    arrived: Notify,
    gate: Option<Semaphore>,
}

impl MockTransport {
    pub(crate) fn new(responder: impl Fn(&Request) -> Result<Response, RemoteError> + Send + Sync + 'static) -> Self {
        Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()), arrived: Notify::new(), gate: None }
    }

    pub(crate) fn gated(responder: impl Fn(&Request) -> Result<Response, RemoteError> + Send + Sync + 'static) -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::new(responder) }
    }

    pub(crate) fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wait until at least `count` requests reached the transport.
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.arrived.notified();
                if self.request_count() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .unwrap();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response, RemoteError> {
        self.requests.lock().push(request.clone());
        self.arrived.notify_waiters();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        (self.responder)(&request)
    }
}

#[derive(Default)]
struct FileState {
    views: HashMap<FileId, FileView>,
    canonical: HashMap<FileId, FileId>,
    uploads: Vec<FileId>,
    canceled: Vec<FileId>,
    deleted_partial: Vec<FileId>,
    merges: Vec<(FileId, FileId)>,
    callbacks: HashMap<FileId, Arc<dyn UploadCallback>>,
}

/// File subsystem keeping merges so that views resolve to canonical ids.
pub(crate) struct MockFileService {
    state: Mutex<FileState>,
    next_file: AtomicU64,
    /// Completes every upload right away with this outcome
    auto_upload: Mutex<Option<Result<Option<UploadHandle>, RemoteError>>>,
}

impl MockFileService {
    pub(crate) fn new() -> Self {
        Self { state: Mutex::new(FileState::default()), next_file: AtomicU64::new(1_000), auto_upload: Mutex::new(None) }
    }

    pub(crate) fn set_view(&self, view: FileView) {
        self.state.lock().views.insert(view.file_id, view);
    }

    pub(crate) fn complete_uploads_with(&self, outcome: Result<Option<UploadHandle>, RemoteError>) {
        *self.auto_upload.lock() = Some(outcome);
    }

    pub(crate) fn merge_ids(&self, canonical: FileId, other: FileId) {
        self.state.lock().canonical.insert(other, canonical);
    }

    /// Fail an upload that was left pending.
    pub(crate) fn fail_upload(&self, file_id: FileId, error: RemoteError) {
        let callback = self.state.lock().callbacks.remove(&file_id).unwrap();
        callback.on_upload_error(file_id, error);
    }

    fn resolve(&self, file_id: FileId) -> FileId {
        let state = self.state.lock();
        let mut current = file_id;
        while let Some(next) = state.canonical.get(&current).filter(|next| **next != current) {
            current = *next;
        }
        current
    }

    pub(crate) fn uploads(&self) -> Vec<FileId> {
        self.state.lock().uploads.clone()
    }

    pub(crate) fn canceled(&self) -> Vec<FileId> {
        self.state.lock().canceled.clone()
    }

    pub(crate) fn deleted_partial(&self) -> Vec<FileId> {
        self.state.lock().deleted_partial.clone()
    }

    pub(crate) fn merges(&self) -> Vec<(FileId, FileId)> {
        self.state.lock().merges.clone()
    }
}

impl FileService for MockFileService {
    fn get_file_view(&self, file_id: FileId) -> FileView {
        let resolved = self.resolve(file_id);
        let mut view = self.state.lock().views.get(&file_id).copied().unwrap_or(FileView {
            file_id,
            is_encrypted: false,
            has_local_location: true,
            has_generate_location: false,
        });
        view.file_id = resolved;
        view
    }

    fn dup_file_id(&self, _file_id: FileId) -> FileId {
        FileId::new(self.next_file.fetch_add(1, Ordering::SeqCst))
    }

    fn upload(&self, file_id: FileId, callback: Arc<dyn UploadCallback>) {
        let outcome = self.auto_upload.lock().clone();
        let Some(outcome) = outcome else {
            let mut state = self.state.lock();
            state.uploads.push(file_id);
            state.callbacks.insert(file_id, callback);
            return;
        };
        self.state.lock().uploads.push(file_id);
        tokio::spawn(async move {
            match outcome {
                Ok(handle) => callback.on_upload_ok(file_id, handle),
                Err(error) => callback.on_upload_error(file_id, error),
            }
        });
    }

    fn cancel_upload(&self, file_id: FileId) {
        self.state.lock().canceled.push(file_id);
    }

    fn delete_partial_remote_location(&self, file_id: FileId) {
        self.state.lock().deleted_partial.push(file_id);
    }

    fn merge(&self, canonical: FileId, other: FileId) -> Result<FileId, MergeError> {
        let mut state = self.state.lock();
        state.merges.push((canonical, other));
        state.canonical.insert(other, canonical);
        Ok(canonical)
    }

    fn register_document(&self, document: &RemoteDocument, _is_pattern: bool) -> Option<FileId> {
        u64::try_from(document.id).ok().filter(|id| *id != 0).map(FileId::new)
    }
}

/// Reference tracker handing out sequential sources.
pub(crate) struct MockReferenceTracker {
    next: AtomicU64,
    created: Mutex<Vec<(BackgroundId, i64)>>,
    added: Mutex<Vec<(FileId, ReferenceSourceId)>>,
}

impl MockReferenceTracker {
    pub(crate) fn new() -> Self {
        Self { next: AtomicU64::new(1), created: Mutex::new(Vec::new()), added: Mutex::new(Vec::new()) }
    }

    pub(crate) fn created(&self) -> Vec<(BackgroundId, i64)> {
        self.created.lock().clone()
    }

    pub(crate) fn added(&self) -> Vec<(FileId, ReferenceSourceId)> {
        self.added.lock().clone()
    }
}

impl ReferenceTracker for MockReferenceTracker {
    fn create_reference_source(&self, background_id: BackgroundId, access_hash: i64) -> ReferenceSourceId {
        self.created.lock().push((background_id, access_hash));
        ReferenceSourceId::new(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn add_reference(&self, file_id: FileId, source: ReferenceSourceId) {
        self.added.lock().push((file_id, source));
    }
}

#[derive(Default)]
pub(crate) struct RecordingUpdateSink {
    updates: Mutex<Vec<Update>>,
}

impl RecordingUpdateSink {
    pub(crate) fn updates(&self) -> Vec<Update> {
        self.updates.lock().clone()
    }
}

impl UpdateSink for RecordingUpdateSink {
    fn send_update(&self, update: Update) {
        self.updates.lock().push(update);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreOp {
    Get,
    Set,
    Erase,
}

/// Memory store recording every operation. Writes to a failing key are
/// refused; gated reads wait for [`CountingStore::release_reads`].
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: MemoryKeyValueStore,
    log: Mutex<Vec<(StoreOp, String)>>,
    failing_key: Mutex<Option<String>>,
    read_gate: Option<Semaphore>,
}

impl CountingStore {
    pub(crate) fn with_gated_reads() -> Self {
        Self { read_gate: Some(Semaphore::new(0)), ..Self::default() }
    }

    pub(crate) fn release_reads(&self, permits: usize) {
        if let Some(gate) = &self.read_gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn fail_writes_to(&self, key: &str) {
        *self.failing_key.lock() = Some(key.to_string());
    }

    fn check_write(&self, key: &str) -> StorageResult<()> {
        if self.failing_key.lock().as_deref() == Some(key) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }

    pub(crate) fn count(&self, op: StoreOp, key: &str) -> usize {
        self.log.lock().iter().filter(|(o, k)| *o == op && k == key).count()
    }

    pub(crate) fn total(&self, op: StoreOp) -> usize {
        self.log.lock().iter().filter(|(o, _)| *o == op).count()
    }

    pub(crate) fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.peek(key)
    }

    /// Seed a value without recording it.
    pub(crate) async fn seed(&self, key: &str, value: Vec<u8>) {
        self.inner.set(key, value).await.unwrap();
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.log.lock().push((StoreOp::Get, key.to_string()));
        if let Some(gate) = &self.read_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.log.lock().push((StoreOp::Set, key.to_string()));
        self.check_write(key)?;
        self.inner.set(key, value).await
    }

    async fn erase(&self, key: &str) -> StorageResult<()> {
        self.log.lock().push((StoreOp::Erase, key.to_string()));
        self.check_write(key)?;
        self.inner.erase(key).await
    }
}
