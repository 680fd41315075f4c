//! Local draft persistence and the debounced autosave.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use brief_core::BriefRecord;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::serialize::{deserialize, serialize};
use crate::status::{Notice, StatusBoard};
use crate::ui::UiState;

/// Key the draft is stored under.
pub const STORAGE_KEY: &str = "brief_form_v1";

/// Quiet window before an autosave is written.
pub const AUTO_SAVE_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value text storage, the role `localStorage` plays in a browser.
pub trait DraftStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DraftStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local storage.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// The single saved draft. Failures are reported, never raised.
///
/// Every `clear` starts a new epoch; writes scheduled in an earlier epoch are
/// dropped instead of resurrecting the cleared draft.
pub struct DraftStore {
    storage: Arc<dyn DraftStorage>,
    status: StatusBoard,
    epoch: Mutex<u64>,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn DraftStorage>, status: StatusBoard) -> Self {
        Self {
            storage,
            status,
            epoch: Mutex::new(0),
        }
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of clears so far.
    pub fn epoch(&self) -> u64 {
        *self.lock_epoch()
    }

    /// Save only if no `clear` happened since `epoch` was read.
    pub fn save_if_current(&self, epoch: u64, record: &BriefRecord) -> bool {
        let current = self.lock_epoch();
        if *current != epoch {
            debug!(scheduled = epoch, current = *current, "dropping stale draft write");
            return false;
        }
        self.save(record);
        true
    }

    /// Overwrite the draft with `record`.
    pub fn save(&self, record: &BriefRecord) {
        let result = serde_json::to_string(record)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                self.storage
                    .set(STORAGE_KEY, &text)
                    .map_err(|e| e.to_string())
            });
        match result {
            Ok(()) => {
                debug!(key = STORAGE_KEY, "draft saved");
                self.status.push(Notice::SavedLocally);
            }
            Err(err) => {
                warn!(key = STORAGE_KEY, error = %err, "failed to save draft");
                self.status.push(Notice::StorageFailed(err));
            }
        }
    }

    /// The saved draft, or `None` when there is none or it cannot be read.
    pub fn load(&self) -> Option<BriefRecord> {
        let text = match self.storage.get(STORAGE_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = STORAGE_KEY, error = %err, "failed to read draft");
                return None;
            }
        };
        match BriefRecord::from_json(&text) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key = STORAGE_KEY, error = %err, "discarding unreadable draft");
                None
            }
        }
    }

    pub fn clear(&self) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        if let Err(err) = self.storage.remove(STORAGE_KEY) {
            warn!(key = STORAGE_KEY, error = %err, "failed to clear draft");
        }
    }

    /// Load the draft into `ui`. Returns whether one was restored.
    pub fn restore_into(&self, ui: &mut UiState) -> bool {
        let Some(record) = self.load() else {
            return false;
        };
        deserialize(&record, ui);
        info!("draft restored");
        self.status.push(Notice::Restored);
        true
    }

    /// Reset the form and forget the draft.
    pub fn clear_form(&self, ui: &mut UiState) {
        ui.reset();
        self.clear();
        self.status.push(Notice::Cleared);
    }
}

/// Debounced autosave: each input cancels the pending write and schedules a new one.
pub struct Autosave {
    store: Arc<DraftStore>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Autosave {
    pub fn new(store: Arc<DraftStore>) -> Self {
        Self::with_delay(store, AUTO_SAVE_DELAY)
    }

    pub fn with_delay(store: Arc<DraftStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Record an input change. Must be called inside a tokio runtime.
    pub fn on_input(&self, ui: &UiState) {
        let record = serialize(ui);
        let deadline = Instant::now() + self.delay;
        let store = Arc::clone(&self.store);
        let epoch = store.epoch();

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            store.save_if_current(epoch, &record);
        }));
    }

    /// Drop the pending write, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::Field;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: AtomicUsize,
    }

    impl DraftStorage for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn store_with(storage: Arc<dyn DraftStorage>) -> (DraftStore, StatusBoard) {
        let status = StatusBoard::new();
        (DraftStore::new(storage, status.clone()), status)
    }

    fn sample() -> BriefRecord {
        BriefRecord::new()
            .with(Field::ClienteNombre, "Acme Co")
            .with(Field::Estilo, vec!["Moderno"])
    }

    #[test]
    fn save_then_load() {
        let (store, status) = store_with(Arc::new(MemoryStorage::new()));
        store.save(&sample());
        assert_eq!(store.load(), Some(sample()));
        assert_eq!(status.latest(), Some(Notice::SavedLocally));
    }

    #[test]
    fn clear_then_load_is_none() {
        let (store, _) = store_with(Arc::new(MemoryStorage::new()));
        store.save(&sample());
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_draft_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STORAGE_KEY, "{not json").unwrap();
        let (store, _) = store_with(storage);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn file_storage_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, _) = store_with(Arc::new(FileStorage::new(tmp.path().join("drafts"))));
        assert_eq!(store.load(), None);
        store.save(&sample());
        assert!(tmp.path().join("drafts/brief_form_v1.json").exists());
        assert_eq!(store.load(), Some(sample()));
        store.clear();
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn storage_failure_is_reported_not_raised() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let (store, status) = store_with(Arc::new(FileStorage::new(blocker.path())));
        store.save(&sample());
        assert!(matches!(status.latest(), Some(Notice::StorageFailed(_))));
    }

    #[test]
    fn restore_and_clear_form() {
        let (store, status) = store_with(Arc::new(MemoryStorage::new()));
        let mut ui = UiState::standard();
        assert!(!store.restore_into(&mut ui));

        store.save(&sample());
        assert!(store.restore_into(&mut ui));
        assert_eq!(serialize(&ui), sample());
        assert_eq!(status.latest(), Some(Notice::Restored));

        store.clear_form(&mut ui);
        assert_eq!(ui, UiState::standard());
        assert_eq!(store.load(), None);
        assert_eq!(status.latest(), Some(Notice::Cleared));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn five_quick_inputs_write_once() {
        let storage = Arc::new(CountingStorage::default());
        let (store, _) = store_with(storage.clone());
        let autosave = Autosave::new(Arc::new(store));

        let mut ui = UiState::standard();
        for name in ["A", "Ac", "Acm", "Acme", "Acme Co"] {
            ui.set_value("clienteNombre", name);
            autosave.on_input(&ui);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(AUTO_SAVE_DELAY).await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);

        let saved = storage.get(STORAGE_KEY).unwrap().unwrap();
        let record = BriefRecord::from_json(&saved).unwrap();
        assert_eq!(record.text(Field::ClienteNombre), "Acme Co");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn separated_inputs_write_each() {
        let storage = Arc::new(CountingStorage::default());
        let (store, _) = store_with(storage.clone());
        let autosave = Autosave::new(Arc::new(store));

        let ui = UiState::standard();
        autosave.on_input(&ui);
        tokio::time::sleep(Duration::from_millis(700)).await;
        autosave.on_input(&ui);
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn clear_form_discards_scheduled_write() {
        let storage = Arc::new(CountingStorage::default());
        let (store, _) = store_with(storage.clone());
        let store = Arc::new(store);
        let autosave = Autosave::new(store.clone());

        let mut ui = UiState::standard();
        ui.set_value("clienteNombre", "Secret Co");
        autosave.on_input(&ui);
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.clear_form(&mut ui);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.load(), None);
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

        // Inputs after the clear are saved again.
        ui.set_value("clienteNombre", "Nuevo");
        autosave.on_input(&ui);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.load().unwrap().text(Field::ClienteNombre), "Nuevo");
    }

    #[test]
    fn stale_epoch_is_not_written() {
        let (store, _) = store_with(Arc::new(MemoryStorage::new()));
        let before = store.epoch();
        store.clear();
        assert!(!store.save_if_current(before, &sample()));
        assert_eq!(store.load(), None);
        assert!(store.save_if_current(store.epoch(), &sample()));
        assert_eq!(store.load(), Some(sample()));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_drops_pending_write() {
        let storage = Arc::new(CountingStorage::default());
        let (store, _) = store_with(storage.clone());
        let autosave = Autosave::new(Arc::new(store));

        autosave.on_input(&UiState::standard());
        autosave.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
    }
}
