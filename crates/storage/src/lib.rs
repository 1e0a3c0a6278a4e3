use directories::ProjectDirs;
use log::{info, warn};
use pagemark_core::{validate_state, ImportError, PageAnnotationMap, SnapshotSink};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
const SNAPSHOT_FILE: &str = "annotations.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("snapshot schema version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
    #[error("stored snapshot is malformed: {0}")]
    Invalid(#[from] ImportError),
}

/// Durable copy of the annotation state under a data directory
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
struct SnapshotEnvelope<'a> {
    version: u32,
    annotations: &'a PageAnnotationMap,
}

#[derive(Debug, Deserialize)]
struct StoredEnvelope {
    version: u32,
    annotations: serde_json::Value,
}

impl SnapshotStorage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Pagemark", "Pagemark")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// The stored state, or `None` if nothing has been saved yet
    pub fn load(&self) -> Result<Option<PageAnnotationMap>, StorageError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path)?;
        let envelope: StoredEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion(envelope.version));
        }

        let annotations: PageAnnotationMap = serde_json::from_value(envelope.annotations)?;
        validate_state(&annotations)?;
        Ok(Some(annotations))
    }

    pub fn save(&self, annotations: &PageAnnotationMap) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = SnapshotEnvelope { version: SNAPSHOT_SCHEMA_VERSION, annotations };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let path = self.snapshot_path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Delete the stored state. Missing files are not an error.
    pub fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.snapshot_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Startup state: the stored map, or an empty one when absent or unreadable
pub fn load_initial(storage: &SnapshotStorage) -> PageAnnotationMap {
    match storage.load() {
        Ok(Some(annotations)) => {
            info!("loaded {} annotations from {}", annotations.len(), storage.root().display());
            annotations
        }
        Ok(None) => PageAnnotationMap::new(),
        Err(err) => {
            warn!("ignoring unreadable snapshot in {}: {}", storage.root().display(), err);
            PageAnnotationMap::new()
        }
    }
}

impl SnapshotSink for SnapshotStorage {
    fn state_changed(&mut self, state: &PageAnnotationMap) {
        if let Err(err) = self.save(state) {
            warn!("failed to persist annotations: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{
        AnnotationId, AnnotationStore, BoundingBox, Color, Label, PendingAnnotation,
    };

    fn pending(x: f64) -> PendingAnnotation {
        PendingAnnotation::new(
            BoundingBox::new(x, 20.0, 40.0, 1.0 / 3.0),
            Label::new("bank_name", "Bank Name", Color::from_hex(0x96CEB4)),
        )
    }

    fn sample() -> PageAnnotationMap {
        let mut map = PageAnnotationMap::new();
        map.page_mut(2).push(pagemark_core::Annotation::from_pending(
            AnnotationId::new_v4(),
            pending(10.5),
        ));
        map
    }

    #[test]
    fn snapshot_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        let state = sample();

        storage.save(&state).expect("save should succeed");
        let loaded = storage.load().expect("load should succeed");

        assert_eq!(loaded, Some(state));
        assert!(!temp.path().join("annotations.json.tmp").exists());
    }

    #[test]
    fn load_none_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path().join("missing"));

        assert_eq!(storage.load().expect("load should succeed"), None);
        assert!(load_initial(&storage).is_empty());
    }

    #[test]
    fn load_initial_falls_back_on_corrupt_file() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        fs::write(storage.snapshot_path(), b"{ not json").expect("write should succeed");

        assert!(matches!(storage.load(), Err(StorageError::Serde(_))));
        assert!(load_initial(&storage).is_empty());
    }

    #[test]
    fn load_initial_falls_back_on_invalid_geometry() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        let snapshot = br##"{"version": 1, "annotations": {"0": [{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 1, "y": 2,
            "width": -5, "height": -7,
            "label": {"id": "bank_name", "name": "Bank Name", "color": "#96CEB4"}}]}}"##;
        fs::write(storage.snapshot_path(), snapshot).expect("write should succeed");

        assert!(matches!(storage.load(), Err(StorageError::Invalid(_))));
        assert!(load_initial(&storage).is_empty());
    }

    #[test]
    fn load_rejects_negative_extent_on_valid_page() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        let snapshot = br##"{"version": 1, "annotations": {"3": [{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 1, "y": 2,
            "width": 4, "height": -7,
            "label": {"id": "bank_name", "name": "Bank Name", "color": "#96CEB4"}}]}}"##;
        fs::write(storage.snapshot_path(), snapshot).expect("write should succeed");

        assert!(matches!(
            storage.load(),
            Err(StorageError::Invalid(ImportError::InvalidGeometry { .. }))
        ));
        assert!(load_initial(&storage).is_empty());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        fs::write(storage.snapshot_path(), br#"{"version": 99, "annotations": {}}"#)
            .expect("write should succeed");

        assert!(matches!(storage.load(), Err(StorageError::UnsupportedVersion(99))));
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        storage.save(&sample()).expect("save should succeed");

        storage.remove().expect("remove should succeed");
        storage.remove().expect("second remove should succeed");
        assert_eq!(storage.load().expect("load should succeed"), None);
    }

    #[test]
    fn store_changes_are_persisted() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let storage = SnapshotStorage::with_root(temp.path());
        let mut store = AnnotationStore::new();
        store.set_sink(Box::new(storage.clone()));

        store.create(pending(1.0), 1);
        store.create(pending(2.0), 3);
        assert_eq!(storage.load().expect("load should succeed").as_ref(), Some(store.state()));

        store.undo();
        assert_eq!(storage.load().expect("load should succeed").as_ref(), Some(store.state()));
    }

    #[test]
    fn sink_swallows_write_failures() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").expect("write should succeed");

        let mut storage = SnapshotStorage::with_root(blocker.join("nested"));
        storage.state_changed(&sample());
        assert!(matches!(storage.load(), Ok(None)));
    }
}
