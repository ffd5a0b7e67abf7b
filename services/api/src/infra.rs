use continuing_education::admissions::{
    Admission, AdmissionFile, AdmissionId, AdmissionNotification, AdmissionNotifier,
    AdmissionRepository, FileId, FileRepository, FileStorage, NotifyError, RepositoryError,
    StorageError,
};
use continuing_education::prospects::{Prospect, ProspectId, ProspectRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAdmissionRepository {
    records: Arc<Mutex<HashMap<AdmissionId, Admission>>>,
}

impl AdmissionRepository for InMemoryAdmissionRepository {
    fn insert(&self, admission: Admission) -> Result<Admission, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&admission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(admission.id, admission.clone());
        Ok(admission)
    }

    fn update(&self, admission: Admission) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&admission.id) {
            guard.insert(admission.id, admission);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &AdmissionId) -> Result<Option<Admission>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn delete(&self, id: &AdmissionId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Admission>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFileRepository {
    records: Arc<Mutex<HashMap<FileId, AdmissionFile>>>,
}

impl FileRepository for InMemoryFileRepository {
    fn insert(&self, file: AdmissionFile) -> Result<AdmissionFile, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&file.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(file.id, file.clone());
        Ok(file)
    }

    fn fetch(&self, id: &FileId) -> Result<Option<AdmissionFile>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn list_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError> {
        let mut files: Vec<AdmissionFile> = lock(&self.records)?
            .values()
            .filter(|file| file.admission == *admission)
            .cloned()
            .collect();
        files.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(files)
    }

    fn delete(&self, id: &FileId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn delete_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let ids: Vec<FileId> = guard
            .values()
            .filter(|file| file.admission == *admission)
            .map(|file| file.id)
            .collect();
        Ok(ids.iter().filter_map(|id| guard.remove(id)).collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProspectRepository {
    records: Arc<Mutex<BTreeMap<ProspectId, Prospect>>>,
}

impl ProspectRepository for InMemoryProspectRepository {
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&prospect.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(prospect.id, prospect.clone());
        Ok(prospect)
    }

    fn update(&self, prospect: Prospect) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&prospect.id) {
            guard.insert(prospect.id, prospect);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn delete(&self, id: ProspectId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }
}

/// Writes attachments below the media root.
#[derive(Debug, Clone)]
pub(crate) struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStorage for LocalFileStorage {
    fn store(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let target = self.root.join(path);
        let write_error = |source| StorageError::Write {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&target, content).map_err(write_error)
    }

    /// Already-missing files count as removed.
    fn remove(&self, path: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.root.join(path)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// Emits each notification as a structured log event.
#[derive(Debug, Default, Clone)]
pub(crate) struct TracingNotifier;

impl AdmissionNotifier for TracingNotifier {
    fn notify(&self, notification: AdmissionNotification) -> Result<(), NotifyError> {
        info!(
            template = %notification.template,
            admission = %notification.admission_id,
            details = ?notification.details,
            "notification dispatched"
        );
        Ok(())
    }
}
