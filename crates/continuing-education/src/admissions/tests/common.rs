use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::admissions::domain::{
    Admission, AdmissionFile, AdmissionForm, AdmissionId, ContinuingEducationPerson, FileId,
    FormationRef, Person,
};
use crate::admissions::repository::{
    AdmissionNotification, AdmissionNotifier, AdmissionRepository, FileRepository, FileStorage,
    NotifyError, RepositoryError, StorageError,
};
use crate::admissions::service::AdmissionService;
use crate::admissions::state::AdmissionState;
use crate::auth::identity::{REMOTE_GROUPS_HEADER, REMOTE_USER_HEADER};
use crate::auth::{Group, RoleRegistry};

pub(crate) fn admission_form(first: &str, last: &str, formation: &str) -> AdmissionForm {
    AdmissionForm {
        person_information: ContinuingEducationPerson {
            person: Person {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: String::new(),
                gender: None,
            },
            birth_date: None,
            birth_location: String::new(),
            birth_country: None,
        },
        formation: FormationRef {
            acronym: formation.to_string(),
            title: String::new(),
            faculty: None,
        },
        citizenship: None,
        address: None,
        phone_mobile: String::new(),
        email: String::new(),
        high_school_diploma: false,
        high_school_graduation_year: None,
        last_degree_level: String::new(),
        last_degree_field: String::new(),
        last_degree_institution: String::new(),
        last_degree_graduation_year: None,
        professional_status: None,
        current_occupation: String::new(),
        current_employer: String::new(),
        motivation: String::new(),
        id_card_number: String::new(),
        passport_number: String::new(),
        academic_year: None,
    }
}

pub(crate) fn admission_for(first: &str, last: &str, formation: &str) -> Admission {
    let created = Utc
        .with_ymd_and_hms(2024, 9, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp");
    Admission::new(admission_form(first, last, formation), created)
}

pub(crate) fn admission_in_state(state: AdmissionState) -> Admission {
    let mut admission = admission_for("Jane", "Doe", "ECON");
    admission.state = state;
    admission
}

#[derive(Default, Clone)]
pub(crate) struct MemoryAdmissions {
    pub(crate) records: Arc<Mutex<HashMap<AdmissionId, Admission>>>,
}

impl MemoryAdmissions {
    pub(crate) fn stored(&self, id: &AdmissionId) -> Option<Admission> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl AdmissionRepository for MemoryAdmissions {
    fn insert(&self, admission: Admission) -> Result<Admission, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&admission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(admission.id, admission.clone());
        Ok(admission)
    }

    fn update(&self, admission: Admission) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(admission.id, admission);
        Ok(())
    }

    fn fetch(&self, id: &AdmissionId) -> Result<Option<Admission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &AdmissionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Admission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryFiles {
    pub(crate) records: Arc<Mutex<HashMap<FileId, AdmissionFile>>>,
}

impl FileRepository for MemoryFiles {
    fn insert(&self, file: AdmissionFile) -> Result<AdmissionFile, RepositoryError> {
        let mut guard = self.records.lock().expect("file mutex poisoned");
        guard.insert(file.id, file.clone());
        Ok(file)
    }

    fn fetch(&self, id: &FileId) -> Result<Option<AdmissionFile>, RepositoryError> {
        let guard = self.records.lock().expect("file mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError> {
        let guard = self.records.lock().expect("file mutex poisoned");
        Ok(guard
            .values()
            .filter(|file| file.admission == *admission)
            .cloned()
            .collect())
    }

    fn delete(&self, id: &FileId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("file mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn delete_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError> {
        let mut guard = self.records.lock().expect("file mutex poisoned");
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *guard)
            .into_iter()
            .partition(|(_, file)| file.admission == *admission);
        *guard = kept.into_iter().collect();
        Ok(removed.into_iter().map(|(_, file)| file).collect())
    }
}

/// Keeps stored bodies by relative path.
#[derive(Default, Clone)]
pub(crate) struct MemoryStorage {
    pub(crate) blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub(crate) fn paths(&self) -> Vec<String> {
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub(crate) fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .get(path)
            .cloned()
    }
}

impl FileStorage for MemoryStorage {
    fn store(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .remove(path);
        Ok(())
    }
}

pub(crate) struct BrokenStorage;

impl FileStorage for BrokenStorage {
    fn store(&self, path: &str, _content: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Write {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        Err(StorageError::Remove {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryNotifier {
    events: Arc<Mutex<Vec<AdmissionNotification>>>,
}

impl MemoryNotifier {
    pub(crate) fn templates(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .iter()
            .map(|event| event.template.clone())
            .collect()
    }

    pub(crate) fn events(&self) -> Vec<AdmissionNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl AdmissionNotifier for MemoryNotifier {
    fn notify(&self, notification: AdmissionNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(crate) struct OfflineNotifier;

impl AdmissionNotifier for OfflineNotifier {
    fn notify(&self, _notification: AdmissionNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(crate) type TestService =
    AdmissionService<MemoryAdmissions, MemoryFiles, MemoryStorage, MemoryNotifier>;

pub(crate) struct Harness {
    pub(crate) service: Arc<TestService>,
    pub(crate) admissions: Arc<MemoryAdmissions>,
    pub(crate) files: Arc<MemoryFiles>,
    pub(crate) storage: Arc<MemoryStorage>,
    pub(crate) notifier: Arc<MemoryNotifier>,
}

pub(crate) fn harness() -> Harness {
    let admissions = Arc::new(MemoryAdmissions::default());
    let files = Arc::new(MemoryFiles::default());
    let storage = Arc::new(MemoryStorage::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(AdmissionService::new(
        admissions.clone(),
        files.clone(),
        storage.clone(),
        notifier.clone(),
        Arc::new(RoleRegistry::standard()),
    ));

    Harness {
        service,
        admissions,
        files,
        storage,
        notifier,
    }
}

/// Persists an admission directly in `state`, bypassing the workflow.
pub(crate) fn seed_admission(harness: &Harness, admission: Admission) -> Admission {
    harness
        .admissions
        .insert(admission)
        .expect("seed admission stored")
}

pub(crate) fn request(method: &str, uri: &str, groups: &[Group]) -> axum::http::request::Builder {
    request_as("tester", method, uri, groups)
}

pub(crate) fn request_as(
    user: &str,
    method: &str,
    uri: &str,
    groups: &[Group],
) -> axum::http::request::Builder {
    let groups = groups
        .iter()
        .map(|group| group.name())
        .collect::<Vec<_>>()
        .join(",");
    Request::builder()
        .method(method)
        .uri(uri)
        .header(REMOTE_USER_HEADER, user)
        .header(REMOTE_GROUPS_HEADER, groups)
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    groups: &[Group],
    payload: &impl serde::Serialize,
) -> Request<Body> {
    request(method, uri, groups)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("request builds")
}

pub(crate) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
