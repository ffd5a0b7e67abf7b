use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Admission, AdmissionFile, AdmissionId, FileId};

/// Storage abstraction for admission records.
pub trait AdmissionRepository: Send + Sync {
    fn insert(&self, admission: Admission) -> Result<Admission, RepositoryError>;
    fn update(&self, admission: Admission) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AdmissionId) -> Result<Option<Admission>, RepositoryError>;
    fn delete(&self, id: &AdmissionId) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Admission>, RepositoryError>;
}

/// Metadata of uploaded attachments.
pub trait FileRepository: Send + Sync {
    fn insert(&self, file: AdmissionFile) -> Result<AdmissionFile, RepositoryError>;
    fn fetch(&self, id: &FileId) -> Result<Option<AdmissionFile>, RepositoryError>;
    fn list_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError>;
    fn delete(&self, id: &FileId) -> Result<(), RepositoryError>;
    /// Removes every record of the admission, returning what was removed.
    fn delete_for(&self, admission: &AdmissionId) -> Result<Vec<AdmissionFile>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Binary content of attachments, addressed by their relative storage path.
pub trait FileStorage: Send + Sync {
    fn store(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove '{path}': {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outbound notification hook, called by the service after each write.
pub trait AdmissionNotifier: Send + Sync {
    fn notify(&self, notification: AdmissionNotification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionNotification {
    pub template: String,
    pub admission_id: AdmissionId,
    pub details: BTreeMap<String, String>,
}

impl AdmissionNotification {
    pub fn new(template: impl Into<String>, admission: &Admission) -> Self {
        let mut details = BTreeMap::new();
        details.insert("participant".to_string(), admission.participant());
        details.insert(
            "formation".to_string(),
            admission.form.formation.acronym.clone(),
        );
        details.insert("state".to_string(), admission.state.value().to_string());

        Self {
            template: template.into(),
            admission_id: admission.id,
            details,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Compact list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionSummary {
    pub uuid: AdmissionId,
    pub participant: String,
    pub formation: String,
}

impl From<&Admission> for AdmissionSummary {
    fn from(admission: &Admission) -> Self {
        Self {
            uuid: admission.id,
            participant: admission.participant(),
            formation: admission.form.formation.acronym.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressView {
    pub zip_code: String,
    pub city: String,
    pub location: String,
}

/// Detail view returned by the retrieve, create and update endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionDetail {
    pub uuid: AdmissionId,
    pub participant: String,
    pub formation: String,
    pub state: String,
    pub state_reason: String,
    pub phone_mobile: String,
    pub email: String,
    pub high_school_diploma: bool,
    pub high_school_graduation_year: Option<u16>,
    pub address: Option<AddressView>,
    pub birth_location: String,
    pub birth_date: Option<chrono::NaiveDate>,
}

impl From<&Admission> for AdmissionDetail {
    fn from(admission: &Admission) -> Self {
        let form = &admission.form;
        Self {
            uuid: admission.id,
            participant: admission.participant(),
            formation: form.formation.acronym.clone(),
            state: admission.state.value().to_string(),
            state_reason: admission.state_reason.clone(),
            phone_mobile: form.phone_mobile.clone(),
            email: form.email.clone(),
            high_school_diploma: form.high_school_diploma,
            high_school_graduation_year: form.high_school_graduation_year,
            address: form.address.as_ref().map(|address| AddressView {
                zip_code: address.postal_code.clone(),
                city: address.city.clone(),
                location: address.location.clone(),
            }),
            birth_location: form.person_information.birth_location.clone(),
            birth_date: form.person_information.birth_date,
        }
    }
}
