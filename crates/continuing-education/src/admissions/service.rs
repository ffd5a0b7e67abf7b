use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::domain::{
    admission_directory_path, suffixed_file_name, Admission, AdmissionFile, AdmissionForm,
    AdmissionId, FileId,
};
use super::repository::{
    AdmissionNotification, AdmissionNotifier, AdmissionRepository, FileRepository, FileStorage,
    NotifyError, RepositoryError, StorageError,
};
use super::state::{check_transition, choices, AdmissionState, StateChoice, TransitionError};
use crate::auth::{PermissionError, RoleRegistry};
use crate::locale::Locale;
use crate::validation::{validate_admission, validate_file_name, ValidationErrors};

/// Which half of the admission lifecycle a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionScope {
    Admissions,
    Registrations,
    All,
}

impl AdmissionScope {
    pub const fn includes(self, state: AdmissionState) -> bool {
        match self {
            Self::Admissions => !state.is_registration(),
            Self::Registrations => state.is_registration(),
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdmissionOrdering {
    #[default]
    Formation,
    FormationDescending,
}

impl FromStr for AdmissionOrdering {
    type Err = AdmissionServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "formation" => Ok(Self::Formation),
            "-formation" => Ok(Self::FormationDescending),
            other => Err(AdmissionServiceError::InvalidQuery(format!(
                "cannot order by '{other}'"
            ))),
        }
    }
}

/// Query-string filters accepted by the list and export endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdmissionQuery {
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub state: Option<AdmissionState>,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
}

impl AdmissionQuery {
    fn matches(&self, admission: &Admission) -> bool {
        let formation = self
            .formation
            .as_deref()
            .filter(|value| !value.is_empty())
            .map_or(true, |value| admission.form.formation.acronym == value);
        let faculty = self
            .faculty
            .as_deref()
            .filter(|value| !value.is_empty())
            .map_or(true, |value| admission.faculty() == Some(value));
        let state = self.state.map_or(true, |state| admission.state == state);

        formation && faculty && state
    }

    pub fn ordering(&self) -> Result<AdmissionOrdering, AdmissionServiceError> {
        self.ordering
            .as_deref()
            .map_or(Ok(AdmissionOrdering::default()), str::parse::<AdmissionOrdering>)
    }
}

/// Upload request resolved by the router.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content: Vec<u8>,
    pub uploaded_by: Option<String>,
}

/// Admission records, their attachments and the state workflow.
pub struct AdmissionService<R, F, S, N> {
    repository: Arc<R>,
    files: Arc<F>,
    storage: Arc<S>,
    notifier: Arc<N>,
    roles: Arc<RoleRegistry>,
    locale: Locale,
}

impl<R, F, S, N> AdmissionService<R, F, S, N>
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        files: Arc<F>,
        storage: Arc<S>,
        notifier: Arc<N>,
        roles: Arc<RoleRegistry>,
    ) -> Self {
        Self {
            repository,
            files,
            storage,
            notifier,
            roles,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Validate and persist a new Draft admission with no applicant account.
    pub fn create(&self, form: AdmissionForm) -> Result<Admission, AdmissionServiceError> {
        self.insert_draft(Admission::new(form, Utc::now()))
    }

    /// Validate and persist a new Draft owned by `applicant`.
    pub fn create_for(
        &self,
        applicant: &str,
        form: AdmissionForm,
    ) -> Result<Admission, AdmissionServiceError> {
        self.insert_draft(Admission::new(form, Utc::now()).with_applicant(applicant))
    }

    fn insert_draft(&self, admission: Admission) -> Result<Admission, AdmissionServiceError> {
        validate_admission(&admission.form)?;

        let admission = self.repository.insert(admission)?;
        info!(
            admission = %admission.id,
            formation = %admission.form.formation.acronym,
            "admission created"
        );

        self.notify_saved(&admission)?;
        Ok(admission)
    }

    /// Persist an existing record as is, keeping its state. Used to load
    /// fixtures; the form is still validated.
    pub fn import(&self, admission: Admission) -> Result<Admission, AdmissionServiceError> {
        validate_admission(&admission.form)?;
        let admission = self.repository.insert(admission)?;
        debug!(admission = %admission.id, state = %admission.state, "admission imported");
        Ok(admission)
    }

    /// Replace the editable fields. The state is left untouched.
    pub fn update(
        &self,
        id: &AdmissionId,
        form: AdmissionForm,
    ) -> Result<Admission, AdmissionServiceError> {
        let mut admission = self.get(id)?;
        validate_admission(&form)?;

        admission.form = form;
        admission.updated_at = Utc::now();
        self.repository.update(admission.clone())?;
        info!(admission = %admission.id, "admission updated");

        self.notify_saved(&admission)?;
        Ok(admission)
    }

    /// Move the admission along the transition table. Refused moves leave the
    /// stored record untouched.
    pub fn change_state(
        &self,
        id: &AdmissionId,
        target: AdmissionState,
        reason: Option<String>,
    ) -> Result<Admission, AdmissionServiceError> {
        let mut admission = self.get(id)?;
        let previous = admission.state;
        check_transition(previous, target)?;

        admission.state = target;
        admission.state_reason = reason.unwrap_or_default();
        admission.updated_at = Utc::now();
        self.repository.update(admission.clone())?;
        info!(
            admission = %admission.id,
            from = %previous,
            to = %target,
            "admission state changed"
        );

        self.notify_saved(&admission)?;
        self.notify_transition(&admission, previous)?;
        Ok(admission)
    }

    pub fn transitions(
        &self,
        id: &AdmissionId,
        locale: Locale,
    ) -> Result<Vec<StateChoice>, AdmissionServiceError> {
        let admission = self.get(id)?;
        Ok(choices(admission.state, locale)?)
    }

    pub fn get(&self, id: &AdmissionId) -> Result<Admission, AdmissionServiceError> {
        let admission = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(admission)
    }

    /// Filtered and ordered listing of one scope.
    pub fn list(
        &self,
        scope: AdmissionScope,
        query: &AdmissionQuery,
    ) -> Result<Vec<Admission>, AdmissionServiceError> {
        let ordering = query.ordering()?;
        let mut admissions: Vec<Admission> = self
            .repository
            .list()?
            .into_iter()
            .filter(|admission| scope.includes(admission.state) && query.matches(admission))
            .collect();

        admissions.sort_by(|left, right| {
            left.form
                .formation
                .acronym
                .cmp(&right.form.formation.acronym)
                .then_with(|| {
                    let left = &left.form.person_information.person;
                    let right = &right.form.person_information.person;
                    left.last_name
                        .cmp(&right.last_name)
                        .then_with(|| left.first_name.cmp(&right.first_name))
                })
        });
        if ordering == AdmissionOrdering::FormationDescending {
            admissions.reverse();
        }

        Ok(admissions)
    }

    /// Delete the admission together with its attachments. Stored bodies go
    /// first; a storage failure leaves the admission and every file record in
    /// place.
    pub fn delete(&self, id: &AdmissionId) -> Result<(), AdmissionServiceError> {
        self.get(id)?;

        let files = self.files.list_for(id)?;
        for file in &files {
            self.storage.remove(&file.path)?;
        }
        self.files.delete_for(id)?;
        self.repository.delete(id)?;

        info!(admission = %id, files = files.len(), "admission deleted");
        Ok(())
    }

    pub fn upload_file(
        &self,
        id: &AdmissionId,
        upload: FileUpload,
    ) -> Result<AdmissionFile, AdmissionServiceError> {
        let name = upload.name.trim().to_string();
        validate_file_name(&name)?;
        if upload.content.is_empty() {
            return Err(AdmissionServiceError::EmptyUpload);
        }

        let admission = self.get(id)?;
        let file_id = FileId::new();
        let taken: Vec<String> = self
            .files
            .list_for(&admission.id)?
            .into_iter()
            .map(|file| file.path)
            .collect();
        let mut path = admission_directory_path(admission.id, &name);
        if taken.contains(&path) {
            path = admission_directory_path(admission.id, &suffixed_file_name(&name, file_id));
        }
        self.storage.store(&path, &upload.content)?;

        let file = self.files.insert(AdmissionFile {
            id: file_id,
            admission: admission.id,
            name,
            path,
            size: upload.content.len() as u64,
            uploaded_by: upload.uploaded_by,
            created_at: Utc::now(),
        })?;
        info!(admission = %admission.id, file = %file.id, size = file.size, "file uploaded");
        Ok(file)
    }

    pub fn list_files(
        &self,
        id: &AdmissionId,
    ) -> Result<Vec<AdmissionFile>, AdmissionServiceError> {
        self.get(id)?;
        Ok(self.files.list_for(id)?)
    }

    pub fn delete_file(
        &self,
        id: &AdmissionId,
        file_id: &FileId,
    ) -> Result<(), AdmissionServiceError> {
        let file = self
            .files
            .fetch(file_id)?
            .filter(|file| file.admission == *id)
            .ok_or(RepositoryError::NotFound)?;

        self.storage.remove(&file.path)?;
        self.files.delete(file_id)?;
        info!(admission = %id, file = %file_id, "file deleted");
        Ok(())
    }

    fn notify_saved(&self, admission: &Admission) -> Result<(), NotifyError> {
        self.notifier
            .notify(AdmissionNotification::new("admission_saved", admission))
    }

    fn notify_transition(
        &self,
        admission: &Admission,
        previous: AdmissionState,
    ) -> Result<(), NotifyError> {
        let templates = match admission.state {
            AdmissionState::Submitted => vec![
                "iufc_admin_admission_submitted".to_string(),
                "iufc_participant_admission_submitted".to_string(),
            ],
            state => vec![format!(
                "iufc_participant_state_changed_{}",
                state.template_key()
            )],
        };

        for template in templates {
            let notification = AdmissionNotification::new(template, admission)
                .with_detail("previous_state", previous.value())
                .with_detail("reason", admission.state_reason.clone());
            self.notifier.notify(notification)?;
        }
        Ok(())
    }
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("uploaded file is empty")]
    EmptyUpload,
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
