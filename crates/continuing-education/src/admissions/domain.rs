use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::state::AdmissionState;

/// Stable external identifier of an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdmissionId(pub Uuid);

impl AdmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AdmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AdmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of an uploaded admission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Country reference data, owned by the reference collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub iso_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: Option<Country>,
}

impl Address {
    /// Single-line rendering for exports and notifications.
    pub fn one_line(&self) -> String {
        let locality = [self.postal_code.trim(), self.city.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [
            self.location.trim(),
            locality.as_str(),
            self.country
                .as_ref()
                .map(|country| country.name.as_str())
                .unwrap_or(""),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

/// Base person entity from the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// One-to-one extension of [`Person`] with birth details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuingEducationPerson {
    pub person: Person,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub birth_location: String,
    #[serde(default)]
    pub birth_country: Option<Country>,
}

impl ContinuingEducationPerson {
    /// `first_name + " " + last_name`, verbatim.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.person.first_name, self.person.last_name)
    }
}

/// Reference to the program an applicant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationRef {
    pub acronym: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub faculty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalStatus {
    Employee,
    SelfEmployed,
    JobSeeker,
    PublicServant,
    Other,
}

/// Editable admission fields as submitted through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionForm {
    pub person_information: ContinuingEducationPerson,
    pub formation: FormationRef,
    #[serde(default)]
    pub citizenship: Option<Country>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub phone_mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub high_school_diploma: bool,
    #[serde(default)]
    pub high_school_graduation_year: Option<u16>,
    #[serde(default)]
    pub last_degree_level: String,
    #[serde(default)]
    pub last_degree_field: String,
    #[serde(default)]
    pub last_degree_institution: String,
    #[serde(default)]
    pub last_degree_graduation_year: Option<u16>,
    #[serde(default)]
    pub professional_status: Option<ProfessionalStatus>,
    #[serde(default)]
    pub current_occupation: String,
    #[serde(default)]
    pub current_employer: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub id_card_number: String,
    #[serde(default)]
    pub passport_number: String,
    #[serde(default)]
    pub academic_year: Option<u16>,
}

/// Persisted admission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: AdmissionId,
    #[serde(flatten)]
    pub form: AdmissionForm,
    pub state: AdmissionState,
    #[serde(default)]
    pub state_reason: String,
    /// Username of the applicant who opened the draft, when created online.
    #[serde(default)]
    pub applicant: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admission {
    pub fn new(form: AdmissionForm, now: DateTime<Utc>) -> Self {
        Self {
            id: AdmissionId::new(),
            form,
            state: AdmissionState::Draft,
            state_reason: String::new(),
            applicant: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn participant(&self) -> String {
        self.form.person_information.display_name()
    }

    pub fn is_draft(&self) -> bool {
        self.state == AdmissionState::Draft
    }

    pub fn with_applicant(mut self, username: impl Into<String>) -> Self {
        self.applicant = Some(username.into());
        self
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.applicant.as_deref() == Some(username)
    }

    pub fn faculty(&self) -> Option<&str> {
        self.form.formation.faculty.as_deref()
    }
}

/// Metadata for a stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionFile {
    pub id: FileId,
    pub admission: AdmissionId,
    pub name: String,
    pub path: String,
    pub size: u64,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Relative storage path of an admission attachment.
pub fn admission_directory_path(admission: AdmissionId, filename: &str) -> String {
    format!("continuing_education/admission_{admission}/{filename}")
}

/// `name` with a short suffix taken from the file id, inserted before the
/// extension: `cv.pdf` becomes `cv_1a2b3c4d.pdf`.
pub fn suffixed_file_name(name: &str, file: FileId) -> String {
    let suffix: String = file.0.simple().to_string().chars().take(8).collect();
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{suffix}.{extension}"),
        _ => format!("{name}_{suffix}"),
    }
}
