//! JSON fixtures loaded at start-up or by the export command.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::admissions::domain::{Admission, AdmissionForm};
use crate::admissions::repository::{
    AdmissionNotifier, AdmissionRepository, FileRepository, FileStorage,
};
use crate::admissions::service::{AdmissionService, AdmissionServiceError};
use crate::admissions::state::AdmissionState;
use crate::prospects::domain::ProspectForm;
use crate::prospects::repository::ProspectRepository;
use crate::prospects::service::{ProspectService, ProspectServiceError};

/// An admission fixture: the form plus the state it should be stored in.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmission {
    #[serde(flatten)]
    pub form: AdmissionForm,
    #[serde(default)]
    pub state: Option<AdmissionState>,
    #[serde(default)]
    pub state_reason: String,
    #[serde(default)]
    pub applicant: Option<String>,
}

impl SeedAdmission {
    pub fn into_admission(self, now: DateTime<Utc>) -> Admission {
        let mut admission = Admission::new(self.form, now);
        if let Some(state) = self.state {
            admission.state = state;
        }
        admission.state_reason = self.state_reason;
        admission.applicant = self.applicant;
        admission
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub admissions: Vec<SeedAdmission>,
    #[serde(default)]
    pub prospects: Vec<ProspectForm>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("cannot read seed file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed seed file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("seed admission rejected: {0}")]
    Admission(#[from] AdmissionServiceError),
    #[error("seed prospect rejected: {0}")]
    Prospect(#[from] ProspectServiceError),
}

impl SeedData {
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let raw = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Materialized admissions, stamped with `now`.
    pub fn admissions(&self, now: DateTime<Utc>) -> Vec<Admission> {
        self.admissions
            .iter()
            .cloned()
            .map(|seed| seed.into_admission(now))
            .collect()
    }

    /// Stores every fixture through the services, so forms are validated.
    pub fn load_into<R, F, S, N, P>(
        self,
        admissions: &AdmissionService<R, F, S, N>,
        prospects: &ProspectService<P>,
    ) -> Result<(), SeedError>
    where
        R: AdmissionRepository + 'static,
        F: FileRepository + 'static,
        S: FileStorage + 'static,
        N: AdmissionNotifier + 'static,
        P: ProspectRepository + 'static,
    {
        let now = Utc::now();
        let admission_count = self.admissions.len();
        let prospect_count = self.prospects.len();

        for admission in self.admissions(now) {
            admissions.import(admission)?;
        }
        for prospect in self.prospects {
            prospects.create(prospect)?;
        }

        info!(
            admissions = admission_count,
            prospects = prospect_count,
            "seed data loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "admissions": [
            {
                "person_information": {
                    "person": { "first_name": "Jane", "last_name": "Doe" }
                },
                "formation": { "acronym": "ECON", "faculty": "ESL" },
                "email": "j@example.com",
                "state": "Registration submitted",
                "applicant": "jdoe"
            }
        ],
        "prospects": [
            { "name": "Dupont", "first_name": "Jean", "email": "jean@example.org" }
        ]
    }"#;

    #[test]
    fn parses_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SEED.as_bytes()).expect("write seed");

        let seed = SeedData::from_path(file.path()).expect("seed parses");
        let admissions = seed.admissions(Utc::now());
        assert_eq!(admissions.len(), 1);
        assert_eq!(admissions[0].state, AdmissionState::RegistrationSubmitted);
        assert_eq!(admissions[0].faculty(), Some("ESL"));
        assert!(admissions[0].is_owned_by("jdoe"));
        assert_eq!(seed.prospects[0].email, "jean@example.org");
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            SeedData::from_path(&dir.path().join("absent.json")),
            Err(SeedError::Read { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{ not json").expect("write seed");
        assert!(matches!(
            SeedData::from_path(file.path()),
            Err(SeedError::Parse { .. })
        ));
    }
}
