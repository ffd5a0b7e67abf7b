//! Admission records, the state workflow and attached files.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    admission_directory_path, suffixed_file_name, Address, Admission, AdmissionFile,
    AdmissionForm, AdmissionId, ContinuingEducationPerson, Country, FileId, FormationRef, Gender,
    Person, ProfessionalStatus,
};
pub use repository::{
    AddressView, AdmissionDetail, AdmissionNotification, AdmissionNotifier, AdmissionRepository,
    AdmissionSummary, FileRepository, FileStorage, NotifyError, RepositoryError, StorageError,
};
pub use router::{admission_router, disposition_filename, UPLOAD_SUCCESS_MESSAGE};
pub use service::{
    AdmissionOrdering, AdmissionQuery, AdmissionScope, AdmissionService, AdmissionServiceError,
    FileUpload,
};
pub use state::{
    allowed_next, allowed_next_for_value, check_transition, choices, AdmissionState, StateChoice,
    TransitionError,
};
