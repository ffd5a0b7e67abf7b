use super::domain::{Prospect, ProspectId};

pub use crate::admissions::repository::RepositoryError;

/// Storage abstraction for prospect records.
pub trait ProspectRepository: Send + Sync {
    /// Stores the record and returns it. Fails with `Conflict` when the id is
    /// already taken.
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError>;
    fn update(&self, prospect: Prospect) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ProspectId) -> Result<Option<Prospect>, RepositoryError>;
    fn delete(&self, id: ProspectId) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Prospect>, RepositoryError>;
}
