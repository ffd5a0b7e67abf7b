use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;

use super::domain::{Prospect, ProspectFilter, ProspectForm, ProspectId};
use super::repository::{ProspectRepository, RepositoryError};
use crate::auth::{PermissionError, RoleRegistry};
use crate::locale::Locale;
use crate::validation::{validate_prospect, ValidationErrors};

/// Prospect records behind the CRUD endpoints.
pub struct ProspectService<R> {
    repository: Arc<R>,
    roles: Arc<RoleRegistry>,
    locale: Locale,
    sequence: AtomicU64,
}

impl<R> ProspectService<R>
where
    R: ProspectRepository + 'static,
{
    pub fn new(repository: Arc<R>, roles: Arc<RoleRegistry>) -> Self {
        Self {
            repository,
            roles,
            locale: Locale::default(),
            sequence: AtomicU64::new(1),
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

    pub fn create(&self, form: ProspectForm) -> Result<Prospect, ProspectServiceError> {
        validate_prospect(&form)?;

        let id = ProspectId(self.sequence.fetch_add(1, Ordering::Relaxed));
        let prospect = self.repository.insert(Prospect { id, form })?;
        info!(prospect = %prospect.id, formation = %prospect.form.formation, "prospect created");
        Ok(prospect)
    }

    pub fn get(&self, id: ProspectId) -> Result<Prospect, ProspectServiceError> {
        let prospect = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(prospect)
    }

    pub fn update(
        &self,
        id: ProspectId,
        form: ProspectForm,
    ) -> Result<Prospect, ProspectServiceError> {
        let mut prospect = self.get(id)?;
        validate_prospect(&form)?;

        prospect.form = form;
        self.repository.update(prospect.clone())?;
        info!(prospect = %id, "prospect updated");
        Ok(prospect)
    }

    pub fn delete(&self, id: ProspectId) -> Result<(), ProspectServiceError> {
        self.get(id)?;
        self.repository.delete(id)?;
        info!(prospect = %id, "prospect deleted");
        Ok(())
    }

    /// Matching prospects ordered by identifier.
    pub fn list(&self, filter: &ProspectFilter) -> Result<Vec<Prospect>, ProspectServiceError> {
        let mut prospects: Vec<Prospect> = self
            .repository
            .list()?
            .into_iter()
            .filter(|prospect| filter.matches(prospect))
            .collect();
        prospects.sort_by_key(|prospect| prospect.id);
        Ok(prospects)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProspectServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
