use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::auth::RoleRegistry;
use crate::prospects::domain::{Prospect, ProspectForm, ProspectId};
use crate::prospects::repository::{ProspectRepository, RepositoryError};
use crate::prospects::service::ProspectService;

pub(crate) fn prospect_form(first: &str, last: &str, email: &str) -> ProspectForm {
    ProspectForm {
        name: last.to_string(),
        first_name: first.to_string(),
        postal_code: "1348".to_string(),
        city: "Louvain-la-Neuve".to_string(),
        email: email.to_string(),
        phone_number: "010473000".to_string(),
        formation: "ECON".to_string(),
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryProspects {
    records: Arc<Mutex<BTreeMap<ProspectId, Prospect>>>,
}

impl ProspectRepository for MemoryProspects {
    fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&prospect.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(prospect.id, prospect.clone());
        Ok(prospect)
    }

    fn update(&self, prospect: Prospect) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(prospect.id, prospect);
        Ok(())
    }

    fn fetch(&self, id: ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn delete(&self, id: ProspectId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(crate) struct UnavailableProspects;

impl ProspectRepository for UnavailableProspects {
    fn insert(&self, _prospect: Prospect) -> Result<Prospect, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _prospect: Prospect) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: ProspectId) -> Result<Option<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: ProspectId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(crate) fn build_service() -> Arc<ProspectService<MemoryProspects>> {
    Arc::new(ProspectService::new(
        Arc::new(MemoryProspects::default()),
        Arc::new(RoleRegistry::standard()),
    ))
}
