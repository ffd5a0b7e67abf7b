//! Leads interested in a formation who have not applied yet.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{Prospect, ProspectFilter, ProspectForm, ProspectId};
pub use repository::ProspectRepository;
pub use router::prospect_router;
pub use service::{ProspectService, ProspectServiceError};
