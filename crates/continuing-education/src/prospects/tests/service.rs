use super::common::*;
use crate::prospects::domain::{ProspectFilter, ProspectForm, ProspectId};
use crate::prospects::repository::RepositoryError;
use crate::prospects::service::{ProspectService, ProspectServiceError};
use crate::auth::RoleRegistry;
use std::sync::Arc;

#[test]
fn create_assigns_increasing_identifiers() {
    let service = build_service();
    let first = service
        .create(prospect_form("Jean", "Dupont", "jean@example.org"))
        .expect("valid prospect");
    let second = service
        .create(prospect_form("Ann", "Lee", "ann@example.org"))
        .expect("valid prospect");

    assert_eq!(first.id, ProspectId(1));
    assert_eq!(second.id, ProspectId(2));
}

#[test]
fn create_requires_email() {
    let service = build_service();
    match service.create(ProspectForm::default()) {
        Err(ProspectServiceError::Validation(errors)) => assert!(errors.get("email").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(service
        .list(&ProspectFilter::default())
        .expect("list")
        .is_empty());
}

#[test]
fn list_applies_search_and_exact_filters() {
    let service = build_service();
    service
        .create(prospect_form("Jean", "Dupont", "jean@example.org"))
        .expect("created");
    service
        .create(prospect_form("Ann", "Lee", "ann@uclouvain.be"))
        .expect("created");

    let search = ProspectFilter {
        search: Some("UCLOUVAIN".to_string()),
        ..ProspectFilter::default()
    };
    let found = service.list(&search).expect("list");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].form.first_name, "Ann");

    let exact = ProspectFilter {
        first_name: Some("Jean".to_string()),
        postal_code: Some("1348".to_string()),
        ..ProspectFilter::default()
    };
    assert_eq!(service.list(&exact).expect("list").len(), 1);
}

#[test]
fn update_and_delete_report_missing_records() {
    let service = build_service();
    assert!(matches!(
        service.update(ProspectId(9), prospect_form("A", "B", "a@b.be")),
        Err(ProspectServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.delete(ProspectId(9)),
        Err(ProspectServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn repository_outage_propagates() {
    let service = ProspectService::new(
        Arc::new(UnavailableProspects),
        Arc::new(RoleRegistry::standard()),
    );
    assert!(matches!(
        service.create(prospect_form("Jean", "Dupont", "jean@example.org")),
        Err(ProspectServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}
