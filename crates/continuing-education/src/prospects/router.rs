use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::{ProspectFilter, ProspectForm, ProspectId};
use super::repository::{ProspectRepository, RepositoryError};
use super::service::{ProspectService, ProspectServiceError};
use crate::admissions::router::LocaleQuery;
use crate::auth::{CurrentUser, Permission, Target};
use crate::error::json_error;
use crate::export::prospect_workbook;

/// Router exposing prospect CRUD, search and export.
pub fn prospect_router<R>(service: Arc<ProspectService<R>>) -> Router
where
    R: ProspectRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/prospects",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/v1/prospects/export", get(export_handler::<R>))
        .route(
            "/api/v1/prospects/:id",
            get(detail_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .with_state(service)
}

fn filter_from(
    query: Result<Query<ProspectFilter>, QueryRejection>,
) -> Result<ProspectFilter, Response> {
    query
        .map(|Query(filter)| filter)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, rejection.body_text()))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ProspectFilter>, QueryRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let filter = match filter_from(query) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let result = service
        .roles()
        .check(&user, Permission::ViewProspect, Target::Nothing)
        .map_err(ProspectServiceError::from)
        .and_then(|()| service.list(&filter));

    match result {
        Ok(prospects) => (StatusCode::OK, Json(prospects)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Leads register themselves, so any authenticated caller may create one.
pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(_user): CurrentUser,
    Json(form): Json<ProspectForm>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    match service.create(form) {
        Ok(prospect) => (StatusCode::CREATED, Json(prospect)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ProspectId>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let result = service
        .roles()
        .check(&user, Permission::ViewProspect, Target::Nothing)
        .map_err(ProspectServiceError::from)
        .and_then(|()| service.get(id));

    match result {
        Ok(prospect) => (StatusCode::OK, Json(prospect)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// The permission table has no change or delete right for prospects;
/// `view_prospect` is the training-manager right that covers managing them.
pub(crate) async fn update_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ProspectId>,
    Json(form): Json<ProspectForm>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let result = service
        .roles()
        .check(&user, Permission::ViewProspect, Target::Nothing)
        .map_err(ProspectServiceError::from)
        .and_then(|()| service.update(id, form));

    match result {
        Ok(prospect) => (StatusCode::OK, Json(prospect)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Gated like [`update_handler`].
pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ProspectId>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let result = service
        .roles()
        .check(&user, Permission::ViewProspect, Target::Nothing)
        .map_err(ProspectServiceError::from)
        .and_then(|()| service.delete(id));

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<ProspectService<R>>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ProspectFilter>, QueryRejection>,
    Query(locale): Query<LocaleQuery>,
) -> Response
where
    R: ProspectRepository + 'static,
{
    let filter = match filter_from(query) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let locale = locale.locale.unwrap_or(service.locale());

    let result = service
        .roles()
        .check(&user, Permission::ExportProspect, Target::Nothing)
        .map_err(ProspectServiceError::from)
        .and_then(|()| service.list(&filter));

    match result {
        Ok(prospects) => prospect_workbook(&user.username, &prospects, locale).into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for ProspectServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProspectServiceError::Validation(errors) => {
                let payload = json!({
                    "error": errors.to_string(),
                    "fields": errors,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            }
            ProspectServiceError::Permission(_) => StatusCode::FORBIDDEN,
            ProspectServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ProspectServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ProspectServiceError::Repository(RepositoryError::Unavailable(_)) => {
                warn!(error = %self, "prospect request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        json_error(status, self.to_string())
    }
}
