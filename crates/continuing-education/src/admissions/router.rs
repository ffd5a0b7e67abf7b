use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::{Admission, AdmissionForm, AdmissionId, FileId};
use super::repository::{
    AdmissionDetail, AdmissionNotifier, AdmissionRepository, AdmissionSummary, FileRepository,
    FileStorage, RepositoryError,
};
use super::service::{
    AdmissionQuery, AdmissionScope, AdmissionService, AdmissionServiceError, FileUpload,
};
use super::state::{AdmissionState, TransitionError};
use crate::auth::{CurrentUser, Permission, PermissionError, RoleRegistry, Target, User};
use crate::error::json_error;
use crate::export::{admission_workbook, AdmissionExportFilters};

/// Plain-text body of a successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

const DEFAULT_UPLOAD_FORMAT: &str = "pdf";

/// Router exposing admission, registration and attachment endpoints.
pub fn admission_router<R, F, S, N>(service: Arc<AdmissionService<R, F, S, N>>) -> Router
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions",
            get(list_handler::<R, F, S, N>).post(create_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/export",
            get(export_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/:uuid",
            get(detail_handler::<R, F, S, N>)
                .put(update_handler::<R, F, S, N>)
                .delete(delete_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/:uuid/state",
            post(change_state_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/:uuid/transitions",
            get(transitions_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/:uuid/files",
            put(upload_handler::<R, F, S, N>).get(list_files_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/admissions/:uuid/files/:file_uuid",
            delete(delete_file_handler::<R, F, S, N>),
        )
        .route(
            "/api/v1/registrations",
            get(registrations_handler::<R, F, S, N>),
        )
        .with_state(service)
}

type SharedService<R, F, S, N> = Arc<AdmissionService<R, F, S, N>>;

/// A draft is its applicant's working copy: the applicant who opened it may
/// read, edit and submit it. Everyone else goes through the role permission.
fn authorize_admission(
    roles: &RoleRegistry,
    user: &User,
    permission: Permission,
    admission: &Admission,
) -> Result<(), PermissionError> {
    if admission.is_draft() && admission.is_owned_by(&user.username) {
        return Ok(());
    }
    roles.check(user, permission, Target::Admission(admission))
}

fn parse_query(
    query: Result<Query<AdmissionQuery>, QueryRejection>,
) -> Result<AdmissionQuery, AdmissionServiceError> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| AdmissionServiceError::InvalidQuery(rejection.body_text()))
}

fn list_scope<R, F, S, N>(
    service: &AdmissionService<R, F, S, N>,
    user: &User,
    scope: AdmissionScope,
    query: Result<Query<AdmissionQuery>, QueryRejection>,
) -> Result<Vec<AdmissionSummary>, AdmissionServiceError>
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    service
        .roles()
        .check(user, Permission::ViewAdmission, Target::Nothing)?;
    let query = parse_query(query)?;
    let admissions = service.list(scope, &query)?;
    Ok(admissions.iter().map(AdmissionSummary::from).collect())
}

pub(crate) async fn list_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<AdmissionQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    match list_scope(&service, &user, AdmissionScope::Admissions, query) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn registrations_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<AdmissionQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    match list_scope(&service, &user, AdmissionScope::Registrations, query) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn detail_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(service.roles(), &user, Permission::ViewAdmission, &admission)?;
        Ok(admission)
    });

    match result {
        Ok(admission) => (StatusCode::OK, Json(AdmissionDetail::from(&admission))).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<AdmissionForm>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    match service.create_for(&user.username, form) {
        Ok(admission) => {
            tracing::debug!(user = %user.username, admission = %admission.id, "draft opened");
            (StatusCode::CREATED, Json(AdmissionDetail::from(&admission))).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
    Json(form): Json<AdmissionForm>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(service.roles(), &user, Permission::ChangeAdmission, &admission)?;
        service.update(&id, form)
    });

    match result {
        Ok(admission) => (StatusCode::OK, Json(AdmissionDetail::from(&admission))).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(service.roles(), &user, Permission::CancelAdmission, &admission)?;
        service.delete(&id)
    });

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateChangeRequest {
    pub state: AdmissionState,
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn change_state_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
    Json(request): Json<StateChangeRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        let permission = if request.state == AdmissionState::Validated {
            Permission::ValidateRegistration
        } else {
            Permission::ChangeAdmission
        };
        authorize_admission(service.roles(), &user, permission, &admission)?;
        service.change_state(&id, request.state, request.reason)
    });

    match result {
        Ok(admission) => (StatusCode::OK, Json(AdmissionDetail::from(&admission))).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<crate::locale::Locale>,
}

pub(crate) async fn transitions_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
    Query(query): Query<LocaleQuery>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let locale = query.locale.unwrap_or(service.locale());
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(service.roles(), &user, Permission::ViewAdmission, &admission)?;
        service.transitions(&id, locale)
    });

    match result {
        Ok(choices) => (StatusCode::OK, Json(choices)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn export_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<AdmissionQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service
        .roles()
        .check(&user, Permission::ExportAdmission, Target::Nothing)
        .map_err(AdmissionServiceError::from)
        .and_then(|()| parse_query(query))
        .and_then(|query| {
            let admissions = service.list(AdmissionScope::All, &query)?;
            let filters = AdmissionExportFilters {
                faculty: query.faculty.clone(),
                formation: query.formation.clone(),
                state: query.state,
            };
            let locale = query.locale.unwrap_or(service.locale());
            Ok(admission_workbook(&user.username, &admissions, &filters, locale))
        });

    match result {
        Ok(workbook) => workbook.into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// `filename` parameter of a `Content-Disposition` header, quoted or bare.
pub fn disposition_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_DISPOSITION)?.to_str().ok()?;
    value.split(';').map(str::trim).find_map(|parameter| {
        let (key, raw) = parameter.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"').trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

pub(crate) async fn upload_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let name = disposition_filename(&headers).unwrap_or_else(|| {
        let format = query
            .format
            .as_deref()
            .map(str::trim)
            .filter(|format| !format.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_FORMAT);
        format!("upload.{format}")
    });

    let result = service.get(&id).and_then(|admission| {
        authorize_admission(
            service.roles(),
            &user,
            Permission::ChangeReceivedFileState,
            &admission,
        )?;
        service.upload_file(
            &id,
            FileUpload {
                name,
                content: body.to_vec(),
                uploaded_by: Some(user.username.clone()),
            },
        )
    });

    match result {
        Ok(_) => (
            StatusCode::MULTI_STATUS,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            UPLOAD_SUCCESS_MESSAGE,
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_files_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AdmissionId>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(service.roles(), &user, Permission::ViewAdmission, &admission)?;
        service.list_files(&id)
    });

    match result {
        Ok(files) => (StatusCode::OK, Json(files)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_file_handler<R, F, S, N>(
    State(service): State<SharedService<R, F, S, N>>,
    CurrentUser(user): CurrentUser,
    Path((id, file_id)): Path<(AdmissionId, FileId)>,
) -> Response
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
{
    let result = service.get(&id).and_then(|admission| {
        authorize_admission(
            service.roles(),
            &user,
            Permission::ChangeReceivedFileState,
            &admission,
        )?;
        service.delete_file(&id, &file_id)
    });

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for AdmissionServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdmissionServiceError::Validation(errors) => {
                let payload = json!({
                    "error": errors.to_string(),
                    "fields": errors,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            }
            AdmissionServiceError::Transition(TransitionError::UnknownState(_)) => {
                StatusCode::BAD_REQUEST
            }
            AdmissionServiceError::Transition(_) => StatusCode::CONFLICT,
            AdmissionServiceError::Permission(_) => StatusCode::FORBIDDEN,
            AdmissionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AdmissionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AdmissionServiceError::EmptyUpload | AdmissionServiceError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            AdmissionServiceError::Repository(RepositoryError::Unavailable(_))
            | AdmissionServiceError::Storage(_)
            | AdmissionServiceError::Notify(_) => {
                warn!(error = %self, "admission request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        json_error(status, self.to_string())
    }
}
