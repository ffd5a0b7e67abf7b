use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

/// Header carrying the username authenticated by the upstream proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";
/// Comma separated group names of the authenticated user.
pub const REMOTE_GROUPS_HEADER: &str = "x-remote-groups";

/// Role groups known to the continuing-education module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    StudentWorkers,
    TrainingManagers,
    Managers,
}

impl Group {
    pub const fn name(self) -> &'static str {
        match self {
            Self::StudentWorkers => "continuing_education_student_workers",
            Self::TrainingManagers => "continuing_education_training_managers",
            Self::Managers => "continuing_education_managers",
        }
    }
}

/// Authenticated user and the names of the groups it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub groups: BTreeSet<String>,
}

impl User {
    pub fn new<I, S>(username: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_groups(username: impl Into<String>, groups: &[Group]) -> Self {
        Self::new(username, groups.iter().map(|group| group.name()))
    }

    pub fn in_group(&self, group: Group) -> bool {
        self.groups.contains(group.name())
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let username = headers
            .get(REMOTE_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        let groups = headers
            .get(REMOTE_GROUPS_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|group| !group.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Some(Self::new(username, groups))
    }
}

/// Extractor for routes that need an authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug)]
pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        let payload = json!({ "error": "authentication required" });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = MissingIdentity;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        User::from_headers(&parts.headers)
            .map(CurrentUser)
            .ok_or(MissingIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_user_and_groups_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REMOTE_USER_HEADER, HeaderValue::from_static("jdoe"));
        headers.insert(
            REMOTE_GROUPS_HEADER,
            HeaderValue::from_static(" continuing_education_training_managers, ,staff"),
        );

        let user = User::from_headers(&headers).expect("identity present");
        assert_eq!(user.username, "jdoe");
        assert!(user.in_group(Group::TrainingManagers));
        assert!(!user.in_group(Group::StudentWorkers));
        assert_eq!(user.groups.len(), 2);
    }

    #[test]
    fn blank_user_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(REMOTE_USER_HEADER, HeaderValue::from_static("  "));
        assert!(User::from_headers(&headers).is_none());
    }
}
