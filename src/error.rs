use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

/// Terminal failures of a catalog operation. Edit/delete conflicts are not
/// errors; they come back as outcome variants.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::Invalid { .. } => StatusCode::BAD_REQUEST,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    err: anyhow::Error,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self { status: err.status(), err: anyhow::Error::new(err) }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        CatalogError::from(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.err, "request failed");
        }
        let body = crate::templates::error_page(self.to_string());
        (self.status, Html(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Same failures as [`AppError`], rendered as `{"error": ...}` for the JSON API.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err.into())
    }
}

/// Undecodable bodies, including bad tokens, amounts and dates, are
/// validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        CatalogError::invalid("body", rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "api request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
