//! JSON-over-HTTP surface for the relationship directory.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness check
//! - `POST /connections`: create (or overwrite) a relationship
//! - `GET /connections/{user_id}/{contact_id}`: fetch one relationship
//! - `PATCH /connections/{user_id}/{contact_id}`: sparse update
//! - `DELETE /connections/{user_id}/{contact_id}`: delete
//!
//! Errors are rendered as `{"error": {"kind": ..., "message": ...}}`.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use checkin_core::{
    CreateRequest, KeyRequest, RelationshipChanges, RelationshipKey, UpdateRequest,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::directory::{Directory, DirectoryError, ErrorKind};
use crate::error::ConnectifyError;

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error envelope returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details within an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable category, e.g. `"InvalidFrequency"` or `"NotFound"`.
    pub kind: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind: kind.to_owned(),
                message: message.into(),
            },
        }
    }
}

/// Kind reported when the request body is not valid JSON for the route.
pub const MALFORMED_BODY: &str = "MalformedBody";

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::MissingIdentity
        | ErrorKind::MissingRequiredField
        | ErrorKind::InvalidFrequency
        | ErrorKind::InvalidField
        | ErrorKind::NoFieldsProvided => StatusCode::BAD_REQUEST,
    }
}

/// Handler error: either a directory failure or a body that never parsed.
enum ApiError {
    Directory(DirectoryError),
    Body(JsonRejection),
}

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        ApiError::Directory(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Body(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Directory(e) => {
                let kind = e.kind();
                let body = ErrorResponse::new(kind.as_str(), e.to_string());
                (status_for(kind), Json(body)).into_response()
            }
            ApiError::Body(rejection) => {
                let body = ErrorResponse::new(MALFORMED_BODY, rejection.body_text());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectifyServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    directory: Directory,
}

/// HTTP server wrapping a [`Directory`].
///
/// Serves in a background tokio task which is aborted when the server is
/// dropped.
pub struct ConnectifyServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ConnectifyServer {
    /// Bind to `{config.host}:{config.port}` (port `0` auto-assigns) and
    /// start serving.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectifyError::Server`] if the listener cannot bind.
    pub async fn start(directory: Directory, config: &ServerConfig) -> crate::error::Result<Self> {
        let app = router(directory);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ConnectifyError::Server(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ConnectifyError::Server(format!("failed to get local addr: {e}")))?;

        info!("connectify listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("connectify server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ConnectifyServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Build the router without binding, for embedding or in-process tests.
pub fn router(directory: Directory) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/connections", post(handle_create))
        .route(
            "/connections/{user_id}/{contact_id}",
            get(handle_get).patch(handle_update).delete(handle_delete),
        )
        .with_state(AppState { directory })
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /connections`
async fn handle_create(
    State(state): State<AppState>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let created = state.directory.create(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /connections/{user_id}/{contact_id}`
async fn handle_get(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let request = KeyRequest {
        user_id,
        contact_id,
    };
    let item = state.directory.get(&request).await?;
    Ok(Json(item))
}

/// `PATCH /connections/{user_id}/{contact_id}`
///
/// The key comes from the path; identity fields in the body are ignored.
async fn handle_update(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
    body: Result<Json<RelationshipChanges>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(changes) = body?;
    let request = UpdateRequest::new(RelationshipKey::new(user_id, contact_id), changes);
    let summary = state.directory.update(&request).await?;
    Ok(Json(summary))
}

/// `DELETE /connections/{user_id}/{contact_id}`
async fn handle_delete(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let request = KeyRequest {
        user_id,
        contact_id,
    };
    let confirmation = state.directory.delete(&request).await?;
    Ok(Json(confirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::CheckInError;

    #[test]
    fn validation_kinds_map_to_bad_request() {
        for kind in [
            ErrorKind::MissingIdentity,
            ErrorKind::MissingRequiredField,
            ErrorKind::InvalidFrequency,
            ErrorKind::InvalidField,
            ErrorKind::NoFieldsProvided,
        ] {
            assert_eq!(status_for(kind), StatusCode::BAD_REQUEST, "{kind:?}");
        }
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn directory_error_renders_envelope() {
        let err = ApiError::from(DirectoryError::Validation(CheckInError::NoFieldsProvided));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_envelope_shape() {
        let body = ErrorResponse::new("NotFound", "missing");
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["error"]["kind"], "NotFound");
        assert_eq!(json["error"]["message"], "missing");
    }
}
