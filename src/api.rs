use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::*;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health))
        // Key distribution
        .route("/keys/public.pem", get(public_key))
        // Users
        .route("/users", get(list_users).post(create_user))
        .route("/users/export", get(export_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .with_state(state)
}

// ============ Health & Keys ============

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::success(state.health()))
}

async fn public_key(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PEM_CONTENT_TYPE)],
        state.public_key_pem().to_string(),
    )
}

// ============ User Endpoints ============

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.create_user(req)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn list_users(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::success(state.list_users()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.get_user(id)?;
    Ok(Json(ApiResponse::success(user)))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.update_user(id, req)?;
    Ok(Json(ApiResponse::success(user)))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.delete_user(id)?;
    Ok(Json(ApiResponse::success(user)))
}

// ============ Binary Export ============

async fn export_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if !accepts_octet_stream(&headers) {
        return Err(ApiError::NotAcceptable(
            "Export is only available as application/octet-stream".into(),
        ));
    }

    let bytes = state.export_bytes()?;
    Ok((
        [
            (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    ))
}

/// Missing Accept means anything goes
fn accepts_octet_stream(headers: &HeaderMap) -> bool {
    let accept = match headers.get(header::ACCEPT).map(|v| v.to_str()) {
        None => return true,
        Some(Ok(value)) => value,
        Some(Err(_)) => return false,
    };

    accept.split(',').any(|part| {
        let media = part.split(';').next().unwrap_or("").trim();
        media.eq_ignore_ascii_case(OCTET_STREAM)
            || media.eq_ignore_ascii_case("application/*")
            || media == "*/*"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_accepts_octet_stream() {
        assert!(accepts_octet_stream(&HeaderMap::new()));
        assert!(accepts_octet_stream(&with_accept("application/octet-stream")));
        assert!(accepts_octet_stream(&with_accept("text/html, */*;q=0.8")));
        assert!(accepts_octet_stream(&with_accept("application/*")));
        assert!(!accepts_octet_stream(&with_accept("application/json")));
        assert!(!accepts_octet_stream(&with_accept("text/plain; charset=utf-8")));
    }
}
