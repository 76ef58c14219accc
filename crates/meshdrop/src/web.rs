//! Web endpoints for Meshdrop.
//!
//! Provides HTTP access to generated models. Content is served through
//! asset identifiers, with the vault layout as an internal implementation
//! detail.

use crate::error::ApiError;
use assetvault::{AssetId, AssetStore, FileVault};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Response header carrying the asset identifier of a generated model.
pub const MODEL_ID_HEADER: &str = "x-model-id";

/// MIME type for binary glTF content.
const GLTF_BINARY: &str = "model/gltf-binary";

/// Download filename offered on generate responses.
const DOWNLOAD_NAME: &str = "model.glb";

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub vault: Arc<FileVault>,
    /// Simulated processing latency for generate requests. Stands in for
    /// real generation work; zero in tests.
    pub latency: Duration,
}

/// Build the application router.
///
/// `origins` restricts cross-origin callers; an empty list allows any
/// origin. The identifier header and the download disposition are exposed
/// to browser scripts either way.
pub fn router(state: WebState, origins: Vec<HeaderValue>) -> Router {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(MODEL_ID_HEADER),
            header::CONTENT_DISPOSITION,
        ]);

    Router::new()
        .route("/", get(serve_root))
        .route("/health", get(health))
        .route("/generate", post(generate).options(preflight))
        .route("/models/{id}", get(get_model))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve root discovery endpoint
async fn serve_root() -> impl IntoResponse {
    let links = serde_json::json!({
        "name": "Meshdrop",
        "version": env!("CARGO_PKG_VERSION"),
        "links": {
            "generate": "/generate",
            "models": "/models/{id}",
            "health": "/health",
        }
    });
    Json(links)
}

/// Health endpoint
async fn health(State(state): State<WebState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "source_present": state.vault.source_exists(),
    }))
}

/// Generate a model
///
/// Waits out the simulated latency, mints a fresh identifier, copies the
/// source asset into the identifier's stored directory, and returns the
/// copy as a download. The identifier travels in the `x-model-id` header
/// so callers can fetch the model again without parsing the body.
#[tracing::instrument(name = "http.generate", skip(state))]
async fn generate(State(state): State<WebState>) -> Result<Response, ApiError> {
    // Per-request wait only: the runtime keeps serving other requests
    // while this one sleeps.
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }

    if !state.vault.source_exists() {
        return Err(ApiError::NotFound(format!(
            "source model missing: {}",
            state.vault.config().source_path().display()
        )));
    }

    let id = AssetId::new();
    let stored = state.vault.stash(&id)?;
    tracing::info!(model.id = %id, path = %stored.display(), "stored generated model");

    let file = tokio::fs::File::open(&stored)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open stored model: {e}")))?;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, GLTF_BINARY)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{DOWNLOAD_NAME}\""),
        )
        .header(MODEL_ID_HEADER, id.as_str())
        .body(body)
        .map_err(|e| ApiError::Internal(format!("failed to build response: {e}")))
}

/// Plain OPTIONS on /generate: empty 204, no delay, no file operations.
/// CORS preflights are answered by the layer before reaching this handler.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Get a previously generated model by identifier
///
/// Streams the first stored file matching the ordered lookup patterns.
/// Unlike generate, the response carries no download disposition.
#[tracing::instrument(name = "http.model.get", skip(state))]
async fn get_model(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    // Malformed identifiers cannot name a stored directory; report them
    // the same way as an unknown id.
    let asset_id: AssetId = id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("no model for id: {id}")))?;

    let path = state
        .vault
        .find(&asset_id)?
        .ok_or_else(|| ApiError::NotFound(format!("no model for id: {asset_id}")))?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open stored model: {e}")))?;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, GLTF_BINARY)
        .body(body)
        .map_err(|e| ApiError::Internal(format!("failed to build response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn setup_state(source: Option<&[u8]>) -> (WebState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let vault = FileVault::at_path(temp_dir.path()).unwrap();
        if let Some(content) = source {
            std::fs::write(vault.config().source_path(), content).unwrap();
        }

        let state = WebState {
            vault: Arc::new(vault),
            latency: Duration::ZERO,
        };
        (state, temp_dir)
    }

    fn app(state: WebState) -> Router {
        router(state, Vec::new())
    }

    fn generate_request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .body(Body::empty())
            .unwrap()
    }

    fn source_1k() -> Vec<u8> {
        (0u16..1024).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_generate_returns_source_copy() {
        let content = source_1k();
        let (state, _temp_dir) = setup_state(Some(&content));
        let app = app(state);

        let response = app.oneshot(generate_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "model/gltf-binary"
        );
        assert_eq!(
            response.headers().get("content-disposition").unwrap(),
            "attachment; filename=\"model.glb\""
        );

        let id = response
            .headers()
            .get(MODEL_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &content[..]);
    }

    #[tokio::test]
    async fn test_generate_then_get_roundtrip() {
        let content = source_1k();
        let (state, _temp_dir) = setup_state(Some(&content));
        let app = app(state);

        let response = app.clone().oneshot(generate_request()).await.unwrap();
        let id = response
            .headers()
            .get(MODEL_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/models/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "model/gltf-binary"
        );
        // Lookup responses are inline, not downloads.
        assert!(response.headers().get("content-disposition").is_none());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &content[..]);
    }

    #[tokio::test]
    async fn test_get_unknown_id_not_found() {
        let (state, _temp_dir) = setup_state(Some(b"content"));
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/models/{}", AssetId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_get_malformed_id_not_found() {
        let (state, _temp_dir) = setup_state(Some(b"content"));
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/models/not-a-valid-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_without_source_writes_nothing() {
        let (state, temp_dir) = setup_state(None);
        let vault = state.vault.clone();
        let app = app(state);

        let response = app.oneshot(generate_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());

        // No stored directories may appear on the failure path.
        let entries: Vec<_> = std::fs::read_dir(vault.config().assets_dir())
            .unwrap()
            .collect();
        assert!(entries.is_empty());
        drop(temp_dir);
    }

    #[tokio::test]
    async fn test_options_generate_skips_delay() {
        let (mut state, _temp_dir) = setup_state(Some(b"content"));
        // A delay long enough that hitting it would trip the timeout below.
        state.latency = Duration::from_secs(5);
        let app = app(state);

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/generate")
            .body(Body::empty())
            .unwrap();

        let response = tokio::time::timeout(Duration::from_millis(500), app.oneshot(request))
            .await
            .expect("OPTIONS must answer without the simulated delay")
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generates_are_independent() {
        let content = source_1k();
        let (mut state, _temp_dir) = setup_state(Some(&content));
        state.latency = Duration::from_millis(50);
        let vault = state.vault.clone();
        let app = app(state);

        let (a, b) = tokio::join!(
            app.clone().oneshot(generate_request()),
            app.clone().oneshot(generate_request()),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);

        let id_a = a.headers().get(MODEL_ID_HEADER).unwrap().to_str().unwrap();
        let id_b = b.headers().get(MODEL_ID_HEADER).unwrap().to_str().unwrap();
        assert_ne!(id_a, id_b);

        let id_a: AssetId = id_a.parse().unwrap();
        let id_b: AssetId = id_b.parse().unwrap();
        assert!(vault.exists(&id_a));
        assert!(vault.exists(&id_b));
        assert_ne!(vault.out_dir(&id_a), vault.out_dir(&id_b));

        let body_a = to_bytes(a.into_body(), usize::MAX).await.unwrap();
        let body_b = to_bytes(b.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body_a[..], &content[..]);
        assert_eq!(&body_b[..], &content[..]);
    }

    #[tokio::test]
    async fn test_get_prefers_unrigged_mesh() {
        let (state, _temp_dir) = setup_state(Some(b"unrigged"));
        let vault = state.vault.clone();
        let app = app(state);

        let id = AssetId::new();
        let stored = vault.stash(&id).unwrap();
        std::fs::write(
            stored.parent().unwrap().join("mesh_rigged.glb"),
            b"rigged",
        )
        .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/models/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"unrigged");
    }

    #[tokio::test]
    async fn test_cors_preflight_succeeds() {
        let (state, _temp_dir) = setup_state(Some(b"content"));
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/generate")
                    .header("origin", "https://localhost:8081")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_some());
    }

    #[tokio::test]
    async fn test_cors_exposes_model_id_header() {
        let (state, _temp_dir) = setup_state(Some(b"content"));
        let app = app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .header("origin", "https://localhost:8081")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let exposed = response
            .headers()
            .get("access-control-expose-headers")
            .unwrap()
            .to_str()
            .unwrap()
            .to_lowercase();
        assert!(exposed.contains("x-model-id"));
        assert!(exposed.contains("content-disposition"));
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _temp_dir) = setup_state(Some(b"content"));
        let app = app(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["source_present"], true);
    }
}
