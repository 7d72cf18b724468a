//! Live HTTP bridge.
//!
//! Every apply request runs on the blocking pool while holding the single
//! session lock, so host calls never interleave: resolve clip → bake →
//! install LUT → apply happens as one unit per request. `/health` reads the
//! session's status flag and never waits on that lock.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use vibe_core::apply::workflow::{LiveApplyOutcome, apply_live_grade};
use vibe_core::{
    GradeError, GradeErrorKind, HostConnector, HostSession, LutInstaller, SessionStatus,
};

use crate::ipc::{ApplyResponse, ErrorResponse, HealthResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct BridgeState {
    session: Arc<Mutex<HostSession>>,
    status: SessionStatus,
    installer: Arc<dyn LutInstaller>,
}

impl BridgeState {
    pub fn new(connector: Arc<dyn HostConnector>, installer: Arc<dyn LutInstaller>) -> Self {
        let session = HostSession::new(connector);
        Self {
            status: session.status(),
            session: Arc::new(Mutex::new(session)),
            installer,
        }
    }

    /// Best-effort connection at startup; requests reconnect on demand.
    pub fn connect_on_startup(&self) {
        if let Err(e) = self.session.lock().connect() {
            tracing::warn!("Resolve not reachable at startup: {e}");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Run one live apply under the session lock. Blocks.
    fn apply_blocking(&self, body: &[u8]) -> Result<LiveApplyOutcome, GradeError> {
        // An unparseable body is reported as a missing `primary`, after host
        // state has been checked.
        let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let mut session = self.session.lock();
        session.with_host(|host| apply_live_grade(host, self.installer.as_ref(), &payload))
    }
}

pub fn router(state: BridgeState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/apply-grade", post(apply_grade))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: BridgeState,
    max_body_bytes: usize,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state, max_body_bytes))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(state): State<BridgeState>) -> Json<HealthResponse> {
    Json(health_impl(&state))
}

pub fn health_impl(state: &BridgeState) -> HealthResponse {
    HealthResponse::new(state.is_connected())
}

async fn apply_grade(State(state): State<BridgeState>, body: Bytes) -> Response {
    match apply_grade_impl(&state, body).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => (err.status, Json(err.response)).into_response(),
    }
}

pub async fn apply_grade_impl(state: &BridgeState, body: Bytes) -> Result<ApplyResponse, HttpErr> {
    let state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || state.apply_blocking(&body))
        .await
        .map_err(|e| HttpErr::internal(format!("apply task failed: {e}")))?;

    match outcome {
        Ok(outcome) => {
            tracing::info!(
                clip = %outcome.clip,
                node = outcome.result.node_index,
                lut = %outcome.lut.relative_path,
                "Grade applied"
            );
            Ok(ApplyResponse::success(outcome.message()))
        }
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "Error applying grade: {e}");
            Err(e.into())
        }
    }
}

/// Status plus `{error}` body for a failed request.
#[derive(Debug)]
pub struct HttpErr {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl HttpErr {
    fn new(status: StatusCode, error: String) -> Self {
        Self {
            status,
            response: ErrorResponse { error },
        }
    }

    fn internal(error: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<GradeError> for HttpErr {
    fn from(e: GradeError) -> Self {
        let status = match e.kind() {
            GradeErrorKind::Connection => StatusCode::SERVICE_UNAVAILABLE,
            GradeErrorKind::State | GradeErrorKind::Validation => StatusCode::BAD_REQUEST,
            GradeErrorKind::HostRejection | GradeErrorKind::Io | GradeErrorKind::Computation => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}
