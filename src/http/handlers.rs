use super::state::AppState;
use crate::error::{PredictError, UploadError};
use crate::predict;
use crate::session::{ClinicalInputs, MotionResult, SessionRecord, VoiceResult};
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Analyzer stdout, only for undecodable output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub inputs: ClinicalInputs,

    pub voice_ml: VoiceResult,

    pub motion_ml: MotionResult,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub id: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            PredictError::Upload(UploadError::NoFile) => ErrorResponse::new("No audio file"),
            PredictError::Upload(UploadError::TooLarge { .. }) => {
                ErrorResponse::new("Audio file too large")
            }
            PredictError::Upload(UploadError::BodyTooLarge) => {
                ErrorResponse::new("Request body too large")
            }
            PredictError::Upload(UploadError::Malformed(_)) => {
                ErrorResponse::new("Malformed upload")
            }
            PredictError::Upload(UploadError::Io(_)) => ErrorResponse::new("Failed to store upload"),
            PredictError::InvalidOutput { raw } => ErrorResponse {
                error: "Invalid inference output".to_string(),
                raw: Some(raw),
            },
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Liveness check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Server alive")
}

/// POST /predict
/// Analyze an uploaded recording and record the session
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    info!("Predict request received");

    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            error!("Rejected predict body: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("No audio file")),
            )
                .into_response();
        }
    };

    let request = match predict::receive(&state.storage, multipart).await {
        Ok(request) => request,
        Err(e) => {
            error!("Upload rejected: {}", e);
            return e.into_response();
        }
    };

    match state.pipeline.run(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session
/// Store a session directly, without running the analyzer
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            error!("Invalid session body: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!(
                    "Invalid session body: {}",
                    rejection.body_text()
                ))),
            )
                .into_response();
        }
    };

    let record = SessionRecord::new(
        req.user_id.as_deref(),
        req.inputs,
        req.voice_ml,
        req.motion_ml,
        Utc::now(),
    );

    match state.store.create(&record).await {
        Ok(()) => {
            info!("Session {} saved for {}", record.id(), record.user_id());
            (
                StatusCode::CREATED,
                Json(CreateSessionResponse {
                    success: true,
                    id: record.id().to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to save session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to save session")),
            )
                .into_response()
        }
    }
}

/// GET /session/:user_id
/// All sessions of a user, oldest first
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.store.query_by_user(&user_id).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!("Failed to fetch sessions for {}: {}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch sessions")),
            )
                .into_response()
        }
    }
}
