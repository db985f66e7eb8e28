//! Typed errors for each pipeline stage.
//!
//! ```text
//! PredictError
//! ├── Upload(UploadError)     -- client fault, 400, nothing spawned
//! ├── InvalidInput(String)    -- malformed clinical field, 400
//! ├── InferenceFailed         -- spawn failure, non-zero exit or timeout, 500
//! └── InvalidOutput { raw }   -- analyzer printed something undecodable, 500
//! ```
//!
//! `StoreError` never reaches `/predict` callers; it is logged there and only
//! surfaces on the direct session routes.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No audio file")]
    NoFile,

    #[error("Audio file too large (limit {limit} bytes)")]
    TooLarge { limit: u64 },

    /// The request body hit the router's size limit outside the audio stream
    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("I/O error while storing upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::BodyTooLarge
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("analyzer output is empty")]
    Empty,

    #[error("analyzer output is not valid JSON: {0}")]
    Syntax(String),

    #[error("analyzer output is not a JSON object")]
    NotAnObject,

    #[error("analyzer output has missing or mistyped fields: {0}")]
    Shape(String),

    #[error("analyzer field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session {0} already exists")]
    Duplicate(String),

    #[error("stored session is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Invalid clinical input: {0}")]
    InvalidInput(String),

    #[error("Inference failed")]
    InferenceFailed,

    #[error("Invalid inference output")]
    InvalidOutput { raw: String },
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            PredictError::Upload(_) | PredictError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PredictError::InferenceFailed | PredictError::InvalidOutput { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
