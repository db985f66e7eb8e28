//! The `/predict` pipeline
//!
//! ```text
//! ReceivingUpload -> Invoking -> Decoding -> Persisting -> Responding
//!        |              |           |
//!        +--------------+-----------+----> Failed(reason)
//! ```
//!
//! The uploaded blob is owned by `PredictRequest` and released exactly once
//! after the analyzer stages, whichever way they end. Persistence runs on a
//! detached task and never affects the response.
//!
//! The state machine is the control flow of `receive` and `Pipeline::analyze`;
//! `Stage` only names those states in log lines.

use crate::analyzer::{AnalysisOutcome, Analyzer};
use crate::decode::{decode, DecodedResult};
use crate::error::{PredictError, UploadError};
use crate::session::{self, ClinicalInputs, SessionRecord};
use crate::store::SessionStore;
use crate::upload::{TransientStorage, UploadedAudio};
use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";
/// Multipart field carrying the caller's user id
pub const USER_ID_FIELD: &str = "userId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ReceivingUpload,
    Invoking,
    Decoding,
    Persisting,
    Responding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::ReceivingUpload => "receiving-upload",
            Stage::Invoking => "invoking",
            Stage::Decoding => "decoding",
            Stage::Persisting => "persisting",
            Stage::Responding => "responding",
        };
        f.write_str(s)
    }
}

/// Everything accepted from the client for one analysis
#[derive(Debug)]
pub struct PredictRequest {
    pub audio: UploadedAudio,
    pub user_id: Option<String>,
    pub inputs: ClinicalInputs,
    /// When the upload arrived; becomes the record's `created_at`
    pub received_at: DateTime<Utc>,
}

/// Body of a successful `/predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: DecodedResult,
    pub session_id: String,
}

/// Read the multipart form into a `PredictRequest`.
///
/// The audio field is streamed to transient storage as it arrives. Any error
/// after that point drops the handle, which releases the blob.
pub async fn receive(
    storage: &TransientStorage,
    mut multipart: Multipart,
) -> Result<PredictRequest, PredictError> {
    let received_at = Utc::now();
    debug!("[{}] reading form", Stage::ReceivingUpload);
    let mut audio: Option<UploadedAudio> = None;
    let mut user_id = None;
    let mut inputs = ClinicalInputs::default();

    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == AUDIO_FIELD {
            if audio.is_some() {
                debug!("Ignoring extra audio field");
                continue;
            }
            let content_type = field.content_type().map(str::to_string);
            audio = Some(storage.acquire(content_type, field).await?);
            continue;
        }

        let text = field.text().await.map_err(UploadError::from)?;
        if name == USER_ID_FIELD {
            user_id = Some(text);
        } else if !inputs
            .set_field(&name, &text)
            .map_err(PredictError::InvalidInput)?
        {
            debug!("Ignoring unknown form field {:?}", name);
        }
    }

    let audio = audio.ok_or(UploadError::NoFile)?;
    info!(
        "Received audio {:?} ({} bytes, {})",
        audio.path(),
        audio.size(),
        audio.content_type().unwrap_or("unknown type")
    );

    Ok(PredictRequest {
        audio,
        user_id,
        inputs,
        received_at,
    })
}

/// Runs accepted requests through the analyzer and records the result
#[derive(Clone)]
pub struct Pipeline {
    analyzer: Arc<dyn Analyzer>,
    store: Arc<dyn SessionStore>,
}

impl Pipeline {
    pub fn new(analyzer: Arc<dyn Analyzer>, store: Arc<dyn SessionStore>) -> Self {
        Self { analyzer, store }
    }

    pub async fn run(&self, request: PredictRequest) -> Result<PredictResponse, PredictError> {
        let PredictRequest {
            mut audio,
            user_id,
            inputs,
            received_at,
        } = request;

        let result = self
            .analyze(&audio, user_id.as_deref(), inputs, received_at)
            .await;

        audio.release();

        match &result {
            Ok(response) => debug!(
                "[{}] session {} complete",
                Stage::Responding,
                response.session_id
            ),
            Err(e) => warn!("Pipeline failed: {}", e),
        }
        result
    }

    async fn analyze(
        &self,
        audio: &UploadedAudio,
        user_id: Option<&str>,
        inputs: ClinicalInputs,
        received_at: DateTime<Utc>,
    ) -> Result<PredictResponse, PredictError> {
        debug!("[{}] {} on {:?}", Stage::Invoking, self.analyzer.name(), audio.path());
        let raw_output = match self.analyzer.invoke(audio.path()).await {
            AnalysisOutcome::Success { raw_output, stderr } => {
                if !stderr.trim().is_empty() {
                    warn!("Analyzer stderr: {}", stderr.trim());
                }
                raw_output
            }
            AnalysisOutcome::Failure { reason, diagnostic } => {
                error!("Analyzer failed ({}): {}", reason, diagnostic);
                return Err(PredictError::InferenceFailed);
            }
        };

        debug!("[{}] {} bytes of output", Stage::Decoding, raw_output.len());
        let decoded = match decode(&raw_output) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!("Invalid analyzer output ({}): {:?}", e, raw_output);
                return Err(PredictError::InvalidOutput { raw: raw_output });
            }
        };

        let record = session::build(user_id, inputs, &decoded, received_at);
        debug!("[{}] session {}", Stage::Persisting, record.id());
        self.persist_detached(record.clone());

        Ok(PredictResponse {
            result: decoded,
            session_id: record.id().to_string(),
        })
    }

    fn persist_detached(&self, record: SessionRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.create(&record).await {
                Ok(()) => info!("Session {} saved for {}", record.id(), record.user_id()),
                Err(e) => error!("Failed to save session {}: {}", record.id(), e),
            }
        });
    }
}
