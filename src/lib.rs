pub mod analyzer;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod predict;
pub mod session;
pub mod store;
pub mod upload;

pub use analyzer::{AnalysisOutcome, Analyzer, FailureReason, ProcessAnalyzer};
pub use config::Config;
pub use decode::{decode, DecodedResult};
pub use error::{DecodeError, PredictError, StoreError, UploadError};
pub use http::{create_router, AppState};
pub use predict::{Pipeline, PredictRequest, PredictResponse};
pub use session::{ClinicalInputs, Reported, SessionRecord};
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use upload::{TransientStorage, UploadedAudio};
