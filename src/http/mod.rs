//! HTTP API
//!
//! - GET / - Liveness check
//! - POST /predict - Analyze an uploaded recording (multipart, `audio` field)
//! - POST /session - Store a session record directly
//! - GET /session/:user_id - List a user's sessions, oldest first

mod handlers;
mod routes;
mod state;

pub use handlers::{CreateSessionRequest, CreateSessionResponse, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
