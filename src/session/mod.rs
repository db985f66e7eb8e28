//! Session records
//!
//! This module builds the persisted unit of one analysis:
//! - Client clinical metadata with explicit unknowns
//! - Analyzer results split into voice and motion groups
//! - Generated session id and capture timestamp

mod inputs;
mod record;

pub use inputs::{ClinicalInputs, ClinicalValue, Reported};
pub use record::{
    build, format_timestamp, generate_session_id, MotionResult, SessionRecord, VoiceResult,
    ANONYMOUS_USER,
};
