use super::inputs::ClinicalInputs;
use crate::decode::DecodedResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User id recorded when the client does not send one
pub const ANONYMOUS_USER: &str = "anonymous";

/// Voice-model half of an analyzer result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResult {
    pub tremor_probability: f64,
    pub severity: String,
}

/// Motion-model half of an analyzer result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionResult {
    pub tremor_detected: bool,
    pub frequency_hz: f64,
}

/// One persisted session document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    inputs: ClinicalInputs,
    voice_ml: VoiceResult,
    motion_ml: MotionResult,
    /// ISO-8601 UTC with fixed millisecond precision, so text order is time order
    created_at: String,
}

impl SessionRecord {
    pub fn new(
        user_id: Option<&str>,
        inputs: ClinicalInputs,
        voice_ml: VoiceResult,
        motion_ml: MotionResult,
        now: DateTime<Utc>,
    ) -> Self {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(ANONYMOUS_USER)
            .to_string();

        Self {
            id: generate_session_id(now),
            user_id,
            inputs,
            voice_ml,
            motion_ml,
            created_at: format_timestamp(now),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn inputs(&self) -> &ClinicalInputs {
        &self.inputs
    }

    pub fn voice_ml(&self) -> &VoiceResult {
        &self.voice_ml
    }

    pub fn motion_ml(&self) -> &MotionResult {
        &self.motion_ml
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// Assemble the record for a decoded analyzer run
pub fn build(
    user_id: Option<&str>,
    inputs: ClinicalInputs,
    decoded: &DecodedResult,
    now: DateTime<Utc>,
) -> SessionRecord {
    let voice = VoiceResult {
        tremor_probability: decoded.tremor_probability,
        severity: decoded.severity.clone(),
    };
    let motion = MotionResult {
        tremor_detected: decoded.tremor_detected,
        frequency_hz: decoded.frequency_hz,
    };

    SessionRecord::new(user_id, inputs, voice, motion, now)
}

/// `session_<unix-millis>_<random>`; the suffix keeps ids distinct within one clock tick
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    format!("session_{}_{}", now.timestamp_millis(), Uuid::new_v4().simple())
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Reported;
    use chrono::TimeZone;

    fn decoded() -> DecodedResult {
        DecodedResult {
            tremor_probability: 0.72,
            severity: "Moderate".to_string(),
            tremor_detected: true,
            frequency_hz: 5.4,
        }
    }

    #[test]
    fn test_build_nests_voice_and_motion() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let record = build(Some("user-1"), ClinicalInputs::default(), &decoded(), now);

        assert_eq!(record.user_id(), "user-1");
        assert_eq!(record.voice_ml().tremor_probability, 0.72);
        assert_eq!(record.voice_ml().severity, "Moderate");
        assert!(record.motion_ml().tremor_detected);
        assert_eq!(record.motion_ml().frequency_hz, 5.4);
        assert_eq!(record.created_at(), "2025-03-14T09:26:53.000Z");
        assert!(record.id().starts_with("session_1741944413000_"));
    }

    #[test]
    fn test_missing_user_is_anonymous() {
        let now = Utc::now();
        assert_eq!(build(None, ClinicalInputs::default(), &decoded(), now).user_id(), ANONYMOUS_USER);
        assert_eq!(build(Some("  "), ClinicalInputs::default(), &decoded(), now).user_id(), ANONYMOUS_USER);
    }

    #[test]
    fn test_ids_unique_within_same_tick() {
        let now = Utc::now();
        let a = build(None, ClinicalInputs::default(), &decoded(), now);
        let b = build(None, ClinicalInputs::default(), &decoded(), now);
        assert_eq!(a.created_at(), b.created_at());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_document_shape() {
        let inputs = ClinicalInputs {
            hypertension: Reported::Known(false),
            ..Default::default()
        };
        let record = build(Some("u"), inputs, &decoded(), Utc::now());
        let doc = serde_json::to_value(&record).unwrap();

        assert_eq!(doc["userId"], "u");
        assert_eq!(doc["inputs"]["hypertension"], false);
        assert!(doc["inputs"]["age_binary"].is_null());
        assert_eq!(doc["voice_ml"]["severity"], "Moderate");
        assert_eq!(doc["motion_ml"]["frequency_hz"], 5.4);
        assert!(doc["created_at"].is_string());
    }
}
