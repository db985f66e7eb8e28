//! Decoding of analyzer stdout into a typed result

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields every successful analyzer run must report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedResult {
    /// Probability of tremor in the voice sample, within [0, 1]
    pub tremor_probability: f64,
    pub severity: String,
    pub tremor_detected: bool,
    /// Dominant tremor frequency, non-negative
    pub frequency_hz: f64,
}

/// Parse the analyzer's raw stdout.
///
/// The trimmed text must be exactly one JSON object carrying the four
/// expected fields with the expected kinds. Extra fields are ignored.
/// Nothing is defaulted: any failure discards the whole output.
pub fn decode(raw_output: &str) -> Result<DecodedResult, DecodeError> {
    let trimmed = raw_output.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    // Trailing data (a second object, garbage) fails here
    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| DecodeError::Syntax(e.to_string()))?;

    // Checked up front, serde would otherwise accept a positional array
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let result: DecodedResult =
        serde_json::from_value(value).map_err(|e| DecodeError::Shape(e.to_string()))?;

    validate_ranges(&result)?;
    Ok(result)
}

fn validate_ranges(result: &DecodedResult) -> Result<(), DecodeError> {
    let p = result.tremor_probability;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(DecodeError::OutOfRange {
            field: "tremor_probability",
            value: p,
        });
    }

    let hz = result.frequency_hz;
    if !hz.is_finite() || hz < 0.0 {
        return Err(DecodeError::OutOfRange {
            field: "frequency_hz",
            value: hz,
        });
    }

    Ok(())
}
