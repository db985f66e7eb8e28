// Integration tests for analyzer output decoding

use neurovoice::{decode, DecodeError};

const VALID: &str = r#"{"tremor_probability": 0.81, "severity": "High", "tremor_detected": true, "frequency_hz": 5.2}"#;

#[test]
fn test_decode_valid_output() {
    let result = decode(VALID).unwrap();
    assert_eq!(result.tremor_probability, 0.81);
    assert_eq!(result.severity, "High");
    assert!(result.tremor_detected);
    assert_eq!(result.frequency_hz, 5.2);
}

#[test]
fn test_decode_ignores_extra_fields() {
    let raw = r#"{"tremor_probability": 0.1, "severity": "Low", "tremor_detected": false, "frequency_hz": 0, "risk_level": "Low"}"#;
    let result = decode(raw).unwrap();
    assert_eq!(result.severity, "Low");
}

#[test]
fn test_decode_empty_output() {
    assert!(matches!(decode(""), Err(DecodeError::Empty)));
    assert!(matches!(decode("  \n\t"), Err(DecodeError::Empty)));
}

#[test]
fn test_decode_not_json() {
    assert!(matches!(decode("not json"), Err(DecodeError::Syntax(_))));
}

#[test]
fn test_decode_truncated_object() {
    let truncated = &VALID[..VALID.len() - 10];
    assert!(matches!(decode(truncated), Err(DecodeError::Syntax(_))));
}

#[test]
fn test_decode_multiple_objects() {
    let raw = format!("{}\n{}", VALID, VALID);
    assert!(matches!(decode(&raw), Err(DecodeError::Syntax(_))));
}

#[test]
fn test_decode_non_object() {
    assert!(matches!(decode("42"), Err(DecodeError::NotAnObject)));
    assert!(matches!(decode("\"text\""), Err(DecodeError::NotAnObject)));
    assert!(matches!(decode("null"), Err(DecodeError::NotAnObject)));
}

#[test]
fn test_decode_missing_field() {
    let raw = r#"{"tremor_probability": 0.5, "severity": "Medium", "tremor_detected": true}"#;
    let err = decode(raw).unwrap_err();
    assert!(matches!(err, DecodeError::Shape(_)));
    assert!(err.to_string().contains("frequency_hz"));
}

#[test]
fn test_decode_wrong_kinds() {
    let string_probability = r#"{"tremor_probability": "0.5", "severity": "Medium", "tremor_detected": true, "frequency_hz": 4.0}"#;
    assert!(matches!(decode(string_probability), Err(DecodeError::Shape(_))));

    let numeric_flag = r#"{"tremor_probability": 0.5, "severity": "Medium", "tremor_detected": 1, "frequency_hz": 4.0}"#;
    assert!(matches!(decode(numeric_flag), Err(DecodeError::Shape(_))));

    let null_severity = r#"{"tremor_probability": 0.5, "severity": null, "tremor_detected": true, "frequency_hz": 4.0}"#;
    assert!(matches!(decode(null_severity), Err(DecodeError::Shape(_))));
}

#[test]
fn test_decode_out_of_range_values() {
    let high = r#"{"tremor_probability": 1.3, "severity": "High", "tremor_detected": true, "frequency_hz": 4.0}"#;
    assert!(matches!(
        decode(high),
        Err(DecodeError::OutOfRange { field: "tremor_probability", .. })
    ));

    let negative_hz = r#"{"tremor_probability": 0.3, "severity": "Low", "tremor_detected": false, "frequency_hz": -1.0}"#;
    assert!(matches!(
        decode(negative_hz),
        Err(DecodeError::OutOfRange { field: "frequency_hz", .. })
    ));
}

#[test]
fn test_decode_probability_bounds_inclusive() {
    let zero = r#"{"tremor_probability": 0, "severity": "Low", "tremor_detected": false, "frequency_hz": 0}"#;
    let one = r#"{"tremor_probability": 1, "severity": "High", "tremor_detected": true, "frequency_hz": 6}"#;
    assert_eq!(decode(zero).unwrap().tremor_probability, 0.0);
    assert_eq!(decode(one).unwrap().tremor_probability, 1.0);
}
