use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A client-reported value that may be unknown.
///
/// `Unknown` serializes as JSON `null` and is never replaced by a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reported<T> {
    Unknown,
    Known(T),
}

impl<T> Default for Reported<T> {
    fn default() -> Self {
        Reported::Unknown
    }
}

impl<T> Reported<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Reported::Unknown)
    }
}

/// Value kinds accepted for clinical fields
pub trait ClinicalValue: Sized {
    fn parse_text(text: &str) -> Option<Self>;
    fn from_json(value: &Value) -> Option<Self>;
}

impl ClinicalValue for bool {
    fn parse_text(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_u64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => Self::parse_text(s),
            _ => None,
        }
    }
}

impl ClinicalValue for f64 {
    fn parse_text(text: &str) -> Option<Self> {
        text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => Self::parse_text(s),
            _ => None,
        }
    }
}

impl<T: ClinicalValue> Reported<T> {
    /// Parse a form field; blank text means unknown
    pub fn parse_field(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Reported::Unknown);
        }
        T::parse_text(text)
            .map(Reported::Known)
            .ok_or_else(|| format!("unrecognized value {:?}", text))
    }
}

impl<T: Serialize> Serialize for Reported<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reported::Known(v) => serializer.serialize_some(v),
            Reported::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: ClinicalValue> Deserialize<'de> for Reported<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Reported::Unknown),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Reported::Unknown),
            Some(value) => T::from_json(&value)
                .map(Reported::Known)
                .ok_or_else(|| D::Error::custom(format!("unrecognized value {}", value))),
        }
    }
}

/// Optional clinical metadata supplied alongside a recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalInputs {
    pub age_binary: Reported<bool>,
    pub neurological_history: Reported<bool>,
    pub hypertension: Reported<bool>,
    /// UPDRS rating scale value
    pub updrs: Reported<f64>,
}

impl ClinicalInputs {
    /// Apply one form field. Returns `Ok(false)` if `name` is not a clinical field.
    pub fn set_field(&mut self, name: &str, text: &str) -> Result<bool, String> {
        let with_name = |e: String| format!("{}: {}", name, e);
        match name {
            "age_binary" => self.age_binary = Reported::parse_field(text).map_err(with_name)?,
            "neurological_history" => {
                self.neurological_history = Reported::parse_field(text).map_err(with_name)?
            }
            "hypertension" => {
                self.hypertension = Reported::parse_field(text).map_err(with_name)?
            }
            "updrs" => self.updrs = Reported::parse_field(text).map_err(with_name)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_unknown_not_false() {
        let inputs: ClinicalInputs = serde_json::from_str("{}").unwrap();
        assert!(inputs.hypertension.is_unknown());
        assert!(inputs.updrs.is_unknown());

        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["hypertension"], Value::Null);
        assert_eq!(json["age_binary"], Value::Null);
    }

    #[test]
    fn test_form_field_forms() {
        let mut inputs = ClinicalInputs::default();
        assert!(inputs.set_field("hypertension", "0").unwrap());
        assert!(inputs.set_field("neurological_history", "Yes").unwrap());
        assert!(inputs.set_field("updrs", " 12.5 ").unwrap());
        assert!(inputs.set_field("age_binary", "").unwrap());
        assert!(!inputs.set_field("userId", "abc").unwrap());

        assert_eq!(inputs.hypertension, Reported::Known(false));
        assert_eq!(inputs.neurological_history, Reported::Known(true));
        assert_eq!(inputs.updrs, Reported::Known(12.5));
        assert_eq!(inputs.age_binary, Reported::Unknown);
    }

    #[test]
    fn test_unparseable_field_is_rejected() {
        let mut inputs = ClinicalInputs::default();
        let err = inputs.set_field("hypertension", "maybe").unwrap_err();
        assert!(err.contains("hypertension"));
        assert!(inputs.set_field("updrs", "NaN").is_err());
    }

    #[test]
    fn test_json_flags_accept_numbers_and_bools() {
        let inputs: ClinicalInputs = serde_json::from_str(
            r#"{"age_binary": 1, "neurological_history": false, "hypertension": "1", "updrs": null}"#,
        )
        .unwrap();
        assert_eq!(inputs.age_binary, Reported::Known(true));
        assert_eq!(inputs.neurological_history, Reported::Known(false));
        assert_eq!(inputs.hypertension, Reported::Known(true));
        assert_eq!(inputs.updrs, Reported::Unknown);
    }
}
