//! Field value variant.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single field override value.
///
/// Closed variant over the value kinds the template runtime can apply. The
/// serde representation is adjacently tagged so that `Int(5)` and
/// `Float(5.0)` survive a round-trip through the patch document without
/// collapsing into one another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PatchValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

impl PatchValue {
    /// Short kind name, used in diagnostics and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchValue::Int(_) => "int",
            PatchValue::Float(_) => "float",
            PatchValue::Bool(_) => "bool",
            PatchValue::String(_) => "string",
            PatchValue::Null => "null",
        }
    }
}

impl Display for PatchValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchValue::Int(v) => write!(f, "{v}"),
            PatchValue::Float(v) => write!(f, "{v}"),
            PatchValue::Bool(v) => write!(f, "{v}"),
            PatchValue::String(v) => write!(f, "{v}"),
            PatchValue::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_and_float_stay_distinct() {
        let int = serde_json::to_string(&PatchValue::Int(5)).unwrap();
        let float = serde_json::to_string(&PatchValue::Float(5.0)).unwrap();
        assert_ne!(int, float);

        assert_eq!(
            serde_json::from_str::<PatchValue>(&int).unwrap(),
            PatchValue::Int(5)
        );
        assert_eq!(
            serde_json::from_str::<PatchValue>(&float).unwrap(),
            PatchValue::Float(5.0)
        );
    }

    #[test]
    fn test_null_roundtrip() {
        let json = serde_json::to_string(&PatchValue::Null).unwrap();
        assert_eq!(
            serde_json::from_str::<PatchValue>(&json).unwrap(),
            PatchValue::Null
        );
    }
}
