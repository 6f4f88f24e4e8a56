//! Identifier normalization for loosely-typed wire values.
//!
//! The session protocol is schema-less: a harness may send `"chat_id": 123`,
//! `"chat_id": "123"`, or even `"chat_id": 123.0`, and all three must mean
//! the same chat.  Every identifier field of an inbound frame is therefore
//! captured as a [`WireId`] and normalized to a canonical `i64` before use.
//!
//! # Two flavours
//!
//! - [`WireId::to_id`] is *strict*: absent, empty, or non-numeric values are
//!   reported as an [`IdError`].  Used for identifiers the update cannot do
//!   without (the chat id).
//! - [`WireId::to_id_or_zero`] is *lenient*: any failure yields `0`.  Used
//!   for auxiliary identifiers (an inbound message id), where `0` means
//!   "not supplied".
//!
//! # Conversion rules
//!
//! | Wire value              | Result                                    |
//! |-------------------------|-------------------------------------------|
//! | integer number          | the integer                               |
//! | fractional number       | truncated toward zero                     |
//! | base-10 integer string  | the parsed integer                        |
//! | decimal string          | parsed as a float, truncated toward zero  |
//! | absent / `null`         | [`IdError::Missing`]                      |
//! | empty string            | [`IdError::Empty`]                        |
//! | any other JSON shape    | re-read as a JSON number, else an error   |
//!
//! Float-to-integer truncation saturates at `i64::MIN` / `i64::MAX`, and NaN
//! becomes `0`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Why a wire value could not be normalized into an identifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdError {
    /// The field was absent or `null`.
    #[error("identifier is missing")]
    Missing,

    /// The field was an empty string.
    #[error("identifier is an empty string")]
    Empty,

    /// The field was a string that is neither an integer nor a decimal number.
    #[error("identifier {0:?} is not a number")]
    Unparseable(String),

    /// The field was a JSON shape that has no numeric reading (bool, array,
    /// object).
    #[error("unsupported identifier shape: {0}")]
    UnsupportedShape(&'static str),
}

/// A loosely-typed identifier exactly as it appeared on the wire.
///
/// Deserializes from any JSON value, so a frame with an odd identifier still
/// parses and the decision about what to do with it is made by the caller.
/// A missing field deserializes to [`WireId::Absent`] when the containing
/// struct marks the field `#[serde(default)]`.
///
/// # Example
///
/// ```rust
/// use telemock_core::WireId;
///
/// let id: WireId = serde_json::from_str("\"42.9\"").unwrap();
/// assert_eq!(id.to_id(), Ok(42));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum WireId {
    /// The field was not present, or was `null`.
    #[default]
    Absent,
    /// A JSON number with an exact `i64` reading.
    Integer(i64),
    /// A JSON number without an exact `i64` reading (fractional, or out of
    /// `i64` range).
    Decimal(f64),
    /// A JSON string, expected to hold a decimal number.
    Text(String),
    /// Any other JSON shape.
    Other(Value),
}

impl WireId {
    /// Normalizes the value into an identifier, failing on anything without a
    /// numeric reading.
    ///
    /// # Errors
    ///
    /// See the module-level conversion table.
    pub fn to_id(&self) -> Result<i64, IdError> {
        match self {
            WireId::Absent => Err(IdError::Missing),
            WireId::Integer(id) => Ok(*id),
            WireId::Decimal(value) => Ok(truncate(*value)),
            WireId::Text(text) => parse_text(text),
            WireId::Other(value) => reread_as_number(value),
        }
    }

    /// Normalizes the value into an identifier, yielding `0` on any failure.
    pub fn to_id_or_zero(&self) -> i64 {
        self.to_id().unwrap_or(0)
    }

    /// Returns `true` if the field was absent or `null`.
    pub fn is_absent(&self) -> bool {
        matches!(self, WireId::Absent)
    }
}

impl From<Value> for WireId {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => WireId::Absent,
            Value::Number(number) => {
                if let Some(id) = number.as_i64() {
                    WireId::Integer(id)
                } else if let Some(value) = number.as_f64() {
                    WireId::Decimal(value)
                } else {
                    WireId::Other(Value::Number(number))
                }
            }
            Value::String(text) => WireId::Text(text),
            other => WireId::Other(other),
        }
    }
}

impl From<i64> for WireId {
    fn from(id: i64) -> Self {
        WireId::Integer(id)
    }
}

impl From<f64> for WireId {
    fn from(value: f64) -> Self {
        WireId::Decimal(value)
    }
}

impl From<&str> for WireId {
    fn from(text: &str) -> Self {
        WireId::Text(text.to_string())
    }
}

impl From<String> for WireId {
    fn from(text: String) -> Self {
        WireId::Text(text)
    }
}

impl Serialize for WireId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireId::Absent => serializer.serialize_none(),
            WireId::Integer(id) => serializer.serialize_i64(*id),
            WireId::Decimal(value) => serializer.serialize_f64(*value),
            WireId::Text(text) => serializer.serialize_str(text),
            WireId::Other(value) => value.serialize(serializer),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Truncates toward zero.  `as` saturates out-of-range values and maps NaN
/// to 0.
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

fn parse_text(text: &str) -> Result<i64, IdError> {
    if text.is_empty() {
        return Err(IdError::Empty);
    }
    if let Ok(id) = text.parse::<i64>() {
        return Ok(id);
    }
    text.parse::<f64>()
        .map(truncate)
        .map_err(|_| IdError::Unparseable(text.to_string()))
}

/// Last resort for unexpected shapes: encode the value back to JSON and try
/// to read that text as a JSON number.
fn reread_as_number(value: &Value) -> Result<i64, IdError> {
    serde_json::to_string(value)
        .ok()
        .and_then(|encoded| serde_json::from_str::<f64>(&encoded).ok())
        .map(truncate)
        .ok_or(IdError::UnsupportedShape(shape_name(value)))
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_identifier_is_identity() {
        for id in [0, 1, -1, 123, -987_654_321, i64::MIN, i64::MAX] {
            assert_eq!(WireId::from(id).to_id(), Ok(id), "identity failed for {id}");
        }
    }

    #[test]
    fn test_integer_string_parses_as_integer() {
        for text in ["0", "42", "-42", "9223372036854775807", "-9223372036854775808"] {
            let expected: i64 = text.parse().unwrap();
            assert_eq!(WireId::from(text).to_id(), Ok(expected));
        }
    }

    #[test]
    fn test_decimal_string_is_truncated_toward_zero() {
        assert_eq!(WireId::from("12.9").to_id(), Ok(12));
        assert_eq!(WireId::from("-12.9").to_id(), Ok(-12));
        assert_eq!(WireId::from("0.5").to_id(), Ok(0));
    }

    #[test]
    fn test_exponent_string_is_read_as_float() {
        assert_eq!(WireId::from("1e3").to_id(), Ok(1000));
    }

    #[test]
    fn test_fractional_number_is_truncated() {
        assert_eq!(WireId::from(777.75).to_id(), Ok(777));
        assert_eq!(WireId::from(-3.99).to_id(), Ok(-3));
    }

    #[test]
    fn test_out_of_range_number_saturates() {
        assert_eq!(WireId::from(1e30).to_id(), Ok(i64::MAX));
        assert_eq!(WireId::from(-1e30).to_id(), Ok(i64::MIN));
    }

    #[test]
    fn test_absent_is_missing_in_strict_mode() {
        assert_eq!(WireId::Absent.to_id(), Err(IdError::Missing));
    }

    #[test]
    fn test_empty_string_is_rejected_in_strict_mode() {
        assert_eq!(WireId::from("").to_id(), Err(IdError::Empty));
    }

    #[test]
    fn test_non_numeric_string_is_rejected_in_strict_mode() {
        assert_eq!(
            WireId::from("abc").to_id(),
            Err(IdError::Unparseable("abc".to_string()))
        );
    }

    #[test]
    fn test_bool_and_containers_are_unsupported() {
        assert_eq!(
            WireId::Other(json!(true)).to_id(),
            Err(IdError::UnsupportedShape("bool"))
        );
        assert_eq!(
            WireId::Other(json!([1])).to_id(),
            Err(IdError::UnsupportedShape("array"))
        );
        assert_eq!(
            WireId::Other(json!({"id": 1})).to_id(),
            Err(IdError::UnsupportedShape("object"))
        );
    }

    #[test]
    fn test_lenient_mode_yields_zero_on_failure() {
        assert_eq!(WireId::Absent.to_id_or_zero(), 0);
        assert_eq!(WireId::from("").to_id_or_zero(), 0);
        assert_eq!(WireId::from("x1").to_id_or_zero(), 0);
        assert_eq!(WireId::Other(json!(false)).to_id_or_zero(), 0);
    }

    #[test]
    fn test_lenient_mode_matches_strict_mode_on_success() {
        assert_eq!(WireId::from("10").to_id_or_zero(), 10);
        assert_eq!(WireId::from(10_i64).to_id_or_zero(), 10);
        assert_eq!(WireId::from(10.7).to_id_or_zero(), 10);
    }

    #[test]
    fn test_deserialize_classifies_json_shapes() {
        let parse = |raw: &str| serde_json::from_str::<WireId>(raw).unwrap();

        assert_eq!(parse("123"), WireId::Integer(123));
        assert_eq!(parse("\"123\""), WireId::Text("123".to_string()));
        assert_eq!(parse("1.5"), WireId::Decimal(1.5));
        assert_eq!(parse("null"), WireId::Absent);
        assert_eq!(parse("true"), WireId::Other(json!(true)));
    }

    #[test]
    fn test_deserialize_large_unsigned_number_becomes_decimal() {
        let id: WireId = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(id, WireId::Decimal(_)));
        assert_eq!(id.to_id(), Ok(i64::MAX));
    }

    #[test]
    fn test_serialize_keeps_wire_representation() {
        assert_eq!(serde_json::to_string(&WireId::from(5_i64)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&WireId::from("5")).unwrap(), "\"5\"");
        assert_eq!(serde_json::to_string(&WireId::Absent).unwrap(), "null");
    }

    #[test]
    fn test_is_absent() {
        assert!(WireId::Absent.is_absent());
        assert!(!WireId::from(0_i64).is_absent());
    }
}
