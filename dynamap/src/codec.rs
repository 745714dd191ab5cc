//! Conversion between typed domain values and the store's tagged values.
//!
//! Numbers travel as decimal strings inside [`AttributeValue::N`]; encoding
//! uses the shortest round-trip decimal rendering and decoding parses the
//! string back, so a numeric value never passes through a lossy intermediate
//! representation.

use crate::item::AttributeValue;
use crate::schema::AttributeType;
use thiserror::Error;

/// Decode failure: the native value's tag (or content) did not match the
/// expected attribute type. Decoding never coerces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: AttributeType,
    pub found: &'static str,
}

impl TypeMismatch {
    fn tag(expected: AttributeType, value: &AttributeValue) -> Self {
        Self {
            expected,
            found: value.tag(),
        }
    }
}

/// A domain value that maps to exactly one native tag.
pub trait AttributeValueType: Sized + Send + Sync + 'static {
    const ATTRIBUTE_TYPE: AttributeType;

    fn encode(&self) -> AttributeValue;

    fn decode(value: &AttributeValue) -> Result<Self, TypeMismatch>;
}

impl AttributeValueType for String {
    const ATTRIBUTE_TYPE: AttributeType = AttributeType::String;

    fn encode(&self) -> AttributeValue {
        AttributeValue::S(self.clone())
    }

    fn decode(value: &AttributeValue) -> Result<Self, TypeMismatch> {
        match value {
            AttributeValue::S(s) => Ok(s.clone()),
            other => Err(TypeMismatch::tag(Self::ATTRIBUTE_TYPE, other)),
        }
    }
}

impl AttributeValueType for bool {
    const ATTRIBUTE_TYPE: AttributeType = AttributeType::Bool;

    fn encode(&self) -> AttributeValue {
        AttributeValue::Bool(*self)
    }

    fn decode(value: &AttributeValue) -> Result<Self, TypeMismatch> {
        match value {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(TypeMismatch::tag(Self::ATTRIBUTE_TYPE, other)),
        }
    }
}

impl AttributeValueType for Vec<u8> {
    const ATTRIBUTE_TYPE: AttributeType = AttributeType::Binary;

    fn encode(&self) -> AttributeValue {
        AttributeValue::B(self.clone())
    }

    fn decode(value: &AttributeValue) -> Result<Self, TypeMismatch> {
        match value {
            AttributeValue::B(b) => Ok(b.clone()),
            other => Err(TypeMismatch::tag(Self::ATTRIBUTE_TYPE, other)),
        }
    }
}

macro_rules! numeric_attribute_value {
    ($($ty:ty),*) => {
        $(
            impl AttributeValueType for $ty {
                const ATTRIBUTE_TYPE: AttributeType = AttributeType::Number;

                fn encode(&self) -> AttributeValue {
                    AttributeValue::N(self.to_string())
                }

                fn decode(value: &AttributeValue) -> Result<Self, TypeMismatch> {
                    match value {
                        AttributeValue::N(n) => n.parse().map_err(|_| TypeMismatch {
                            expected: AttributeType::Number,
                            found: "N (malformed number)",
                        }),
                        other => Err(TypeMismatch::tag(AttributeType::Number, other)),
                    }
                }
            }
        )*
    };
}

numeric_attribute_value!(i32, i64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<V: AttributeValueType + PartialEq + std::fmt::Debug + Clone>(value: V) {
        assert_eq!(V::decode(&value.clone().encode()).unwrap(), value);
    }

    #[test]
    fn scalars_round_trip_losslessly() {
        round_trip("expected value".to_string());
        round_trip(true);
        round_trip(false);
        round_trip(vec![0u8, 255, 7]);
        round_trip(-42i32);
        round_trip(i64::MAX);
        round_trip(0.1f64);
        round_trip(-1.5e300f64);
    }

    #[test]
    fn integers_encode_without_fractional_part() {
        assert_eq!(10i64.encode(), AttributeValue::number("10"));
        assert_eq!(5i32.encode(), AttributeValue::number("5"));
    }

    #[test]
    fn mismatched_tag_is_rejected_not_coerced() {
        let err = i64::decode(&AttributeValue::string("5")).unwrap_err();
        assert_eq!(err.expected, AttributeType::Number);
        assert_eq!(err.found, "S");

        let err = String::decode(&AttributeValue::Bool(true)).unwrap_err();
        assert_eq!(err.expected, AttributeType::String);
        assert_eq!(err.found, "BOOL");
    }

    #[test]
    fn malformed_number_is_a_type_mismatch() {
        let err = i64::decode(&AttributeValue::number("five")).unwrap_err();
        assert_eq!(err.expected, AttributeType::Number);
    }
}
