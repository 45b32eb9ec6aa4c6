//! Variant fields: parameters accepting more than one closed-set wire shape
//!
//! A variant is a sum type. Encoding emits the JSON shape of the populated
//! alternative. Decoding tests the raw value against each alternative's shape
//! matcher in declared priority order and takes the first match. New variants
//! plug into the engine by implementing [`Variant`] and invoking
//! [`variant_field!`](crate::variant_field); the marshaler and unmarshaler never
//! name a concrete variant.

use crate::{field::json_type_name, Error, Result};
use serde_json::{json, Value};

/// One decodable alternative of a variant, tried in declaration order
pub struct ShapeMatcher<V> {
    pub alternative: &'static str,
    pub decode: fn(&Value) -> Option<V>,
}

pub trait Variant: Sized + 'static {
    /// Name used in shape descriptions and error messages
    const NAME: &'static str;

    /// Alternatives in decode priority order
    const MATCHERS: &'static [ShapeMatcher<Self>];

    /// Encode the populated alternative
    fn encode(&self) -> Result<Value>;

    fn decode(value: &Value) -> Result<Self> {
        Self::MATCHERS
            .iter()
            .find_map(|matcher| (matcher.decode)(value))
            .ok_or_else(|| {
                let alternatives: Vec<&str> = Self::MATCHERS.iter().map(|m| m.alternative).collect();
                Error::invalid_type(format!(
                    "must be one of {} for {} (got {})",
                    alternatives.join(" | "),
                    Self::NAME,
                    json_type_name(value)
                ))
            })
    }
}

/// Implement [`FieldType`](crate::FieldType) for a type implementing [`Variant`].
#[macro_export]
macro_rules! variant_field {
    ($ty:ty) => {
        impl $crate::FieldType for $ty {
            fn shape() -> $crate::TypeShape {
                $crate::TypeShape::Variant(<$ty as $crate::Variant>::NAME)
            }

            fn to_param(&self) -> $crate::Result<::std::option::Option<$crate::__private::Value>> {
                <$ty as $crate::Variant>::encode(self).map(::std::option::Option::Some)
            }

            fn from_param(value: ::std::option::Option<$crate::__private::Value>) -> $crate::Result<Self> {
                match value {
                    ::std::option::Option::None | ::std::option::Option::Some($crate::__private::Value::Null) => {
                        ::std::result::Result::Err($crate::__private::missing(&<Self as $crate::FieldType>::shape()))
                    }
                    ::std::option::Option::Some(value) => <$ty as $crate::Variant>::decode(&value),
                }
            }

            fn matches_literal(value: &str) -> bool {
                let value = $crate::__private::Value::String(value.to_string());
                <$ty as $crate::Variant>::decode(&value).is_ok()
            }
        }
    };
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64()
}

/// Descriptor derivation range: a single end index or a `[begin, end]` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorRange {
    End(i64),
    Range(i64, i64),
}

impl Variant for DescriptorRange {
    const NAME: &'static str = "DescriptorRange";
    const MATCHERS: &'static [ShapeMatcher<Self>] = &[
        ShapeMatcher {
            alternative: "int",
            decode: |value| as_i64(value).map(DescriptorRange::End),
        },
        ShapeMatcher {
            alternative: "[int, int]",
            decode: |value| match value.as_array().map(Vec::as_slice) {
                Some([begin, end]) => Some(DescriptorRange::Range(as_i64(begin)?, as_i64(end)?)),
                _ => None,
            },
        },
    ];

    fn encode(&self) -> Result<Value> {
        Ok(match self {
            DescriptorRange::End(end) => json!(end),
            DescriptorRange::Range(begin, end) => json!([begin, end]),
        })
    }
}

variant_field!(DescriptorRange);

/// Import timestamp: a unix time or the literal token `"now"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Unix(i64),
    Now,
}

impl Variant for Timestamp {
    const NAME: &'static str = "Timestamp";
    const MATCHERS: &'static [ShapeMatcher<Self>] = &[
        ShapeMatcher {
            alternative: "int",
            decode: |value| as_i64(value).map(Timestamp::Unix),
        },
        ShapeMatcher {
            alternative: "\"now\"",
            decode: |value| (value.as_str() == Some("now")).then_some(Timestamp::Now),
        },
    ];

    fn encode(&self) -> Result<Value> {
        Ok(match self {
            Timestamp::Unix(time) => json!(time),
            Timestamp::Now => json!("now"),
        })
    }
}

variant_field!(Timestamp);

/// Legacy boolean `allowhighfees` flag or a `maxfeerate` in coins per kilobyte
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllowHighFeesOrMaxFeeRate {
    AllowHighFees(bool),
    MaxFeeRate(f64),
}

impl Variant for AllowHighFeesOrMaxFeeRate {
    const NAME: &'static str = "AllowHighFeesOrMaxFeeRate";
    const MATCHERS: &'static [ShapeMatcher<Self>] = &[
        ShapeMatcher {
            alternative: "bool",
            decode: |value| value.as_bool().map(AllowHighFeesOrMaxFeeRate::AllowHighFees),
        },
        ShapeMatcher {
            alternative: "float",
            decode: |value| value.as_f64().map(AllowHighFeesOrMaxFeeRate::MaxFeeRate),
        },
    ];

    fn encode(&self) -> Result<Value> {
        match self {
            AllowHighFeesOrMaxFeeRate::AllowHighFees(allow) => Ok(json!(allow)),
            AllowHighFeesOrMaxFeeRate::MaxFeeRate(rate) => serde_json::Number::from_f64(*rate)
                .map(Value::Number)
                .ok_or_else(|| Error::invalid_type(format!("{} has no wire form for fee rate {}", Self::NAME, rate))),
        }
    }
}

variant_field!(AllowHighFeesOrMaxFeeRate);

/// Output script: raw hex, or an object naming the address it pays to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptPubKey {
    Hex(String),
    Address(String),
}

impl Variant for ScriptPubKey {
    const NAME: &'static str = "ScriptPubKey";
    const MATCHERS: &'static [ShapeMatcher<Self>] = &[
        ShapeMatcher {
            alternative: "hex string",
            decode: |value| {
                let script = value.as_str()?;
                hex::decode(script).ok()?;
                Some(ScriptPubKey::Hex(script.to_string()))
            },
        },
        ShapeMatcher {
            alternative: "{\"address\": string}",
            decode: |value| {
                let address = value.as_object()?.get("address")?.as_str()?;
                Some(ScriptPubKey::Address(address.to_string()))
            },
        },
    ];

    fn encode(&self) -> Result<Value> {
        match self {
            ScriptPubKey::Hex(script) => {
                hex::decode(script)
                    .map_err(|e| Error::invalid_type(format!("{} script is not hex", Self::NAME)).with_source(e))?;
                Ok(json!(script))
            }
            ScriptPubKey::Address(address) => Ok(json!({ "address": address })),
        }
    }
}

variant_field!(ScriptPubKey);
