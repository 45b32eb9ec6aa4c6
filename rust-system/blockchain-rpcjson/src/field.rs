//! Native field types and their wire conversions
//!
//! Every type usable as a command field implements [`FieldType`], which reports
//! the structural [`TypeShape`] checked at registration and converts between the
//! native value and its JSON parameter slot.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Structural description of a field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Bool,
    Integer(&'static str),
    Float(&'static str),
    String,
    /// Closed string enumeration carried as its lowercase token
    Enum(&'static str),
    Sequence(Box<TypeShape>),
    Mapping(Box<TypeShape>),
    Optional(Box<TypeShape>),
    Variant(&'static str),
    Unit,
}

/// Coarse classification of a field's value, after unwrapping optionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Sequence,
    Mapping,
    Variant,
}

impl TypeShape {
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeShape::Optional(_))
    }

    /// The shape with one level of optionality removed
    pub fn unwrapped(&self) -> &TypeShape {
        match self {
            TypeShape::Optional(inner) => inner,
            other => other,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeShape::Bool
                | TypeShape::Integer(_)
                | TypeShape::Float(_)
                | TypeShape::String
                | TypeShape::Enum(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeShape::Integer(_) | TypeShape::Float(_))
    }

    pub fn value_kind(&self) -> ValueKind {
        match self.unwrapped() {
            TypeShape::Sequence(_) => ValueKind::Sequence,
            TypeShape::Mapping(_) => ValueKind::Mapping,
            TypeShape::Variant(_) => ValueKind::Variant,
            _ => ValueKind::Scalar,
        }
    }

    /// Whether the shape has a wire representation this engine accepts
    pub fn is_supported(&self) -> bool {
        match self {
            TypeShape::Unit => false,
            TypeShape::Sequence(inner) | TypeShape::Mapping(inner) => inner.is_scalar(),
            TypeShape::Optional(inner) => !inner.is_optional() && inner.is_supported(),
            _ => true,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Bool => f.write_str("bool"),
            TypeShape::Integer(name) | TypeShape::Float(name) => f.write_str(name),
            TypeShape::String => f.write_str("string"),
            TypeShape::Enum(name) | TypeShape::Variant(name) => f.write_str(name),
            TypeShape::Sequence(inner) => write!(f, "[]{}", inner),
            TypeShape::Mapping(inner) => write!(f, "map[string]{}", inner),
            TypeShape::Optional(inner) => write!(f, "*{}", inner),
            TypeShape::Unit => f.write_str("unit"),
        }
    }
}

/// JSON type name used in conversion error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A type that can occupy one positional parameter slot
pub trait FieldType: Sized {
    fn shape() -> TypeShape;

    /// Encode into a parameter slot; `None` means the value is absent
    fn to_param(&self) -> Result<Option<Value>>;

    /// Decode from a parameter slot; `None` means no value was supplied
    fn from_param(value: Option<Value>) -> Result<Self>;

    /// Whether a bare string argument is already a wire value of this type.
    /// Only consulted for structured fields on the construction path.
    fn matches_literal(_value: &str) -> bool {
        false
    }
}

pub(crate) fn mismatch(shape: &TypeShape, value: &Value) -> Error {
    Error::invalid_type(format!("must be type {} (got {})", shape, json_type_name(value)))
}

#[doc(hidden)]
pub fn missing(shape: &TypeShape) -> Error {
    Error::invalid_type(format!("is required and must be type {} (got null)", shape))
}

macro_rules! serde_scalar_field {
    ($($ty:ty => $shape:expr),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn shape() -> TypeShape {
                    $shape
                }

                fn to_param(&self) -> Result<Option<Value>> {
                    encode_serde(self, &Self::shape())
                }

                fn from_param(value: Option<Value>) -> Result<Self> {
                    decode_serde(value, &Self::shape())
                }
            }
        )*
    };
}

serde_scalar_field! {
    bool => TypeShape::Bool,
    i8 => TypeShape::Integer("int8"),
    i16 => TypeShape::Integer("int16"),
    i32 => TypeShape::Integer("int32"),
    i64 => TypeShape::Integer("int64"),
    u8 => TypeShape::Integer("uint8"),
    u16 => TypeShape::Integer("uint16"),
    u32 => TypeShape::Integer("uint32"),
    u64 => TypeShape::Integer("uint64"),
    f32 => TypeShape::Float("float32"),
    f64 => TypeShape::Float("float64"),
    String => TypeShape::String,
}

impl FieldType for () {
    fn shape() -> TypeShape {
        TypeShape::Unit
    }

    fn to_param(&self) -> Result<Option<Value>> {
        Ok(Some(Value::Null))
    }

    fn from_param(_value: Option<Value>) -> Result<Self> {
        Ok(())
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::Optional(Box::new(T::shape()))
    }

    fn to_param(&self) -> Result<Option<Value>> {
        match self {
            Some(inner) => inner.to_param(),
            None => Ok(None),
        }
    }

    fn from_param(value: Option<Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_param(Some(value)).map(Some),
        }
    }

    fn matches_literal(value: &str) -> bool {
        T::matches_literal(value)
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::Sequence(Box::new(T::shape()))
    }

    fn to_param(&self) -> Result<Option<Value>> {
        let mut items = Vec::with_capacity(self.len());
        for (i, item) in self.iter().enumerate() {
            let encoded = item
                .to_param()
                .map_err(|e| Error::invalid_type(format!("element {} {}", i, e.description())))?;
            items.push(encoded.unwrap_or(Value::Null));
        }
        Ok(Some(Value::Array(items)))
    }

    fn from_param(value: Option<Value>) -> Result<Self> {
        match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_param(Some(item)).map_err(|e| Error::invalid_type(format!("element {} {}", i, e.description())))
                })
                .collect(),
            Some(other) => Err(mismatch(&Self::shape(), &other)),
            None => Err(missing(&Self::shape())),
        }
    }
}

fn encode_entries<'a, T: FieldType + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
) -> Result<Option<Value>> {
    let mut object = serde_json::Map::new();
    for (key, value) in entries {
        let encoded = value
            .to_param()
            .map_err(|e| Error::invalid_type(format!("key '{}' {}", key, e.description())))?;
        object.insert(key.clone(), encoded.unwrap_or(Value::Null));
    }
    Ok(Some(Value::Object(object)))
}

fn decode_entries<T: FieldType, M: FromIterator<(String, T)>>(shape: TypeShape, value: Option<Value>) -> Result<M> {
    match value {
        Some(Value::Object(object)) => object
            .into_iter()
            .map(|(key, item)| {
                T::from_param(Some(item))
                    .map(|decoded| (key.clone(), decoded))
                    .map_err(|e| Error::invalid_type(format!("key '{}' {}", key, e.description())))
            })
            .collect(),
        Some(other) => Err(mismatch(&shape, &other)),
        None => Err(missing(&shape)),
    }
}

impl<T: FieldType> FieldType for HashMap<String, T> {
    fn shape() -> TypeShape {
        TypeShape::Mapping(Box::new(T::shape()))
    }

    fn to_param(&self) -> Result<Option<Value>> {
        encode_entries(self.iter())
    }

    fn from_param(value: Option<Value>) -> Result<Self> {
        decode_entries(Self::shape(), value)
    }
}

impl<T: FieldType> FieldType for BTreeMap<String, T> {
    fn shape() -> TypeShape {
        TypeShape::Mapping(Box::new(T::shape()))
    }

    fn to_param(&self) -> Result<Option<Value>> {
        encode_entries(self.iter())
    }

    fn from_param(value: Option<Value>) -> Result<Self> {
        decode_entries(Self::shape(), value)
    }
}

/// Implement [`FieldType`] for a closed string enumeration.
///
/// The type must be `Serialize + DeserializeOwned` and serialize to its
/// canonical lowercase wire token, typically via
/// `#[serde(rename_all = "lowercase")]`.
#[macro_export]
macro_rules! string_enum_field {
    ($ty:ty) => {
        impl $crate::FieldType for $ty {
            fn shape() -> $crate::TypeShape {
                $crate::TypeShape::Enum(stringify!($ty))
            }

            fn to_param(&self) -> $crate::Result<::std::option::Option<$crate::__private::Value>> {
                $crate::__private::encode_serde(self, &<Self as $crate::FieldType>::shape())
            }

            fn from_param(value: ::std::option::Option<$crate::__private::Value>) -> $crate::Result<Self> {
                $crate::__private::decode_serde(value, &<Self as $crate::FieldType>::shape())
            }
        }
    };
}

/// Serialize a present scalar. Serde writes non-finite floats as `null`, which
/// would read back as absent, so a `null` result is rejected here.
#[doc(hidden)]
pub fn encode_serde<T: serde::Serialize>(value: &T, shape: &TypeShape) -> Result<Option<Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => Err(Error::invalid_type(format!(
            "cannot encode {}: value has no JSON representation",
            shape
        ))),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(Error::invalid_type(format!("cannot encode {}", shape)).with_source(e)),
    }
}

#[doc(hidden)]
pub fn decode_serde<T: serde::de::DeserializeOwned>(value: Option<Value>, shape: &TypeShape) -> Result<T> {
    match value {
        None | Some(Value::Null) => Err(missing(shape)),
        Some(value) => {
            let err = mismatch(shape, &value);
            serde_json::from_value(value).map_err(|e| err.with_source(e))
        }
    }
}
