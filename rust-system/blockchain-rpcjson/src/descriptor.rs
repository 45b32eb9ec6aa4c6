//! Field descriptors and the registration-time extractor
//!
//! A command declares its fields as [`FieldSpec`]s in declaration order, which
//! is also the positional wire order. [`extract_fields`] validates the
//! declaration once, at registration, and produces the [`FieldDescriptor`]s the
//! marshaler and unmarshaler work from.

use crate::{
    field::{FieldType, TypeShape, ValueKind},
    Error, ErrorKind, Result,
};
use serde::Serialize;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// A field as declared by a command type
#[derive(Clone)]
pub struct FieldSpec {
    name: &'static str,
    shape: TypeShape,
    visible: bool,
    embedded: bool,
    default: Option<Value>,
    default_error: Option<Arc<serde_json::Error>>,
    accepts_default: fn(&Value) -> bool,
    matches_literal: fn(&str) -> bool,
}

fn accepts_default<T: FieldType>(value: &Value) -> bool {
    !value.is_null() && T::from_param(Some(value.clone())).is_ok()
}

impl FieldSpec {
    /// Declare a field of native type `T`. Optionality is taken from the type:
    /// `Option<_>` fields are optional, everything else is required.
    pub fn of<T: FieldType>(name: &'static str) -> Self {
        Self {
            name,
            shape: T::shape(),
            visible: true,
            embedded: false,
            default: None,
            default_error: None,
            accepts_default: accepts_default::<T>,
            matches_literal: T::matches_literal,
        }
    }

    /// Attach the value used when the parameter is omitted from the wire.
    /// A default that fails to serialize is reported when the command is
    /// registered.
    pub fn with_default(mut self, default: impl Serialize) -> Self {
        match serde_json::to_value(default) {
            Ok(value) => {
                self.default = Some(value);
                self.default_error = None;
            }
            Err(e) => {
                self.default = None;
                self.default_error = Some(Arc::new(e));
            }
        }
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Mark the field as not publicly accessible
    pub fn unexported(self) -> Self {
        self.visible(false)
    }

    /// Mark the field as an embedded (flattened) struct
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("visible", &self.visible)
            .field("embedded", &self.embedded)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// A validated field: name, position, optionality, default and value kind
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub index: usize,
    pub optional: bool,
    pub default: Option<Value>,
    pub shape: TypeShape,
    pub kind: ValueKind,
    pub(crate) matches_literal: fn(&str) -> bool,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .field("shape", &self.shape)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl FieldDescriptor {
    pub fn is_structured(&self) -> bool {
        self.kind != ValueKind::Scalar
    }
}

/// Validate the declared fields of `type_name` and build their descriptors.
pub fn extract_fields(type_name: &str, specs: Vec<FieldSpec>) -> Result<Vec<FieldDescriptor>> {
    let mut descriptors = Vec::with_capacity(specs.len());
    let mut seen_optional = false;

    for (index, spec) in specs.into_iter().enumerate() {
        if spec.embedded {
            return Err(Error::new(
                ErrorKind::EmbeddedType,
                format!("{}: embedded fields are not supported (field name: {:?})", type_name, spec.name),
            ));
        }
        if !spec.visible {
            return Err(Error::new(
                ErrorKind::UnexportedField,
                format!("{}: only exported fields are supported (field name: {:?})", type_name, spec.name),
            ));
        }
        if !spec.shape.is_supported() {
            return Err(Error::new(
                ErrorKind::UnsupportedFieldType,
                format!("{}: unsupported field type '{}' (field name: {:?})", type_name, spec.shape, spec.name),
            ));
        }

        let optional = spec.shape.is_optional();
        if optional {
            seen_optional = true;
        } else if seen_optional {
            return Err(Error::new(
                ErrorKind::NonOptionalField,
                format!(
                    "{}: all fields after the first optional field must also be optional (field name: {:?})",
                    type_name, spec.name
                ),
            ));
        }

        let has_default = spec.default.is_some() || spec.default_error.is_some();
        if has_default && !optional {
            return Err(Error::new(
                ErrorKind::NonOptionalDefault,
                format!("{}: required fields must not have a default specified (field name: {:?})", type_name, spec.name),
            ));
        }
        if let Some(cause) = spec.default_error {
            return Err(Error::new(
                ErrorKind::MismatchedDefault,
                format!("{}: default value cannot be serialized (field name: {:?})", type_name, spec.name),
            )
            .with_source(cause));
        }

        if let Some(default) = &spec.default {
            if !(spec.accepts_default)(default) {
                return Err(Error::new(
                    ErrorKind::MismatchedDefault,
                    format!(
                        "{}: default value {} is not assignable to field type '{}' (field name: {:?})",
                        type_name,
                        default,
                        spec.shape.unwrapped(),
                        spec.name
                    ),
                ));
            }
        }

        descriptors.push(FieldDescriptor {
            name: spec.name,
            index,
            optional,
            kind: spec.shape.value_kind(),
            shape: spec.shape,
            default: spec.default,
            matches_literal: spec.matches_literal,
        });
    }

    Ok(descriptors)
}
