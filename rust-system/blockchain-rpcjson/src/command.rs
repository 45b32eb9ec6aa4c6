//! Command types and positional parameter access

use crate::{descriptor::FieldDescriptor, field::FieldType, FieldSpec, Result};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// A natively typed RPC command.
///
/// `fields` lists the declared fields in declaration order; `encode` and
/// `decode` must visit the same fields in the same order. Use
/// [`rpc_command!`](crate::rpc_command) to generate all three from a struct
/// declaration.
pub trait Command: fmt::Debug + Send + Sync + Sized + 'static {
    fn fields() -> Vec<FieldSpec>;

    fn encode(&self, params: &mut ParamWriter<'_>) -> Result<()>;

    fn decode(params: &mut ParamReader<'_>) -> Result<Self>;
}

/// Type-erased command, as returned by the unmarshaler
pub trait CommandValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    fn encode_params(&self, params: &mut ParamWriter<'_>) -> Result<()>;
}

impl<C: Command> CommandValue for C {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn encode_params(&self, params: &mut ParamWriter<'_>) -> Result<()> {
        self.encode(params)
    }
}

impl dyn CommandValue {
    pub fn is<C: Command>(&self) -> bool {
        self.as_any().is::<C>()
    }

    pub fn downcast_ref<C: Command>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    pub fn downcast<C: Command>(self: Box<Self>) -> Option<C> {
        self.into_any().downcast::<C>().ok().map(|cmd| *cmd)
    }
}

/// Collects one slot per declared field while a command encodes itself
pub struct ParamWriter<'a> {
    fields: &'a [FieldDescriptor],
    slots: Vec<Option<Value>>,
}

impl<'a> ParamWriter<'a> {
    pub(crate) fn new(fields: &'a [FieldDescriptor]) -> Self {
        Self {
            fields,
            slots: Vec::with_capacity(fields.len()),
        }
    }

    pub fn put<T: FieldType>(&mut self, value: &T) -> Result<()> {
        let index = self.slots.len();
        let slot = value.to_param().map_err(|e| e.in_param(index, field_name(self.fields, index)))?;
        self.slots.push(slot);
        Ok(())
    }

    pub(crate) fn into_slots(self) -> Vec<Option<Value>> {
        self.slots
    }
}

/// Hands out resolved parameter slots, in field order, while a command decodes
pub struct ParamReader<'a> {
    fields: &'a [FieldDescriptor],
    slots: std::vec::IntoIter<Option<Value>>,
    index: usize,
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(fields: &'a [FieldDescriptor], slots: Vec<Option<Value>>) -> Self {
        Self {
            fields,
            slots: slots.into_iter(),
            index: 0,
        }
    }

    pub fn take<T: FieldType>(&mut self) -> Result<T> {
        let index = self.index;
        self.index += 1;
        let slot = self.slots.next().flatten();
        T::from_param(slot).map_err(|e| e.in_param(index, field_name(self.fields, index)))
    }
}

fn field_name(fields: &[FieldDescriptor], index: usize) -> &'static str {
    fields.get(index).map_or("?", |field| field.name)
}

/// Declare a command struct and implement [`Command`] for it.
///
/// Fields are positional in declaration order. `Option<_>` fields are
/// optional and may carry a default with `= value`. A field declared without
/// a visibility modifier is recorded as unexported and rejected at
/// registration.
///
/// ```
/// blockchain_rpcjson::rpc_command! {
///     /// Fetch a block by hash
///     pub struct GetBlockCmd {
///         pub hash: String,
///         pub verbosity: Option<i32> = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! rpc_command {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Command for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldSpec> {
                ::std::vec![
                    $(
                        $crate::FieldSpec::of::<$field_ty>(stringify!($field))
                            .visible(!stringify!($field_vis).is_empty())
                            $(.with_default($default))?
                    ),*
                ]
            }

            #[allow(unused_variables)]
            fn encode(&self, params: &mut $crate::ParamWriter<'_>) -> $crate::Result<()> {
                $(params.put(&self.$field)?;)*
                ::std::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn decode(params: &mut $crate::ParamReader<'_>) -> $crate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    $($field: params.take()?,)*
                })
            }
        }
    };
}
