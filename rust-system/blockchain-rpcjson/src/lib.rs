//! JSON-RPC command marshaling for blockchain node clients and servers
//!
//! Natively typed command structs are registered once, at startup, against a
//! [`Registry`]. The registry then converts command values to JSON-RPC 1.0
//! style requests with strictly positional params, and converts requests (or
//! native argument lists) back into command values, applying declared
//! defaults on the way.

pub mod catalog;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod field;
mod help;
mod marshal;
pub mod registry;
pub mod request;
mod unmarshal;
pub mod variant;

// Re-exports for convenience
pub use command::{Command, CommandValue, ParamReader, ParamWriter};
pub use descriptor::{FieldDescriptor, FieldSpec};
pub use error::{Error, ErrorKind, Result};
pub use field::{FieldType, TypeShape, ValueKind};
pub use registry::{CommandInfo, Registry, RegistryBuilder, RegistryConfig, UsageFlags};
pub use request::{Request, RpcVersion};
pub use variant::{ShapeMatcher, Variant};

#[doc(hidden)]
pub mod __private {
    pub use crate::field::{decode_serde, encode_serde, missing};
    pub use serde_json::Value;
}
