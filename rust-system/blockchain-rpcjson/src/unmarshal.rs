//! Wire request or native arguments to command value
//!
//! Both entry points share the positional core: check arity against the
//! descriptor, resolve one slot per field (supplied value, declared default, or
//! absent), then let the command decode itself from the resolved slots.
//! Declared defaults stand in for params a peer left off the wire; values
//! built locally with `new_cmd` keep unsupplied optionals absent, so they
//! marshal back to exactly the arguments given.

use crate::{
    command::{CommandValue, ParamReader},
    descriptor::FieldDescriptor,
    field::{TypeShape, ValueKind},
    registry::{CommandInfo, Registry},
    Error, ErrorKind, Request, Result,
};
use serde_json::Value;
use tracing::trace;

fn check_arity(info: &CommandInfo, received: usize) -> Result<()> {
    let required = info.num_required();
    let total = info.fields().len();
    if received < required || received > total {
        let expected = if required == total {
            required.to_string()
        } else {
            format!("{} to {}", required, total)
        };
        return Err(Error::new(
            ErrorKind::NumParams,
            format!(
                "wrong number of params for {:?} (expected {}, received {})",
                info.method(),
                expected,
                received
            ),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Defaults {
    Apply,
    Skip,
}

/// Supplied slots first, then the default (or absence) for every field past
/// the end of the supplied list. An explicit null stays absent.
fn resolve_slots(info: &CommandInfo, supplied: Vec<Option<Value>>, defaults: Defaults) -> Vec<Option<Value>> {
    let mut slots = supplied;
    for field in &info.fields()[slots.len()..] {
        slots.push(match defaults {
            Defaults::Apply => field.default.clone(),
            Defaults::Skip => None,
        });
    }
    slots
}

fn build(info: &CommandInfo, supplied: Vec<Option<Value>>, defaults: Defaults) -> Result<Box<dyn CommandValue>> {
    let slots = resolve_slots(info, supplied, defaults);
    let mut reader = ParamReader::new(info.fields(), slots);
    info.construct(&mut reader)
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        value => Some(value),
    }
}

impl Registry {
    /// Convert a wire request into the registered command value.
    pub fn unmarshal_cmd(&self, request: &Request) -> Result<Box<dyn CommandValue>> {
        let info = self.command(&request.method)?;
        check_arity(info, request.params.len())?;

        trace!(
            partition = %self.config().partition,
            method = info.method(),
            params = request.params.len(),
            "unmarshaling command"
        );
        let supplied = request.params.iter().cloned().map(non_null).collect();
        build(info, supplied, Defaults::Apply)
    }

    /// Construct a command from natively typed arguments.
    ///
    /// Sequence, mapping and variant fields also accept their wire encoding as
    /// a string, e.g. `"[1,5]"` for a range. When the registry is configured
    /// to coerce string arguments, numeric and boolean fields accept their
    /// textual form as well.
    pub fn new_cmd(&self, method: &str, args: Vec<Value>) -> Result<Box<dyn CommandValue>> {
        let info = self.command(method)?;
        check_arity(info, args.len())?;

        let supplied = info
            .fields()
            .iter()
            .zip(args)
            .map(|(field, arg)| self.coerce_arg(field, arg))
            .collect::<Result<Vec<_>>>()?;
        build(info, supplied, Defaults::Skip)
    }

    fn coerce_arg(&self, field: &FieldDescriptor, arg: Value) -> Result<Option<Value>> {
        let text = match arg {
            Value::String(text) => text,
            other => return Ok(non_null(other)),
        };

        let unwrapped = field.shape.unwrapped();
        let parse = match field.kind {
            ValueKind::Variant if (field.matches_literal)(&text) => false,
            ValueKind::Sequence | ValueKind::Mapping | ValueKind::Variant => true,
            ValueKind::Scalar => {
                self.config().coerce_string_args && (unwrapped.is_numeric() || *unwrapped == TypeShape::Bool)
            }
        };
        if !parse {
            return Ok(Some(Value::String(text)));
        }

        serde_json::from_str::<Value>(text.trim()).map(non_null).map_err(|e| {
            Error::invalid_type(format!("must be type {} (got unparseable string {:?})", field.shape, text))
                .with_source(e)
                .in_param(field.index, field.name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{variant::DescriptorRange, RegistryBuilder, RegistryConfig, UsageFlags};
    use serde_json::json;

    crate::rpc_command! {
        pub struct DeriveAddressesCmd {
            pub descriptor: String,
            pub range: Option<DescriptorRange>,
        }
    }

    crate::rpc_command! {
        pub struct GetNetworkHashPsCmd {
            pub blocks: Option<i32> = 120,
            pub height: Option<i32> = -1,
        }
    }

    fn registry(config: RegistryConfig) -> Registry {
        let mut builder = RegistryBuilder::with_config(config);
        builder
            .must_register::<DeriveAddressesCmd>("deriveaddresses", UsageFlags::NONE)
            .must_register::<GetNetworkHashPsCmd>("getnetworkhashps", UsageFlags::NONE);
        builder.seal()
    }

    fn request(method: &str, params: Value) -> Request {
        serde_json::from_value(json!({"jsonrpc": "1.0", "method": method, "params": params, "id": 1})).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_tail() {
        let registry = registry(RegistryConfig::default());
        let cmd = registry.unmarshal_cmd(&request("getnetworkhashps", json!([]))).unwrap();
        assert_eq!(
            cmd.downcast_ref::<GetNetworkHashPsCmd>(),
            Some(&GetNetworkHashPsCmd { blocks: Some(120), height: Some(-1) })
        );
    }

    #[test]
    fn test_explicit_null_is_absent() {
        let registry = registry(RegistryConfig::default());
        let cmd = registry.unmarshal_cmd(&request("getnetworkhashps", json!([null, 100]))).unwrap();
        assert_eq!(
            cmd.downcast::<GetNetworkHashPsCmd>(),
            Some(GetNetworkHashPsCmd { blocks: None, height: Some(100) })
        );
    }

    #[test]
    fn test_arity_bounds() {
        let registry = registry(RegistryConfig::default());
        let err = registry.unmarshal_cmd(&request("deriveaddresses", json!([]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumParams);
        assert_eq!(
            err.description(),
            "wrong number of params for \"deriveaddresses\" (expected 1 to 2, received 0)"
        );
        let err = registry
            .unmarshal_cmd(&request("deriveaddresses", json!(["desc", 1, 2])))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumParams);
    }

    #[test]
    fn test_unknown_method() {
        let registry = registry(RegistryConfig::default());
        let err = registry.unmarshal_cmd(&request("getbestblock", json!([]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnregisteredMethod);
        let err = registry.new_cmd("getbestblock", vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnregisteredMethod);
    }

    #[test]
    fn test_null_required_is_invalid_type() {
        let registry = registry(RegistryConfig::default());
        let err = registry.unmarshal_cmd(&request("deriveaddresses", json!([null]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert!(err.description().starts_with("parameter #1 'descriptor'"));
    }

    #[test]
    fn test_new_cmd_accepts_encoded_structured_arg() {
        let registry = registry(RegistryConfig::default());
        let cmd = registry
            .new_cmd("deriveaddresses", vec![json!("wpkh(xpub)"), json!("[0,9]")])
            .unwrap()
            .downcast::<DeriveAddressesCmd>()
            .unwrap();
        assert_eq!(cmd.range, Some(DescriptorRange::Range(0, 9)));

        let err = registry
            .new_cmd("deriveaddresses", vec![json!("wpkh(xpub)"), json!("[0,")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_new_cmd_string_coercion_is_configurable() {
        let lenient = registry(RegistryConfig::default());
        let cmd = lenient
            .new_cmd("getnetworkhashps", vec![json!("240")])
            .unwrap()
            .downcast::<GetNetworkHashPsCmd>()
            .unwrap();
        assert_eq!(cmd, GetNetworkHashPsCmd { blocks: Some(240), height: None });

        let strict = registry(RegistryConfig {
            coerce_string_args: false,
            ..RegistryConfig::default()
        });
        let err = strict.new_cmd("getnetworkhashps", vec![json!("240")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }
}
