//! Command value to wire request

use crate::{
    command::{CommandValue, ParamWriter},
    registry::{CommandInfo, Registry},
    Error, ErrorKind, Request, Result, RpcVersion,
};
use serde_json::Value;
use tracing::trace;

/// Lay encoded slots out positionally. Absent optionals before the last
/// present value become `null`; absent optionals after it are dropped.
fn positional_params(info: &CommandInfo, slots: Vec<Option<Value>>) -> Result<Vec<Value>> {
    if slots.len() != info.fields().len() {
        return Err(Error::new(
            ErrorKind::InconsistentCommand,
            format!(
                "inconsistent command implementation: {} encoded {} params but declares {} fields",
                info.type_name(),
                slots.len(),
                info.fields().len()
            ),
        ));
    }

    let mut end = 0;
    for (field, slot) in info.fields().iter().zip(&slots) {
        match slot {
            Some(_) => end = field.index + 1,
            None if !field.optional => {
                return Err(Error::invalid_type("is required but has no value").in_param(field.index, field.name));
            }
            None => {}
        }
    }

    Ok(slots
        .into_iter()
        .take(end)
        .map(|slot| slot.unwrap_or(Value::Null))
        .collect())
}

impl Registry {
    /// Build the request envelope for `cmd`.
    pub fn request_for(&self, version: RpcVersion, id: impl Into<Value>, cmd: &dyn CommandValue) -> Result<Request> {
        let info = self.command_for(cmd)?;
        let mut writer = ParamWriter::new(info.fields());
        cmd.encode_params(&mut writer)?;
        let params = positional_params(info, writer.into_slots())?;

        trace!(
            partition = %self.config().partition,
            method = info.method(),
            params = params.len(),
            "marshaled command"
        );
        Request::new(version, id.into(), info.method(), params)
    }

    /// Marshal `cmd` into the bytes of a JSON-RPC request.
    pub fn marshal_cmd(&self, version: RpcVersion, id: impl Into<Value>, cmd: &dyn CommandValue) -> Result<Vec<u8>> {
        self.request_for(version, id, cmd)?.to_vec()
    }
}
