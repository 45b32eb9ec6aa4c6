//! Command registry: method name to command type, flags and field descriptors
//!
//! Registration happens on a [`RegistryBuilder`] during process start. Sealing
//! the builder yields an immutable [`Registry`] that can be shared by reference
//! across any number of marshal/unmarshal callers without locking.

use crate::{
    command::{CommandValue, ParamReader},
    descriptor::{extract_fields, FieldDescriptor},
    Command, Error, ErrorKind, Result,
};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    fmt,
};
use tracing::{debug, warn};

bitflags! {
    /// Cross-cutting properties of a command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UsageFlags: u32 {
        /// Only available through a wallet server
        const WALLET_ONLY = 1 << 0;
        /// Only available over a websocket connection
        const WEBSOCKET_ONLY = 1 << 1;
        /// Server-to-client notification; not a request
        const NOTIFICATION = 1 << 2;
    }
}

impl UsageFlags {
    pub const NONE: UsageFlags = UsageFlags::empty();

    /// Unknown bits are rejected, and notifications must be websocket-only.
    pub fn validate(&self) -> Result<()> {
        if Self::from_bits(self.bits()).is_none() {
            return Err(Error::new(
                ErrorKind::InvalidUsageFlags,
                format!("invalid usage flags specified: {:#x}", self.bits()),
            ));
        }
        if self.contains(Self::NOTIFICATION) && !self.contains(Self::WEBSOCKET_ONLY) {
            return Err(Error::new(
                ErrorKind::InvalidUsageFlags,
                format!("notification flag requires websocket-only: {}", self),
            ));
        }
        Ok(())
    }
}

impl Default for UsageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for UsageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::WALLET_ONLY, "wallet-only"),
            (Self::WEBSOCKET_ONLY, "websocket-only"),
            (Self::NOTIFICATION, "notification"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Label for this method namespace in log output
    pub partition: String,
    /// Let the construction path parse numeric and boolean fields from strings
    pub coerce_string_args: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            partition: "default".to_string(),
            coerce_string_args: true,
        }
    }
}

type Constructor = fn(&mut ParamReader<'_>) -> Result<Box<dyn CommandValue>>;

fn construct<C: Command>(params: &mut ParamReader<'_>) -> Result<Box<dyn CommandValue>> {
    C::decode(params).map(|cmd| Box::new(cmd) as Box<dyn CommandValue>)
}

/// Everything known about one registered method
pub struct CommandInfo {
    method: String,
    type_id: TypeId,
    type_name: &'static str,
    flags: UsageFlags,
    fields: Vec<FieldDescriptor>,
    num_required: usize,
    description: Option<String>,
    constructor: Constructor,
}

impl CommandInfo {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn flags(&self) -> UsageFlags {
        self.flags
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn num_required(&self) -> usize {
        self.num_required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn construct(&self, params: &mut ParamReader<'_>) -> Result<Box<dyn CommandValue>> {
        (self.constructor)(params)
    }
}

impl fmt::Debug for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInfo")
            .field("method", &self.method)
            .field("type_name", &self.type_name)
            .field("flags", &self.flags)
            .field("fields", &self.fields)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Mutable registry used during the initialization phase
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
    commands: HashMap<String, CommandInfo>,
    methods_by_type: HashMap<TypeId, String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register command type `C` under `method`.
    pub fn register<C: Command>(&mut self, method: &str, flags: UsageFlags) -> Result<()> {
        self.insert::<C>(method, flags, None)
    }

    /// Register command type `C` under `method` with a one-line help description.
    pub fn register_with_description<C: Command>(
        &mut self,
        method: &str,
        flags: UsageFlags,
        description: impl Into<String>,
    ) -> Result<()> {
        self.insert::<C>(method, flags, Some(description.into()))
    }

    /// Like [`register`](Self::register), but panics on failure. Intended for
    /// process initialization, where a rejected command is a programming error.
    pub fn must_register<C: Command>(&mut self, method: &str, flags: UsageFlags) -> &mut Self {
        if let Err(err) = self.register::<C>(method, flags) {
            panic!("failed to register method {:?}: {}", method, err);
        }
        self
    }

    pub fn must_register_with_description<C: Command>(
        &mut self,
        method: &str,
        flags: UsageFlags,
        description: impl Into<String>,
    ) -> &mut Self {
        if let Err(err) = self.register_with_description::<C>(method, flags, description) {
            panic!("failed to register method {:?}: {}", method, err);
        }
        self
    }

    fn insert<C: Command>(&mut self, method: &str, flags: UsageFlags, description: Option<String>) -> Result<()> {
        let result = self.build_info::<C>(method, flags, description);
        let info = match result {
            Ok(info) => info,
            Err(err) => {
                let kind = err.kind();
                warn!(
                    partition = %self.config.partition,
                    method,
                    kind = %kind,
                    error = %err,
                    "rejected command registration"
                );
                return Err(err);
            }
        };

        debug!(
            partition = %self.config.partition,
            method,
            command = info.type_name,
            fields = info.fields.len(),
            required = info.num_required,
            flags = %flags,
            "registered command"
        );
        self.methods_by_type.insert(info.type_id, method.to_string());
        self.commands.insert(method.to_string(), info);
        Ok(())
    }

    fn build_info<C: Command>(&self, method: &str, flags: UsageFlags, description: Option<String>) -> Result<CommandInfo> {
        if self.commands.contains_key(method) {
            return Err(Error::new(
                ErrorKind::DuplicateMethod,
                format!("method {:?} is already registered", method),
            ));
        }
        let type_id = TypeId::of::<C>();
        if let Some(existing) = self.methods_by_type.get(&type_id) {
            return Err(Error::new(
                ErrorKind::DuplicateMethod,
                format!("type {} is already registered as method {:?}", type_name::<C>(), existing),
            ));
        }
        flags.validate()?;

        let fields = extract_fields(type_name::<C>(), C::fields())?;
        let num_required = fields.iter().filter(|field| !field.optional).count();

        Ok(CommandInfo {
            method: method.to_string(),
            type_id,
            type_name: type_name::<C>(),
            flags,
            fields,
            num_required,
            description,
            constructor: construct::<C>,
        })
    }

    /// End the initialization phase
    pub fn seal(self) -> Registry {
        debug!(partition = %self.config.partition, commands = self.commands.len(), "sealed command registry");
        Registry {
            config: self.config,
            commands: self.commands,
            methods_by_type: self.methods_by_type,
        }
    }
}

/// Immutable command registry shared by the marshaler and unmarshaler
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    commands: HashMap<String, CommandInfo>,
    methods_by_type: HashMap<TypeId, String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Look up a command by method name (decode path)
    pub fn command(&self, method: &str) -> Result<&CommandInfo> {
        self.commands.get(method).ok_or_else(|| {
            Error::new(
                ErrorKind::UnregisteredMethod,
                format!("{:?} is not registered", method),
            )
        })
    }

    /// Look up a command by its concrete type (encode path)
    pub fn command_for(&self, cmd: &dyn CommandValue) -> Result<&CommandInfo> {
        let type_id = Any::type_id(cmd.as_any());
        self.methods_by_type
            .get(&type_id)
            .and_then(|method| self.commands.get(method))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::UnregisteredMethod,
                    format!("{:?} is not registered", cmd),
                )
            })
    }

    /// Method name a command value marshals under
    pub fn method_for(&self, cmd: &dyn CommandValue) -> Result<&str> {
        self.command_for(cmd).map(CommandInfo::method)
    }

    pub fn method_usage_flags(&self, method: &str) -> Result<UsageFlags> {
        self.command(method).map(CommandInfo::flags)
    }

    /// All registered method names, sorted
    pub fn registered_methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
