use super::{ArgumentError, CallError, Interface, coerce};
use crate::{
    codec::{CodecConfig, ValueCodec},
    transport::Transport,
    types::{FuncMode, FuncType, TypeRef},
    value::{DynamicValue, Principal},
};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};

/// Builds [`MethodStub`]s for every method of an interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    config: CodecConfig,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode limits applied by every stub this compiler produces.
    pub fn with_codec_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn compile(&self, interface: Arc<Interface>) -> BTreeMap<String, MethodStub> {
        interface
            .service
            .methods
            .iter()
            .map(|(name, func)| {
                let stub = MethodStub {
                    interface: Arc::clone(&interface),
                    name: name.clone(),
                    func: func.clone(),
                    config: self.config,
                };
                (name.clone(), stub)
            })
            .collect()
    }
}

/// Compiles an interface with the default codec configuration.
pub fn compile(interface: Arc<Interface>) -> BTreeMap<String, MethodStub> {
    Compiler::new().compile(interface)
}

/// A callable method: its signature plus the shared interface needed to encode and decode.
///
/// Stubs are cheap to clone and hold no per-call state, so the same stub can be invoked
/// from many tasks at once.
#[derive(Debug, Clone)]
pub struct MethodStub {
    interface: Arc<Interface>,
    name: String,
    func: FuncType,
    config: CodecConfig,
}

impl MethodStub {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &FuncType {
        &self.func
    }

    pub fn mode(&self) -> FuncMode {
        self.func.mode
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Renders the method as `name : (args) -> (rets) annotation`.
    pub fn display(&self) -> String {
        format!(
            "{} : {}",
            self.name,
            self.interface.table.display_signature(&self.func)
        )
    }

    fn codec(&self) -> ValueCodec<'_> {
        ValueCodec::new(&self.interface.table).with_config(self.config)
    }

    /// Coerces JSON arguments and encodes them into an argument blob.
    ///
    /// # Returns
    ///
    /// * `Ok(bytes)` - The encoded arguments.
    /// * `Err(CallError::Argument)` - If the number of arguments does not match the signature.
    /// * `Err(CallError::Encode)` - If an argument does not fit its declared type.
    pub fn encode_args(&self, args: &[Value]) -> Result<Vec<u8>, CallError> {
        if args.len() != self.func.args.len() {
            return Err(ArgumentError::Arity {
                method: self.name.clone(),
                expected: self.func.args.len(),
                found: args.len(),
            }
            .into());
        }
        let table = &self.interface.table;
        let values = self
            .func
            .args
            .iter()
            .zip(args)
            .map(|(ty, json)| coerce::to_dynamic(table, *ty, json))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.codec().encode(&self.func.args, &values)?)
    }

    /// Decodes a reply blob against the declared result types.
    pub fn decode_reply(&self, bytes: &[u8]) -> Result<Vec<Value>, CallError> {
        self.decode(bytes, &self.func.rets)
    }

    /// Decodes an argument blob against the declared argument types.
    pub fn decode_args(&self, bytes: &[u8]) -> Result<Vec<Value>, CallError> {
        self.decode(bytes, &self.func.args)
    }

    /// Decodes a blob into dynamic values without converting them to JSON.
    pub fn decode_values(
        &self,
        bytes: &[u8],
        types: &[TypeRef],
    ) -> Result<Vec<DynamicValue>, CallError> {
        Ok(self.codec().decode(bytes, types)?)
    }

    fn decode(&self, bytes: &[u8], types: &[TypeRef]) -> Result<Vec<Value>, CallError> {
        let table = &self.interface.table;
        let values = self.decode_values(bytes, types)?;
        types
            .iter()
            .zip(&values)
            .map(|(ty, value)| coerce::to_native(table, *ty, value).map_err(CallError::from))
            .collect()
    }

    /// Performs a complete call through `transport`.
    ///
    /// Nothing is sent when the arguments are invalid. Oneway methods resolve to `None`
    /// as soon as the transport accepted the call, their reply is never decoded.
    pub async fn invoke<T>(
        &self,
        transport: &T,
        canister_id: &Principal,
        args: &[Value],
    ) -> Result<Option<Vec<Value>>, CallError>
    where
        T: Transport,
    {
        let arg = self.encode_args(args)?;
        tracing::debug!(
            method = %self.name,
            mode = %self.func.mode,
            size = arg.len(),
            "Dispatching call"
        );

        let reply = transport
            .call(canister_id, &self.name, arg, self.func.mode)
            .await?;
        if self.func.mode == FuncMode::Oneway {
            return Ok(None);
        }

        let values = self.decode_reply(&reply)?;
        tracing::debug!(method = %self.name, size = reply.len(), "Decoded reply");
        Ok(Some(values))
    }
}
