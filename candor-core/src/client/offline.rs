//! # Client State: Offline
//!
//! This module defines the `Canister` behavior when it holds a parsed interface but is
//! **not bound** to any canister.
//!
//! In this state, the handle is limited to introspection and to encoding or decoding
//! blobs by hand. Every operation defined here is also available once online.
use super::{Canister, DynamicRequest, Offline, Online, OfflineState};
use crate::{
    codec::CodecConfig,
    idl::ParseError,
    service::{CallError, Compiler, Interface, MethodStub},
    transport::Transport,
    value::Principal,
};
use std::sync::Arc;

impl Offline {
    pub(crate) fn bind(interface: Interface, config: CodecConfig) -> Self {
        let interface = Arc::new(interface);
        let stubs = Compiler::new()
            .with_codec_config(config)
            .compile(Arc::clone(&interface));

        tracing::debug!(
            types = interface.table.names().count(),
            methods = stubs.len(),
            "Bound interface"
        );
        Self {
            interface,
            stubs: Arc::new(stubs),
        }
    }
}

impl Canister<Offline> {
    /// Creates a new `Canister` handle in the Offline state from the text of an
    /// interface description.
    ///
    /// # Arguments
    ///
    /// * `did` - The interface description (the contents of a `.did` file).
    ///
    /// # Returns
    ///
    /// * `Ok(Canister<Offline>)` - The initialized offline handle.
    /// * `Err(ParseError)` - If the text is not a valid interface description.
    pub fn offline(did: &str) -> Result<Self, ParseError> {
        let interface = Interface::parse(did)?;
        Ok(Self {
            state: Offline::bind(interface, CodecConfig::default()),
        })
    }

    /// Creates an offline handle from an already parsed interface.
    pub fn from_interface(interface: Interface) -> Self {
        Self {
            state: Offline::bind(interface, CodecConfig::default()),
        }
    }

    /// Rebuilds the method stubs with different decode limits.
    pub fn with_codec_config(self, config: CodecConfig) -> Self {
        let interface = Arc::unwrap_or_clone(self.state.interface);
        Self {
            state: Offline::bind(interface, config),
        }
    }

    /// Transitions to the **Online** state, binding the handle to a canister.
    ///
    /// # Arguments
    ///
    /// * `transport` - Carries the encoded calls.
    /// * `canister_id` - The canister every call is addressed to.
    pub fn connect<T: Transport>(
        self,
        transport: T,
        canister_id: Principal,
    ) -> Canister<Online<T>> {
        Canister {
            state: Online::new(transport, canister_id, self.state),
        }
    }
}

impl<T> Canister<T>
where
    T: OfflineState,
{
    /// Lists the methods of the service, sorted by name.
    pub fn list_methods(&self) -> Vec<String> {
        self.state.stubs().keys().cloned().collect()
    }

    /// Looks up the stub of a method.
    pub fn get_method(&self, name: &str) -> Option<&MethodStub> {
        self.state.stubs().get(name)
    }

    /// The interface this handle is bound to.
    pub fn interface(&self) -> &Interface {
        self.state.interface()
    }

    /// Renders the definition of a named type, `type Name = ...;`.
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The definition, if a type of that name exists.
    /// * `None` - If the interface does not define the type.
    pub fn describe_type(&self, name: &str) -> Option<String> {
        let table = &self.state.interface().table;
        let ty = table.resolve(name)?;
        Some(format!("type {name} = {};", table.display_definition(ty)))
    }

    /// Renders the service clause of the interface.
    pub fn describe_service(&self) -> String {
        self.state.interface().display_service()
    }

    /// Encodes the arguments of a request without sending it.
    pub fn encode_args(&self, request: &DynamicRequest) -> Result<Vec<u8>, CallError> {
        self.stub(&request.method)?.encode_args(&request.args)
    }

    /// Decodes a reply blob against the result types of `method`.
    pub fn decode_reply(
        &self,
        method: &str,
        bytes: &[u8],
    ) -> Result<Vec<serde_json::Value>, CallError> {
        self.stub(method)?.decode_reply(bytes)
    }

    /// Decodes an argument blob against the argument types of `method`.
    pub fn decode_args(
        &self,
        method: &str,
        bytes: &[u8],
    ) -> Result<Vec<serde_json::Value>, CallError> {
        self.stub(method)?.decode_args(bytes)
    }

    pub(crate) fn stub(&self, method: &str) -> Result<&MethodStub, CallError> {
        self.get_method(method)
            .ok_or_else(|| CallError::MethodNotFound(method.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FuncMode;
    use serde_json::json;

    const DID: &str = r#"
        type Account = record { owner : principal; subaccount : opt blob };
        service : {
            balance_of : (Account) -> (nat) query;
            transfer : (to : Account, amount : nat) -> (variant { Ok : nat; Err : text });
        }
    "#;

    #[test]
    fn test_introspection() {
        let canister = Canister::offline(DID).unwrap();
        assert_eq!(canister.list_methods(), vec!["balance_of", "transfer"]);
        assert_eq!(canister.get_method("balance_of").unwrap().mode(), FuncMode::Query);
        assert_eq!(
            canister.describe_type("Account").unwrap(),
            "type Account = record { owner : principal; subaccount : opt blob };"
        );
        assert!(canister.describe_type("Missing").is_none());
        assert!(canister.describe_service().contains("balance_of : (Account) -> (nat) query;"));
    }

    #[test]
    fn test_encode_and_decode_without_a_transport() {
        let canister = Canister::offline(DID).unwrap();
        let request = DynamicRequest::new(
            "balance_of",
            vec![json!({ "owner": "aaaaa-aa", "subaccount": [] })],
        );
        let bytes = canister.encode_args(&request).unwrap();
        assert_eq!(
            canister.decode_args("balance_of", &bytes).unwrap(),
            vec![json!({ "owner": "aaaaa-aa", "subaccount": [] })]
        );

        // (1_000 : nat)
        let reply = [0x44, 0x49, 0x44, 0x4c, 0x00, 0x01, 0x7d, 0xe8, 0x07];
        assert_eq!(canister.decode_reply("balance_of", &reply).unwrap(), vec![json!(1000)]);
    }

    #[test]
    fn test_unknown_method_and_arity() {
        let canister = Canister::offline(DID).unwrap();
        assert!(matches!(
            canister.encode_args(&DynamicRequest::new("mint", vec![])),
            Err(CallError::MethodNotFound(name)) if name == "mint"
        ));
        assert!(matches!(
            canister.encode_args(&DynamicRequest::new("transfer", vec![json!({})])),
            Err(CallError::Argument(_))
        ));
    }
}
