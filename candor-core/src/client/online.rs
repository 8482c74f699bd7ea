//! # Client State: Online
//!
//! This module defines the `Canister` behavior when the handle is bound to a canister
//! through a [`Transport`].
use super::{Canister, DynamicRequest, DynamicResponse, Offline, Online};
use crate::{
    codec::CodecConfig,
    idl::ParseError,
    service::CallError,
    transport::Transport,
    value::Principal,
};
use std::sync::Arc;

impl<T: Transport> Canister<Online<T>> {
    /// Parses an interface description and binds it to a canister in one step.
    ///
    /// # Arguments
    ///
    /// * `transport` - Carries the encoded calls.
    /// * `canister_id` - The canister every call is addressed to.
    /// * `did` - The interface description of that canister.
    pub fn new(transport: T, canister_id: Principal, did: &str) -> Result<Self, ParseError> {
        Ok(Canister::offline(did)?.connect(transport, canister_id))
    }

    pub fn canister_id(&self) -> &Principal {
        &self.state.canister_id
    }

    /// Rebuilds the method stubs with different decode limits.
    pub fn with_codec_config(self, config: CodecConfig) -> Self {
        let Online {
            transport,
            canister_id,
            interface,
            ..
        } = self.state;
        let offline = Offline::bind(Arc::unwrap_or_clone(interface), config);
        Self {
            state: Online::new(transport, canister_id, offline),
        }
    }

    /// Transitions back to the **Offline** state, releasing the transport.
    pub fn disconnect(self) -> Canister<Offline> {
        Canister {
            state: Offline {
                interface: self.state.interface,
                stubs: self.state.stubs,
            },
        }
    }

    /// Executes a dynamic call.
    ///
    /// The arguments are checked, coerced and encoded before anything reaches the
    /// transport, so an invalid request never produces a call.
    ///
    /// # Returns
    ///
    /// * `Ok(DynamicResponse::Reply)` - The decoded results.
    /// * `Ok(DynamicResponse::Oneway)` - For oneway methods, once the call was accepted.
    /// * `Err(CallError)` - If the method is unknown, the arguments are invalid, the
    ///   transport fails or the reply cannot be decoded.
    pub async fn dynamic(&self, request: DynamicRequest) -> Result<DynamicResponse, CallError> {
        let stub = self.stub(&request.method)?;
        let reply = stub
            .invoke(&self.state.transport, &self.state.canister_id, &request.args)
            .await?;

        Ok(match reply {
            Some(values) => DynamicResponse::Reply(values),
            None => DynamicResponse::Oneway,
        })
    }
}
