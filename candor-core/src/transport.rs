//! # Transport
//!
//! The boundary between the codec and the network. A transport receives an encoded
//! argument blob for one method of one canister and returns the encoded reply blob.
//!
//! Signing, routing, retries and timeouts are all the transport's business; the rest
//! of the crate never performs I/O. Implementations are expected to treat query calls
//! (see [`FuncMode::is_query`]) as the read-only fast path, and may return an empty reply
//! for oneway calls since it is never decoded.
use crate::{BoxError, types::FuncMode, value::Principal};
use std::{future::Future, sync::Arc};

/// Errors reported by a [`Transport`]. They are propagated to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Canister rejected the call with code {code}: '{message}'")]
    Rejected { code: u32, message: String },
    #[error("Transport failure: '{0}'")]
    Other(#[source] BoxError),
}

impl TransportError {
    pub fn other(error: impl Into<BoxError>) -> Self {
        TransportError::Other(error.into())
    }
}

/// Sends encoded calls to canisters.
pub trait Transport: Send + Sync {
    /// Performs one round trip.
    ///
    /// # Arguments
    ///
    /// * `canister_id` - The target canister.
    /// * `method` - The method name, as declared in the interface.
    /// * `arg` - The complete argument blob, magic number included.
    /// * `mode` - The method's annotation, which selects the kind of call.
    fn call(
        &self,
        canister_id: &Principal,
        method: &str,
        arg: Vec<u8>,
        mode: FuncMode,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn call(
        &self,
        canister_id: &Principal,
        method: &str,
        arg: Vec<u8>,
        mode: FuncMode,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        (**self).call(canister_id, method, arg, mode)
    }
}

impl<T: Transport> Transport for &T {
    fn call(
        &self,
        canister_id: &Principal,
        method: &str,
        arg: Vec<u8>,
        mode: FuncMode,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        (**self).call(canister_id, method, arg, mode)
    }
}
