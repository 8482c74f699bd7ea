//! # Candor Client
//!
//! This module implements the high-level handle for calling canisters dynamically.
//!
//! The [`Canister`] handle uses a **Typestate Pattern** to make explicit what it can do
//! with the interface it holds. It has two possible states:
//!
//! 1. **[`Offline`]**: The handle holds a parsed interface but is **not bound** to any
//!    canister. It can be used for introspection (listing methods, describing types) and
//!    to encode arguments or decode replies, but it cannot perform calls.
//! 2. **[`Online`]**: The handle is bound to a [`Transport`] and a canister id, and
//!    can execute calls.
//!
//! Handles are independent of each other and never share mutable state. The interface
//! they hold is immutable and shared behind an [`Arc`], so cloning a handle is cheap.
//!
//! ## Example: State Transition
//!
//! ```rust,no_run
//! use candor_core::client::{Canister, DynamicRequest};
//! use candor_core::transport::{Transport, TransportError};
//! use candor_core::types::FuncMode;
//! use candor_core::value::Principal;
//!
//! # struct MyTransport;
//! # impl Transport for MyTransport {
//! #     async fn call(&self, _: &Principal, _: &str, _: Vec<u8>, _: FuncMode)
//! #         -> Result<Vec<u8>, TransportError> { Ok(Vec::new()) }
//! # }
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let did = std::fs::read_to_string("ledger.did")?;
//!
//! // 1. Offline State (introspection only)
//! let canister = Canister::offline(&did)?;
//! println!("{:?}", canister.list_methods());
//!
//! // 2. Online State (bound to a transport and a canister)
//! let id = "rrkah-fqaaa-aaaaa-aaaaq-cai".parse::<Principal>()?;
//! let canister = canister.connect(MyTransport, id);
//! let response = canister
//!     .dynamic(DynamicRequest::new("symbol", vec![]))
//!     .await?;
//! # Ok(())
//! # }
//! ```
pub mod offline;
pub mod online;
mod types;

pub use types::*;

use crate::{
    service::{Interface, MethodStub},
    transport::Transport,
    value::Principal,
};
use std::{collections::BTreeMap, sync::Arc};

/// The main handle for interacting with a canister dynamically.
///
/// The generic parameter `T` represents the current state of the handle.
#[derive(Clone, Debug)]
pub struct Canister<T> {
    state: T,
}

/// State: Interface bound, not connected to any canister.
#[derive(Debug, Clone)]
pub struct Offline {
    interface: Arc<Interface>,
    stubs: Arc<BTreeMap<String, MethodStub>>,
}

/// State: Interface bound and connected to a canister through a transport.
#[derive(Debug, Clone)]
pub struct Online<T> {
    transport: T,
    canister_id: Principal,
    interface: Arc<Interface>,
    stubs: Arc<BTreeMap<String, MethodStub>>,
}

impl<T: Transport> Online<T> {
    pub(crate) fn new(transport: T, canister_id: Principal, offline: Offline) -> Self {
        Self {
            transport,
            canister_id,
            interface: offline.interface,
            stubs: offline.stubs,
        }
    }
}

/// Access to the bound interface, shared by every state.
pub trait OfflineState {
    fn interface(&self) -> &Arc<Interface>;
    fn stubs(&self) -> &BTreeMap<String, MethodStub>;
}

impl OfflineState for Offline {
    fn interface(&self) -> &Arc<Interface> {
        &self.interface
    }

    fn stubs(&self) -> &BTreeMap<String, MethodStub> {
        &self.stubs
    }
}

impl<T> OfflineState for Online<T> {
    fn interface(&self) -> &Arc<Interface> {
        &self.interface
    }

    fn stubs(&self) -> &BTreeMap<String, MethodStub> {
        &self.stubs
    }
}
