//! # Candor Core
//!
//! `candor-core` is the foundational library powering the Candor CLI. It provides a dynamic
//! canister client capable of calling any canister described by a textual IDL, without
//! compile-time knowledge of its interface.
//!
//! ## Key Components
//!
//! * **[`client::Canister`]:** The main entry point. A caller-held handle that owns a bound
//!   interface and dispatches requests to a [`transport::Transport`].
//! * **[`client::DynamicRequest`] & [`client::DynamicResponse`]:** The primary data structures
//!   for I/O, allowing callers to pass JSON arguments and receive JSON results.
//!
//! ## Building blocks
//!
//! The layers the client is built from are public as well:
//!
//! * **[`idl`]:** Parses IDL text into a [`types::TypeTable`] and a [`service::ServiceDescriptor`].
//! * **[`types`]:** The arena of type descriptors. Composite types are only ever referenced
//!   by index, which is what allows mutually recursive interfaces.
//! * **[`value`]:** [`value::DynamicValue`], the runtime value tree, and [`value::Principal`].
//! * **[`codec`]:** The binary wire codec. Encodes values against declared types and decodes
//!   replies against expected types using structural subtyping.
//! * **[`service`]:** Compiles a service description into per-method stubs that translate
//!   between JSON and dynamic values.
//!
//! ## Example
//!
//! ```rust
//! use candor_core::client::{Canister, DynamicRequest};
//!
//! let did = "service : { greet : (text) -> (text) query }";
//! let canister = Canister::offline(did).unwrap();
//!
//! let bytes = canister
//!     .encode_args(&DynamicRequest::new("greet", vec![serde_json::json!("world")]))
//!     .unwrap();
//! assert_eq!(&bytes[..4], b"DIDL");
//! ```
pub mod client;
pub mod codec;
pub mod idl;
pub mod service;
pub mod transport;
pub mod types;
pub mod value;

// Re-exports
pub use num_bigint;
pub use serde_json;

/// Type alias for the standard boxed error used in generic bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
