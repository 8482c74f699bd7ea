//! # Services
//!
//! A [`ServiceDescriptor`] lists the public methods of a canister. Together with the
//! [`TypeTable`] its signatures point into, it forms an [`Interface`].
//!
//! The [`Compiler`] turns an interface into one [`MethodStub`] per method. A stub performs
//! a complete call: it checks the number of arguments, coerces JSON arguments into
//! [`crate::value::DynamicValue`]s guided by the declared types, encodes them, hands the
//! bytes to a [`crate::transport::Transport`] and coerces the decoded reply back to JSON.
//!
//! ## JSON mapping
//!
//! | IDL type                  | JSON                                                   |
//! |---------------------------|--------------------------------------------------------|
//! | `nat`, `int`, fixed ints  | numbers, or decimal strings for arbitrary precision     |
//! | `float32`, `float64`      | numbers                                                |
//! | `text` / `bool` / `null`  | strings / booleans / `null`                            |
//! | `principal`               | textual form, e.g. `"aaaaa-aa"`                        |
//! | `blob`, `vec nat8`        | arrays of byte numbers                                 |
//! | `opt T`                   | `[]` (or `null`) when absent, `[x]` when present        |
//! | `record`                  | objects keyed by label, arrays for tuples              |
//! | `variant`                 | single-key objects, or the bare tag for `null` payloads |
//! | `func`                    | `["<principal>", "method"]`                           |
//! | `service`                 | textual principal                                      |
mod coerce;
mod compiler;

pub use coerce::{to_dynamic, to_native};
pub use compiler::{Compiler, MethodStub, compile};

use crate::{
    codec::{DecodeError, EncodeError},
    idl::{self, ParseError},
    transport::TransportError,
    types::{FuncType, TypeRef, TypeTable},
};
use std::collections::BTreeMap;

/// The methods of a service, sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescriptor {
    /// Arguments the service is initialized with, `service : (A, B) -> { ... }`.
    pub init_args: Vec<TypeRef>,
    pub methods: BTreeMap<String, FuncType>,
}

impl ServiceDescriptor {
    pub fn method(&self, name: &str) -> Option<&FuncType> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

/// A bound interface: a service and the type table its signatures refer to.
#[derive(Debug, Clone)]
pub struct Interface {
    pub table: TypeTable,
    pub service: ServiceDescriptor,
}

impl Interface {
    /// Parses an interface description.
    pub fn parse(did: &str) -> Result<Self, ParseError> {
        let (table, service) = idl::parse(did)?;
        Ok(Self { table, service })
    }

    /// Renders the service clause back to IDL text.
    pub fn display_service(&self) -> String {
        let mut out = String::from("service : ");
        if !self.service.init_args.is_empty() {
            let init = self
                .service
                .init_args
                .iter()
                .map(|ty| self.table.display(*ty).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("({init}) -> "));
        }
        out.push_str("{\n");
        for (name, func) in &self.service.methods {
            out.push_str(&format!(
                "  {name} : {};\n",
                self.table.display_signature(func)
            ));
        }
        out.push('}');
        out
    }
}

/// Errors raised before anything is encoded, when the call itself is malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("Method '{method}' expects {expected} arguments but got {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },
}

/// Errors that can occur during a dynamic call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("Invalid arguments: '{0}'")]
    Argument(#[from] ArgumentError),
    #[error("Failed to encode arguments: '{0}'")]
    Encode(#[from] EncodeError),
    #[error("Failed to decode reply: '{0}'")]
    Decode(#[from] DecodeError),
    #[error("Transport error: '{0}'")]
    Transport(#[from] TransportError),
}
