//! # Type Descriptors
//!
//! This module holds the static side of the data model: what a value *should* look like.
//!
//! Types live in a flat arena, the [`TypeTable`]. Primitive types are referenced inline
//! through [`TypeRef::Primitive`], while every composite type (records, variants, vectors,
//! options, functions and services) lives in the table and is referenced by index through
//! [`TypeRef::Table`]. Composite descriptors never contain other descriptors directly, only
//! references, so recursive and mutually recursive interfaces are plain data with no cyclic
//! ownership.
//!
//! Record and variant fields are identified by a 32-bit field id, computed from the label
//! with [`idl_hash`]. Fields are always kept sorted by ascending id, which is the order the
//! wire format uses.
mod descriptor;
mod display;
mod hash;
mod table;

pub use descriptor::*;
pub use display::TypeDisplay;
pub use hash::idl_hash;
pub use table::TypeTable;
