use super::{Primitive, TypeDescriptor, TypeDisplay, TypeRef};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
};

/// An arena of composite type descriptors.
///
/// Named types each own a slot, anonymous composite types are interned so that two
/// structurally identical anonymous types share the same index. Once built the table is
/// only read, so it can be shared freely between concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<TypeDescriptor>,
    names: BTreeMap<String, TypeRef>,
    slot_names: HashMap<usize, String>,
    anonymous: HashMap<TypeDescriptor, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of composite entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a named type.
    pub fn resolve(&self, name: &str) -> Option<TypeRef> {
        self.names.get(name).copied()
    }

    /// Returns the descriptor behind a reference, or `None` if the index is out of range.
    pub fn describe(&self, ty: TypeRef) -> Option<Cow<'_, TypeDescriptor>> {
        match ty {
            TypeRef::Primitive(p) => Some(Cow::Owned(TypeDescriptor::Primitive(p))),
            TypeRef::Table(index) => self.entries.get(index).map(Cow::Borrowed),
        }
    }

    /// Follows a reference to the primitive it denotes, if any.
    pub fn primitive(&self, ty: TypeRef) -> Option<Primitive> {
        match self.describe(ty)?.as_ref() {
            TypeDescriptor::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns a reference for `descriptor`, reusing an existing anonymous entry when an
    /// identical one was interned before.
    pub fn intern(&mut self, descriptor: TypeDescriptor) -> TypeRef {
        if let TypeDescriptor::Primitive(p) = descriptor {
            return TypeRef::Primitive(p);
        }
        if let Some(index) = self.anonymous.get(&descriptor) {
            return TypeRef::Table(*index);
        }
        let index = self.entries.len();
        self.anonymous.insert(descriptor.clone(), index);
        self.entries.push(descriptor);
        TypeRef::Table(index)
    }

    /// Appends an entry without deduplication. Wire tables use this so that indices
    /// match the positions in the buffer.
    pub(crate) fn push(&mut self, descriptor: TypeDescriptor) -> usize {
        self.entries.push(descriptor);
        self.entries.len() - 1
    }

    /// Reserves a slot for a named composite type whose body is filled in later.
    pub(crate) fn reserve(&mut self, name: &str) -> usize {
        let index = self.push(TypeDescriptor::Primitive(Primitive::Empty));
        self.slot_names.insert(index, name.to_string());
        index
    }

    pub(crate) fn define(&mut self, index: usize, descriptor: TypeDescriptor) {
        self.entries[index] = descriptor;
    }

    pub(crate) fn bind_name(&mut self, name: &str, ty: TypeRef) {
        self.names.insert(name.to_string(), ty);
    }

    /// The name owning a table slot, if the slot belongs to a named type.
    pub fn slot_name(&self, index: usize) -> Option<&str> {
        self.slot_names.get(&index).map(String::as_str)
    }

    /// Iterates over all named types in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = (&str, TypeRef)> {
        self.names.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Whether a reference points inside this table.
    pub fn contains(&self, ty: TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(_) => true,
            TypeRef::Table(index) => index < self.entries.len(),
        }
    }

    /// Renders a reference as IDL text. Named slots are printed by name.
    pub fn display(&self, ty: TypeRef) -> TypeDisplay<'_> {
        TypeDisplay::new(self, ty, false)
    }

    /// Renders a reference as IDL text, expanding its outermost named slot.
    pub fn display_definition(&self, ty: TypeRef) -> TypeDisplay<'_> {
        TypeDisplay::new(self, ty, true)
    }
}
