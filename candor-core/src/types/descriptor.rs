use super::idl_hash;
use std::fmt;

/// The primitive IDL types. They are never stored in the [`super::TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Null,
    Bool,
    Nat,
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
}

impl Primitive {
    /// All primitives, in opcode order.
    pub const ALL: [Primitive; 18] = [
        Primitive::Null,
        Primitive::Bool,
        Primitive::Nat,
        Primitive::Int,
        Primitive::Nat8,
        Primitive::Nat16,
        Primitive::Nat32,
        Primitive::Nat64,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Text,
        Primitive::Reserved,
        Primitive::Empty,
        Primitive::Principal,
    ];

    /// The (negative) opcode used to reference this primitive on the wire.
    pub fn opcode(self) -> i64 {
        match self {
            Primitive::Null => -1,
            Primitive::Bool => -2,
            Primitive::Nat => -3,
            Primitive::Int => -4,
            Primitive::Nat8 => -5,
            Primitive::Nat16 => -6,
            Primitive::Nat32 => -7,
            Primitive::Nat64 => -8,
            Primitive::Int8 => -9,
            Primitive::Int16 => -10,
            Primitive::Int32 => -11,
            Primitive::Int64 => -12,
            Primitive::Float32 => -13,
            Primitive::Float64 => -14,
            Primitive::Text => -15,
            Primitive::Reserved => -16,
            Primitive::Empty => -17,
            Primitive::Principal => -24,
        }
    }

    pub fn from_opcode(opcode: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.opcode() == opcode)
    }

    /// The IDL keyword for this primitive.
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Bool => "bool",
            Primitive::Nat => "nat",
            Primitive::Int => "int",
            Primitive::Nat8 => "nat8",
            Primitive::Nat16 => "nat16",
            Primitive::Nat32 => "nat32",
            Primitive::Nat64 => "nat64",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Text => "text",
            Primitive::Reserved => "reserved",
            Primitive::Empty => "empty",
            Primitive::Principal => "principal",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A reference to a type: either an inline primitive or an index into a type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(Primitive),
    Table(usize),
}

impl TypeRef {
    pub const NAT8: TypeRef = TypeRef::Primitive(Primitive::Nat8);

    pub fn as_primitive(self) -> Option<Primitive> {
        match self {
            TypeRef::Primitive(p) => Some(p),
            TypeRef::Table(_) => None,
        }
    }
}

impl From<Primitive> for TypeRef {
    fn from(primitive: Primitive) -> Self {
        TypeRef::Primitive(primitive)
    }
}

/// The surface form of a record or variant field label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// A textual label, hashed into its field id.
    Named(String),
    /// An explicit numeric label (`42 : nat`), or a field only known by id from the wire.
    Id(u32),
    /// A positional tuple field.
    Unnamed(u32),
}

impl Label {
    pub fn id(&self) -> u32 {
        match self {
            Label::Named(name) => idl_hash(name),
            Label::Id(id) | Label::Unnamed(id) => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Named(name) if is_plain_identifier(name) => f.write_str(name),
            Label::Named(name) => write!(f, "{name:?}"),
            Label::Id(id) | Label::Unnamed(id) => write!(f, "{id}"),
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One field of a record or variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub label: Label,
    pub ty: TypeRef,
}

impl Field {
    pub fn new(label: Label, ty: TypeRef) -> Self {
        Self { label, ty }
    }

    pub fn id(&self) -> u32 {
        self.label.id()
    }
}

/// The call annotation of a function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FuncMode {
    /// State-changing call. This is the default when no annotation is written.
    #[default]
    Update,
    /// Read-only fast path.
    Query,
    /// Fire and forget, the reply is never decoded.
    Oneway,
    CompositeQuery,
}

impl FuncMode {
    /// The annotation byte on the wire, `None` for plain update calls.
    pub fn wire_byte(self) -> Option<u8> {
        match self {
            FuncMode::Update => None,
            FuncMode::Query => Some(1),
            FuncMode::Oneway => Some(2),
            FuncMode::CompositeQuery => Some(3),
        }
    }

    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FuncMode::Query),
            2 => Some(FuncMode::Oneway),
            3 => Some(FuncMode::CompositeQuery),
            _ => None,
        }
    }

    pub fn is_query(self) -> bool {
        matches!(self, FuncMode::Query | FuncMode::CompositeQuery)
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            FuncMode::Update => None,
            FuncMode::Query => Some("query"),
            FuncMode::Oneway => Some("oneway"),
            FuncMode::CompositeQuery => Some("composite_query"),
        }
    }
}

impl fmt::Display for FuncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword().unwrap_or("update"))
    }
}

/// The signature of a function: argument types, result types and annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    pub args: Vec<TypeRef>,
    pub rets: Vec<TypeRef>,
    pub mode: FuncMode,
}

/// A single IDL type.
///
/// `Record` and `Variant` fields are sorted by ascending field id and ids are unique.
/// `Service` methods are sorted by name and each method references a `Func` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Opt(TypeRef),
    Vec(TypeRef),
    Record(Vec<Field>),
    Variant(Vec<Field>),
    Func(FuncType),
    Service(Vec<(String, TypeRef)>),
}

impl TypeDescriptor {
    /// `blob` is shorthand for `vec nat8`.
    pub fn blob() -> Self {
        TypeDescriptor::Vec(TypeRef::NAT8)
    }

    /// Returns the fields of a record or variant.
    pub fn fields(&self) -> Option<&[Field]> {
        match self {
            TypeDescriptor::Record(fields) | TypeDescriptor::Variant(fields) => Some(fields),
            _ => None,
        }
    }

    /// Whether a missing value of this type can be filled in as absent.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Opt(_)
                | TypeDescriptor::Primitive(Primitive::Null | Primitive::Reserved)
        )
    }

    /// Whether this is a record whose fields are all positional, i.e. a tuple.
    pub fn is_tuple(&self) -> bool {
        match self {
            TypeDescriptor::Record(fields) => {
                !fields.is_empty()
                    && fields
                        .iter()
                        .enumerate()
                        .all(|(i, f)| f.label == Label::Unnamed(i as u32))
            }
            _ => false,
        }
    }

    /// A short name for the kind of type, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TypeDescriptor::Primitive(p) => p.keyword(),
            TypeDescriptor::Opt(_) => "opt",
            TypeDescriptor::Vec(_) => "vec",
            TypeDescriptor::Record(_) => "record",
            TypeDescriptor::Variant(_) => "variant",
            TypeDescriptor::Func(_) => "func",
            TypeDescriptor::Service(_) => "service",
        }
    }

    /// The children referenced by this descriptor, in wire order.
    pub fn children(&self) -> Vec<TypeRef> {
        match self {
            TypeDescriptor::Primitive(_) => Vec::new(),
            TypeDescriptor::Opt(t) | TypeDescriptor::Vec(t) => vec![*t],
            TypeDescriptor::Record(fields) | TypeDescriptor::Variant(fields) => {
                fields.iter().map(|f| f.ty).collect()
            }
            TypeDescriptor::Func(func) => func.args.iter().chain(&func.rets).copied().collect(),
            TypeDescriptor::Service(methods) => methods.iter().map(|(_, t)| *t).collect(),
        }
    }
}
