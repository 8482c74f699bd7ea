use super::{FuncType, Primitive, TypeDescriptor, TypeRef, TypeTable};
use std::fmt::{self, Write};

/// Renders a type reference back to IDL text.
///
/// Anonymous entries are expanded inline. An anonymous entry that is already being
/// expanded further up (only possible in tables read from the wire) prints as `tableN`.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TypeRef,
    expand_outer: bool,
}

impl<'a> TypeDisplay<'a> {
    pub(crate) fn new(table: &'a TypeTable, ty: TypeRef, expand_outer: bool) -> Self {
        Self {
            table,
            ty,
            expand_outer,
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer {
            table: self.table,
            stack: Vec::new(),
        };
        printer.write_ref(f, self.ty, self.expand_outer)
    }
}

/// Renders a function signature, `(nat, text) -> (bool) query`.
pub(crate) struct FuncSignature<'a> {
    pub(crate) table: &'a TypeTable,
    pub(crate) func: &'a FuncType,
}

impl fmt::Display for FuncSignature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer {
            table: self.table,
            stack: Vec::new(),
        };
        printer.write_signature(f, self.func)
    }
}

impl TypeTable {
    /// Renders a function signature as IDL text.
    pub fn display_signature<'a>(&'a self, func: &'a FuncType) -> impl fmt::Display + 'a {
        FuncSignature { table: self, func }
    }
}

struct Printer<'a> {
    table: &'a TypeTable,
    stack: Vec<usize>,
}

impl Printer<'_> {
    fn write_ref(&mut self, f: &mut impl Write, ty: TypeRef, expand: bool) -> fmt::Result {
        let index = match ty {
            TypeRef::Primitive(p) => return f.write_str(p.keyword()),
            TypeRef::Table(index) => index,
        };

        if !expand && let Some(name) = self.table.slot_name(index) {
            return f.write_str(name);
        }
        if self.stack.contains(&index) {
            return write!(f, "table{index}");
        }
        let table = self.table;
        let Some(descriptor) = table.describe(ty) else {
            return write!(f, "table{index}");
        };

        self.stack.push(index);
        let result = self.write_descriptor(f, &descriptor);
        self.stack.pop();
        result
    }

    fn write_descriptor(&mut self, f: &mut impl Write, descriptor: &TypeDescriptor) -> fmt::Result {
        match descriptor {
            TypeDescriptor::Primitive(p) => f.write_str(p.keyword()),
            TypeDescriptor::Opt(inner) => {
                f.write_str("opt ")?;
                self.write_ref(f, *inner, false)
            }
            TypeDescriptor::Vec(TypeRef::Primitive(Primitive::Nat8)) => f.write_str("blob"),
            TypeDescriptor::Vec(inner) => {
                f.write_str("vec ")?;
                self.write_ref(f, *inner, false)
            }
            TypeDescriptor::Record(fields) if fields.is_empty() => f.write_str("record {}"),
            TypeDescriptor::Record(fields) => {
                let tuple = descriptor.is_tuple();
                f.write_str("record { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if !tuple {
                        write!(f, "{} : ", field.label)?;
                    }
                    self.write_ref(f, field.ty, false)?;
                }
                f.write_str(" }")
            }
            TypeDescriptor::Variant(fields) if fields.is_empty() => f.write_str("variant {}"),
            TypeDescriptor::Variant(fields) => {
                f.write_str("variant { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", field.label)?;
                    if field.ty != TypeRef::Primitive(Primitive::Null) {
                        f.write_str(" : ")?;
                        self.write_ref(f, field.ty, false)?;
                    }
                }
                f.write_str(" }")
            }
            TypeDescriptor::Func(func) => {
                f.write_str("func ")?;
                self.write_signature(f, func)
            }
            TypeDescriptor::Service(methods) => {
                f.write_str("service {")?;
                for (name, ty) in methods {
                    write!(f, " {name} : ")?;
                    self.write_method(f, *ty)?;
                    f.write_str(";")?;
                }
                f.write_str(" }")
            }
        }
    }

    fn write_method(&mut self, f: &mut impl Write, ty: TypeRef) -> fmt::Result {
        let table = self.table;
        if let TypeRef::Table(index) = ty
            && table.slot_name(index).is_none()
            && let Some(descriptor) = table.describe(ty)
            && let TypeDescriptor::Func(func) = descriptor.as_ref()
        {
            return self.write_signature(f, func);
        }
        self.write_ref(f, ty, false)
    }

    fn write_signature(&mut self, f: &mut impl Write, func: &FuncType) -> fmt::Result {
        self.write_tuple(f, &func.args)?;
        f.write_str(" -> ")?;
        self.write_tuple(f, &func.rets)?;
        if let Some(keyword) = func.mode.keyword() {
            write!(f, " {keyword}")?;
        }
        Ok(())
    }

    fn write_tuple(&mut self, f: &mut impl Write, types: &[TypeRef]) -> fmt::Result {
        f.write_char('(')?;
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            self.write_ref(f, *ty, false)?;
        }
        f.write_char(')')
    }
}
