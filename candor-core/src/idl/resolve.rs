use super::{
    ParseError, Position,
    parser::{FieldSyntax, FuncSyntax, MethodSyntax, MethodType, Program, ServiceBody, Syntax},
};
use crate::{
    service::ServiceDescriptor,
    types::{Field, FuncMode, FuncType, TypeDescriptor, TypeRef, TypeTable},
};
use std::collections::{BTreeMap, HashMap, HashSet};

pub(super) fn resolve(program: Program) -> Result<(TypeTable, ServiceDescriptor), ParseError> {
    let mut resolver = Resolver {
        table: TypeTable::new(),
    };

    // Pass 1: every name gets a reference before any body is lowered.
    let mut declared = HashSet::new();
    let mut slots = Vec::new();
    let mut aliases = HashMap::new();
    for decl in &program.types {
        if !declared.insert(decl.name.as_str()) {
            return Err(ParseError::DuplicateType(decl.name.clone()));
        }
        match &decl.ty {
            Syntax::Primitive(p) => resolver.table.bind_name(&decl.name, TypeRef::Primitive(*p)),
            Syntax::Named(target, at) => {
                aliases.insert(decl.name.as_str(), (target.as_str(), *at));
            }
            ty => {
                let index = resolver.table.reserve(&decl.name);
                resolver.table.bind_name(&decl.name, TypeRef::Table(index));
                slots.push((index, ty));
            }
        }
    }
    for decl in &program.types {
        if aliases.contains_key(decl.name.as_str()) {
            let ty = resolver.resolve_alias(&decl.name, decl.at, &aliases, &mut Vec::new())?;
            resolver.table.bind_name(&decl.name, ty);
        }
    }

    // Pass 2: lower the bodies of the reserved slots.
    for (index, ty) in slots {
        let descriptor = resolver.descriptor(ty)?;
        resolver.table.define(index, descriptor);
    }
    check_finite(&resolver.table)?;

    let service = match program.service {
        None => ServiceDescriptor::default(),
        Some(service) => {
            let init_args = service
                .init_args
                .iter()
                .map(|arg| resolver.lower(arg))
                .collect::<Result<Vec<_>, _>>()?;
            let methods = match &service.body {
                ServiceBody::Methods(methods) => resolver.methods(methods)?,
                ServiceBody::Named(name, at) => resolver.named_service(name, *at)?,
            };
            ServiceDescriptor { init_args, methods }
        }
    };
    Ok((resolver.table, service))
}

struct Resolver {
    table: TypeTable,
}

impl Resolver {
    /// Follows a chain of aliases down to a primitive or a constructor slot.
    fn resolve_alias<'a>(
        &self,
        name: &'a str,
        at: Position,
        aliases: &HashMap<&'a str, (&'a str, Position)>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<TypeRef, ParseError> {
        if let Some(ty) = self.table.resolve(name) {
            return Ok(ty);
        }
        let Some(&(target, target_at)) = aliases.get(name) else {
            return Err(ParseError::UnknownType {
                name: name.to_string(),
                at,
            });
        };
        if visiting.contains(&name) {
            return Err(ParseError::InfiniteType(name.to_string()));
        }
        visiting.push(name);
        self.resolve_alias(target, target_at, aliases, visiting)
    }

    /// Lowers a type expression to a reference, interning anonymous constructors.
    fn lower(&mut self, syntax: &Syntax) -> Result<TypeRef, ParseError> {
        match syntax {
            Syntax::Primitive(p) => Ok(TypeRef::Primitive(*p)),
            Syntax::Named(name, at) => self.table.resolve(name).ok_or(ParseError::UnknownType {
                name: name.clone(),
                at: *at,
            }),
            constructor => {
                let descriptor = self.descriptor(constructor)?;
                Ok(self.table.intern(descriptor))
            }
        }
    }

    fn descriptor(&mut self, syntax: &Syntax) -> Result<TypeDescriptor, ParseError> {
        let descriptor = match syntax {
            Syntax::Primitive(p) => TypeDescriptor::Primitive(*p),
            Syntax::Named(name, at) => {
                let ty = self.lower(syntax)?;
                self.table
                    .describe(ty)
                    .map(|d| d.into_owned())
                    .ok_or_else(|| ParseError::UnknownType {
                        name: name.clone(),
                        at: *at,
                    })?
            }
            Syntax::Opt(inner) => TypeDescriptor::Opt(self.lower(inner)?),
            Syntax::Vec(inner) => TypeDescriptor::Vec(self.lower(inner)?),
            Syntax::Blob => TypeDescriptor::blob(),
            Syntax::Record(fields) => TypeDescriptor::Record(self.fields(fields)?),
            Syntax::Variant(fields) => TypeDescriptor::Variant(self.fields(fields)?),
            Syntax::Func(func) => TypeDescriptor::Func(self.func(func)?),
            Syntax::Service(methods) => {
                let methods = self.methods(methods)?;
                TypeDescriptor::Service(
                    methods
                        .into_iter()
                        .map(|(name, func)| (name, self.table.intern(TypeDescriptor::Func(func))))
                        .collect(),
                )
            }
        };
        Ok(descriptor)
    }

    /// Lowers fields and sorts them by id, rejecting labels whose ids collide.
    fn fields(&mut self, fields: &[FieldSyntax]) -> Result<Vec<Field>, ParseError> {
        let mut lowered = Vec::with_capacity(fields.len());
        for field in fields {
            let ty = self.lower(&field.ty)?;
            lowered.push((Field::new(field.label.clone(), ty), field.at));
        }
        lowered.sort_by_key(|(field, _)| field.id());

        for pair in lowered.windows(2) {
            if pair[0].0.id() == pair[1].0.id() {
                let (field, at) = &pair[1];
                return Err(ParseError::DuplicateField {
                    label: field.label.to_string(),
                    at: *at,
                });
            }
        }
        Ok(lowered.into_iter().map(|(field, _)| field).collect())
    }

    fn func(&mut self, func: &FuncSyntax) -> Result<FuncType, ParseError> {
        if func.mode == FuncMode::Oneway && !func.rets.is_empty() {
            return Err(ParseError::OnewayWithResults(func.at));
        }
        let args = func
            .args
            .iter()
            .map(|arg| self.lower(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let rets = func
            .rets
            .iter()
            .map(|ret| self.lower(ret))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FuncType {
            args,
            rets,
            mode: func.mode,
        })
    }

    fn methods(
        &mut self,
        methods: &[MethodSyntax],
    ) -> Result<BTreeMap<String, FuncType>, ParseError> {
        let mut lowered = BTreeMap::new();
        for method in methods {
            let func = match &method.ty {
                MethodType::Func(func) => self.func(func)?,
                MethodType::Named(name, at) => self.named_func(name, *at)?,
            };
            if lowered.insert(method.name.clone(), func).is_some() {
                return Err(ParseError::DuplicateMethod {
                    name: method.name.clone(),
                    at: method.at,
                });
            }
        }
        Ok(lowered)
    }

    fn named_func(&self, name: &str, at: Position) -> Result<FuncType, ParseError> {
        let ty = self.table.resolve(name).ok_or_else(|| ParseError::UnknownType {
            name: name.to_string(),
            at,
        })?;
        match self.table.describe(ty).as_deref() {
            Some(TypeDescriptor::Func(func)) => Ok(func.clone()),
            _ => Err(ParseError::NotAFunction {
                name: name.to_string(),
                at,
            }),
        }
    }

    fn named_service(
        &self,
        name: &str,
        at: Position,
    ) -> Result<BTreeMap<String, FuncType>, ParseError> {
        let ty = self.table.resolve(name).ok_or_else(|| ParseError::UnknownType {
            name: name.to_string(),
            at,
        })?;
        let Some(TypeDescriptor::Service(methods)) = self.table.describe(ty).as_deref().cloned()
        else {
            return Err(ParseError::NotAService {
                name: name.to_string(),
                at,
            });
        };
        methods
            .into_iter()
            .map(|(method, ty)| match self.table.describe(ty).as_deref() {
                Some(TypeDescriptor::Func(func)) => Ok((method, func.clone())),
                _ => Err(ParseError::NotAFunction { name: method, at }),
            })
            .collect()
    }
}

/// Rejects named types that contain themselves without an `opt`, `vec` or `func` in between.
///
/// Records, variants and services are followed. Only the three indirections break a cycle.
fn check_finite(table: &TypeTable) -> Result<(), ParseError> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(table: &TypeTable, index: usize, states: &mut [State]) -> Result<(), usize> {
        match states[index] {
            State::Done => return Ok(()),
            State::Visiting => return Err(index),
            State::Unvisited => {}
        }
        states[index] = State::Visiting;
        let children: Vec<TypeRef> = match table.describe(TypeRef::Table(index)).as_deref() {
            Some(TypeDescriptor::Record(fields) | TypeDescriptor::Variant(fields)) => {
                fields.iter().map(|field| field.ty).collect()
            }
            Some(TypeDescriptor::Service(methods)) => methods.iter().map(|(_, ty)| *ty).collect(),
            _ => Vec::new(),
        };
        for child in children {
            if let TypeRef::Table(child) = child {
                visit(table, child, states)?;
            }
        }
        states[index] = State::Done;
        Ok(())
    }

    let mut states = vec![State::Unvisited; table.len()];
    for index in 0..table.len() {
        if let Err(cycle) = visit(table, index, &mut states) {
            let name = table
                .slot_name(cycle)
                .map(str::to_string)
                .unwrap_or_else(|| format!("table{cycle}"));
            return Err(ParseError::InfiniteType(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        idl::{ParseError, parse},
        types::{FuncMode, Label, Primitive, TypeDescriptor, TypeRef, idl_hash},
    };

    #[test]
    fn test_forward_and_mutual_references() {
        let (table, _) = parse(
            "type Tree = variant { leaf : nat; node : Forest }; \
             type Forest = vec Tree;",
        )
        .unwrap();
        let tree = table.resolve("Tree").unwrap();
        let forest = table.resolve("Forest").unwrap();
        let Some(TypeDescriptor::Variant(fields)) = table.describe(tree).as_deref().cloned() else {
            panic!("expected a variant");
        };
        let node = fields.iter().find(|f| f.id() == idl_hash("node")).unwrap();
        assert_eq!(node.ty, forest);
        assert_eq!(table.describe(forest).as_deref(), Some(&TypeDescriptor::Vec(tree)));
    }

    #[test]
    fn test_aliases_resolve_to_their_target() {
        let (table, _) =
            parse("type A = B; type B = nat; type C = A; type L = List; type List = opt L;")
                .unwrap();
        assert_eq!(table.resolve("A"), Some(TypeRef::Primitive(Primitive::Nat)));
        assert_eq!(table.resolve("C"), Some(TypeRef::Primitive(Primitive::Nat)));
        assert_eq!(table.resolve("L"), table.resolve("List"));
    }

    #[test]
    fn test_fields_are_sorted_by_id() {
        let (table, _) = parse("type R = record { z : nat; a : text; 1 : bool };").unwrap();
        let ty = table.resolve("R").unwrap();
        let Some(TypeDescriptor::Record(fields)) = table.describe(ty).as_deref().cloned() else {
            panic!("expected a record");
        };
        let ids: Vec<u32> = fields.iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec![1, idl_hash("a"), idl_hash("z")]);
        assert_eq!(fields[0].label, Label::Id(1));
    }

    #[test]
    fn test_resolution_errors() {
        assert!(matches!(
            parse("type A = record { b : Missing };"),
            Err(ParseError::UnknownType { name, .. }) if name == "Missing"
        ));
        assert!(matches!(
            parse("type A = nat; type A = text;"),
            Err(ParseError::DuplicateType(name)) if name == "A"
        ));
        assert!(matches!(
            parse("type A = record { x : nat; x : text };"),
            Err(ParseError::DuplicateField { label, .. }) if label == "x"
        ));
        assert!(matches!(
            parse("type A = B; type B = A;"),
            Err(ParseError::InfiniteType(_))
        ));
        assert!(matches!(
            parse("type A = record { next : A };"),
            Err(ParseError::InfiniteType(name)) if name == "A"
        ));
        assert!(matches!(
            parse("type A = record { b : B }; type B = record { a : A };"),
            Err(ParseError::InfiniteType(_))
        ));
        assert!(matches!(
            parse("type A = variant { a : A };"),
            Err(ParseError::InfiniteType(name)) if name == "A"
        ));
        assert!(matches!(
            parse("type A = record { x : variant { a : A } };"),
            Err(ParseError::InfiniteType(_))
        ));
        assert!(matches!(
            parse("service : { log : (text) -> (nat) oneway }"),
            Err(ParseError::OnewayWithResults(_))
        ));
        assert!(matches!(
            parse("service : { a : () -> (); a : () -> () query }"),
            Err(ParseError::DuplicateMethod { name, .. }) if name == "a"
        ));
        assert!(matches!(
            parse("type T = nat; service : { a : T }"),
            Err(ParseError::NotAFunction { name, .. }) if name == "T"
        ));
    }

    #[test]
    fn test_guarded_recursion_is_accepted() {
        assert!(parse("type A = record { next : opt A };").is_ok());
        assert!(parse("type A = record { children : vec A };").is_ok());
        assert!(parse("type A = variant { leaf; node : opt record { A; A } };").is_ok());
        assert!(parse("type F = func (F) -> (F); type S = service { f : F };").is_ok());
    }

    #[test]
    fn test_service_clause_forms() {
        let (_, service) = parse(
            "type Init = record { owner : principal }; \
             type Notify = func (nat) -> () oneway; \
             service Ledger : (Init) -> { \
               balance : (principal) -> (nat) query; \
               notify : Notify; \
             }",
        )
        .unwrap();
        assert_eq!(service.init_args.len(), 1);
        assert_eq!(service.method("balance").unwrap().mode, FuncMode::Query);
        assert_eq!(service.method("notify").unwrap().mode, FuncMode::Oneway);

        let (_, service) =
            parse("type S = service { ping : () -> () query }; service : S").unwrap();
        assert!(service.method("ping").unwrap().mode.is_query());

        let (_, service) = parse("type T = nat;").unwrap();
        assert!(service.methods.is_empty());
    }
}
