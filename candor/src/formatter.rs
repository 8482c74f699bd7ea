use candor_core::{
    idl::ParseError,
    service::{CallError, Interface, MethodStub},
    types::TypeRef,
};
use colored::*;
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct MethodList<'a>(pub Vec<&'a MethodStub>);

pub struct Method<'a>(pub &'a MethodStub);

pub struct Service<'a>(pub &'a Interface);

/// A `type Name = ...;` definition.
pub struct TypeDefinition(pub String);

pub struct Blob(pub Vec<u8>);

/// Decoded values, one per declared type.
pub struct Values(pub Vec<serde_json::Value>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<Values> for FormattedString {
    fn from(Values(values): Values) -> Self {
        let value = match <[_; 1]>::try_from(values) {
            Ok([single]) => single,
            Err(values) => serde_json::Value::Array(values),
        };
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<Blob> for FormattedString {
    fn from(Blob(bytes): Blob) -> Self {
        FormattedString(hex::encode(bytes))
    }
}

impl From<CallError> for FormattedString {
    fn from(err: CallError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), err))
    }
}

impl From<ParseError> for FormattedString {
    fn from(err: ParseError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to parse interface description:".red().bold(),
            err
        ))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to read file:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<MethodList<'_>> for FormattedString {
    fn from(MethodList(methods): MethodList<'_>) -> Self {
        if methods.is_empty() {
            return FormattedString("No methods found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Methods:\n");
        for method in methods {
            let annotation = method
                .mode()
                .keyword()
                .map(|k| format!(" ({})", k.cyan()))
                .unwrap_or_default();
            out.push_str(&format!("  - {}{}\n", method.name().green(), annotation));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<Method<'_>> for FormattedString {
    fn from(Method(method): Method<'_>) -> Self {
        let interface = method.interface();
        let signature = method.signature();

        let mut out = format!(
            "{} : ({}) -> ({})",
            method.name().green(),
            type_list(interface, &signature.args),
            type_list(interface, &signature.rets),
        );
        if let Some(keyword) = signature.mode.keyword() {
            out.push_str(&format!(" {}", keyword.cyan()));
        }
        out.push(';');
        FormattedString(out)
    }
}

impl From<Service<'_>> for FormattedString {
    fn from(Service(interface): Service<'_>) -> Self {
        let mut out = format!("{} : ", "service".cyan());
        let init_args = &interface.service.init_args;
        if !init_args.is_empty() {
            out.push_str(&format!("({}) -> ", type_list(interface, init_args)));
        }
        out.push_str("{\n");

        for (name, func) in &interface.service.methods {
            out.push_str(&format!(
                "  {} : {};\n",
                name.green(),
                interface.table.display_signature(func)
            ));
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<TypeDefinition> for FormattedString {
    fn from(TypeDefinition(definition): TypeDefinition) -> Self {
        match definition.strip_prefix("type ") {
            Some(rest) => FormattedString(format!("{} {}", "type".cyan(), rest)),
            None => FormattedString(definition),
        }
    }
}

fn type_list(interface: &Interface, types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|ty| interface.table.display(*ty).to_string().yellow().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use candor_core::client::Canister;
    use serde_json::json;

    const DID: &str = "type Account = record { owner : principal };
                       service : {
                         balance_of : (Account) -> (nat) query;
                         transfer : (Account, nat) -> ();
                       }";

    #[test]
    fn test_single_value_is_printed_bare() {
        colored::control::set_override(false);
        let out = FormattedString::from(Values(vec![json!(5)]));
        assert_eq!(out.0, "5");
    }

    #[test]
    fn test_many_values_are_printed_as_array() {
        let out = FormattedString::from(Values(vec![json!(1), json!("x")]));
        let parsed: serde_json::Value = serde_json::from_str(&out.0).unwrap();
        assert_eq!(parsed, json!([1, "x"]));
    }

    #[test]
    fn test_method_signature() {
        colored::control::set_override(false);
        let canister = Canister::offline(DID).unwrap();
        let method = canister.get_method("balance_of").unwrap();

        let out = FormattedString::from(Method(method));

        assert_eq!(out.0, "balance_of : (Account) -> (nat) query;");
    }

    #[test]
    fn test_method_list() {
        colored::control::set_override(false);
        let canister = Canister::offline(DID).unwrap();
        let methods = canister
            .list_methods()
            .iter()
            .filter_map(|name| canister.get_method(name))
            .collect();

        let out = FormattedString::from(MethodList(methods));

        assert_eq!(
            out.0,
            "Available Methods:\n  - balance_of (query)\n  - transfer"
        );
    }
}
