//! # Candor CLI Entry Point
//!
//! The main executable for the Candor tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    log subscriber (stderr, filtered by `RUST_LOG`).
//! 2. **Binding**: Reads the interface description and binds it into an offline
//!    `Canister` handle via `candor_core`.
//! 3. **Execution**: Lists, describes, encodes or decodes through that handle.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod formatter;

use candor_core::client::{Canister, DynamicRequest, Offline};
use clap::Parser;
use cli::{Cli, Commands, DescribeCommands, HexBlob, JsonArgs};
use formatter::{
    Blob, FormattedString, GenericError, Method, MethodList, Service, TypeDefinition, Values,
};
use std::{path::Path, process};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let canister = load_or_exit(&args.did);

    match args.command {
        Commands::List => list_methods(&canister),
        Commands::Describe { sub } => match sub {
            DescribeCommands::Service => {
                println!("{}", FormattedString::from(Service(canister.interface())))
            }
            DescribeCommands::Method { method } => describe_method(&canister, &method),
            DescribeCommands::Type { name } => describe_type(&canister, &name),
        },
        Commands::Encode {
            method,
            args: JsonArgs(args),
        } => encode(&canister, method, args),
        Commands::Decode {
            method,
            blob: HexBlob(bytes),
        } => exit_on_error(canister.decode_reply(&method, &bytes).map(Values)),
        Commands::DecodeArgs {
            method,
            blob: HexBlob(bytes),
        } => exit_on_error(canister.decode_args(&method, &bytes).map(Values)),
    }
}

fn load_or_exit(path: &Path) -> Canister<Offline> {
    tracing::debug!(path = %path.display(), "Loading interface description");
    let did = match std::fs::read_to_string(path) {
        Ok(did) => did,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    match Canister::offline(&did) {
        Ok(canister) => canister,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

fn list_methods(canister: &Canister<Offline>) {
    let methods = canister
        .list_methods()
        .iter()
        .filter_map(|name| canister.get_method(name))
        .collect();
    println!("{}", FormattedString::from(MethodList(methods)));
}

fn describe_method(canister: &Canister<Offline>, name: &str) {
    match canister.get_method(name) {
        Some(method) => println!("{}", FormattedString::from(Method(method))),
        None => {
            eprintln!("{}", FormattedString::from(GenericError("Method not found", name)));
            process::exit(1);
        }
    }
}

fn describe_type(canister: &Canister<Offline>, name: &str) {
    match canister.describe_type(name) {
        Some(definition) => println!("{}", FormattedString::from(TypeDefinition(definition))),
        None => {
            eprintln!("{}", FormattedString::from(GenericError("Type not found", name)));
            process::exit(1);
        }
    }
}

fn encode(canister: &Canister<Offline>, method: String, args: Vec<serde_json::Value>) {
    let request = DynamicRequest::new(method, args);
    exit_on_error(canister.encode_args(&request).map(Blob));
}

fn exit_on_error<T>(result: Result<T, candor_core::service::CallError>)
where
    FormattedString: From<T>,
{
    match result {
        Ok(output) => println!("{}", FormattedString::from(output)),
        Err(err) => {
            eprintln!("{}", <FormattedString as From<candor_core::service::CallError>>::from(err));
            process::exit(1);
        }
    }
}
