//! # CLI
//!
//! This module defines the command-line interface of `candor` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring
//! arguments are a JSON array and blobs are valid hex).
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "candor", version, about = "Dynamic canister IDL CLI")]
pub struct Cli {
    /// Path to the interface description of the canister (e.g. governance.did)
    pub did: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the methods of the service with their annotations
    List,

    /// Describe the service, a method or a named type in detail
    Describe {
        #[command(subcommand)]
        sub: DescribeCommands,
    },

    /// Encode the arguments of a method call
    ///
    /// Prints the argument blob as hex, ready to be handed to any agent.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// candor governance.did encode list_proposals --args '[{"limit": 100}]'
    /// ```
    Encode {
        /// Method name as declared in the service (e.g. list_proposals)
        method: String,
        /// JSON array with one element per declared argument
        #[arg(long, value_parser = parse_args, default_value = "[]")]
        args: JsonArgs,
    },

    /// Decode a reply blob against the result types of a method
    Decode {
        /// Method name as declared in the service
        method: String,
        /// The reply blob, hex encoded
        #[arg(value_parser = parse_hex)]
        blob: HexBlob,
    },

    /// Decode an argument blob against the argument types of a method
    DecodeArgs {
        /// Method name as declared in the service
        method: String,
        /// The argument blob, hex encoded
        #[arg(value_parser = parse_hex)]
        blob: HexBlob,
    },
}

#[derive(Subcommand)]
pub enum DescribeCommands {
    /// Describe the service clause (init arguments and every method)
    Service,
    /// Describe a specific method (show its signature)
    Method {
        /// Method name (e.g. list_proposals)
        method: String,
    },
    /// Describe a named type (show its definition)
    Type {
        /// Type name (e.g. ProposalInfo)
        name: String,
    },
}

/// Call arguments, one JSON value per declared argument.
#[derive(Debug, Clone)]
pub struct JsonArgs(pub Vec<serde_json::Value>);

#[derive(Debug, Clone)]
pub struct HexBlob(pub Vec<u8>);

fn parse_args(value: &str) -> Result<JsonArgs, String> {
    match serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))? {
        serde_json::Value::Array(items) => Ok(JsonArgs(items)),
        _ => Err("Arguments must be a JSON array, e.g. '[42, \"text\"]'".to_string()),
    }
}

fn parse_hex(value: &str) -> Result<HexBlob, String> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    hex::decode(digits)
        .map(HexBlob)
        .map_err(|e| format!("Invalid hex blob: {e}"))
}
