//! # Echo Canister
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-process canister and
//! a set of interface descriptions for integration testing `candor_core` and the `candor`
//! CLI tool. It is not intended for production use.
//!
//! [`EchoCanister`] implements [`Transport`] without any network: it decodes the argument
//! blob it receives against its own copy of the interface, runs the handler registered
//! for the method (by default it replies with its arguments) and encodes the result.
//! Every call is recorded so tests can assert on what actually reached the canister.
mod fixtures;

pub use fixtures::*;

use candor_core::{
    client::{Canister, Offline},
    codec::ValueCodec,
    idl::ParseError,
    service::to_dynamic,
    transport::{Transport, TransportError},
    types::FuncMode,
    value::Principal,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// Reject code used when the canister does not export the requested method.
pub const CANISTER_ERROR: u32 = 5;
/// Reject code used when a handler refuses the call.
pub const CANISTER_REJECT: u32 = 4;

type Handler = Box<dyn Fn(Vec<Value>) -> Result<Vec<Value>, String> + Send + Sync>;

/// A call as it reached the canister.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub canister_id: Principal,
    pub method: String,
    pub mode: FuncMode,
    pub arg: Vec<u8>,
}

pub struct EchoCanister {
    canister: Canister<Offline>,
    handlers: BTreeMap<String, Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl EchoCanister {
    /// Creates a canister implementing `did`. Methods without a handler echo their arguments.
    pub fn new(did: &str) -> Result<Self, ParseError> {
        Ok(Self {
            canister: Canister::offline(did)?,
            handlers: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// The echo interface, see [`ECHO_DID`].
    pub fn echo() -> Self {
        Self::new(ECHO_DID).expect("ECHO_DID is a valid interface")
    }

    /// The governance interface with a `list_proposals` that returns one proposal.
    pub fn governance() -> Self {
        Self::new(GOVERNANCE_DID)
            .expect("GOVERNANCE_DID is a valid interface")
            .with_handler("list_proposals", |args| {
                let limit = args
                    .first()
                    .and_then(|request| request.get("limit"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let proposals = if limit == 0 {
                    vec![]
                } else {
                    vec![sample_proposal()]
                };
                Ok(vec![json!({ "proposal_info": proposals })])
            })
    }

    /// Registers the handler of `method`, replacing the default echo.
    pub fn with_handler<F>(mut self, method: &str, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<Value>, String> + Send + Sync + 'static,
    {
        self.handlers.insert(method.to_string(), Box::new(handler));
        self
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

impl Transport for EchoCanister {
    async fn call(
        &self,
        canister_id: &Principal,
        method: &str,
        arg: Vec<u8>,
        mode: FuncMode,
    ) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().await.push(RecordedCall {
            canister_id: canister_id.clone(),
            method: method.to_string(),
            mode,
            arg: arg.clone(),
        });

        let Some(stub) = self.canister.get_method(method) else {
            return Err(TransportError::Rejected {
                code: CANISTER_ERROR,
                message: format!("Canister has no method '{method}'"),
            });
        };

        let args = stub.decode_args(&arg).map_err(TransportError::other)?;
        if mode == FuncMode::Oneway {
            return Ok(Vec::new());
        }

        let results = match self.handlers.get(method) {
            Some(handler) => handler(args).map_err(|message| TransportError::Rejected {
                code: CANISTER_REJECT,
                message,
            })?,
            None => args,
        };

        let table = &stub.interface().table;
        let rets = &stub.signature().rets;
        let values = rets
            .iter()
            .zip(&results)
            .map(|(ty, value)| to_dynamic(table, *ty, value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TransportError::other)?;

        ValueCodec::new(table)
            .encode(rets, &values)
            .map_err(TransportError::other)
    }
}

/// A motion proposal as the governance canister reports it.
pub fn sample_proposal() -> Value {
    json!({
        "id": [{ "id": 42 }],
        "status": 1,
        "topic": 4,
        "failure_reason": [],
        "ballots": [[1, { "vote": 1, "voting_power": 5_000_000u64 }]],
        "proposal_timestamp_seconds": 1_650_000_000u64,
        "reward_event_round": 0,
        "deadline_timestamp_seconds": [1_650_345_600u64],
        "failed_timestamp_seconds": 0,
        "reject_cost_e8s": 100_000_000u64,
        "latest_tally": [{
            "no": 0,
            "yes": 5_000_000u64,
            "total": 5_000_000u64,
            "timestamp_seconds": 1_650_000_100u64
        }],
        "reward_status": 1,
        "decided_timestamp_seconds": 0,
        "proposal": [{
            "url": "https://forum.dfinity.org",
            "title": ["Motion"],
            "action": [{ "Motion": { "motion_text": "Adopt the proposal" } }],
            "summary": "A motion"
        }],
        "proposer": [{ "id": 7 }],
        "executed_timestamp_seconds": 0
    })
}
