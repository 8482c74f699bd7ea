use candor_core::client::{Canister, DynamicRequest, DynamicResponse, Online};
use candor_core::codec::EncodeError;
use candor_core::service::{ArgumentError, CallError};
use candor_core::transport::TransportError;
use candor_core::types::FuncMode;
use candor_core::value::Principal;
use echo_canister::{
    CANISTER_ERROR, CANISTER_REJECT, ECHO_DID, EchoCanister, GOVERNANCE_CANISTER_ID,
    GOVERNANCE_DID,
};
use serde_json::json;
use std::sync::Arc;

fn echo_client(canister: &Arc<EchoCanister>) -> Canister<Online<Arc<EchoCanister>>> {
    Canister::new(
        Arc::clone(canister),
        Principal::management_canister(),
        ECHO_DID,
    )
    .unwrap()
}

#[tokio::test]
async fn test_record_with_absent_option() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_item", vec![json!({ "a": 5, "b": [] })]);
    let res = client.dynamic(request).await.unwrap();

    assert_eq!(
        res,
        DynamicResponse::Reply(vec![json!({ "a": 5, "b": [] })])
    );
}

#[tokio::test]
async fn test_variant_payload() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_outcome", vec![json!({ "Err": "bad" })]);
    let res = client.dynamic(request).await.unwrap();

    assert_eq!(
        res,
        DynamicResponse::Reply(vec![json!({ "Err": "bad" })])
    );
}

#[tokio::test]
async fn test_list_proposals_is_a_query() {
    let canister = Arc::new(EchoCanister::governance());
    let canister_id = Principal::from_text(GOVERNANCE_CANISTER_ID).unwrap();
    let client = Canister::new(Arc::clone(&canister), canister_id.clone(), GOVERNANCE_DID).unwrap();

    let request = DynamicRequest::new(
        "list_proposals",
        vec![json!({
            "include_reward_status": [],
            "before_proposal": [],
            "limit": 100,
            "exclude_topic": [],
            "include_status": [1]
        })],
    );

    let res = client.dynamic(request).await.unwrap();

    let DynamicResponse::Reply(values) = res else {
        panic!("Received oneway response for a query method")
    };
    assert_eq!(values.len(), 1);
    let proposals = values[0]["proposal_info"].as_array().unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0]["id"], json!([{ "id": 42 }]));
    assert_eq!(
        proposals[0]["proposal"][0]["action"][0]["Motion"]["motion_text"],
        "Adopt the proposal"
    );
    assert_eq!(proposals[0]["ballots"][0][1]["voting_power"], 5_000_000);

    let calls = canister.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "list_proposals");
    assert_eq!(calls[0].mode, FuncMode::Query);
    assert_eq!(calls[0].canister_id, canister_id);
}

#[tokio::test]
async fn test_out_of_range_argument_is_never_sent() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_nat8", vec![json!(300)]);
    let err = client.dynamic(request).await.unwrap_err();

    assert!(matches!(
        err,
        CallError::Encode(EncodeError::OutOfRange { .. })
    ));
    assert!(canister.calls().await.is_empty());
}

#[tokio::test]
async fn test_wrong_arity_is_never_sent() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_many", vec![json!(1), json!("two")]);
    let err = client.dynamic(request).await.unwrap_err();

    match err {
        CallError::Argument(ArgumentError::Arity {
            method,
            expected,
            found,
        }) => {
            assert_eq!(method, "echo_many");
            assert_eq!(expected, 3);
            assert_eq!(found, 2);
        }
        other => panic!("Expected an arity error, got {other:?}"),
    }
    assert!(canister.calls().await.is_empty());
}

#[tokio::test]
async fn test_type_mismatch_is_never_sent() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_item", vec![json!({ "a": "five" })]);
    let err = client.dynamic(request).await.unwrap_err();

    assert!(matches!(err, CallError::Encode(_)));
    assert!(canister.calls().await.is_empty());
}

#[tokio::test]
async fn test_method_not_found() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("does_not_exist", vec![]);
    let err = client.dynamic(request).await.unwrap_err();

    assert!(matches!(err, CallError::MethodNotFound(name) if name == "does_not_exist"));
    assert!(canister.calls().await.is_empty());
}

#[tokio::test]
async fn test_oneway_call() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let request = DynamicRequest::new("log", vec![json!("hello")]);
    let res = client.dynamic(request).await.unwrap();

    assert_eq!(res, DynamicResponse::Oneway);

    let calls = canister.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mode, FuncMode::Oneway);
}

#[tokio::test]
async fn test_multiple_arguments() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let args = vec![json!("340282366920938463463374607431768211456"), json!("x"), json!(true)];
    let res = client
        .dynamic(DynamicRequest::new("echo_many", args.clone()))
        .await
        .unwrap();

    assert_eq!(res, DynamicResponse::Reply(args));
}

#[tokio::test]
async fn test_recursive_list() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let list = json!([{ "head": -1, "tail": [{ "head": 2, "tail": [] }] }]);
    let res = client
        .dynamic(DynamicRequest::new("echo_list", vec![list.clone()]))
        .await
        .unwrap();

    assert_eq!(res, DynamicResponse::Reply(vec![list]));
    assert_eq!(canister.calls().await[0].mode, FuncMode::Query);
}

#[tokio::test]
async fn test_composite_query_and_bare_tag() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let res = client
        .dynamic(DynamicRequest::new("echo_shape", vec![json!("Dot")]))
        .await
        .unwrap();

    assert_eq!(res, DynamicResponse::Reply(vec![json!({ "Dot": null })]));
    assert_eq!(canister.calls().await[0].mode, FuncMode::CompositeQuery);
}

#[tokio::test]
async fn test_blob_and_principal() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let bytes = client
        .dynamic(DynamicRequest::new("echo_bytes", vec![json!([0, 1, 255])]))
        .await
        .unwrap();
    let principal = client
        .dynamic(DynamicRequest::new(
            "echo_principal",
            vec![json!(GOVERNANCE_CANISTER_ID)],
        ))
        .await
        .unwrap();

    assert_eq!(bytes, DynamicResponse::Reply(vec![json!([0, 1, 255])]));
    assert_eq!(
        principal,
        DynamicResponse::Reply(vec![json!(GOVERNANCE_CANISTER_ID)])
    );
}

#[tokio::test]
async fn test_rejected_call() {
    let canister = Arc::new(
        EchoCanister::echo().with_handler("echo_item", |_| Err("out of cycles".to_string())),
    );
    let client = echo_client(&canister);

    let request = DynamicRequest::new("echo_item", vec![json!({ "a": 1 })]);
    let err = client.dynamic(request).await.unwrap_err();

    match err {
        CallError::Transport(TransportError::Rejected { code, message }) => {
            assert_eq!(code, CANISTER_REJECT);
            assert_eq!(message, "out of cycles");
        }
        other => panic!("Expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_canister_without_the_method() {
    // The client knows a method the canister does not export.
    let canister = Arc::new(EchoCanister::echo());
    let client = Canister::new(
        Arc::clone(&canister),
        Principal::anonymous(),
        "service : { retired : () -> () }",
    )
    .unwrap();

    let err = client
        .dynamic(DynamicRequest::new("retired", vec![]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CallError::Transport(TransportError::Rejected { code, .. }) if code == CANISTER_ERROR
    ));
    assert_eq!(canister.calls().await.len(), 1);
}

#[tokio::test]
async fn test_reply_from_a_newer_interface() {
    // The canister has grown a field the client has never heard of.
    let newer = "type Item = record { a : nat; b : opt text; c : vec nat8 };
                 service : { get : () -> (Item) query }";
    let canister = Arc::new(
        EchoCanister::new(newer)
            .unwrap()
            .with_handler("get", |_| Ok(vec![json!({ "a": 7, "c": [1, 2] })])),
    );
    let older = "type Item = record { a : int; b : opt text };
                 service : { get : () -> (Item) query }";
    let client = Canister::new(Arc::clone(&canister), Principal::anonymous(), older).unwrap();

    let res = client.dynamic(DynamicRequest::new("get", vec![])).await.unwrap();

    assert_eq!(res, DynamicResponse::Reply(vec![json!({ "a": 7, "b": [] })]));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_handle() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let (first, second, third) = tokio::join!(
        client.dynamic(DynamicRequest::new("echo_nat8", vec![json!(1)])),
        client.dynamic(DynamicRequest::new("echo_outcome", vec![json!({ "Ok": 2 })])),
        client.dynamic(DynamicRequest::new("log", vec![json!("three")])),
    );

    assert_eq!(first.unwrap(), DynamicResponse::Reply(vec![json!(1)]));
    assert_eq!(second.unwrap(), DynamicResponse::Reply(vec![json!({ "Ok": 2 })]));
    assert_eq!(third.unwrap(), DynamicResponse::Oneway);
    assert_eq!(canister.calls().await.len(), 3);
}

#[tokio::test]
async fn test_disconnect_keeps_the_interface() {
    let canister = Arc::new(EchoCanister::echo());
    let client = echo_client(&canister);

    let offline = client.disconnect();

    assert!(offline.list_methods().contains(&"echo_item".to_string()));
    let bytes = offline
        .encode_args(&DynamicRequest::new("echo_nat8", vec![json!(7)]))
        .unwrap();
    assert_eq!(bytes, hex::decode("4449444c00017b07").unwrap());
}
