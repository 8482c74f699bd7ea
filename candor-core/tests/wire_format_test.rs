use candor_core::client::{Canister, DynamicRequest};
use candor_core::codec::{DecodeError, EncodeError, ValueCodec};
use candor_core::service::{CallError, Interface};
use candor_core::types::{FuncMode, Primitive, idl_hash};
use candor_core::value::DynamicValue;
use echo_canister::{ECHO_DID, GOVERNANCE_DID, WICP_DID};
use serde_json::json;

fn encode(did: &str, method: &str, args: Vec<serde_json::Value>) -> String {
    let canister = Canister::offline(did).unwrap();
    let bytes = canister
        .encode_args(&DynamicRequest::new(method, args))
        .unwrap();
    hex::encode(bytes)
}

#[test]
fn test_known_vectors() {
    assert_eq!(
        encode("service : { f : (nat) -> () }", "f", vec![json!(1000)]),
        "4449444c00017de807"
    );
    assert_eq!(
        encode("service : { f : (nat) -> () }", "f", vec![json!(42)]),
        "4449444c00017d2a"
    );
    assert_eq!(
        encode("service : { f : (int) -> () }", "f", vec![json!(-1)]),
        "4449444c00017c7f"
    );
    assert_eq!(
        encode("service : { f : (opt nat) -> () }", "f", vec![json!(null)]),
        "4449444c016e7d010000"
    );
    assert_eq!(
        encode("service : { f : (text) -> () }", "f", vec![json!("hello")]),
        "4449444c0001710568656c6c6f"
    );
    assert_eq!(
        encode("service : { f : (int) -> () }", "f", vec![json!(-129)]),
        "4449444c00017cff7e"
    );
    assert_eq!(
        encode("service : { f : (opt nat8) -> () }", "f", vec![json!([])]),
        "4449444c016e7b010000"
    );
}

#[test]
fn test_record_vector() {
    let hex = encode(ECHO_DID, "echo_item", vec![json!({ "a": 5 })]);
    assert_eq!(hex, "4449444c026c02617d62016e7101000500");
}

#[test]
fn test_variant_vector() {
    let hex = encode(ECHO_DID, "echo_outcome", vec![json!({ "Err": "bad" })]);
    assert_eq!(hex, "4449444c016b02bc8a017dc5fed2017101000103626164");
}

#[test]
fn test_encoding_is_deterministic() {
    // Field order in the JSON object must not leak into the bytes.
    let first = encode(ECHO_DID, "echo_item", vec![json!({ "a": 1, "b": ["x"] })]);
    let second = encode(ECHO_DID, "echo_item", vec![json!({ "b": ["x"], "a": 1 })]);
    assert_eq!(first, second);
}

#[test]
fn test_label_hashes() {
    assert_eq!(idl_hash("a"), 97);
    assert_eq!(idl_hash("Ok"), 17724);
    assert_eq!(idl_hash("Err"), 3456837);
    assert_eq!(idl_hash("owner"), 947296307);
    assert_eq!(idl_hash("subaccount"), 1349681965);
    assert_eq!(idl_hash("proposal_info"), 3720987355);
}

const LIMITS_DID: &str = "
type Limits = record {
  i8 : int8; i16 : int16; i32 : int32; i64 : int64;
  n8 : nat8; n16 : nat16; n32 : nat32; n64 : nat64;
  f32 : float32; f64 : float64;
  big : int; huge : nat;
  flag : bool; unit : null; anything : reserved;
  xs : vec int; pair : record { int8; text };
};
service : {
  limits : (Limits, Limits) -> ();
  narrow : (int8, int16) -> ();
}";

#[test]
fn test_every_primitive_survives_a_round_trip() {
    let canister = Canister::offline(LIMITS_DID).unwrap();
    let min = json!({
        "i8": i8::MIN, "i16": i16::MIN, "i32": i32::MIN, "i64": i64::MIN,
        "n8": 0, "n16": 0, "n32": 0, "n64": 0,
        "f32": -f64::from(f32::MAX), "f64": f64::MIN,
        "big": "-170141183460469231731687303715884105728",
        "huge": 0,
        "flag": false, "unit": null, "anything": null,
        "xs": [],
        "pair": [-128, ""]
    });
    let max = json!({
        "i8": i8::MAX, "i16": i16::MAX, "i32": i32::MAX, "i64": i64::MAX,
        "n8": u8::MAX, "n16": u16::MAX, "n32": u32::MAX, "n64": u64::MAX,
        "f32": f64::from(f32::MAX), "f64": f64::MAX,
        "big": "170141183460469231731687303715884105727",
        "huge": "340282366920938463463374607431768211455",
        "flag": true, "unit": null, "anything": null,
        "xs": [-1, 0, 1],
        "pair": [127, "x"]
    });

    let bytes = canister
        .encode_args(&DynamicRequest::new("limits", vec![min.clone(), max.clone()]))
        .unwrap();
    let args = canister.decode_args("limits", &bytes).unwrap();

    assert_eq!(args, vec![min, max]);
}

#[test]
fn test_signed_out_of_range_is_rejected() {
    let canister = Canister::offline(LIMITS_DID).unwrap();

    let err = canister
        .encode_args(&DynamicRequest::new("narrow", vec![json!(128), json!(0)]))
        .unwrap_err();
    assert!(matches!(
        err,
        CallError::Encode(EncodeError::OutOfRange { value, ty: Primitive::Int8 }) if value == "128"
    ));

    let err = canister
        .encode_args(&DynamicRequest::new("narrow", vec![json!(-128), json!(-32769)]))
        .unwrap_err();
    assert!(matches!(
        err,
        CallError::Encode(EncodeError::OutOfRange { value, ty: Primitive::Int16 }) if value == "-32769"
    ));
}

#[test]
fn test_decode_against_a_wider_type() {
    // `nat` on the wire, `int` expected, plus an optional field the sender never knew.
    let wire = hex::decode("4449444c016c01617d010005").unwrap();
    let did = "type R = record { a : int; z : opt text };
               service : { f : () -> (R) }";
    let canister = Canister::offline(did).unwrap();

    let values = canister.decode_reply("f", &wire).unwrap();

    assert_eq!(values, vec![json!({ "a": 5, "z": [] })]);
}

#[test]
fn test_decode_rejects_a_narrower_type() {
    // `int` on the wire cannot be read back as a `nat`.
    let wire = hex::decode("4449444c00017c05").unwrap();
    let canister = Canister::offline("service : { f : () -> (nat) }").unwrap();

    let err = canister.decode_reply("f", &wire).unwrap_err();

    assert!(matches!(err, CallError::Decode(DecodeError::TypeMismatch { .. })));
}

#[test]
fn test_decode_rejects_bad_magic() {
    let canister = Canister::offline("service : { f : () -> (nat) }").unwrap();

    let err = canister.decode_reply("f", b"DIDX\x00\x01\x7d\x00").unwrap_err();

    assert!(matches!(err, CallError::Decode(DecodeError::BadMagic(_))));
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let canister = Canister::offline("service : { f : () -> (nat) }").unwrap();

    let err = canister
        .decode_reply("f", &hex::decode("4449444c00017d0500").unwrap())
        .unwrap_err();

    assert!(matches!(err, CallError::Decode(DecodeError::TrailingBytes(1))));
}

#[test]
fn test_decode_wire_without_expected_types() {
    let interface = Interface::parse(ECHO_DID).unwrap();
    let codec = ValueCodec::new(&interface.table);

    let message = codec
        .decode_wire(&hex::decode("4449444c016b02bc8a017dc5fed2017101000103626164").unwrap())
        .unwrap();

    assert_eq!(message.values.len(), 1);
    assert_eq!(
        message.values[0],
        DynamicValue::Variant(idl_hash("Err"), Box::new(DynamicValue::text("bad")))
    );
}

#[test]
fn test_governance_interface() {
    let canister = Canister::offline(GOVERNANCE_DID).unwrap();

    let list_proposals = canister.get_method("list_proposals").unwrap();
    assert_eq!(list_proposals.mode(), FuncMode::Query);
    assert_eq!(
        list_proposals.display(),
        "list_proposals : (ListProposalInfo) -> (ListProposalInfoResponse) query"
    );
    assert_eq!(canister.interface().service.init_args.len(), 1);
    assert!(canister.describe_type("ProposalInfo").is_some());
    assert!(canister.describe_type("Unknown").is_none());
}

#[test]
fn test_token_interface() {
    let canister = Canister::offline(WICP_DID).unwrap();

    assert_eq!(canister.interface().service.init_args.len(), 9);
    assert_eq!(canister.list_methods().len(), 28);
    assert_eq!(
        canister.get_method("balanceOf").unwrap().mode(),
        FuncMode::Query
    );

    let bytes = canister
        .encode_args(&DynamicRequest::new(
            "mint",
            vec![json!([[1, 2, 3]]), json!(10)],
        ))
        .unwrap();
    let args = canister.decode_args("mint", &bytes).unwrap();
    assert_eq!(args, vec![json!([[1, 2, 3]]), json!(10)]);
}
