use blockchain_rpcjson::{
    catalog::{self, DeriveAddressesCmd, GetBlockCmd, NodeCmd, NodeSubCmd, SearchRawTransactionsCmd, SendRawTransactionCmd},
    rpc_command,
    variant::{AllowHighFeesOrMaxFeeRate, DescriptorRange, ScriptPubKey, Timestamp},
    Command, ErrorKind, FieldSpec, ParamReader, ParamWriter, Registry, Request, RpcVersion, UsageFlags,
};
use serde_json::{json, Value};

fn params(registry: &Registry, cmd: &dyn blockchain_rpcjson::CommandValue) -> Vec<Value> {
    registry.request_for(RpcVersion::V1, 1, cmd).unwrap().params
}

fn wire(method: &str, params: Value) -> Request {
    Request::from_slice(
        json!({"jsonrpc": "1.0", "method": method, "params": params, "id": 1})
            .to_string()
            .as_bytes(),
    )
    .unwrap()
}

#[test]
fn test_getblock_scenario() {
    let registry = catalog::chain_server();

    let cmd = registry.new_cmd("getblock", vec![json!("abc")]).unwrap();
    let bytes = registry.marshal_cmd(RpcVersion::V1, 1, &*cmd).unwrap();
    let request: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(request["params"], json!(["abc"]));

    let decoded = registry.unmarshal_cmd(&wire("getblock", json!(["abc"]))).unwrap();
    assert_eq!(
        decoded.downcast_ref::<GetBlockCmd>(),
        Some(&GetBlockCmd { hash: "abc".into(), verbosity: Some(1) })
    );

    let cmd = registry.new_cmd("getblock", vec![json!("abc"), json!(2)]).unwrap();
    assert_eq!(params(registry, &*cmd), vec![json!("abc"), json!(2)]);
}

#[test]
fn test_getblock_without_verbosity_marshals_hash_only() {
    let registry = catalog::chain_server();
    let cmd = GetBlockCmd { hash: "abc".into(), verbosity: None };
    let bytes = registry.marshal_cmd(RpcVersion::V1, 1, &cmd).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        r#"{"jsonrpc":"1.0","method":"getblock","params":["abc"],"id":1}"#
    );
}

#[test]
fn test_trailing_omission() {
    let registry = catalog::chain_server();
    let mut cmd = SearchRawTransactionsCmd {
        address: "1Addr".into(),
        verbose: Some(0),
        skip: None,
        count: None,
        vin_extra: None,
        reverse: None,
        filter_addrs: None,
    };
    assert_eq!(params(registry, &cmd), vec![json!("1Addr"), json!(0)]);

    cmd.count = Some(10);
    assert_eq!(
        params(registry, &cmd),
        vec![json!("1Addr"), json!(0), Value::Null, json!(10)]
    );

    cmd.filter_addrs = Some(vec!["1Other".into()]);
    assert_eq!(params(registry, &cmd).len(), 7);
    assert_eq!(params(registry, &cmd)[4], Value::Null);
}

#[test]
fn test_round_trip_all_present_and_all_absent() {
    let registry = catalog::chain_server();
    let full = SearchRawTransactionsCmd {
        address: "1Addr".into(),
        verbose: Some(1),
        skip: Some(5),
        count: Some(50),
        vin_extra: Some(1),
        reverse: Some(true),
        filter_addrs: Some(vec!["1A".into(), "1B".into()]),
    };
    let request = registry.request_for(RpcVersion::V1, 7, &full).unwrap();
    let decoded = registry.unmarshal_cmd(&request).unwrap();
    assert_eq!(decoded.downcast::<SearchRawTransactionsCmd>(), Some(full));

    let node = NodeCmd { sub_cmd: NodeSubCmd::Disconnect, target: "127.0.0.1:8333".into(), connect_sub_cmd: None };
    let request = registry.request_for(RpcVersion::V2, "n", &node).unwrap();
    assert_eq!(request.params, vec![json!("disconnect"), json!("127.0.0.1:8333")]);
    let decoded = registry.unmarshal_cmd(&request).unwrap();
    // The omitted trailing field comes back with its declared default.
    assert_eq!(
        decoded.downcast::<NodeCmd>(),
        Some(NodeCmd { connect_sub_cmd: Some("temp".into()), ..node })
    );
}

#[test]
fn test_arity_errors() {
    let registry = catalog::chain_server();
    let err = registry.unmarshal_cmd(&wire("getblockhash", json!([]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumParams);
    let err = registry.unmarshal_cmd(&wire("getblockhash", json!([1, 2]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumParams);
    let err = registry.new_cmd("getblockcount", vec![json!(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NumParams);
    assert!(err.kind().is_runtime());
}

#[test]
fn test_wrong_types_are_runtime_errors() {
    let registry = catalog::chain_server();
    let err = registry.unmarshal_cmd(&wire("getblockhash", json!(["ten"]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
    assert_eq!(err.description(), "parameter #1 'index' must be type int64 (got string)");

    let err = registry.unmarshal_cmd(&wire("addnode", json!(["1.2.3.4", "sometimes"]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
}

#[test]
fn test_variant_range_round_trip() {
    let registry = catalog::chain_server();
    for range in [DescriptorRange::End(7), DescriptorRange::Range(2, 9)] {
        let cmd = DeriveAddressesCmd { descriptor: "wpkh(xpub)".into(), range: Some(range) };
        let request = registry.request_for(RpcVersion::V1, 1, &cmd).unwrap();
        match range {
            DescriptorRange::End(_) => assert_eq!(request.params[1], json!(7)),
            DescriptorRange::Range(..) => assert_eq!(request.params[1], json!([2, 9])),
        }
        let decoded = registry.unmarshal_cmd(&request).unwrap();
        assert_eq!(decoded.downcast::<DeriveAddressesCmd>(), Some(cmd));
    }

    let err = registry
        .unmarshal_cmd(&wire("deriveaddresses", json!(["wpkh(xpub)", [1, 2, 3]])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
}

#[test]
fn test_fee_setting_variant() {
    let registry = catalog::chain_server();
    let decoded = registry
        .unmarshal_cmd(&wire("sendrawtransaction", json!(["00ff"])))
        .unwrap()
        .downcast::<SendRawTransactionCmd>()
        .unwrap();
    assert_eq!(decoded.fee_setting, Some(AllowHighFeesOrMaxFeeRate::AllowHighFees(false)));

    let decoded = registry
        .new_cmd("sendrawtransaction", vec![json!("00ff"), json!(0.1)])
        .unwrap()
        .downcast::<SendRawTransactionCmd>()
        .unwrap();
    assert_eq!(decoded.fee_setting, Some(AllowHighFeesOrMaxFeeRate::MaxFeeRate(0.1)));
}

rpc_command! {
    pub struct ImportScriptCmd {
        pub script: ScriptPubKey,
        pub timestamp: Timestamp,
        pub label: Option<String>,
    }
}

fn import_registry() -> Registry {
    let mut builder = Registry::builder();
    builder.must_register::<ImportScriptCmd>("importscript", UsageFlags::WALLET_ONLY);
    builder.seal()
}

#[test]
fn test_variant_literals_on_construction_path() {
    let registry = import_registry();
    let cmd = registry
        .new_cmd("importscript", vec![json!("0014ab"), json!("now")])
        .unwrap()
        .downcast::<ImportScriptCmd>()
        .unwrap();
    assert_eq!(cmd.script, ScriptPubKey::Hex("0014ab".into()));
    assert_eq!(cmd.timestamp, Timestamp::Now);

    let cmd = registry
        .new_cmd(
            "importscript",
            vec![json!(r#"{"address":"1Addr"}"#), json!(1_500_000_000), json!("cold")],
        )
        .unwrap()
        .downcast::<ImportScriptCmd>()
        .unwrap();
    assert_eq!(cmd.script, ScriptPubKey::Address("1Addr".into()));
    assert_eq!(cmd.timestamp, Timestamp::Unix(1_500_000_000));

    let request = registry.request_for(RpcVersion::V1, 1, &cmd).unwrap();
    assert_eq!(request.params, vec![json!({"address": "1Addr"}), json!(1_500_000_000), json!("cold")]);
}

#[test]
fn test_variant_without_matching_alternative() {
    let registry = import_registry();
    let err = registry
        .unmarshal_cmd(&wire("importscript", json!(["0014ab", "yesterday"])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
    assert!(err.description().starts_with("parameter #2 'timestamp'"));
}

rpc_command! {
    pub struct BadOrderCmd {
        pub verbose: Option<bool>,
        pub hash: String,
    }
}

rpc_command! {
    pub struct HiddenFieldCmd {
        pub hash: String,
        secret: Option<String>,
    }
}

#[derive(Debug)]
struct DefaultOnRequiredCmd {
    count: i32,
}

impl Command for DefaultOnRequiredCmd {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::of::<i32>("count").with_default(1)]
    }

    fn encode(&self, params: &mut ParamWriter<'_>) -> blockchain_rpcjson::Result<()> {
        params.put(&self.count)
    }

    fn decode(params: &mut ParamReader<'_>) -> blockchain_rpcjson::Result<Self> {
        Ok(Self { count: params.take()? })
    }
}

#[test]
fn test_registration_rejects() {
    let mut builder = Registry::builder();
    assert_eq!(
        builder.register::<BadOrderCmd>("badorder", UsageFlags::NONE).unwrap_err().kind(),
        ErrorKind::NonOptionalField
    );
    assert_eq!(
        builder.register::<HiddenFieldCmd>("hidden", UsageFlags::NONE).unwrap_err().kind(),
        ErrorKind::UnexportedField
    );
    assert_eq!(
        builder.register::<DefaultOnRequiredCmd>("defaulted", UsageFlags::NONE).unwrap_err().kind(),
        ErrorKind::NonOptionalDefault
    );

    builder.register::<ImportScriptCmd>("importscript", UsageFlags::NONE).unwrap();
    let err = builder.register::<GetBlockCmd>("importscript", UsageFlags::NONE).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateMethod);
    assert!(!err.kind().is_runtime());

    let registry = builder.seal();
    assert_eq!(registry.registered_methods(), vec!["importscript"]);
}

#[test]
fn test_non_finite_amount_is_rejected_before_the_wire() {
    use blockchain_rpcjson::catalog::{SendManyCmd, SendToAddressCmd};
    use std::collections::HashMap;

    let registry = catalog::wallet();
    let cmd = SendToAddressCmd {
        address: "1A".into(),
        amount: f64::NAN,
        comment: None,
        comment_to: None,
    };
    let err = registry.request_for(RpcVersion::V1, 1, &cmd).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
    assert!(err.description().starts_with("parameter #2 'amount'"));

    let cmd = SendManyCmd {
        from_account: "".into(),
        amounts: HashMap::from([("1A".to_string(), f64::INFINITY)]),
        min_conf: None,
        comment: None,
    };
    let err = registry.request_for(RpcVersion::V1, 1, &cmd).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
    assert!(err.description().starts_with("parameter #2 'amounts' key '1A'"));
}

#[test]
fn test_null_params_unmarshal_as_empty() {
    let registry = catalog::chain_server();
    let request =
        Request::from_slice(br#"{"jsonrpc":"1.0","method":"getblockcount","params":null,"id":1}"#).unwrap();
    let decoded = registry.unmarshal_cmd(&request).unwrap();
    assert!(decoded.is::<catalog::GetBlockCountCmd>());
}
