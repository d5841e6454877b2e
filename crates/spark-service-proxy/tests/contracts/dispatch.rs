//! 投递契约：一次合法调用恰好一条信封；非法或关闭后的调用同步失败且零投递。

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use spark_eventbus::testing::ManualEventBus;
use spark_service_proxy::{
    ACTION_HEADER, OperationDescriptor, ParamSpec, ProxyError, ProxyState, ServiceAddress,
    ServiceProxy,
};
use tracing_test::traced_test;

use crate::support::{ADDRESS, manual_proxy};

fn request_fields() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(
        "[a-z]{1,8}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 :*]{0,16}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ],
        0..6,
    )
    .prop_map(|fields| fields.into_iter().collect())
}

proptest! {
    /// 任意合法请求：恰好一条信封，动作头为操作名，消息体只含所传参数。
    #[test]
    fn valid_request_sends_exactly_one_envelope(fields in request_fields(), use_index in any::<bool>()) {
        let (bus, proxy) = manual_proxy();
        let request = Value::Object(fields);

        let action = if use_index {
            let _call = proxy.index(request.clone()).expect("合法请求应被投递");
            "index"
        } else {
            let _call = proxy.search(request.clone()).expect("合法请求应被投递");
            "search"
        };

        let sent = bus.take_all();
        prop_assert_eq!(sent.len(), 1);
        prop_assert_eq!(sent[0].address.as_str(), ADDRESS);
        prop_assert_eq!(sent[0].headers.get(ACTION_HEADER), Some(action));
        let param = if use_index { "document" } else { "query" };
        let mut expected = Map::new();
        expected.insert(param.to_owned(), request);
        prop_assert_eq!(&sent[0].body, &Value::Object(expected));
    }
}

#[test]
fn malformed_requests_are_rejected_without_sending() {
    let (bus, proxy) = manual_proxy();
    for request in [
        Value::Null,
        json!([{"q": "*:*"}]),
        json!("q=*:*"),
        json!(42),
        json!(true),
    ] {
        let err = proxy.search(request.clone()).expect_err("非对象请求必须被拒绝");
        assert!(err.is_invalid_arguments(), "{request} 应触发 InvalidArguments");
        let err = proxy.index(request).expect_err("非对象请求必须被拒绝");
        assert_eq!(err.code(), "spark.proxy.invalid_arguments");
    }
    assert_eq!(bus.pending(), 0);
}

#[test]
fn wrong_arity_is_rejected_without_sending() {
    const SEARCH: OperationDescriptor =
        OperationDescriptor::new("search", &[ParamSpec::object("query")]);
    let bus = ManualEventBus::new();
    let proxy = ServiceProxy::new(
        Arc::new(bus.clone()),
        ServiceAddress::new(ADDRESS).expect("address"),
    );

    let err = proxy.invoke::<Value>(&SEARCH, vec![]).expect_err("缺少参数");
    assert!(matches!(err, ProxyError::InvalidArguments { ref action, .. } if action == "search"));

    let err = proxy
        .invoke::<Value>(&SEARCH, vec![json!({}), json!({})])
        .expect_err("多余参数");
    assert!(err.is_invalid_arguments());
    assert_eq!(bus.pending(), 0);
}

#[traced_test]
#[test]
fn closed_proxy_rejects_every_call_without_sending() {
    let (bus, proxy) = manual_proxy();
    assert!(proxy.close());
    assert!(!proxy.close(), "关闭只发生一次");
    assert_eq!(proxy.state(), ProxyState::Closed);

    let err = proxy.search(json!({"q": "*:*"})).expect_err("关闭后必须拒绝");
    assert!(err.is_closed());
    assert_eq!(err.code(), "spark.proxy.closed");
    let err = proxy.index(json!({"id": "a"})).expect_err("关闭后必须拒绝");
    assert!(err.is_closed());

    // 参数校验先于生命周期检查。
    let err = proxy.search(Value::Null).expect_err("非法参数");
    assert!(err.is_invalid_arguments());

    assert_eq!(bus.pending(), 0);
    assert!(logs_contain("call on closed proxy"));
}
