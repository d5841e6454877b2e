//! 端到端：代理经 `LocalEventBus` 调用挂在同一总线上的内存搜索服务。

use std::sync::Arc;

use serde_json::{Value, json};
use spark_eventbus::{DeliveryOptions, EventBus, ReplyFailureKind};
use spark_service_proxy::{
    ACTION_HEADER, LocalEventBus, ProxyConfig, RemoteError, SearchServiceHandler,
    SearchServiceProxy, ServiceAddress, register_service, search,
};

use crate::support::ADDRESS;

fn bound_proxy(bus: &LocalEventBus) -> SearchServiceProxy {
    SearchServiceProxy::create_proxy(Arc::new(bus.clone()), ADDRESS).expect("合法地址")
}

#[tokio::test]
async fn index_then_search_round_trips_through_the_bus() {
    let bus = LocalEventBus::new();
    let service = search::create(&ProxyConfig::default()).expect("默认配置合法");
    let binding = register_service(
        &bus,
        ServiceAddress::new(ADDRESS).expect("address"),
        Arc::new(SearchServiceHandler::new(Arc::clone(&service))),
    );
    let proxy = bound_proxy(&bus);

    let indexed = proxy
        .index(json!({"docs": [
            {"id": "ark:/1", "title": "Harbor map", "format": "map"},
            {"id": "ark:/2", "title": "Letters", "format": "text"},
        ]}))
        .expect("投递成功")
        .await
        .expect("索引成功");
    assert_eq!(indexed, None);
    assert_eq!(service.len(), 2);

    let found = proxy
        .search(json!({"q": "format:map"}))
        .expect("投递成功")
        .await
        .expect("查询成功");
    assert_eq!(found["responseHeader"]["status"], json!(0));
    assert_eq!(found["response"]["numFound"], json!(1));
    assert_eq!(found["response"]["docs"][0]["id"], json!("ark:/1"));

    let err = proxy
        .index(json!({"title": "no id"}))
        .expect("投递成功")
        .await
        .expect_err("缺少 id 的文档被服务拒绝");
    assert_eq!(err.failure().map(|failure| failure.code), Some(400));
    assert_eq!(service.len(), 2);

    binding.unregister().await;
    assert!(!bus.has_consumers(proxy.address()));
}

#[tokio::test]
async fn missing_service_fails_asynchronously_with_no_handlers() {
    let bus = LocalEventBus::new();
    let proxy = bound_proxy(&bus);

    let call = proxy.search(json!({"q": "*:*"})).expect("无消费者仍属投递成功");
    match call.await {
        Err(RemoteError::Reply { action, failure }) => {
            assert_eq!(action, "search");
            assert_eq!(failure.kind, ReplyFailureKind::NoHandlers);
            assert_eq!(failure.code, -1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn silent_recipient_times_out() {
    let bus = LocalEventBus::new();
    let mut consumer = bus.consumer(ServiceAddress::new(ADDRESS).expect("address"));
    let config = ProxyConfig {
        send_timeout_ms: 250,
        ..ProxyConfig::default()
    };
    let proxy =
        SearchServiceProxy::from_config(Arc::new(bus.clone()), &config).expect("合法配置");

    let call = proxy.search(json!({"q": "*:*"})).expect("投递成功");
    // 持有请求但从不应答。
    let _held = consumer.recv().await.expect("消费者收到请求");

    let err = call.await.expect_err("应当超时");
    let failure = err.failure().expect("传输层失败");
    assert_eq!(failure.kind, ReplyFailureKind::Timeout);
    assert_eq!(failure.code, -1);
}

#[tokio::test]
async fn factory_actions_are_not_dispatched_over_the_bus() {
    let bus = LocalEventBus::new();
    let address = ServiceAddress::new(ADDRESS).expect("address");
    let _binding = register_service(
        &bus,
        address.clone(),
        Arc::new(SearchServiceHandler::new(
            search::create(&ProxyConfig::default()).expect("默认配置合法"),
        )),
    );

    let reply = bus
        .send(
            &address,
            json!({"address": "spark.other"}),
            DeliveryOptions::new().with_header(ACTION_HEADER, "createProxy"),
        )
        .await;
    let failure = reply.expect_err("工厂动作只在本地执行");
    assert_eq!(failure.kind, ReplyFailureKind::RecipientFailure);
    assert_eq!(failure.code, -1);
    assert_eq!(failure.message, "invalid action: createProxy");

    let reply = bus
        .send(&address, Value::Null, DeliveryOptions::new())
        .await;
    assert_eq!(
        reply.expect_err("缺少动作头").message,
        "action not specified"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_through_one_proxy_all_complete() {
    let bus = LocalEventBus::new();
    let service = search::create(&ProxyConfig::default()).expect("默认配置合法");
    let _binding = register_service(
        &bus,
        ServiceAddress::new(ADDRESS).expect("address"),
        Arc::new(SearchServiceHandler::new(Arc::clone(&service))),
    );
    let proxy = bound_proxy(&bus);

    let calls = (0..32)
        .map(|n| proxy.index(json!({"id": n, "kind": "bulk"})).expect("投递成功"))
        .collect::<Vec<_>>();
    for outcome in futures::future::join_all(calls).await {
        assert_eq!(outcome.expect("索引成功"), None);
    }

    let found = proxy
        .search(json!({"q": "kind:bulk", "rows": 5}))
        .expect("投递成功")
        .await
        .expect("查询成功");
    assert_eq!(found["response"]["numFound"], json!(32));
    assert_eq!(found["response"]["docs"].as_array().map(Vec::len), Some(5));
}
