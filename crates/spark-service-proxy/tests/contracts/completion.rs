//! 完成契约：应答恰好交付一次、剥去消息框架、按各自槽位关联，且不受关闭影响。

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde_json::{Map, Value, json};
use spark_eventbus::ReplyFailureKind;
use spark_service_proxy::RemoteError;
use tokio::sync::mpsc;

use crate::support::manual_proxy;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn success_reply_invokes_callback_once_with_unwrapped_body() {
    let (bus, proxy) = manual_proxy();
    let invocations = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let counter = Arc::clone(&invocations);
    let handle = proxy
        .search(json!({"q": "*:*"}))
        .expect("投递成功")
        .on_complete(move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        });

    let sent = bus.take_next().expect("已投递");
    sent.responder
        .reply(json!({"response": {"numFound": 0, "docs": []}}));

    handle.await.expect("回调任务正常结束");
    let outcome = rx.recv().await.expect("回调已触发");
    assert_eq!(
        outcome.expect("成功结果"),
        object(json!({"response": {"numFound": 0, "docs": []}}))
    );
    assert!(rx.recv().await.is_none(), "回调只能触发一次");
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_reply_invokes_callback_once_with_error() {
    let (bus, proxy) = manual_proxy();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = proxy
        .index(json!({"id": "ark:/1"}))
        .expect("投递成功")
        .on_complete(move |outcome| {
            let _ = tx.send(outcome);
        });

    bus.take_next()
        .expect("已投递")
        .responder
        .fail(503, "Service Unavailable");

    handle.await.expect("回调任务正常结束");
    let err = rx.recv().await.expect("回调已触发").expect_err("失败结果");
    let failure = err.failure().expect("远端失败");
    assert_eq!(failure.kind, ReplyFailureKind::RecipientFailure);
    assert_eq!(failure.code, 503);
    assert_eq!(failure.message, "Service Unavailable");
    assert_eq!(err.action(), "index");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn concurrent_calls_resolve_independently_of_reply_order() {
    let (bus, proxy) = manual_proxy();

    let first = proxy.search(json!({"q": "id:a"})).expect("第一次投递");
    let second = proxy.search(json!({"q": "id:b"})).expect("第二次投递");
    let mut sent = bus.take_all();
    assert_eq!(sent.len(), 2);
    let second_sent = sent.pop().expect("第二条");
    let first_sent = sent.pop().expect("第一条");
    assert_eq!(second_sent.body, json!({"query": {"q": "id:b"}}));

    // 先应答后投递的调用。
    second_sent.responder.reply(json!({"hit": "b"}));
    let second_result = second.await.expect("第二次调用成功");
    assert_eq!(second_result, object(json!({"hit": "b"})));

    first_sent.responder.reply(json!({"hit": "a"}));
    let first_result = first.await.expect("第一次调用成功");
    assert_eq!(first_result, object(json!({"hit": "a"})));
}

#[tokio::test]
async fn closing_does_not_affect_calls_dispatched_before() {
    let (bus, proxy) = manual_proxy();
    let in_flight = proxy.search(json!({"q": "*:*"})).expect("关闭前投递");

    proxy.close();
    assert!(proxy.search(json!({"q": "*:*"})).is_err());

    let sent = bus.take_all();
    assert_eq!(sent.len(), 1, "关闭后的调用不得投递");
    for message in sent {
        message.responder.reply(json!({"still": "delivered"}));
    }
    assert_eq!(
        in_flight.await.expect("在途调用照常完成"),
        object(json!({"still": "delivered"}))
    );
}

#[tokio::test]
async fn undecodable_reply_is_delivered_asynchronously() {
    let (bus, proxy) = manual_proxy();
    let call = proxy.search(json!({"q": "*:*"})).expect("投递成功");
    bus.take_next().expect("已投递").responder.reply(json!([1, 2, 3]));

    match call.await {
        Err(RemoteError::MalformedReply { action, .. }) => assert_eq!(action, "search"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn index_reply_without_body_resolves_to_none() {
    let (bus, proxy) = manual_proxy();
    let call = proxy.index(json!({"id": "a"})).expect("投递成功");
    bus.take_next().expect("已投递").responder.reply(Value::Null);
    assert_eq!(call.await.expect("索引成功"), None);
}
