//! `LocalEventBus` 在多线程运行时下的行为：并发请求各自关联、消费者组轮询分担。

use std::time::Duration;

use serde_json::json;
use spark_eventbus::{DeliveryOptions, EventBus, LocalEventBus, ReplyFailureKind, ServiceAddress};

fn spawn_echo(bus: &LocalEventBus, address: &ServiceAddress, tag: &'static str) {
    let mut consumer = bus.consumer(address.clone());
    tokio::spawn(async move {
        while let Some(incoming) = consumer.recv().await {
            let body = incoming.body().clone();
            incoming.reply(json!({ "echo": body, "by": tag }));
        }
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_receive_their_own_replies() {
    let bus = LocalEventBus::new();
    let address = ServiceAddress::new("spark.echo").expect("address");
    spawn_echo(&bus, &address, "a");
    spawn_echo(&bus, &address, "b");

    let mut tasks = Vec::new();
    for n in 0..64 {
        let bus = bus.clone();
        let address = address.clone();
        tasks.push(tokio::spawn(async move {
            let reply = bus
                .send(&address, json!(n), DeliveryOptions::new())
                .await
                .expect("echo reply");
            (n, reply.body)
        }));
    }

    let mut served_by_a = 0;
    for task in tasks {
        let (n, body) = task.await.expect("task");
        assert_eq!(body["echo"], json!(n));
        if body["by"] == json!("a") {
            served_by_a += 1;
        }
    }
    // 两个消费者轮询分担，恰好各占一半。
    assert_eq!(served_by_a, 32);
}

#[tokio::test]
async fn dropped_consumer_leaves_address_without_handlers() {
    let bus = LocalEventBus::new();
    let address = ServiceAddress::new("spark.gone").expect("address");
    let consumer = bus.consumer(address.clone());
    assert!(bus.has_consumers(&address));
    drop(consumer);
    assert!(!bus.has_consumers(&address));

    let failure = bus
        .send(&address, json!({}), DeliveryOptions::new())
        .await
        .expect_err("no handlers");
    assert_eq!(failure.kind, ReplyFailureKind::NoHandlers);
}

#[tokio::test(start_paused = true)]
async fn per_message_timeout_overrides_bus_default() {
    let bus = LocalEventBus::new();
    let address = ServiceAddress::new("spark.slow").expect("address");
    let mut consumer = bus.consumer(address.clone());

    let pending = bus.send(
        &address,
        json!({}),
        DeliveryOptions::new().with_send_timeout(Duration::from_millis(100)),
    );
    let _held = consumer.recv().await.expect("received");
    let started = tokio::time::Instant::now();
    let failure = pending.await.expect_err("timeout");
    assert_eq!(failure.kind, ReplyFailureKind::Timeout);
    assert!(started.elapsed() <= Duration::from_millis(100));
}
