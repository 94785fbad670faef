mod common;
use common::*;

use dispatch_core::prelude::*;
use dispatch_test_support::*;
use serde_json::{Value, json};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn hanging_direct_call_times_out_and_is_aborted() {
    let (t, h) = mock().reply(MockReply::hang()).build();
    let c = client(config_with_timeout(Duration::from_millis(50)), t, None);

    let started = tokio::time::Instant::now();
    let err = c
        .get::<Value>("/users/1", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 408);
    assert_eq!(err.code(), -1);
    assert_eq!(err.message(), "Request timeout");
    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_millis(50));

    h.assert_recorded_len(1);
    assert_eq!(h.aborted(), 1);
    assert_request(&h.recorded()[0]).timeout(Some(Duration::from_millis(50)));
}

#[tokio::test(start_paused = true)]
async fn response_before_deadline_wins() {
    let (t, h) = mock()
        .reply(MockReply::delayed_json(
            Duration::from_millis(20),
            json_bytes(&json!({ "id": 1 })),
        ))
        .build();
    let c = client(config_with_timeout(Duration::from_millis(50)), t, None);

    let v: Value = c.get("/users/1", RequestOptions::new()).await.unwrap();
    assert_eq!(v, json!({ "id": 1 }));
    assert_eq!(h.aborted(), 0);

    // a late deadline must not fire into anything once the call is done
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.aborted(), 0);
}

#[tokio::test(start_paused = true)]
async fn call_site_timeout_overrides_service_default() {
    let (t, h) = mock()
        .replies([
            MockReply::delayed_json(Duration::from_millis(80), json_bytes(&json!(null))),
            MockReply::delayed_json(Duration::from_millis(80), json_bytes(&json!(null))),
            MockReply::hang(),
        ])
        .build();
    let c = client(config_with_timeout(Duration::from_millis(50)), t, None);

    // extended deadline: succeeds
    let v: Value = c
        .get("/slow", RequestOptions::new().timeout(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(v, Value::Null);

    // deadline removed: succeeds
    let v: Value = c
        .get("/slow", RequestOptions::new().clear_timeout())
        .await
        .unwrap();
    assert_eq!(v, Value::Null);

    // shortened deadline
    let err = c
        .get::<Value>("/slow", RequestOptions::new().timeout(Duration::from_millis(10)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestTimeout);

    let reqs = h.recorded();
    assert_request(&reqs[0]).timeout(Some(Duration::from_millis(100)));
    assert_request(&reqs[1]).timeout(None);
    assert_request(&reqs[2]).timeout(Some(Duration::from_millis(10)));
    assert_eq!(h.aborted(), 1);
}

#[tokio::test(start_paused = true)]
async fn relay_path_only_forwards_the_timeout() {
    let (relay, relay_h) = MockRelay::replying(RelayResult::ok(json!({ "ok": true })));
    let (t, h) = mock().build();
    let c = client(
        config_with_timeout(Duration::from_millis(50)),
        t,
        relay_of(&relay),
    );

    let v: Value = c.get("/ping", RequestOptions::new()).await.unwrap();
    assert_eq!(v, json!({ "ok": true }));
    assert_eq!(relay_h.envelopes()[0].config.timeout, Some(50));
    h.finish();
}
