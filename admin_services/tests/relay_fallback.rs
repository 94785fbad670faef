mod common;
use common::*;

use admin_services::prelude::*;
use dispatch_core::prelude::*;
use dispatch_test_support::*;
use http::StatusCode;
use http::HeaderValue;
use http::header::HeaderName;
use serde_json::json;

#[tokio::test]
async fn relay_success_matches_direct_success() {
    let body = json!({ "id": 1, "name": "ops", "code": "OPS" });

    let (relay, relay_h) = MockRelay::replying(RelayResult::ok(body.clone()));
    let (t, h) = mock().build();
    let via_relay = services(t, relay_of(&relay))
        .roles
        .get_role_by_id(1)
        .await
        .unwrap();
    h.assert_recorded_len(0);
    assert_eq!(relay_h.calls(), 1);

    let (t, h) = mock().reply(MockReply::ok_json(json_bytes(&body))).build();
    let via_direct = services(t, None).roles.get_role_by_id(1).await.unwrap();
    h.assert_recorded_len(1);

    assert_eq!(via_relay, via_direct);
}

#[tokio::test]
async fn relay_serves_role_by_id() {
    let (relay, relay_h) = MockRelay::replying(RelayResult::ok(json!({ "id": 1, "name": "ops" })));
    let (t, h) = mock().build();
    let role = services(t, relay_of(&relay))
        .roles
        .get_role_by_id(1)
        .await
        .unwrap();

    assert_eq!(role.id, 1);
    assert_eq!(role.name, "ops");
    h.finish();

    let env = &relay_h.envelopes()[0];
    assert_eq!(env.service, "admin");
    assert_eq!(env.config.method, RequestMethod::Get);
    assert_eq!(env.config.url, "https://admin.local/api/roles/1");
    assert_eq!(env.config.headers.get("accept").map(String::as_str), Some("application/json"));
    assert_eq!(env.config.body, None);
    assert_eq!(env.config.timeout, None);
}

#[tokio::test]
async fn relay_structured_failure_is_terminal() {
    let (relay, relay_h) = MockRelay::replying(RelayResult::failed("role not found", Some(404)));
    let (t, h) = mock().build();
    let err = services(t, relay_of(&relay))
        .roles
        .get_role_by_id(9)
        .await
        .unwrap_err();

    assert_eq!(err.message(), "role not found");
    assert_eq!(err.code(), 0);
    assert_eq!(err.http_status(), 404);
    assert_eq!(err.kind(), ErrorKind::RelayFailure);
    assert_eq!(relay_h.calls(), 1);
    h.assert_recorded_len(0);
}

#[tokio::test]
async fn relay_failure_without_details_uses_defaults() {
    let (relay, _relay_h) = MockRelay::replying(RelayResult {
        success: false,
        ..RelayResult::default()
    });
    let (t, h) = mock().build();
    let err = services(t, relay_of(&relay))
        .users
        .get_user_by_id(3)
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Proxy request failed");
    assert_eq!(err.code(), 0);
    assert_eq!(err.http_status(), 0);
    h.assert_recorded_len(0);
}

#[tokio::test]
async fn unavailable_relay_falls_back_once_with_same_request() {
    let (relay, relay_h) = MockRelay::unavailable("ipc bridge missing");
    let (t, h) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!({ "id": 5, "name": "auditor" }))))
        .build();
    let svc = services(t, relay_of(&relay));

    let role = svc
        .roles
        .create_role(&CreateRole {
            name: "auditor".into(),
            code: "AUDIT".into(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(role.id, 5);

    h.assert_recorded_len(1);
    let env = &relay_h.envelopes()[0];
    let req = &h.recorded()[0];

    assert_eq!(req.method, env.config.method);
    assert_eq!(req.url.as_str(), env.config.url);
    for (name, value) in &env.config.headers {
        assert_request(req).header(HeaderName::from_bytes(name.as_bytes()).unwrap(), value);
    }
    assert_eq!(req.headers.len(), env.config.headers.len());
    assert_eq!(
        req.body_json(),
        env.config.body.as_deref().map(|b| serde_json::from_str(b).unwrap())
    );
    assert_request(req)
        .method(RequestMethod::Post)
        .path("/api/roles")
        .header("content-type", "application/json")
        .body_json(&json!({ "name": "auditor", "code": "AUDIT" }));
}

#[tokio::test]
async fn unavailable_relay_then_404_surfaces_direct_failure() {
    let (relay, _relay_h) = MockRelay::unavailable("ReferenceError: bridge is not defined");
    let (t, h) = mock().reply(MockReply::status(StatusCode::NOT_FOUND)).build();
    let err = services(t, relay_of(&relay))
        .roles
        .get_role_by_id(404)
        .await
        .unwrap_err();

    assert_eq!(err.message(), "HTTP error! status: 404");
    assert_eq!(err.http_status(), 404);
    assert_eq!(err.code(), 0);
    assert_eq!(err.kind(), ErrorKind::HttpFailure);
    h.assert_recorded_len(1);
}

#[tokio::test]
async fn unserializable_request_skips_relay_and_goes_direct() {
    let (relay, relay_h) = MockRelay::new(Vec::<RelayScript>::new());
    let (t, h) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!({ "id": 1, "name": "ops" }))))
        .build();
    let mut svc = services(t, relay_of(&relay));
    // obs-text is legal on the wire but has no string form for the envelope
    svc.roles.add_request_interceptor(map_request(|mut d: RequestDescriptor| {
        d.headers.insert(
            HeaderName::from_static("x-name"),
            HeaderValue::from_bytes("José".as_bytes()).unwrap(),
        );
        Ok(d)
    }));

    let role = svc.roles.get_role_by_id(1).await.unwrap();
    assert_eq!(role.name, "ops");

    assert_eq!(relay_h.calls(), 0);
    h.assert_recorded_len(1);
    let req = &h.recorded()[0];
    assert_eq!(req.headers.get("x-name").unwrap().as_bytes(), "José".as_bytes());
    assert_request(req).method(RequestMethod::Get).path("/api/roles/1");
}

#[tokio::test]
async fn closed_channel_relay_falls_back() {
    let (relay, rx) = ChannelRelay::new(4);
    drop(rx);
    assert!(relay.is_closed());

    let (t, h) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!([{ "id": 1, "name": "ops" }]))))
        .build();
    let roles = services(t, Some(std::sync::Arc::new(relay)))
        .roles
        .get_all_roles()
        .await
        .unwrap();
    assert_eq!(roles.len(), 1);
    assert_request(&h.recorded()[0]).path("/api/roles/all");
}

#[tokio::test]
async fn channel_relay_serves_and_forwards_timeout() {
    let (relay, mut rx) = ChannelRelay::new(4);
    let bridge = tokio::spawn(async move {
        let call = rx.recv().await.unwrap();
        let env = call.envelope.clone();
        call.respond(RelayResult::ok(json!({ "items": [], "total": 0 })));
        env
    });

    let (t, h) = mock().build();
    let c = client(
        config_with_timeout(std::time::Duration::from_millis(1500)),
        t,
        Some(std::sync::Arc::new(relay)),
    );
    let page: Page<User> = c
        .get("/users", RequestOptions::new().query("page", 2))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    h.finish();

    let env = bridge.await.unwrap();
    assert_eq!(env.config.timeout, Some(1500));
    assert_eq!(env.config.url, "https://admin.local/api/users?page=2");
}

#[tokio::test]
async fn relay_dropping_the_call_falls_back() {
    let (relay, mut rx) = ChannelRelay::new(1);
    tokio::spawn(async move {
        // received, never answered
        let _ = rx.recv().await;
    });

    let (t, h) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!({ "id": 2, "username": "kim" }))))
        .build();
    let user = services(t, Some(std::sync::Arc::new(relay)))
        .users
        .get_user_by_id(2)
        .await
        .unwrap();
    assert_eq!(user.username, "kim");
    h.assert_recorded_len(1);
}
