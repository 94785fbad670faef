use admin_services::prelude::*;
use dispatch_core::prelude::*;
use dispatch_test_support::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn services_for(server: &MockServer, timeout: Option<Duration>) -> AdminServices {
    let mut b = ServiceConfig::builder("admin", format!("{}/api", server.uri()));
    if let Some(t) = timeout {
        b = b.timeout(t);
    }
    AdminServices::new(b.build().unwrap(), None)
}

#[tokio::test]
async fn direct_get_decodes_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/roles/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "ops" })))
        .expect(1)
        .mount(&server)
        .await;

    let role = services_for(&server, None)
        .roles
        .get_role_by_id(1)
        .await
        .unwrap();
    assert_eq!(role.name, "ops");
}

#[tokio::test]
async fn direct_post_sends_json_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(json!({ "username": "ana", "password": "pw" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "code": 0,
            "message": "created",
            "data": { "id": 9, "username": "ana" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut svc = services_for(&server, None);
    svc.add_request_interceptor(|| bearer_auth(SecretString::new("t0k")));
    svc.add_response_interceptor(unwrap_envelope);

    let user = svc
        .users
        .create_user(&CreateUser {
            username: "ana".into(),
            password: "pw".into(),
            nickname: None,
            email: None,
            phone: None,
            role_ids: vec![],
        })
        .await
        .unwrap();
    assert_eq!(user.id, 9);
}

#[tokio::test]
async fn list_query_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "3"))
        .and(query_param("keyword", "a&b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [], "total": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    let page = services_for(&server, None)
        .users
        .list_users(&ListQuery::new().page(3, 10).keyword("a&b"))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn unavailable_relay_falls_back_to_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/roles/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such role"))
        .expect(1)
        .mount(&server)
        .await;

    let (relay, relay_h) = MockRelay::unavailable("bridge not loaded");
    let cfg = ServiceConfig::builder("admin", format!("{}/api", server.uri()))
        .build()
        .unwrap();
    let svc = AdminServices::new(cfg, Some(relay as Arc<dyn RelayChannel>));

    let err = svc.roles.get_role_by_id(404).await.unwrap_err();
    assert_eq!(err.message(), "HTTP error! status: 404");
    assert_eq!(err.http_status(), 404);
    assert_eq!(err.body(), Some("no such role"));
    assert_eq!(relay_h.calls(), 1);
}

#[tokio::test]
async fn slow_server_hits_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permissions/tree"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let err = services_for(&server, Some(Duration::from_millis(100)))
        .permissions
        .get_permission_tree()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestTimeout);
    assert_eq!((err.code(), err.http_status()), (-1, 408));
    assert!(started.elapsed() < Duration::from_secs(4));
}
