//! End-to-end routing through a live router and echo backends.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use segment_router::admin::setup_admin_router;
use segment_router::classify::{ClassifierRegistry, Orchestrator};
use segment_router::config::{RouterConfig, SegmentMapping};
use segment_router::http::HttpServer;
use segment_router::lifecycle::{register_classifiers, Collaborators};
use segment_router::segment::SegmentMarker;
use segment_router::services::{SchemaDirectory, ShareToken};

mod common;
use common::{backend, context, DownDirectory};

const BASE: &str = "00112233445566778899aabbccddeeff";

async fn segmented_config() -> RouterConfig {
    let a = common::start_echo_backend("a").await;
    let b = common::start_echo_backend("b").await;
    let web = common::start_echo_backend("web").await;

    let mut config = RouterConfig::default();
    config.observability.metrics_enabled = false;
    config.backends = vec![
        backend("a1", "node-a", a),
        backend("b1", "node-b", b),
        backend("w1", "web", web),
    ];
    config.segments.default_group = "web".into();
    config.segments.mappings = vec![
        SegmentMapping { schema: "db42".into(), group: "node-a".into() },
        SegmentMapping { schema: "db7".into(), group: "node-b".into() },
    ];
    config.contexts = vec![context(42, "db42"), context(7, "db7"), context(8, "db-unmapped")];
    config
}

fn pipeline(config: &RouterConfig, directory: Arc<dyn SchemaDirectory>) -> Orchestrator {
    let registry = Arc::new(ClassifierRegistry::new());
    register_classifiers(&registry, &config.classifiers, &Collaborators::local(directory));
    Orchestrator::new(registry)
}

fn share_url(addr: std::net::SocketAddr, context_id: u32, user_id: u32) -> String {
    let token = ShareToken::new(context_id, user_id, BASE).unwrap();
    format!("http://{addr}/share/{token}/report.pdf")
}

#[tokio::test]
async fn test_requests_reach_their_segment() {
    let config = segmented_config().await;
    let directory = Arc::new(segment_router::services::StaticSchemaDirectory::from_config(&config.contexts));
    let server = HttpServer::new(config.clone(), pipeline(&config, directory.clone()))
        .with_directory(directory);
    let router = common::spawn_router(server).await;
    let client = common::client();

    let marker42 = SegmentMarker::new("db42").unwrap().encode();
    let res = client.get(share_url(router.addr, 42, 9)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), format!("a|{marker42}|42|9"));

    let marker7 = SegmentMarker::new("db7").unwrap().encode();
    let res = client.get(share_url(router.addr, 7, 1)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), format!("b|{marker7}|7|1"));

    // Resolved but unmapped schemas fall back to the default group, marker intact.
    let unmapped = SegmentMarker::new("db-unmapped").unwrap().encode();
    let res = client.get(share_url(router.addr, 8, 2)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), format!("web|{unmapped}|8|2"));

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_unresolved_requests_use_default_group_without_spoofed_headers() {
    let config = segmented_config().await;
    let directory = Arc::new(segment_router::services::StaticSchemaDirectory::from_config(&config.contexts));
    let server = HttpServer::new(config.clone(), pipeline(&config, directory));
    let router = common::spawn_router(server).await;
    let client = common::client();

    let spoofed = SegmentMarker::new("db7").unwrap().encode();
    let res = client
        .get(format!("http://{}/index.html", router.addr))
        .header("x-segment-marker", &spoofed)
        .header("x-segment-context", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "web|-|-|-");

    let res = client
        .get(format!("http://{}/api/files", router.addr))
        .bearer_auth("no-provider-configured")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "web|-|-|-");

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_directory_fault_is_generic_503() {
    let config = segmented_config().await;
    let server = HttpServer::new(config.clone(), pipeline(&config, Arc::new(DownDirectory)));
    let router = common::spawn_router(server).await;

    let res = common::client().get(share_url(router.addr, 42, 9)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.text().await.unwrap();
    assert!(!body.contains("42"));
    assert!(!body.contains("db42"));

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_moves_segment_and_updates_directory() {
    let config = segmented_config().await;
    let directory = Arc::new(segment_router::services::StaticSchemaDirectory::from_config(&config.contexts));
    let server = HttpServer::new(config.clone(), pipeline(&config, directory.clone()))
        .with_directory(directory);
    let router = common::spawn_router(server).await;
    let client = common::client();

    let mut next = config.clone();
    next.segments.mappings[0].group = "node-b".into();
    next.contexts.push(context(99, "db7"));
    router.reload.send(next).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let marker42 = SegmentMarker::new("db42").unwrap().encode();
    let res = client.get(share_url(router.addr, 42, 9)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), format!("b|{marker42}|42|9"));

    let marker7 = SegmentMarker::new("db7").unwrap().encode();
    let res = client.get(share_url(router.addr, 99, 4)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), format!("b|{marker7}|99|4"));

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_api_requires_key_and_lists_classifiers() {
    let mut config = segmented_config().await;
    config.admin.api_key = "secret".into();
    let directory = Arc::new(segment_router::services::StaticSchemaDirectory::from_config(&config.contexts));
    let server = HttpServer::new(config.clone(), pipeline(&config, directory));
    let admin = setup_admin_router(server.state());

    let denied = admin
        .clone()
        .oneshot(Request::get("/admin/classifiers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let res = admin
        .clone()
        .oneshot(
            Request::get("/admin/classifiers")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["sso-callback", "share-link", "oauth-bearer", "basic-auth"]);

    let res = admin
        .oneshot(
            Request::get("/admin/segments")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let segments: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(segments["default_group"], "web");
    assert_eq!(segments["mappings"]["db7"], "node-b");
}

#[tokio::test]
async fn test_admin_api_manages_basic_auth_paths() {
    let mut config = segmented_config().await;
    config.admin.api_key = "secret".into();
    let directory = Arc::new(segment_router::services::StaticSchemaDirectory::from_config(&config.contexts));
    let registry = Arc::new(ClassifierRegistry::new());
    let installed = register_classifiers(&registry, &config.classifiers, &Collaborators::local(directory));
    let basic_auth = installed.basic_auth.unwrap();

    let without_paths = HttpServer::new(config.clone(), Orchestrator::new(registry.clone()));
    let res = setup_admin_router(without_paths.state())
        .oneshot(
            Request::get("/admin/paths")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let server = HttpServer::new(config, Orchestrator::new(registry)).with_protocol_paths(basic_auth.clone());
    let admin = setup_admin_router(server.state());
    let send = |method: &str, uri: &str, body: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer secret")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let res = admin
        .clone()
        .oneshot(send("POST", "/admin/paths", r#"{"prefix":"/ews","client":"ews"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(basic_auth.paths().iter().any(|p| p.prefix == "/ews" && p.client == "ews"));

    let res = admin
        .clone()
        .oneshot(send("POST", "/admin/paths", r#"{"prefix":"ews","client":"ews"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = admin.clone().oneshot(send("GET", "/admin/paths", "")).await.unwrap();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 4);

    let res = admin
        .clone()
        .oneshot(send("DELETE", "/admin/paths?prefix=/carddav", ""))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(basic_auth.paths().iter().all(|p| p.prefix != "/carddav"));

    let res = admin
        .oneshot(send("DELETE", "/admin/paths?prefix=/carddav", ""))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
