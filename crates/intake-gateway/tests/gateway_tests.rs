// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP routes driven against a real conversation engine.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use intake_agent::Stage;
use intake_core::{ConversationControl, TicketGateway};
use intake_gateway::{AuthConfig, GatewayState, HealthState, build_router};
use intake_test_utils::{GatewayCall, TestHarness};
use tower::ServiceExt;

fn app(h: &TestHarness, bearer_token: Option<&str>) -> Router {
    let control: Arc<dyn ConversationControl> = h.engine.clone();
    let gateway: Arc<dyn TicketGateway> = h.gateway.clone();
    build_router(
        GatewayState {
            control,
            gateway,
            auth: AuthConfig {
                bearer_token: bearer_token.map(str::to_string),
            },
            health: HealthState::default(),
        },
        None,
    )
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_sessions() {
    let h = TestHarness::new().await.unwrap();
    h.send("a@c.us", "Hi").await.unwrap();

    let response = app(&h, Some("secret"))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "intake");
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn ticket_resolved_seeds_confirmation() {
    let h = TestHarness::new().await.unwrap();
    let response = app(&h, None)
        .oneshot(post_json(
            "/webhook/ticket-resolved",
            serde_json::json!({
                "ticketId": "ULI0005",
                "userPhone": "919800000000@c.us",
                "resolution": "Password reset"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);

    assert_eq!(
        h.stage("919800000000@c.us").await,
        Some(Stage::AwaitNumericConfirmation)
    );
    let reply = h.last_reply("919800000000@c.us").await.unwrap();
    assert!(reply.contains("Ticket ID: ULI0005"));
    assert!(reply.contains("Password reset"));
}

#[tokio::test]
async fn ticket_resolved_delivery_failure_is_500() {
    let h = TestHarness::new().await.unwrap();
    h.channel.fail_sends(true);
    let response = app(&h, None)
        .oneshot(post_json(
            "/webhook/ticket-resolved",
            serde_json::json!({"ticketId": "ULI0005", "userPhone": "x@c.us", "resolution": "r"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(response).await["error"].is_string());
    assert!(h.stage("x@c.us").await.is_none());
}

#[tokio::test]
async fn support_resolution_appends_note() {
    let h = TestHarness::new().await.unwrap();
    let response = app(&h, None)
        .oneshot(post_json(
            "/webhook/support-resolution",
            serde_json::json!({"ticketId": "ULI0009", "resolution": "Cache cleared"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Support resolution added successfully");
    assert_eq!(
        h.gateway.calls().await,
        vec![GatewayCall::AppendResolution {
            ticket_id: "ULI0009".into(),
            resolution: "Cache cleared".into(),
        }]
    );
}

#[tokio::test]
async fn support_resolution_failure_is_500() {
    let h = TestHarness::new().await.unwrap();
    h.gateway.set_failing(true);
    let response = app(&h, None)
        .oneshot(post_json(
            "/webhook/support-resolution",
            serde_json::json!({"ticketId": "ULI0009", "resolution": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "Failed to add support resolution"
    );
}

#[tokio::test]
async fn bearer_token_guards_webhooks_and_sessions() {
    let h = TestHarness::new().await.unwrap();
    h.send("a@c.us", "Hi").await.unwrap();
    let app = app(&h, Some("secret"));

    let response = app
        .clone()
        .oneshot(Request::get("/v1/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/webhook/support-resolution",
            serde_json::json!({"ticketId": "ULI0001", "resolution": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.gateway.calls().await.iter().all(|c| !matches!(c, GatewayCall::AppendResolution { .. })));

    let response = app
        .oneshot(
            Request::get("/v1/sessions")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["sessions"][0]["user"], "a@c.us");
    assert_eq!(body["sessions"][0]["stage"], "confirmStart");
}

#[tokio::test]
async fn channel_routes_are_merged() {
    let h = TestHarness::new().await.unwrap();
    let control: Arc<dyn ConversationControl> = h.engine.clone();
    let gateway: Arc<dyn TicketGateway> = h.gateway.clone();
    let extra = Router::new().route("/webhook/chat", axum::routing::get(|| async { "pong" }));
    let app = build_router(
        GatewayState {
            control,
            gateway,
            auth: AuthConfig {
                bearer_token: Some("secret".into()),
            },
            health: HealthState::default(),
        },
        Some(extra),
    );

    let response = app
        .oneshot(Request::get("/webhook/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
