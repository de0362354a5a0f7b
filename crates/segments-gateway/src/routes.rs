//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use segments_control::SegmentsApi;

use crate::handlers::{health, memberships, segments, users};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
///
/// ## Users
/// - `POST /v1/users` - Create user
/// - `GET /v1/users/:user_id` - Get user
/// - `DELETE /v1/users/:user_id` - Delete user
///
/// ## Segments
/// - `POST /v1/segments` - Create segment, optionally auto-assigning users
/// - `GET /v1/segments/:segment_name` - Get segment
/// - `DELETE /v1/segments/:segment_name` - Delete segment
///
/// ## Memberships
/// - `GET /v1/users/:user_id/segments` - Active segments
/// - `POST /v1/users/:user_id/segments` - Remove and add segments
/// - `POST /v1/users/:user_id/segments/ttl` - Assign a segment for some hours
/// - `GET /v1/users/:user_id/history` - History report as CSV
pub fn create_router<C>(state: GatewayState<C>) -> Router
where
    C: SegmentsApi + 'static,
{
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health))
        // Users
        .route("/v1/users", post(users::create_user::<C>))
        .route(
            "/v1/users/:user_id",
            get(users::get_user::<C>).delete(users::delete_user::<C>),
        )
        // Segments
        .route("/v1/segments", post(segments::create_segment::<C>))
        .route(
            "/v1/segments/:segment_name",
            get(segments::get_segment::<C>).delete(segments::delete_segment::<C>),
        )
        // Memberships
        .route(
            "/v1/users/:user_id/segments",
            get(memberships::active_segments::<C>).post(memberships::reassign::<C>),
        )
        .route(
            "/v1/users/:user_id/segments/ttl",
            post(memberships::assign_with_ttl::<C>),
        )
        .route("/v1/users/:user_id/history", get(memberships::history::<C>))
        // Middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors)
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::Duration;
    use segments_control::{ControlConfig, SegmentService};
    use segments_core::{Clock, ManualClock, NamePolicy};
    use segments_store::{RocksStore, StoreOptions};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::config::GatewayConfig;

    struct Harness {
        server: TestServer,
        clock: Arc<ManualClock>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let options = StoreOptions {
            clock: clock.clone(),
            ..Default::default()
        };
        let store = Arc::new(RocksStore::open_with(dir.path(), options).unwrap());
        let control = Arc::new(SegmentService::new(
            store,
            clock.clone(),
            ControlConfig::seeded(7),
        ));
        let state = GatewayState::new(control, NamePolicy::default(), GatewayConfig::default());
        let server = TestServer::new(create_router(state)).unwrap();

        Harness {
            server,
            clock,
            _dir: dir,
        }
    }

    async fn create_user(server: &TestServer, name: &str) -> i64 {
        let response = server.post("/v1/users").json(&json!({ "name": name })).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()["user_id"].as_i64().unwrap()
    }

    async fn create_segment(server: &TestServer, name: &str) {
        let response = server
            .post("/v1/segments")
            .json(&json!({ "name": name }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    #[test]
    fn cors_specific_origins() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "https://app.example.com".to_string(),
        ];
        let _layer = build_cors_layer(&origins);
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let h = harness();
        let response = h.server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn user_lifecycle() {
        let h = harness();
        let id = create_user(&h.server, "alice").await;

        let response = h.server.get(&format!("/v1/users/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["name"], "alice");

        let response = h.server.delete(&format!("/v1/users/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = h.server.delete(&format!("/v1/users/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn invalid_requests_are_bad_requests() {
        let h = harness();

        let response = h.server.post("/v1/users").json(&json!({ "name": "al" })).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["message"],
            "bad request: field name is too short (minimum 4 characters)"
        );

        let response = h.server.get("/v1/users/abc").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = h
            .server
            .post("/v1/users")
            .text("{not json")
            .content_type("application/json")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_segment_conflicts() {
        let h = harness();
        create_segment(&h.server, "vip users").await;

        let response = h
            .server
            .post("/v1/segments")
            .json(&json!({ "name": "VIP USERS" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        let response = h.server.get("/v1/segments/Vip%20Users").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["name"], "VIP_USERS");
    }

    #[tokio::test]
    async fn long_description_rejected() {
        let h = harness();
        let response = h
            .server
            .post("/v1/segments")
            .json(&json!({ "name": "wordy", "description": "x".repeat(65_537) }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = h.server.get("/v1/segments/WORDY").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_segment_with_percent_enrolls_users() {
        let h = harness();
        let mut ids = Vec::new();
        for name in ["user-one", "user-two", "user-three"] {
            ids.push(create_user(&h.server, name).await);
        }

        let response = h
            .server
            .post("/v1/segments")
            .json(&json!({ "name": "everyone", "percent": 100 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["assigned_user_ids"], json!(ids));

        let response = h.server.get(&format!("/v1/users/{}/segments", ids[0])).await;
        assert_eq!(response.json::<Value>()["segments"], json!(["EVERYONE"]));

        let response = h
            .server
            .post("/v1/segments")
            .json(&json!({ "name": "too many", "percent": 150 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let response = h.server.get("/v1/segments/TOO_MANY").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reassign_and_list() {
        let h = harness();
        let id = create_user(&h.server, "alice").await;
        create_segment(&h.server, "beta testers").await;
        create_segment(&h.server, "vip users").await;

        let path = format!("/v1/users/{id}/segments");
        let response = h.server.get(&path).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = h
            .server
            .post(&path)
            .json(&json!({ "to_add": ["beta testers", "vip users"], "to_delete": [] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.json::<Value>()["memberships"]
                .as_array()
                .unwrap()
                .len(),
            2
        );

        let response = h
            .server
            .post(&path)
            .json(&json!({ "to_add": [], "to_delete": ["BETA_TESTERS"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = h.server.get(&path).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["segments"], json!(["VIP_USERS"]));
    }

    #[tokio::test]
    async fn reassign_checks_segments_first() {
        let h = harness();
        let id = create_user(&h.server, "alice").await;
        create_segment(&h.server, "vip users").await;

        let response = h
            .server
            .post(&format!("/v1/users/{id}/segments"))
            .json(&json!({ "to_add": ["vip users", "missing segment"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let response = h.server.get(&format!("/v1/users/{id}/segments")).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = h
            .server
            .post("/v1/users/999/segments")
            .json(&json!({ "to_add": ["vip users"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ttl_membership_expires() {
        let h = harness();
        let id = create_user(&h.server, "alice").await;
        create_segment(&h.server, "Vip Users").await;

        let response = h
            .server
            .post(&format!("/v1/users/{id}/segments/ttl"))
            .json(&json!({ "segment_name": "VIP_USERS", "ttl": 1 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.json::<Value>()["expire_at"].is_string());

        let response = h.server.get(&format!("/v1/users/{id}/segments")).await;
        assert_eq!(response.json::<Value>()["segments"], json!(["VIP_USERS"]));

        h.clock.advance(Duration::hours(2));
        let response = h.server.get(&format!("/v1/users/{id}/segments")).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = h
            .server
            .post(&format!("/v1/users/{id}/segments/ttl"))
            .json(&json!({ "segment_name": "VIP_USERS", "ttl": 0 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_downloads_csv() {
        let h = harness();
        let id = create_user(&h.server, "alice").await;
        create_segment(&h.server, "vip users").await;
        let from = h.clock.now() - Duration::minutes(1);

        let path = format!("/v1/users/{id}/segments");
        let response = h
            .server
            .post(&path)
            .json(&json!({ "to_add": ["vip users"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        h.clock.advance(Duration::seconds(5));
        let response = h
            .server
            .post(&path)
            .json(&json!({ "to_delete": ["vip users"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let to = h.clock.now() + Duration::minutes(1);

        let response = h
            .server
            .get(&format!("/v1/users/{id}/history"))
            .add_query_param("from", from.to_rfc3339())
            .add_query_param("to", to.to_rfc3339())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.header("content-disposition"),
            "attachment;filename=report.csv"
        );

        let body = response.text();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines[0], "user_id,segment_name,action_type,action_date");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(&format!("{id},VIP_USERS,inserted,")));
        assert!(lines[2].starts_with(&format!("{id},VIP_USERS,deleted,")));

        let response = h
            .server
            .get(&format!("/v1/users/{id}/history"))
            .add_query_param("from", "yesterday")
            .add_query_param("to", to.to_rfc3339())
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
