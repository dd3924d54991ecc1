//! Route gateway: merges every endpoint's sub-router and attaches shared
//! state and CORS. `main.rs` and the tests only ever see [`router`].

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;

mod acknowledge;
mod get_data;
mod health;
mod touch;
mod user_details;
mod user_location;
mod user_status;

// ---

pub fn router(state: Arc<AppState>) -> Router {
    // ---
    Router::new()
        .merge(touch::router())
        .merge(get_data::router())
        .merge(user_location::router())
        .merge(user_details::router())
        .merge(user_status::router())
        .merge(acknowledge::router())
        .merge(health::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::device::{Calibration, SignalSource};
    use crate::notify::{LogTransport, Notifier};

    fn test_state() -> Arc<AppState> {
        // Nothing listens on port 9; device polls fall back to defaults
        let device = SignalSource::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/getData",
            "http://127.0.0.1:9/getTouch",
            Duration::from_millis(200),
            Calibration::default(),
        );
        let notifier = Notifier::new(Arc::new(LogTransport), Duration::from_secs(1));
        Arc::new(AppState::new(device, notifier))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_starts_idle_and_unknown() {
        // ---
        let app = router(test_state());
        let req = Request::builder()
            .uri("/api/usr/status")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["state"]["distress"], false);
        assert_eq!(json["state"]["help"], false);
        assert!(json["location"]["latitude"].is_null());
        assert!(json["triggered_at"].as_object().unwrap().is_empty());
        assert!(json.get("last_touch").is_none());
    }

    #[tokio::test]
    async fn test_details_echo_post_mutation_state() {
        // ---
        let state = test_state();
        let app = router(Arc::clone(&state));

        let req = post_json("/api/usr/details", r#"{"distress": false, "help": true}"#);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "User details received");
        assert_eq!(json["state"]["help"], true);
        assert!(state.alerts.record(crate::AlertKind::Help).unwrap().active);
    }

    #[tokio::test]
    async fn test_details_with_wrong_types_is_400() {
        // ---
        let app = router(test_state());
        let req = post_json("/api/usr/details", r#"{"distress": "yes", "help": false}"#);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["status"], "error");
    }

    #[tokio::test]
    async fn test_data_never_fails_when_device_is_down() {
        // ---
        let app = router(test_state());
        let req = Request::builder()
            .uri("/api/data")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["bpm"], 0);
        assert_eq!(json["beat"], false);
        assert_eq!(json["touched"], false);
    }
}
