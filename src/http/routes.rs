//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::session::Session;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions", get(sessions_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.client_origin.as_deref()))
        .with_state(state)
}

/// CORS for the browser client; any origin unless an allow-list is configured
fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match client_origin {
        Some(origins) => {
            // Support multiple origins (comma-separated in CLIENT_ORIGIN)
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
                .collect();
            cors.allow_origin(allowed)
        }
        None => cors.allow_origin(Any),
    }
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connections: usize,
    lobby_count: usize,
    match_in_progress: bool,
    roster_size: usize,
    matches_played: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: state.sessions.len(),
        lobby_count: state.stats.lobby_count(),
        match_in_progress: state.stats.match_in_progress(),
        roster_size: state.stats.roster_size(),
        matches_played: state.stats.matches_played(),
    })
}

// ============================================================================
// Session listing
// ============================================================================

async fn sessions_handler(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.sessions.list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::{Config, GameConfig};
    use crate::session::SessionPhase;
    use crate::ws::protocol::ClientMsg;

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            client_origin: None,
            input_rate_limit: 120,
            game: GameConfig::default(),
        }
    }

    async fn get_json(router: Router, uri: &str) -> serde_json::Value {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_idle_server() {
        let state = AppState::new(test_config());
        let body = get_json(build_router(state), "/health").await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
        assert_eq!(body["lobbyCount"], 0);
        assert_eq!(body["matchInProgress"], false);
    }

    #[tokio::test]
    async fn preflight_allows_only_read_methods() {
        let state = AppState::new(test_config());
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(allowed.contains("GET"));
        assert!(!allowed.contains("POST"));
    }

    #[tokio::test]
    async fn sessions_lists_connected_players() {
        let state = AppState::new(test_config());
        let id = Uuid::new_v4();
        tokio_test::assert_ok!(state.server.connect(id).await);
        tokio_test::assert_ok!(state.server.client(id, ClientMsg::PlayerReady).await);

        // Wait for the actor to apply both commands
        for _ in 0..100 {
            if state.sessions.phase(&id) == Some(SessionPhase::Lobby) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let body = get_json(build_router(state), "/sessions").await;
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["id"], id.to_string());
        assert_eq!(sessions[0]["phase"], "lobby");
    }
}
