// In crates/web-server/src/lib.rs

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::{get, post},
};
use futures::stream::StreamExt;
use app_config::ServerSettings;
use engine::{LatestSignal, RunnerHandle, RunnerSnapshot};
use events::WsMessage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use types::{PredictionResponse, SelectionResponse, StrategyView};

pub mod error;
pub mod types;

pub use error::{Error, Result};

/// Recent messages replayed to every newly connected WebSocket client.
pub type WsCache = Arc<Mutex<VecDeque<WsMessage>>>;

/// The maximum number of messages kept in the replay cache.
pub const WS_CACHE_SIZE: usize = 200;

/// The shared application state available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: RunnerHandle,
    pub ws_tx: broadcast::Sender<WsMessage>, // For broadcasting live messages
    pub ws_cache: WsCache,                   // For replaying recent messages
}

pub fn new_ws_cache() -> WsCache {
    Arc::new(Mutex::new(VecDeque::with_capacity(WS_CACHE_SIZE)))
}

/// Appends a message to the replay cache, evicting the oldest past capacity.
pub fn push_cached(cache: &WsCache, msg: WsMessage) {
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if cache.len() >= WS_CACHE_SIZE {
        cache.pop_front();
    }
    cache.push_back(msg);
}

/// Copies every broadcast message into the replay cache until the channel closes.
pub fn spawn_cache_recorder(
    ws_tx: &broadcast::Sender<WsMessage>,
    cache: WsCache,
) -> tokio::task::JoinHandle<()> {
    let mut rx = ws_tx.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => push_cached(&cache, msg),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Replay cache recorder lagged behind.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // Any origin may read the dashboard API.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/state", get(get_state_handler))
        .route("/strategies", get(get_strategies_handler))
        .route("/strategies/{id}/toggle", post(toggle_strategy_handler))
        .route("/signals", get(get_signals_handler))
        .route("/signals/latest", get(get_latest_signal_handler))
        .route("/prediction", get(get_prediction_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/state`
async fn get_state_handler(State(state): State<AppState>) -> Json<RunnerSnapshot> {
    Json(state.runner.snapshot().as_ref().clone())
}

/// Handler for `GET /api/strategies`
async fn get_strategies_handler(State(state): State<AppState>) -> Json<Vec<StrategyView>> {
    let snapshot = state.runner.snapshot();
    let views = strategies::STRATEGIES
        .iter()
        .map(|descriptor| StrategyView {
            descriptor: *descriptor,
            selected: snapshot.selected_strategies.iter().any(|id| id == descriptor.id),
        })
        .collect();
    Json(views)
}

/// Handler for `POST /api/strategies/{id}/toggle`
async fn toggle_strategy_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SelectionResponse>> {
    let selected = state.runner.toggle_strategy(&id).await?;
    tracing::info!(strategy = %id, ?selected, "Strategy selection toggled via API.");
    Ok(Json(SelectionResponse { selected }))
}

/// Handler for `GET /api/signals`
async fn get_signals_handler(State(state): State<AppState>) -> Json<Vec<core_types::Signal>> {
    Json(state.runner.snapshot().signals.clone())
}

/// Handler for `GET /api/signals/latest`
async fn get_latest_signal_handler(State(state): State<AppState>) -> Result<Json<LatestSignal>> {
    match state.runner.snapshot().latest_signal.clone() {
        Some(latest) => Ok(Json(latest)),
        None => Err(Error::NotFound("No signal has been generated yet".to_string())),
    }
}

/// Handler for `GET /api/prediction`
async fn get_prediction_handler(State(state): State<AppState>) -> Json<PredictionResponse> {
    let snapshot = state.runner.snapshot();
    Json(PredictionResponse {
        prediction: snapshot.prediction,
        stats: snapshot.stats.clone(),
    })
}

/// The handler for `GET /ws`.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize WebSocket message.");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // --- 1. The "Replay" ---
    // Subscribe first so nothing published during the replay is missed.
    let mut rx = state.ws_tx.subscribe();
    let replay_msgs: Vec<_> = {
        let cache = state.ws_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.iter().cloned().collect()
    };
    for msg in &replay_msgs {
        if !send_json(&mut socket, msg).await {
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    // --- 2. "Going Live" ---
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(msg) => {
                    if !send_json(&mut socket, &msg).await {
                        tracing::info!("WebSocket client disconnected.");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagged behind the broadcast.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::info!(error = %e, "WebSocket client errored.");
                    break;
                }
            },
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

/// Serves the dashboard API until `shutdown` flips to `true`.
pub async fn run(
    settings: ServerSettings,
    app_state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("Web server shutting down.");
        })
        .await
        .map_err(Error::ServeError)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_config::Settings;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use engine::Engine;
    use serde_json::Value;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        shutdown: watch::Sender<bool>,
    }

    fn harness() -> Harness {
        let mut settings = Settings::default();
        settings.signals.seed = Some(11);
        // Keep the tickers quiet for the duration of a test.
        settings.feed.poll_interval_ms = 3_600_000;
        settings.signals.interval_ms = 3_600_000;

        let (ws_tx, _) = broadcast::channel(64);
        let (runner, handle) = Engine::new(settings, ws_tx.clone()).build().unwrap();
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(runner.run(shutdown_rx));

        let app = create_router(AppState {
            runner: handle,
            ws_tx,
            ws_cache: new_ws_cache(),
        });
        Harness { app, shutdown }
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let (status, body) = call(app, method, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let h = harness();
        let (status, body) = call(&h.app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn state_exposes_initial_snapshot() {
        let h = harness();
        let (status, json) = call_json(&h.app, "GET", "/api/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pair"], "EUR/USD");
        assert_eq!(json["price_history"].as_array().unwrap().len(), 1);
        assert_eq!(json["prediction"], "NEUTRAL");
        assert!(json["latest_signal"].is_null());
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn strategies_flag_the_default_selection() {
        let h = harness();
        let (status, json) = call_json(&h.app, "GET", "/api/strategies").await;
        assert_eq!(status, StatusCode::OK);

        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 6);
        let selected: Vec<_> = entries
            .iter()
            .filter(|e| e["selected"] == true)
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(selected, vec!["EMA_CROSSOVER"]);
        assert_eq!(entries[0]["color"], "#3b82f6");
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn toggle_adds_and_removes_strategies() {
        let h = harness();

        let (status, json) = call_json(&h.app, "POST", "/api/strategies/MACD_SIGNAL/toggle").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["selected"], serde_json::json!(["EMA_CROSSOVER", "MACD_SIGNAL"]));

        let (_, json) = call_json(&h.app, "POST", "/api/strategies/EMA_CROSSOVER/toggle").await;
        assert_eq!(json["selected"], serde_json::json!(["MACD_SIGNAL"]));

        let (_, json) = call_json(&h.app, "GET", "/api/strategies").await;
        let macd = json.as_array().unwrap().iter().find(|e| e["id"] == "MACD_SIGNAL").unwrap();
        assert_eq!(macd["selected"], true);
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn toggle_of_unknown_strategy_is_not_found() {
        let h = harness();
        let (status, json) = call_json(&h.app, "POST", "/api/strategies/ICHIMOKU/toggle").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("ICHIMOKU"));
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn toggle_after_shutdown_is_unavailable() {
        let h = harness();
        h.shutdown.send(true).unwrap();
        // Wait for the runner to drop its command receiver.
        let mut status = StatusCode::OK;
        for _ in 0..50 {
            status = call(&h.app, "POST", "/api/strategies/MACD_SIGNAL/toggle").await.0;
            if status == StatusCode::SERVICE_UNAVAILABLE {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_log_has_no_latest_signal_and_neutral_prediction() {
        let h = harness();

        let (status, json) = call_json(&h.app, "GET", "/api/signals").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());

        let (status, _) = call(&h.app, "GET", "/api/signals/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = call_json(&h.app, "GET", "/api/prediction").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["prediction"], "NEUTRAL");
        assert_eq!(json["stats"]["total"], 0);
        let _ = h.shutdown.send(true);
    }

    #[test]
    fn replay_cache_is_bounded() {
        let cache = new_ws_cache();
        for i in 0..(WS_CACHE_SIZE + 5) {
            push_cached(&cache, WsMessage::SelectionChanged(vec![i.to_string()]));
        }
        let cache = cache.lock().unwrap();
        assert_eq!(cache.len(), WS_CACHE_SIZE);
        match cache.front() {
            Some(WsMessage::SelectionChanged(ids)) => assert_eq!(ids, &vec!["5".to_string()]),
            other => panic!("unexpected front message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn recorder_caches_broadcast_messages() {
        let (ws_tx, _) = broadcast::channel(8);
        let cache = new_ws_cache();
        let recorder = spawn_cache_recorder(&ws_tx, cache.clone());

        ws_tx.send(WsMessage::SelectionChanged(vec!["TREND_FOLLOW".into()])).unwrap();
        drop(ws_tx);
        recorder.await.unwrap();

        assert_eq!(cache.lock().unwrap().len(), 1);
    }
}
