use axum::{
    extract::{MatchedPath, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::{counter, gauge};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::{num::NonZeroU32, time::Duration};
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

pub const REFRESH_TOKEN_HEADER: &str = "Refresh-Token";

/// Id returned by elder registration.
pub const REGISTERED_ELDER_ID: u64 = 42;

/// Behaviour of the mock.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// The only refresh token `/api/auth/refresh` accepts.
    pub refresh_token: String,
    /// Added to every API call.
    pub delay: Duration,
    /// Request paths (e.g. `/api/notices`) that always answer 500.
    pub failing_paths: HashSet<String>,
    /// Requests per second served before answering 429.
    pub max_tps: Option<NonZeroU32>,
}

impl MockConfig {
    pub fn new(refresh_token: &str) -> Self {
        Self {
            refresh_token: refresh_token.to_string(),
            delay: Duration::ZERO,
            failing_paths: HashSet::new(),
            max_tps: None,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn max_tps(mut self, max_tps: NonZeroU32) -> Self {
        self.max_tps = Some(max_tps);
        self
    }
}

pub struct MockState {
    config: MockConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    issued: Mutex<HashSet<String>>,
    hits: Mutex<HashMap<String, u64>>,
    tps_window: AtomicU64,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        let limiter = config.max_tps.map(|tps| RateLimiter::direct(Quota::per_second(tps)));
        Self {
            config,
            limiter,
            issued: Mutex::new(HashSet::new()),
            hits: Mutex::new(HashMap::new()),
            tps_window: AtomicU64::new(0),
        }
    }

    /// Calls received on a route, keyed as `"GET /api/elders/:elder_id/home"`.
    pub fn hits(&self, route: &str) -> u64 {
        self.hits
            .lock()
            .map(|hits| hits.get(route).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Calls received with the given method, across all routes.
    pub fn hits_by_method(&self, method: &str) -> u64 {
        let prefix = format!("{method} ");
        self.hits
            .lock()
            .map(|hits| {
                hits.iter()
                    .filter(|(route, _)| route.starts_with(&prefix))
                    .map(|(_, count)| count)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> u64 {
        self.hits
            .lock()
            .map(|hits| hits.values().sum())
            .unwrap_or(0)
    }

    fn record(&self, route: String) {
        self.tps_window.fetch_add(1, Ordering::Relaxed);
        counter!("mock_service_requests", "route" => route.clone()).increment(1);
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(route).or_default() += 1;
        }
    }

    fn issue_tokens(&self) -> (String, String) {
        let mut issued = match self.issued.lock() {
            Ok(issued) => issued,
            Err(poisoned) => poisoned.into_inner(),
        };
        let n = issued.len() + 1;
        let access = format!("mock-access-{n}");
        issued.insert(access.clone());
        (access, format!("mock-refresh-{n}"))
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return false;
        };
        self.issued
            .lock()
            .map(|issued| issued.contains(token))
            .unwrap_or(false)
    }
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/elders/:elder_id/home", get(api))
        .route("/api/member", get(api).post(api))
        .route("/api/elders", get(api).post(api))
        .route("/api/elders/health-info", get(api))
        .route("/api/elders/subscriptions", get(api))
        .route("/api/elders/:elder_id", post(api))
        .route("/api/elders/:elder_id/health-info", post(api))
        .route("/api/elders/:elder_id/blood-sugar/weekly", get(api))
        .route("/api/elders/:elder_id/care-call-setting", get(api).post(api))
        .route("/api/elders/:elder_id/health-analysis", get(api))
        .route("/api/elders/:elder_id/meals", get(api))
        .route("/api/elders/:elder_id/medication", get(api))
        .route("/api/elders/:elder_id/mental-analysis", get(api))
        .route("/api/elders/:elder_id/sleep", get(api))
        .route("/api/elders/:elder_id/weekly-stats", get(api))
        .route("/api/notices", get(api))
        .route("/api/payments/reserve", post(api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to an ephemeral local port and serve in the background.
pub async fn spawn(config: MockConfig) -> anyhow::Result<(SocketAddr, Arc<MockState>)> {
    let state = Arc::new(MockState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let app = router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock service stopped: {err}");
        }
    });

    debug!("Mock service listening on {addr}");
    Ok((addr, state))
}

pub async fn run(addr: SocketAddr, config: MockConfig) -> anyhow::Result<()> {
    let state = Arc::new(MockState::new(config));
    tokio::spawn(tps_measure_task(state.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock service listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("POST /api/auth/refresh".to_string());

    let presented = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented.is_empty() || presented != state.config.refresh_token {
        debug!("Rejected refresh token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid refresh token" })),
        )
            .into_response();
    }

    let (access_token, refresh_token) = state.issue_tokens();
    Json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
        "tokenType": "Bearer",
        "expiresIn": 3600,
    }))
    .into_response()
}

async fn api(
    State(state): State<Arc<MockState>>,
    method: Method,
    matched: MatchedPath,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record(format!("{method} {}", matched.as_str()));

    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }

    if !state.is_authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "missing or unknown bearer token" })),
        )
            .into_response();
    }

    if state.config.failing_paths.contains(uri.path()) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "simulated failure" })),
        )
            .into_response();
    }

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
    }

    match (method, matched.as_str()) {
        (Method::POST, "/api/elders") => {
            Json(json!({ "id": REGISTERED_ELDER_ID })).into_response()
        }
        (Method::POST, "/api/elders/:elder_id/health-info") => {
            (StatusCode::CREATED, Json(json!({}))).into_response()
        }
        (Method::POST, _) => Json(json!({})).into_response(),
        _ => Json(json!({ "data": [] })).into_response(),
    }
}

/** TPS Printer **/

pub async fn tps_measure_task(state: Arc<MockState>) {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = state.tps_window.swap(0, Ordering::Relaxed);
        gauge!("mock_service_tps").set(transactions as f64);
        info!("{transactions} TPS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_per_method() {
        let state = MockState::new(MockConfig::new("token"));
        state.record("GET /api/notices".to_string());
        state.record("GET /api/notices".to_string());
        state.record("POST /api/member".to_string());

        assert_eq!(state.hits("GET /api/notices"), 2);
        assert_eq!(state.hits_by_method("GET"), 2);
        assert_eq!(state.hits_by_method("POST"), 1);
        assert_eq!(state.total_hits(), 3);
    }

    #[test]
    fn only_issued_tokens_are_authorized() {
        let state = MockState::new(MockConfig::new("token"));
        let (access, _) = state.issue_tokens();

        let mut headers = HeaderMap::new();
        assert!(!state.is_authorized(&headers));

        headers.insert(AUTHORIZATION, format!("Bearer {access}").parse().unwrap());
        assert!(state.is_authorized(&headers));

        headers.insert(AUTHORIZATION, "Bearer forged".parse().unwrap());
        assert!(!state.is_authorized(&headers));
    }
}
