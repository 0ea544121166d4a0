//! Authenticated calls against the MediCare Call API.
use crate::error::StepError;
use crate::journey::{Endpoint, Step};
use crate::payload::{Payload, RegisteredElder};
use crate::session::SessionContext;
use loadrun::{check, transaction};
use reqwest::header::{HeaderMap, InvalidHeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Characters of a response body kept in failure logs.
pub const BODY_PREVIEW_CHARS: usize = 200;

/// Status and body of one call.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub status: StatusCode,
    pub body: String,
}

/// Per-iteration values threaded through the steps.
#[derive(Debug, Clone)]
pub struct IterationState {
    pub vu: usize,
    /// Current UTC date as `YYYY-MM-DD`.
    pub today: String,
    /// Id issued by the elder registration step, if it ran and succeeded.
    pub new_elder_id: Option<String>,
}

impl IterationState {
    pub fn new(vu: usize) -> Self {
        Self {
            vu,
            today: today(),
            new_elder_id: None,
        }
    }
}

pub fn today() -> String {
    time::OffsetDateTime::now_utc().date().to_string()
}

/// First `max_chars` characters of `body`, never splitting a character.
pub fn truncate(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    elder_id: String,
    headers: HeaderMap,
}

impl ApiClient {
    pub fn new(
        http: Client,
        base_url: &str,
        elder_id: &str,
        session: &SessionContext,
    ) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            elder_id: elder_id.to_string(),
            headers: session.auth_headers()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, endpoint: Endpoint, path: &str, state: &IterationState) -> RequestBuilder {
        let mut request = self
            .http
            .request(endpoint.method(), format!("{}{}", self.base_url, path))
            .headers(self.headers.clone());

        let query = endpoint.query(&state.today);
        if !query.is_empty() {
            request = request.query(&query);
        }

        if let Some(payload) = Payload::for_endpoint(endpoint, state.vu) {
            request = request.json(&payload);
        }

        request
    }

    /// Send one step, record its check and log failures.
    ///
    /// Returns whether the check passed, or `None` if the step was skipped because a
    /// previous step did not issue the id it needs.
    pub async fn run_step(&self, step: &Step, state: &mut IterationState) -> Option<bool> {
        let endpoint = step.endpoint;
        let Some(path) = endpoint.path(&self.elder_id, state.new_elder_id.as_deref()) else {
            debug!("Skipping step {} without an issued id", step.number);
            return None;
        };

        let result = http_request(self.request(endpoint, &path, state)).await;

        let (status, body) = match &result {
            Ok(res) => (Some(res.status), res.body.as_str()),
            Err(err) => (err.status(), err.body()),
        };

        let passed = check(
            endpoint.check_name(),
            status == Some(endpoint.expected_status()),
        );

        if !passed {
            let status = status.map_or(0, |s| s.as_u16());
            match &result {
                Err(StepError::Request(err)) => warn!(
                    "{}. {} {} failed: {err}",
                    step.number,
                    endpoint.path_template(),
                    endpoint.method(),
                ),
                _ => warn!(
                    "{}. {} {} Status: {status}, Body: {}...",
                    step.number,
                    endpoint.path_template(),
                    endpoint.method(),
                    truncate(body, BODY_PREVIEW_CHARS),
                ),
            }
        }

        if endpoint == Endpoint::RegisterElder {
            state.new_elder_id = serde_json::from_str::<RegisteredElder>(body)
                .ok()
                .and_then(|elder| elder.id_segment());
        }

        Some(passed)
    }
}

/// A single HTTP call. 4xx/5xx responses and transport errors count as failed requests.
#[transaction]
async fn http_request(request: RequestBuilder) -> Result<RequestResult, StepError> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;

    if status.is_client_error() || status.is_server_error() {
        return Err(StepError::Status { status, body });
    }

    Ok(RequestResult { status, body })
}
