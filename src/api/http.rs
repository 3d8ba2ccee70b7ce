//! REST backend over `reqwest`.
//!
//! - One pooled client per backend, session cookie kept in the client's jar
//! - JSON bodies both ways, 10 s default timeout from [`Config`]
//! - 401 maps to [`RunmateError::Unauthorized`] with the server's message
//! - GET requests retry 429 and transport errors with exponential backoff

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::mock::{fixture_evaluation_members, fixture_host_info};
use super::{AuthApi, ManageApi, MyPageApi, NearbyApi, SearchApi, SessionApi};
use crate::config::Config;
use crate::error::{Result, RunmateError};
use crate::search::SearchParams;
use crate::types::{
    AppliedRunningList, AttendanceMember, AttendanceStatus, CreateSessionRequest, CreatedRunning,
    CreatedSession, EvaluationMember, EvaluationRequest, HostInfo, JoinResponse, JoinStatus,
    LoginRequest, Marker, NearbySession, NearbySessionRequest, Participant, RecentRunningList,
    SessionDetail, SessionSummary, SignupRequest, SignupResponse, Slice, User, UserInfo,
};

const MAX_RETRIES: u32 = 3;
const POOL_MAX_IDLE_PER_HOST: usize = 8;
const LOGIN_REQUIRED: &str = "Login required";
const HISTORY_LIMIT: u32 = 3;

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequestBody<'a> {
    message_to_host: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceBody {
    attendance_status: AttendanceStatus,
}

/// Talks to the running backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for `config.api_base_url`.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RunmateError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retry on 429 and transport failures.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;

        loop {
            match self.client.get(&url).query(query).send().await {
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(RunmateError::http("Max retries exceeded (429)", Some(429)));
                    }
                    let backoff = backoff_for(retries);
                    warn!("[HttpBackend] 429 for {}, retry {} after {:?}", path, retries, backoff);
                    tokio::time::sleep(backoff).await;
                }
                Ok(resp) => {
                    let resp = check_status(resp).await?;
                    return Ok(resp.json::<T>().await?);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(e.into());
                    }
                    let backoff = backoff_for(retries);
                    warn!(
                        "[HttpBackend] Error for {}: {}, retry {} after {:?}",
                        path, e, retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Non-idempotent request, sent once.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        debug!("[HttpBackend] {} {}", method, path);
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        check_status(request.send().await?).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self.send(Method::POST, path, Some(body)).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        self.send::<()>(Method::POST, path, None).await?;
        Ok(())
    }
}

/// Backoff before retry `attempt` (1-based): 1s, 2s, 4s.
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1 << attempt.min(4)))
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(error_for_status(status, &body))
}

fn error_for_status(status: StatusCode, body: &str) -> RunmateError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    if status == StatusCode::UNAUTHORIZED {
        return RunmateError::Unauthorized {
            message: message.unwrap_or_else(|| LOGIN_REQUIRED.to_string()),
        };
    }

    let message = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });
    RunmateError::http(message, Some(status.as_u16()))
}

impl SearchApi for HttpBackend {
    async fn search_markers(&self, params: &SearchParams) -> Result<Vec<Marker>> {
        self.get_json("/sessions/search/markers", &params.query_pairs())
            .await
    }

    async fn get_session_summary(&self, session_id: i64) -> Result<SessionSummary> {
        self.get_json(&format!("/sessions/{}/summary", session_id), &[])
            .await
    }

    async fn get_session_detail(&self, session_id: i64) -> Result<SessionDetail> {
        self.get_json(&format!("/sessions/{}", session_id), &[]).await
    }

    async fn search_sessions(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<Slice<SessionSummary>> {
        let params = [
            ("q", query.trim().to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ];
        self.get_json("/sessions/search", &params).await
    }

    async fn join_session(&self, session_id: i64, message_to_host: &str) -> Result<JoinResponse> {
        let body = JoinRequestBody { message_to_host };
        let resp = self
            .send(
                Method::POST,
                &format!("/sessions/{}/join-requests", session_id),
                Some(&body),
            )
            .await?;
        let text = resp.text().await.unwrap_or_default();
        Ok(join_response_from_body(session_id, &text))
    }
}

impl SessionApi for HttpBackend {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<CreatedSession> {
        self.post_json("/sessions", request).await
    }
}

impl AuthApi for HttpBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        self.post_json("/auth/signup", request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<User> {
        self.post_json("/auth/login", request).await
    }

    async fn logout(&self) -> Result<()> {
        self.post_empty("/auth/logout").await
    }
}

impl ManageApi for HttpBackend {
    async fn get_participants(
        &self,
        session_id: i64,
        status: JoinStatus,
    ) -> Result<Vec<Participant>> {
        self.get_json(
            &format!("/sessions/{}/join-requests", session_id),
            &[("status", status.as_str().to_string())],
        )
        .await
    }

    async fn approve_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        self.post_empty(&format!(
            "/sessions/{}/join-requests/{}/approve",
            session_id, participation_id
        ))
        .await
    }

    async fn reject_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        self.post_empty(&format!(
            "/sessions/{}/join-requests/{}/reject",
            session_id, participation_id
        ))
        .await
    }

    async fn get_managed_session(&self, session_id: i64) -> Result<CreatedRunning> {
        self.get_json(&format!("/sessions/{}", session_id), &[]).await
    }

    async fn get_attendance_list(&self, session_id: i64) -> Result<Vec<AttendanceMember>> {
        self.get_json(&format!("/sessions/{}/attendance", session_id), &[])
            .await
    }

    async fn update_attendance(
        &self,
        session_id: i64,
        participation_id: i64,
        status: AttendanceStatus,
    ) -> Result<()> {
        let body = AttendanceBody {
            attendance_status: status,
        };
        self.send(
            Method::PATCH,
            &format!(
                "/sessions/{}/participants/{}/attendance",
                session_id, participation_id
            ),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn start_running_session(&self, session_id: i64) -> Result<()> {
        self.post_empty(&format!("/sessions/{}/finish", session_id))
            .await
    }

    // No backend endpoint for the evaluation screens yet.

    async fn get_evaluation_list(&self, _session_id: i64) -> Result<Vec<EvaluationMember>> {
        Ok(fixture_evaluation_members())
    }

    async fn get_host_info(&self, _session_id: i64) -> Result<HostInfo> {
        Ok(fixture_host_info())
    }

    async fn submit_host_evaluation(&self, request: &EvaluationRequest) -> Result<()> {
        if request.session_id <= 0 {
            return Err(RunmateError::Validation {
                message: format!("invalid session id {}", request.session_id),
            });
        }
        debug!(
            "[HttpBackend] host evaluation for session {} not sent, no endpoint",
            request.session_id
        );
        Ok(())
    }
}

impl MyPageApi for HttpBackend {
    async fn get_user_info(&self) -> Result<UserInfo> {
        self.get_json("/users/me", &[]).await
    }

    async fn get_created_runs(&self, limit: Option<u32>) -> Result<Vec<CreatedRunning>> {
        let params: Vec<(&str, String)> = limit
            .map(|l| vec![("limit", l.to_string())])
            .unwrap_or_default();
        self.get_json("/users/me/runnings/mySession", &params).await
    }

    async fn get_applied_runs(&self) -> Result<AppliedRunningList> {
        self.get_json(
            "/users/me/runnings/applied",
            &[("limit", HISTORY_LIMIT.to_string())],
        )
        .await
    }

    async fn get_recent_runs(&self) -> Result<RecentRunningList> {
        self.get_json(
            "/users/me/runnings/recent",
            &[("limit", HISTORY_LIMIT.to_string())],
        )
        .await
    }
}

impl NearbyApi for HttpBackend {
    async fn nearby_sessions(&self, request: &NearbySessionRequest) -> Result<Vec<NearbySession>> {
        let mut params = vec![("x", request.x.to_string()), ("y", request.y.to_string())];
        if let Some(size) = request.size {
            params.push(("size", size.to_string()));
        }
        self.get_json("/sessions/search/nearby", &params).await
    }
}

/// A 2xx join reply may carry no body; treat anything undecodable as sent.
fn join_response_from_body(session_id: i64, text: &str) -> JoinResponse {
    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!(
            "[HttpBackend] join {} reply not decodable ({}), assuming sent: {:?}",
            session_id, e, text
        );
        JoinResponse {
            success: true,
            message: "Your join request has been sent.".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenderPolicy, RunType};

    fn backend(url: &str) -> HttpBackend {
        HttpBackend::new(&Config::default().with_base_url(url)).unwrap()
    }

    #[test]
    fn test_url_building() {
        let api = backend("http://localhost:8080/");
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(
            api.url("/sessions/3/summary"),
            "http://localhost:8080/sessions/3/summary"
        );
    }

    #[test]
    fn test_unauthorized_uses_server_message() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, r#"{"message":"Session expired"}"#);
        assert_eq!(
            err,
            RunmateError::Unauthorized {
                message: "Session expired".to_string()
            }
        );

        let err = error_for_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(
            err,
            RunmateError::Unauthorized {
                message: LOGIN_REQUIRED.to_string()
            }
        );
    }

    #[test]
    fn test_other_status_codes() {
        let err = error_for_status(StatusCode::BAD_REQUEST, r#"{"message":"title is required"}"#);
        assert_eq!(err, RunmateError::http("title is required", Some(400)));

        let err = error_for_status(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err, RunmateError::http("Bad Gateway", Some(502)));
    }

    #[test]
    fn test_join_reply_decoding() {
        let sent = join_response_from_body(3, r#"{"success": false, "message": "Session is full"}"#);
        assert!(!sent.success);
        assert_eq!(sent.message, "Session is full");

        let empty = join_response_from_body(3, "");
        assert!(empty.success);
        let changed = join_response_from_body(3, r#"{"ok": 1}"#);
        assert!(changed.success);
    }

    #[test]
    fn test_backoff_grows() {
        assert_eq!(backoff_for(1), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(2));
        assert_eq!(backoff_for(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_evaluation_calls_stay_local() {
        let api = backend("http://127.0.0.1:1");
        assert_eq!(api.get_evaluation_list(7).await.unwrap().len(), 3);
        assert_eq!(api.get_host_info(7).await.unwrap().host_id, 999);

        let bad = EvaluationRequest {
            session_id: 0,
            score: crate::types::EvaluationScore::Good,
            feedback_keywords: vec![],
        };
        assert!(matches!(
            api.submit_host_evaluation(&bad).await,
            Err(RunmateError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_post_is_not_retried() {
        let api = backend("http://127.0.0.1:1");
        let request = CreateSessionRequest {
            title: "t".to_string(),
            run_type: RunType::Lsd,
            location_name: "l".to_string(),
            location_x: 127.0,
            location_y: 37.5,
            route_polyline: vec![],
            target_distance_km: 0.0,
            avg_pace_sec: 300,
            start_at: chrono::NaiveDateTime::default(),
            capacity: 2,
            gender_policy: GenderPolicy::Mixed,
        };
        let err = api.create_session(&request).await.unwrap_err();
        assert!(matches!(err, RunmateError::Http { status_code: None, .. }));
    }
}
