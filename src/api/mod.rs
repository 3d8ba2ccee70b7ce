//! # API modules
//!
//! One trait per backend area. Each trait has two implementations, the
//! fixture-backed [`MockBackend`] and the REST [`HttpBackend`]. Which one a
//! consumer talks to is decided once, from [`Config`], by
//! [`Backend::from_config`]; nothing reads a global switch.
//!
//! All methods are async and may fail with [`RunmateError`]. Consumers make
//! no further assumption about the transport.
//!
//! [`RunmateError`]: crate::RunmateError

use std::future::Future;

use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::search::SearchParams;
use crate::types::{
    AppliedRunningList, AttendanceMember, AttendanceStatus, CreateSessionRequest, CreatedRunning,
    CreatedSession, EvaluationMember, EvaluationRequest, HostInfo, JoinResponse, JoinStatus,
    LoginRequest, Marker, NearbySession, NearbySessionRequest, Participant, RecentRunningList,
    SessionDetail, SessionSummary, SignupRequest, SignupResponse, Slice, User, UserInfo,
};

pub mod mock;
pub use mock::MockBackend;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::HttpBackend;

/// Default page size for keyword search.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 10;

// ============================================================================
// Traits
// ============================================================================

/// Map search, session lookup and joining.
pub trait SearchApi: Send + Sync {
    /// Markers inside the bounds that satisfy the resolved filters.
    fn search_markers(
        &self,
        params: &SearchParams,
    ) -> impl Future<Output = Result<Vec<Marker>>> + Send;

    /// Summary card for one session (marker tap).
    fn get_session_summary(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<SessionSummary>> + Send;

    /// Full record for the detail screen.
    fn get_session_detail(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<SessionDetail>> + Send;

    /// Keyword search over session titles, zero-based paging.
    fn search_sessions(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Slice<SessionSummary>>> + Send;

    /// Ask the host to be let into a session.
    fn join_session(
        &self,
        session_id: i64,
        message_to_host: &str,
    ) -> impl Future<Output = Result<JoinResponse>> + Send;
}

/// Session creation.
pub trait SessionApi: Send + Sync {
    fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> impl Future<Output = Result<CreatedSession>> + Send;
}

/// Account creation and login.
pub trait AuthApi: Send + Sync {
    fn signup(&self, request: &SignupRequest)
        -> impl Future<Output = Result<SignupResponse>> + Send;

    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<User>> + Send;

    fn logout(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Host-side management of a session: join requests, attendance, evaluation.
pub trait ManageApi: Send + Sync {
    fn get_participants(
        &self,
        session_id: i64,
        status: JoinStatus,
    ) -> impl Future<Output = Result<Vec<Participant>>> + Send;

    fn approve_participant(
        &self,
        session_id: i64,
        participation_id: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn reject_participant(
        &self,
        session_id: i64,
        participation_id: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn get_managed_session(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<CreatedRunning>> + Send;

    fn get_attendance_list(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<Vec<AttendanceMember>>> + Send;

    fn update_attendance(
        &self,
        session_id: i64,
        participation_id: i64,
        status: AttendanceStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Close attendance and mark the run as under way.
    fn start_running_session(&self, session_id: i64) -> impl Future<Output = Result<()>> + Send;

    fn get_evaluation_list(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<Vec<EvaluationMember>>> + Send;

    fn get_host_info(&self, session_id: i64) -> impl Future<Output = Result<HostInfo>> + Send;

    fn submit_host_evaluation(
        &self,
        request: &EvaluationRequest,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The current user's profile and run history.
pub trait MyPageApi: Send + Sync {
    fn get_user_info(&self) -> impl Future<Output = Result<UserInfo>> + Send;

    fn get_created_runs(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<CreatedRunning>>> + Send;

    fn get_applied_runs(&self) -> impl Future<Output = Result<AppliedRunningList>> + Send;

    fn get_recent_runs(&self) -> impl Future<Output = Result<RecentRunningList>> + Send;
}

/// Sessions close to a coordinate, for the home screen list.
pub trait NearbyApi: Send + Sync {
    fn nearby_sessions(
        &self,
        request: &NearbySessionRequest,
    ) -> impl Future<Output = Result<Vec<NearbySession>>> + Send;
}

// ============================================================================
// Backend selection
// ============================================================================

/// The backend chosen at startup, delegating every API trait.
#[derive(Debug, Clone)]
pub enum Backend {
    Mock(MockBackend),
    #[cfg(feature = "http")]
    Http(HttpBackend),
}

impl Backend {
    /// Build the backend the configuration asks for.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.use_mock {
            info!(
                "[Backend] Using mock backend (latency {:?})",
                config.mock_latency
            );
            return Ok(Backend::Mock(MockBackend::with_latency(config.mock_latency)));
        }
        Self::real(config)
    }

    #[cfg(feature = "http")]
    fn real(config: &Config) -> Result<Self> {
        info!("[Backend] Using REST backend at {}", config.api_base_url);
        Ok(Backend::Http(HttpBackend::new(config)?))
    }

    #[cfg(not(feature = "http"))]
    fn real(_config: &Config) -> Result<Self> {
        Err(crate::RunmateError::Config {
            message: "REST backend requested but the `http` feature is disabled".to_string(),
        })
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Backend::Mock(_))
    }
}

/// Forward a trait method to whichever backend is active.
macro_rules! delegate {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {
        match $self {
            Backend::Mock(b) => b.$method($($arg),*).await,
            #[cfg(feature = "http")]
            Backend::Http(b) => b.$method($($arg),*).await,
        }
    };
}

impl SearchApi for Backend {
    async fn search_markers(&self, params: &SearchParams) -> Result<Vec<Marker>> {
        delegate!(self, search_markers(params))
    }

    async fn get_session_summary(&self, session_id: i64) -> Result<SessionSummary> {
        delegate!(self, get_session_summary(session_id))
    }

    async fn get_session_detail(&self, session_id: i64) -> Result<SessionDetail> {
        delegate!(self, get_session_detail(session_id))
    }

    async fn search_sessions(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<Slice<SessionSummary>> {
        delegate!(self, search_sessions(query, page, size))
    }

    async fn join_session(&self, session_id: i64, message_to_host: &str) -> Result<JoinResponse> {
        delegate!(self, join_session(session_id, message_to_host))
    }
}

impl SessionApi for Backend {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<CreatedSession> {
        delegate!(self, create_session(request))
    }
}

impl AuthApi for Backend {
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        delegate!(self, signup(request))
    }

    async fn login(&self, request: &LoginRequest) -> Result<User> {
        delegate!(self, login(request))
    }

    async fn logout(&self) -> Result<()> {
        delegate!(self, logout())
    }
}

impl ManageApi for Backend {
    async fn get_participants(
        &self,
        session_id: i64,
        status: JoinStatus,
    ) -> Result<Vec<Participant>> {
        delegate!(self, get_participants(session_id, status))
    }

    async fn approve_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        delegate!(self, approve_participant(session_id, participation_id))
    }

    async fn reject_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        delegate!(self, reject_participant(session_id, participation_id))
    }

    async fn get_managed_session(&self, session_id: i64) -> Result<CreatedRunning> {
        delegate!(self, get_managed_session(session_id))
    }

    async fn get_attendance_list(&self, session_id: i64) -> Result<Vec<AttendanceMember>> {
        delegate!(self, get_attendance_list(session_id))
    }

    async fn update_attendance(
        &self,
        session_id: i64,
        participation_id: i64,
        status: AttendanceStatus,
    ) -> Result<()> {
        delegate!(self, update_attendance(session_id, participation_id, status))
    }

    async fn start_running_session(&self, session_id: i64) -> Result<()> {
        delegate!(self, start_running_session(session_id))
    }

    async fn get_evaluation_list(&self, session_id: i64) -> Result<Vec<EvaluationMember>> {
        delegate!(self, get_evaluation_list(session_id))
    }

    async fn get_host_info(&self, session_id: i64) -> Result<HostInfo> {
        delegate!(self, get_host_info(session_id))
    }

    async fn submit_host_evaluation(&self, request: &EvaluationRequest) -> Result<()> {
        delegate!(self, submit_host_evaluation(request))
    }
}

impl MyPageApi for Backend {
    async fn get_user_info(&self) -> Result<UserInfo> {
        delegate!(self, get_user_info())
    }

    async fn get_created_runs(&self, limit: Option<u32>) -> Result<Vec<CreatedRunning>> {
        delegate!(self, get_created_runs(limit))
    }

    async fn get_applied_runs(&self) -> Result<AppliedRunningList> {
        delegate!(self, get_applied_runs())
    }

    async fn get_recent_runs(&self) -> Result<RecentRunningList> {
        delegate!(self, get_recent_runs())
    }
}

impl NearbyApi for Backend {
    async fn nearby_sessions(&self, request: &NearbySessionRequest) -> Result<Vec<NearbySession>> {
        delegate!(self, nearby_sessions(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_selected_from_config() {
        let backend = Backend::from_config(&Config::mock()).unwrap();
        assert!(backend.is_mock());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_selected_from_config() {
        let config = Config::default().with_base_url("http://127.0.0.1:9");
        let backend = Backend::from_config(&config).unwrap();
        assert!(!backend.is_mock());
    }

    #[tokio::test]
    async fn test_backend_delegates_to_mock() {
        let backend = Backend::from_config(&Config::mock()).unwrap();
        let summary = backend.get_session_summary(1).await.unwrap();
        assert_eq!(summary.id, 1);
    }
}
