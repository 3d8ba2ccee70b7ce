//! Fixture-backed backend for mock mode.
//!
//! Sessions are indexed in an R-tree by meeting point so marker search
//! answers viewport queries the way the real backend does. Mutating calls
//! (join-request decisions, attendance, created sessions) are kept in memory
//! and shared between clones of the same [`MockBackend`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use geo::{Distance, Haversine, Point};
use log::debug;
use once_cell::sync::Lazy;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use super::{AuthApi, ManageApi, MyPageApi, NearbyApi, SearchApi, SessionApi};
use crate::error::{OptionExt, Result, RunmateError};
use crate::search::SearchParams;
use crate::types::{
    AgeGroup, AppliedRunning, AppliedRunningList, ApprovalStatus, AttendanceMember,
    AttendanceStatus, CreateSessionRequest, CreatedRunning, CreatedSession, EvaluationMember,
    EvaluationRequest, Gender, GenderPolicy, HostInfo, JoinResponse, JoinStatus, LoginRequest,
    Marker, NearbySession, NearbySessionRequest, Participant, RecentRunning,
    RecentRunningList, RunResult, RunType, SessionDetail, SessionStatus, SessionSummary,
    SignupRequest, SignupResponse, Slice, User, UserInfo,
};
use crate::GeoPoint;

/// Marker position (`[lng, lat]`) tagged with its session id.
type IndexedMarker = GeomWithData<[f64; 2], i64>;

const DEFAULT_NEARBY_SIZE: u32 = 10;
const MOCK_CAPACITY: u32 = 10;
const MOCK_HOST_ID: i64 = 1;

// ============================================================================
// Fixtures
// ============================================================================

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

fn nodes(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
    coords
        .iter()
        .map(|&(lat, lng)| GeoPoint::new(lat, lng))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn fixture(
    id: i64,
    title: &str,
    start_at: NaiveDateTime,
    location_name: &str,
    target_distance_km: f64,
    avg_pace_sec: u32,
    gender_policy: GenderPolicy,
    run_type: RunType,
    host: (&str, f64),
    participants: &[&str],
    route: &[(f64, f64)],
) -> SessionDetail {
    SessionDetail {
        summary: SessionSummary {
            id,
            title: title.to_string(),
            start_at,
            location_name: location_name.to_string(),
            target_distance_km,
            avg_pace_sec,
            gender_policy,
            run_type,
        },
        host_name: host.0.to_string(),
        host_manner_temp: host.1,
        participants: participants.iter().map(|p| p.to_string()).collect(),
        route_nodes: nodes(route),
    }
}

static FIXTURE_SESSIONS: Lazy<Vec<SessionDetail>> = Lazy::new(|| {
    vec![
        fixture(
            1,
            "Station after-work run",
            at(2024, 5, 20, 19, 30),
            "Station exit 2",
            5.0,
            360,
            GenderPolicy::Mixed,
            RunType::Recovery,
            ("run-lover", 37.5),
            &["chulsoo", "younghee", "minsu"],
            &[
                (36.7945, 127.1045),
                (36.7955, 127.1055),
                (36.7935, 127.1065),
                (36.7925, 127.104),
            ],
        ),
        fixture(
            2,
            "Lake park morning jog",
            at(2024, 5, 21, 6, 0),
            "Lake park entrance",
            3.0,
            420,
            GenderPolicy::FemaleOnly,
            RunType::Recovery,
            ("early-bird", 40.2),
            &["younghee", "jisoo"],
            &[(36.8015, 127.1085), (36.802, 127.109), (36.801, 127.1095)],
        ),
        fixture(
            3,
            "Riverside interval session",
            at(2024, 5, 21, 21, 0),
            "Riverside path",
            10.0,
            300,
            GenderPolicy::MaleOnly,
            RunType::Interval,
            ("full-marathoner", 99.9),
            &["chulsoo", "minsu", "donghyuk", "junho", "junsu", "jiho"],
            &[
                (36.79, 127.102),
                (36.791, 127.1025),
                (36.792, 127.103),
                (36.793, 127.104),
                (36.793, 127.107),
                (36.793, 127.109),
                (36.79, 127.102),
            ],
        ),
        fixture(
            4,
            "Seoul Forest long jog",
            at(2024, 5, 22, 7, 0),
            "Seoul Forest gate 1",
            8.0,
            390,
            GenderPolicy::Mixed,
            RunType::Lsd,
            ("forest-runner", 36.9),
            &["dahye"],
            &[(37.5444, 127.0374), (37.5452, 127.0411), (37.5431, 127.0442)],
        ),
    ]
});

fn fixture_participants(session_id: i64) -> Vec<Participant> {
    let people = [
        (11, 101, "Lee Minji", "FEMALE", "20S", JoinStatus::Requested, "First group run!"),
        (12, 102, "Park Seojun", "MALE", "30S", JoinStatus::Requested, "I keep a 6:00 pace"),
        (13, 103, "Jung Sua", "FEMALE", "20S", JoinStatus::Approved, "See you there"),
    ];
    people
        .iter()
        .map(|&(id, user_id, name, gender, age, status, message)| Participant {
            id: id + session_id * 100,
            user_id,
            user_name: name.to_string(),
            user_gender: gender.to_string(),
            user_age_group: Some(age.to_string()),
            status,
            message_to_host: message.to_string(),
            requested_at: "2024-05-19T12:00:00".to_string(),
            manner_temp: Some(36.5),
            weekly_runs: Some(3),
            avg_pace: Some("06:00".to_string()),
        })
        .collect()
}

fn fixture_created_runs() -> Vec<CreatedRunning> {
    FIXTURE_SESSIONS
        .iter()
        .take(2)
        .enumerate()
        .map(|(i, detail)| {
            let s = &detail.summary;
            let start = detail.route_nodes.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
            CreatedRunning {
                id: s.id,
                host_user_id: MOCK_HOST_ID,
                title: s.title.clone(),
                run_type: s.run_type,
                location_name: s.location_name.clone(),
                location_x: start.longitude,
                location_y: start.latitude,
                route_polyline: detail.route_nodes.iter().map(|&p| p.into()).collect(),
                target_distance_km: s.target_distance_km,
                avg_pace_sec: s.avg_pace_sec,
                start_at: s.start_at,
                capacity: MOCK_CAPACITY,
                current_participants: detail.participants.len() as u32,
                gender_policy: s.gender_policy,
                status: if i == 0 {
                    SessionStatus::Open
                } else {
                    SessionStatus::Finished
                },
                created_at: "2024-05-01T09:00:00".to_string(),
                updated_at: "2024-05-01T09:00:00".to_string(),
            }
        })
        .collect()
}

fn fixture_attendance() -> Vec<AttendanceMember> {
    [(21, 101, "Lee Minji"), (22, 102, "Park Seojun"), (23, 103, "Jung Sua")]
        .iter()
        .map(|&(id, user_id, name)| AttendanceMember {
            id,
            user_id,
            user_name: name.to_string(),
            attendance_status: AttendanceStatus::Unmarked,
        })
        .collect()
}

// ============================================================================
// Mock backend
// ============================================================================

/// Mutable part of the mock world.
#[derive(Debug)]
struct MockState {
    participants: BTreeMap<i64, Vec<Participant>>,
    attendance: BTreeMap<i64, Vec<AttendanceMember>>,
    created: Vec<CreatedRunning>,
    next_session_id: i64,
    evaluations: Vec<EvaluationRequest>,
}

#[derive(Debug)]
struct MockStore {
    index: RTree<IndexedMarker>,
    sessions: BTreeMap<i64, SessionDetail>,
    state: Mutex<MockState>,
}

/// Serves every API trait from in-memory fixtures.
#[derive(Debug, Clone)]
pub struct MockBackend {
    latency: Duration,
    store: Arc<MockStore>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Mock backend that answers immediately.
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Mock backend that sleeps `latency` before each answer.
    pub fn with_latency(latency: Duration) -> Self {
        let sessions: BTreeMap<i64, SessionDetail> = FIXTURE_SESSIONS
            .iter()
            .map(|d| (d.summary.id, d.clone()))
            .collect();

        let markers: Vec<IndexedMarker> = sessions
            .values()
            .filter_map(|d| {
                d.route_nodes
                    .first()
                    .map(|start| GeomWithData::new(start.as_xy(), d.summary.id))
            })
            .collect();

        let participants = sessions
            .keys()
            .map(|&id| (id, fixture_participants(id)))
            .collect();
        let attendance = sessions.keys().map(|&id| (id, fixture_attendance())).collect();
        let next_session_id = sessions.keys().max().copied().unwrap_or(0) + 1;

        Self {
            latency,
            store: Arc::new(MockStore {
                index: RTree::bulk_load(markers),
                sessions,
                state: Mutex::new(MockState {
                    participants,
                    attendance,
                    created: fixture_created_runs(),
                    next_session_id,
                    evaluations: Vec::new(),
                }),
            }),
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>> {
        self.store.state.lock().map_err(|_| RunmateError::Internal {
            message: "mock state lock poisoned".to_string(),
        })
    }

    fn session(&self, session_id: i64, resource: &str) -> Result<&SessionDetail> {
        self.store
            .sessions
            .get(&session_id)
            .ok_or_not_found(resource, session_id)
    }

    /// Host evaluations submitted so far.
    pub fn submitted_evaluations(&self) -> Vec<EvaluationRequest> {
        self.state().map(|s| s.evaluations.clone()).unwrap_or_default()
    }
}

fn matches_filters(summary: &SessionSummary, params: &SearchParams) -> bool {
    if let Some(max_km) = params.distance {
        if summary.target_distance_km > max_km as f64 {
            return false;
        }
    }
    if let Some(max_pace) = params.pace {
        if summary.avg_pace_sec > max_pace {
            return false;
        }
    }
    // The date filter is not evaluated against fixture dates.
    true
}

impl SearchApi for MockBackend {
    async fn search_markers(&self, params: &SearchParams) -> Result<Vec<Marker>> {
        self.delay().await;

        let mut markers: Vec<Marker> = self
            .store
            .index
            .locate_in_envelope(&params.bounds.envelope())
            .filter_map(|entry| {
                let detail = self.store.sessions.get(&entry.data)?;
                if !matches_filters(&detail.summary, params) {
                    return None;
                }
                let [lng, lat] = *entry.geom();
                Some(Marker {
                    id: entry.data,
                    latitude: lat,
                    longitude: lng,
                })
            })
            .collect();
        markers.sort_by_key(|m| m.id);

        debug!(
            "[MockBackend] search_markers: {} markers for {:?}",
            markers.len(),
            params.bounds
        );
        Ok(markers)
    }

    async fn get_session_summary(&self, session_id: i64) -> Result<SessionSummary> {
        self.delay().await;
        Ok(self.session(session_id, "Session summary")?.summary.clone())
    }

    async fn get_session_detail(&self, session_id: i64) -> Result<SessionDetail> {
        self.delay().await;
        Ok(self.session(session_id, "Session detail")?.clone())
    }

    async fn search_sessions(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<Slice<SessionSummary>> {
        self.delay().await;
        let query = query.trim();
        let matching: Vec<SessionSummary> = self
            .store
            .sessions
            .values()
            .map(|d| &d.summary)
            .filter(|s| query.is_empty() || s.title.contains(query))
            .cloned()
            .collect();
        Ok(Slice::from_page(&matching, page, size))
    }

    async fn join_session(&self, session_id: i64, message_to_host: &str) -> Result<JoinResponse> {
        self.delay().await;
        self.session(session_id, "Session")?;
        if message_to_host.trim().is_empty() {
            return Err(RunmateError::Validation {
                message: "Please write a message to the host.".to_string(),
            });
        }
        Ok(JoinResponse {
            success: true,
            message: "Your join request has been sent.".to_string(),
        })
    }
}

impl SessionApi for MockBackend {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<CreatedSession> {
        self.delay().await;
        let mut state = self.state()?;
        let id = state.next_session_id;
        state.next_session_id += 1;

        state.created.push(CreatedRunning {
            id,
            host_user_id: MOCK_HOST_ID,
            title: request.title.clone(),
            run_type: request.run_type,
            location_name: request.location_name.clone(),
            location_x: request.location_x,
            location_y: request.location_y,
            route_polyline: request.route_polyline.clone(),
            target_distance_km: request.target_distance_km,
            avg_pace_sec: request.avg_pace_sec,
            start_at: request.start_at,
            capacity: request.capacity,
            current_participants: 0,
            gender_policy: request.gender_policy,
            status: SessionStatus::Open,
            created_at: request.start_at.to_string(),
            updated_at: request.start_at.to_string(),
        });

        Ok(CreatedSession {
            id,
            host_user_id: MOCK_HOST_ID,
            status: "OPEN".to_string(),
            session: request.clone(),
        })
    }
}

impl AuthApi for MockBackend {
    async fn signup(&self, _request: &SignupRequest) -> Result<SignupResponse> {
        self.delay().await;
        Ok(SignupResponse {
            user_id: MOCK_HOST_ID,
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<User> {
        self.delay().await;
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(RunmateError::Unauthorized {
                message: "Invalid username or password".to_string(),
            });
        }
        Ok(User {
            user_id: MOCK_HOST_ID,
            name: "Hong Gildong".to_string(),
            age_group: AgeGroup::Twenties,
            gender: Gender::Male,
            weekly_runs: 3,
            avg_pace_min_per_km: 270,
            manner_temp: 36.5,
        })
    }

    async fn logout(&self) -> Result<()> {
        self.delay().await;
        Ok(())
    }
}

impl ManageApi for MockBackend {
    async fn get_participants(
        &self,
        session_id: i64,
        status: JoinStatus,
    ) -> Result<Vec<Participant>> {
        self.delay().await;
        let state = self.state()?;
        let all = state
            .participants
            .get(&session_id)
            .ok_or_not_found("Session", session_id)?;
        Ok(all.iter().filter(|p| p.status == status).cloned().collect())
    }

    async fn approve_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        self.delay().await;
        self.decide(session_id, participation_id, JoinStatus::Approved)
    }

    async fn reject_participant(&self, session_id: i64, participation_id: i64) -> Result<()> {
        self.delay().await;
        self.decide(session_id, participation_id, JoinStatus::Rejected)
    }

    async fn get_managed_session(&self, session_id: i64) -> Result<CreatedRunning> {
        self.delay().await;
        let state = self.state()?;
        state
            .created
            .iter()
            .find(|r| r.id == session_id)
            .cloned()
            .ok_or_not_found("Session", session_id)
    }

    async fn get_attendance_list(&self, session_id: i64) -> Result<Vec<AttendanceMember>> {
        self.delay().await;
        let state = self.state()?;
        Ok(state.attendance.get(&session_id).cloned().unwrap_or_default())
    }

    async fn update_attendance(
        &self,
        session_id: i64,
        participation_id: i64,
        status: AttendanceStatus,
    ) -> Result<()> {
        self.delay().await;
        let mut state = self.state()?;
        let member = state
            .attendance
            .get_mut(&session_id)
            .and_then(|list| list.iter_mut().find(|m| m.id == participation_id))
            .ok_or_not_found("Participant", participation_id)?;
        member.attendance_status = status;
        Ok(())
    }

    async fn start_running_session(&self, session_id: i64) -> Result<()> {
        self.delay().await;
        let mut state = self.state()?;
        let run = state
            .created
            .iter_mut()
            .find(|r| r.id == session_id)
            .ok_or_not_found("Session", session_id)?;
        run.status = SessionStatus::Finished;
        Ok(())
    }

    async fn get_evaluation_list(&self, _session_id: i64) -> Result<Vec<EvaluationMember>> {
        self.delay().await;
        Ok(fixture_evaluation_members())
    }

    async fn get_host_info(&self, _session_id: i64) -> Result<HostInfo> {
        self.delay().await;
        Ok(fixture_host_info())
    }

    async fn submit_host_evaluation(&self, request: &EvaluationRequest) -> Result<()> {
        self.delay().await;
        if request.session_id <= 0 {
            return Err(RunmateError::Validation {
                message: format!("invalid session id {}", request.session_id),
            });
        }
        self.state()?.evaluations.push(request.clone());
        Ok(())
    }
}

impl MockBackend {
    fn decide(&self, session_id: i64, participation_id: i64, status: JoinStatus) -> Result<()> {
        let mut state = self.state()?;
        let participant = state
            .participants
            .get_mut(&session_id)
            .and_then(|list| list.iter_mut().find(|p| p.id == participation_id))
            .ok_or_not_found("Participant", participation_id)?;
        participant.status = status;
        debug!(
            "[MockBackend] participation {} in session {} -> {}",
            participation_id,
            session_id,
            status.as_str()
        );
        Ok(())
    }
}

/// Members to rate after a run; the backend has no endpoint for this yet.
pub(crate) fn fixture_evaluation_members() -> Vec<EvaluationMember> {
    [(101, "Lee Minji", 37.2), (102, "Park Seojun", 36.5), (103, "Jung Sua", 36.8)]
        .iter()
        .map(|&(user_id, name, temp)| EvaluationMember {
            user_id,
            user_name: name.to_string(),
            manner_temp: temp,
            profile_image: None,
        })
        .collect()
}

/// Host shown on the evaluation screen; the backend has no endpoint for this yet.
pub(crate) fn fixture_host_info() -> HostInfo {
    HostInfo {
        host_id: 999,
        name: "Runner Kim".to_string(),
    }
}

impl MyPageApi for MockBackend {
    async fn get_user_info(&self) -> Result<UserInfo> {
        self.delay().await;
        Ok(UserInfo {
            user_id: MOCK_HOST_ID,
            name: "Hong Gildong".to_string(),
            age_group: "20S".to_string(),
            gender: "MALE".to_string(),
            weekly_runs: 3,
            avg_pace_min_per_km: "04:30".to_string(),
            manner_temp: 36.5,
            total_runs: 12,
            total_distance_km: 64.2,
        })
    }

    async fn get_created_runs(&self, limit: Option<u32>) -> Result<Vec<CreatedRunning>> {
        self.delay().await;
        let state = self.state()?;
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        Ok(state.created.iter().take(limit).cloned().collect())
    }

    async fn get_applied_runs(&self) -> Result<AppliedRunningList> {
        self.delay().await;
        Ok(AppliedRunningList {
            applied_runnings: vec![
                AppliedRunning {
                    running_id: 3,
                    title: "Riverside interval session".to_string(),
                    date: "2024-05-21".to_string(),
                    time: "21:00".to_string(),
                    approve_status: ApprovalStatus::Pending,
                    chat_enabled: Some(false),
                },
                AppliedRunning {
                    running_id: 4,
                    title: "Seoul Forest long jog".to_string(),
                    date: "2024-05-22".to_string(),
                    time: "07:00".to_string(),
                    approve_status: ApprovalStatus::Approved,
                    chat_enabled: Some(true),
                },
            ],
        })
    }

    async fn get_recent_runs(&self) -> Result<RecentRunningList> {
        self.delay().await;
        Ok(RecentRunningList {
            recent_runnings: vec![
                RecentRunning {
                    running_id: 2,
                    title: "Lake park morning jog".to_string(),
                    date: "2024-05-10".to_string(),
                    result_status: RunResult::Done,
                },
                RecentRunning {
                    running_id: 1,
                    title: "Station after-work run".to_string(),
                    date: "2024-05-03".to_string(),
                    result_status: RunResult::NoShow,
                },
            ],
        })
    }
}

impl NearbyApi for MockBackend {
    async fn nearby_sessions(&self, request: &NearbySessionRequest) -> Result<Vec<NearbySession>> {
        self.delay().await;
        let origin = Point::new(request.x, request.y);

        let mut nearby: Vec<NearbySession> = self
            .store
            .sessions
            .values()
            .filter_map(|detail| {
                let start = detail.route_nodes.first()?;
                let meters = Haversine::distance(origin, Point::new(start.longitude, start.latitude));
                let s = &detail.summary;
                Some(NearbySession {
                    id: s.id,
                    title: s.title.clone(),
                    applicants: detail.participants.len() as u32,
                    max_capacity: MOCK_CAPACITY,
                    location_name: s.location_name.clone(),
                    distance_from_position_km: (meters / 10.0).round() / 100.0,
                    target_distance_km: s.target_distance_km,
                    avg_pace_sec: s.avg_pace_sec,
                    start_at: s.start_at,
                })
            })
            .collect();

        nearby.sort_by(|a, b| a.distance_from_position_km.total_cmp(&b.distance_from_position_km));
        nearby.truncate(request.size.unwrap_or(DEFAULT_NEARBY_SIZE) as usize);
        Ok(nearby)
    }
}
