//! Backend payload types.
//!
//! These mirror the JSON the REST backend speaks (camelCase keys,
//! SCREAMING_SNAKE_CASE enums). The mock backend produces the same shapes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::GeoPoint;

// ============================================================================
// Session enums
// ============================================================================

/// Who may join a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderPolicy {
    MaleOnly,
    FemaleOnly,
    Mixed,
}

impl GenderPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            GenderPolicy::MaleOnly => "Men only",
            GenderPolicy::FemaleOnly => "Women only",
            GenderPolicy::Mixed => "Anyone",
        }
    }
}

/// Kind of run the host plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunType {
    /// Long slow distance
    Lsd,
    Interval,
    Recovery,
}

impl RunType {
    pub fn label(&self) -> &'static str {
        match self {
            RunType::Lsd => "Long jog",
            RunType::Interval => "Interval",
            RunType::Recovery => "Recovery run",
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// A map pin for one session. Titles and other metadata are fetched on
/// selection, not carried here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    #[serde(alias = "sessionId")]
    pub id: i64,
    #[serde(alias = "y")]
    pub latitude: f64,
    #[serde(alias = "x")]
    pub longitude: f64,
}

impl Marker {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Summary card shown when a marker is tapped, also the search-list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: i64,
    pub title: String,
    pub start_at: NaiveDateTime,
    pub location_name: String,
    pub target_distance_km: f64,
    /// Average pace in seconds per km
    pub avg_pace_sec: u32,
    pub gender_policy: GenderPolicy,
    pub run_type: RunType,
}

/// Full session record for the detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub host_name: String,
    pub host_manner_temp: f64,
    #[serde(default)]
    pub participants: Vec<String>,
    /// Route as drawn by the host; the backend sends it as `routePolyline`
    #[serde(default, alias = "routePolyline")]
    pub route_nodes: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortInfo {
    pub empty: bool,
    pub sorted: bool,
    pub unsorted: bool,
}

impl SortInfo {
    pub fn unsorted() -> Self {
        Self {
            empty: true,
            sorted: false,
            unsorted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
    pub page_size: u32,
    pub sort: SortInfo,
    pub offset: u64,
    pub paged: bool,
    pub unpaged: bool,
}

/// Page envelope for cursor-less ("slice") paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice<T> {
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub first: bool,
    pub last: bool,
    pub size: u32,
    pub number: u32,
    pub number_of_elements: u32,
    pub empty: bool,
    pub sort: SortInfo,
}

impl<T: Clone> Slice<T> {
    /// Cut page `page` (zero-based) of `size` items out of `all`.
    pub fn from_page(all: &[T], page: u32, size: u32) -> Self {
        let start = (page as usize).saturating_mul(size as usize);
        let end = start.saturating_add(size as usize);
        let content: Vec<T> = all
            .iter()
            .skip(start)
            .take(size as usize)
            .cloned()
            .collect();
        let has_next = end < all.len();
        let count = content.len() as u32;

        Self {
            pageable: Pageable {
                page_number: page,
                page_size: size,
                sort: SortInfo::unsorted(),
                offset: start as u64,
                paged: true,
                unpaged: false,
            },
            first: page == 0,
            last: !has_next,
            size,
            number: page,
            number_of_elements: count,
            empty: count == 0,
            sort: SortInfo::unsorted(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Session creation
// ============================================================================

/// Route vertex as the backend stores it (`x` = longitude, `y` = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylinePoint {
    pub x: f64,
    pub y: f64,
}

impl From<GeoPoint> for PolylinePoint {
    fn from(p: GeoPoint) -> Self {
        Self {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub run_type: RunType,
    pub location_name: String,
    /// Meeting point longitude
    pub location_x: f64,
    /// Meeting point latitude
    pub location_y: f64,
    pub route_polyline: Vec<PolylinePoint>,
    pub target_distance_km: f64,
    pub avg_pace_sec: u32,
    pub start_at: NaiveDateTime,
    pub capacity: u32,
    pub gender_policy: GenderPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    pub id: i64,
    pub host_user_id: i64,
    pub status: String,
    #[serde(flatten)]
    pub session: CreateSessionRequest,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "10S")]
    Teens,
    #[serde(rename = "20S")]
    Twenties,
    #[serde(rename = "30S")]
    Thirties,
    #[serde(rename = "40S")]
    Forties,
    #[serde(rename = "50S")]
    Fifties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub weekly_runs: u32,
    /// Average pace in seconds per km
    pub avg_pace_min_per_km: u32,
    pub manner_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub weekly_runs: u32,
    pub avg_pace_min_per_km: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: i64,
}

// ============================================================================
// Host management
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinStatus {
    Requested,
    Approved,
    Rejected,
    Canceled,
}

impl JoinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStatus::Requested => "REQUESTED",
            JoinStatus::Approved => "APPROVED",
            JoinStatus::Rejected => "REJECTED",
            JoinStatus::Canceled => "CANCELED",
        }
    }
}

/// A join request (or approved membership) on a hosted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Participation id
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_gender: String,
    #[serde(default)]
    pub user_age_group: Option<String>,
    pub status: JoinStatus,
    pub message_to_host: String,
    pub requested_at: String,
    #[serde(default)]
    pub manner_temp: Option<f64>,
    #[serde(default)]
    pub weekly_runs: Option<u32>,
    #[serde(default)]
    pub avg_pace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// Not marked yet
    #[serde(rename = "DEFAULT")]
    Unmarked,
    #[serde(rename = "ATTENDED")]
    Attended,
    #[serde(rename = "ABSENT")]
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMember {
    /// Participation id
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub attendance_status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMember {
    pub user_id: i64,
    pub user_name: String,
    pub manner_temp: f64,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub host_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationScore {
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub session_id: i64,
    pub score: EvaluationScore,
    pub feedback_keywords: Vec<String>,
}

/// Fixed feedback keywords offered when rating a host.
pub const FEEDBACK_KEYWORDS: [&str; 5] = [
    "Great course",
    "Perfect pacing",
    "Friendly",
    "Good manners",
    "Punctual",
];

// ============================================================================
// My page
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub name: String,
    pub age_group: String,
    pub gender: String,
    pub weekly_runs: u32,
    pub avg_pace_min_per_km: String,
    pub manner_temp: f64,
    pub total_runs: u32,
    pub total_distance_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
    Canceled,
    Finished,
}

/// A session the current user hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRunning {
    pub id: i64,
    pub host_user_id: i64,
    pub title: String,
    pub run_type: RunType,
    pub location_name: String,
    pub location_x: f64,
    pub location_y: f64,
    #[serde(default)]
    pub route_polyline: Vec<PolylinePoint>,
    pub target_distance_km: f64,
    pub avg_pace_sec: u32,
    pub start_at: NaiveDateTime,
    pub capacity: u32,
    pub current_participants: u32,
    pub gender_policy: GenderPolicy,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRunning {
    pub running_id: i64,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm`
    pub time: String,
    pub approve_status: ApprovalStatus,
    #[serde(default)]
    pub chat_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRunningList {
    pub applied_runnings: Vec<AppliedRunning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunResult {
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "NOSHOW")]
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRunning {
    pub running_id: i64,
    pub title: String,
    pub date: String,
    pub result_status: RunResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRunningList {
    pub recent_runnings: Vec<RecentRunning>,
}

// ============================================================================
// Nearby
// ============================================================================

/// Query for sessions near a coordinate (`x` = longitude, `y` = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbySessionRequest {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbySession {
    pub id: i64,
    pub title: String,
    pub applicants: u32,
    pub max_capacity: u32,
    pub location_name: String,
    pub distance_from_position_km: f64,
    pub target_distance_km: f64,
    pub avg_pace_sec: u32,
    pub start_at: NaiveDateTime,
}
