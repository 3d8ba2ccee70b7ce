//! Form validation for the session, signup and login screens.
//!
//! Validators return a map of field name to message; an empty map means the
//! form may be submitted. The `"form"` key carries messages that belong to
//! no single field.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::pace::pace_string_to_seconds;
use crate::route::LocationFormData;
use crate::types::{
    AgeGroup, CreateSessionRequest, Gender, GenderPolicy, LoginRequest, RunType, SignupRequest,
};

/// Field name -> message.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Key for errors not tied to one field.
pub const FORM_KEY: &str = "form";

/// Earliest start time, relative to now.
pub const MIN_LEAD_MINUTES: i64 = 20;

pub const PACE_MIN_SEC: u32 = 120;
pub const PACE_MAX_SEC: u32 = 900;
pub const PACE_STEP_SEC: u32 = 30;
pub const PACE_DEFAULT_SEC: u32 = 300;

pub const CAPACITY_MIN: u32 = 2;
pub const CAPACITY_MAX: u32 = 10;

// ============================================================================
// Primitive checks
// ============================================================================

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn are_equal(a: &str, b: &str, trim: bool) -> bool {
    if trim {
        a.trim() == b.trim()
    } else {
        a == b
    }
}

/// Whole number from 1 to 7 (runs per week).
pub fn is_in_range_1_to_7(value: &str) -> bool {
    matches!(value.trim().parse::<i64>(), Ok(n) if (1..=7).contains(&n))
}

/// ASCII letters and digits only, trimmed length within `min..=max`.
pub fn match_alpha_num(value: &str, min_len: usize, max_len: Option<usize>) -> bool {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    len >= min_len
        && max_len.map_or(true, |max| len <= max)
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Snap a slider value onto the pace scale.
pub fn snap_pace(seconds: u32) -> u32 {
    let clamped = seconds.clamp(PACE_MIN_SEC, PACE_MAX_SEC);
    let steps = ((clamped - PACE_MIN_SEC) as f64 / PACE_STEP_SEC as f64).round() as u32;
    PACE_MIN_SEC + steps * PACE_STEP_SEC
}

pub fn clamp_capacity(capacity: u32) -> u32 {
    capacity.clamp(CAPACITY_MIN, CAPACITY_MAX)
}

fn push_form_error(errors: &mut FieldErrors, message: &str) {
    errors
        .entry(FORM_KEY)
        .and_modify(|prev| {
            prev.push('\n');
            prev.push_str(message);
        })
        .or_insert_with(|| message.to_string());
}

// ============================================================================
// Session form
// ============================================================================

/// Create-session form as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionForm {
    pub title: String,
    pub run_type: RunType,
    pub location: LocationFormData,
    pub avg_pace_sec: u32,
    pub start_at: Option<NaiveDateTime>,
    pub capacity: u32,
    pub gender_policy: GenderPolicy,
}

impl SessionForm {
    /// Empty form with the screen's defaults.
    pub fn new(location: LocationFormData) -> Self {
        Self {
            title: String::new(),
            run_type: RunType::Lsd,
            location,
            avg_pace_sec: PACE_DEFAULT_SEC,
            start_at: None,
            capacity: CAPACITY_MIN,
            gender_policy: GenderPolicy::MaleOnly,
        }
    }

    /// Validate against `now` and build the request body.
    pub fn to_request(
        &self,
        now: NaiveDateTime,
    ) -> std::result::Result<CreateSessionRequest, FieldErrors> {
        let mut errors = validate_session_form(self, now);
        let Some(start_at) = self.start_at else {
            push_form_error(&mut errors, "Please choose a start time.");
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let location = &self.location;
        Ok(CreateSessionRequest {
            title: self.title.trim().to_string(),
            run_type: self.run_type,
            location_name: location.location_name.trim().to_string(),
            location_x: location.location_x,
            location_y: location.location_y,
            route_polyline: location.route_polyline.clone(),
            target_distance_km: location.target_distance_km,
            avg_pace_sec: snap_pace(self.avg_pace_sec),
            start_at,
            capacity: clamp_capacity(self.capacity),
            gender_policy: self.gender_policy,
        })
    }
}

/// Field errors for the create-session form.
pub fn validate_session_form(form: &SessionForm, now: NaiveDateTime) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(&form.title) {
        errors.insert("title", "Please enter a session title.".to_string());
    }
    if is_blank(&form.location.location_name) {
        errors.insert("locationName", "Please enter a meeting place.".to_string());
    }

    let location = &form.location;
    if location.route_polyline.len() < 2 {
        push_form_error(
            &mut errors,
            "Tap at least two points on the map (a start and one more).",
        );
    } else if location.location_x == 0.0
        && location.location_y == 0.0
        && location.route_polyline.iter().all(|p| p.x == 0.0 && p.y == 0.0)
    {
        push_form_error(&mut errors, "Please draw a valid route on the map.");
    }

    if let Some(start_at) = form.start_at {
        if start_at < now + Duration::minutes(MIN_LEAD_MINUTES) {
            push_form_error(
                &mut errors,
                "The start time must be at least 20 minutes from now.",
            );
        }
    }

    errors
}

// ============================================================================
// Signup and login
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub name: String,
    pub age_group: Option<AgeGroup>,
    pub gender: Option<Gender>,
    pub weekly_runs: String,
    /// `mm:ss` per km
    pub avg_pace: String,
}

impl SignupForm {
    pub fn to_request(&self) -> std::result::Result<SignupRequest, FieldErrors> {
        let errors = validate_signup_form(self);
        let (Some(age_group), Some(gender), Ok(weekly_runs), Some(avg_pace)) = (
            self.age_group,
            self.gender,
            self.weekly_runs.trim().parse::<u32>(),
            pace_string_to_seconds(&self.avg_pace),
        ) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(SignupRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            name: self.name.trim().to_string(),
            age_group,
            gender,
            weekly_runs,
            avg_pace_min_per_km: avg_pace,
        })
    }
}

pub fn validate_signup_form(form: &SignupForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !match_alpha_num(&form.username, 4, Some(20)) {
        errors.insert(
            "username",
            "Use 4 to 20 letters and digits for your ID.".to_string(),
        );
    }
    if !match_alpha_num(&form.password, 8, None) {
        errors.insert(
            "password",
            "Use at least 8 letters and digits for your password.".to_string(),
        );
    }
    if !are_equal(&form.password, &form.password_confirm, false) {
        errors.insert("passwordConfirm", "Passwords do not match.".to_string());
    }
    if is_blank(&form.name) {
        errors.insert("name", "Please enter your name.".to_string());
    }
    if form.age_group.is_none() {
        errors.insert("ageGroup", "Please choose your age group.".to_string());
    }
    if form.gender.is_none() {
        errors.insert("gender", "Please choose your gender.".to_string());
    }
    if !is_in_range_1_to_7(&form.weekly_runs) {
        errors.insert(
            "weeklyRuns",
            "Enter a number from 1 to 7.".to_string(),
        );
    }
    if pace_string_to_seconds(&form.avg_pace).is_none() {
        errors.insert(
            "avgPaceMinPerKm",
            "Enter your pace as mm:ss, e.g. 05:30.".to_string(),
        );
    }

    errors
}

pub fn validate_login_form(request: &LoginRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if is_blank(&request.username) {
        errors.insert("username", "Please enter your ID.".to_string());
    }
    if request.password.is_empty() {
        errors.insert("password", "Please enter your password.".to_string());
    }
    errors
}
