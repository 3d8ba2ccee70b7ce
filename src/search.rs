//! # Map bounds search
//!
//! Keeps the displayed markers in step with the map viewport and the active
//! filters:
//! - Every settled viewport or filter toggle resolves to [`SearchParams`]
//! - A request whose parameters equal the last *issued* request is skipped
//! - Each search and each marker selection carries a generation number, and
//!   only the latest generation may write state
//! - A failed search leaves the current markers in place
//!
//! The controller is generic over [`SearchApi`], so it runs unchanged against
//! the mock or the REST backend.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::api::SearchApi;
use crate::error::{Result, RunmateError};
use crate::types::SessionSummary;
use crate::BoundingBox;

pub use crate::types::Marker;

/// Target distance applied by the distance filter, in km.
pub const DISTANCE_FILTER_KM: u32 = 3;
/// Date value applied by the date filter.
pub const DATE_FILTER: &str = "today";
/// Slowest pace applied by the pace filter, in seconds per km.
pub const PACE_FILTER_SEC: u32 = 600;

// ============================================================================
// Filters
// ============================================================================

/// The fixed filter chips on the search page. Toggling is binary; each
/// filter always resolves to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterId {
    Distance,
    Date,
    Pace,
}

impl FilterId {
    pub const ALL: [FilterId; 3] = [FilterId::Distance, FilterId::Date, FilterId::Pace];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterId::Distance => "distance",
            FilterId::Date => "date",
            FilterId::Pace => "pace",
        }
    }

    /// Chip label.
    pub fn label(&self) -> &'static str {
        match self {
            FilterId::Distance => "Within 3 km",
            FilterId::Date => "Today",
            FilterId::Pace => "Pace 10:00",
        }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterId {
    type Err = RunmateError;

    fn from_str(s: &str) -> Result<Self> {
        FilterId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| RunmateError::Validation {
                message: format!("unknown filter {:?}", s),
            })
    }
}

/// Active filters. Membership only, order irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet(BTreeSet<FilterId>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: FilterId) -> bool {
        self.0.contains(&id)
    }

    /// Flip membership of `id`. Returns true when the filter is now active.
    pub fn toggle(&mut self, id: FilterId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = FilterId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<FilterId> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Search parameters
// ============================================================================

/// Bounds plus resolved filter values for one marker search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub bounds: BoundingBox,
    /// Max target distance in km
    pub distance: Option<u32>,
    pub date: Option<String>,
    /// Max average pace in seconds per km
    pub pace: Option<u32>,
}

/// De-duplication key: exact bit patterns of the bounds plus filter values.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchSignature {
    bounds: [u64; 4],
    distance: Option<u32>,
    date: Option<String>,
    pace: Option<u32>,
}

impl SearchParams {
    /// Resolve `filters` to their fixed values.
    pub fn new(bounds: BoundingBox, filters: &FilterSet) -> Self {
        Self {
            bounds,
            distance: filters
                .contains(FilterId::Distance)
                .then_some(DISTANCE_FILTER_KM),
            date: filters
                .contains(FilterId::Date)
                .then(|| DATE_FILTER.to_string()),
            pace: filters.contains(FilterId::Pace).then_some(PACE_FILTER_SEC),
        }
    }

    fn signature(&self) -> SearchSignature {
        let b = &self.bounds;
        SearchSignature {
            bounds: [
                b.min_lng.to_bits(),
                b.min_lat.to_bits(),
                b.max_lng.to_bits(),
                b.max_lat.to_bits(),
            ],
            distance: self.distance,
            date: self.date.clone(),
            pace: self.pace,
        }
    }

    /// Query-string pairs for the marker endpoint. Absent filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let b = &self.bounds;
        let mut pairs = vec![
            ("minLng", b.min_lng.to_string()),
            ("minLat", b.min_lat.to_string()),
            ("maxLng", b.max_lng.to_string()),
            ("maxLat", b.max_lat.to_string()),
        ];
        if let Some(distance) = self.distance {
            pairs.push(("distance", distance.to_string()));
        }
        if let Some(date) = &self.date {
            pairs.push(("date", date.clone()));
        }
        if let Some(pace) = self.pace {
            pairs.push(("pace", pace.to_string()));
        }
        pairs
    }
}

// ============================================================================
// Controller
// ============================================================================

/// What a viewport or filter event did.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// No viewport has been reported yet; only filter state changed
    NoViewport,
    /// Same parameters as the last issued request
    Skipped,
    /// Markers replaced with the response
    Applied { count: usize },
    /// A newer search was issued while this one was in flight
    Stale,
    /// The search failed; the previous markers are still shown
    Failed(RunmateError),
}

#[derive(Debug, Default)]
struct SearchState {
    filters: FilterSet,
    last_bounds: Option<BoundingBox>,
    last_signature: Option<SearchSignature>,
    markers: Vec<Marker>,
    search_generation: u64,
    selected_id: Option<i64>,
    selected_summary: Option<SessionSummary>,
    selection_generation: u64,
}

/// Owns the marker list and the selected summary for the search page.
#[derive(Debug)]
pub struct SearchController<A> {
    api: A,
    state: Mutex<SearchState>,
}

impl<A: SearchApi> SearchController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(SearchState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The map finished moving or zooming.
    pub async fn on_viewport_settled(
        &self,
        bounds: BoundingBox,
        active_filters: &FilterSet,
    ) -> FetchOutcome {
        {
            let mut state = self.lock();
            state.last_bounds = Some(bounds);
            state.filters = active_filters.clone();
        }
        self.fetch(SearchParams::new(bounds, active_filters)).await
    }

    /// A filter chip was tapped. Refetches with the last known bounds.
    pub async fn on_filter_toggled(&self, filter_id: FilterId) -> FetchOutcome {
        let params = {
            let mut state = self.lock();
            let active = state.filters.toggle(filter_id);
            debug!(
                "[SearchController] filter {} -> {}",
                filter_id,
                if active { "on" } else { "off" }
            );
            match state.last_bounds {
                Some(bounds) => SearchParams::new(bounds, &state.filters),
                None => return FetchOutcome::NoViewport,
            }
        };
        self.fetch(params).await
    }

    async fn fetch(&self, params: SearchParams) -> FetchOutcome {
        let generation = {
            let mut state = self.lock();
            let signature = params.signature();
            if state.last_signature.as_ref() == Some(&signature) {
                debug!("[SearchController] skipping duplicate search {:?}", params);
                return FetchOutcome::Skipped;
            }
            state.last_signature = Some(signature);
            state.search_generation += 1;
            state.search_generation
        };

        let result = self.api.search_markers(&params).await;

        let mut state = self.lock();
        if generation != state.search_generation {
            debug!(
                "[SearchController] dropping search #{} (latest is #{})",
                generation, state.search_generation
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(markers) => {
                let count = markers.len();
                state.markers = markers;
                info!("[SearchController] search #{}: {} markers", generation, count);
                FetchOutcome::Applied { count }
            }
            Err(e) => {
                warn!(
                    "[SearchController] search #{} failed, keeping {} markers: {}",
                    generation,
                    state.markers.len(),
                    e
                );
                FetchOutcome::Failed(e)
            }
        }
    }

    /// A marker was tapped. Returns `Ok(None)` when a later selection
    /// superseded this one before it resolved.
    ///
    /// On failure the selection is cleared and the error returned.
    pub async fn on_marker_selected(&self, marker_id: i64) -> Result<Option<SessionSummary>> {
        let generation = {
            let mut state = self.lock();
            state.selection_generation += 1;
            state.selected_id = Some(marker_id);
            state.selected_summary = None;
            state.selection_generation
        };

        let result = self.api.get_session_summary(marker_id).await;

        let mut state = self.lock();
        if generation != state.selection_generation {
            debug!(
                "[SearchController] summary for {} superseded",
                marker_id
            );
            return Ok(None);
        }

        match result {
            Ok(summary) => {
                state.selected_summary = Some(summary.clone());
                Ok(Some(summary))
            }
            Err(e) => {
                warn!("[SearchController] summary for {} failed: {}", marker_id, e);
                state.selected_id = None;
                Err(e)
            }
        }
    }

    /// Drop the current selection and ignore any summary still in flight.
    pub fn clear_selection(&self) {
        let mut state = self.lock();
        state.selection_generation += 1;
        state.selected_id = None;
        state.selected_summary = None;
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.lock().markers.clone()
    }

    pub fn active_filters(&self) -> FilterSet {
        self.lock().filters.clone()
    }

    pub fn last_bounds(&self) -> Option<BoundingBox> {
        self.lock().last_bounds
    }

    pub fn selected_session_id(&self) -> Option<i64> {
        self.lock().selected_id
    }

    pub fn selected_summary(&self) -> Option<SessionSummary> {
        self.lock().selected_summary.clone()
    }
}
