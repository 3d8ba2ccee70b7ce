//! Route drawn on the map while creating a session.
//!
//! The first node is the meeting point. Length is the sum of great-circle
//! legs, shown with two decimals and sent as the session's target distance.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunmateError};
use crate::types::PolylinePoint;
use crate::GeoPoint;

/// Location and route fields of the create-session form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFormData {
    pub location_name: String,
    /// Meeting point longitude
    pub location_x: f64,
    /// Meeting point latitude
    pub location_y: f64,
    pub route_polyline: Vec<PolylinePoint>,
    pub target_distance_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDraft {
    nodes: Vec<GeoPoint>,
    location_name: String,
}

impl RouteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node where the user tapped.
    pub fn push(&mut self, point: GeoPoint) -> Result<()> {
        if !point.is_valid() {
            return Err(RunmateError::Validation {
                message: format!(
                    "invalid route point {}, {}",
                    point.latitude, point.longitude
                ),
            });
        }
        self.nodes.push(point);
        Ok(())
    }

    /// Remove the last node.
    pub fn undo(&mut self) -> Option<GeoPoint> {
        let removed = self.nodes.pop();
        if self.nodes.is_empty() {
            self.location_name.clear();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.location_name.clear();
    }

    pub fn nodes(&self) -> &[GeoPoint] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Meeting point (first node).
    pub fn start(&self) -> Option<GeoPoint> {
        self.nodes.first().copied()
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Name shown for the meeting point, usually from the place lookup.
    pub fn set_location_name(&mut self, name: impl Into<String>) {
        self.location_name = name.into();
    }

    /// Route length in meters.
    pub fn length_m(&self) -> f64 {
        self.nodes
            .windows(2)
            .map(|leg| {
                Haversine::distance(
                    Point::new(leg[0].longitude, leg[0].latitude),
                    Point::new(leg[1].longitude, leg[1].latitude),
                )
            })
            .sum()
    }

    /// Route length in km, rounded to two decimals.
    pub fn distance_km(&self) -> f64 {
        (self.length_m() / 10.0).round() / 100.0
    }

    /// Fields for the create-session request. The meeting point is `0, 0`
    /// while nothing has been drawn.
    pub fn to_location_form(&self) -> LocationFormData {
        let start = self.start().unwrap_or(GeoPoint::new(0.0, 0.0));
        LocationFormData {
            location_name: self.location_name.clone(),
            location_x: start.longitude,
            location_y: start.latitude,
            route_polyline: self.nodes.iter().map(|&p| p.into()).collect(),
            target_distance_km: self.distance_km(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(points: &[(f64, f64)]) -> RouteDraft {
        let mut route = RouteDraft::new();
        for &(lat, lng) in points {
            route.push(GeoPoint::new(lat, lng)).unwrap();
        }
        route
    }

    #[test]
    fn test_length_of_one_degree_of_latitude() {
        let route = draft(&[(37.0, 127.0), (38.0, 127.0)]);
        // ~111.2 km per degree of latitude
        assert!((route.distance_km() - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_empty_and_single_point_have_no_length() {
        assert_eq!(RouteDraft::new().distance_km(), 0.0);
        assert_eq!(draft(&[(37.5, 127.0)]).distance_km(), 0.0);
    }

    #[test]
    fn test_push_rejects_invalid_points() {
        let mut route = RouteDraft::new();
        assert!(route.push(GeoPoint::new(f64::NAN, 127.0)).is_err());
        assert!(route.push(GeoPoint::new(37.0, 200.0)).is_err());
        assert!(route.is_empty());
    }

    #[test]
    fn test_undo_clears_name_with_last_node() {
        let mut route = draft(&[(37.5, 127.0), (37.51, 127.01)]);
        route.set_location_name("City Hall");
        assert!(route.undo().is_some());
        assert_eq!(route.location_name(), "City Hall");
        assert!(route.undo().is_some());
        assert_eq!(route.location_name(), "");
        assert!(route.undo().is_none());
    }

    #[test]
    fn test_location_form_uses_start_node() {
        let mut route = draft(&[(37.5444, 127.0374), (37.5452, 127.0411)]);
        route.set_location_name("Seoul Forest");
        let form = route.to_location_form();
        assert_eq!(form.location_x, 127.0374);
        assert_eq!(form.location_y, 37.5444);
        assert_eq!(form.route_polyline.len(), 2);
        assert_eq!(form.route_polyline[1].x, 127.0411);
        assert!(form.target_distance_km > 0.0);
    }
}
