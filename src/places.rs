//! Nearest place name for a coordinate, via the Kakao Local REST API.
//!
//! Lookup order:
//! 1. Category search (tourist attractions) within 200 m, nearest first
//! 2. Coordinate-to-address: building name, road address, lot address
//! 3. [`FALLBACK_PLACE_NAME`]
//!
//! Resolution never fails; a missing key or any failed call falls through
//! to the next step.

use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Result, RunmateError};
use crate::GeoPoint;

pub const FALLBACK_PLACE_NAME: &str = "Selected location";

const KAKAO_BASE_URL: &str = "https://dapi.kakao.com";
const SEARCH_RADIUS_M: u32 = 200;
const CATEGORY_ATTRACTION: &str = "AT4";

#[derive(Debug, Deserialize)]
struct CategorySearchResponse {
    #[serde(default)]
    documents: Vec<CategoryDocument>,
}

#[derive(Debug, Deserialize)]
struct CategoryDocument {
    place_name: String,
}

#[derive(Debug, Deserialize)]
struct Coord2AddressResponse {
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    #[serde(default)]
    address: Option<LotAddress>,
    #[serde(default)]
    road_address: Option<RoadAddress>,
}

#[derive(Debug, Deserialize)]
struct LotAddress {
    address_name: String,
}

#[derive(Debug, Deserialize)]
struct RoadAddress {
    address_name: String,
    #[serde(default)]
    building_name: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn pick_place_name(response: &CategorySearchResponse) -> Option<String> {
    response
        .documents
        .first()
        .and_then(|doc| non_empty(&doc.place_name))
}

fn pick_address_name(response: &Coord2AddressResponse) -> Option<String> {
    let doc = response.documents.first()?;
    let road = doc.road_address.as_ref();
    road.and_then(|r| r.building_name.as_deref().and_then(non_empty))
        .or_else(|| road.and_then(|r| non_empty(&r.address_name)))
        .or_else(|| doc.address.as_ref().and_then(|a| non_empty(&a.address_name)))
}

#[derive(Debug, Clone)]
pub struct PlaceNameResolver {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlaceNameResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, KAKAO_BASE_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RunmateError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.places_api_key.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("KakaoAK {}", key))
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RunmateError::http(
                format!("Kakao Local API error: {}", status.as_u16()),
                Some(status.as_u16()),
            ));
        }
        Ok(resp.json::<T>().await?)
    }

    /// Name to show for the meeting point at `point`.
    pub async fn resolve(&self, point: GeoPoint) -> String {
        let Some(key) = self.api_key.as_deref() else {
            return FALLBACK_PLACE_NAME.to_string();
        };
        let x = point.longitude.to_string();
        let y = point.latitude.to_string();

        let category = self
            .get::<CategorySearchResponse>(
                key,
                "/v2/local/search/category.json",
                &[
                    ("category_group_code", CATEGORY_ATTRACTION.to_string()),
                    ("x", x.clone()),
                    ("y", y.clone()),
                    ("radius", SEARCH_RADIUS_M.to_string()),
                    ("sort", "distance".to_string()),
                ],
            )
            .await;
        match category {
            Ok(resp) => {
                if let Some(name) = pick_place_name(&resp) {
                    debug!("[Places] category hit: {}", name);
                    return name;
                }
            }
            Err(e) => warn!("[Places] category search failed: {}", e),
        }

        let address = self
            .get::<Coord2AddressResponse>(
                key,
                "/v2/local/geo/coord2address.json",
                &[("x", x), ("y", y)],
            )
            .await;
        match address {
            Ok(resp) => pick_address_name(&resp).unwrap_or_else(|| FALLBACK_PLACE_NAME.to_string()),
            Err(e) => {
                warn!("[Places] address lookup failed: {}", e);
                FALLBACK_PLACE_NAME.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(json: &str) -> Option<String> {
        let resp: Coord2AddressResponse = serde_json::from_str(json).unwrap();
        pick_address_name(&resp)
    }

    #[test]
    fn test_address_preference() {
        let both = r#"{"documents":[{
            "address": {"address_name": "Taepyeong-ro 1-ga 31"},
            "road_address": {"address_name": "110 Sejong-daero", "building_name": "City Hall"}
        }]}"#;
        assert_eq!(address(both).as_deref(), Some("City Hall"));

        let no_building = r#"{"documents":[{
            "address": {"address_name": "Taepyeong-ro 1-ga 31"},
            "road_address": {"address_name": "110 Sejong-daero", "building_name": ""}
        }]}"#;
        assert_eq!(address(no_building).as_deref(), Some("110 Sejong-daero"));

        let lot_only = r#"{"documents":[{"address": {"address_name": "Taepyeong-ro 1-ga 31"}}]}"#;
        assert_eq!(address(lot_only).as_deref(), Some("Taepyeong-ro 1-ga 31"));

        assert_eq!(address(r#"{"documents":[]}"#), None);
    }

    #[test]
    fn test_category_pick() {
        let resp: CategorySearchResponse = serde_json::from_str(
            r#"{"documents":[{"place_name":"Deoksugung","distance":"120"}],"meta":{"total_count":1}}"#,
        )
        .unwrap();
        assert_eq!(pick_place_name(&resp).as_deref(), Some("Deoksugung"));
    }

    #[tokio::test]
    async fn test_no_key_falls_back() {
        let resolver = PlaceNameResolver::new(&Config::default()).unwrap();
        assert!(!resolver.has_api_key());
        let name = resolver.resolve(GeoPoint::new(37.5642, 127.0017)).await;
        assert_eq!(name, FALLBACK_PLACE_NAME);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let config = Config::default().with_places_api_key("test-key");
        let resolver = PlaceNameResolver::with_base_url(&config, "http://127.0.0.1:1").unwrap();
        let name = resolver.resolve(GeoPoint::new(37.5642, 127.0017)).await;
        assert_eq!(name, FALLBACK_PLACE_NAME);
    }
}
