use crate::domain::model::{
    BusinessStatus, Coordinate, NearbySearch, PlaceCandidate, ProviderStatus,
};
use crate::domain::ports::{ConfigProvider, Geocoder, PlacesProvider};
use crate::utils::error::{PickerError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const KEY_PREVIEW_CHARS: usize = 4;

// Google Places nearby search 的回應格式
#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<PlaceResult>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    #[serde(default)]
    vicinity: String,
    rating: Option<f64>,
    price_level: Option<u8>,
    #[serde(default)]
    photos: Vec<PhotoResult>,
    geometry: Geometry,
    business_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoResult {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

impl From<PlaceResult> for PlaceCandidate {
    fn from(place: PlaceResult) -> Self {
        PlaceCandidate {
            id: place.place_id,
            name: place.name,
            address: place.vicinity,
            rating: place.rating,
            price_level: place.price_level,
            photo_reference: place.photos.into_iter().next().map(|p| p.photo_reference),
            location: Coordinate {
                lat: place.geometry.location.lat,
                lng: place.geometry.location.lng,
            },
            business_status: place.business_status.as_deref().map(BusinessStatus::parse),
        }
    }
}

/// API 金鑰診斷資訊，不會輸出完整金鑰
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    pub exists: bool,
    pub length: usize,
    pub preview: String,
}

impl KeyStatus {
    pub fn inspect(api_key: Option<&str>) -> Self {
        match api_key {
            Some(key) if !key.is_empty() => {
                let length = key.chars().count();
                let shown: String = key.chars().take(KEY_PREVIEW_CHARS).collect();
                let hidden = "*".repeat(length.saturating_sub(KEY_PREVIEW_CHARS));
                Self {
                    exists: true,
                    length,
                    preview: format!("{}{}", shown, hidden),
                }
            }
            _ => Self {
                exists: false,
                length: 0,
                preview: "N/A".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GooglePlacesClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PickerError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(
            config.places_base_url(),
            config.api_key().map(str::to_string),
            config.request_timeout(),
        )
    }

    pub fn key_status(&self) -> KeyStatus {
        KeyStatus::inspect(self.api_key.as_deref())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn require_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("Google Places API key not configured in environment variables");
            PickerError::provider("Google Places API key not configured")
        })
    }
}

fn transport_error(context: &str, e: reqwest::Error) -> PickerError {
    // 不把 reqwest 錯誤往上傳，統一轉成 ProviderError；網址含金鑰，先移除
    PickerError::provider(format!("{}: {}", context, e.without_url()))
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn nearby_search(
        &self,
        coordinate: Coordinate,
        radius_meters: i64,
        category: &str,
    ) -> Result<NearbySearch> {
        let api_key = self.require_key()?;

        tracing::debug!(
            "Making nearby search request: location={} radius={} type={}",
            coordinate.as_query(),
            radius_meters,
            category
        );
        let response = self
            .client
            .get(self.endpoint("place/nearbysearch/json"))
            .query(&[
                ("location", coordinate.as_query()),
                ("radius", radius_meters.to_string()),
                ("type", category.to_string()),
                ("key", api_key.to_string()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error("Nearby search request failed", e))?;

        let status = response.status();
        tracing::debug!("Nearby search response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google Places API error: {}", body);
            return Err(PickerError::provider(format!("HTTP {}: {}", status, body)));
        }

        let payload: NearbySearchResponse = response
            .json()
            .await
            .map_err(|e| transport_error("Invalid nearby search response", e))?;

        let provider_status = ProviderStatus::parse(&payload.status);
        if let ProviderStatus::Other(raw) = &provider_status {
            tracing::error!(
                "Google Places API error: {} {}",
                raw,
                payload.error_message.as_deref().unwrap_or("")
            );
        }

        Ok(NearbySearch {
            status: provider_status,
            candidates: payload.results.into_iter().map(PlaceCandidate::from).collect(),
            error_message: payload.error_message,
        })
    }

    async fn photo_url(&self, photo_reference: &str, max_width: u32) -> Result<String> {
        let api_key = self.require_key()?;

        let response = self
            .client
            .get(self.endpoint("place/photo"))
            .query(&[
                ("photo_reference", photo_reference.to_string()),
                ("maxwidth", max_width.to_string()),
                ("key", api_key.to_string()),
            ])
            .header(ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| transport_error("Photo request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google Places Photo API error: {}", body);
            return Err(PickerError::provider(format!(
                "Failed to fetch photo (HTTP {}): {}",
                status, body
            )));
        }

        // 轉址後的最終網址即為圖片位置；沒有轉址時仍帶著金鑰，需移除
        Ok(without_api_key(response.url()))
    }
}

fn without_api_key(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != "key")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut clean = url.clone();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept);
    }
    clean.to_string()
}

#[async_trait]
impl Geocoder for GooglePlacesClient {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(PickerError::GeocodeFailed {
                message: "API key not configured".to_string(),
            });
        };

        tracing::debug!("Making geocoding request for {}", coordinate.as_query());
        let response = self
            .client
            .get(self.endpoint("geocode/json"))
            .query(&[
                ("latlng", coordinate.as_query()),
                ("key", api_key.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PickerError::GeocodeFailed {
                message: format!("Geocoding request failed: {}", e.without_url()),
            })?;

        let payload: GeocodeResponse =
            response.json().await.map_err(|e| PickerError::GeocodeFailed {
                message: format!("Invalid geocoding response: {}", e.without_url()),
            })?;

        tracing::debug!("Geocoding response status: {}", payload.status);

        match payload.results.into_iter().next() {
            Some(first) if payload.status == "OK" => Ok(first.formatted_address),
            _ => Err(PickerError::GeocodeFailed {
                message: match payload.error_message {
                    Some(detail) => format!("{} ({})", payload.status, detail),
                    None => payload.status,
                },
            }),
        }
    }
}
