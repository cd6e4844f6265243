use crate::utils::error::{PickerError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const METERS_PER_KM: i64 = 1000;

/// 經緯度（十進位度數）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PickerError::invalid_input(
                "lat",
                lat,
                "Latitude must be a finite number between -90 and 90",
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(PickerError::invalid_input(
                "lng",
                lng,
                "Longitude must be a finite number between -180 and 180",
            ));
        }
        Ok(Self { lat, lng })
    }

    /// 地址解析失敗時顯示的座標字串
    pub fn label(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// 供應商 API 使用的 `lat,lng` 參數格式
    pub fn as_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// 搜尋半徑（公里，整數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SearchRadius(i64);

impl SearchRadius {
    pub const DEFAULT_KM: i64 = 5;

    /// 公里數必須大於零，且換算成公尺不可溢位
    pub fn new(km: i64) -> Result<Self> {
        if km <= 0 {
            return Err(PickerError::invalid_input(
                "radius_km",
                km,
                "Search radius must be greater than zero",
            ));
        }
        if km.checked_mul(METERS_PER_KM).is_none() {
            return Err(PickerError::invalid_input(
                "radius_km",
                km,
                "Search radius is too large",
            ));
        }
        Ok(Self(km))
    }

    /// 以公尺表示，四捨五入到整數公里（最少 1 公里）
    pub fn from_meters(meters: i64) -> Result<Self> {
        if meters <= 0 {
            return Err(PickerError::invalid_input(
                "radius",
                meters,
                "Search radius must be greater than zero",
            ));
        }
        let rounded = meters.checked_add(METERS_PER_KM / 2).ok_or_else(|| {
            PickerError::invalid_input("radius", meters, "Search radius is too large")
        })?;
        Self::new((rounded / METERS_PER_KM).max(1))
    }

    pub fn km(&self) -> i64 {
        self.0
    }

    pub fn meters(&self) -> i64 {
        self.0 * METERS_PER_KM
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self(Self::DEFAULT_KM)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessStatus {
    Operational,
    ClosedTemporarily,
    ClosedPermanently,
    Other(String),
}

impl BusinessStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OPERATIONAL" => BusinessStatus::Operational,
            "CLOSED_TEMPORARILY" => BusinessStatus::ClosedTemporarily,
            "CLOSED_PERMANENTLY" => BusinessStatus::ClosedPermanently,
            other => BusinessStatus::Other(other.to_string()),
        }
    }
}

/// 供應商回傳的餐廳資料，workflow 不會修改任何欄位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCandidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub photo_reference: Option<String>,
    pub location: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_status: Option<BusinessStatus>,
}

impl PlaceCandidate {
    /// 價位標示，例如 `$$`
    pub fn price_label(&self) -> Option<String> {
        match self.price_level {
            Some(level) if level > 0 => Some("$".repeat(level as usize)),
            _ => None,
        }
    }

    pub fn maps_url(&self) -> String {
        let query = format!("{} {}", self.name, self.address);
        match Url::parse_with_params(
            MAPS_SEARCH_URL,
            &[
                ("api", "1"),
                ("query", query.as_str()),
                ("query_place_id", self.id.as_str()),
            ],
        ) {
            Ok(url) => url.to_string(),
            Err(_) => MAPS_SEARCH_URL.to_string(),
        }
    }
}

/// 一次 discover 的結果，保持供應商回傳順序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSet {
    pub coordinate: Coordinate,
    pub radius: SearchRadius,
    pub candidates: Vec<PlaceCandidate>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub coordinate: Coordinate,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    Other(String),
}

impl ProviderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OK" => ProviderStatus::Ok,
            "ZERO_RESULTS" => ProviderStatus::ZeroResults,
            other => ProviderStatus::Other(other.to_string()),
        }
    }
}

/// nearby search 的回應：候選清單與供應商狀態
#[derive(Debug, Clone)]
pub struct NearbySearch {
    pub status: ProviderStatus,
    pub candidates: Vec<PlaceCandidate>,
    pub error_message: Option<String>,
}

impl NearbySearch {
    pub fn ok(candidates: Vec<PlaceCandidate>) -> Self {
        Self {
            status: ProviderStatus::Ok,
            candidates,
            error_message: None,
        }
    }
}
