use crate::domain::model::{Coordinate, NearbySearch};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 外部地點供應商（Google Places 等）
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn nearby_search(
        &self,
        coordinate: Coordinate,
        radius_meters: i64,
        category: &str,
    ) -> Result<NearbySearch>;

    /// 解析照片參照為可顯示的圖片網址
    async fn photo_url(&self, photo_reference: &str, max_width: u32) -> Result<String>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String>;
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> Option<&str>;
    fn places_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn location_timeout(&self) -> Duration;
    fn default_radius_km(&self) -> i64;
    fn radius_bounds(&self) -> (i64, i64);
}
