use crate::domain::model::{Coordinate, UserLocation};
use crate::domain::ports::{Geocoder, LocationProvider};
use crate::utils::error::{LocationFailure, PickerError, Result};
use std::time::Duration;

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// 取得目前位置並反查地址；地址失敗時以座標字串代替
pub async fn acquire_location(
    location_provider: &dyn LocationProvider,
    geocoder: &dyn Geocoder,
    timeout: Duration,
) -> Result<UserLocation> {
    let coordinate = match tokio::time::timeout(timeout, location_provider.current_position()).await
    {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!("⏱️ Location request timed out after {:?}", timeout);
            return Err(PickerError::location(LocationFailure::Timeout));
        }
    };

    let address = describe(geocoder, coordinate).await;
    tracing::info!("📍 Location found: {}", address);

    Ok(UserLocation {
        coordinate,
        address,
    })
}

pub async fn describe(geocoder: &dyn Geocoder, coordinate: Coordinate) -> String {
    match geocoder.reverse_geocode(coordinate).await {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!("⚠️ {}; using coordinates as address", e);
            coordinate.label()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl LocationProvider for Slow {
        async fn current_position(&self) -> Result<Coordinate> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Coordinate::new(0.0, 0.0)
        }
    }

    struct Denied;

    #[async_trait]
    impl LocationProvider for Denied {
        async fn current_position(&self) -> Result<Coordinate> {
            Err(PickerError::location(LocationFailure::PermissionDenied))
        }
    }

    struct Here;

    #[async_trait]
    impl LocationProvider for Here {
        async fn current_position(&self) -> Result<Coordinate> {
            Coordinate::new(37.774929, -122.419416)
        }
    }

    struct NamedGeocoder;

    #[async_trait]
    impl Geocoder for NamedGeocoder {
        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<String> {
            Ok("1 Market St, San Francisco".to_string())
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<String> {
            Err(PickerError::GeocodeFailed {
                message: "REQUEST_DENIED".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_location_unavailable() {
        let err = acquire_location(&Slow, &NamedGeocoder, DEFAULT_LOCATION_TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PickerError::LocationUnavailable {
                failure: LocationFailure::Timeout
            }
        ));
    }

    #[tokio::test]
    async fn test_permission_denied_is_propagated() {
        let err = acquire_location(&Denied, &NamedGeocoder, DEFAULT_LOCATION_TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationUnavailable);
        assert_eq!(
            err.user_friendly_message(),
            "Location access denied. Please enable location permissions."
        );
    }

    #[tokio::test]
    async fn test_geocoded_address() {
        let location = acquire_location(&Here, &NamedGeocoder, DEFAULT_LOCATION_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(location.address, "1 Market St, San Francisco");
    }

    #[tokio::test]
    async fn test_geocode_failure_falls_back_to_coordinates() {
        let location = acquire_location(&Here, &FailingGeocoder, DEFAULT_LOCATION_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(location.address, "37.7749, -122.4194");
        assert_eq!(location.coordinate.lat, 37.774929);
    }
}
