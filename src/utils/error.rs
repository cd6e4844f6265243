use serde::Serialize;
use thiserror::Error;

/// 裝置定位失敗的原因（對應瀏覽器 geolocation 錯誤碼）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
    Unknown,
}

impl LocationFailure {
    /// 由 geolocation 錯誤碼轉換 (0 = 不支援, 1 = 拒絕, 2 = 無法取得, 3 = 逾時)
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => LocationFailure::Unsupported,
            1 => LocationFailure::PermissionDenied,
            2 => LocationFailure::PositionUnavailable,
            3 => LocationFailure::Timeout,
            _ => LocationFailure::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LocationFailure::PermissionDenied => {
                "Location access denied. Please enable location permissions."
            }
            LocationFailure::PositionUnavailable => "Location unavailable. Please try again.",
            LocationFailure::Timeout => "Location request timed out. Please try again.",
            LocationFailure::Unsupported => "Geolocation is not supported by this client",
            LocationFailure::Unknown => "Failed to get your location.",
        }
    }
}

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Location unavailable: {}", .failure.message())]
    LocationUnavailable { failure: LocationFailure },

    #[error("Geocoding failed: {message}")]
    GeocodeFailed { message: String },

    #[error("No eligible restaurants found within {radius_km} km")]
    NoCandidatesFound { radius_km: i64 },

    #[error("Places provider error: {message}")]
    ProviderError { message: String },

    #[error("Invalid input for '{field}' ({value}): {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("A request for this session is already in progress")]
    Busy,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PickerError>;

/// 錯誤的判別值，可複製，作為 workflow 的錯誤旗標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LocationUnavailable,
    GeocodeFailed,
    NoCandidatesFound,
    ProviderError,
    InvalidInput,
    SessionNotFound,
    Busy,
    Config,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Location,
    Provider,
    Input,
    Session,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PickerError {
    pub fn provider(message: impl Into<String>) -> Self {
        PickerError::ProviderError {
            message: message.into(),
        }
    }

    pub fn invalid_input(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        PickerError::InvalidInput {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn location(failure: LocationFailure) -> Self {
        PickerError::LocationUnavailable { failure }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PickerError::LocationUnavailable { .. } => ErrorKind::LocationUnavailable,
            PickerError::GeocodeFailed { .. } => ErrorKind::GeocodeFailed,
            PickerError::NoCandidatesFound { .. } => ErrorKind::NoCandidatesFound,
            PickerError::ProviderError { .. } => ErrorKind::ProviderError,
            PickerError::InvalidInput { .. } => ErrorKind::InvalidInput,
            PickerError::SessionNotFound { .. } => ErrorKind::SessionNotFound,
            PickerError::Busy => ErrorKind::Busy,
            PickerError::ConfigError { .. }
            | PickerError::MissingConfigError { .. }
            | PickerError::InvalidConfigValueError { .. }
            | PickerError::ConfigValidationError { .. } => ErrorKind::Config,
            PickerError::IoError(_) => ErrorKind::Io,
            PickerError::SerializationError(_) => ErrorKind::Serialization,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::LocationUnavailable | ErrorKind::GeocodeFailed => ErrorCategory::Location,
            ErrorKind::NoCandidatesFound | ErrorKind::ProviderError => ErrorCategory::Provider,
            ErrorKind::InvalidInput => ErrorCategory::Input,
            ErrorKind::SessionNotFound | ErrorKind::Busy => ErrorCategory::Session,
            ErrorKind::Config => ErrorCategory::Configuration,
            ErrorKind::Io | ErrorKind::Serialization => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            // 地址解析失敗會退回座標字串，不影響流程
            ErrorKind::GeocodeFailed => ErrorSeverity::Low,
            ErrorKind::LocationUnavailable
            | ErrorKind::NoCandidatesFound
            | ErrorKind::ProviderError
            | ErrorKind::Busy => ErrorSeverity::Medium,
            ErrorKind::InvalidInput | ErrorKind::SessionNotFound => ErrorSeverity::High,
            ErrorKind::Config | ErrorKind::Io | ErrorKind::Serialization => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 給使用者看的訊息，不含傳輸層細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            PickerError::LocationUnavailable { failure } => failure.message().to_string(),
            PickerError::GeocodeFailed { .. } => {
                "Could not resolve an address for your location.".to_string()
            }
            PickerError::NoCandidatesFound { .. } => {
                "No restaurants found in your area. Try increasing the search distance."
                    .to_string()
            }
            PickerError::ProviderError { .. } => "Failed to find restaurants".to_string(),
            PickerError::InvalidInput { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            PickerError::SessionNotFound { .. } => {
                "Your session has expired. Please start again.".to_string()
            }
            PickerError::Busy => "Still picking a restaurant, please wait.".to_string(),
            PickerError::ConfigError { .. }
            | PickerError::MissingConfigError { .. }
            | PickerError::InvalidConfigValueError { .. }
            | PickerError::ConfigValidationError { .. } => format!("Configuration problem: {}", self),
            PickerError::IoError(_) | PickerError::SerializationError(_) => {
                "Internal error".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::LocationUnavailable => "Allow location access and try again.",
            ErrorKind::GeocodeFailed => "Check GOOGLE_PLACES_API_KEY; coordinates are shown instead.",
            ErrorKind::NoCandidatesFound => "Try increasing the search distance.",
            ErrorKind::ProviderError => "Try again later or check the Places API key and quota.",
            ErrorKind::InvalidInput => "Check the supplied coordinates and radius.",
            ErrorKind::SessionNotFound => "Create a new session.",
            ErrorKind::Busy => "Wait for the current pick to finish.",
            ErrorKind::Config => "Check the configuration file and environment variables.",
            ErrorKind::Io | ErrorKind::Serialization => "Retry; report the issue if it persists.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_failure_codes() {
        assert_eq!(LocationFailure::from_code(1), LocationFailure::PermissionDenied);
        assert_eq!(LocationFailure::from_code(2), LocationFailure::PositionUnavailable);
        assert_eq!(LocationFailure::from_code(3), LocationFailure::Timeout);
        assert_eq!(LocationFailure::from_code(42), LocationFailure::Unknown);
        assert_eq!(LocationFailure::from_code(0), LocationFailure::Unsupported);
        assert_eq!(LocationFailure::from_code(-1), LocationFailure::Unknown);
        assert_eq!(
            LocationFailure::PermissionDenied.message(),
            "Location access denied. Please enable location permissions."
        );
    }

    #[test]
    fn test_user_message_hides_provider_details() {
        let err = PickerError::provider("REQUEST_DENIED: key=abc123");
        assert_eq!(err.user_friendly_message(), "Failed to find restaurants");
        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_no_candidates_suggests_wider_radius() {
        let err = PickerError::NoCandidatesFound { radius_km: 2 };
        assert!(err.user_friendly_message().contains("increasing the search distance"));
        assert_eq!(err.category(), ErrorCategory::Provider);
    }

    #[test]
    fn test_geocode_failure_is_low_severity() {
        let err = PickerError::GeocodeFailed {
            message: "ZERO_RESULTS".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }
}
