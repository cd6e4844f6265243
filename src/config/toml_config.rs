use crate::adapters::google::DEFAULT_BASE_URL;
use crate::core::ConfigProvider;
use crate::domain::model::SearchRadius;
use crate::utils::error::{PickerError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";
pub const HOST_ENV: &str = "FORK_FORTUNE_HOST";
pub const PORT_ENV: &str = "FORK_FORTUNE_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_radius_km: Option<i64>,
    pub min_radius_km: Option<i64>,
    pub max_radius_km: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub timeout_seconds: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_idle_minutes: Option<u64>,
    pub json_logs: Option<bool>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PickerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 只用環境變數建立配置
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_fallbacks();
        config
    }

    /// 有設定檔就讀檔，缺少的值再由環境變數補上
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };
        let mut config = Self::from_file(path)?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    fn apply_env_fallbacks(&mut self) {
        if self.api_key().is_none() {
            self.google.api_key = std::env::var(API_KEY_ENV).ok();
        }
        if self.server.host.is_none() {
            self.server.host = std::env::var(HOST_ENV).ok();
        }
        if self.server.port.is_none() {
            self.server.port = match std::env::var(PORT_ENV) {
                Ok(raw) => match raw.parse() {
                    Ok(port) => Some(port),
                    Err(e) => {
                        tracing::warn!("Invalid {} value '{}': {}", PORT_ENV, raw, e);
                        None
                    }
                },
                Err(_) => None,
            };
        }
    }

    /// 替換環境變數 (例如 ${GOOGLE_PLACES_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PickerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(3000)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        let minutes = self.server.session_idle_minutes.unwrap_or(30);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// 需要呼叫 Places API 的命令在開始前先確認金鑰
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| PickerError::MissingConfigError {
            field: format!("google.api_key (or {})", API_KEY_ENV),
        })
    }

    pub fn json_logs(&self) -> bool {
        self.server.json_logs.unwrap_or(false)
    }

    pub fn default_radius(&self) -> SearchRadius {
        SearchRadius::new(self.default_radius_km()).unwrap_or_default()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("google.base_url", self.places_base_url())?;

        if let Some(seconds) = self.google.request_timeout_seconds {
            validate_positive_number("google.request_timeout_seconds", seconds, 1)?;
        }
        if let Some(seconds) = self.location.timeout_seconds {
            validate_positive_number("location.timeout_seconds", seconds, 1)?;
        }
        if let Some(minutes) = self.server.session_idle_minutes {
            validate_positive_number("server.session_idle_minutes", minutes, 1)?;
        }

        let (min, max) = self.radius_bounds();
        if min < 1 {
            return Err(PickerError::InvalidConfigValueError {
                field: "search.min_radius_km".to_string(),
                value: min.to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }
        if max < min {
            return Err(PickerError::InvalidConfigValueError {
                field: "search.max_radius_km".to_string(),
                value: max.to_string(),
                reason: format!("Value must not be below search.min_radius_km ({})", min),
            });
        }
        validate_range("search.default_radius_km", self.default_radius_km(), min, max)?;

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lng)) => {
                crate::domain::model::Coordinate::new(lat, lng).map_err(|e| {
                    PickerError::ConfigValidationError {
                        field: "location".to_string(),
                        message: e.to_string(),
                    }
                })?;
            }
            (None, None) => {}
            _ => {
                return Err(PickerError::ConfigValidationError {
                    field: "location".to_string(),
                    message: "latitude and longitude must be set together".to_string(),
                })
            }
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn api_key(&self) -> Option<&str> {
        // 未被替換的 ${VAR} 視為未設定
        self.google
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    fn places_base_url(&self) -> &str {
        self.google.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.google.request_timeout_seconds.unwrap_or(15))
    }

    fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location.timeout_seconds.unwrap_or(10))
    }

    fn default_radius_km(&self) -> i64 {
        self.search.default_radius_km.unwrap_or(SearchRadius::DEFAULT_KM)
    }

    fn radius_bounds(&self) -> (i64, i64) {
        (
            self.search.min_radius_km.unwrap_or(1),
            self.search.max_radius_km.unwrap_or(10),
        )
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.places_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.location_timeout(), Duration::from_secs(10));
        assert_eq!(config.radius_bounds(), (1, 10));
        assert_eq!(config.default_radius().km(), 5);
        assert_eq!(config.port(), 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[google]
api_key = "abc123"
base_url = "http://localhost:9999"
request_timeout_seconds = 3

[search]
default_radius_km = 2
min_radius_km = 1
max_radius_km = 20

[location]
timeout_seconds = 5
latitude = 25.03
longitude = 121.56

[server]
host = "127.0.0.1"
port = 8088
session_idle_minutes = 5
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_key(), Some("abc123"));
        assert_eq!(config.places_base_url(), "http://localhost:9999");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.radius_bounds(), (1, 20));
        assert_eq!(config.default_radius_km(), 2);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 8088);
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FORK_FORTUNE_TEST_KEY", "from-env");

        let config = AppConfig::from_toml_str(
            r#"
[google]
api_key = "${FORK_FORTUNE_TEST_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), Some("from-env"));

        std::env::remove_var("FORK_FORTUNE_TEST_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_not_a_key() {
        let config = AppConfig::from_toml_str(
            r#"
[google]
api_key = "${FORK_FORTUNE_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_require_api_key() {
        let missing = AppConfig::default().require_api_key().unwrap_err();
        assert!(matches!(missing, PickerError::MissingConfigError { .. }));
        assert!(missing.to_string().contains(API_KEY_ENV));

        let mut config = AppConfig::default();
        config.google.api_key = Some("abc123".to_string());
        assert_eq!(config.require_api_key().unwrap(), "abc123");
    }

    #[test]
    fn test_huge_idle_minutes_saturate() {
        let mut config = AppConfig::default();
        config.server.session_idle_minutes = Some(u64::MAX);
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(u64::MAX));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad_url = AppConfig::from_toml_str(
            r#"
[google]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_url.validate().is_err());

        let bad_default = AppConfig::from_toml_str(
            r#"
[search]
default_radius_km = 15
"#,
        )
        .unwrap();
        assert!(bad_default.validate().is_err());

        let half_location = AppConfig::from_toml_str(
            r#"
[location]
latitude = 10.0
"#,
        )
        .unwrap();
        assert!(half_location.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 4100\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.port(), 4100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml_str("[google\napi_key = 1").unwrap_err();
        assert!(matches!(err, PickerError::ConfigValidationError { .. }));
    }
}
