use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// One fetch job as described by the JSON file passed to `--config`.
///
/// The legacy config format wrote its flags as the strings "true"/"false";
/// they are parsed into real booleans here (case-insensitively, JSON booleans
/// also accepted) so the fetch logic never does string comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub name: String,
    pub url: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Query parameters; string values may contain the literal placeholders
    /// `{start_date}` and `{end_date}`.
    #[serde(default)]
    pub params: HashMap<String, Value>,

    #[serde(default, deserialize_with = "flag")]
    pub pagination: bool,

    #[serde(default = "default_true", deserialize_with = "flag")]
    pub includes_end_date: bool,

    #[serde(default, deserialize_with = "flag")]
    pub precise_timestamp: bool,

    // Always overwritten with the CLI-resolved range before fetching,
    // see apply_date_range.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

fn default_true() -> bool {
    true
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected 'true' or 'false', got '{}'",
                other
            ))),
        },
        other => Err(D::Error::custom(format!(
            "expected a boolean flag, got {}",
            other
        ))),
    }
}

impl ApiConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read config file {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| EtlError::ConfigError {
            message: format!("config parsing error: {}", e),
        })
    }

    /// The CLI-resolved range always wins over dates present in the config
    /// file.
    pub fn apply_date_range(&mut self, start: String, end: String) {
        self.start_date = Some(start);
        self.end_date = Some(end);
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.name)?;
        validation::validate_url("url", &self.url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = ApiConfig::from_json_str(
            r#"{"name": "shop", "url": "https://api.example.com/orders"}"#,
        )
        .unwrap();

        assert_eq!(config.name, "shop");
        assert!(!config.pagination);
        assert!(config.includes_end_date);
        assert!(!config.precise_timestamp);
        assert!(config.headers.is_empty());
        assert!(config.params.is_empty());
    }

    #[test]
    fn test_parse_string_flags_case_insensitive() {
        let config = ApiConfig::from_json_str(
            r#"{
                "name": "shop",
                "url": "https://api.example.com/orders",
                "pagination": "TRUE",
                "includes_end_date": "False",
                "precise_timestamp": "true"
            }"#,
        )
        .unwrap();

        assert!(config.pagination);
        assert!(!config.includes_end_date);
        assert!(config.precise_timestamp);
    }

    #[test]
    fn test_parse_native_boolean_flags() {
        let config = ApiConfig::from_json_str(
            r#"{
                "name": "shop",
                "url": "https://api.example.com/orders",
                "pagination": true,
                "includes_end_date": false
            }"#,
        )
        .unwrap();

        assert!(config.pagination);
        assert!(!config.includes_end_date);
    }

    #[test]
    fn test_invalid_flag_value_is_config_error() {
        let result = ApiConfig::from_json_str(
            r#"{"name": "shop", "url": "https://api.example.com", "pagination": "maybe"}"#,
        );
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }

    #[test]
    fn test_config_file_dates_are_overwritten() {
        let mut config = ApiConfig::from_json_str(
            r#"{
                "name": "shop",
                "url": "https://api.example.com",
                "start_date": "1999-01-01",
                "end_date": "1999-01-02"
            }"#,
        )
        .unwrap();

        config.apply_date_range("2024-01-01".to_string(), "2024-01-10".to_string());
        assert_eq!(config.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(config.end_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let config =
            ApiConfig::from_json_str(r#"{"name": "shop", "url": "not-a-url"}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
