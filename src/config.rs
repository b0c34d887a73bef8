use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    /// Discount applied to newly added quote lines when /add gives none.
    pub default_discount_percent: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "quotedesk.db".to_string(),
            default_discount_percent: 0.0,
        }
    }
}

/// Loads configuration from file; a missing file means defaults, a malformed
/// one is a startup error.
pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("{} not found, using default configuration", path);
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("definitely-not-here.json").unwrap();
        assert_eq!(config.database_path, "quotedesk.db");
        assert_eq!(config.default_discount_percent, 0.0);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "default_discount_percent": 5.0 }"#).unwrap();
        assert_eq!(config.database_path, "quotedesk.db");
        assert_eq!(config.default_discount_percent, 5.0);
    }
}
