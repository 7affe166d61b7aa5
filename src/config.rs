use serde::{Deserialize, Serialize};

use crate::renderer::{CANVAS_HEIGHT, CANVAS_WIDTH};

pub const DEFAULT_API_BASE: &str = "https://ftc-api.firstinspires.org/v2.0";
pub const DEFAULT_SEASON: u32 = 2025;
pub const DEFAULT_EVENT_CODE: &str = "CAABCMP";

/// Settings for one annotation canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Seconds between the end of a gesture and its auto-save
    pub auto_save_delay_secs: f64,
    /// Upper bound on the serialized scouting data, in bytes
    pub storage_quota_bytes: Option<usize>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            auto_save_delay_secs: 0.1,
            storage_quota_bytes: None,
        }
    }
}

/// Application settings, persisted with the app state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct ScoutConfig {
    pub api_base_url: String,
    pub season: u32,
    pub event_code: String,
    pub canvas: CanvasConfig,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_owned(),
            season: DEFAULT_SEASON,
            event_code: DEFAULT_EVENT_CODE.to_owned(),
            canvas: CanvasConfig::default(),
        }
    }
}

impl ScoutConfig {
    /// Apply `FTC_API_BASE`, `FTC_SEASON` and `FTC_EVENT_CODE` from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup("FTC_API_BASE") {
            self.api_base_url = base.trim_end_matches('/').to_owned();
        }
        if let Some(season) = lookup("FTC_SEASON") {
            match season.trim().parse() {
                Ok(season) => self.season = season,
                Err(err) => log::warn!("Ignoring FTC_SEASON={:?}: {}", season, err),
            }
        }
        if let Some(event) = lookup("FTC_EVENT_CODE") {
            self.event_code = event.trim().to_uppercase();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_are_applied() {
        let mut config = ScoutConfig::default();
        config.apply_overrides(|key| match key {
            "FTC_API_BASE" => Some("http://localhost:3001/api/v2.0/".to_owned()),
            "FTC_SEASON" => Some("2024".to_owned()),
            "FTC_EVENT_CODE" => Some("usnycmp".to_owned()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://localhost:3001/api/v2.0");
        assert_eq!(config.season, 2024);
        assert_eq!(config.event_code, "USNYCMP");
    }

    #[test]
    fn test_bad_season_is_ignored() {
        let mut config = ScoutConfig::default();
        config.apply_overrides(|key| (key == "FTC_SEASON").then(|| "next year".to_owned()));
        assert_eq!(config.season, DEFAULT_SEASON);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: ScoutConfig = serde_json::from_str(r#"{ "event_code": "FTCCMP1" }"#).unwrap();
        assert_eq!(config.event_code, "FTCCMP1");
        assert_eq!(config.canvas, CanvasConfig::default());
    }
}
