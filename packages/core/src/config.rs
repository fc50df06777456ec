//! Designer configuration
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::VisibleItem;
use crate::palette::DEFAULT_VISIBLE_ITEMS;

/// Upper bound for deferred-work delays; anything longer is a misconfiguration
const MAX_DELAY_MS: u64 = 10_000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Tunables for the designer core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignerConfig {
    /// Delay before the item list is resampled after a document event
    pub resync_settle_ms: u64,

    /// Delay before the cursor is placed inside a freshly inserted block
    pub focus_delay_ms: u64,

    /// Dead zone at the top and bottom of a column, in pixels
    pub column_edge_margin: f64,

    /// Granularity used to collapse duplicate item rectangles, in pixels
    pub midpoint_rounding: f64,

    /// Capacity of the designer event channel
    pub event_capacity: usize,

    /// Palette entries shown before the user customizes the list
    pub visible_items: Vec<VisibleItem>,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            resync_settle_ms: 50,
            focus_delay_ms: 100,
            column_edge_margin: 10.0,
            midpoint_rounding: 1.0,
            event_capacity: 256,
            visible_items: DEFAULT_VISIBLE_ITEMS
                .iter()
                .map(|tag| VisibleItem::block(*tag))
                .collect(),
        }
    }
}

impl DesignerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn resync_settle_delay(&self) -> Duration {
        Duration::from_millis(self.resync_settle_ms)
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resync_settle_ms > MAX_DELAY_MS || self.focus_delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "delays cannot exceed {}ms",
                MAX_DELAY_MS
            )));
        }

        if !self.column_edge_margin.is_finite() || self.column_edge_margin < 0.0 {
            return Err(ConfigError::Invalid(
                "columnEdgeMargin must be a non-negative number".to_string(),
            ));
        }

        if !self.midpoint_rounding.is_finite() || self.midpoint_rounding <= 0.0 {
            return Err(ConfigError::Invalid(
                "midpointRounding must be greater than 0".to_string(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "eventCapacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_config() {
        let config = DesignerConfig::default();
        assert_eq!(config.resync_settle_delay(), Duration::from_millis(50));
        assert_eq!(config.visible_items.len(), DEFAULT_VISIBLE_ITEMS.len());
        assert_ok!(config.validate());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DesignerConfig::default();

        config.column_edge_margin = -1.0;
        assert_err!(config.validate());

        config.column_edge_margin = 10.0;
        config.midpoint_rounding = 0.0;
        assert_err!(config.validate());

        config.midpoint_rounding = 1.0;
        config.event_capacity = 0;
        assert_err!(config.validate());

        config.event_capacity = 16;
        config.focus_delay_ms = 60_000;
        assert_err!(config.validate());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = assert_ok!(DesignerConfig::from_json_str(
            r#"{"columnEdgeMargin": 4, "visibleItems": ["text", {"type": "button", "presetKey": "cta"}]}"#,
        ));
        assert_eq!(config.column_edge_margin, 4.0);
        assert_eq!(config.resync_settle_ms, 50);
        assert_eq!(config.visible_items[1], VisibleItem::preset("button", "cta"));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            DesignerConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DesignerConfig::from_json_str(r#"{"eventCapacity": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
