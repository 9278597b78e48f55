#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! Plain data only; callbacks live in `progrid_runtime::GridHandlers`.
//! Defaults match the long-standing audio grid presets:
//!
//! | Option | Default |
//! |--------|---------|
//! | `container_id` | `"pig-audio"` |
//! | `class_prefix` | `"pig-audio"` |
//! | `group_title_height` | 100 |
//! | `row_height` | 50 |
//! | `space_between_rows` | 8 |
//! | `transition_speed_ms` | 500 |
//! | `primary_buffer_px` | 1000 |
//! | `secondary_buffer_px` | 300 |
//! | `settle_delay_ms` | 100 |

use crate::error::GridError;

/// Multiplier applied to `transition_speed_ms` for the transition window.
pub const TRANSITION_WINDOW_SCALE: f64 = 1.5;

/// Configuration for a progressive grid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    /// Identity of the container the host should bind to.
    pub container_id: String,
    /// Prefix for surface class names.
    pub class_prefix: String,
    /// Height of group header rows.
    pub group_title_height: u32,
    /// Height of media rows.
    pub row_height: u32,
    /// Gap between consecutive rows.
    pub space_between_rows: u32,
    /// Duration of position transitions.
    pub transition_speed_ms: u64,
    /// Buffer ahead of the scroll direction.
    pub primary_buffer_px: u32,
    /// Buffer behind the scroll direction.
    pub secondary_buffer_px: u32,
    /// Wait between surface creation and content materialization.
    pub settle_delay_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            container_id: "pig-audio".to_string(),
            class_prefix: "pig-audio".to_string(),
            group_title_height: 100,
            row_height: 50,
            space_between_rows: 8,
            transition_speed_ms: 500,
            primary_buffer_px: 1000,
            secondary_buffer_px: 300,
            settle_delay_ms: 100,
        }
    }
}

impl GridConfig {
    /// Set the container identity.
    #[must_use]
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }

    /// Set the class prefix.
    #[must_use]
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    /// Set header and media row heights.
    #[must_use]
    pub fn with_heights(mut self, group_title_height: u32, row_height: u32) -> Self {
        self.group_title_height = group_title_height;
        self.row_height = row_height;
        self
    }

    /// Set the gap between rows.
    #[must_use]
    pub fn with_spacing(mut self, space_between_rows: u32) -> Self {
        self.space_between_rows = space_between_rows;
        self
    }

    /// Set the transition speed.
    #[must_use]
    pub fn with_transition_speed_ms(mut self, ms: u64) -> Self {
        self.transition_speed_ms = ms;
        self
    }

    /// Set the primary (leading) and secondary (trailing) buffers.
    #[must_use]
    pub fn with_buffers(mut self, primary_px: u32, secondary_px: u32) -> Self {
        self.primary_buffer_px = primary_px;
        self.secondary_buffer_px = secondary_px;
        self
    }

    /// Set the settle delay.
    #[must_use]
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Length of the transition window opened by a layout pass.
    #[must_use]
    pub fn transition_window_ms(&self) -> u64 {
        (self.transition_speed_ms as f64 * TRANSITION_WINDOW_SCALE).round() as u64
    }

    /// Class name for media surfaces.
    #[must_use]
    pub fn figure_class(&self) -> String {
        format!("{}-figure", self.class_prefix)
    }

    /// Class name for header surfaces (applied on top of the figure class).
    #[must_use]
    pub fn title_class(&self) -> String {
        format!("{}-figure-title", self.class_prefix)
    }

    /// Class name applied once content is attached.
    #[must_use]
    pub fn loaded_class(&self) -> String {
        format!("{}-loaded", self.class_prefix)
    }

    /// Reject configurations the layout cannot honour.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.container_id.is_empty() {
            return Err(GridError::InvalidConfig("container_id is empty".into()));
        }
        if self.group_title_height == 0 {
            return Err(GridError::InvalidConfig(
                "group_title_height must be positive".into(),
            ));
        }
        if self.row_height == 0 {
            return Err(GridError::InvalidConfig("row_height must be positive".into()));
        }
        Ok(())
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GridError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_presets() {
        let cfg = GridConfig::default();
        assert_eq!(cfg.container_id, "pig-audio");
        assert_eq!(cfg.group_title_height, 100);
        assert_eq!(cfg.row_height, 50);
        assert_eq!(cfg.space_between_rows, 8);
        assert_eq!(cfg.transition_speed_ms, 500);
        assert_eq!(cfg.primary_buffer_px, 1000);
        assert_eq!(cfg.secondary_buffer_px, 300);
        assert_eq!(cfg.settle_delay_ms, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn transition_window_is_one_and_a_half_speed() {
        assert_eq!(GridConfig::default().transition_window_ms(), 750);
        let cfg = GridConfig::default().with_transition_speed_ms(0);
        assert_eq!(cfg.transition_window_ms(), 0);
    }

    #[test]
    fn class_names_use_prefix() {
        let cfg = GridConfig::default().with_class_prefix("pg");
        assert_eq!(cfg.figure_class(), "pg-figure");
        assert_eq!(cfg.title_class(), "pg-figure-title");
        assert_eq!(cfg.loaded_class(), "pg-loaded");
    }

    #[test]
    fn zero_heights_are_rejected() {
        let cfg = GridConfig::default().with_heights(0, 50);
        assert!(matches!(cfg.validate(), Err(GridError::InvalidConfig(_))));
        let cfg = GridConfig::default().with_heights(100, 0);
        assert!(cfg.validate().is_err());
        let cfg = GridConfig::default().with_container_id("");
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fills_missing_fields() {
        let cfg = GridConfig::from_json(r#"{"row_height": 64, "container_id": "list"}"#).unwrap();
        assert_eq!(cfg.row_height, 64);
        assert_eq!(cfg.container_id, "list");
        assert_eq!(cfg.space_between_rows, 8);
        assert!(GridConfig::from_json(r#"{"row_height": 0}"#).is_err());
    }
}
