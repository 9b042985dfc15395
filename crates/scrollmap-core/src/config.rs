#![forbid(unsafe_code)]

//! Per-instance minimap configuration.
//!
//! Style and layout strategy only change the shape the position calculator
//! produces; the store and the engine behave the same under every setting.
//!
//! # Environment
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `SCROLLMAP_STYLE` | `line`, `region` | `line` |
//! | `SCROLLMAP_LAYOUT` | `measured`, `counted` | `measured` |
//! | `SCROLLMAP_MIN_REGION` | positive number | `2` |
//! | `SCROLLMAP_MAX_RETRIES` | integer | `8` |

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which primitive shape markers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MarkerStyle {
    /// A line at the item's vertical center.
    #[default]
    Line,
    /// A band covering the item's full extent.
    Region,
}

impl FromStr for MarkerStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "region" => Ok(Self::Region),
            _ => Err(ConfigError::InvalidStyle(s.to_string())),
        }
    }
}

impl fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Line => "line",
            Self::Region => "region",
        })
    }
}

/// How an item's extent is mapped onto the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayoutStrategy {
    /// Use the item's measured top/height scaled by surface over content
    /// height. Unmeasured items fall back to [`LayoutStrategy::Counted`].
    #[default]
    Measured,
    /// Approximate from the cumulative sum of known item heights.
    Counted,
}

impl FromStr for LayoutStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "measured" => Ok(Self::Measured),
            "counted" => Ok(Self::Counted),
            _ => Err(ConfigError::InvalidLayout(s.to_string())),
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Measured => "measured",
            Self::Counted => "counted",
        })
    }
}

/// Minimap configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MinimapConfig {
    pub style: MarkerStyle,
    pub layout: LayoutStrategy,
    /// Smallest region height, in device-independent pixels.
    pub min_region_height: f64,
    /// Stroke thickness for line markers.
    pub line_thickness: f64,
    /// Consecutive deferred passes allowed while geometry stays unknown.
    pub max_idle_retries: u32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            style: MarkerStyle::Line,
            layout: LayoutStrategy::Measured,
            min_region_height: 2.0,
            line_thickness: 2.0,
            max_idle_retries: 8,
        }
    }
}

impl MinimapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: LayoutStrategy) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn min_region_height(mut self, height: f64) -> Self {
        self.min_region_height = height.max(0.0);
        self
    }

    #[must_use]
    pub fn line_thickness(mut self, thickness: f64) -> Self {
        self.line_thickness = thickness.max(0.0);
        self
    }

    #[must_use]
    pub fn max_idle_retries(mut self, retries: u32) -> Self {
        self.max_idle_retries = retries;
        self
    }

    /// Defaults overridden by `SCROLLMAP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`MinimapConfig::from_env`], with an injectable variable lookup.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = get_env("SCROLLMAP_STYLE") {
            config.style = v.parse()?;
        }
        if let Some(v) = get_env("SCROLLMAP_LAYOUT") {
            config.layout = v.parse()?;
        }
        if let Some(v) = get_env("SCROLLMAP_MIN_REGION") {
            let parsed = v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|h| h.is_finite() && *h >= 0.0);
            config.min_region_height = parsed.ok_or(ConfigError::InvalidNumber {
                key: "SCROLLMAP_MIN_REGION",
                value: v,
            })?;
        }
        if let Some(v) = get_env("SCROLLMAP_MAX_RETRIES") {
            config.max_idle_retries = v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: "SCROLLMAP_MAX_RETRIES",
                value: v.clone(),
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = MinimapConfig::default();
        assert_eq!(config.style, MarkerStyle::Line);
        assert_eq!(config.layout, LayoutStrategy::Measured);
        assert_eq!(config.min_region_height, 2.0);
        assert_eq!(config.max_idle_retries, 8);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(" Region ".parse::<MarkerStyle>(), Ok(MarkerStyle::Region));
        assert_eq!("COUNTED".parse::<LayoutStrategy>(), Ok(LayoutStrategy::Counted));
        assert!("circle".parse::<MarkerStyle>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for style in [MarkerStyle::Line, MarkerStyle::Region] {
            assert_eq!(style.to_string().parse::<MarkerStyle>(), Ok(style));
        }
        for layout in [LayoutStrategy::Measured, LayoutStrategy::Counted] {
            assert_eq!(layout.to_string().parse::<LayoutStrategy>(), Ok(layout));
        }
    }

    #[test]
    fn env_overrides() {
        let config = MinimapConfig::from_env_with(env(&[
            ("SCROLLMAP_STYLE", "region"),
            ("SCROLLMAP_LAYOUT", "counted"),
            ("SCROLLMAP_MIN_REGION", "3.5"),
            ("SCROLLMAP_MAX_RETRIES", "2"),
        ]))
        .unwrap();
        assert_eq!(config.style, MarkerStyle::Region);
        assert_eq!(config.layout, LayoutStrategy::Counted);
        assert_eq!(config.min_region_height, 3.5);
        assert_eq!(config.max_idle_retries, 2);
    }

    #[test]
    fn env_rejects_bad_values() {
        let err = MinimapConfig::from_env_with(env(&[("SCROLLMAP_MIN_REGION", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "SCROLLMAP_MIN_REGION", .. }));

        let err = MinimapConfig::from_env_with(env(&[("SCROLLMAP_STYLE", "dots")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidStyle("dots".into()));
    }

    #[test]
    fn builder_clamps_negative() {
        let config = MinimapConfig::new().min_region_height(-4.0).line_thickness(-1.0);
        assert_eq!(config.min_region_height, 0.0);
        assert_eq!(config.line_thickness, 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_lowercase_names() {
        let config = MinimapConfig::new().style(MarkerStyle::Region);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"region\""));
        let back: MinimapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
