//! Configuration module for the order book view

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

use crate::error::{OrderbookError, Result};
use crate::orderbook::{HistogramScale, Layout, DEFAULT_GROUPING_MULTIPLIERS};
use crate::render::{DisplayUnit, HistogramSide};

/// Env var naming the config file, without or with extension
pub const CONFIG_PATH_VAR: &str = "ORDERBOOK_CONFIG";
const DEFAULT_CONFIG_NAME: &str = "orderbook";
const ENV_PREFIX: &str = "ORDERBOOK";

/// View configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Market shown on startup (e.g., "BTC-USD")
    pub market_id: String,

    /// Market tick size, the finest grouping
    pub tick_size: Decimal,

    /// Fraction digits of the market's size step
    pub size_decimals: u32,

    /// Display rows per side
    pub max_rows_per_side: usize,

    pub layout: Layout,
    pub histogram_side: HistogramSide,
    pub display_unit: DisplayUnit,
    pub histogram_scale: HistogramScale,

    /// Canvas geometry in CSS pixels
    pub row_height: f64,
    pub canvas_width: f64,
    pub container_height: f64,
    pub device_pixel_ratio: f64,
    pub row_padding_right: f64,

    /// Rows the spread row must travel past a boundary before its pin changes
    pub hysteresis_rows: f64,

    /// Grouping ladder, as multiples of the market tick
    pub grouping_multipliers: Vec<u32>,

    /// Frame clock period used by the replay driver
    pub frame_interval_ms: u64,

    /// How long a removed row's size stays highlighted; 0 turns it off
    pub removal_highlight_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            market_id: "BTC-USD".to_string(),
            tick_size: Decimal::new(1, 2),
            size_decimals: 4,
            max_rows_per_side: 30,
            layout: Layout::Vertical,
            histogram_side: HistogramSide::Right,
            display_unit: DisplayUnit::Asset,
            histogram_scale: HistogramScale::PerSide,
            row_height: 20.0,
            canvas_width: 300.0,
            container_height: 400.0,
            device_pixel_ratio: 1.0,
            row_padding_right: 8.0,
            hysteresis_rows: 1.0,
            grouping_multipliers: DEFAULT_GROUPING_MULTIPLIERS.to_vec(),
            frame_interval_ms: 16,
            removal_highlight_ms: 100,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
        Self::load_from(&path)
    }

    /// Load with `path` as the config file; a missing file is not an error
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("grouping_multipliers"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        info!(
            market = %config.market_id,
            tick_size = %config.tick_size,
            max_rows = config.max_rows_per_side,
            layout = ?config.layout,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows_per_side == 0 {
            return Err(invalid("max_rows_per_side must be greater than zero"));
        }
        if self.tick_size <= Decimal::ZERO {
            return Err(invalid(format!("tick_size must be positive, got {}", self.tick_size)));
        }
        if !(self.row_height > 0.0) {
            return Err(invalid(format!("row_height must be positive, got {}", self.row_height)));
        }
        if !(self.device_pixel_ratio > 0.0) {
            return Err(invalid("device_pixel_ratio must be positive"));
        }
        if self.canvas_width < 0.0 || self.container_height < 0.0 {
            return Err(invalid("canvas dimensions must not be negative"));
        }
        if !(self.hysteresis_rows >= 0.0) {
            return Err(invalid("hysteresis_rows must not be negative"));
        }
        if self.grouping_multipliers.is_empty() {
            return Err(invalid("grouping_multipliers must not be empty"));
        }
        if self.grouping_multipliers.contains(&0) {
            return Err(invalid("grouping_multipliers must be positive"));
        }
        if self.frame_interval_ms == 0 {
            return Err(invalid("frame_interval_ms must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> OrderbookError {
    OrderbookError::ConfigError(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grouping_multipliers, vec![1, 2, 5, 10, 20, 50, 100, 1000]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orderbook.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
market_id = "ETH-USD"
tick_size = "0.1"
max_rows_per_side = 12
layout = "horizontal"
histogram_side = "left"
display_unit = "fiat"
histogram_scale = "shared"
grouping_multipliers = [1, 10, 100]
"#
        )
        .unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.market_id, "ETH-USD");
        assert_eq!(config.tick_size, dec!(0.1));
        assert_eq!(config.max_rows_per_side, 12);
        assert_eq!(config.layout, Layout::Horizontal);
        assert_eq!(config.histogram_side, HistogramSide::Left);
        assert_eq!(config.display_unit, DisplayUnit::Fiat);
        assert_eq!(config.histogram_scale, HistogramScale::Shared);
        assert_eq!(config.grouping_multipliers, vec![1, 10, 100]);
        // untouched keys keep their defaults
        assert_eq!(config.row_height, 20.0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.max_rows_per_side, Config::default().max_rows_per_side);
    }

    #[test]
    fn test_zero_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "max_rows_per_side = 0\n").unwrap();

        let err = Config::load_from(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, OrderbookError::ConfigError(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            Config {
                tick_size: Decimal::ZERO,
                ..Config::default()
            },
            Config {
                row_height: 0.0,
                ..Config::default()
            },
            Config {
                grouping_multipliers: vec![],
                ..Config::default()
            },
            Config {
                grouping_multipliers: vec![1, 0],
                ..Config::default()
            },
            Config {
                hysteresis_rows: -1.0,
                ..Config::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
