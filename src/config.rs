//! Configuration loader - YAML tuning file + .env settings
//!
//! Every key is optional; missing keys fall back to the built-in defaults.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::{ColorOptions, DEFAULT_RECENT_DAYS};
use crate::layout::LayoutStrategy;
use crate::render::RenderOptions;

/// Main configuration loaded from code_city.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub view: ViewConfig,
    pub render: RenderConfig,
}

/// World-space sizing constants for the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub base_width: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub height_scale: f64,
    pub min_building_height: f64,
    pub building_spacing: f64,
    pub package_padding: f64,
    pub platform_height: f64,
    pub max_per_row: usize,
    pub package_spacing: f64,
    /// Rough package edge length used to pick a row width before packing
    pub estimated_package_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_width: 20.0,
            min_width: 10.0,
            max_width: 60.0,
            height_scale: 0.8,
            min_building_height: 10.0,
            building_spacing: 10.0,
            package_padding: 15.0,
            platform_height: 5.0,
            max_per_row: 6,
            package_spacing: 40.0,
            estimated_package_size: 150.0,
        }
    }
}

/// Auto-fit and zoom limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub fit_padding: f64,
    pub max_fit_scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub zoom_step: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fit_padding: 40.0,
            max_fit_scale: 1.5,
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 1.1,
        }
    }
}

/// Initial state of the viewer toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub strategy: LayoutStrategy,
    pub frequency: bool,
    pub age: bool,
    pub glow: bool,
    pub color_blind: bool,
    pub recent_days: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Quadrant,
            frequency: true,
            age: true,
            glow: true,
            color_blind: false,
            recent_days: DEFAULT_RECENT_DAYS,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            colors: ColorOptions {
                frequency: self.frequency,
                age: self.age,
                color_blind: self.color_blind,
            },
            glow: self.glow,
            recent_days: self.recent_days,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the layout and view math cannot work with
    pub fn validate(&self) -> Result<()> {
        let l = &self.layout;
        ensure!(l.min_width > 0.0, "layout.min_width must be positive");
        ensure!(
            l.min_width <= l.max_width,
            "layout.min_width ({}) exceeds layout.max_width ({})",
            l.min_width,
            l.max_width
        );
        ensure!(l.base_width > 0.0, "layout.base_width must be positive");
        ensure!(l.height_scale >= 0.0, "layout.height_scale must not be negative");
        ensure!(l.min_building_height > 0.0, "layout.min_building_height must be positive");
        ensure!(l.platform_height > 0.0, "layout.platform_height must be positive");
        ensure!(l.max_per_row >= 1, "layout.max_per_row must be at least 1");
        ensure!(
            l.building_spacing >= 0.0 && l.package_padding >= 0.0 && l.package_spacing >= 0.0,
            "layout spacing and padding must not be negative"
        );
        ensure!(l.estimated_package_size > 0.0, "layout.estimated_package_size must be positive");

        let v = &self.view;
        ensure!(
            v.min_scale > 0.0 && v.min_scale <= v.max_scale,
            "view.min_scale must be positive and not above view.max_scale"
        );
        ensure!(v.max_fit_scale > 0.0, "view.max_fit_scale must be positive");
        ensure!(v.zoom_step > 1.0, "view.zoom_step must be greater than 1");
        ensure!(v.fit_padding >= 0.0, "view.fit_padding must not be negative");
        Ok(())
    }
}

/// Settings loaded from .env
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// URL or path of the city JSON
    pub data: Option<String>,
    pub port: u16,
    pub log_dir: String,
    pub web_dir: String,
}

impl Settings {
    /// Load settings from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Settings {
            data: std::env::var("CITY_DATA").ok(),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            web_dir: std::env::var("WEB_DIR").unwrap_or_else(|_| "web".to_string()),
        }
    }
}
