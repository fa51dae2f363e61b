//! Run settings
//!
//! Settings are layered, later sources winning:
//!
//! 1. The scenario preset
//! 2. A TOML file (`--config`)
//! 3. Environment variables `STRIDE_SCENARIO` and `STRIDE_MAX_TICKS`
//! 4. Command line arguments
//!
//! # Example File
//!
//! ```toml
//! scenario = "crossing_focus"
//! max_ticks = 1500
//! goal = { x = -3.0, y = 0.0 }
//!
//! [nav]
//! avoid_radius = 0.4
//!
//! [nav.crossing]
//! lateral_threshold = 0.1
//! ```
//!
//! Tables under `[nav]` are merged key by key into the preset's
//! configuration, so only the values that differ need to be written.

use serde::Deserialize;
use std::path::Path;

use stride_math::Vec2;
use stride_nav::config::NavConfig;

use crate::error::{Result, SimError};
use crate::scenario::Scenario;

/// Environment variable selecting the scenario
pub const ENV_SCENARIO: &str = "STRIDE_SCENARIO";
/// Environment variable overriding the tick limit
pub const ENV_MAX_TICKS: &str = "STRIDE_MAX_TICKS";

/// Overrides applied on top of a scenario preset
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub scenario: Option<String>,
    pub max_ticks: Option<u64>,
    pub start: Option<Vec2>,
    pub goal: Option<Vec2>,
    /// Partial navigation configuration
    pub nav: Option<toml::Table>,
}

impl SimSettings {
    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let settings = Self::parse(&content)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply `STRIDE_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(scenario) = lookup(ENV_SCENARIO).filter(|s| !s.is_empty()) {
            log::info!("Scenario from env: {}", scenario);
            self.scenario = Some(scenario);
        }
        if let Some(ticks) = lookup(ENV_MAX_TICKS) {
            let ticks = ticks.trim().parse().map_err(|_| {
                SimError::InvalidArgument(format!("{} must be a tick count, got {:?}", ENV_MAX_TICKS, ticks))
            })?;
            self.max_ticks = Some(ticks);
        }
        Ok(())
    }

    /// Layer these settings over `scenario`
    pub fn apply(&self, scenario: &mut Scenario) -> Result<()> {
        if let Some(max_ticks) = self.max_ticks {
            scenario.max_ticks = max_ticks;
        }
        if let Some(start) = self.start {
            scenario.start = start;
        }
        if let Some(goal) = self.goal {
            scenario.goal = goal;
        }
        if let Some(overlay) = &self.nav {
            scenario.nav = overlay_nav(&scenario.nav, overlay)?;
        }
        Ok(())
    }
}

/// Merge a partial TOML table into a full configuration
fn overlay_nav(base: &NavConfig, overlay: &toml::Table) -> Result<NavConfig> {
    let mut merged = toml::Value::try_from(base)?;
    merge(&mut merged, toml::Value::Table(overlay.clone()));
    Ok(merged.try_into::<NavConfig>()?)
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
