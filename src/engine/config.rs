use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::engine::pathfinding::HeuristicKind;

/// Default location of the navigation settings file, relative to the working directory.
pub const NAVIGATION_CONFIG_PATH: &str = "assets/navigation_config.ron";

const DEFAULT_UPDATE_INTERVAL: f32 = 0.1;

/// Navigation settings loaded once at startup.
///
/// Grid geometry (`cell_size`, exact-match adjustment) is applied to the
/// [`WorldGrid`](crate::engine::world::WorldGrid) and the worker settings to the
/// background pathfinder whenever this resource changes. Search tunables are
/// only defaults: each entity copies them into its own
/// [`PathfinderParams`](crate::engine::pathfinding::PathfinderParams) when spawned.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    // World grid
    pub cell_size: f32,
    pub adjust_for_exact_grid_match: bool,
    pub grid_epsilon: f32,

    // Search defaults
    pub allow_diagonal: bool,
    pub max_iterations: u32,
    /// `None` leaves the search distance unbounded.
    pub max_distance: Option<u32>,
    pub return_best_path_on_failure: bool,
    pub allow_out_of_bounds: bool,
    pub heuristic: HeuristicKind,
    /// Seconds between searches for one entity.
    pub update_interval: f32,

    // Background workers
    pub async_timeout_ms: u64,
    pub worker_threads: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            adjust_for_exact_grid_match: true,
            grid_epsilon: 0.001,
            allow_diagonal: true,
            max_iterations: 1000,
            max_distance: None,
            return_best_path_on_failure: false,
            allow_out_of_bounds: true,
            heuristic: HeuristicKind::Euclidean,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            async_timeout_ms: 10,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

impl NavigationConfig {
    /// Read and parse a RON settings file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance.unwrap_or(u32::MAX)
    }

    /// Negative intervals clamp to zero. Values too large for a `Duration`
    /// (including `inf`) fall back to the default interval.
    pub fn update_interval(&self) -> Duration {
        Duration::try_from_secs_f32(self.update_interval.max(0.0)).unwrap_or_else(|_| {
            warn!("[NAV_CONFIG] Rejecting update_interval {}; using {}s", self.update_interval, DEFAULT_UPDATE_INTERVAL);
            Duration::from_secs_f32(DEFAULT_UPDATE_INTERVAL)
        })
    }

    pub fn async_timeout(&self) -> Duration {
        Duration::from_millis(self.async_timeout_ms)
    }
}

pub struct NavigationConfigPlugin;

impl Plugin for NavigationConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationConfig>()
            .add_systems(Startup, load_navigation_config);
    }
}

/// Replace the default settings with the file contents. On any failure the
/// defaults stay in place so a broken file never stops the simulation.
fn load_navigation_config(mut config: ResMut<NavigationConfig>) {
    match NavigationConfig::load(NAVIGATION_CONFIG_PATH) {
        Ok(loaded) => {
            info!("[NAV_CONFIG] Loaded navigation config from {}", NAVIGATION_CONFIG_PATH);
            *config = loaded;
        }
        Err(e) => {
            error!("[NAV_CONFIG] {}", e);
            error!("[NAV_CONFIG] Using default NavigationConfig");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config: NavigationConfig =
            ron::from_str("(cell_size: 16.0, max_distance: Some(40), heuristic: Manhattan)")
                .expect("valid RON");

        assert_eq!(config.cell_size, 16.0);
        assert_eq!(config.max_distance(), 40);
        assert_eq!(config.heuristic, HeuristicKind::Manhattan);
        assert_eq!(config.max_iterations, 1000);
        assert!(config.adjust_for_exact_grid_match);
    }

    #[test]
    fn unbounded_distance_by_default() {
        let config = NavigationConfig::default();
        assert_eq!(config.max_distance(), u32::MAX);
        assert!((config.update_interval().as_secs_f32() - 0.1).abs() < 1e-6);
        assert_eq!(config.async_timeout(), Duration::from_millis(10));
    }

    #[test]
    fn unusable_update_interval_is_clamped() {
        let mut config = NavigationConfig {
            update_interval: f32::INFINITY,
            ..Default::default()
        };
        assert!((config.update_interval().as_secs_f32() - 0.1).abs() < 1e-6);

        config.update_interval = 1.0e30;
        assert!((config.update_interval().as_secs_f32() - 0.1).abs() < 1e-6);

        config.update_interval = -2.0;
        assert_eq!(config.update_interval(), Duration::ZERO);
    }

    #[test]
    fn shipped_config_parses() {
        let config = NavigationConfig::load(NAVIGATION_CONFIG_PATH).expect("shipped config");
        assert!(!config.allow_out_of_bounds);
        assert!(matches!(config.heuristic, HeuristicKind::Weighted { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = NavigationConfig::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = std::env::temp_dir().join(format!("harrier_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.ron");
        std::fs::write(&path, "(cell_size: \"wide\")").unwrap();

        let err = NavigationConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
