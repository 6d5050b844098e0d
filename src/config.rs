// Scene configuration: JSON file (every field optional) + command-line overrides.

use std::path::{Path, PathBuf};
use clap::Parser;
use serde::{Deserialize, Serialize};
use crate::engine::{GrassConfig, GroundConfig, PlayerConfig, SwarmConfig, TrailConfig, TrailVariant};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "meadow_trails", about = "Wind-swept meadow with a trail-leaving sphere")]
pub struct Cli {
    /// JSON scene config; missing fields use defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Trail variant to start with
    #[arg(short, long, value_enum)]
    pub variant: Option<TrailVariant>,

    /// Number of grass blades
    #[arg(long)]
    pub grass: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: [f32; 3],
    pub density: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: [0.55, 0.62, 0.72],
            density: 0.025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub trail_variant: TrailVariant,
    /// Replaces the variant preset entirely when present.
    pub trail: Option<TrailConfig>,
    pub trail_enabled: bool,
    pub ground: GroundConfig,
    pub grass: GrassConfig,
    pub swarm: SwarmConfig,
    pub player: PlayerConfig,
    pub fog: FogConfig,
    /// Direction the sun's light travels.
    pub light_dir: [f32; 3],
    /// Wind direction on XZ; normalized when uploaded.
    pub wind_dir: [f32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            trail_variant: TrailVariant::default(),
            trail: None,
            trail_enabled: true,
            ground: GroundConfig::default(),
            grass: GrassConfig::default(),
            swarm: SwarmConfig::default(),
            player: PlayerConfig::default(),
            fog: FogConfig::default(),
            light_dir: [-0.4, -1.0, -0.3],
            wind_dir: [1.0, 0.4],
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// File (if any) then CLI flags on top.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => {
                log::info!("Loading scene config from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };
        if let Some(variant) = cli.variant {
            config.trail_variant = variant;
            config.trail = None;
        }
        if let Some(count) = cli.grass {
            config.grass.count = count;
        }
        Ok(config)
    }

    /// Trail settings in effect at startup.
    pub fn trail_config(&self) -> TrailConfig {
        self.trail.clone().unwrap_or_else(|| self.trail_variant.config())
    }
}
