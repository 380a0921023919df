use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use glam::Vec3;
use serde::Deserialize;

use crate::error::ViewerError;
use crate::renderer::ShadingMode;
use crate::terrain::Bounds;

#[derive(Parser, Debug)]
#[command(name = "wavy-terrain")]
#[command(about = "Random wave terrain lit by two movable point lights", long_about = None)]
pub struct Cli {
    /// Seed for terrain waves and light colors. Drawn from OS entropy when omitted.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Optional TOML file with scene settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How quads are colored between their corners
    #[arg(long, value_enum)]
    pub shading: Option<ShadingMode>,
}

/// Scene settings, all optional in the file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub seed: Option<u64>,
    pub shading: ShadingMode,
    pub bounds: Bounds,
    pub light1: [f32; 3],
    pub light2: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            shading: ShadingMode::default(),
            bounds: Bounds::default(),
            light1: [0.8, 1.0, 1.0],
            light2: [2.0, 1.0, 1.0],
        }
    }
}

impl ViewerConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ViewerError> {
        let config: Self = toml::from_str(text).map_err(|source| ViewerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let text = fs::read_to_string(path).map_err(|source| ViewerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolves the file (if any) and lets CLI flags override it.
    pub fn resolve(cli: &Cli) -> Result<Self, ViewerError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if cli.seed.is_some() {
            config.seed = cli.seed;
        }
        if let Some(shading) = cli.shading {
            config.shading = shading;
        }
        Ok(config)
    }

    pub fn light_positions(&self) -> [Vec3; 2] {
        [Vec3::from_array(self.light1), Vec3::from_array(self.light2)]
    }

    fn validate(&self) -> Result<(), ViewerError> {
        let b = self.bounds;
        let values = [b.x_min, b.x_max, b.y_min, b.y_max];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ViewerError::InvalidBounds(format!("{b:?} has a non-finite edge")));
        }
        Ok(())
    }
}
