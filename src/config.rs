use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::data::grid::WavelengthGrid;
use crate::data::loader::DEFAULT_FALLBACK;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Parser)]
#[command(name = "transtack", version, about = "Stack optical transmission curves")]
pub struct Cli {
    /// Directory containing the curve files (.csv / .xlsx).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Ask for the directory on the console instead of opening a folder picker.
    #[arg(long)]
    pub prompt: bool,

    /// JSON settings file; command line values take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lower end of the wavelength grid (µm).
    #[arg(long)]
    pub wavelength_min: Option<f64>,

    /// Upper end of the wavelength grid (µm).
    #[arg(long)]
    pub wavelength_max: Option<f64>,

    /// Number of grid points.
    #[arg(long)]
    pub resolution: Option<usize>,

    /// Subdirectory used when no directory is chosen.
    #[arg(long)]
    pub default_subdir: Option<String>,

    /// Log every loading and stacking step.
    #[arg(short, long)]
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub wavelength_min: f64,
    pub wavelength_max: f64,
    pub resolution: usize,
    pub default_subdir: String,
    pub verbose: bool,
    /// Transmission reported outside a curve's measured range.
    pub fallback_value: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wavelength_min: 0.2,
            wavelength_max: 1.0,
            resolution: 1000,
            default_subdir: "ExampleCSVs".to_string(),
            verbose: false,
            fallback_value: DEFAULT_FALLBACK,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Settings file (if any), then command line overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config.grid().context("invalid wavelength grid settings")?;
        Ok(config)
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(v) = cli.wavelength_min {
            self.wavelength_min = v;
        }
        if let Some(v) = cli.wavelength_max {
            self.wavelength_max = v;
        }
        if let Some(v) = cli.resolution {
            self.resolution = v;
        }
        if let Some(v) = &cli.default_subdir {
            self.default_subdir = v.clone();
        }
        self.verbose |= cli.verbose;
    }

    pub fn grid(&self) -> Result<WavelengthGrid, crate::data::grid::GridError> {
        WavelengthGrid::new(self.wavelength_min, self.wavelength_max, self.resolution)
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
