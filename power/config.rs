// ========================================================================================
//                                 Study scenario files
// ========================================================================================

use crate::calculator::{DEFAULT_SIGMA, PowerError, PowerInputs};
use crate::sweep::{Grid, SweepError, SweptParameter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Allele frequency held fixed by the effect-size sweep when none is configured.
pub const DEFAULT_SWEEP_MAF: f64 = 0.20;
/// Effect size held fixed by the MAF sweep when none is configured.
pub const DEFAULT_SWEEP_BETA: f64 = 0.24;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write scenario file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML scenario file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize scenario to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid {section} parameters: {source}")]
    InvalidParameters {
        section: &'static str,
        #[source]
        source: PowerError,
    },
    #[error("Invalid {section} grid: {source}")]
    InvalidGrid {
        section: &'static str,
        #[source]
        source: SweepError,
    },
    #[error("Published discovery rate '{label}' must lie in [0, 1], but was {rate}.")]
    InvalidDiscoveryRate { label: String, rate: f64 },
}

/// Sweep of `beta` at a fixed allele frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSweepConfig {
    pub maf: f64,
    #[serde(default = "default_effect_grid")]
    pub grid: Grid,
}

impl Default for EffectSweepConfig {
    fn default() -> Self {
        Self {
            maf: DEFAULT_SWEEP_MAF,
            grid: Grid::EFFECT_DEFAULT,
        }
    }
}

/// Sweep of MAF at a fixed effect size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MafSweepConfig {
    pub beta: f64,
    #[serde(default = "default_maf_grid")]
    pub grid: Grid,
}

impl Default for MafSweepConfig {
    fn default() -> Self {
        Self {
            beta: DEFAULT_SWEEP_BETA,
            grid: Grid::MAF_DEFAULT,
        }
    }
}

/// An empirical discovery rate reported by a published study, placed on one of the curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRate {
    pub label: String,
    pub parameter: SweptParameter,
    pub value: f64,
    pub discovery_rate: f64,
}

/// Everything needed to draw both power curves for one study design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub sample_size: f64,
    pub threshold: f64,
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default)]
    pub effect_sweep: Option<EffectSweepConfig>,
    #[serde(default)]
    pub maf_sweep: Option<MafSweepConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub published: Vec<PublishedRate>,
}

impl Default for Scenario {
    /// 1,800 samples at the 6e-8 genome-wide threshold with both default sweeps.
    fn default() -> Self {
        Self {
            sample_size: 1800.0,
            threshold: 6e-8,
            sigma: DEFAULT_SIGMA,
            effect_sweep: Some(EffectSweepConfig::default()),
            maf_sweep: Some(MafSweepConfig::default()),
            published: Vec::new(),
        }
    }
}

impl Scenario {
    /// Inputs of the effect-size curve. `beta` is overwritten at every grid point.
    pub fn effect_inputs(&self, sweep: &EffectSweepConfig) -> PowerInputs {
        PowerInputs::new(self.sample_size, sweep.maf, 0.0, self.threshold).with_sigma(self.sigma)
    }

    /// Inputs of the MAF curve. `maf` is overwritten at every grid point.
    pub fn maf_inputs(&self, sweep: &MafSweepConfig) -> PowerInputs {
        PowerInputs::new(self.sample_size, DEFAULT_SWEEP_MAF, sweep.beta, self.threshold)
            .with_sigma(self.sigma)
    }

    /// Inputs at which a published rate is compared against the curve it belongs to.
    /// A rate on a curve that is not configured falls back to that curve's defaults.
    pub fn published_inputs(&self, rate: &PublishedRate) -> PowerInputs {
        let base = match rate.parameter {
            SweptParameter::Effect => {
                self.effect_inputs(&self.effect_sweep.unwrap_or_default())
            }
            SweptParameter::Maf => self.maf_inputs(&self.maf_sweep.unwrap_or_default()),
        };
        rate.parameter.apply(base, rate.value)
    }

    /// Applies the calculator's domain rules to every fixed scalar and grid, so a bad
    /// file is reported before any curve is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sweep) = &self.effect_sweep {
            validate_sweep(
                "effect_sweep",
                SweptParameter::Effect,
                self.effect_inputs(sweep),
                &sweep.grid,
            )?;
        }
        if let Some(sweep) = &self.maf_sweep {
            validate_sweep(
                "maf_sweep",
                SweptParameter::Maf,
                self.maf_inputs(sweep),
                &sweep.grid,
            )?;
        }
        for rate in &self.published {
            if !(0.0..=1.0).contains(&rate.discovery_rate) {
                return Err(ConfigError::InvalidDiscoveryRate {
                    label: rate.label.clone(),
                    rate: rate.discovery_rate,
                });
            }
            self.published_inputs(rate)
                .validate()
                .map_err(|source| ConfigError::InvalidParameters {
                    section: "published",
                    source,
                })?;
        }
        Ok(())
    }

    /// Saves the scenario in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates a scenario from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let scenario: Scenario = toml::from_str(&toml_string)?;
        scenario.validate()?;
        log::info!(
            "Loaded scenario from {}: n={} threshold={:e} sigma={}",
            path.display(),
            scenario.sample_size,
            scenario.threshold,
            scenario.sigma
        );
        Ok(scenario)
    }
}

/// Checks the fixed inputs of a sweep and then every point of its grid, so an
/// out-of-domain grid fails at load time rather than midway through a run.
fn validate_sweep(
    section: &'static str,
    parameter: SweptParameter,
    base: PowerInputs,
    grid: &Grid,
) -> Result<(), ConfigError> {
    let invalid_parameters = |source: PowerError| ConfigError::InvalidParameters { section, source };
    base.validate().map_err(invalid_parameters)?;

    let points = grid
        .points()
        .map_err(|source| ConfigError::InvalidGrid { section, source })?;
    for &value in &points {
        parameter
            .apply(base, value)
            .validate()
            .map_err(invalid_parameters)?;
    }
    Ok(())
}

fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}

fn default_effect_grid() -> Grid {
    Grid::EFFECT_DEFAULT
}

fn default_maf_grid() -> Grid {
    Grid::MAF_DEFAULT
}
