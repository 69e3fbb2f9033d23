//! Power curves: the calculator evaluated over an evenly spaced parameter grid.

use crate::calculator::{PowerError, PowerInputs};
use ndarray::Array1;
use ndarray::parallel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Slack, in units of `step`, allowed when deciding whether `end` is on the grid.
const GRID_END_TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of points a single grid may materialise.
pub const MAX_GRID_POINTS: usize = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error("Grid bounds must be finite with start <= end, but got start={start}, end={end}.")]
    InvalidBounds { start: f64, end: f64 },
    #[error("Grid step must be finite and positive, but was {0}.")]
    InvalidStep(f64),
    #[error(
        "Grid from {start} to {end} with step {step} would exceed {} points.",
        MAX_GRID_POINTS
    )]
    TooManyPoints { start: f64, end: f64, step: f64 },
    #[error("Power evaluation failed at {parameter} = {value}: {source}")]
    Power {
        parameter: SweptParameter,
        value: f64,
        #[source]
        source: PowerError,
    },
}

/// Which input a curve varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweptParameter {
    /// Per-allele effect size `beta`.
    Effect,
    /// Minor allele frequency.
    Maf,
}

impl SweptParameter {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Effect => "effect",
            Self::Maf => "maf",
        }
    }

    /// Returns `base` with this parameter replaced by `value`.
    pub fn apply(self, base: PowerInputs, value: f64) -> PowerInputs {
        match self {
            Self::Effect => base.with_beta(value),
            Self::Maf => base.with_maf(value),
        }
    }
}

impl fmt::Display for SweptParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Inclusive, evenly spaced grid `start, start + step, ...` up to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Grid {
    /// 0.00 to 0.40 in steps of 0.02.
    pub const EFFECT_DEFAULT: Grid = Grid {
        start: 0.0,
        end: 0.40,
        step: 0.02,
    };

    /// 0.01 to 0.50 in steps of 0.02; the last point is 0.49.
    pub const MAF_DEFAULT: Grid = Grid {
        start: 0.01,
        end: 0.50,
        step: 0.02,
    };

    pub fn validate(&self) -> Result<(), SweepError> {
        if !(self.start.is_finite() && self.end.is_finite() && self.start <= self.end) {
            return Err(SweepError::InvalidBounds {
                start: self.start,
                end: self.end,
            });
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SweepError::InvalidStep(self.step));
        }
        Ok(())
    }

    pub fn point_count(&self) -> Result<usize, SweepError> {
        self.validate()?;
        let span = ((self.end - self.start) / self.step + GRID_END_TOLERANCE).floor();
        // Checked in f64 before the cast, which would otherwise saturate.
        if !(span.is_finite() && span < MAX_GRID_POINTS as f64) {
            return Err(SweepError::TooManyPoints {
                start: self.start,
                end: self.end,
                step: self.step,
            });
        }
        Ok(span as usize + 1)
    }

    /// Materialises the grid. Points are built as `start + i * step` rather than by
    /// repeated addition so rounding cannot accumulate across the sweep.
    pub fn points(&self) -> Result<Array1<f64>, SweepError> {
        let len = self.point_count()?;
        Ok(Array1::from_shape_fn(len, |i| {
            self.start + i as f64 * self.step
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub value: f64,
    pub power: f64,
}

/// Ordered `(parameter value, power)` pairs for one swept parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    pub parameter: SweptParameter,
    pub base: PowerInputs,
    pub points: Vec<CurvePoint>,
}

impl PowerCurve {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn powers(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.power)
    }
}

/// Evaluates power at every grid point, holding the other inputs of `base` fixed.
///
/// Points are evaluated in parallel but returned in grid order. If any point is
/// out of domain, the error for the lowest such point is returned and no partial
/// curve is produced.
pub fn sweep(
    parameter: SweptParameter,
    base: PowerInputs,
    grid: &Grid,
) -> Result<PowerCurve, SweepError> {
    let values = grid.points()?;
    log::info!(
        "Sweeping {parameter} over {} points ({} to {} step {})",
        values.len(),
        grid.start,
        grid.end,
        grid.step
    );

    let evaluated: Vec<Result<CurvePoint, SweepError>> = values
        .par_iter()
        .map(|&value| {
            parameter
                .apply(base, value)
                .power()
                .map(|power| CurvePoint { value, power })
                .map_err(|source| SweepError::Power {
                    parameter,
                    value,
                    source,
                })
        })
        .collect();

    let points = evaluated.into_iter().collect::<Result<Vec<_>, _>>()?;
    log::info!("Finished {parameter} sweep");
    Ok(PowerCurve {
        parameter,
        base,
        points,
    })
}

/// Power versus effect size at fixed `n`, MAF, threshold and noise scale.
pub fn sweep_effect_size(base: PowerInputs, grid: &Grid) -> Result<PowerCurve, SweepError> {
    sweep(SweptParameter::Effect, base, grid)
}

/// Power versus minor allele frequency at fixed `n`, effect size, threshold and noise scale.
pub fn sweep_maf(base: PowerInputs, grid: &Grid) -> Result<PowerCurve, SweepError> {
    sweep(SweptParameter::Maf, base, grid)
}
