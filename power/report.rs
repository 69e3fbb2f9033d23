//! Comparison of predicted power with published discovery rates, and tab-separated
//! output of curves for plotting.

use crate::config::{PublishedRate, Scenario};
use crate::sweep::{self, PowerCurve, SweepError, SweptParameter};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

/// Gap between predicted and observed rates above which a comparison is logged as a warning.
const DISCREPANCY_WARN_THRESHOLD: f64 = 0.25;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write table: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sweep(#[from] SweepError),
    #[error("Published rate '{label}' could not be evaluated: {source}")]
    Published {
        label: String,
        #[source]
        source: crate::calculator::PowerError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub label: String,
    pub parameter: SweptParameter,
    pub value: f64,
    pub observed: f64,
    pub predicted: f64,
    pub difference: f64,
}

/// Every curve and comparison a scenario asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub effect_curve: Option<PowerCurve>,
    pub maf_curve: Option<PowerCurve>,
    pub comparisons: Vec<Comparison>,
}

/// Predicted power at the published parameter value, next to the published rate.
pub fn compare_published(
    scenario: &Scenario,
    rate: &PublishedRate,
) -> Result<Comparison, ReportError> {
    let predicted = scenario
        .published_inputs(rate)
        .power()
        .map_err(|source| ReportError::Published {
            label: rate.label.clone(),
            source,
        })?;
    let difference = predicted - rate.discovery_rate;

    if difference.abs() > DISCREPANCY_WARN_THRESHOLD {
        log::warn!(
            "'{}' at {} = {}: predicted power {:.3} differs from published rate {:.3} by {:+.3}",
            rate.label,
            rate.parameter,
            rate.value,
            predicted,
            rate.discovery_rate,
            difference
        );
    }

    Ok(Comparison {
        label: rate.label.clone(),
        parameter: rate.parameter,
        value: rate.value,
        observed: rate.discovery_rate,
        predicted,
        difference,
    })
}

/// Runs both configured sweeps and every published comparison, halting at the first error.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport, ReportError> {
    let effect_curve = scenario
        .effect_sweep
        .as_ref()
        .map(|cfg| sweep::sweep_effect_size(scenario.effect_inputs(cfg), &cfg.grid))
        .transpose()?;
    let maf_curve = scenario
        .maf_sweep
        .as_ref()
        .map(|cfg| sweep::sweep_maf(scenario.maf_inputs(cfg), &cfg.grid))
        .transpose()?;
    let comparisons = scenario
        .published
        .iter()
        .map(|rate| compare_published(scenario, rate))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ScenarioReport {
        effect_curve,
        maf_curve,
        comparisons,
    })
}

#[derive(Serialize)]
struct CurveRow {
    parameter: SweptParameter,
    value: f64,
    power: f64,
}

/// Writes `parameter\tvalue\tpower` rows, one per grid point.
pub fn write_curve_tsv<W: Write>(curve: &PowerCurve, out: W) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    for point in &curve.points {
        writer.serialize(CurveRow {
            parameter: curve.parameter,
            value: point.value,
            power: point.power,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `label\tparameter\tvalue\tobserved\tpredicted\tdifference` rows.
pub fn write_comparison_tsv<W: Write>(
    comparisons: &[Comparison],
    out: W,
) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    if comparisons.is_empty() {
        writer.write_record([
            "label",
            "parameter",
            "value",
            "observed",
            "predicted",
            "difference",
        ])?;
    }
    for comparison in comparisons {
        writer.serialize(comparison)?;
    }
    writer.flush()?;
    Ok(())
}
