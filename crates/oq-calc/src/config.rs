//! `job.ini`-equivalent configuration: a flat, typed struct parsed from
//! YAML or JSON, with a `resolve`/`validate` step that rejects incomplete
//! or contradictory input before any calculator runs.

use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn default_concurrent_tasks() -> u32 {
    0
}

fn default_ses_per_logic_tree_path() -> u32 {
    1
}

fn default_number_of_logic_tree_samples() -> u32 {
    0
}

fn default_truncation_level() -> f64 {
    3.0
}

fn default_loss_curve_resolution() -> u32 {
    50
}

/// Raw, as-parsed job configuration. Every field mirrors a recognized
/// `job.ini` key from the spec's external-interfaces table; optional
/// fields default the way the original's `OqParam` class does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub calculation_mode: String,
    #[serde(default)]
    pub maximum_distance: HashMap<String, f64>,
    #[serde(default)]
    pub minimum_intensity: HashMap<String, f64>,
    pub sites_per_tile: Option<u32>,
    #[serde(default = "default_concurrent_tasks")]
    pub concurrent_tasks: u32,
    #[serde(default = "default_ses_per_logic_tree_path")]
    pub ses_per_logic_tree_path: u32,
    pub investigation_time: Option<f64>,
    pub risk_investigation_time: Option<f64>,
    #[serde(default = "default_number_of_logic_tree_samples")]
    pub number_of_logic_tree_samples: u32,
    pub random_seed: Option<u64>,
    pub master_seed: Option<u64>,
    #[serde(default = "default_truncation_level")]
    pub truncation_level: f64,
    pub asset_correlation: Option<f64>,
    #[serde(default)]
    pub quantile_hazard_curves: Vec<f64>,
    #[serde(default)]
    pub mean_hazard_curves: bool,
    #[serde(default)]
    pub poes: Vec<f64>,
    #[serde(default)]
    pub hazard_maps: bool,
    #[serde(default)]
    pub individual_curves: bool,
    #[serde(default)]
    pub insured_losses: bool,
    #[serde(default)]
    pub avg_losses: bool,
    #[serde(default)]
    pub asset_loss_table: bool,
    #[serde(default)]
    pub conditional_loss_poes: Vec<f64>,
    #[serde(default = "default_loss_curve_resolution")]
    pub loss_curve_resolution: u32,
    pub time_event: Option<String>,
    #[serde(default)]
    pub specific_assets: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    pub export_dir: Option<String>,
}

/// A validated, defaulted job configuration: the resolved `ses_ratio` and
/// the sampling-vs-enumeration choice are computed once here rather than
/// re-derived at every call site.
#[derive(Debug, Clone)]
pub struct ResolvedJobConfig {
    pub raw: JobConfig,
    pub master_seed: u64,
    pub random_seed: u64,
    /// `risk_investigation_time / (investigation_time * ses_per_logic_tree_path)`,
    /// the scale factor event-based risk applies to loss-ratio sums.
    pub ses_ratio: f64,
    /// `true` when `number_of_logic_tree_samples > 0` (Monte Carlo sampling
    /// rather than full enumeration).
    pub sampling: bool,
}

pub fn load_from_path(path: &Path) -> CalcResult<JobConfig> {
    let data = fs::read_to_string(path).map_err(|e| CalcError::Config(format!("reading job config '{}': {e}", path.display())))?;
    parse(&data, path.extension().and_then(|e| e.to_str()))
}

fn parse(data: &str, extension: Option<&str>) -> CalcResult<JobConfig> {
    match extension {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(data).map_err(|e| CalcError::Config(format!("parsing job config yaml: {e}")))
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(data).map_err(|e| CalcError::Config(format!("parsing job config json: {e}")))
        }
        _ => serde_yaml::from_str(data)
            .or_else(|_| serde_json::from_str(data))
            .map_err(|e| CalcError::Config(format!("parsing job config: {e}"))),
    }
}

/// Validates a raw config and derives the fields every calculator needs,
/// mirroring `resolve_scenarios`/`validate` — rejecting a config outright
/// rather than letting a calculator discover the inconsistency mid-run.
pub fn resolve(raw: JobConfig) -> CalcResult<ResolvedJobConfig> {
    if raw.calculation_mode.trim().is_empty() {
        return Err(CalcError::Config("calculation_mode is required".to_string()));
    }
    if raw.number_of_logic_tree_samples > 0 && raw.random_seed.is_none() {
        return Err(CalcError::Config(
            "random_seed is required when number_of_logic_tree_samples > 0".to_string(),
        ));
    }

    let is_event_based = raw.calculation_mode.starts_with("event_based") || raw.calculation_mode.starts_with("scenario");
    let investigation_time = raw.investigation_time.unwrap_or(1.0);
    if is_event_based && investigation_time <= 0.0 {
        return Err(CalcError::Config("investigation_time must be positive for event-based calculators".to_string()));
    }
    let risk_investigation_time = raw.risk_investigation_time.unwrap_or(investigation_time);
    let ses_ratio = risk_investigation_time / (investigation_time * raw.ses_per_logic_tree_path as f64);

    let master_seed = raw.master_seed.unwrap_or(42);
    let random_seed = raw.random_seed.unwrap_or(42);
    let sampling = raw.number_of_logic_tree_samples > 0;

    Ok(ResolvedJobConfig { raw, master_seed, random_seed, ses_ratio, sampling })
}

pub fn validate(raw: &JobConfig) -> CalcResult<()> {
    resolve(raw.clone()).map(|_| ())
}
