//! Benefit-cost ratio: compares the average annual loss of an asset's
//! original and retrofitted vulnerability functions against the retrofit
//! cost, annuitized over the asset's expected life.

use crate::classical_risk::average_loss_ratio;
use crate::classical_risk::to_loss_curve;
use crate::error::{RiskError, RiskResult};
use crate::vulnerability::VulnerabilityFunction;
use oq_core::{Asset, Curve};

#[derive(Debug, Clone)]
pub struct BcrResult {
    pub asset_id: String,
    pub eal_original: f64,
    pub eal_retrofitted: f64,
    pub bcr: f64,
}

/// `(1 - (1+r)^-t) / r`, the present-value factor of a unit annuity over
/// `t` years at interest rate `r`. Falls back to `t` when `r` is ~0.
fn annuity_factor(interest_rate: f64, asset_life_expectancy: f64) -> f64 {
    if interest_rate.abs() < 1e-12 {
        asset_life_expectancy
    } else {
        (1.0 - (1.0 + interest_rate).powf(-asset_life_expectancy)) / interest_rate
    }
}

/// Computes the benefit-cost ratio of retrofitting `asset`, given its
/// hazard curve, the vulnerability function it has today, the
/// vulnerability function it would have after retrofit, the retrofit's
/// one-off cost, and the annuitization parameters.
pub fn compute_bcr(
    asset: &Asset,
    hazard_curve: &Curve,
    original_vf: &dyn VulnerabilityFunction,
    retrofitted_vf: &dyn VulnerabilityFunction,
    cost_type: &str,
    retrofit_cost: f64,
    interest_rate: f64,
    asset_life_expectancy: f64,
) -> RiskResult<BcrResult> {
    if retrofit_cost < 0.0 {
        return Err(RiskError::NegativeRetrofitCost(asset.asset_id.clone()));
    }

    let value = asset.value(cost_type);
    let eal_original = average_loss_ratio(&to_loss_curve(hazard_curve, original_vf)) * value;
    let eal_retrofitted = average_loss_ratio(&to_loss_curve(hazard_curve, retrofitted_vf)) * value;

    let annual_benefit = (eal_original - eal_retrofitted) * annuity_factor(interest_rate, asset_life_expectancy);
    let bcr = if retrofit_cost > 0.0 { annual_benefit / retrofit_cost } else { f64::INFINITY };

    Ok(BcrResult { asset_id: asset.asset_id.clone(), eal_original, eal_retrofitted, bcr })
}
