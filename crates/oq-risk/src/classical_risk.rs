//! Classical (probabilistic) risk: converts a site's hazard curve into a
//! loss-ratio exceedance curve per asset via its vulnerability function,
//! then integrates that curve into an average annual loss.

use crate::vulnerability::VulnerabilityFunction;
use oq_core::{Asset, Curve, PoE};

/// One asset's classical risk result: the loss-ratio exceedance curve and
/// its integral, the average loss ratio, scaled by asset value into an
/// average loss.
#[derive(Debug, Clone)]
pub struct ClassicalRiskResult {
    pub asset_id: String,
    pub loss_curve: Curve,
    pub average_loss_ratio: f64,
    pub average_loss: f64,
}

/// Maps a hazard curve's `(iml, poe)` points to `(loss_ratio, poe)` points
/// through the vulnerability function's mean loss ratio, assuming the
/// function is monotonic in `iml` (true of every test double and every
/// real vulnerability model).
pub fn to_loss_curve(hazard_curve: &Curve, vf: &dyn VulnerabilityFunction) -> Curve {
    let points: Vec<(f64, PoE)> = hazard_curve
        .points()
        .iter()
        .map(|(iml, poe)| (vf.loss_ratio(*iml).0, *poe))
        .collect();
    Curve::from_points(points)
}

/// Integrates a loss-ratio exceedance curve into an average (expected)
/// loss ratio via `E[L] = integral of P(L > l) dl`, trapezoidal over the
/// curve's loss-ratio points sorted ascending.
pub fn average_loss_ratio(loss_curve: &Curve) -> f64 {
    let mut points: Vec<(f64, f64)> = loss_curve
        .points()
        .iter()
        .map(|(l, poe)| (*l, poe.value()))
        .collect();
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut total = 0.0;
    for window in points.windows(2) {
        let (l0, p0) = window[0];
        let (l1, p1) = window[1];
        total += (l1 - l0) * (p0 + p1) / 2.0;
    }
    total
}

/// Computes the classical risk result for a single asset against a single
/// hazard curve, scaling the average loss ratio by `asset.value(cost_type)`.
pub fn classical_risk_for_asset(
    asset: &Asset,
    hazard_curve: &Curve,
    vf: &dyn VulnerabilityFunction,
    cost_type: &str,
) -> ClassicalRiskResult {
    let loss_curve = to_loss_curve(hazard_curve, vf);
    let avg_ratio = average_loss_ratio(&loss_curve);
    ClassicalRiskResult {
        asset_id: asset.asset_id.clone(),
        loss_curve,
        average_loss_ratio: avg_ratio,
        average_loss: avg_ratio * asset.value(cost_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulnerability::LinearVulnerability;
    use oq_core::{AssetOrdinal, Imt, SiteId};
    use std::collections::HashMap;

    #[test]
    fn average_loss_ratio_of_a_flat_curve_is_rectangle_area() {
        let curve = Curve::from_points(vec![(0.0, PoE::new(1.0)), (1.0, PoE::new(1.0))]);
        assert!((average_loss_ratio(&curve) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn classical_risk_scales_by_asset_value() {
        let vf = LinearVulnerability { imt: Imt::Pga, intercept: 0.0, slope: 1.0, cov: 0.0 };
        let hazard_curve = Curve::from_points(vec![(0.0, PoE::new(1.0)), (1.0, PoE::new(0.0))]);
        let mut values = HashMap::new();
        values.insert("structural".to_string(), 1_000_000.0);
        let asset = Asset {
            ordinal: AssetOrdinal(0),
            asset_id: "a1".into(),
            site_id: SiteId(1),
            taxonomy: "RC".into(),
            number: 1.0,
            values,
            deductibles: HashMap::new(),
            limits: HashMap::new(),
        };
        let result = classical_risk_for_asset(&asset, &hazard_curve, &vf, "structural");
        assert!((result.average_loss_ratio - 0.5).abs() < 1e-9);
        assert!((result.average_loss - 500_000.0).abs() < 1e-6);
    }
}
