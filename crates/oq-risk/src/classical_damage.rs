//! Classical damage: convolves a site's hazard curve with an asset's
//! fragility function into a discrete damage-state probability
//! distribution, weighting each ground-motion bin's probability mass by
//! the state distribution the fragility function gives at that level.

use crate::vulnerability::FragilityFunction;
use oq_core::Curve;

#[derive(Debug, Clone)]
pub struct DamageDistribution {
    pub asset_id: String,
    /// Probability mass per damage state, index 0 is "no damage".
    pub probabilities: Vec<f64>,
}

/// Probability of being exactly in `state` at a single intensity level,
/// from the fragility function's cumulative `poe_damage_state`.
pub(crate) fn state_distribution(ff: &dyn FragilityFunction, iml: f64) -> Vec<f64> {
    let n = ff.num_damage_states();
    let mut out = Vec::with_capacity(n);
    for state in 0..n {
        let poe_here = ff.poe_damage_state(iml, state);
        let poe_next = if state + 1 < n { ff.poe_damage_state(iml, state + 1) } else { 0.0 };
        out.push((poe_here - poe_next).max(0.0));
    }
    out
}

/// Computes the damage distribution for an asset given its site's hazard
/// curve, sorted ascending by IML. Probability mass below the lowest IML
/// is assigned entirely to "no damage"; mass above the highest IML takes
/// the state distribution at that highest level.
pub fn compute_damage_distribution(asset_id: &str, hazard_curve: &Curve, ff: &dyn FragilityFunction) -> DamageDistribution {
    let mut points: Vec<(f64, f64)> = hazard_curve.points().iter().map(|(iml, poe)| (*iml, poe.value())).collect();
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let n = ff.num_damage_states();
    let mut probabilities = vec![0.0; n];

    if points.is_empty() {
        probabilities[0] = 1.0;
        return DamageDistribution { asset_id: asset_id.to_string(), probabilities };
    }

    let (first_iml, first_poe) = points[0];
    let below_mass = 1.0 - first_poe;
    probabilities[0] += below_mass;
    let _ = first_iml;

    for window in points.windows(2) {
        let (iml0, poe0) = window[0];
        let (iml1, poe1) = window[1];
        let mass = (poe0 - poe1).max(0.0);
        let dist = state_distribution(ff, iml0);
        for (state, p) in dist.into_iter().enumerate() {
            probabilities[state] += mass * p;
        }
    }

    let (last_iml, last_poe) = *points.last().unwrap();
    let dist = state_distribution(ff, last_iml);
    for (state, p) in dist.into_iter().enumerate() {
        probabilities[state] += last_poe * p;
    }

    DamageDistribution { asset_id: asset_id.to_string(), probabilities }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulnerability::StepFragility;
    use oq_core::{Imt, PoE};

    #[test]
    fn probabilities_sum_to_one() {
        let curve = Curve::from_points(vec![
            (0.1, PoE::new(0.8)),
            (0.3, PoE::new(0.4)),
            (0.5, PoE::new(0.1)),
        ]);
        let ff = StepFragility { imt: Imt::Pga, thresholds: vec![0.2, 0.4] };
        let dist = compute_damage_distribution("a1", &curve, &ff);
        let total: f64 = dist.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_curve_means_certain_no_damage() {
        let curve = Curve::new();
        let ff = StepFragility { imt: Imt::Pga, thresholds: vec![0.2] };
        let dist = compute_damage_distribution("a1", &curve, &ff);
        assert_eq!(dist.probabilities, vec![1.0, 0.0]);
    }
}
