//! Scenario damage: averages each asset's fragility-derived damage-state
//! distribution across a fixed set of ground-motion field realizations,
//! since a scenario run has no probability of exceedance to convolve
//! against.

use crate::classical_damage::state_distribution;
use crate::vulnerability::FragilityFunction;
use oq_core::{Hazard, RiskInput};

#[derive(Debug, Clone)]
pub struct ScenarioDamageResult {
    pub asset_id: String,
    /// Mean probability mass per damage state across all realizations.
    pub mean_probabilities: Vec<f64>,
    pub num_realizations: usize,
}

/// Computes the mean damage distribution for every asset in `input`,
/// averaging the fragility function's state distribution over every GMF
/// record at the asset's site.
pub fn compute_scenario_damage(input: &RiskInput, ff: &dyn FragilityFunction) -> Vec<ScenarioDamageResult> {
    let records = match &input.hazard {
        Hazard::Gmfs(records) => records,
        Hazard::Curve(_) => return Vec::new(),
    };
    if records.is_empty() {
        return Vec::new();
    }

    let n_states = ff.num_damage_states();
    let mut sum = vec![0.0; n_states];
    for record in records {
        for (state, p) in state_distribution(ff, record.gmv).into_iter().enumerate() {
            sum[state] += p;
        }
    }
    let n = records.len() as f64;
    let mean_probabilities: Vec<f64> = sum.into_iter().map(|s| s / n).collect();

    input
        .assets
        .iter()
        .map(|asset| ScenarioDamageResult {
            asset_id: asset.asset_id.clone(),
            mean_probabilities: mean_probabilities.clone(),
            num_realizations: records.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulnerability::StepFragility;
    use oq_core::{Asset, AssetOrdinal, EventId, GmfRecord, Imt, SiteId};
    use std::collections::HashMap;

    #[test]
    fn averages_across_realizations() {
        let input = RiskInput {
            site_id: SiteId(1),
            hazard: Hazard::Gmfs(vec![
                GmfRecord { site_id: SiteId(1), event_id: EventId(1), imt: Imt::Pga, gmv: 0.1 },
                GmfRecord { site_id: SiteId(1), event_id: EventId(2), imt: Imt::Pga, gmv: 0.5 },
            ]),
            assets: vec![Asset {
                ordinal: AssetOrdinal(0),
                asset_id: "a1".into(),
                site_id: SiteId(1),
                taxonomy: "RC".into(),
                number: 1.0,
                values: HashMap::new(),
                deductibles: HashMap::new(),
                limits: HashMap::new(),
            }],
            epsilons: HashMap::new(),
        };
        let ff = StepFragility { imt: Imt::Pga, thresholds: vec![0.3] };
        let results = compute_scenario_damage(&input, &ff);
        assert_eq!(results.len(), 1);
        let total: f64 = results[0].mean_probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(results[0].mean_probabilities[0], 0.5);
    }
}
