//! Scenario risk: mean and standard deviation of loss across a scenario's
//! ground-motion field realizations, reusing the same per-event loss rows
//! event-based risk computes since a scenario is just a fixed rupture set
//! sampled `num_realizations` times.

use crate::event_based_risk::{compute_event_losses, EventLossRow};
use crate::vulnerability::VulnerabilityFunction;
use oq_core::RiskInput;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ScenarioRiskResult {
    pub asset_id: String,
    pub mean_loss: f64,
    pub stddev_loss: f64,
    pub num_realizations: usize,
}

/// Computes mean and standard deviation of loss per asset across every
/// realization's GMF in `input`.
pub fn compute_scenario_risk(input: &RiskInput, vf: &dyn VulnerabilityFunction, cost_type: &str) -> Vec<ScenarioRiskResult> {
    let rows = compute_event_losses(input, vf, cost_type);

    let mut by_asset: HashMap<String, Vec<f64>> = HashMap::new();
    for EventLossRow { asset_id, loss, .. } in rows {
        by_asset.entry(asset_id).or_default().push(loss);
    }

    by_asset
        .into_iter()
        .map(|(asset_id, losses)| {
            let n = losses.len() as f64;
            let mean = losses.iter().sum::<f64>() / n;
            let variance = losses.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
            ScenarioRiskResult { asset_id, mean_loss: mean, stddev_loss: variance.sqrt(), num_realizations: losses.len() }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulnerability::LinearVulnerability;
    use oq_core::{Asset, AssetOrdinal, EventId, GmfRecord, Hazard, Imt, SiteId};
    use std::collections::HashMap as StdHashMap;

    #[test]
    fn uniform_gmvs_give_zero_stddev() {
        let mut values = StdHashMap::new();
        values.insert("structural".to_string(), 1_000_000.0);
        let input = RiskInput {
            site_id: SiteId(1),
            hazard: Hazard::Gmfs(vec![
                GmfRecord { site_id: SiteId(1), event_id: EventId(1), imt: Imt::Pga, gmv: 0.2 },
                GmfRecord { site_id: SiteId(1), event_id: EventId(2), imt: Imt::Pga, gmv: 0.2 },
            ]),
            assets: vec![Asset {
                ordinal: AssetOrdinal(0),
                asset_id: "a1".into(),
                site_id: SiteId(1),
                taxonomy: "RC".into(),
                number: 1.0,
                values,
                deductibles: StdHashMap::new(),
                limits: StdHashMap::new(),
            }],
            epsilons: StdHashMap::new(),
        };
        let vf = LinearVulnerability { imt: Imt::Pga, intercept: 0.0, slope: 1.0, cov: 0.0 };
        let results = compute_scenario_risk(&input, &vf, "structural");
        assert_eq!(results.len(), 1);
        assert!(results[0].stddev_loss.abs() < 1e-9);
        assert_eq!(results[0].num_realizations, 2);
    }
}
