//! A risk input: one site's hazard (curve or GMFs) joined with the assets
//! exposed at that site and their correlated epsilons, the unit of work a
//! risk calculator consumes.

use crate::asset::Asset;
use crate::gmf::GmfRecord;
use crate::ids::SiteId;
use crate::probability_map::Curve;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Hazard {
    Curve(Curve),
    Gmfs(Vec<GmfRecord>),
}

#[derive(Debug, Clone)]
pub struct RiskInput {
    pub site_id: SiteId,
    pub hazard: Hazard,
    pub assets: Vec<Asset>,
    /// Per-asset-ordinal epsilon samples, keyed by event id for
    /// event-based/scenario risk, empty for classical risk/damage where
    /// no sampling is needed.
    pub epsilons: HashMap<u32, Vec<f64>>,
}

impl RiskInput {
    pub fn weight(&self) -> f64 {
        match &self.hazard {
            Hazard::Curve(_) => self.assets.len() as f64,
            Hazard::Gmfs(records) => (self.assets.len() * records.len().max(1)) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AssetOrdinal;

    #[test]
    fn weight_scales_with_assets_and_events() {
        let input = RiskInput {
            site_id: SiteId(1),
            hazard: Hazard::Gmfs(vec![
                GmfRecord { site_id: SiteId(1), event_id: crate::ids::EventId(1), imt: crate::imt::Imt::Pga, gmv: 0.1 },
                GmfRecord { site_id: SiteId(1), event_id: crate::ids::EventId(2), imt: crate::imt::Imt::Pga, gmv: 0.2 },
            ]),
            assets: vec![Asset {
                ordinal: AssetOrdinal(0),
                asset_id: "a1".into(),
                site_id: SiteId(1),
                taxonomy: "RC".into(),
                number: 1.0,
                values: Default::default(),
                deductibles: HashMap::new(),
                limits: HashMap::new(),
            }],
            epsilons: HashMap::new(),
        };
        assert_eq!(input.weight(), 2.0);
    }
}
