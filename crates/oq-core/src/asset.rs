//! Exposure model: assets grouped at hazard sites, and the asset
//! collection used by the risk input builder.

use crate::error::{OqError, OqResult};
use crate::ids::{AssetOrdinal, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single insurable/loss-bearing asset at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub ordinal: AssetOrdinal,
    pub asset_id: String,
    pub site_id: SiteId,
    pub taxonomy: String,
    pub number: f64,
    pub values: HashMap<String, f64>, // cost_type -> value, e.g. "structural" -> 1.2e6
    /// Per-loss-type deductible, in the same currency as `values`. Absent
    /// entries mean no deductible.
    #[serde(default)]
    pub deductibles: HashMap<String, f64>,
    /// Per-loss-type insurance limit, in the same currency as `values`.
    /// Absent entries mean uncapped.
    #[serde(default)]
    pub limits: HashMap<String, f64>,
}

impl Asset {
    pub fn value(&self, cost_type: &str) -> f64 {
        self.values.get(cost_type).copied().unwrap_or(0.0)
    }

    pub fn deductible(&self, cost_type: &str) -> f64 {
        self.deductibles.get(cost_type).copied().unwrap_or(0.0)
    }

    pub fn limit(&self, cost_type: &str) -> f64 {
        self.limits.get(cost_type).copied().unwrap_or(f64::INFINITY)
    }
}

/// Applies a flat deductible and an upper limit to a ground-up loss,
/// `max(loss - deductible, 0)` capped at `limit`. Never exceeds
/// `ground_up_loss` since the deductible only ever subtracts.
pub fn insured_loss(ground_up_loss: f64, deductible: f64, limit: f64) -> f64 {
    (ground_up_loss - deductible).max(0.0).min(limit)
}

/// The exposure model: all assets plus the set of site ids the hazard
/// calculation actually produced results for. Construction validates that
/// every asset references a filtered (surviving) site, matching the
/// `AssetSiteAssociationError` failure mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetCollection {
    assets: Vec<Asset>,
    taxonomies: Vec<String>,
    cost_types: Vec<String>,
}

impl AssetCollection {
    pub fn build(assets: Vec<Asset>, filtered_site_ids: &HashSet<SiteId>) -> OqResult<Self> {
        for asset in &assets {
            if !filtered_site_ids.contains(&asset.site_id) {
                return Err(OqError::AssetSiteAssociation {
                    asset_id: asset.asset_id.clone(),
                    site_id: asset.site_id.value(),
                });
            }
        }
        let mut taxonomies: Vec<String> = assets.iter().map(|a| a.taxonomy.clone()).collect();
        taxonomies.sort();
        taxonomies.dedup();
        let mut cost_types: Vec<String> = assets
            .iter()
            .flat_map(|a| a.values.keys().cloned())
            .collect();
        cost_types.sort();
        cost_types.dedup();
        Ok(Self {
            assets,
            taxonomies,
            cost_types,
        })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn taxonomies(&self) -> &[String] {
        &self.taxonomies
    }

    pub fn cost_types(&self) -> &[String] {
        &self.cost_types
    }

    pub fn assets_at(&self, site_id: SiteId) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.site_id == site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, site: u64) -> Asset {
        let mut values = HashMap::new();
        values.insert("structural".to_string(), 1_000_000.0);
        Asset {
            ordinal: AssetOrdinal(0),
            asset_id: id.to_string(),
            site_id: SiteId(site),
            taxonomy: "RC".to_string(),
            number: 1.0,
            values,
            deductibles: HashMap::new(),
            limits: HashMap::new(),
        }
    }

    #[test]
    fn insured_loss_never_exceeds_ground_up_loss() {
        assert_eq!(insured_loss(1000.0, 100.0, 200.0), 200.0);
        assert_eq!(insured_loss(50.0, 100.0, 200.0), 0.0);
        assert_eq!(insured_loss(150.0, 100.0, f64::INFINITY), 50.0);
    }

    #[test]
    fn rejects_asset_at_unfiltered_site() {
        let assets = vec![asset("a1", 1)];
        let filtered: HashSet<SiteId> = HashSet::new();
        let err = AssetCollection::build(assets, &filtered).unwrap_err();
        assert!(matches!(err, OqError::AssetSiteAssociation { .. }));
    }

    #[test]
    fn accepts_asset_at_filtered_site_and_dedups_taxonomies() {
        let assets = vec![asset("a1", 1), asset("a2", 1)];
        let mut filtered = HashSet::new();
        filtered.insert(SiteId(1));
        let coll = AssetCollection::build(assets, &filtered).unwrap();
        assert_eq!(coll.taxonomies(), &["RC".to_string()]);
        assert_eq!(coll.assets_at(SiteId(1)).count(), 2);
    }
}
