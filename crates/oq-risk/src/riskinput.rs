//! Builds the per-site [`RiskInput`]s a risk calculator consumes, joining
//! the exposure model against either classical hazard curves or
//! event-based/scenario GMFs, and attaching correlated epsilons where the
//! calculator needs them.

use crate::epsilons::sample_correlated;
use crate::error::{RiskError, RiskResult};
use oq_core::{AssetCollection, Curve, EventId, GmfCollection, Hazard, Imt, ProbabilityMap, RiskInput, SiteId};
use std::collections::{HashMap, HashSet};

/// Builds one [`RiskInput`] per site that has both assets and a hazard
/// curve, for classical risk/damage/BCR calculators. Sites with assets but
/// no surviving curve are silently skipped, matching [`AssetCollection`]'s
/// own filtered-site contract.
pub fn build_classical_inputs(assets: &AssetCollection, curves: &ProbabilityMap, imt: Imt) -> Vec<RiskInput> {
    let mut sites: Vec<SiteId> = assets.assets().iter().map(|a| a.site_id).collect();
    sites.sort();
    sites.dedup();

    sites
        .into_iter()
        .filter_map(|site_id| {
            let curve = curves.get(site_id, imt)?.clone();
            Some(RiskInput {
                site_id,
                hazard: Hazard::Curve(curve),
                assets: assets.assets_at(site_id).cloned().collect(),
                epsilons: HashMap::new(),
            })
        })
        .collect()
}

/// Builds one [`RiskInput`] per site carrying GMFs, for event-based and
/// scenario risk/damage calculators. If `correlation` is `Some`, epsilons
/// are sampled per asset ordinal per event with that intra-taxonomy
/// correlation; otherwise the `epsilons` map is left empty and calculators
/// fall back to the mean loss ratio.
pub fn build_event_based_inputs(
    assets: &AssetCollection,
    gmfs: &GmfCollection,
    imt: Imt,
    correlation: Option<f64>,
    master_seed: u64,
) -> RiskResult<Vec<RiskInput>> {
    if assets.assets().is_empty() {
        return Err(RiskError::EmptyAssets);
    }

    let mut sites: Vec<SiteId> = assets.assets().iter().map(|a| a.site_id).collect();
    sites.sort();
    sites.dedup();

    let event_ids: Vec<EventId> = {
        let mut ids: HashSet<EventId> = gmfs.records().iter().map(|r| r.event_id).collect();
        let mut v: Vec<EventId> = ids.drain().collect();
        v.sort();
        v
    };

    let epsilons_by_event = match correlation {
        Some(corr) => {
            let asset_refs: Vec<(_, &str)> = assets
                .assets()
                .iter()
                .map(|a| (a.ordinal, a.taxonomy.as_str()))
                .collect();
            Some(sample_correlated(&event_ids, &asset_refs, corr, master_seed))
        }
        None => None,
    };

    let mut inputs = Vec::with_capacity(sites.len());
    for site_id in sites {
        let records: Vec<_> = gmfs
            .for_site(site_id)
            .filter(|r| r.imt == imt)
            .cloned()
            .collect();
        if records.is_empty() {
            continue;
        }
        let site_assets: Vec<_> = assets.assets_at(site_id).cloned().collect();

        let mut epsilons = HashMap::new();
        if let Some(by_event) = &epsilons_by_event {
            for record in &records {
                if let Some(by_asset) = by_event.get(&record.event_id) {
                    let per_asset: Vec<f64> = site_assets
                        .iter()
                        .map(|a| by_asset.get(&a.ordinal).copied().unwrap_or(0.0))
                        .collect();
                    epsilons.insert(record.event_id.value() as u32, per_asset);
                }
            }
        }

        inputs.push(RiskInput {
            site_id,
            hazard: Hazard::Gmfs(records),
            assets: site_assets,
            epsilons,
        });
    }
    Ok(inputs)
}

/// Extracts the hazard curve of a classical [`RiskInput`], erroring if this
/// input actually carries GMFs (a calculator/config mismatch).
pub fn expect_curve(input: &RiskInput) -> RiskResult<&Curve> {
    match &input.hazard {
        Hazard::Curve(curve) => Ok(curve),
        Hazard::Gmfs(_) => Err(RiskError::ImtMismatch {
            hazard: "gmfs".to_string(),
            expected: "curve".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oq_core::{Asset, AssetOrdinal, GmfRecord, PoE};
    use std::collections::HashSet as StdHashSet;

    fn asset(ordinal: u32, site: u64, taxonomy: &str) -> Asset {
        Asset {
            ordinal: AssetOrdinal(ordinal),
            asset_id: format!("a{ordinal}"),
            site_id: SiteId(site),
            taxonomy: taxonomy.to_string(),
            number: 1.0,
            values: Default::default(),
            deductibles: Default::default(),
            limits: Default::default(),
        }
    }

    #[test]
    fn classical_inputs_skip_sites_without_a_curve() {
        let assets = AssetCollection::build(vec![asset(0, 1, "RC"), asset(1, 2, "RC")], &{
            let mut s = StdHashSet::new();
            s.insert(SiteId(1));
            s.insert(SiteId(2));
            s
        })
        .unwrap();
        let mut curves = ProbabilityMap::new();
        curves.set(SiteId(1), Imt::Pga, Curve::from_points(vec![(0.1, PoE::new(0.2))]));

        let inputs = build_classical_inputs(&assets, &curves, Imt::Pga);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].site_id, SiteId(1));
    }

    #[test]
    fn event_based_inputs_attach_correlated_epsilons() {
        let filtered = {
            let mut s = StdHashSet::new();
            s.insert(SiteId(1));
            s
        };
        let assets = AssetCollection::build(vec![asset(0, 1, "RC"), asset(1, 1, "RC")], &filtered).unwrap();
        let mut gmfs = GmfCollection::new();
        gmfs.push(GmfRecord { site_id: SiteId(1), event_id: EventId(1), imt: Imt::Pga, gmv: 0.3 });

        let inputs = build_event_based_inputs(&assets, &gmfs, Imt::Pga, Some(0.5), 42).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].epsilons[&1].len(), 2);
    }

    #[test]
    fn rejects_empty_exposure() {
        let assets = AssetCollection::build(vec![], &StdHashSet::new()).unwrap();
        let gmfs = GmfCollection::new();
        let err = build_event_based_inputs(&assets, &gmfs, Imt::Pga, None, 1).unwrap_err();
        assert!(matches!(err, RiskError::EmptyAssets));
    }
}
