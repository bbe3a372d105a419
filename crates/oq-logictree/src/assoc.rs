//! `RlzsAssoc`: the `(trt_id, gsim) -> [realizations]` association and the
//! combinators that lift per-(trt, gsim) partial results up to per-
//! realization results.

use crate::error::{LogicTreeError, LogicTreeResult};
use crate::realization::LtRealization;
use oq_core::{ProbabilityMap, RlzOrdinal, TrtId, Weight};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct RlzsAssoc {
    realizations: Vec<LtRealization>,
    assoc: HashMap<(TrtId, String), Vec<RlzOrdinal>>,
    gsims_by_trt_id: HashMap<TrtId, Vec<String>>,
}

/// `serde_json`'s map-key serializer rejects tuple keys, so `assoc`
/// (keyed by `(TrtId, String)`) can't derive `Serialize`/`Deserialize`
/// directly. Mirrored through flat `Vec`s on the wire.
#[derive(Serialize, Deserialize)]
struct RlzsAssocShadow {
    realizations: Vec<LtRealization>,
    assoc: Vec<(TrtId, String, Vec<RlzOrdinal>)>,
    gsims_by_trt_id: Vec<(TrtId, Vec<String>)>,
}

impl From<&RlzsAssoc> for RlzsAssocShadow {
    fn from(value: &RlzsAssoc) -> Self {
        Self {
            realizations: value.realizations.clone(),
            assoc: value
                .assoc
                .iter()
                .map(|((trt_id, gsim), rlzs)| (*trt_id, gsim.clone(), rlzs.clone()))
                .collect(),
            gsims_by_trt_id: value
                .gsims_by_trt_id
                .iter()
                .map(|(trt_id, gsims)| (*trt_id, gsims.clone()))
                .collect(),
        }
    }
}

impl From<RlzsAssocShadow> for RlzsAssoc {
    fn from(shadow: RlzsAssocShadow) -> Self {
        Self {
            realizations: shadow.realizations,
            assoc: shadow
                .assoc
                .into_iter()
                .map(|(trt_id, gsim, rlzs)| ((trt_id, gsim), rlzs))
                .collect(),
            gsims_by_trt_id: shadow.gsims_by_trt_id.into_iter().collect(),
        }
    }
}

impl Serialize for RlzsAssoc {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RlzsAssocShadow::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RlzsAssoc {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RlzsAssocShadow::deserialize(deserializer).map(RlzsAssoc::from)
    }
}

impl RlzsAssoc {
    /// Builds the association from a flat list of realizations plus, for
    /// each realization, the `(trt_id, gsim)` pairs it participates in.
    /// Normalizes weights the way `RlzsAssoc._init` does: if the sum is
    /// already within tolerance of 1.0, leave it; otherwise rescale and
    /// log a warning (the original logs this as a data-quality signal
    /// rather than failing the calculation).
    pub fn build(mut realizations: Vec<LtRealization>, rlz_trt_keys: Vec<Vec<(TrtId, String)>>) -> LogicTreeResult<Self> {
        let total: f64 = realizations.iter().map(|r| r.weight.value()).sum();
        if !realizations.is_empty() && (total - 1.0).abs() >= WEIGHT_TOLERANCE {
            tracing::warn!(total, "realization weights do not sum to 1.0, renormalizing");
            for rlz in realizations.iter_mut() {
                rlz.weight = Weight::new(rlz.weight.value() / total);
            }
        }

        let mut assoc: HashMap<(TrtId, String), Vec<RlzOrdinal>> = HashMap::new();
        for (rlz, keys) in realizations.iter().zip(rlz_trt_keys.iter()) {
            for (trt_id, gsim) in keys {
                assoc.entry((*trt_id, gsim.clone())).or_default().push(rlz.ordinal);
            }
        }

        let mut gsims_by_trt_id: HashMap<TrtId, Vec<String>> = HashMap::new();
        for (trt_id, gsim) in assoc.keys() {
            let entry = gsims_by_trt_id.entry(*trt_id).or_default();
            if !entry.contains(gsim) {
                entry.push(gsim.clone());
            }
        }
        for gsims in gsims_by_trt_id.values_mut() {
            gsims.sort();
        }

        Ok(Self {
            realizations,
            assoc,
            gsims_by_trt_id,
        })
    }

    pub fn realizations(&self) -> &[LtRealization] {
        &self.realizations
    }

    pub fn rlzs_for(&self, trt_id: TrtId, gsim: &str) -> &[RlzOrdinal] {
        self.assoc
            .get(&(trt_id, gsim.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn gsims_by_trt_id(&self, trt_id: TrtId) -> &[String] {
        self.gsims_by_trt_id
            .get(&trt_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_rlzs_by_gsim(&self, trt_id: TrtId) -> HashMap<String, Vec<RlzOrdinal>> {
        self.gsims_by_trt_id(trt_id)
            .iter()
            .map(|gsim| (gsim.clone(), self.rlzs_for(trt_id, gsim).to_vec()))
            .collect()
    }

    pub fn get_rlzs_by_trt_id(&self, trt_id: TrtId) -> Vec<RlzOrdinal> {
        let mut out: Vec<RlzOrdinal> = self
            .gsims_by_trt_id(trt_id)
            .iter()
            .flat_map(|gsim| self.rlzs_for(trt_id, gsim).iter().copied())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Projects this association down to a subset of realization
    /// ordinals, mirroring `RlzsAssoc.extract`.
    pub fn extract(&self, rlz_ordinals: &[RlzOrdinal]) -> Self {
        let keep: std::collections::HashSet<RlzOrdinal> = rlz_ordinals.iter().copied().collect();
        let realizations: Vec<LtRealization> = self
            .realizations
            .iter()
            .filter(|r| keep.contains(&r.ordinal))
            .cloned()
            .collect();
        let assoc: HashMap<(TrtId, String), Vec<RlzOrdinal>> = self
            .assoc
            .iter()
            .filter_map(|(key, rlzs)| {
                let filtered: Vec<RlzOrdinal> = rlzs.iter().copied().filter(|o| keep.contains(o)).collect();
                if filtered.is_empty() {
                    None
                } else {
                    Some((key.clone(), filtered))
                }
            })
            .collect();
        let mut gsims_by_trt_id: HashMap<TrtId, Vec<String>> = HashMap::new();
        for (trt_id, gsim) in assoc.keys() {
            gsims_by_trt_id.entry(*trt_id).or_default().push(gsim.clone());
        }
        for gsims in gsims_by_trt_id.values_mut() {
            gsims.sort();
        }
        Self {
            realizations,
            assoc,
            gsims_by_trt_id,
        }
    }

    /// Generic lift from per-`(trt_id, gsim)` partial results to per-
    /// realization results via a commutative, associative combinator —
    /// the generalization of `RlzsAssoc.combine`.
    pub fn combine<R: Clone, Agg: Fn(R, R) -> R>(
        &self,
        results: &HashMap<(TrtId, String), R>,
        identity: R,
        agg: Agg,
    ) -> HashMap<RlzOrdinal, R> {
        let mut out: HashMap<RlzOrdinal, R> = HashMap::new();
        for ((trt_id, gsim), result) in results {
            for rlz in self.rlzs_for(*trt_id, gsim) {
                out.entry(*rlz)
                    .and_modify(|acc| *acc = agg(acc.clone(), result.clone()))
                    .or_insert_with(|| agg(identity.clone(), result.clone()));
            }
        }
        out
    }

    /// `combine` specialized to hazard curves using probabilistic
    /// OR-aggregation — the combinator `RlzsAssoc.combine_curves` uses.
    pub fn combine_curves(&self, results: &HashMap<(TrtId, String), ProbabilityMap>) -> HashMap<RlzOrdinal, ProbabilityMap> {
        self.combine(results, ProbabilityMap::new(), |a, b| a.combine(&b))
    }

    pub fn validate_weights(&self, tol: f64) -> LogicTreeResult<()> {
        let total: f64 = self.realizations.iter().map(|r| r.weight.value()).sum();
        if self.realizations.is_empty() || (total - 1.0).abs() < tol {
            Ok(())
        } else {
            Err(LogicTreeError::WeightsNotNormalized { sum: total, tol })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsim_tree::GsimRealization;
    use std::collections::BTreeMap;

    fn rlz(ordinal: u32, weight: f64) -> LtRealization {
        LtRealization {
            ordinal: RlzOrdinal(ordinal),
            sm_lt_path: vec!["b1".into()],
            sm_ordinal: 0,
            gsim_rlz: GsimRealization {
                gsim_by_trt: BTreeMap::new(),
                weight: Weight::ONE,
            },
            weight: Weight::new(weight),
            sample_id: None,
        }
    }

    #[test]
    fn build_renormalizes_when_not_near_one() {
        let rlzs = vec![rlz(0, 0.3), rlz(1, 0.3)];
        let keys = vec![vec![], vec![]];
        let assoc = RlzsAssoc::build(rlzs, keys).unwrap();
        let total: f64 = assoc.realizations().iter().map(|r| r.weight.value()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn combine_curves_aggregates_across_matching_gsims() {
        let rlzs = vec![rlz(0, 1.0)];
        let keys = vec![vec![(TrtId(0), "BA2008".to_string()), (TrtId(1), "BA2008".to_string())]];
        let assoc = RlzsAssoc::build(rlzs, keys).unwrap();

        let mut results: HashMap<(TrtId, String), ProbabilityMap> = HashMap::new();
        let mut m1 = ProbabilityMap::new();
        m1.set(oq_core::SiteId(1), oq_core::Imt::Pga, oq_core::Curve::from_points(vec![(0.1, oq_core::PoE::new(0.2))]));
        results.insert((TrtId(0), "BA2008".to_string()), m1);
        let mut m2 = ProbabilityMap::new();
        m2.set(oq_core::SiteId(1), oq_core::Imt::Pga, oq_core::Curve::from_points(vec![(0.1, oq_core::PoE::new(0.3))]));
        results.insert((TrtId(1), "BA2008".to_string()), m2);

        let combined = assoc.combine_curves(&results);
        let curve = combined.get(&RlzOrdinal(0)).unwrap();
        let poe = curve.get(oq_core::SiteId(1), oq_core::Imt::Pga).unwrap().poe_at(0.1).unwrap();
        assert!((poe.value() - (1.0 - 0.8 * 0.7)).abs() < 1e-12);
    }

    #[test]
    fn extract_keeps_only_requested_ordinals() {
        let rlzs = vec![rlz(0, 0.5), rlz(1, 0.5)];
        let keys = vec![vec![(TrtId(0), "BA2008".to_string())], vec![(TrtId(0), "CY2008".to_string())]];
        let assoc = RlzsAssoc::build(rlzs, keys).unwrap();
        let subset = assoc.extract(&[RlzOrdinal(0)]);
        assert_eq!(subset.realizations().len(), 1);
        assert!(subset.rlzs_for(TrtId(0), "CY2008").is_empty());
    }

    #[test]
    fn round_trips_through_json_with_tuple_keyed_assoc() {
        let rlzs = vec![rlz(0, 0.5), rlz(1, 0.5)];
        let keys = vec![
            vec![(TrtId(0), "BA2008".to_string())],
            vec![(TrtId(0), "CY2008".to_string())],
        ];
        let assoc = RlzsAssoc::build(rlzs, keys).unwrap();

        let json = serde_json::to_value(&assoc).unwrap();
        let back: RlzsAssoc = serde_json::from_value(json).unwrap();
        assert_eq!(back.realizations().len(), 2);
        assert_eq!(back.rlzs_for(TrtId(0), "BA2008"), &[RlzOrdinal(0)]);
        assert_eq!(back.rlzs_for(TrtId(0), "CY2008"), &[RlzOrdinal(1)]);
    }
}
