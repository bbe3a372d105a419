//! Hazard curve storage: probability of exceedance per site, IMT and
//! intensity measure level, with the OR-combination used to aggregate
//! across sources/realizations of the same tectonic-region-type/GSIM pair.

use crate::ids::SiteId;
use crate::imt::Imt;
use crate::units::PoE;
use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A hazard curve: PoE per IML, for one site and one IMT. IMLs are stored
/// alongside their PoE rather than assumed to share a single fixed global
/// grid, since risk functions discretize IMTs independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<(f64, PoE)>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<(f64, PoE)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, PoE)] {
        &self.points
    }

    pub fn poe_at(&self, iml: f64) -> Option<PoE> {
        self.points
            .iter()
            .find(|(x, _)| (*x - iml).abs() < 1e-12)
            .map(|(_, p)| *p)
    }

    /// OR-aggregates two curves sharing the same IML grid, combining each
    /// matching point with [`PoE::combine`]. Points present in only one
    /// curve are passed through unchanged (treated as combined with PoE 0).
    pub fn combine(&self, other: &Curve) -> Curve {
        if self.points.is_empty() {
            return other.clone();
        }
        if other.points.is_empty() {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.points.len());
        for (iml, poe) in &self.points {
            let combined = match other.poe_at(*iml) {
                Some(other_poe) => poe.combine(other_poe),
                None => *poe,
            };
            out.push((*iml, combined));
        }
        Curve { points: out }
    }
}

/// A sparse site → IMT → curve map, the result of a classical hazard
/// calculation for one (trt, gsim) group or one realization.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityMap {
    curves: HashMap<(SiteId, Imt), Curve>,
}

/// `serde_json`'s map-key serializer only accepts strings, so a
/// `HashMap` keyed by `(SiteId, Imt)` cannot derive `Serialize`/
/// `Deserialize` directly — it would panic the first time a
/// `ProbabilityMap` actually round-trips through the store. Mirrored
/// through a flat `Vec` of entries instead.
impl Serialize for ProbabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.curves.len()))?;
        for ((site, imt), curve) in &self.curves {
            seq.serialize_element(&(*site, *imt, curve))?;
        }
        seq.end()
    }
}

struct ProbabilityMapVisitor;

impl<'de> Visitor<'de> for ProbabilityMapVisitor {
    type Value = ProbabilityMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of (site, imt, curve) entries")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut curves = HashMap::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some((site, imt, curve)) = seq.next_element::<(SiteId, Imt, Curve)>()? {
            curves.insert((site, imt), curve);
        }
        Ok(ProbabilityMap { curves })
    }
}

impl<'de> Deserialize<'de> for ProbabilityMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(ProbabilityMapVisitor)
    }
}

impl ProbabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, site: SiteId, imt: Imt, curve: Curve) {
        self.curves.insert((site, imt), curve);
    }

    pub fn get(&self, site: SiteId, imt: Imt) -> Option<&Curve> {
        self.curves.get(&(site, imt))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Every `(site, imt)` key this map has a curve for, in arbitrary
    /// order — used to enumerate the full key space across several maps
    /// (e.g. averaging curves across realizations).
    pub fn keys(&self) -> impl Iterator<Item = &(SiteId, Imt)> {
        self.curves.keys()
    }

    /// Combines two probability maps key-by-key with [`Curve::combine`],
    /// the generalization of `agg_prob` from scalar probabilities to whole
    /// curves — the combinator `RlzsAssoc::combine_curves` applies per
    /// realization.
    pub fn combine(&self, other: &ProbabilityMap) -> ProbabilityMap {
        let mut out = self.clone();
        for (key, curve) in &other.curves {
            out.curves
                .entry(*key)
                .and_modify(|existing| *existing = existing.combine(curve))
                .or_insert_with(|| curve.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_is_commutative_per_point() {
        let a = Curve::from_points(vec![(0.1, PoE::new(0.2)), (0.2, PoE::new(0.1))]);
        let b = Curve::from_points(vec![(0.1, PoE::new(0.3)), (0.2, PoE::new(0.05))]);
        let ab = a.combine(&b);
        let ba = b.combine(&a);
        for ((x1, p1), (x2, p2)) in ab.points().iter().zip(ba.points().iter()) {
            assert!((x1 - x2).abs() < 1e-12);
            assert!((p1.value() - p2.value()).abs() < 1e-12);
        }
    }

    #[test]
    fn map_combine_merges_distinct_and_shared_keys() {
        let mut m1 = ProbabilityMap::new();
        m1.set(SiteId(1), Imt::Pga, Curve::from_points(vec![(0.1, PoE::new(0.2))]));
        let mut m2 = ProbabilityMap::new();
        m2.set(SiteId(1), Imt::Pga, Curve::from_points(vec![(0.1, PoE::new(0.3))]));
        m2.set(SiteId(2), Imt::Pga, Curve::from_points(vec![(0.1, PoE::new(0.1))]));

        let combined = m1.combine(&m2);
        assert_eq!(combined.len(), 2);
        let p = combined.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap();
        assert!((p.value() - (1.0 - 0.8 * 0.7)).abs() < 1e-12);
    }

    #[test]
    fn round_trips_through_json_with_tuple_keys() {
        let mut m = ProbabilityMap::new();
        m.set(SiteId(1), Imt::Pga, Curve::from_points(vec![(0.1, PoE::new(0.2))]));
        m.set(SiteId(2), Imt::Sa(50), Curve::from_points(vec![(0.2, PoE::new(0.4))]));

        let json = serde_json::to_value(&m).unwrap();
        let back: ProbabilityMap = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(
            back.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap().value(),
            0.2
        );
        assert_eq!(
            back.get(SiteId(2), Imt::Sa(50)).unwrap().poe_at(0.2).unwrap().value(),
            0.4
        );
    }
}
