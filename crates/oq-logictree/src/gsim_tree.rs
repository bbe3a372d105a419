//! The GSIM (ground-motion-prediction-equation) logic tree: one weighted
//! branch set per tectonic region type. The GSIMs themselves are opaque
//! names here — the actual intensity computation is out of scope and
//! lives behind a `GroundMotionModel` trait in `oq-hazard`.

use crate::error::{LogicTreeError, LogicTreeResult};
use oq_core::Weight;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct GsimLogicTree {
    branches: BTreeMap<String, Vec<(String, Weight)>>,
}

/// One concrete choice of GSIM per tectonic region type, with its combined
/// weight across the TRTs it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsimRealization {
    pub gsim_by_trt: BTreeMap<String, String>,
    pub weight: Weight,
}

impl GsimLogicTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&mut self, trt: impl Into<String>, gsim: impl Into<String>, weight: Weight) {
        self.branches.entry(trt.into()).or_default().push((gsim.into(), weight));
    }

    fn branches_for(&self, trt: &str) -> LogicTreeResult<&[(String, Weight)]> {
        self.branches
            .get(trt)
            .map(|v| v.as_slice())
            .ok_or_else(|| LogicTreeError::MissingTrt(trt.to_string()))
    }

    /// Full enumeration: the cartesian product of every TRT's GSIM
    /// branches, restricted to the TRTs actually present in a source
    /// model (mirrors `GsimLogicTree.get_effective_rlzs`, which reduces
    /// the tree to TRTs with `eff_ruptures > 0` before enumerating).
    pub fn enumerate(&self, trts: &[String]) -> LogicTreeResult<Vec<GsimRealization>> {
        let mut combos: Vec<GsimRealization> = vec![GsimRealization {
            gsim_by_trt: BTreeMap::new(),
            weight: Weight::ONE,
        }];
        for trt in trts {
            let branch = self.branches_for(trt)?;
            let mut next = Vec::with_capacity(combos.len() * branch.len());
            for combo in &combos {
                for (gsim, w) in branch {
                    let mut gsim_by_trt = combo.gsim_by_trt.clone();
                    gsim_by_trt.insert(trt.clone(), gsim.clone());
                    next.push(GsimRealization {
                        gsim_by_trt,
                        weight: Weight::new(combo.weight.value() * w.value()),
                    });
                }
            }
            combos = next;
        }
        Ok(combos)
    }

    /// Monte Carlo sampling: draws `num_samples` independent GSIM choices
    /// per TRT from a seeded RNG, each assigned weight `1/num_samples` —
    /// the original's `random.Random(seed).choice` weighted by branch
    /// probability, reimplemented with `rand::seq::SliceRandom::choose_weighted`.
    pub fn sample(&self, trts: &[String], num_samples: u32, seed: u64) -> LogicTreeResult<Vec<GsimRealization>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_weight = Weight::new(1.0 / num_samples.max(1) as f64);
        let mut out = Vec::with_capacity(num_samples as usize);
        for _ in 0..num_samples {
            let mut gsim_by_trt = BTreeMap::new();
            for trt in trts {
                let branch = self.branches_for(trt)?;
                let chosen = branch
                    .choose_weighted(&mut rng, |(_, w)| w.value().max(1e-300))
                    .expect("non-empty branch list")
                    .0
                    .clone();
                gsim_by_trt.insert(trt.clone(), chosen);
            }
            out.push(GsimRealization {
                gsim_by_trt,
                weight: sample_weight,
            });
        }
        Ok(out)
    }
}
