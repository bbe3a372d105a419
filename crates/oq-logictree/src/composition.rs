//! `CompositionInfo`: the serializable skeleton of the composite source
//! model (per-source-model weights, TRT membership, sampling
//! configuration) needed to build a `RlzsAssoc` without the full source
//! objects in hand. Added per the source-model/GSIM logic-tree algorithm
//! in `CompositionInfo.get_rlzs_assoc`, which spec.md's RlzsAssoc section
//! presupposes but never names explicitly.

use crate::assoc::RlzsAssoc;
use crate::error::LogicTreeResult;
use crate::gsim_tree::GsimLogicTree;
use crate::realization::LtRealization;
use oq_core::{RlzOrdinal, SourceModel, Weight};

#[derive(Debug, Clone)]
pub struct CompositionInfo {
    pub seed: u64,
    /// 0 means full enumeration; otherwise the total number of Monte
    /// Carlo realizations drawn across all source models.
    pub num_samples: u32,
    pub gsim_lt: GsimLogicTree,
}

impl CompositionInfo {
    pub fn new(seed: u64, num_samples: u32, gsim_lt: GsimLogicTree) -> Self {
        Self {
            seed,
            num_samples,
            gsim_lt,
        }
    }

    /// Builds the full realization association, mirroring
    /// `CompositionInfo.get_rlzs_assoc`:
    /// 1. for every source model, recompute `eff_ruptures` per TRT model
    ///    via `count_ruptures` and drop TRT models left with zero;
    /// 2. reduce the GSIM logic tree to the TRTs actually present;
    /// 3. enumerate or Monte-Carlo-sample GSIM choices per source model;
    /// 4. assign dense, ordered realization ordinals and assemble the
    ///    `(trt_id, gsim) -> [rlz]` association.
    pub fn get_rlzs_assoc<F>(&self, source_models: &mut [SourceModel], mut count_ruptures: F) -> LogicTreeResult<RlzsAssoc>
    where
        F: FnMut(&SourceModel, usize) -> u32,
    {
        let mut realizations = Vec::new();
        let mut rlz_trt_keys: Vec<Vec<(oq_core::TrtId, String)>> = Vec::new();

        for sm in source_models.iter_mut() {
            let n_tm = sm.trt_models.len();
            for tm_idx in 0..n_tm {
                let eff = count_ruptures(sm, tm_idx);
                sm.trt_models[tm_idx].set_eff_ruptures(eff).ok();
            }
            let dropped = sm.drop_empty_trt_models();
            if dropped > 0 {
                tracing::warn!(source_model = %sm.name, dropped, "dropped TRT models with zero effective ruptures");
            }

            let mut trts: Vec<String> = sm.trts().into_iter().map(|s| s.to_string()).collect();
            trts.sort();
            if trts.is_empty() {
                continue;
            }

            let gsim_rlzs = if self.num_samples > 0 {
                self.gsim_lt
                    .sample(&trts, sm.samples, self.seed + sm.ordinal as u64)?
            } else {
                self.gsim_lt.enumerate(&trts)?
            };

            for gsim_rlz in gsim_rlzs {
                let weight = if self.num_samples > 0 {
                    Weight::new(1.0 / self.num_samples as f64)
                } else {
                    Weight::new(sm.weight * gsim_rlz.weight.value())
                };
                let sample_id = if self.num_samples > 0 {
                    Some(realizations.len() as u32)
                } else {
                    None
                };
                let trt_keys: Vec<(oq_core::TrtId, String)> = sm
                    .trt_models
                    .iter()
                    .filter_map(|tm| gsim_rlz.gsim_by_trt.get(&tm.trt).map(|gsim| (tm.id, gsim.clone())))
                    .collect();
                realizations.push(LtRealization {
                    ordinal: RlzOrdinal(realizations.len() as u32),
                    sm_lt_path: sm.path.clone(),
                    sm_ordinal: sm.ordinal,
                    gsim_rlz,
                    weight,
                    sample_id,
                });
                rlz_trt_keys.push(trt_keys);
            }
        }

        RlzsAssoc::build(realizations, rlz_trt_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oq_core::{SourceSkeleton, TrtId, TrtModel};

    fn simple_source_model(ordinal: u32, weight: f64) -> SourceModel {
        let mut sm = SourceModel::new(format!("sm{ordinal}"), weight, vec![format!("b{ordinal}")], ordinal);
        let mut tm = TrtModel::new(TrtId(ordinal), "Active Shallow Crust");
        tm.add_source(SourceSkeleton {
            id: format!("s{ordinal}"),
            weight: 1.0,
            num_ruptures: 10,
        })
        .unwrap();
        sm.trt_models.push(tm);
        sm
    }

    fn gsim_tree() -> GsimLogicTree {
        let mut t = GsimLogicTree::new();
        t.add_branch("Active Shallow Crust", "BA2008", Weight::new(0.5));
        t.add_branch("Active Shallow Crust", "CY2008", Weight::new(0.5));
        t
    }

    #[test]
    fn full_enumeration_weights_sum_to_one() {
        let mut sms = vec![simple_source_model(0, 1.0)];
        let ci = CompositionInfo::new(0, 0, gsim_tree());
        let assoc = ci.get_rlzs_assoc(&mut sms, |_, _| 10).unwrap();
        let total: f64 = assoc.realizations().iter().map(|r| r.weight.value()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sampling_drops_empty_trt_models() {
        let mut sms = vec![simple_source_model(0, 1.0)];
        let ci = CompositionInfo::new(7, 4, gsim_tree());
        // count_ruptures returns 0 -> the only TRT model becomes empty -> no realizations.
        let assoc = ci.get_rlzs_assoc(&mut sms, |_, _| 0).unwrap();
        assert!(assoc.realizations().is_empty());
    }

    #[test]
    fn sampling_assigns_equal_weights() {
        let mut sms = vec![simple_source_model(0, 1.0)];
        let ci = CompositionInfo::new(7, 4, gsim_tree());
        sms[0].samples = 4;
        let assoc = ci.get_rlzs_assoc(&mut sms, |_, _| 10).unwrap();
        assert_eq!(assoc.realizations().len(), 4);
        for rlz in assoc.realizations() {
            assert!((rlz.weight.value() - 0.25).abs() < 1e-12);
        }
    }
}
