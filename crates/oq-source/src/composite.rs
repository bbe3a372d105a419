//! The composite source model: every source model in the logic tree,
//! plus the weight threshold used to classify sources as "light" (cheap
//! enough to run whole) or "heavy" (must be split before it is packed into
//! a task block).

use oq_core::{SourceModel, TrtId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Light,
    Heavy,
    All,
}

#[derive(Debug, Clone)]
pub struct CompositeSourceModel {
    pub source_models: Vec<SourceModel>,
    pub maxweight: f64,
}

impl CompositeSourceModel {
    pub fn new(source_models: Vec<SourceModel>, maxweight: f64) -> Self {
        Self { source_models, maxweight }
    }

    /// Total weight across every source in every source model.
    pub fn total_weight(&self) -> f64 {
        self.source_models
            .iter()
            .flat_map(|sm| &sm.trt_models)
            .flat_map(|tm| &tm.sources)
            .map(|s| s.weight)
            .sum()
    }

    /// Filters sources by weight relative to `maxweight`, mirroring
    /// `CompositeSourceModel.get_sources('light' | 'heavy' | 'all')`.
    pub fn get_sources(&self, kind: SourceKind) -> Vec<(TrtId, &oq_core::SourceSkeleton)> {
        self.source_models
            .iter()
            .flat_map(|sm| sm.trt_models.iter().map(|tm| (tm.id, tm)))
            .flat_map(|(trt_id, tm)| tm.sources.iter().map(move |s| (trt_id, s)))
            .filter(|(_, s)| match kind {
                SourceKind::Light => s.weight <= self.maxweight,
                SourceKind::Heavy => s.weight > self.maxweight,
                SourceKind::All => true,
            })
            .collect()
    }

    /// Per-TRT-model aggregate weight and rupture totals, the
    /// bookkeeping `CompositeSourceModel.set_weights` performs after
    /// sources are filtered/split.
    pub fn weights_by_trt(&self) -> Vec<(TrtId, f64, u32)> {
        self.source_models
            .iter()
            .flat_map(|sm| &sm.trt_models)
            .map(|tm| {
                let weight: f64 = tm.sources.iter().map(|s| s.weight).sum();
                let ruptures: u32 = tm.sources.iter().map(|s| s.num_ruptures).sum();
                (tm.id, weight, ruptures)
            })
            .collect()
    }
}
