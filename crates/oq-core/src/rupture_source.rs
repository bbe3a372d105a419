//! Rupture generation port: expands an opaque [`SourceSkeleton`] into the
//! concrete [`Rupture`]s a hazard calculator samples or convolves.
//!
//! Real seismogenic rupture generation (fault geometry, magnitude-frequency
//! distribution integration) is out of scope (§1 Non-goals); calculators
//! depend only on this trait, with a uniform-rate test double standing in
//! for a real source typology.

use crate::ids::TrtId;
use crate::rupture::Rupture;
use crate::source_model::SourceSkeleton;
use std::ops::Range;

/// Expands a source into one rupture per serial in `serials` — the dense
/// range the source manager pre-assigned to this source (see
/// `oq-source::serials::assign_serials`), so every rupture this trait
/// produces carries a stable, calculation-wide unique serial.
pub trait RuptureSource: Sync {
    fn ruptures_for(&self, source: &SourceSkeleton, trt_id: TrtId, serials: Range<u32>) -> Vec<Rupture>;
}

/// Splits a source's total occurrence rate (its `weight`) evenly across
/// every rupture in its serial range, all at a single fixed magnitude.
/// Good enough for exercising the orchestration layer without a real
/// magnitude-frequency distribution.
pub struct UniformRuptureSource {
    pub mag: f64,
}

impl RuptureSource for UniformRuptureSource {
    fn ruptures_for(&self, source: &SourceSkeleton, trt_id: TrtId, serials: Range<u32>) -> Vec<Rupture> {
        let n = serials.len().max(1) as f64;
        let occurrence_rate = source.weight / n;
        serials
            .map(|serial| Rupture {
                source_id: source.id.clone(),
                trt_id,
                mag: self.mag,
                serial,
                occurrence_rate,
            })
            .collect()
    }
}
