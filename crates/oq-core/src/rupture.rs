//! Rupture and event-based-rupture records.
//!
//! Rupture geometry/surface computation is out of scope (§1 Non-goals);
//! these structs only carry the fields the orchestration layer itself
//! needs: magnitude (for filtering/aggregation), a source reference, and
//! the deterministic serial number used for reproducible seeding.

use crate::ids::TrtId;
use serde::{Deserialize, Serialize};

/// A rupture as produced by a source, before event-set sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rupture {
    pub source_id: String,
    pub trt_id: TrtId,
    pub mag: f64,
    /// Dense serial assigned by the source manager: unique within a
    /// calculation, assigned via a pre-allocated contiguous range per
    /// source so that splitting a source never reshuffles its children's
    /// serials.
    pub serial: u32,
    /// Annual occurrence rate, used by event-based calculators to sample
    /// a Poissonian number of events per rupture over the investigation
    /// time.
    pub occurrence_rate: f64,
}

/// A rupture that has been sampled into a stochastic event set, carrying
/// the per-event seed used to derive ground-motion epsilons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EBRupture {
    pub rupture: Rupture,
    pub event_id: u64,
    pub rup_seed: u64,
    /// `rup_seed - run_seed + 1`: the stable per-rupture offset quoted in
    /// the data model's serial-assignment invariant, independent of which
    /// worker produced the rupture.
    pub sample_ordinal: u32,
    pub multiplicity: u32,
}

impl EBRupture {
    pub fn new(rupture: Rupture, event_id: u64, rup_seed: u64, run_seed: u64, multiplicity: u32) -> Self {
        let sample_ordinal = rup_seed.wrapping_sub(run_seed).wrapping_add(1) as u32;
        Self {
            rupture,
            event_id,
            rup_seed,
            sample_ordinal,
            multiplicity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_ordinal_is_offset_from_run_seed() {
        let rup = Rupture {
            source_id: "s1".into(),
            trt_id: TrtId(0),
            mag: 6.5,
            serial: 42,
            occurrence_rate: 0.01,
        };
        let eb = EBRupture::new(rup, 1, 1001, 1000, 1);
        assert_eq!(eb.sample_ordinal, 2);
    }
}
