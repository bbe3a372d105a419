//! Per-source accounting: timing breakdown merged across the
//! filter/split/compute stages, and per-task-block chunk records —
//! `source_info`/`source_chunks` in the persisted layout.

use oq_core::TrtId;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source_id: String,
    pub trt_id: TrtId,
    pub weight: f64,
    pub filter_time: f64,
    pub split_time: f64,
    pub calc_time: f64,
}

impl SourceInfo {
    pub fn new(source_id: impl Into<String>, trt_id: TrtId, weight: f64) -> Self {
        Self {
            source_id: source_id.into(),
            trt_id,
            weight,
            ..Default::default()
        }
    }
}

/// Merges timing from a later stage into the running total for the same
/// source, the `SourceInfo.__iadd__` pattern.
impl AddAssign for SourceInfo {
    fn add_assign(&mut self, rhs: Self) {
        self.filter_time += rhs.filter_time;
        self.split_time += rhs.split_time;
        self.calc_time += rhs.calc_time;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    pub num_sources: u32,
    pub weight: f64,
    pub sent_bytes: u64,
}
