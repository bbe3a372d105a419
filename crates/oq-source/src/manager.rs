//! `SourceManager`: filter sources against a tile, split heavy ones,
//! assign dense rupture serials, and pack the survivors into
//! weight-bounded task blocks. Mirrors `source.py::SourceManager`.

use crate::info::{SourceChunk, SourceInfo};
use crate::serials::assign_serials;
use crate::tile::SiteTile;
use oq_core::{SourceSkeleton, TrtId};
use oq_parallel::split_weighted;
use std::collections::HashMap;
use std::ops::Range;

/// Splits an over-weight source into lighter children. Real geometric
/// splitting is out of scope; this trait is the seam a concrete
/// seismogenic-source implementation plugs into.
pub trait SourceSplitter {
    fn split(&self, source: &SourceSkeleton, maxweight: f64) -> Vec<SourceSkeleton>;
}

/// Splits a source into equal-weight chunks of roughly `maxweight`,
/// dividing its rupture count proportionally. Good enough for testing the
/// orchestration layer without real fault-geometry splitting logic.
pub struct EqualWeightSplitter;

impl SourceSplitter for EqualWeightSplitter {
    fn split(&self, source: &SourceSkeleton, maxweight: f64) -> Vec<SourceSkeleton> {
        if source.weight <= maxweight || maxweight <= 0.0 {
            return vec![source.clone()];
        }
        let n_chunks = (source.weight / maxweight).ceil() as u32;
        let n_chunks = n_chunks.max(1);
        let base_ruptures = source.num_ruptures / n_chunks;
        let remainder = source.num_ruptures % n_chunks;
        let mut out = Vec::with_capacity(n_chunks as usize);
        for i in 0..n_chunks {
            let nr = base_ruptures + if i < remainder { 1 } else { 0 };
            out.push(SourceSkeleton {
                id: format!("{}:{}", source.id, i),
                weight: source.weight / n_chunks as f64,
                num_ruptures: nr,
            });
        }
        out
    }
}

pub struct SourceManager {
    pub run_seed: u64,
    pub maxweight: f64,
    src_serial: HashMap<String, Range<u32>>,
}

impl SourceManager {
    pub fn new(run_seed: u64, maxweight: f64) -> Self {
        Self {
            run_seed,
            maxweight,
            src_serial: HashMap::new(),
        }
    }

    /// Scales `maxweight` for tiled calculations: `maxweight * sqrt(num_tiles) / 2`,
    /// the heuristic `SourceManager` uses so a site collection split into
    /// more tiles still produces reasonably sized task blocks.
    pub fn effective_maxweight(&self, num_tiles: usize) -> f64 {
        self.maxweight * (num_tiles.max(1) as f64).sqrt() / 2.0
    }

    pub fn filter<'a>(&self, sources: &'a [SourceSkeleton], tile: &dyn SiteTile) -> Vec<&'a SourceSkeleton> {
        sources.iter().filter(|s| tile.contains(*s)).collect()
    }

    /// Assigns a dense, contiguous serial range to every source in
    /// iteration order and remembers it, so later calls (e.g. after
    /// splitting) can reslice the same range for a source's children.
    pub fn assign_serials(&mut self, sources: &[SourceSkeleton]) {
        let pairs: Vec<(&str, u32)> = sources.iter().map(|s| (s.id.as_str(), s.num_ruptures)).collect();
        let start = self.src_serial.values().map(|r| r.end).max().unwrap_or(0);
        let new_ranges = assign_serials(pairs, start);
        self.src_serial.extend(new_ranges);
    }

    pub fn serial_range(&self, source_id: &str) -> Option<&Range<u32>> {
        self.src_serial.get(source_id)
    }

    /// Splits every heavy source with `splitter`, reslicing the parent's
    /// serial range across the children so total serial coverage is
    /// unchanged by splitting.
    pub fn split_heavy(&mut self, sources: &[SourceSkeleton], splitter: &dyn SourceSplitter) -> Vec<SourceSkeleton> {
        let mut out = Vec::new();
        for source in sources {
            if source.weight <= self.maxweight {
                out.push(source.clone());
                continue;
            }
            let parent_range = self.src_serial.get(&source.id).cloned().unwrap_or(0..source.num_ruptures);
            let children = splitter.split(source, self.maxweight);
            let mut offset = 0;
            for child in children {
                let count = child.num_ruptures;
                let range = crate::serials::child_range(&parent_range, offset, count);
                self.src_serial.insert(child.id.clone(), range);
                offset += count;
                out.push(child);
            }
        }
        out
    }

    /// Packs light sources then heavy (already split) sources into
    /// weight-bounded, TRT-respecting task blocks, mirroring
    /// `SourceManager.submit_sources`'s light-then-heavy ordering.
    pub fn submit_sources<'a>(
        &self,
        light: &'a [SourceSkeleton],
        heavy: &'a [SourceSkeleton],
        trt_of: impl Fn(&SourceSkeleton) -> TrtId,
    ) -> Vec<Vec<&'a SourceSkeleton>> {
        let mut ordered: Vec<&SourceSkeleton> = light.iter().collect();
        ordered.extend(heavy.iter());
        split_weighted(&ordered, self.maxweight, |s| s.weight, |s| trt_of(s)).into_iter().map(|block| {
            block.into_iter().copied().collect()
        }).collect()
    }

    pub fn source_info(&self, source: &SourceSkeleton, trt_id: TrtId) -> SourceInfo {
        SourceInfo::new(source.id.clone(), trt_id, source.weight)
    }

    pub fn source_chunk(&self, block: &[&SourceSkeleton]) -> SourceChunk {
        SourceChunk {
            num_sources: block.len() as u32,
            weight: block.iter().map(|s| s.weight).sum(),
            sent_bytes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::AllowList;

    fn src(id: &str, weight: f64, nr: u32) -> SourceSkeleton {
        SourceSkeleton { id: id.to_string(), weight, num_ruptures: nr }
    }

    #[test]
    fn serial_assignment_is_contiguous_and_dense() {
        let mut mgr = SourceManager::new(42, 10.0);
        let sources = vec![src("a", 1.0, 5), src("b", 1.0, 3)];
        mgr.assign_serials(&sources);
        assert_eq!(mgr.serial_range("a").unwrap(), &(0..5));
        assert_eq!(mgr.serial_range("b").unwrap(), &(5..8));
    }

    #[test]
    fn splitting_preserves_total_rupture_count() {
        let mut mgr = SourceManager::new(1, 5.0);
        let sources = vec![src("heavy", 23.0, 23)];
        mgr.assign_serials(&sources);
        let children = mgr.split_heavy(&sources, &EqualWeightSplitter);
        let total: u32 = children.iter().map(|c| c.num_ruptures).sum();
        assert_eq!(total, 23);
        assert!(children.len() > 1);
    }

    #[test]
    fn splitting_reslices_parent_serial_range_without_gaps() {
        let mut mgr = SourceManager::new(1, 5.0);
        let sources = vec![src("heavy", 12.0, 12)];
        mgr.assign_serials(&sources);
        let children = mgr.split_heavy(&sources, &EqualWeightSplitter);
        let mut covered: Vec<u32> = Vec::new();
        for child in &children {
            let range = mgr.serial_range(&child.id).unwrap().clone();
            covered.extend(range);
        }
        covered.sort();
        assert_eq!(covered, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn filter_respects_tile_membership() {
        let mgr = SourceManager::new(1, 10.0);
        let sources = vec![src("in", 1.0, 1), src("out", 1.0, 1)];
        let mut allowed = std::collections::HashSet::new();
        allowed.insert("in".to_string());
        let filtered = mgr.filter(&sources, &AllowList(allowed));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "in");
    }

    #[test]
    fn submit_sources_never_mixes_trt_ids_in_a_block() {
        let mgr = SourceManager::new(1, 100.0);
        let light = vec![src("a", 1.0, 1), src("b", 1.0, 1)];
        let heavy: Vec<SourceSkeleton> = vec![];
        let blocks = mgr.submit_sources(&light, &heavy, |s| if s.id == "a" { TrtId(0) } else { TrtId(1) });
        assert_eq!(blocks.len(), 2);
    }
}
