//! Composite-source-model building blocks: a tectonic-region-type model
//! grouping sources, and a source model grouping TRT models under a
//! logic-tree branch path.
//!
//! Rupture generation and seismogenic geometry are out of scope — sources
//! here are opaque, weighted, filterable units identified by id; a real
//! implementation would plug hazardlib-equivalent geometry behind the
//! [`FilterableSource`] trait.

use crate::error::{OqError, OqResult};
use crate::ids::TrtId;
use std::collections::HashSet;

/// Minimal interface a seismic source must satisfy so that filtering,
/// splitting and block-packing (see `oq-source`) can operate on it without
/// knowing its internal geometry.
pub trait FilterableSource {
    fn source_id(&self) -> &str;
    /// Relative computational cost, used for block-splitting and the
    /// light/heavy source classification.
    fn weight(&self) -> f64;
    fn num_ruptures(&self) -> u32;
}

/// A single seismic source, reduced to the fields the orchestration layer
/// actually reads: id, weight and rupture count. Geometry and rupture
/// sampling are delegated to an external `FilterableSource` impl in a real
/// deployment; this struct doubles as a lightweight test double.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSkeleton {
    pub id: String,
    pub weight: f64,
    pub num_ruptures: u32,
}

impl FilterableSource for SourceSkeleton {
    fn source_id(&self) -> &str {
        &self.id
    }
    fn weight(&self) -> f64 {
        self.weight
    }
    fn num_ruptures(&self) -> u32 {
        self.num_ruptures
    }
}

/// A group of sources sharing one tectonic region type, the unit a GSIM
/// logic-tree branch applies to.
#[derive(Debug, Clone)]
pub struct TrtModel {
    pub id: TrtId,
    pub trt: String,
    pub sources: Vec<SourceSkeleton>,
    pub min_mag: f64,
    pub max_mag: f64,
    eff_ruptures: u32,
}

impl TrtModel {
    pub fn new(id: TrtId, trt: impl Into<String>) -> Self {
        Self {
            id,
            trt: trt.into(),
            sources: Vec::new(),
            min_mag: f64::INFINITY,
            max_mag: 0.0,
            eff_ruptures: 0,
        }
    }

    /// Adds a source, rejecting duplicate ids the way `TrtModel` in the
    /// original enforces one source id per composite model.
    pub fn add_source(&mut self, source: SourceSkeleton) -> OqResult<()> {
        if self.sources.iter().any(|s| s.id == source.id) {
            return Err(OqError::DuplicateSourceId(source.id));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn tot_ruptures(&self) -> u32 {
        self.sources.iter().map(|s| s.num_ruptures).sum()
    }

    pub fn eff_ruptures(&self) -> u32 {
        self.eff_ruptures
    }

    /// Sets the effective (post-filtering) rupture count. Can only
    /// decrease — a TRT model is filtered down over the lifecycle of a
    /// calculation, never expanded, matching the invariant in
    /// `source.py::TrtModel.update`.
    pub fn set_eff_ruptures(&mut self, count: u32) -> OqResult<()> {
        if count > self.tot_ruptures() {
            return Err(OqError::InvalidHazard(format!(
                "eff_ruptures {count} exceeds tot_ruptures {}",
                self.tot_ruptures()
            )));
        }
        self.eff_ruptures = count;
        Ok(())
    }

    pub fn update_mag_range(&mut self, min_mag: f64, max_mag: f64) {
        self.min_mag = self.min_mag.min(min_mag);
        self.max_mag = self.max_mag.max(max_mag);
    }
}

/// One branch of the source-model logic tree: a named weighted model made
/// of one or more TRT models.
#[derive(Debug, Clone)]
pub struct SourceModel {
    pub name: String,
    pub weight: f64,
    pub path: Vec<String>,
    pub trt_models: Vec<TrtModel>,
    pub ordinal: u32,
    pub samples: u32,
}

impl SourceModel {
    pub fn new(name: impl Into<String>, weight: f64, path: Vec<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            path,
            trt_models: Vec::new(),
            ordinal,
            samples: 1,
        }
    }

    pub fn trts(&self) -> HashSet<&str> {
        self.trt_models.iter().map(|tm| tm.trt.as_str()).collect()
    }

    /// Drops TRT models whose effective rupture count is zero, mirroring
    /// `CompositionInfo.get_rlzs_assoc`'s logic-tree reduction step, and
    /// reports how many were dropped.
    pub fn drop_empty_trt_models(&mut self) -> usize {
        let before = self.trt_models.len();
        self.trt_models.retain(|tm| tm.eff_ruptures() > 0);
        before - self.trt_models.len()
    }
}
