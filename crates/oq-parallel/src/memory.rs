//! Memory guard: samples system memory usage and flags soft/hard
//! thresholds, mirroring `check_mem_usage`'s soft=90%/hard=100% defaults.

use crate::error::TaskError;
use sysinfo::System;

#[derive(Debug, Clone, Copy)]
pub struct MemoryGuard {
    pub soft_pct: f64,
    pub hard_pct: f64,
}

impl Default for MemoryGuard {
    fn default() -> Self {
        Self {
            soft_pct: 90.0,
            hard_pct: 100.0,
        }
    }
}

impl MemoryGuard {
    pub fn new(soft_pct: f64, hard_pct: f64) -> Self {
        Self { soft_pct, hard_pct }
    }

    /// Returns the current system memory usage as a percentage of total.
    pub fn sample_used_pct(&self, sys: &System) -> f64 {
        let total = sys.total_memory();
        if total == 0 {
            return 0.0;
        }
        (sys.used_memory() as f64 / total as f64) * 100.0
    }

    /// Checks a usage percentage against the configured thresholds. Above
    /// `soft_pct` this logs a warning through `tracing`; above `hard_pct` it
    /// returns `TaskError::OutOfMemory` so the caller aborts the batch
    /// rather than risking an OS-level kill mid-reduction.
    pub fn check(&self, used_pct: f64) -> Result<(), TaskError> {
        if used_pct >= self.hard_pct {
            return Err(TaskError::OutOfMemory {
                used_pct,
                hard_pct: self.hard_pct,
            });
        }
        if used_pct >= self.soft_pct {
            tracing::warn!(used_pct, soft_pct = self.soft_pct, "memory usage above soft threshold");
        }
        Ok(())
    }
}
