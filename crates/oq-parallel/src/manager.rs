//! The task manager: a rayon-backed worker pool generalized from
//! `gat_batch::runner::run_batch`'s `ThreadPoolBuilder` + `par_iter` fan-out
//! into the `starmap`/`apply_reduce`/`reduce`/`wait` shape used throughout
//! the hazard/risk calculators.

use crate::block::split_weighted;
use crate::error::{TaskError, TaskResult};
use crate::memory::MemoryGuard;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::hash::Hash;
use sysinfo::System;

/// Controls whether work actually fans out across the pool, mirroring
/// `OQ_DISTRIBUTE=no`: calculations with few tasks or running under test
/// harnesses can force in-process sequential execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    InProcess,
    Pool,
}

pub struct TaskManager {
    pool: ThreadPool,
    distribution: Distribution,
    memory_guard: MemoryGuard,
}

impl TaskManager {
    pub fn new(num_threads: usize, distribution: Distribution) -> TaskResult<Self> {
        let threads = if num_threads == 0 { num_cpus::get() } else { num_threads };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| TaskError::TaskFailed {
                task: "pool-init".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            pool,
            distribution,
            memory_guard: MemoryGuard::default(),
        })
    }

    pub fn with_memory_guard(mut self, guard: MemoryGuard) -> Self {
        self.memory_guard = guard;
        self
    }

    fn check_memory(&self, task_name: &str) -> TaskResult<()> {
        let mut sys = System::new();
        sys.refresh_memory();
        let used_pct = self.memory_guard.sample_used_pct(&sys);
        self.memory_guard.check(used_pct).map_err(|_| TaskError::OutOfMemory {
            used_pct,
            hard_pct: self.memory_guard.hard_pct,
        })?;
        tracing::debug!(task = task_name, used_pct, "memory check passed");
        Ok(())
    }

    /// Runs `f` over every item in `args`, fanning out across the pool
    /// unless `distribution` is `InProcess` (the no-distribute fallback for
    /// small jobs and tests), collecting every result (including failures)
    /// rather than short-circuiting on the first error — each failure is
    /// tagged with `task_name` so a multi-kind manager can tell which
    /// submission produced it.
    pub fn starmap<A, R, F>(&self, args: &[A], task_name: &str, f: F) -> TaskResult<Vec<R>>
    where
        A: Sync,
        R: Send,
        F: Fn(&A) -> anyhow::Result<R> + Sync,
    {
        self.check_memory(task_name)?;
        let run = || -> Vec<Result<R, anyhow::Error>> {
            match self.distribution {
                Distribution::Pool => self.pool.install(|| args.par_iter().map(|a| f(a)).collect()),
                Distribution::InProcess => args.iter().map(|a| f(a)).collect(),
            }
        };
        run()
            .into_iter()
            .map(|r| {
                r.map_err(|e| TaskError::TaskFailed {
                    task: task_name.to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Splits `items` into weight-bounded, key-respecting blocks (never
    /// crossing a TRT/key boundary), runs `f` on each block, then folds the
    /// partial results with a commutative, associative `reduce`. The
    /// reduction order is intentionally unspecified, matching the
    /// concurrency model's requirement that reducers not depend on it.
    pub fn apply_reduce<A, K, W, Key, R, F, Red>(
        &self,
        items: &[A],
        max_weight: f64,
        weight_fn: W,
        key_fn: Key,
        task_name: &str,
        f: F,
        init: R,
        reduce: Red,
    ) -> TaskResult<R>
    where
        A: Sync,
        K: Eq + Hash + Clone,
        W: Fn(&A) -> f64,
        Key: Fn(&A) -> K,
        R: Send,
        F: Fn(&[&A]) -> anyhow::Result<R> + Sync,
        Red: Fn(R, R) -> R,
    {
        let blocks = split_weighted(items, max_weight, weight_fn, key_fn);
        let partials = self.starmap(&blocks, task_name, |block| f(block))?;
        Ok(partials.into_iter().fold(init, reduce))
    }

    /// Folds a precomputed set of partial results with a commutative,
    /// associative reducer — the non-splitting counterpart of
    /// `apply_reduce`, used when the caller already has per-task results in
    /// hand (e.g. after collecting from several `starmap` calls of
    /// different kinds).
    pub fn reduce<R, Red>(&self, partials: Vec<R>, init: R, reduce: Red) -> R
    where
        Red: Fn(R, R) -> R,
    {
        partials.into_iter().fold(init, reduce)
    }

    /// Blocks until all tasks submitted via `starmap`/`apply_reduce`
    /// complete. Both of those calls are already synchronous in this
    /// implementation (no background submission queue), so `wait` is a
    /// no-op kept for API parity with the original manager's
    /// submit-then-wait protocol.
    pub fn wait(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starmap_runs_every_item() {
        let tm = TaskManager::new(2, Distribution::InProcess).unwrap();
        let items = vec![1, 2, 3, 4];
        let results = tm.starmap(&items, "double", |x| Ok::<_, anyhow::Error>(x * 2)).unwrap();
        assert_eq!(results, vec![2, 4, 6, 8]);
    }

    #[test]
    fn starmap_tags_failure_with_task_name() {
        let tm = TaskManager::new(2, Distribution::InProcess).unwrap();
        let items = vec![1, 0, 2];
        let err = tm
            .starmap(&items, "reciprocal", |x| {
                if *x == 0 {
                    anyhow::bail!("division by zero")
                } else {
                    Ok(1.0 / *x as f64)
                }
            })
            .unwrap_err();
        match err {
            TaskError::TaskFailed { task, message } => {
                assert_eq!(task, "reciprocal");
                assert!(message.contains("division by zero"));
            }
            _ => panic!("expected TaskFailed"),
        }
    }

    #[test]
    fn apply_reduce_never_merges_across_key_boundary_and_sums_correctly() {
        let tm = TaskManager::new(2, Distribution::InProcess).unwrap();
        #[derive(Clone)]
        struct Src {
            key: u32,
            weight: f64,
            value: f64,
        }
        let items = vec![
            Src { key: 0, weight: 1.0, value: 10.0 },
            Src { key: 0, weight: 1.0, value: 20.0 },
            Src { key: 1, weight: 1.0, value: 5.0 },
        ];
        let total = tm
            .apply_reduce(
                &items,
                10.0,
                |s: &Src| s.weight,
                |s: &Src| s.key,
                "sum-block",
                |block: &[&Src]| Ok::<_, anyhow::Error>(block.iter().map(|s| s.value).sum::<f64>()),
                0.0,
                |a, b| a + b,
            )
            .unwrap();
        assert!((total - 35.0).abs() < 1e-9);
    }

    #[test]
    fn pool_distribution_produces_same_results_as_in_process() {
        let tm_pool = TaskManager::new(2, Distribution::Pool).unwrap();
        let items = vec![1, 2, 3, 4, 5];
        let mut results = tm_pool.starmap(&items, "square", |x| Ok::<_, anyhow::Error>(x * x)).unwrap();
        results.sort();
        assert_eq!(results, vec![1, 4, 9, 16, 25]);
    }
}
