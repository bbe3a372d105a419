//! The calculator lifecycle: the abstract pre_execute -> execute ->
//! post_execute -> export state machine every calculator in this
//! workspace implements, plus the pre-calculator chaining and
//! parent-store rebinding `run` performs before handing control to a
//! concrete calculator.
//!
//! Grounded in `base.py::BaseCalculator.run`: a calculation either starts
//! a pre-calculator fresh (sharing its store) or reopens a prior
//! calculation's store as a read-only parent, then executes the same four
//! phases regardless of calculation mode.

use crate::config::ResolvedJobConfig;
use crate::error::CalcResult;
use crate::persistent_attrs::{JobInfo, PersistentAttrs};
use chrono::Utc;
use oq_parallel::{Distribution, TaskManager};
use oq_store::DataStore;
use std::sync::Arc;

/// Everything a calculator's phases need: the persisted-attribute cache
/// (backed by this calculation's store), the resolved configuration, and
/// a task manager for parallel map-reduce.
pub struct CalcContext {
    pub attrs: PersistentAttrs,
    pub config: ResolvedJobConfig,
    pub tasks: TaskManager,
}

impl CalcContext {
    pub fn new(store: DataStore, config: ResolvedJobConfig) -> CalcResult<Self> {
        let tasks = TaskManager::new(0, Distribution::Pool)?;
        Ok(Self { attrs: PersistentAttrs::new(store), config, tasks })
    }

    /// Builds a context over a fresh store chained to `parent` — the
    /// "prior calculation id given" branch of `run`: reads cascade to the
    /// parent's datasets/attrs, writes land only in the new store.
    pub fn with_parent(calc_id: u64, parent: Arc<DataStore>, config: ResolvedJobConfig) -> CalcResult<Self> {
        let mut store = DataStore::new(calc_id);
        store.set_parent(parent);
        Self::new(store, config)
    }

    /// Flushes the store and leaves it open for the next phase or an
    /// exporter to read, mirroring `BaseCalculator.clean_up`: this
    /// pipeline never closes a store mid-run.
    pub fn clean_up(&self) {
        self.attrs.store().flush();
    }
}

/// The four-phase lifecycle every calculator implements. `ExecOutput` is
/// the in-memory aggregate `execute` hands to `post_execute` — kept as an
/// associated type (rather than `Box<dyn Any>`) so each calculator's
/// aggregate stays concretely typed through the state machine.
pub trait Calculator {
    type ExecOutput;

    fn pre_execute(&mut self, ctx: &mut CalcContext) -> CalcResult<()>;
    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput>;
    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()>;

    /// Export is format-driven and optional; calculators that don't
    /// support a given `exports` entry simply return nothing for it.
    fn export(&mut self, _ctx: &CalcContext) -> CalcResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Drives one calculator through its full lifecycle: pre_execute,
/// execute, post_execute, export, then clean_up. This is the single state
/// machine every calculation mode goes through — modes differ only in
/// which `Calculator` impl is plugged in.
pub fn run<C: Calculator>(calc: &mut C, ctx: &mut CalcContext) -> CalcResult<Vec<String>> {
    let start_time = Utc::now();
    calc.pre_execute(ctx)?;
    let result = calc.execute(ctx)?;
    calc.post_execute(ctx, result)?;
    let exported = calc.export(ctx)?;

    let calc_id = ctx.attrs.store().calc_id;
    let job_info = JobInfo::new(calc_id, start_time, Utc::now());
    ctx.attrs.set_job_info(&job_info)?;

    ctx.clean_up();
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, JobConfig};
    use std::collections::HashMap;

    fn minimal_config(mode: &str) -> ResolvedJobConfig {
        resolve(JobConfig {
            calculation_mode: mode.to_string(),
            maximum_distance: HashMap::new(),
            minimum_intensity: HashMap::new(),
            sites_per_tile: None,
            concurrent_tasks: 0,
            ses_per_logic_tree_path: 1,
            investigation_time: Some(50.0),
            risk_investigation_time: None,
            number_of_logic_tree_samples: 0,
            random_seed: None,
            master_seed: None,
            truncation_level: 3.0,
            asset_correlation: None,
            quantile_hazard_curves: vec![],
            mean_hazard_curves: false,
            poes: vec![],
            hazard_maps: false,
            individual_curves: false,
            insured_losses: false,
            avg_losses: false,
            asset_loss_table: false,
            conditional_loss_poes: vec![],
            loss_curve_resolution: 50,
            time_event: None,
            specific_assets: vec![],
            exports: vec![],
            export_dir: None,
        })
        .unwrap()
    }

    struct CountingCalculator {
        pre_calls: u32,
        exec_calls: u32,
        post_calls: u32,
    }

    impl Calculator for CountingCalculator {
        type ExecOutput = u32;

        fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
            self.pre_calls += 1;
            Ok(())
        }

        fn execute(&mut self, _ctx: &CalcContext) -> CalcResult<u32> {
            self.exec_calls += 1;
            Ok(42)
        }

        fn post_execute(&mut self, ctx: &mut CalcContext, result: u32) -> CalcResult<()> {
            self.post_calls += 1;
            ctx.attrs.set_cost_types(&[result.to_string()])?;
            Ok(())
        }
    }

    #[test]
    fn run_drives_every_phase_exactly_once_in_order() {
        let mut ctx = CalcContext::new(DataStore::new(1), minimal_config("classical")).unwrap();
        let mut calc = CountingCalculator { pre_calls: 0, exec_calls: 0, post_calls: 0 };
        run(&mut calc, &mut ctx).unwrap();
        assert_eq!((calc.pre_calls, calc.exec_calls, calc.post_calls), (1, 1, 1));
        assert_eq!(ctx.attrs.cost_types().unwrap(), vec!["42".to_string()]);

        let job_info = ctx.attrs.job_info().unwrap();
        assert_eq!(job_info.calc_id, 1);
        assert!(job_info.end_time >= job_info.start_time);
        assert!(job_info.duration_ms >= 0);
    }

    #[test]
    fn parent_store_rebinding_exposes_prior_calculation_data() {
        let parent_store = DataStore::new(1);
        parent_store.set("csm", &"prior-csm".to_string()).unwrap();
        let parent = Arc::new(parent_store);

        let ctx = CalcContext::with_parent(2, parent, minimal_config("classical_risk")).unwrap();
        let csm: String = ctx.attrs.store().get("csm").unwrap();
        assert_eq!(csm, "prior-csm");
    }
}
