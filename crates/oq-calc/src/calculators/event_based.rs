//! Event-based: stochastic event set sampling, ground-motion field
//! generation, and per-event risk. `EventBasedRuptureCalculator` is the
//! pre-calculator `EventBasedCalculator` chains onto (sharing its store,
//! via `run_chained`), and `EventBasedRiskCalculator` in turn chains onto
//! a finished `EventBasedCalculator`.

use crate::error::{CalcError, CalcResult};
use crate::lifecycle::{CalcContext, Calculator};
use oq_core::rupture_source::RuptureSource;
use oq_core::{EBRupture, GmfCollection, Imt, Rupture, RlzOrdinal, SiteId, SourceSkeleton, TrtId};
use oq_hazard::curves::gmvs_to_haz_curve;
use oq_hazard::event_based::generate_gmfs;
use oq_hazard::event_based_rupture::sample_event_set;
use oq_hazard::gsim::GroundMotionModel;
use oq_logictree::CompositionInfo;
use oq_risk::event_based_risk::{aggregate_loss_table, compute_event_losses, empirical_loss_curve, total_loss_by_asset};
use oq_risk::riskinput::build_event_based_inputs;
use oq_risk::vulnerability::VulnerabilityFunction;
use oq_source::{CompositeSourceModel, SiteTile, SourceManager, SourceSplitter};
use std::collections::HashMap;

const SES_RUPTURES_KEY: &str = "ses_ruptures";
const TRT_NAMES_KEY: &str = "trt_names";

/// Samples a stochastic event set from the composite source model: filters
/// and splits sources per TRT model exactly as `ClassicalCalculator`
/// does, then draws a Poisson-distributed occurrence count per rupture
/// over `investigation_time * ses_per_logic_tree_path` years. Event ids
/// are assigned densely over the whole run after a global sort by serial,
/// so they stay stable regardless of which TRT's task produced a rupture
/// first.
pub struct EventBasedRuptureCalculator<'a> {
    composite: CompositeSourceModel,
    composition: CompositionInfo,
    rupture_source: &'a dyn RuptureSource,
    site_tile: &'a dyn SiteTile,
    splitter: &'a dyn SourceSplitter,
    run_seed: u64,
    investigation_time: f64,
    num_tiles: usize,

    manager: SourceManager,
    filtered_sources: HashMap<TrtId, Vec<SourceSkeleton>>,
    trt_names: HashMap<TrtId, String>,
    ebruptures: Vec<EBRupture>,
}

impl<'a> EventBasedRuptureCalculator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        composite: CompositeSourceModel,
        composition: CompositionInfo,
        rupture_source: &'a dyn RuptureSource,
        site_tile: &'a dyn SiteTile,
        splitter: &'a dyn SourceSplitter,
        run_seed: u64,
        investigation_time: f64,
        num_tiles: usize,
    ) -> Self {
        let probe = SourceManager::new(run_seed, composite.maxweight);
        let maxweight = probe.effective_maxweight(num_tiles);
        Self {
            composite,
            composition,
            rupture_source,
            site_tile,
            splitter,
            run_seed,
            investigation_time,
            num_tiles,
            manager: SourceManager::new(run_seed, maxweight),
            filtered_sources: HashMap::new(),
            trt_names: HashMap::new(),
            ebruptures: Vec::new(),
        }
    }

    pub fn ebruptures(&self) -> &[EBRupture] {
        &self.ebruptures
    }
}

impl<'a> Calculator for EventBasedRuptureCalculator<'a> {
    type ExecOutput = Vec<EBRupture>;

    fn pre_execute(&mut self, ctx: &mut CalcContext) -> CalcResult<()> {
        self.filtered_sources.clear();
        self.trt_names.clear();
        ctx.attrs.store().create_extendable(oq_store::layout::SOURCE_INFO);

        let mut eff_by_key: HashMap<(u32, TrtId), u32> = HashMap::new();

        for sm in &self.composite.source_models {
            for tm in &sm.trt_models {
                self.trt_names.insert(tm.id, tm.trt.clone());

                let filtered_refs = self.manager.filter(&tm.sources, self.site_tile);
                let filtered: Vec<SourceSkeleton> = filtered_refs.into_iter().cloned().collect();
                self.manager.assign_serials(&filtered);
                let final_sources = self.manager.split_heavy(&filtered, self.splitter);

                let eff: u32 = final_sources.iter().map(|s| s.num_ruptures).sum();
                eff_by_key.insert((sm.ordinal, tm.id), eff);

                for source in &final_sources {
                    let info = self.manager.source_info(source, tm.id);
                    ctx.attrs.store().append(oq_store::layout::SOURCE_INFO, &info)?;
                }

                self.filtered_sources.entry(tm.id).or_insert_with(Vec::new).extend(final_sources);
            }
        }

        let total_eff_true: f64 = eff_by_key.values().map(|&v| v as f64).sum();
        let mut perf = ctx.attrs.performance().unwrap_or_default();
        perf.insert("eff_ruptures".to_string(), total_eff_true);
        perf.insert("eff_ruptures_per_tile".to_string(), total_eff_true / self.num_tiles.max(1) as f64);
        ctx.attrs.set_performance(&perf)?;

        let mut source_models = self.composite.source_models.clone();
        let rlzs_assoc = self
            .composition
            .get_rlzs_assoc(&mut source_models, |sm, tm_idx| {
                let tm_id = sm.trt_models[tm_idx].id;
                *eff_by_key.get(&(sm.ordinal, tm_id)).unwrap_or(&0)
            })
            .map_err(anyhow::Error::from)?;
        self.composite.source_models = source_models;
        ctx.attrs.set_rlzs_assoc(&rlzs_assoc)?;

        // `gsim_by_trt` on a realization is keyed by TRT name, not `TrtId`;
        // persisted here (as pairs, since a `TrtId` key can't serialize as a
        // JSON map key) so `EventBasedCalculator` can resolve each rupture
        // group's GSIM without re-deriving the TRT grouping itself.
        let trt_names: Vec<(TrtId, String)> = self.trt_names.iter().map(|(id, name)| (*id, name.clone())).collect();
        ctx.attrs.store().set(TRT_NAMES_KEY, &trt_names)?;

        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let trt_ids: Vec<TrtId> = self.filtered_sources.keys().copied().collect();
        let filtered_sources = &self.filtered_sources;
        let rupture_source = self.rupture_source;
        let manager = &self.manager;
        let duration = self.investigation_time * ctx.config.raw.ses_per_logic_tree_path as f64;
        let run_seed = self.run_seed;

        let per_trt = ctx.tasks.starmap(&trt_ids, "event-based-rupture-sampling", move |trt_id| {
            let sources = filtered_sources
                .get(trt_id)
                .ok_or_else(|| anyhow::anyhow!("no filtered sources for trt {trt_id}"))?;
            let mut ruptures: Vec<Rupture> = Vec::new();
            for source in sources {
                let range = manager.serial_range(&source.id).cloned().unwrap_or(0..source.num_ruptures);
                ruptures.extend(rupture_source.ruptures_for(source, *trt_id, range));
            }
            Ok(sample_event_set(&ruptures, duration, run_seed, 0))
        })?;

        let mut all: Vec<EBRupture> = per_trt.into_iter().flatten().collect();
        all.sort_by_key(|eb| eb.rupture.serial);
        for (dense_id, eb) in all.iter_mut().enumerate() {
            eb.event_id = dense_id as u64;
        }
        Ok(all)
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        ctx.attrs.store().create_extendable(SES_RUPTURES_KEY);
        for eb in &result {
            ctx.attrs.store().append(SES_RUPTURES_KEY, eb)?;
        }
        let mut perf = ctx.attrs.performance().unwrap_or_default();
        perf.insert("num_events".to_string(), result.len() as f64);
        ctx.attrs.set_performance(&perf)?;
        self.ebruptures = result;
        Ok(())
    }
}

/// Ground-motion fields per logic-tree realization, and (when IMLs are
/// given) an empirical hazard curve pooled from each realization's GMF
/// sample. Runs as a dependent chained onto a finished
/// `EventBasedRuptureCalculator` store.
pub struct EventBasedCalculator<'a> {
    gmms: HashMap<String, &'a dyn GroundMotionModel>,
    site_ids: Vec<SiteId>,
    imt: Imt,
    imls: Vec<f64>,
}

impl<'a> EventBasedCalculator<'a> {
    pub fn new(gmms: HashMap<String, &'a dyn GroundMotionModel>, site_ids: Vec<SiteId>, imt: Imt, imls: Vec<f64>) -> Self {
        Self { gmms, site_ids, imt, imls }
    }
}

impl<'a> Calculator for EventBasedCalculator<'a> {
    type ExecOutput = Vec<(RlzOrdinal, GmfCollection)>;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let rlzs_assoc = ctx.attrs.rlzs_assoc()?;
        let ebruptures: Vec<EBRupture> = ctx.attrs.store().read_extendable(SES_RUPTURES_KEY)?;
        let ebruptures = &ebruptures;
        let trt_names_vec: Vec<(TrtId, String)> = ctx.attrs.store().get(TRT_NAMES_KEY)?;
        let trt_names: HashMap<TrtId, String> = trt_names_vec.into_iter().collect();
        let trt_names = &trt_names;

        let gmms = &self.gmms;
        let site_ids = &self.site_ids;
        let imt = self.imt;

        let realizations = rlzs_assoc.realizations().to_vec();
        let results = ctx.tasks.starmap(&realizations, "event-based-gmf", move |rlz| {
            let mut by_trt: HashMap<TrtId, Vec<EBRupture>> = HashMap::new();
            for eb in ebruptures.iter() {
                by_trt.entry(eb.rupture.trt_id).or_default().push(eb.clone());
            }
            let mut gmfs = GmfCollection::new();
            for (trt_id, events) in &by_trt {
                let trt_name = trt_names
                    .get(trt_id)
                    .ok_or_else(|| anyhow::anyhow!("no tectonic region type name for trt {trt_id}"))?;
                let gsim = rlz
                    .gsim_rlz
                    .gsim_by_trt
                    .get(trt_name)
                    .ok_or_else(|| anyhow::anyhow!("realization has no gsim for trt '{trt_name}'"))?;
                let gmm = *gmms
                    .get(gsim)
                    .ok_or_else(|| anyhow::anyhow!("no ground motion model registered for gsim '{gsim}'"))?;
                gmfs.extend(generate_gmfs(events, gmm, site_ids, imt));
            }
            Ok((rlz.ordinal, gmfs))
        })?;

        Ok(results)
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        for (ordinal, gmfs) in &result {
            let key = format!("gmf_data/rlz-{:04}", ordinal.value());
            ctx.attrs.store().create_extendable(&key);
            for record in gmfs.records() {
                ctx.attrs.store().append(&key, record)?;
            }
        }

        if !self.imls.is_empty() {
            let num_ses = ctx.config.raw.ses_per_logic_tree_path;
            for (ordinal, gmfs) in &result {
                for &site_id in &self.site_ids {
                    let gmvs: Vec<f64> = gmfs.for_site(site_id).filter(|r| r.imt == self.imt).map(|r| r.gmv).collect();
                    let curve = gmvs_to_haz_curve(&gmvs, &self.imls, num_ses);
                    let key = format!("hcurves/rlz-{:04}", ordinal.value());
                    ctx.attrs.store().set_attr(&key, &site_id.value().to_string(), &curve)?;
                }
            }
        }
        Ok(())
    }
}

/// Per-event, per-asset losses: the event loss table and its aggregate,
/// average annual losses per asset, and an empirical loss-exceedance
/// curve per asset, scaled by `ses_ratio`. Runs as a dependent chained
/// onto a finished `EventBasedCalculator` store.
pub struct EventBasedRiskCalculator<'a> {
    vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>,
    cost_type: String,
    imt: Imt,
    correlation: Option<f64>,
}

impl<'a> EventBasedRiskCalculator<'a> {
    pub fn new(vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>, cost_type: impl Into<String>, imt: Imt, correlation: Option<f64>) -> Self {
        Self { vulnerability, cost_type: cost_type.into(), imt, correlation }
    }
}

impl<'a> Calculator for EventBasedRiskCalculator<'a> {
    type ExecOutput = ();

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let rlzs_assoc = ctx.attrs.rlzs_assoc()?;
        let assetcol = ctx.attrs.assetcol()?;

        ctx.attrs.store().create_extendable("event_loss_table");
        ctx.attrs.store().create_extendable("agg_loss_table");
        ctx.attrs.store().create_extendable("avg_losses");

        for rlz in rlzs_assoc.realizations() {
            let key = format!("gmf_data/rlz-{:04}", rlz.ordinal.value());
            let records = ctx.attrs.store().read_extendable(&key)?;
            let mut gmfs = GmfCollection::new();
            for record in records {
                gmfs.push(record);
            }

            let inputs = build_event_based_inputs(&assetcol, &gmfs, self.imt, self.correlation, ctx.config.master_seed)
                .map_err(anyhow::Error::from)?;

            let vulnerability = &self.vulnerability;
            let cost_type = self.cost_type.as_str();
            let rows = ctx
                .tasks
                .starmap(&inputs, "event-based-risk", move |input| {
                    let mut out = Vec::new();
                    for asset in &input.assets {
                        let vf = *vulnerability
                            .get(&asset.taxonomy)
                            .ok_or_else(|| anyhow::anyhow!("no vulnerability function for taxonomy '{}'", asset.taxonomy))?;
                        out.extend(compute_event_losses(input, vf, cost_type).into_iter().filter(|r| r.asset_id == asset.asset_id));
                    }
                    Ok(out)
                })?
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();

            for row in &rows {
                ctx.attrs.store().append(
                    "event_loss_table",
                    &(rlz.ordinal.value(), row.event_id.value(), row.asset_id.clone(), row.loss, row.insured_loss),
                )?;
            }

            for (event_id, ground_up, insured) in aggregate_loss_table(&rows) {
                ctx.attrs
                    .store()
                    .append("agg_loss_table", &(rlz.ordinal.value(), event_id.value(), ground_up, insured))?;
            }

            let totals = total_loss_by_asset(&rows);
            for (asset_id, total) in totals {
                ctx.attrs.store().append("avg_losses", &(rlz.ordinal.value(), asset_id.clone(), total * ctx.config.ses_ratio))?;
            }

            if ctx.config.raw.asset_loss_table {
                let investigation_years = ctx.config.raw.investigation_time.unwrap_or(1.0);
                for asset in assetcol.assets() {
                    let curve = empirical_loss_curve(&rows, &asset.asset_id, investigation_years);
                    let key = format!("rcurves-rlzs/rlz-{:04}", rlz.ordinal.value());
                    ctx.attrs.store().append(&key, &(asset.asset_id.clone(), curve))?;
                }
            }
        }

        Ok(())
    }

    fn post_execute(&mut self, _ctx: &mut CalcContext, _result: Self::ExecOutput) -> CalcResult<()> {
        Ok(())
    }
}
