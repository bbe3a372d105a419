//! Classical PSHA: curve per `(trt, gsim)` group, combined into one curve
//! per logic-tree realization, then averaged into a mean hazard curve.
//! `ClassicalRiskCalculator`/`ClassicalDamageCalculator`/
//! `ClassicalBcrCalculator` run as dependents chained onto a finished
//! `ClassicalCalculator` store through `run_chained`, convolving the mean
//! curve against vulnerability/fragility functions per taxonomy.

use crate::error::{CalcError, CalcResult};
use crate::lifecycle::{CalcContext, Calculator};
use oq_core::rupture_source::RuptureSource;
use oq_core::{Curve, Imt, PoE, ProbabilityMap, RlzOrdinal, Rupture, SiteId, SourceSkeleton, TrtId};
use oq_hazard::classical::compute_curve;
use oq_hazard::gsim::GroundMotionModel;
use oq_hazard::hazard_maps::compute_hazard_maps;
use oq_logictree::{CompositionInfo, RlzsAssoc};
use oq_risk::classical_bcr::{compute_bcr, BcrResult};
use oq_risk::classical_damage::{compute_damage_distribution, DamageDistribution};
use oq_risk::classical_risk::{classical_risk_for_asset, ClassicalRiskResult};
use oq_risk::riskinput::{build_classical_inputs, expect_curve};
use oq_risk::vulnerability::{FragilityFunction, VulnerabilityFunction};
use oq_source::{CompositeSourceModel, SiteTile, SourceManager, SourceSplitter};
use std::collections::HashMap;

/// Classical hazard: filters and splits sources per tectonic region type,
/// builds the logic-tree realization association, then computes one curve
/// per `(trt, gsim)` work item and combines/averages them into a mean
/// hazard curve.
pub struct ClassicalCalculator<'a> {
    composite: CompositeSourceModel,
    composition: CompositionInfo,
    rupture_source: &'a dyn RuptureSource,
    gmms: HashMap<String, &'a dyn GroundMotionModel>,
    site_ids: Vec<SiteId>,
    imt: Imt,
    imls: Vec<f64>,
    site_tile: &'a dyn SiteTile,
    splitter: &'a dyn SourceSplitter,
    num_tiles: usize,

    manager: SourceManager,
    filtered_sources: HashMap<TrtId, Vec<SourceSkeleton>>,
    rlzs_assoc: Option<RlzsAssoc>,
}

impl<'a> ClassicalCalculator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        composite: CompositeSourceModel,
        composition: CompositionInfo,
        rupture_source: &'a dyn RuptureSource,
        gmms: HashMap<String, &'a dyn GroundMotionModel>,
        site_ids: Vec<SiteId>,
        imt: Imt,
        imls: Vec<f64>,
        site_tile: &'a dyn SiteTile,
        splitter: &'a dyn SourceSplitter,
        run_seed: u64,
        num_tiles: usize,
    ) -> Self {
        let probe = SourceManager::new(run_seed, composite.maxweight);
        let maxweight = probe.effective_maxweight(num_tiles);
        Self {
            composite,
            composition,
            rupture_source,
            gmms,
            site_ids,
            imt,
            imls,
            site_tile,
            splitter,
            num_tiles,
            manager: SourceManager::new(run_seed, maxweight),
            filtered_sources: HashMap::new(),
            rlzs_assoc: None,
        }
    }

    pub fn rlzs_assoc(&self) -> Option<&RlzsAssoc> {
        self.rlzs_assoc.as_ref()
    }
}

impl<'a> Calculator for ClassicalCalculator<'a> {
    type ExecOutput = HashMap<(TrtId, String), ProbabilityMap>;

    fn pre_execute(&mut self, ctx: &mut CalcContext) -> CalcResult<()> {
        self.filtered_sources.clear();
        ctx.attrs.store().create_extendable(oq_store::layout::SOURCE_INFO);

        // True (undivided) eff_ruptures per (source model, trt model) feeds
        // the realization weights; num_tiles only scales the reported stat.
        let mut eff_by_key: HashMap<(u32, TrtId), u32> = HashMap::new();

        for sm in &self.composite.source_models {
            for tm in &sm.trt_models {
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
        self.rlzs_assoc = Some(rlzs_assoc);
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let rlzs_assoc = self
            .rlzs_assoc
            .as_ref()
            .ok_or_else(|| CalcError::Other(anyhow::anyhow!("pre_execute must run before execute")))?;

        let mut work_items: Vec<(TrtId, String)> = Vec::new();
        for trt_id in self.filtered_sources.keys() {
            for gsim in rlzs_assoc.gsims_by_trt_id(*trt_id) {
                work_items.push((*trt_id, gsim.clone()));
            }
        }

        let filtered_sources = &self.filtered_sources;
        let rupture_source = self.rupture_source;
        let manager = &self.manager;
        let gmms = &self.gmms;
        let site_ids = &self.site_ids;
        let imt = self.imt;
        let imls = &self.imls;

        let results = ctx.tasks.starmap(&work_items, "classical-curve", move |(trt_id, gsim)| {
            let sources = filtered_sources
                .get(trt_id)
                .ok_or_else(|| anyhow::anyhow!("no filtered sources for trt {trt_id}"))?;
            let mut ruptures: Vec<Rupture> = Vec::new();
            for source in sources {
                let range = manager.serial_range(&source.id).cloned().unwrap_or(0..source.num_ruptures);
                ruptures.extend(rupture_source.ruptures_for(source, *trt_id, range));
            }
            let gmm = *gmms
                .get(gsim)
                .ok_or_else(|| anyhow::anyhow!("no ground motion model registered for gsim '{gsim}'"))?;
            let mut map = ProbabilityMap::new();
            for &site_id in site_ids.iter() {
                let curve = compute_curve(&ruptures, gmm, site_id, imt, imls)?;
                map.set(site_id, imt, curve);
            }
            Ok(map)
        })?;

        Ok(work_items.into_iter().zip(results).collect())
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        let rlzs_assoc = self
            .rlzs_assoc
            .as_ref()
            .ok_or_else(|| CalcError::Other(anyhow::anyhow!("pre_execute must run before post_execute")))?;

        let per_rlz = rlzs_assoc.combine_curves(&result);
        let weights: HashMap<RlzOrdinal, f64> =
            rlzs_assoc.realizations().iter().map(|r| (r.ordinal, r.weight.value())).collect();
        let mean = mean_curve(&per_rlz, &weights);
        ctx.attrs.set_hazard_curves(&mean)?;

        if ctx.config.raw.individual_curves {
            for (ordinal, map) in &per_rlz {
                let key = format!("hcurves/rlz-{:03}", ordinal.value());
                ctx.attrs.store().set(&key, map)?;
            }
        }

        if ctx.config.raw.hazard_maps && !ctx.config.raw.poes.is_empty() {
            let mut maps: Vec<(SiteId, Imt, Vec<f64>)> = Vec::new();
            for &(site_id, imt) in mean.keys() {
                if let Some(curve) = mean.get(site_id, imt) {
                    maps.push((site_id, imt, compute_hazard_maps(curve, &ctx.config.raw.poes)));
                }
            }
            ctx.attrs.store().set("hazard_maps", &maps)?;
        }

        if !ctx.config.raw.quantile_hazard_curves.is_empty() {
            // Realization weights feed the quantile the same way they feed
            // the mean, except under sampling: a sampled logic tree already
            // draws branches with probability proportional to weight, so
            // the statistics there are unweighted (each drawn path counts
            // once).
            let quantile_weights: HashMap<RlzOrdinal, f64> = if ctx.config.sampling {
                rlzs_assoc.realizations().iter().map(|r| (r.ordinal, 1.0)).collect()
            } else {
                weights.clone()
            };
            let mut quantiles: Vec<(f64, ProbabilityMap)> = Vec::new();
            for &q in &ctx.config.raw.quantile_hazard_curves {
                quantiles.push((q, quantile_curve(&per_rlz, &quantile_weights, q)));
            }
            ctx.attrs.store().set("hcurves-stats/quantiles", &quantiles)?;
        }

        Ok(())
    }
}

/// Weighted average of hazard curves across logic-tree realizations.
/// Distinct from [`RlzsAssoc::combine_curves`]'s OR-aggregation, which
/// combines independent `(trt, gsim)` contributions into one realization's
/// curve and has no business averaging across epistemic realizations.
fn mean_curve(per_rlz: &HashMap<RlzOrdinal, ProbabilityMap>, weights: &HashMap<RlzOrdinal, f64>) -> ProbabilityMap {
    let mut keys: Vec<(SiteId, Imt)> = Vec::new();
    for map in per_rlz.values() {
        for key in map.keys() {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }

    let mut mean = ProbabilityMap::new();
    for (site_id, imt) in keys {
        let mut contributors: Vec<(f64, &Curve)> = Vec::new();
        for (ordinal, map) in per_rlz {
            if let Some(curve) = map.get(site_id, imt) {
                let weight = weights.get(ordinal).copied().unwrap_or(0.0);
                contributors.push((weight, curve));
            }
        }
        if contributors.is_empty() {
            continue;
        }
        let weight_sum: f64 = contributors.iter().map(|(w, _)| w).sum();
        let norm = if weight_sum > 0.0 { weight_sum } else { 1.0 };
        let n_points = contributors[0].1.points().len();
        let imls: Vec<f64> = contributors[0].1.points().iter().map(|(iml, _)| *iml).collect();
        let mut poes = vec![0.0; n_points];
        for (weight, curve) in &contributors {
            for (i, (_, poe)) in curve.points().iter().enumerate() {
                if i < poes.len() {
                    poes[i] += weight * poe.value();
                }
            }
        }
        let points: Vec<(f64, PoE)> = imls.into_iter().zip(poes.into_iter().map(|p| PoE::new(p / norm))).collect();
        mean.set(site_id, imt, Curve::from_points(points));
    }
    mean
}

/// Weighted q-quantile curve across logic-tree realizations: same
/// site/imt enumeration as [`mean_curve`], but each point takes the
/// weighted quantile of the realizations' PoE values instead of their
/// weighted average.
fn quantile_curve(per_rlz: &HashMap<RlzOrdinal, ProbabilityMap>, weights: &HashMap<RlzOrdinal, f64>, quantile: f64) -> ProbabilityMap {
    let mut keys: Vec<(SiteId, Imt)> = Vec::new();
    for map in per_rlz.values() {
        for key in map.keys() {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }

    let mut out = ProbabilityMap::new();
    for (site_id, imt) in keys {
        let mut contributors: Vec<(f64, &Curve)> = Vec::new();
        for (ordinal, map) in per_rlz {
            if let Some(curve) = map.get(site_id, imt) {
                let weight = weights.get(ordinal).copied().unwrap_or(0.0);
                contributors.push((weight, curve));
            }
        }
        if contributors.is_empty() {
            continue;
        }
        let n_points = contributors[0].1.points().len();
        let imls: Vec<f64> = contributors[0].1.points().iter().map(|(iml, _)| *iml).collect();
        let mut poes = Vec::with_capacity(n_points);
        for i in 0..n_points {
            let mut values: Vec<(f64, f64)> = contributors.iter().map(|(w, c)| (c.points()[i].1.value(), *w)).collect();
            poes.push(weighted_quantile(&mut values, quantile));
        }
        let points: Vec<(f64, PoE)> = imls.into_iter().zip(poes.into_iter().map(PoE::new)).collect();
        out.set(site_id, imt, Curve::from_points(points));
    }
    out
}

/// Weighted quantile of `(value, weight)` pairs: sorts by value and
/// linearly interpolates across cumulative weight, the weighted
/// generalization of the usual linear-interpolation quantile.
fn weighted_quantile(values: &mut [(f64, f64)], quantile: f64) -> f64 {
    values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let total_weight: f64 = values.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return values.last().map(|(v, _)| *v).unwrap_or(0.0);
    }
    let target = quantile * total_weight;
    let mut cum = 0.0;
    for i in 0..values.len() {
        let (value, weight) = values[i];
        let prev_cum = cum;
        cum += weight;
        if target <= cum {
            if i == 0 {
                return value;
            }
            let prev_value = values[i - 1].0;
            let frac = if cum > prev_cum { (target - prev_cum) / (cum - prev_cum) } else { 0.0 };
            return prev_value + frac * (value - prev_value);
        }
    }
    values.last().map(|(v, _)| *v).unwrap_or(0.0)
}

/// Classical risk: loss curves and average losses per asset, convolving
/// the mean hazard curve against each asset's taxonomy vulnerability
/// function. Runs as a dependent chained onto a finished
/// `ClassicalCalculator` store.
pub struct ClassicalRiskCalculator<'a> {
    vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>,
    cost_type: String,
    imt: Imt,
    results: Vec<ClassicalRiskResult>,
}

impl<'a> ClassicalRiskCalculator<'a> {
    pub fn new(vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>, cost_type: impl Into<String>, imt: Imt) -> Self {
        Self { vulnerability, cost_type: cost_type.into(), imt, results: Vec::new() }
    }

    pub fn results(&self) -> &[ClassicalRiskResult] {
        &self.results
    }
}

impl<'a> Calculator for ClassicalRiskCalculator<'a> {
    type ExecOutput = Vec<ClassicalRiskResult>;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let curves = ctx.attrs.hazard_curves()?;
        let assetcol = ctx.attrs.assetcol()?;
        let inputs = build_classical_inputs(&assetcol, &curves, self.imt);

        let vulnerability = &self.vulnerability;
        let cost_type = self.cost_type.as_str();

        let per_input = ctx.tasks.starmap(&inputs, "classical-risk", move |input| {
            let curve = expect_curve(input)?;
            let mut out = Vec::with_capacity(input.assets.len());
            for asset in &input.assets {
                let vf = *vulnerability
                    .get(&asset.taxonomy)
                    .ok_or_else(|| anyhow::anyhow!("no vulnerability function for taxonomy '{}'", asset.taxonomy))?;
                out.push(classical_risk_for_asset(asset, curve, vf, cost_type));
            }
            Ok(out)
        })?;

        Ok(per_input.into_iter().flatten().collect())
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        ctx.attrs.store().create_extendable("loss_curves");
        for r in &result {
            ctx.attrs
                .store()
                .append("loss_curves", &(r.asset_id.clone(), r.loss_curve.clone(), r.average_loss_ratio, r.average_loss))?;
        }
        self.results = result;
        Ok(())
    }
}

/// Classical damage: probability mass per damage state per asset, via the
/// taxonomy fragility function. Rejects any site whose mean hazard curve
/// reaches PoE 1.0 — the convolution integral is undefined at certainty,
/// so the calculation fails loudly rather than silently reporting total
/// collapse.
pub struct ClassicalDamageCalculator<'a> {
    fragility: HashMap<String, &'a dyn FragilityFunction>,
    imt: Imt,
    results: Vec<DamageDistribution>,
}

impl<'a> ClassicalDamageCalculator<'a> {
    pub fn new(fragility: HashMap<String, &'a dyn FragilityFunction>, imt: Imt) -> Self {
        Self { fragility, imt, results: Vec::new() }
    }

    pub fn results(&self) -> &[DamageDistribution] {
        &self.results
    }
}

impl<'a> Calculator for ClassicalDamageCalculator<'a> {
    type ExecOutput = Vec<DamageDistribution>;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let curves = ctx.attrs.hazard_curves()?;
        let assetcol = ctx.attrs.assetcol()?;
        let inputs = build_classical_inputs(&assetcol, &curves, self.imt);

        let fragility = &self.fragility;

        let per_input = ctx.tasks.starmap(&inputs, "classical-damage", move |input| {
            let curve = expect_curve(input)?;
            if curve.points().iter().any(|(_, poe)| poe.value() >= 1.0) {
                anyhow::bail!(
                    "hazard curve at site {} reaches PoE 1.0; damage distribution is undefined at certainty",
                    input.site_id
                );
            }
            let mut out = Vec::with_capacity(input.assets.len());
            for asset in &input.assets {
                let ff = *fragility
                    .get(&asset.taxonomy)
                    .ok_or_else(|| anyhow::anyhow!("no fragility function for taxonomy '{}'", asset.taxonomy))?;
                out.push(compute_damage_distribution(&asset.asset_id, curve, ff));
            }
            Ok(out)
        })?;

        Ok(per_input.into_iter().flatten().collect())
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        ctx.attrs.store().create_extendable("damage_distributions");
        for d in &result {
            ctx.attrs.store().append("damage_distributions", &(d.asset_id.clone(), d.probabilities.clone()))?;
        }
        self.results = result;
        Ok(())
    }
}

/// Classical benefit-cost ratio: weighs the expected annual loss reduction
/// a retrofit buys against its cost, per asset.
pub struct ClassicalBcrCalculator<'a> {
    original: HashMap<String, &'a dyn VulnerabilityFunction>,
    retrofitted: HashMap<String, &'a dyn VulnerabilityFunction>,
    cost_type: String,
    imt: Imt,
    retrofit_cost: HashMap<String, f64>,
    interest_rate: f64,
    asset_life_expectancy: f64,
    results: Vec<BcrResult>,
}

impl<'a> ClassicalBcrCalculator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        original: HashMap<String, &'a dyn VulnerabilityFunction>,
        retrofitted: HashMap<String, &'a dyn VulnerabilityFunction>,
        cost_type: impl Into<String>,
        imt: Imt,
        retrofit_cost: HashMap<String, f64>,
        interest_rate: f64,
        asset_life_expectancy: f64,
    ) -> Self {
        Self {
            original,
            retrofitted,
            cost_type: cost_type.into(),
            imt,
            retrofit_cost,
            interest_rate,
            asset_life_expectancy,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[BcrResult] {
        &self.results
    }
}

impl<'a> Calculator for ClassicalBcrCalculator<'a> {
    type ExecOutput = Vec<BcrResult>;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let curves = ctx.attrs.hazard_curves()?;
        let assetcol = ctx.attrs.assetcol()?;
        let inputs = build_classical_inputs(&assetcol, &curves, self.imt);

        let original = &self.original;
        let retrofitted = &self.retrofitted;
        let cost_type = self.cost_type.as_str();
        let retrofit_cost = &self.retrofit_cost;
        let interest_rate = self.interest_rate;
        let asset_life_expectancy = self.asset_life_expectancy;

        let per_input = ctx.tasks.starmap(&inputs, "classical-bcr", move |input| {
            let curve = expect_curve(input)?;
            let mut out = Vec::with_capacity(input.assets.len());
            for asset in &input.assets {
                let original_vf = *original
                    .get(&asset.taxonomy)
                    .ok_or_else(|| anyhow::anyhow!("no original vulnerability function for taxonomy '{}'", asset.taxonomy))?;
                let retrofitted_vf = *retrofitted.get(&asset.taxonomy).ok_or_else(|| {
                    anyhow::anyhow!("no retrofitted vulnerability function for taxonomy '{}'", asset.taxonomy)
                })?;
                let cost = retrofit_cost.get(&asset.asset_id).copied().unwrap_or(0.0);
                out.push(compute_bcr(asset, curve, original_vf, retrofitted_vf, cost_type, cost, interest_rate, asset_life_expectancy)?);
            }
            Ok(out)
        })?;

        Ok(per_input.into_iter().flatten().collect())
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        ctx.attrs.store().create_extendable("bcr_results");
        for r in &result {
            ctx.attrs.store().append("bcr_results", &(r.asset_id.clone(), r.eal_original, r.eal_retrofitted, r.bcr))?;
        }
        self.results = result;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, JobConfig, ResolvedJobConfig};
    use oq_core::rupture_source::UniformRuptureSource;
    use oq_core::{SourceModel, TrtModel as CoreTrtModel, Weight};
    use oq_hazard::gsim::ConstantGmm;
    use oq_logictree::GsimLogicTree;
    use oq_source::{AcceptAll, EqualWeightSplitter};
    use oq_store::DataStore;

    fn minimal_config() -> ResolvedJobConfig {
        resolve(JobConfig {
            calculation_mode: "classical".to_string(),
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
            poes: vec![0.1],
            hazard_maps: true,
            individual_curves: true,
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

    fn one_trt_source_model(ordinal: u32, weight: f64) -> SourceModel {
        one_trt_source_model_with_ruptures(ordinal, weight, 4)
    }

    fn one_trt_source_model_with_ruptures(ordinal: u32, weight: f64, num_ruptures: u32) -> SourceModel {
        let mut sm = SourceModel::new(format!("sm{ordinal}"), weight, vec![format!("b{ordinal}")], ordinal);
        let mut tm = CoreTrtModel::new(TrtId(ordinal), "Active Shallow Crust");
        tm.add_source(SourceSkeleton { id: format!("s{ordinal}"), weight: 1.0, num_ruptures }).unwrap();
        sm.trt_models.push(tm);
        sm
    }

    fn gsim_tree_single_branch() -> GsimLogicTree {
        let mut t = GsimLogicTree::new();
        t.add_branch("Active Shallow Crust", "BA2008", Weight::ONE);
        t
    }

    #[test]
    fn single_branch_classical_curve_equals_the_mean_curve() {
        let source_model = one_trt_source_model(0, 1.0);
        let composite = CompositeSourceModel::new(vec![source_model], 100.0);
        let composition = CompositionInfo::new(0, 0, gsim_tree_single_branch());
        let rupture_source = UniformRuptureSource { mag: 6.0 };
        let gmm = ConstantGmm { ln_mean: -1.0, std: 0.5 };
        let mut gmms: HashMap<String, &dyn GroundMotionModel> = HashMap::new();
        gmms.insert("BA2008".to_string(), &gmm);
        let tile = AcceptAll;
        let splitter = EqualWeightSplitter;

        let mut calc = ClassicalCalculator::new(
            composite,
            composition,
            &rupture_source,
            gmms,
            vec![SiteId(1)],
            Imt::Pga,
            vec![0.05, 0.1, 0.2],
            &tile,
            &splitter,
            42,
            1,
        );

        let mut ctx = CalcContext::new(DataStore::new(1), minimal_config()).unwrap();
        crate::lifecycle::run(&mut calc, &mut ctx).unwrap();

        let rlzs_assoc = calc.rlzs_assoc().unwrap();
        assert_eq!(rlzs_assoc.realizations().len(), 1);

        let mean = ctx.attrs.hazard_curves().unwrap();
        let curve = mean.get(SiteId(1), Imt::Pga).unwrap();
        assert_eq!(curve.points().len(), 3);
        for (_, poe) in curve.points() {
            assert!(poe.value() > 0.0 && poe.value() < 1.0);
        }
    }

    #[test]
    fn two_source_models_weight_the_mean_curve_by_realization_weight() {
        let sm_a = one_trt_source_model(0, 0.6);
        let sm_b = one_trt_source_model(1, 0.4);
        let composite = CompositeSourceModel::new(vec![sm_a, sm_b], 100.0);
        let composition = CompositionInfo::new(0, 0, gsim_tree_single_branch());
        let rupture_source = UniformRuptureSource { mag: 6.0 };
        let gmm = ConstantGmm { ln_mean: -1.0, std: 0.5 };
        let mut gmms: HashMap<String, &dyn GroundMotionModel> = HashMap::new();
        gmms.insert("BA2008".to_string(), &gmm);
        let tile = AcceptAll;
        let splitter = EqualWeightSplitter;

        let mut calc = ClassicalCalculator::new(
            composite,
            composition,
            &rupture_source,
            gmms,
            vec![SiteId(1)],
            Imt::Pga,
            vec![0.1],
            &tile,
            &splitter,
            7,
            1,
        );

        let mut ctx = CalcContext::new(DataStore::new(1), minimal_config()).unwrap();
        crate::lifecycle::run(&mut calc, &mut ctx).unwrap();

        let rlzs_assoc = calc.rlzs_assoc().unwrap();
        assert_eq!(rlzs_assoc.realizations().len(), 2);

        let mean = ctx.attrs.hazard_curves().unwrap();
        let mean_poe = mean.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap().value();

        // Both source models contribute identical ruptures/gmm (same mag,
        // weight, count), so each realization's curve is identical and the
        // weighted mean must equal that shared curve exactly.
        let probe_ruptures =
            UniformRuptureSource { mag: 6.0 }.ruptures_for(&SourceSkeleton { id: "probe".into(), weight: 1.0, num_ruptures: 4 }, TrtId(0), 0..4);
        let probe_poe = compute_curve(&probe_ruptures, &gmm, SiteId(1), Imt::Pga, &[0.1]).unwrap().poe_at(0.1).unwrap().value();
        assert!((mean_poe - probe_poe).abs() < 1e-9);
    }

    #[test]
    fn weighted_quantile_interpolates_between_two_equal_weight_points() {
        let mut values = vec![(1.0, 0.5), (3.0, 0.5)];
        assert!((weighted_quantile(&mut values, 0.75) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_quantile_favors_the_heavier_point() {
        let mut values = vec![(1.0, 0.9), (3.0, 0.1)];
        let q = weighted_quantile(&mut values, 0.5);
        assert!(q < 2.0, "median should sit closer to the 0.9-weighted point, got {q}");
    }

    #[test]
    fn quantile_hazard_curves_config_writes_a_curve_between_the_realizations() {
        let sm_a = one_trt_source_model_with_ruptures(0, 0.6, 4);
        let sm_b = one_trt_source_model_with_ruptures(1, 0.4, 8);
        let composite = CompositeSourceModel::new(vec![sm_a, sm_b], 100.0);
        let composition = CompositionInfo::new(0, 0, gsim_tree_single_branch());
        let rupture_source = UniformRuptureSource { mag: 6.0 };
        let gmm = ConstantGmm { ln_mean: -1.0, std: 0.5 };
        let mut gmms: HashMap<String, &dyn GroundMotionModel> = HashMap::new();
        gmms.insert("BA2008".to_string(), &gmm);
        let tile = AcceptAll;
        let splitter = EqualWeightSplitter;

        let mut calc = ClassicalCalculator::new(
            composite,
            composition,
            &rupture_source,
            gmms,
            vec![SiteId(1)],
            Imt::Pga,
            vec![0.1],
            &tile,
            &splitter,
            7,
            1,
        );

        let mut config = minimal_config();
        config.raw.quantile_hazard_curves = vec![0.5];
        config.raw.individual_curves = true;
        let mut ctx = CalcContext::new(DataStore::new(1), config).unwrap();
        crate::lifecycle::run(&mut calc, &mut ctx).unwrap();

        let rlz_a: ProbabilityMap = ctx.attrs.store().get("hcurves/rlz-000").unwrap();
        let rlz_b: ProbabilityMap = ctx.attrs.store().get("hcurves/rlz-001").unwrap();
        let poe_a = rlz_a.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap().value();
        let poe_b = rlz_b.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap().value();
        let lo = poe_a.min(poe_b);
        let hi = poe_a.max(poe_b);
        assert!(hi > lo, "the two realizations should differ for this test to be meaningful");

        let quantiles: Vec<(f64, ProbabilityMap)> = ctx.attrs.store().get("hcurves-stats/quantiles").unwrap();
        assert_eq!(quantiles.len(), 1);
        let (q, curve_map) = &quantiles[0];
        assert_eq!(*q, 0.5);
        let poe = curve_map.get(SiteId(1), Imt::Pga).unwrap().poe_at(0.1).unwrap().value();
        assert!(poe >= lo - 1e-9 && poe <= hi + 1e-9, "quantile {poe} should lie within [{lo}, {hi}]");
    }

    #[test]
    fn num_tiles_scales_the_reported_eff_ruptures_without_changing_realizations() {
        let source_model = one_trt_source_model(0, 1.0);
        let composite = CompositeSourceModel::new(vec![source_model], 100.0);
        let composition = CompositionInfo::new(0, 0, gsim_tree_single_branch());
        let rupture_source = UniformRuptureSource { mag: 6.0 };
        let gmm = ConstantGmm { ln_mean: -1.0, std: 0.5 };
        let mut gmms: HashMap<String, &dyn GroundMotionModel> = HashMap::new();
        gmms.insert("BA2008".to_string(), &gmm);
        let tile = AcceptAll;
        let splitter = EqualWeightSplitter;

        let mut calc = ClassicalCalculator::new(
            composite,
            composition,
            &rupture_source,
            gmms,
            vec![SiteId(1)],
            Imt::Pga,
            vec![0.1],
            &tile,
            &splitter,
            42,
            4,
        );

        let mut ctx = CalcContext::new(DataStore::new(1), minimal_config()).unwrap();
        crate::lifecycle::run(&mut calc, &mut ctx).unwrap();

        let rlzs_assoc = calc.rlzs_assoc().unwrap();
        assert_eq!(rlzs_assoc.realizations().len(), 1);

        let perf = ctx.attrs.performance().unwrap();
        assert!((perf["eff_ruptures"] - 4.0).abs() < 1e-9);
        assert!((perf["eff_ruptures_per_tile"] - 1.0).abs() < 1e-9);
    }
}
