//! Scenario: ground-motion fields for a fixed, small set of deterministic
//! ruptures sampled `num_realizations` times, with no probability of
//! exceedance computed (§4.5 Scenario). `ScenarioDamageCalculator` and
//! `ScenarioRiskCalculator` run as dependents chained onto a finished
//! `ScenarioCalculator` store through `run_chained`, exactly like the
//! classical and event-based risk calculators chain onto their hazard
//! pre-calculators.

use crate::error::{CalcError, CalcResult};
use crate::lifecycle::{CalcContext, Calculator};
use oq_core::{Asset, EBRupture, GmfCollection, GmfRecord, Imt, RiskInput, Rupture, SiteId};
use oq_hazard::event_based::generate_gmfs;
use oq_hazard::gsim::GroundMotionModel;
use oq_risk::event_based_risk::{compute_event_losses, EventLossRow};
use oq_risk::riskinput::build_event_based_inputs;
use oq_risk::scenario_damage::{compute_scenario_damage, ScenarioDamageResult};
use oq_risk::scenario_risk::{compute_scenario_risk, ScenarioRiskResult};
use oq_risk::vulnerability::{ConsequenceFunction, FragilityFunction, VulnerabilityFunction};
use std::collections::HashMap;

const GMF_KEY: &str = "gmf_data/1";

/// Scenario hazard: draws `num_realizations` independent ground-motion
/// fields from a fixed rupture set, each realization seeded from
/// `seed + realization_index` so a rerun with the same inputs reproduces
/// byte-identical `gmf_data/1` rows. One task per realization, event ids
/// assigned densely as `realization * ruptures.len() + rupture_index` so
/// dense ids never collide across parallel tasks.
pub struct ScenarioCalculator<'a> {
    ruptures: Vec<Rupture>,
    gmm: &'a dyn GroundMotionModel,
    site_ids: Vec<SiteId>,
    imt: Imt,
    num_realizations: u32,
    seed: u64,
}

impl<'a> ScenarioCalculator<'a> {
    pub fn new(ruptures: Vec<Rupture>, gmm: &'a dyn GroundMotionModel, site_ids: Vec<SiteId>, imt: Imt, num_realizations: u32, seed: u64) -> Self {
        Self { ruptures, gmm, site_ids, imt, num_realizations, seed }
    }
}

impl<'a> Calculator for ScenarioCalculator<'a> {
    type ExecOutput = GmfCollection;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let realizations: Vec<u32> = (0..self.num_realizations).collect();
        let ruptures = &self.ruptures;
        let gmm = self.gmm;
        let site_ids = &self.site_ids;
        let imt = self.imt;
        let seed = self.seed;
        let n_ruptures = ruptures.len() as u64;

        let per_realization = ctx.tasks.starmap(&realizations, "scenario-gmf", move |&realization| {
            let events: Vec<EBRupture> = ruptures
                .iter()
                .enumerate()
                .map(|(i, rup)| {
                    let rup_seed = seed.wrapping_add(realization as u64).wrapping_add(rup.serial as u64);
                    let event_id = realization as u64 * n_ruptures + i as u64;
                    EBRupture::new(rup.clone(), event_id, rup_seed, seed, 1)
                })
                .collect();
            Ok(generate_gmfs(&events, gmm, site_ids, imt))
        })?;

        let mut out = GmfCollection::new();
        for gmfs in per_realization {
            out.extend(gmfs);
        }
        Ok(out)
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        ctx.attrs.store().create_extendable(GMF_KEY);
        for record in result.records() {
            ctx.attrs.store().append(GMF_KEY, record)?;
        }
        let mut perf = ctx.attrs.performance().unwrap_or_default();
        perf.insert("num_gmfs".to_string(), self.num_realizations as f64);
        ctx.attrs.set_performance(&perf)?;
        Ok(())
    }
}

fn read_scenario_gmfs(ctx: &CalcContext) -> CalcResult<GmfCollection> {
    let records: Vec<GmfRecord> = ctx.attrs.store().read_extendable(GMF_KEY)?;
    let mut gmfs = GmfCollection::new();
    for record in records {
        gmfs.push(record);
    }
    Ok(gmfs)
}

/// Splits a GMF-carrying [`RiskInput`] into one sub-input per taxonomy
/// present at its site, since every pure scenario-damage/risk function
/// takes a single fragility/vulnerability function for the whole input.
/// Mirrors how `ClassicalDamageCalculator`/`ClassicalRiskCalculator`
/// select a function per asset, just batched by taxonomy instead of
/// looping asset-by-asset.
fn split_by_taxonomy(input: &RiskInput) -> Vec<(String, RiskInput)> {
    let mut by_taxon: HashMap<String, Vec<Asset>> = HashMap::new();
    for asset in &input.assets {
        by_taxon.entry(asset.taxonomy.clone()).or_default().push(asset.clone());
    }
    by_taxon
        .into_iter()
        .map(|(taxonomy, assets)| {
            (
                taxonomy,
                RiskInput { site_id: input.site_id, hazard: input.hazard.clone(), assets, epsilons: input.epsilons.clone() },
            )
        })
        .collect()
}

/// Scenario damage: averages each asset's fragility-derived damage-state
/// distribution over the scenario's ground-motion field realizations,
/// then aggregates expected damaged-unit counts (`probability *
/// asset.number`) up to per-taxonomy and total distributions. Optionally
/// converts those counts into a monetary consequence distribution via
/// `count * consequence.loss_ratio_for_state(state) * asset.value`. Runs
/// as a dependent chained onto a finished `ScenarioCalculator` store.
pub struct ScenarioDamageCalculator<'a> {
    fragility: HashMap<String, &'a dyn FragilityFunction>,
    consequence: HashMap<String, &'a dyn ConsequenceFunction>,
    cost_type: String,
    imt: Imt,
    dmg_by_asset: Vec<(String, Vec<f64>)>,
}

impl<'a> ScenarioDamageCalculator<'a> {
    pub fn new(
        fragility: HashMap<String, &'a dyn FragilityFunction>,
        consequence: HashMap<String, &'a dyn ConsequenceFunction>,
        cost_type: impl Into<String>,
        imt: Imt,
    ) -> Self {
        Self { fragility, consequence, cost_type: cost_type.into(), imt, dmg_by_asset: Vec::new() }
    }

    pub fn dmg_by_asset(&self) -> &[(String, Vec<f64>)] {
        &self.dmg_by_asset
    }
}

impl<'a> Calculator for ScenarioDamageCalculator<'a> {
    type ExecOutput = Vec<ScenarioDamageResult>;

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let gmfs = read_scenario_gmfs(ctx)?;
        let assetcol = ctx.attrs.assetcol()?;
        let inputs = build_event_based_inputs(&assetcol, &gmfs, self.imt, None, 0).map_err(anyhow::Error::from)?;

        let fragility = &self.fragility;
        let per_input = ctx.tasks.starmap(&inputs, "scenario-damage", move |input| {
            let mut out = Vec::new();
            for (taxonomy, sub_input) in split_by_taxonomy(input) {
                let ff = *fragility
                    .get(&taxonomy)
                    .ok_or_else(|| anyhow::anyhow!("no fragility function for taxonomy '{taxonomy}'"))?;
                out.extend(compute_scenario_damage(&sub_input, ff));
            }
            Ok(out)
        })?;

        Ok(per_input.into_iter().flatten().collect())
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        let assetcol = ctx.attrs.assetcol()?;
        let mut by_id: HashMap<&str, &Asset> = HashMap::new();
        for asset in assetcol.assets() {
            by_id.insert(asset.asset_id.as_str(), asset);
        }

        ctx.attrs.store().create_extendable("dmg_by_asset");
        ctx.attrs.store().create_extendable("csq_total");

        let mut dmg_by_taxon: HashMap<String, Vec<f64>> = HashMap::new();
        let mut dmg_total: Vec<f64> = Vec::new();
        let mut dmg_by_asset = Vec::with_capacity(result.len());

        for r in &result {
            let asset = match by_id.get(r.asset_id.as_str()) {
                Some(asset) => *asset,
                None => continue,
            };
            let counts: Vec<f64> = r.mean_probabilities.iter().map(|p| p * asset.number).collect();
            ctx.attrs.store().append("dmg_by_asset", &(r.asset_id.clone(), counts.clone()))?;

            let taxon_entry = dmg_by_taxon.entry(asset.taxonomy.clone()).or_insert_with(|| vec![0.0; counts.len()]);
            if taxon_entry.len() < counts.len() {
                taxon_entry.resize(counts.len(), 0.0);
            }
            for (i, c) in counts.iter().enumerate() {
                taxon_entry[i] += c;
            }

            if dmg_total.len() < counts.len() {
                dmg_total.resize(counts.len(), 0.0);
            }
            for (i, c) in counts.iter().enumerate() {
                dmg_total[i] += c;
            }

            if let Some(consequence) = self.consequence.get(&asset.taxonomy) {
                let value = asset.value(&self.cost_type);
                let total: f64 = counts.iter().enumerate().map(|(state, c)| c * consequence.loss_ratio_for_state(state) * value).sum();
                ctx.attrs.store().append("csq_total", &(r.asset_id.clone(), total))?;
            }

            dmg_by_asset.push((r.asset_id.clone(), counts));
        }

        ctx.attrs.store().set("dmg_by_taxon", &dmg_by_taxon)?;
        ctx.attrs.store().set("dmg_total", &dmg_total)?;
        self.dmg_by_asset = dmg_by_asset;
        Ok(())
    }
}

/// Scenario risk: mean and standard deviation of loss per asset across the
/// scenario's ground-motion field realizations, plus the mean and
/// standard deviation of the *total* loss summed across every asset per
/// realization (the `(b)` half of §4.6's "mean and stddev of total loss
/// per realization" contract — the per-asset half comes straight from
/// [`compute_scenario_risk`]). Runs as a dependent chained onto a
/// finished `ScenarioCalculator` store.
pub struct ScenarioRiskCalculator<'a> {
    vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>,
    cost_type: String,
    imt: Imt,
    per_asset: Vec<ScenarioRiskResult>,
    total: Option<(f64, f64, usize)>,
}

impl<'a> ScenarioRiskCalculator<'a> {
    pub fn new(vulnerability: HashMap<String, &'a dyn VulnerabilityFunction>, cost_type: impl Into<String>, imt: Imt) -> Self {
        Self { vulnerability, cost_type: cost_type.into(), imt, per_asset: Vec::new(), total: None }
    }

    pub fn per_asset(&self) -> &[ScenarioRiskResult] {
        &self.per_asset
    }

    /// `(mean, stddev, num_realizations)` of total loss summed across
    /// every asset per ground-motion field realization, or `None` if no
    /// realization produced any loss row.
    pub fn total(&self) -> Option<(f64, f64, usize)> {
        self.total
    }
}

impl<'a> Calculator for ScenarioRiskCalculator<'a> {
    type ExecOutput = (Vec<ScenarioRiskResult>, Vec<EventLossRow>);

    fn pre_execute(&mut self, _ctx: &mut CalcContext) -> CalcResult<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &CalcContext) -> CalcResult<Self::ExecOutput> {
        let gmfs = read_scenario_gmfs(ctx)?;
        let assetcol = ctx.attrs.assetcol()?;
        let inputs = build_event_based_inputs(&assetcol, &gmfs, self.imt, None, 0).map_err(anyhow::Error::from)?;

        let vulnerability = &self.vulnerability;
        let cost_type = self.cost_type.as_str();

        let per_input = ctx.tasks.starmap(&inputs, "scenario-risk", move |input| {
            let mut results = Vec::new();
            let mut rows = Vec::new();
            for (taxonomy, sub_input) in split_by_taxonomy(input) {
                let vf = *vulnerability
                    .get(&taxonomy)
                    .ok_or_else(|| anyhow::anyhow!("no vulnerability function for taxonomy '{taxonomy}'"))?;
                results.extend(compute_scenario_risk(&sub_input, vf, cost_type));
                rows.extend(compute_event_losses(&sub_input, vf, cost_type));
            }
            Ok((results, rows))
        })?;

        let mut per_asset = Vec::new();
        let mut all_rows = Vec::new();
        for (results, rows) in per_input {
            per_asset.extend(results);
            all_rows.extend(rows);
        }
        Ok((per_asset, all_rows))
    }

    fn post_execute(&mut self, ctx: &mut CalcContext, result: Self::ExecOutput) -> CalcResult<()> {
        let (per_asset, rows) = result;

        ctx.attrs.store().create_extendable("scenario_risk");
        for r in &per_asset {
            ctx.attrs.store().append("scenario_risk", &(r.asset_id.clone(), r.mean_loss, r.stddev_loss))?;
        }

        let mut totals: HashMap<u64, f64> = HashMap::new();
        for row in &rows {
            *totals.entry(row.event_id.value()).or_insert(0.0) += row.loss;
        }
        let values: Vec<f64> = totals.into_values().collect();
        if !values.is_empty() {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let stddev = variance.sqrt();
            ctx.attrs.store().set("scenario_risk_total", &(mean, stddev, values.len()))?;
            self.total = Some((mean, stddev, values.len()));
        }

        self.per_asset = per_asset;
        Ok(())
    }
}
