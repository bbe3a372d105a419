//! Event-based risk: per-event, per-asset losses sampled from GMFs and
//! correlated epsilons, aggregated into average annual losses and an
//! empirical loss-exceedance curve.

use crate::vulnerability::VulnerabilityFunction;
use oq_core::{insured_loss, EventId, Hazard, RiskInput};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EventLossRow {
    pub event_id: EventId,
    pub asset_id: String,
    pub loss: f64,
    /// Ground-up loss after the asset's deductible/limit, never greater
    /// than `loss`. Equal to `loss` for an asset with no deductible and no
    /// limit.
    pub insured_loss: f64,
}

/// Computes one loss row per `(event, asset)` a [`RiskInput`] carries
/// GMFs for. The loss ratio is the vulnerability function's mean at that
/// event's ground-motion value, perturbed by the asset's correlated
/// epsilon scaled by the function's coefficient of variation when
/// epsilons were sampled, otherwise left at the mean.
pub fn compute_event_losses(input: &RiskInput, vf: &dyn VulnerabilityFunction, cost_type: &str) -> Vec<EventLossRow> {
    let records = match &input.hazard {
        Hazard::Gmfs(records) => records,
        Hazard::Curve(_) => return Vec::new(),
    };

    let mut rows = Vec::with_capacity(records.len() * input.assets.len());
    for record in records {
        let (mean_ratio, cov) = vf.loss_ratio(record.gmv);
        let epsilons = input.epsilons.get(&(record.event_id.value() as u32));
        for (i, asset) in input.assets.iter().enumerate() {
            let epsilon = epsilons.and_then(|e| e.get(i)).copied().unwrap_or(0.0);
            let loss_ratio = (mean_ratio + epsilon * cov * mean_ratio).clamp(0.0, 1.0);
            let loss = loss_ratio * asset.value(cost_type);
            rows.push(EventLossRow {
                event_id: record.event_id,
                asset_id: asset.asset_id.clone(),
                loss,
                insured_loss: insured_loss(loss, asset.deductible(cost_type), asset.limit(cost_type)),
            });
        }
    }
    rows
}

/// Aggregates ground-up and insured losses per event across every asset,
/// the table [`compute_event_losses`] rows feed an `agg_loss_table` export
/// from: column 0 is the ground-up total, column 1 the insured total, and
/// the insured column never exceeds the ground-up one since each row's
/// `insured_loss` already satisfies that per asset.
pub fn aggregate_loss_table(rows: &[EventLossRow]) -> Vec<(EventId, f64, f64)> {
    let mut totals: HashMap<EventId, (f64, f64)> = HashMap::new();
    for row in rows {
        let entry = totals.entry(row.event_id).or_insert((0.0, 0.0));
        entry.0 += row.loss;
        entry.1 += row.insured_loss;
    }
    let mut out: Vec<(EventId, f64, f64)> = totals.into_iter().map(|(id, (loss, insured))| (id, loss, insured)).collect();
    out.sort_by_key(|(id, _, _)| id.value());
    out
}

/// Sums losses per asset across all events, the undiscounted total that
/// [`average_annual_loss`] divides by the investigation time.
pub fn total_loss_by_asset(rows: &[EventLossRow]) -> HashMap<String, f64> {
    let mut out: HashMap<String, f64> = HashMap::new();
    for row in rows {
        *out.entry(row.asset_id.clone()).or_insert(0.0) += row.loss;
    }
    out
}

/// Average annual loss per asset: total loss across the stochastic event
/// set divided by the investigation time the event set spans.
pub fn average_annual_loss(rows: &[EventLossRow], investigation_time_years: f64) -> HashMap<String, f64> {
    total_loss_by_asset(rows)
        .into_iter()
        .map(|(asset_id, total)| (asset_id, total / investigation_time_years))
        .collect()
}

/// Empirical loss-exceedance curve for one asset: losses sorted
/// descending, paired with the annual exceedance frequency `rank /
/// investigation_time_years` (the standard event-based-PSHA empirical
/// estimator, not a parametric fit).
pub fn empirical_loss_curve(rows: &[EventLossRow], asset_id: &str, investigation_time_years: f64) -> Vec<(f64, f64)> {
    let mut losses: Vec<f64> = rows.iter().filter(|r| r.asset_id == asset_id).map(|r| r.loss).collect();
    losses.sort_by(|a, b| b.partial_cmp(a).unwrap());
    losses
        .into_iter()
        .enumerate()
        .map(|(i, loss)| (loss, (i + 1) as f64 / investigation_time_years))
        .collect()
}
