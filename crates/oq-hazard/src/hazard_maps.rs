//! Hazard maps: interpolates the IML at which a curve crosses each of a
//! set of target probabilities of exceedance, in log-log space (the
//! curve is monotonically decreasing in IML, so this interpolation is
//! well posed between the first and last point).
//!
//! Mirrors `classical.py::compute_hazard_maps`: probabilities below
//! `1e-30` are clamped before taking logs (avoids `ln(0)`), and a target
//! PoE at or above the curve's maximum is left-extrapolated to IML 0
//! rather than left undefined — physically, "exceeded with at least this
//! probability" is trivially true at zero ground motion.

use oq_core::Curve;

const POE_CUTOFF: f64 = 1e-30;

/// For each `target_poe`, returns the interpolated IML. `points` must be
/// ordered by ascending IML with non-increasing PoE, the shape every
/// [`Curve`] is built in.
pub fn compute_hazard_maps(curve: &Curve, target_poes: &[f64]) -> Vec<f64> {
    let points = curve.points();
    target_poes.iter().map(|&target| interpolate_iml(points, target)).collect()
}

fn interpolate_iml(points: &[(f64, oq_core::PoE)], target_poe: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let max_poe = points[0].1.value();
    if target_poe >= max_poe {
        return 0.0;
    }
    if points.len() < 2 {
        return points[0].0;
    }

    let min_poe = points[points.len() - 1].1.value();
    if target_poe <= min_poe.max(POE_CUTOFF) {
        return points[points.len() - 1].0;
    }

    for window in points.windows(2) {
        let (iml_lo, poe_lo) = window[0];
        let (iml_hi, poe_hi) = window[1];
        let poe_lo = poe_lo.value().max(POE_CUTOFF);
        let poe_hi = poe_hi.value().max(POE_CUTOFF);
        if (poe_lo - target_poe) * (poe_hi - target_poe) <= 0.0 && poe_lo != poe_hi {
            let (log_lo, log_hi) = (iml_lo.max(1e-300).ln(), iml_hi.max(1e-300).ln());
            let (log_poe_lo, log_poe_hi) = (poe_lo.ln(), poe_hi.ln());
            let frac = (target_poe.max(POE_CUTOFF).ln() - log_poe_lo) / (log_poe_hi - log_poe_lo);
            return (log_lo + frac * (log_hi - log_lo)).exp();
        }
    }
    points[points.len() - 1].0
}
