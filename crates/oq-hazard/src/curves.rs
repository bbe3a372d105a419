//! Converts a sample of ground-motion values into a hazard curve: for
//! each IML, the fraction of stochastic-event-set realizations exceeding
//! it gives an empirical annual rate of exceedance.

use oq_core::{Curve, PoE};

/// `gmvs` is the pooled ground-motion sample for one site/IMT across
/// `num_ses` stochastic event sets, each covering `investigation_time`
/// years. The exceedance rate per SES is `count(gmv >= iml) / num_ses`;
/// converting a rate to a probability over the investigation time uses
/// the Poissonian `1 - exp(-rate)`.
pub fn gmvs_to_haz_curve(gmvs: &[f64], imls: &[f64], num_ses: u32) -> Curve {
    let num_ses = num_ses.max(1) as f64;
    let mut points = Vec::with_capacity(imls.len());
    for &iml in imls {
        let count = gmvs.iter().filter(|&&gmv| gmv >= iml).count() as f64;
        let rate = count / num_ses;
        let poe = 1.0 - (-rate).exp();
        points.push((iml, PoE::new(poe)));
    }
    Curve::from_points(points)
}
