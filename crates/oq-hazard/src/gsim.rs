//! Ground-motion model port. Real GSIMs compute a distribution of ground
//! motion given a rupture, site and IMT from seismological first
//! principles — out of scope here. Calculators depend only on this trait.

use oq_core::{Imt, Rupture, SiteId};

/// Returns the natural-log-mean and standard deviation of ground motion
/// for one rupture/site/IMT combination.
pub trait GroundMotionModel: Sync {
    fn ln_mean_std(&self, rupture: &Rupture, site_id: SiteId, imt: Imt) -> (f64, f64);
}

/// A deterministic test double: constant mean/std regardless of input,
/// useful for exercising the calculator plumbing without a real GSIM.
pub struct ConstantGmm {
    pub ln_mean: f64,
    pub std: f64,
}

impl GroundMotionModel for ConstantGmm {
    fn ln_mean_std(&self, _rupture: &Rupture, _site_id: SiteId, _imt: Imt) -> (f64, f64) {
        (self.ln_mean, self.std)
    }
}

/// A magnitude-scaled test double: ln_mean grows linearly with magnitude,
/// exercising the case where different ruptures produce different
/// ground-motion distributions at the same site.
pub struct MagnitudeScaledGmm {
    pub base_ln_mean: f64,
    pub mag_coefficient: f64,
    pub std: f64,
}

impl GroundMotionModel for MagnitudeScaledGmm {
    fn ln_mean_std(&self, rupture: &Rupture, _site_id: SiteId, _imt: Imt) -> (f64, f64) {
        (self.base_ln_mean + self.mag_coefficient * rupture.mag, self.std)
    }
}
