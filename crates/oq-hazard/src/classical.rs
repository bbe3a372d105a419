//! Classical PSHA: for each site/IMT/IML, combine the independent
//! non-exceedance probabilities of every rupture that could affect the
//! site into one hazard curve.

use crate::error::{HazardError, HazardResult};
use crate::gsim::GroundMotionModel;
use crate::stats::poe_exceed;
use oq_core::{Curve, Imt, PoE, Rupture, SiteId};

/// Computes one site/IMT hazard curve from a set of ruptures sharing a
/// tectonic-region-type/GSIM pair. Ruptures are assumed independent
/// Poissonian sources, so the probability of non-exceedance multiplies:
/// `PoE(iml) = 1 - prod_rup(1 - occurrence_rate_i * poe_exceed_i(iml))`,
/// the small-probability approximation the original's classical
/// calculator core relies on (valid when `occurrence_rate * poe << 1`).
pub fn compute_curve(
    ruptures: &[Rupture],
    gmm: &dyn GroundMotionModel,
    site_id: SiteId,
    imt: Imt,
    imls: &[f64],
) -> HazardResult<Curve> {
    if imls.is_empty() {
        return Err(HazardError::EmptyImls);
    }
    let mut points = Vec::with_capacity(imls.len());
    for &iml in imls {
        let mut non_exceed = 1.0;
        for rup in ruptures {
            let (ln_mean, std) = gmm.ln_mean_std(rup, site_id, imt);
            if !ln_mean.is_finite() || !std.is_finite() {
                return Err(HazardError::NonFiniteGroundMotion { site_id: site_id.value() });
            }
            let p_exceed = poe_exceed(iml, ln_mean, std);
            let occurrence_poe = (rup.occurrence_rate * p_exceed).min(1.0);
            non_exceed *= 1.0 - occurrence_poe;
        }
        points.push((iml, PoE::new(1.0 - non_exceed)));
    }
    Ok(Curve::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsim::ConstantGmm;
    use oq_core::TrtId;

    fn rup(rate: f64) -> Rupture {
        Rupture { source_id: "s1".into(), trt_id: TrtId(0), mag: 6.0, serial: 0, occurrence_rate: rate }
    }

    #[test]
    fn curve_is_monotonically_decreasing_in_iml() {
        let gmm = ConstantGmm { ln_mean: -1.5, std: 0.6 };
        let ruptures = vec![rup(0.01), rup(0.02)];
        let imls = vec![0.05, 0.1, 0.2, 0.5];
        let curve = compute_curve(&ruptures, &gmm, SiteId(1), Imt::Pga, &imls).unwrap();
        let poes: Vec<f64> = curve.points().iter().map(|(_, p)| p.value()).collect();
        for w in poes.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }

    #[test]
    fn more_ruptures_never_decreases_hazard() {
        let gmm = ConstantGmm { ln_mean: -1.5, std: 0.6 };
        let one = compute_curve(&[rup(0.01)], &gmm, SiteId(1), Imt::Pga, &[0.1]).unwrap();
        let two = compute_curve(&[rup(0.01), rup(0.01)], &gmm, SiteId(1), Imt::Pga, &[0.1]).unwrap();
        assert!(two.poe_at(0.1).unwrap().value() >= one.poe_at(0.1).unwrap().value());
    }

    #[test]
    fn rejects_empty_iml_grid() {
        let gmm = ConstantGmm { ln_mean: -1.5, std: 0.6 };
        let err = compute_curve(&[rup(0.01)], &gmm, SiteId(1), Imt::Pga, &[]).unwrap_err();
        assert!(matches!(err, HazardError::EmptyImls));
    }
}
