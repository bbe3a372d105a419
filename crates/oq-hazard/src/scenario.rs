//! Scenario hazard: ground-motion fields for a fixed, small set of
//! deterministic ruptures, sampled `num_realizations` times (no
//! probability of exceedance is computed — scenario calculations report
//! raw GMF realizations).

use crate::gsim::GroundMotionModel;
use oq_core::{EBRupture, GmfCollection, Imt, Rupture, SiteId};

/// Builds `num_realizations` independent `EBRupture`s from a fixed set of
/// ruptures (multiplicity 1 each), seeded from `seed + realization_index`,
/// then reuses `event_based::generate_gmfs` to produce the field.
pub fn generate_scenario_gmfs(
    ruptures: &[Rupture],
    gmm: &dyn GroundMotionModel,
    site_ids: &[SiteId],
    imt: Imt,
    num_realizations: u32,
    seed: u64,
) -> GmfCollection {
    let mut out = GmfCollection::new();
    let mut event_id = 0u64;
    for realization in 0..num_realizations {
        let events: Vec<EBRupture> = ruptures
            .iter()
            .map(|rup| {
                let rup_seed = seed.wrapping_add(realization as u64).wrapping_add(rup.serial as u64);
                let eb = EBRupture::new(rup.clone(), event_id, rup_seed, seed, 1);
                event_id += 1;
                eb
            })
            .collect();
        out.extend(crate::event_based::generate_gmfs(&events, gmm, site_ids, imt));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsim::ConstantGmm;
    use oq_core::TrtId;

    #[test]
    fn produces_gmfs_for_every_realization_and_site() {
        let ruptures = vec![Rupture { source_id: "s1".into(), trt_id: TrtId(0), mag: 6.5, serial: 0, occurrence_rate: 0.0 }];
        let gmm = ConstantGmm { ln_mean: -2.0, std: 0.5 };
        let sites = vec![SiteId(1), SiteId(2)];
        let gmfs = generate_scenario_gmfs(&ruptures, &gmm, &sites, Imt::Pga, 5, 1);
        assert_eq!(gmfs.records().len(), 5 * 2);
    }
}
