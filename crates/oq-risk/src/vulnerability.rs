//! Vulnerability/fragility/consequence function ports. Per spec these are
//! "treated as pure functions" — the actual curve-fitting/interpolation
//! numerics a production risk library ships are out of scope; calculators
//! depend only on these traits, with simple linear/tabular test doubles.

use oq_core::Imt;

/// Maps an intensity measure level to a mean loss ratio and its
/// coefficient of variation (for classical/event-based/scenario risk).
pub trait VulnerabilityFunction: Sync {
    fn imt(&self) -> Imt;
    /// Returns `(mean_loss_ratio, coefficient_of_variation)`.
    fn loss_ratio(&self, iml: f64) -> (f64, f64);
}

/// Maps an intensity measure level to the probability of meeting or
/// exceeding each damage state, for classical/scenario damage.
pub trait FragilityFunction: Sync {
    fn imt(&self) -> Imt;
    fn num_damage_states(&self) -> usize;
    /// Probability of meeting or exceeding `state` (1-indexed; state 0 is
    /// "no damage" and always has PoE 1).
    fn poe_damage_state(&self, iml: f64, state: usize) -> f64;
}

/// Maps a damage state to a mean loss ratio, used to convert a damage
/// distribution into an expected loss for BCR and damage-to-loss
/// reporting.
pub trait ConsequenceFunction: Sync {
    fn loss_ratio_for_state(&self, state: usize) -> f64;
}

/// A simple linear vulnerability function test double: `loss_ratio =
/// clamp(intercept + slope * iml, 0, 1)`.
pub struct LinearVulnerability {
    pub imt: Imt,
    pub intercept: f64,
    pub slope: f64,
    pub cov: f64,
}

impl VulnerabilityFunction for LinearVulnerability {
    fn imt(&self) -> Imt {
        self.imt
    }

    fn loss_ratio(&self, iml: f64) -> (f64, f64) {
        ((self.intercept + self.slope * iml).clamp(0.0, 1.0), self.cov)
    }
}

/// A step-function fragility test double: PoE drops to 0 for `iml` below
/// each state's threshold, otherwise 1.
pub struct StepFragility {
    pub imt: Imt,
    pub thresholds: Vec<f64>,
}

impl FragilityFunction for StepFragility {
    fn imt(&self) -> Imt {
        self.imt
    }

    fn num_damage_states(&self) -> usize {
        self.thresholds.len() + 1
    }

    fn poe_damage_state(&self, iml: f64, state: usize) -> f64 {
        if state == 0 {
            return 1.0;
        }
        match self.thresholds.get(state - 1) {
            Some(&threshold) => {
                if iml >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }
}

/// A tabular consequence function test double.
pub struct TableConsequence {
    pub loss_ratios: Vec<f64>,
}

impl ConsequenceFunction for TableConsequence {
    fn loss_ratio_for_state(&self, state: usize) -> f64 {
        self.loss_ratios.get(state).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_vulnerability_clamps_to_unit_interval() {
        let vf = LinearVulnerability { imt: Imt::Pga, intercept: 0.0, slope: 2.0, cov: 0.3 };
        assert_eq!(vf.loss_ratio(10.0).0, 1.0);
        assert_eq!(vf.loss_ratio(0.0).0, 0.0);
    }

    #[test]
    fn step_fragility_state_zero_is_always_certain() {
        let ff = StepFragility { imt: Imt::Pga, thresholds: vec![0.2, 0.4] };
        assert_eq!(ff.poe_damage_state(0.0, 0), 1.0);
        assert_eq!(ff.poe_damage_state(0.1, 1), 0.0);
        assert_eq!(ff.poe_damage_state(0.3, 1), 1.0);
        assert_eq!(ff.poe_damage_state(0.3, 2), 0.0);
    }
}
