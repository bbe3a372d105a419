//! Risk calculator cores: classical risk/damage/BCR, event-based risk,
//! and scenario risk/damage, all built against the vulnerability/
//! fragility/consequence function trait ports rather than real curve
//! numerics.

pub mod classical_bcr;
pub mod classical_damage;
pub mod classical_risk;
pub mod epsilons;
pub mod error;
pub mod event_based_risk;
pub mod riskinput;
pub mod scenario_damage;
pub mod scenario_risk;
pub mod vulnerability;

pub use error::{RiskError, RiskResult};
pub use vulnerability::{ConsequenceFunction, FragilityFunction, VulnerabilityFunction};
