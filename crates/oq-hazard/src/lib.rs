//! Hazard calculator cores: classical PSHA, stochastic event set
//! sampling, event-based GMF/curve generation, and scenario GMFs.

pub mod classical;
pub mod curves;
pub mod error;
pub mod event_based;
pub mod event_based_rupture;
pub mod gsim;
pub mod hazard_maps;
pub mod scenario;
pub mod stats;

pub use error::{HazardError, HazardResult};
pub use gsim::{ConstantGmm, GroundMotionModel, MagnitudeScaledGmm};
