//! Shared data model for the seismic hazard/risk calculator orchestration
//! workspace: identifiers, units, the composite source model's building
//! blocks, ruptures, hazard curves/GMFs, exposure and risk inputs.
//!
//! Seismological primitives (rupture geometry, ground-motion computation)
//! and NRML parsing are deliberately out of scope; where the orchestration
//! layer needs to call into them it does so through a trait, defined here
//! alongside the data they operate on.

pub mod asset;
pub mod error;
pub mod gmf;
pub mod ids;
pub mod imt;
pub mod probability_map;
pub mod risk_input;
pub mod rupture;
pub mod source_model;
pub mod units;

pub use asset::{insured_loss, Asset, AssetCollection};
pub use error::{OqError, OqResult};
pub use gmf::{GmfCollection, GmfRecord};
pub use ids::{AssetOrdinal, EventId, RlzOrdinal, SiteId, SourceModelOrdinal, TrtId};
pub use imt::Imt;
pub use probability_map::{Curve, ProbabilityMap};
pub use risk_input::{Hazard, RiskInput};
pub use rupture::{EBRupture, Rupture};
pub use source_model::{FilterableSource, SourceModel, SourceSkeleton, TrtModel};
pub use units::{Weight, PoE};
