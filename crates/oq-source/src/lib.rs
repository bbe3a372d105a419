//! Composite source model and source manager: filtering, splitting,
//! deterministic serial assignment, and weighted task-block packing.

pub mod composite;
pub mod error;
pub mod info;
pub mod manager;
pub mod serials;
pub mod tile;

pub use composite::{CompositeSourceModel, SourceKind};
pub use error::{SourceError, SourceResult};
pub use info::{SourceChunk, SourceInfo};
pub use manager::{EqualWeightSplitter, SourceManager, SourceSplitter};
pub use tile::{AcceptAll, AllowList, SiteTile};
