//! Well-known keys in the persisted layout, named the way the original
//! store's `persistent_attribute` properties are named: `sitemesh`,
//! `sitecol`, `rlzs_assoc`, `csm`, `realizations`, `assetcol`, `cost_types`,
//! `taxonomies`, `job_info`, `performance`, plus the source-accounting
//! tables this spec adds (`source_info`, `source_chunks`).

pub const SITEMESH: &str = "sitemesh";
pub const SITECOL: &str = "sitecol";
pub const RLZS_ASSOC: &str = "rlzs_assoc";
pub const CSM: &str = "csm";
pub const REALIZATIONS: &str = "realizations";
pub const ASSETCOL: &str = "assetcol";
pub const COST_TYPES: &str = "cost_types";
pub const TAXONOMIES: &str = "taxonomies";
pub const JOB_INFO: &str = "job_info";
pub const PERFORMANCE: &str = "performance";
pub const SOURCE_INFO: &str = "source_info";
pub const SOURCE_CHUNKS: &str = "source_chunks";
