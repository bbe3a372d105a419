//! Logic tree and realization association: source-model/GSIM branch
//! enumeration and sampling, and the `RlzsAssoc` combinators used to lift
//! per-(trt, gsim) partial hazard results up to per-realization results.

pub mod assoc;
pub mod composition;
pub mod error;
pub mod gsim_tree;
pub mod realization;

pub use assoc::RlzsAssoc;
pub use composition::CompositionInfo;
pub use error::{LogicTreeError, LogicTreeResult};
pub use gsim_tree::{GsimLogicTree, GsimRealization};
pub use realization::LtRealization;
