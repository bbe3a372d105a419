//! Site-geography port. A tile is a distance-bounded membership test used
//! to decide whether a source can possibly affect any site in it. Real
//! geodetic distance computation is out of scope — callers provide their
//! own `SiteTile` implementation (or `AcceptAll`/`RejectAll` test doubles).

use oq_core::FilterableSource;

pub trait SiteTile {
    fn contains(&self, source: &dyn FilterableSource) -> bool;
}

/// A tile that never filters anything out — the default when no site
/// collection/distance model has been wired in.
pub struct AcceptAll;

impl SiteTile for AcceptAll {
    fn contains(&self, _source: &dyn FilterableSource) -> bool {
        true
    }
}

/// A tile backed by an explicit allow-list of source ids, useful for
/// tests and for a pre-computed filtering pass.
pub struct AllowList(pub std::collections::HashSet<String>);

impl SiteTile for AllowList {
    fn contains(&self, source: &dyn FilterableSource) -> bool {
        self.0.contains(source.source_id())
    }
}
