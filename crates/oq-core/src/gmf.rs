//! Ground-motion field records produced by event-based hazard
//! calculators: one ground-motion value per site, event and IMT.

use crate::ids::{EventId, SiteId};
use crate::imt::Imt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GmfRecord {
    pub site_id: SiteId,
    pub event_id: EventId,
    pub imt: Imt,
    pub gmv: f64,
}

/// A collection of GMF records for one event-based hazard run, grouped by
/// the rupture that generated them so event-based risk can correlate
/// per-event losses back to the causative rupture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmfCollection {
    records: Vec<GmfRecord>,
}

impl GmfCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GmfRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: GmfCollection) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[GmfRecord] {
        &self.records
    }

    pub fn for_site(&self, site: SiteId) -> impl Iterator<Item = &GmfRecord> {
        self.records.iter().filter(move |r| r.site_id == site)
    }

    pub fn for_event(&self, event: EventId) -> impl Iterator<Item = &GmfRecord> {
        self.records.iter().filter(move |r| r.event_id == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_site_and_event() {
        let mut coll = GmfCollection::new();
        coll.push(GmfRecord { site_id: SiteId(1), event_id: EventId(10), imt: Imt::Pga, gmv: 0.3 });
        coll.push(GmfRecord { site_id: SiteId(2), event_id: EventId(10), imt: Imt::Pga, gmv: 0.1 });
        coll.push(GmfRecord { site_id: SiteId(1), event_id: EventId(11), imt: Imt::Pga, gmv: 0.2 });

        assert_eq!(coll.for_site(SiteId(1)).count(), 2);
        assert_eq!(coll.for_event(EventId(10)).count(), 2);
    }
}
