//! Persistent-attribute cache: the typed getter/setter pair
//! `datastore.py::persistent_attribute` exposes per well-known key,
//! backed by the store but cached in memory so repeated reads within a
//! calculator phase don't round-trip through serialization.

use chrono::{DateTime, Utc};
use oq_core::{AssetCollection, ProbabilityMap};
use oq_logictree::RlzsAssoc;
use oq_store::{DataStore, Record, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Timing and byte-accounting record stored at `job_info` — the
/// orchestration layer's wall-clock receipt for one calculator phase.
/// Mirrors `job_info`'s "timing and byte accounting" role in the
/// persisted layout (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub calc_id: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobInfo {
    pub fn new(calc_id: u64, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        let duration_ms = (end_time - start_time).num_milliseconds();
        Self { calc_id, start_time, end_time, duration_ms }
    }
}

/// A typed value cached after its first store read or write, erased
/// behind `Box<dyn Record>`'s concrete serialized form via `serde_json`.
#[derive(Default)]
struct Cache {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl Cache {
    fn get<T: Record>(&self, key: &str, store: &DataStore) -> StoreResult<T> {
        if let Some(value) = self.entries.read().unwrap().get(key) {
            return oq_store::value::from_record(value).map_err(|source| oq_store::StoreError::Serde {
                key: key.to_string(),
                source,
            });
        }
        let value: T = store.get(key)?;
        let record = oq_store::value::to_record(&value).map_err(|source| oq_store::StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.entries.write().unwrap().insert(key.to_string(), record);
        Ok(value)
    }

    fn set<T: Record>(&self, key: &str, value: &T, store: &DataStore) -> StoreResult<()> {
        store.set(key, value)?;
        let record = oq_store::value::to_record(value).map_err(|source| oq_store::StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.entries.write().unwrap().insert(key.to_string(), record);
        Ok(())
    }
}

/// Caches the calculator-lifecycle attributes listed in `oq_store::layout`
/// (`sitemesh`, `sitecol`, `rlzs_assoc`, `csm`, `realizations`, `assetcol`,
/// `cost_types`, `taxonomies`, `job_info`, `performance`) over a
/// [`DataStore`], exposing one typed accessor pair per attribute rather
/// than a raw string-keyed `get`/`set`.
pub struct PersistentAttrs {
    store: DataStore,
    cache: Cache,
}

impl PersistentAttrs {
    pub fn new(store: DataStore) -> Self {
        Self { store, cache: Cache::default() }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn sitemesh(&self) -> StoreResult<Vec<(f64, f64)>> {
        self.cache.get(oq_store::layout::SITEMESH, &self.store)
    }

    pub fn set_sitemesh(&self, value: &[(f64, f64)]) -> StoreResult<()> {
        self.cache.set(oq_store::layout::SITEMESH, &value.to_vec(), &self.store)
    }

    pub fn sitecol(&self) -> StoreResult<Vec<u64>> {
        self.cache.get(oq_store::layout::SITECOL, &self.store)
    }

    pub fn set_sitecol(&self, value: &[u64]) -> StoreResult<()> {
        self.cache.set(oq_store::layout::SITECOL, &value.to_vec(), &self.store)
    }

    pub fn rlzs_assoc(&self) -> StoreResult<RlzsAssoc> {
        self.cache.get(oq_store::layout::RLZS_ASSOC, &self.store)
    }

    pub fn set_rlzs_assoc(&self, value: &RlzsAssoc) -> StoreResult<()> {
        self.cache.set(oq_store::layout::RLZS_ASSOC, value, &self.store)
    }

    pub fn assetcol(&self) -> StoreResult<AssetCollection> {
        self.cache.get(oq_store::layout::ASSETCOL, &self.store)
    }

    pub fn set_assetcol(&self, value: &AssetCollection) -> StoreResult<()> {
        self.cache.set(oq_store::layout::ASSETCOL, value, &self.store)
    }

    pub fn cost_types(&self) -> StoreResult<Vec<String>> {
        self.cache.get(oq_store::layout::COST_TYPES, &self.store)
    }

    pub fn set_cost_types(&self, value: &[String]) -> StoreResult<()> {
        self.cache.set(oq_store::layout::COST_TYPES, &value.to_vec(), &self.store)
    }

    pub fn taxonomies(&self) -> StoreResult<Vec<String>> {
        self.cache.get(oq_store::layout::TAXONOMIES, &self.store)
    }

    pub fn set_taxonomies(&self, value: &[String]) -> StoreResult<()> {
        self.cache.set(oq_store::layout::TAXONOMIES, &value.to_vec(), &self.store)
    }

    pub fn hazard_curves(&self) -> StoreResult<ProbabilityMap> {
        self.cache.get("hazard_curves", &self.store)
    }

    pub fn set_hazard_curves(&self, value: &ProbabilityMap) -> StoreResult<()> {
        self.cache.set("hazard_curves", value, &self.store)
    }

    pub fn performance(&self) -> StoreResult<HashMap<String, f64>> {
        self.cache.get(oq_store::layout::PERFORMANCE, &self.store)
    }

    pub fn set_performance(&self, value: &HashMap<String, f64>) -> StoreResult<()> {
        self.cache.set(oq_store::layout::PERFORMANCE, value, &self.store)
    }

    pub fn job_info(&self) -> StoreResult<JobInfo> {
        self.cache.get(oq_store::layout::JOB_INFO, &self.store)
    }

    pub fn set_job_info(&self, value: &JobInfo) -> StoreResult<()> {
        self.cache.set(oq_store::layout::JOB_INFO, value, &self.store)
    }
}
