//! A typed, hierarchical, chunked datastore: the orchestration layer's
//! persistence boundary. Grounded in `datastore.py::DataStore` — a
//! mapping-like store with typed get/set, extendable append-only datasets,
//! attributes, and parent-store fallback for calculators that resume from
//! a previous run's results.
//!
//! The real store is HDF5-backed; here it is backed by an in-process
//! `BTreeMap` so keys enumerate lexicographically (the property the
//! original relies on for deterministic iteration order), with the same
//! external shape other components are written against.

use crate::error::{StoreError, StoreResult};
use crate::value::{from_record, to_record, Record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Inner {
    datasets: BTreeMap<String, Value>,
    extendable: BTreeMap<String, Vec<Value>>,
    attrs: BTreeMap<String, BTreeMap<String, Value>>,
    nbytes: BTreeMap<String, usize>,
    closed: bool,
}

/// A single calculation's datastore, optionally chained to a parent store
/// for attribute/dataset fallback.
#[derive(Debug, Clone)]
pub struct DataStore {
    pub calc_id: u64,
    inner: Arc<RwLock<Inner>>,
    parent: Option<Arc<DataStore>>,
}

impl DataStore {
    pub fn new(calc_id: u64) -> Self {
        Self {
            calc_id,
            inner: Arc::new(RwLock::new(Inner::default())),
            parent: None,
        }
    }

    /// Chains a parent store and merges any parent attribute not already
    /// present locally — mirrors `datastore.py::set_parent`, which copies
    /// attrs "only if missing" rather than overwriting.
    pub fn set_parent(&mut self, parent: Arc<DataStore>) {
        let parent_attrs: Vec<(String, BTreeMap<String, Value>)> = {
            let p = parent.inner.read().unwrap();
            p.attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        {
            let mut me = self.inner.write().unwrap();
            for (key, attrs) in parent_attrs {
                let entry = me.attrs.entry(key).or_default();
                for (attr_key, attr_val) in attrs {
                    entry.entry(attr_key).or_insert(attr_val);
                }
            }
        }
        self.parent = Some(parent);
    }

    pub fn set<T: Record>(&self, key: &str, value: &T) -> StoreResult<()> {
        let record = to_record(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        let nbytes = record.to_string().len();
        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner.datasets.get(key) {
            if std::mem::discriminant(existing) != std::mem::discriminant(&record) {
                return Err(StoreError::WriteConflict {
                    key: key.to_string(),
                });
            }
        }
        inner.datasets.insert(key.to_string(), record);
        inner.nbytes.insert(key.to_string(), nbytes);
        Ok(())
    }

    pub fn get<T: Record>(&self, key: &str) -> StoreResult<T> {
        {
            let inner = self.inner.read().unwrap();
            if let Some(value) = inner.datasets.get(key) {
                return from_record(value).map_err(|source| StoreError::Serde {
                    key: key.to_string(),
                    source,
                });
            }
        }
        if let Some(parent) = &self.parent {
            return parent.get(key);
        }
        Err(StoreError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read().unwrap();
        inner.datasets.contains_key(key)
            || inner.extendable.contains_key(key)
            || self.parent.as_ref().is_some_and(|p| p.contains(key))
    }

    /// Creates an empty extendable (append-only) dataset, idempotently.
    pub fn create_extendable(&self, key: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.extendable.entry(key.to_string()).or_default();
    }

    pub fn append<T: Record>(&self, key: &str, value: &T) -> StoreResult<()> {
        let record = to_record(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        let nbytes = record.to_string().len();
        let mut inner = self.inner.write().unwrap();
        inner.extendable.entry(key.to_string()).or_default().push(record);
        *inner.nbytes.entry(key.to_string()).or_insert(0) += nbytes;
        Ok(())
    }

    pub fn read_extendable<T: Record>(&self, key: &str) -> StoreResult<Vec<T>> {
        let inner = self.inner.read().unwrap();
        match inner.extendable.get(key) {
            Some(values) => values
                .iter()
                .map(|v| {
                    from_record(v).map_err(|source| StoreError::Serde {
                        key: key.to_string(),
                        source,
                    })
                })
                .collect(),
            None => {
                drop(inner);
                if let Some(parent) = &self.parent {
                    parent.read_extendable(key)
                } else {
                    Err(StoreError::NotFound(key.to_string()))
                }
            }
        }
    }

    pub fn set_attr<T: Record>(&self, key: &str, attr: &str, value: &T) -> StoreResult<()> {
        let record = to_record(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        let mut inner = self.inner.write().unwrap();
        inner
            .attrs
            .entry(key.to_string())
            .or_default()
            .insert(attr.to_string(), record);
        Ok(())
    }

    pub fn get_attr<T: Record>(&self, key: &str, attr: &str) -> StoreResult<T> {
        {
            let inner = self.inner.read().unwrap();
            if let Some(value) = inner.attrs.get(key).and_then(|a| a.get(attr)) {
                return from_record(value).map_err(|source| StoreError::Serde {
                    key: key.to_string(),
                    source,
                });
            }
        }
        if let Some(parent) = &self.parent {
            return parent.get_attr(key, attr);
        }
        Err(StoreError::AttrNotFound(format!("{key}/{attr}")))
    }

    /// Total serialized size across every dataset, the `nbytes` figure the
    /// original computes via a counting file-like object wrapped around
    /// h5py's writer (`ByteCounter`/`get_nbytes`).
    pub fn nbytes(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.nbytes.values().sum()
    }

    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut keys: Vec<String> = inner
            .datasets
            .keys()
            .chain(inner.extendable.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn flush(&self) {
        // in-memory store: writes are already durable in `inner`.
    }

    pub fn close(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().unwrap().closed
    }
}
