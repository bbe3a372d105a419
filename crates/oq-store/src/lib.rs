//! Typed hierarchical store for calculator state: datasets, extendable
//! append logs, attributes and parent-store fallback.

pub mod error;
pub mod layout;
pub mod store;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use store::DataStore;
pub use value::Record;
