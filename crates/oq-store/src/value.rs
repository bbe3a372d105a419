//! The `to_record`/`from_record` serialization protocol: anything storable
//! must round-trip through `serde_json::Value`. This replaces the original
//! store's ability to pickle arbitrary Python objects — Rust has no
//! runtime-polymorphic equivalent, so unknown/non-`Record` types are
//! rejected at the call site rather than silently boxed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub trait Record: Serialize + DeserializeOwned + Clone {}
impl<T: Serialize + DeserializeOwned + Clone> Record for T {}

pub fn to_record<T: Record>(value: &T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}

pub fn from_record<T: Record>(value: &Value) -> serde_json::Result<T> {
    serde_json::from_value(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: f64,
        y: f64,
    }

    #[test]
    fn round_trips_a_struct() {
        let p = Point { x: 1.0, y: 2.0 };
        let record = to_record(&p).unwrap();
        let back: Point = from_record(&record).unwrap();
        assert_eq!(p, back);
    }
}
