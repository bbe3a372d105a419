//! A realization: one concrete combination of a source-model logic-tree
//! branch and a GSIM logic-tree branch, the unit hazard/risk results are
//! ultimately reported against.

use crate::gsim_tree::GsimRealization;
use oq_core::{RlzOrdinal, Weight};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtRealization {
    pub ordinal: RlzOrdinal,
    pub sm_lt_path: Vec<String>,
    pub sm_ordinal: u32,
    pub gsim_rlz: GsimRealization,
    pub weight: Weight,
    pub sample_id: Option<u32>,
}

impl LtRealization {
    /// Unique textual id: the source-model path joined by `_`, followed by
    /// a comma and the GSIM assignment for every TRT joined by `_` —
    /// mirrors `LtRealization.uid`.
    pub fn uid(&self) -> String {
        let sm_part = self.sm_lt_path.join("_");
        let gsim_part = self
            .gsim_rlz
            .gsim_by_trt
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("_");
        format!("{sm_part},{gsim_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn uid_joins_sm_path_and_gsim_choices() {
        let mut gsim_by_trt = BTreeMap::new();
        gsim_by_trt.insert("Active Shallow Crust".to_string(), "BA2008".to_string());
        let rlz = LtRealization {
            ordinal: RlzOrdinal(0),
            sm_lt_path: vec!["b1".into(), "b2".into()],
            sm_ordinal: 0,
            gsim_rlz: GsimRealization { gsim_by_trt, weight: Weight::ONE },
            weight: Weight::ONE,
            sample_id: None,
        };
        assert_eq!(rlz.uid(), "b1_b2,BA2008");
    }
}
