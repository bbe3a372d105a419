//! Unified error type for the calculator orchestration stack.
//!
//! Every crate in the workspace defines its own narrow error enum; `OqError`
//! is the top-level type a calculator returns, wrapping the others the way
//! a composite result type wraps its constituent failure modes.

use thiserror::Error;

/// Top-level error returned from calculator-facing APIs.
#[derive(Debug, Error)]
pub enum OqError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("duplicate source id: {0}")]
    DuplicateSourceId(String),

    #[error("asset {asset_id} references unknown site {site_id}")]
    AssetSiteAssociation { asset_id: String, site_id: u64 },

    #[error("IMT mismatch: hazard has {hazard}, risk function expects {risk}")]
    ImtMismatch { hazard: String, risk: String },

    #[error("invalid hazard input: {0}")]
    InvalidHazard(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<String> for OqError {
    fn from(s: String) -> Self {
        OqError::Other(anyhow::anyhow!(s))
    }
}

impl From<&str> for OqError {
    fn from(s: &str) -> Self {
        OqError::Other(anyhow::anyhow!(s.to_string()))
    }
}

pub type OqResult<T> = Result<T, OqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable() {
        let e = OqError::DuplicateSourceId("src-1".into());
        assert_eq!(e.to_string(), "duplicate source id: src-1");
    }

    #[test]
    fn converts_from_string() {
        let e: OqError = "boom".into();
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn question_mark_propagates() {
        fn inner() -> OqResult<()> {
            Err(OqError::Config("missing field".into()))
        }
        fn outer() -> OqResult<()> {
            inner()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}
