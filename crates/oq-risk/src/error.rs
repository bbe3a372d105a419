use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("IMT mismatch: hazard has {hazard}, vulnerability function expects {expected}")]
    ImtMismatch { hazard: String, expected: String },

    #[error("no assets supplied to risk input")]
    EmptyAssets,

    #[error("negative retrofit cost for asset {0}")]
    NegativeRetrofitCost(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
