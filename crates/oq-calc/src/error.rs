use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown calculation mode '{0}'; supported values: {1}")]
    UnknownCalculationMode(String, String),

    #[error("no pre-calculator registered for '{0}'")]
    NoPreCalculator(String),

    #[error(transparent)]
    Store(#[from] oq_store::StoreError),

    #[error(transparent)]
    Task(#[from] oq_parallel::TaskError),

    #[error(transparent)]
    Hazard(#[from] oq_hazard::HazardError),

    #[error(transparent)]
    Risk(#[from] oq_risk::RiskError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CalcResult<T> = Result<T, CalcError>;
