use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogicTreeError {
    #[error("no GSIM branches defined for tectonic region type '{0}'")]
    MissingTrt(String),

    #[error("realization weights sum to {sum}, expected ~1.0 (tolerance {tol})")]
    WeightsNotNormalized { sum: f64, tol: f64 },
}

pub type LogicTreeResult<T> = Result<T, LogicTreeError>;
