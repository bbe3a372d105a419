use thiserror::Error;

#[derive(Debug, Error)]
pub enum HazardError {
    #[error("no intensity measure levels supplied for curve computation")]
    EmptyImls,

    #[error("ground motion model returned a non-finite value for site {site_id}")]
    NonFiniteGroundMotion { site_id: u64 },
}

pub type HazardResult<T> = Result<T, HazardError>;
