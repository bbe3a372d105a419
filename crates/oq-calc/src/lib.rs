//! Calculator orchestration: job configuration, the persisted-attribute
//! store, the calculation-mode registry, the pre_execute/execute/
//! post_execute/export lifecycle, and the concrete calculators that plug
//! into it.

pub mod calculators;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod persistent_attrs;
pub mod registry;

pub use config::{resolve, JobConfig, ResolvedJobConfig};
pub use error::{CalcError, CalcResult};
pub use lifecycle::{CalcContext, Calculator};
pub use registry::CalculatorKind;

/// Installs a global `tracing` subscriber writing to stderr, respecting
/// `RUST_LOG` with `default_level` as the fallback. A front-end embedding
/// this orchestration layer (out of scope here per the spec's
/// CLI/reporting Non-goal) calls this once at startup so the
/// `pre_execute`/`execute`/`post_execute` span logging every calculator
/// emits actually reaches a writer.
pub fn init_tracing(default_level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic_when_called_repeatedly() {
        init_tracing(tracing::Level::INFO);
        init_tracing(tracing::Level::DEBUG);
    }
}
