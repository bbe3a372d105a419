//! Data-driven calculation-mode registry, generalized from
//! `gat-core::solver::registry`'s `once_cell` + `RwLock<HashMap<...>>`
//! constructor table: a calculator is looked up by its `calculation_mode`
//! string rather than matched with a hardcoded `match`, so adding a new
//! calculation mode means registering a constructor, not editing a
//! dispatch table scattered through the codebase.

use crate::error::CalcError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

struct ModeEntry {
    canonical: &'static str,
    pre_calculator: Option<&'static str>,
    is_stochastic: bool,
}

struct ModeRegistry {
    entries: HashMap<String, ModeEntry>,
}

impl ModeRegistry {
    fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    fn register(&mut self, name: &'static str, pre_calculator: Option<&'static str>, is_stochastic: bool) {
        self.entries.insert(
            name.to_string(),
            ModeEntry { canonical: name, pre_calculator, is_stochastic },
        );
    }

    fn entry_for(&self, name: &str) -> Option<&ModeEntry> {
        self.entries.get(name)
    }

    fn available(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|e| e.canonical).collect();
        names.sort_unstable();
        names
    }
}

static GLOBAL_MODE_REGISTRY: Lazy<RwLock<ModeRegistry>> = Lazy::new(|| {
    let mut registry = ModeRegistry::new();
    registry.register("classical", None, false);
    registry.register("classical_risk", Some("classical"), false);
    registry.register("classical_damage", Some("classical"), false);
    registry.register("classical_bcr", Some("classical"), false);
    registry.register("event_based_rupture", None, true);
    registry.register("event_based", Some("event_based_rupture"), true);
    registry.register("event_based_risk", Some("event_based"), true);
    registry.register("scenario", None, true);
    registry.register("scenario_damage", Some("scenario"), true);
    registry.register("scenario_risk", Some("scenario"), true);
    RwLock::new(registry)
});

/// Registers an additional calculation mode (and optionally the mode that
/// should run as its pre-calculator) at runtime, mirroring
/// `register_solver`'s extensibility hook.
pub fn register_mode(name: &'static str, pre_calculator: Option<&'static str>, is_stochastic: bool) {
    let mut registry = GLOBAL_MODE_REGISTRY.write().expect("calculation-mode registry lock poisoned");
    registry.register(name, pre_calculator, is_stochastic);
}

/// A data-driven calculation-mode identifier, parsed from the
/// `calculation_mode` config key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalculatorKind(&'static str);

impl CalculatorKind {
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn available() -> Vec<&'static str> {
        GLOBAL_MODE_REGISTRY.read().expect("calculation-mode registry lock poisoned").available()
    }

    /// The calculation mode that must run first and hand its store down
    /// as a parent, or `None` if this mode has no pre-calculator.
    pub fn pre_calculator(&self) -> Option<CalculatorKind> {
        let registry = GLOBAL_MODE_REGISTRY.read().expect("calculation-mode registry lock poisoned");
        registry.entry_for(self.0).and_then(|e| e.pre_calculator).map(CalculatorKind)
    }

    /// Whether this mode samples a stochastic event set (event-based,
    /// scenario) rather than computing a closed-form probabilistic result
    /// (classical). Mirrors `BaseCalculator.is_stochastic`.
    pub fn is_stochastic(&self) -> bool {
        let registry = GLOBAL_MODE_REGISTRY.read().expect("calculation-mode registry lock poisoned");
        registry.entry_for(self.0).map(|e| e.is_stochastic).unwrap_or(false)
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for CalculatorKind {
    type Err = CalcError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let registry = GLOBAL_MODE_REGISTRY.read().expect("calculation-mode registry lock poisoned");
        match registry.entry_for(input) {
            Some(entry) => Ok(CalculatorKind(entry.canonical)),
            None => Err(CalcError::UnknownCalculationMode(input.to_string(), registry.available().join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_mode() {
        let kind: CalculatorKind = "classical".parse().unwrap();
        assert_eq!(kind.as_str(), "classical");
        assert!(kind.pre_calculator().is_none());
        assert!(!kind.is_stochastic());
    }

    #[test]
    fn event_based_and_scenario_modes_are_stochastic() {
        let kind: CalculatorKind = "event_based".parse().unwrap();
        assert!(kind.is_stochastic());
        let kind: CalculatorKind = "scenario_risk".parse().unwrap();
        assert!(kind.is_stochastic());
    }

    #[test]
    fn risk_modes_chain_to_their_hazard_precalculator() {
        let kind: CalculatorKind = "classical_risk".parse().unwrap();
        assert_eq!(kind.pre_calculator().unwrap().as_str(), "classical");

        let kind: CalculatorKind = "event_based_risk".parse().unwrap();
        assert_eq!(kind.pre_calculator().unwrap().as_str(), "event_based");
    }

    #[test]
    fn unknown_mode_reports_available_list() {
        let err = "bogus".parse::<CalculatorKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("classical"));
    }

    #[test]
    fn registering_custom_mode_makes_it_parseable() {
        register_mode("custom_mode", None, false);
        let kind: CalculatorKind = "custom_mode".parse().unwrap();
        assert_eq!(kind.as_str(), "custom_mode");
    }
}
