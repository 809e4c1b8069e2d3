use std::error::Error;
use crate::logger::{Logger, LogEvent};
use crate::{errln, logln};

/// Function type for scenario entry functions
pub type ScenarioFn = fn(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn Error>>;

/// Entry in the scenario catalog
#[derive(Clone)]
pub struct ScenarioEntry {
    pub short_name: &'static str,
    pub run: ScenarioFn,
}

inventory::collect!(ScenarioEntry);

/// Get all registered scenarios from the catalog, sorted by name
pub fn get_scenario_catalog() -> Vec<ScenarioEntry> {
    let mut entries: Vec<ScenarioEntry> = inventory::iter::<ScenarioEntry>
        .into_iter()
        .cloned()
        .collect();
    entries.sort_by_key(|entry| entry.short_name);
    entries
}

/// Collects ✓/✗ checks of one scenario and turns them into its result
pub struct Validations {
    errors: Vec<String>,
}

impl Validations {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Log `msg` as passed or failed, remembering failures
    pub fn check(&mut self, passed: bool, msg: String, logger: &mut Logger) {
        if passed {
            logln!(logger, LogEvent::Scenario, "✓ {}", msg);
        } else {
            errln!(logger, LogEvent::Scenario, "✗ {}", msg);
            self.errors.push(msg);
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_result(self, scenario_name: &str) -> Result<(), Box<dyn Error>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(format!("Scenario '{}' validation failed:\n{}", scenario_name, self.errors.join("\n")).into())
        }
    }
}

impl Default for Validations {
    fn default() -> Self {
        Self::new()
    }
}

pub mod budget_pacing;
pub mod exhausted_budget;
pub mod variant_comparison;
