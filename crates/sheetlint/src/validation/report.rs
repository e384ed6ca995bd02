//! Validation report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::observation::{Observation, ObservationType, Severity};

/// Outcome of a validation run that did not fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Dictionary-required fields nobody provided.
    pub missing: BTreeSet<String>,
    /// Non-fatal observations, in detection order.
    pub observations: Vec<Observation>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation unless the same issue is already recorded.
    /// Returns true if it was added.
    pub fn observe(&mut self, observation: Observation) -> bool {
        if self.observations.iter().any(|o| o.same_issue(&observation)) {
            return false;
        }
        match observation.severity {
            Severity::Warning => warn!(
                field = %observation.field,
                kind = observation.observation_type.label(),
                "{}",
                observation.description
            ),
            Severity::Info => info!(
                field = %observation.field,
                kind = observation.observation_type.label(),
                "{}",
                observation.description
            ),
        }
        self.observations.push(observation);
        true
    }

    /// Observations of one type.
    pub fn of_type(&self, observation_type: ObservationType) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(move |o| o.observation_type == observation_type)
    }

    /// True if nothing is missing and nothing was observed.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.observations.is_empty()
    }
}
