use std::time::Duration;

use crate::model::PolicyCatalog;

/// Minimum display delays attached to emitted turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// How long the assistant "types" before each of its turns.
    pub typing: Duration,
    /// Pause before the main menu returns after an analysis result.
    pub result_read: Duration,
    /// Pause before the main menu returns after a simulation result.
    pub simulation_read: Duration,
    /// Pause before the main menu returns after the empty-documents warning.
    pub empty_guard: Duration,
}

impl Pacing {
    /// No delays at all; what tests and batch drivers want.
    pub fn instant() -> Self {
        Self {
            typing: Duration::ZERO,
            result_read: Duration::ZERO,
            simulation_read: Duration::ZERO,
            empty_guard: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            typing: Duration::from_millis(1200),
            result_read: Duration::from_millis(2000),
            simulation_read: Duration::from_millis(3000),
            empty_guard: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowConfig {
    pub pacing: Pacing,
    pub catalog: PolicyCatalog,
}

impl FlowConfig {
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_catalog(mut self, catalog: PolicyCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}
