//! Advisory Hook
//!
//! An optional external collaborator that may propose free-text remediation
//! for a violation. Strictly advisory: suggestions are attached to the
//! rendered report only after the pass/fail decision is computed, so an
//! absent, slow or failing advisor can never change the gate's outcome.

use crate::modules::Violation;

/// Remediation-suggestion provider
pub trait Advisor: Send + Sync {
    /// A suggestion for the violation, or `None` when the advisor has
    /// nothing to say (including any internal failure)
    fn suggest(&self, violation: &Violation) -> Option<String>;
}

/// Default advisor that never suggests anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdvisor;

impl Advisor for NoopAdvisor {
    fn suggest(&self, _violation: &Violation) -> Option<String> {
        None
    }
}
