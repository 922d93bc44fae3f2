//! Generation state machine: states, legal edges and the visited-state trace.

use serde::Serialize;
use std::fmt;

use rfpgen_utils::error::GenerationError;

/// States of one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationPhase {
    Init,
    Phase1Dispatch,
    Phase1Complete,
    Phase2Dispatch,
    Phase2Complete,
    Persisted,
    Failed,
}

impl GenerationPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Phase1Dispatch => "phase1_dispatch",
            Self::Phase1Complete => "phase1_complete",
            Self::Phase2Dispatch => "phase2_dispatch",
            Self::Phase2Complete => "phase2_complete",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }

    /// States reachable in one step from `self`
    #[must_use]
    pub fn legal_next(&self) -> &'static [GenerationPhase] {
        use GenerationPhase::*;
        match self {
            Init => &[Phase1Dispatch, Failed],
            Phase1Dispatch => &[Phase1Complete, Failed],
            // Single-provider runs and runs without Phase 2 persist here
            Phase1Complete => &[Phase2Dispatch, Persisted, Failed],
            // A failed synthesis call degrades to the Phase 1 record
            Phase2Dispatch => &[Phase2Complete, Persisted, Failed],
            Phase2Complete => &[Persisted, Failed],
            Persisted | Failed => &[],
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.legal_next().is_empty()
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every state a request has visited, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTrace {
    visited: Vec<GenerationPhase>,
}

impl Default for PhaseTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTrace {
    /// A trace starting at `Init`
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(GenerationPhase::Init)
    }

    /// A trace resuming from a state reached by an earlier request
    #[must_use]
    pub fn starting_at(phase: GenerationPhase) -> Self {
        Self {
            visited: vec![phase],
        }
    }

    #[must_use]
    pub fn current(&self) -> GenerationPhase {
        // never empty: constructors push the starting state
        self.visited
            .last()
            .copied()
            .unwrap_or(GenerationPhase::Init)
    }

    #[must_use]
    pub fn visited(&self) -> &[GenerationPhase] {
        &self.visited
    }

    /// Check that `target` is reachable in one step from the current state.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidTransition` for an illegal edge.
    pub fn validate_transition(&self, target: GenerationPhase) -> Result<(), GenerationError> {
        let current = self.current();
        if current.legal_next().contains(&target) {
            Ok(())
        } else {
            Err(GenerationError::InvalidTransition {
                from: current.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }

    /// Move to `target` after validating the edge
    pub fn advance(&mut self, target: GenerationPhase) -> Result<(), GenerationError> {
        self.validate_transition(target)?;
        tracing::debug!(from = %self.current(), to = %target, "Generation state transition");
        self.visited.push(target);
        Ok(())
    }
}
