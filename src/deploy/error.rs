// ABOUTME: Phase-typed error aggregates for blue/green deployments.
// ABOUTME: Callers discriminate on the failing phase without string-matching.

use std::fmt;
use thiserror::Error;

use crate::pusher::PusherError;

/// One foundation's failure within a phase.
#[derive(Debug)]
pub struct FoundationError {
    pub foundation: String,
    pub error: PusherError,
}

impl fmt::Display for FoundationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.foundation, self.error)
    }
}

/// Per-foundation errors collected across one phase, in foundation order.
///
/// A phase failed iff its error set is non-empty after the fan-out completes.
#[derive(Debug, Default)]
pub struct PhaseErrors(Vec<FoundationError>);

impl PhaseErrors {
    /// Pair fan-out results with their foundations, keeping only failures.
    /// Results must be in foundation order; the collected set preserves it.
    pub fn collect<'a, I>(foundations: I, results: Vec<Result<(), PusherError>>) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let errors = foundations
            .into_iter()
            .zip(results)
            .filter_map(|(foundation, result)| {
                result.err().map(|error| FoundationError {
                    foundation: foundation.clone(),
                    error,
                })
            })
            .collect();
        Self(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoundationError> {
        self.0.iter()
    }
}

impl fmt::Display for PhaseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Errors from a blue/green deployment, typed by the phase that failed.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Worker construction failed; no deployment occurred. The factory's
    /// error is surfaced unchanged.
    #[error(transparent)]
    Factory(PusherError),

    /// At least one login failed; no push was attempted.
    #[error("login failed: {0}")]
    Login(PhaseErrors),

    /// At least one push failed and every foundation was restored (or this
    /// was a first deploy everywhere, where no rollback is claimed).
    #[error("push failed: {0}")]
    Push(PhaseErrors),

    /// At least one push failed and at least one rollback also failed; some
    /// foundations may be left without the previous release.
    #[error("push failed: {push}; rollback failed: {rollback}")]
    Rollback {
        push: PhaseErrors,
        rollback: PhaseErrors,
    },

    /// Every push succeeded but at least one venerable cleanup failed.
    #[error("finish push failed: {0}")]
    FinishPush(PhaseErrors),
}
