use std::sync::Arc;

use tokio::sync::Notify;

use crate::errors::FailureReason;

/// Where a ceremony currently stands.
///
/// A run moves `Requesting -> Ceremony -> Submitting -> Succeeded`, or jumps
/// from any of the three working states straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    /// No ceremony has run on this client yet
    Idle,
    /// Waiting for the server to issue options
    Requesting,
    /// Native credential creation or assertion in progress
    Ceremony,
    /// Posting the credential to the server
    Submitting,
    Succeeded,
    Failed(FailureReason),
}

impl CeremonyState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Requesting | Self::Ceremony | Self::Submitting)
    }
}

/// Terminal result of one ceremony run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyOutcome {
    Succeeded,
    Failed(FailureReason),
}

impl CeremonyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Succeeded => None,
            Self::Failed(reason) => Some(*reason),
        }
    }
}

impl From<CeremonyOutcome> for CeremonyState {
    fn from(outcome: CeremonyOutcome) -> Self {
        match outcome {
            CeremonyOutcome::Succeeded => Self::Succeeded,
            CeremonyOutcome::Failed(reason) => Self::Failed(reason),
        }
    }
}

/// Aborts the native step of the ceremony currently in flight.
///
/// Cancelling while no native step is waiting has no effect; it does not
/// carry over to the next ceremony.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    pub(super) notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        tracing::debug!("Ceremony cancellation requested");
        self.notify.notify_waiters();
    }
}
