//! Ceremony error taxonomy and the failure reasons shown to the user

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authenticator::AuthenticatorError;

/// Stage at which a ceremony failed, as shown to the user and used in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    ChallengeFetch,
    CeremonyDeclined,
    CeremonyError,
    SubmissionRejected,
    NetworkError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeFetch => "challenge-fetch",
            Self::CeremonyDeclined => "ceremony-declined",
            Self::CeremonyError => "ceremony-error",
            Self::SubmissionRejected => "submission-rejected",
            Self::NetworkError => "network-error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a ceremony.
///
/// Every variant maps onto exactly one [`FailureReason`]; the ceremony
/// boundary converts the first error it sees into the terminal outcome.
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// Challenge endpoint answered non-2xx, or its body was not valid options
    #[error("Challenge fetch failed: {0}")]
    ChallengeFetch(String),

    /// The platform produced no credential (cancelled, refused or timed out)
    #[error("Ceremony declined: {0}")]
    CeremonyDeclined(String),

    /// The platform failed while producing a credential
    #[error("Ceremony error: {0}")]
    Ceremony(#[from] AuthenticatorError),

    /// Verification endpoint answered non-2xx
    #[error("Submission rejected with status {0}")]
    SubmissionRejected(StatusCode),

    /// Transport failure on any request
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CeremonyError {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::ChallengeFetch(_) => FailureReason::ChallengeFetch,
            Self::CeremonyDeclined(_) => FailureReason::CeremonyDeclined,
            Self::Ceremony(_) => FailureReason::CeremonyError,
            Self::SubmissionRejected(_) => FailureReason::SubmissionRejected,
            Self::Network(_) => FailureReason::NetworkError,
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::ChallengeFetch(msg) => tracing::error!("Challenge fetch failed: {}", msg),
            Self::CeremonyDeclined(msg) => tracing::error!("Ceremony declined: {}", msg),
            Self::Ceremony(err) => tracing::error!("Ceremony error: {}", err),
            Self::SubmissionRejected(status) => {
                tracing::error!("Submission rejected with status {}", status)
            }
            Self::Network(err) => tracing::error!("Network error: {}", err),
        }
        self
    }
}
