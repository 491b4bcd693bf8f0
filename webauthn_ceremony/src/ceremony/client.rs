use std::{future::Future, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Notify, watch};

use super::state::{CancelHandle, CeremonyOutcome, CeremonyState};
use crate::authenticator::{Authenticator, AuthenticatorError};
use crate::config::ClientConfig;
use crate::errors::CeremonyError;
use crate::notice::NoticeBoard;
use crate::types::OptionsEnvelope;

/// Drives registration and authentication ceremonies against one
/// relying-party server.
///
/// Each ceremony runs strictly as fetch options, native ceremony, submit,
/// and ends with exactly one notice on the [`NoticeBoard`]. Nothing is
/// retried. The ceremony methods take `&mut self`, so a single client can
/// never have two ceremonies in flight.
pub struct CeremonyClient<A> {
    pub(super) config: ClientConfig,
    http: reqwest::Client,
    pub(super) authenticator: A,
    notices: NoticeBoard,
    state: watch::Sender<CeremonyState>,
    cancel: Arc<Notify>,
}

impl<A: Authenticator> CeremonyClient<A> {
    pub fn new(config: ClientConfig, authenticator: A) -> Result<Self, CeremonyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            http,
            authenticator,
            notices: NoticeBoard::new(),
            state: watch::Sender::new(CeremonyState::Idle),
            cancel: Arc::new(Notify::new()),
        })
    }

    /// Report outcomes to an existing board instead of a fresh one
    pub fn with_notice_board(mut self, notices: NoticeBoard) -> Self {
        self.notices = notices;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn state(&self) -> CeremonyState {
        *self.state.borrow()
    }

    /// Watch state transitions, e.g. to disable a trigger while in flight
    pub fn subscribe(&self) -> watch::Receiver<CeremonyState> {
        self.state.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            notify: self.cancel.clone(),
        }
    }

    pub(super) fn enter(&self, state: CeremonyState) {
        tracing::debug!("Ceremony state: {:?}", state);
        self.state.send_replace(state);
    }

    /// Turn the result of one run into the terminal state and its notice.
    pub(super) async fn conclude(
        &self,
        result: Result<(), CeremonyError>,
        success_message: &str,
        failure_message: &str,
    ) -> CeremonyOutcome {
        let outcome = match result {
            Ok(()) => {
                tracing::info!("{}", success_message);
                self.notices.success(success_message).await;
                CeremonyOutcome::Succeeded
            }
            Err(e) => {
                let reason = e.log().reason();
                self.notices.failure(failure_message, reason).await;
                CeremonyOutcome::Failed(reason)
            }
        };
        self.enter(outcome.into());
        outcome
    }

    /// POST to a challenge endpoint and parse the options it issues.
    pub(super) async fn fetch_options<B, T>(&self, path: &str, body: &B) -> Result<T, CeremonyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!("Requesting options from {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CeremonyError::ChallengeFetch(format!(
                "{url} answered with status {status}"
            )));
        }

        let bytes = response.bytes().await?;
        let envelope: OptionsEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| CeremonyError::ChallengeFetch(format!("Invalid options from {url}: {e}")))?;

        Ok(envelope.into_inner())
    }

    /// Run the native step, bounded by `timeout` and by user cancellation.
    pub(super) async fn await_native<T, F>(
        &self,
        pending: F,
        timeout: Option<Duration>,
    ) -> Result<T, CeremonyError>
    where
        F: Future<Output = Result<Option<T>, AuthenticatorError>>,
    {
        let limit = timeout.unwrap_or(self.config.ceremony_timeout);
        // Registered before the state change so a cancel issued in reaction to it is seen
        let cancelled = self.cancel.notified();
        self.enter(CeremonyState::Ceremony);

        tokio::select! {
            result = tokio::time::timeout(limit, pending) => match result {
                Ok(Ok(Some(credential))) => Ok(credential),
                Ok(Ok(None)) => Err(CeremonyError::CeremonyDeclined(
                    "No credential returned".to_string(),
                )),
                Ok(Err(e)) => Err(CeremonyError::Ceremony(e)),
                Err(_) => Err(CeremonyError::CeremonyDeclined(format!(
                    "Timed out after {limit:?}"
                ))),
            },
            _ = cancelled => Err(CeremonyError::CeremonyDeclined(
                "Cancelled by user".to_string(),
            )),
        }
    }

    /// POST a credential to a verification endpoint.
    pub(super) async fn submit<B>(&self, path: &str, body: &B) -> Result<(), CeremonyError>
    where
        B: Serialize + ?Sized,
    {
        self.enter(CeremonyState::Submitting);

        let url = self.config.endpoint(path);
        tracing::debug!("Submitting credential to {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CeremonyError::SubmissionRejected(status));
        }

        Ok(())
    }
}
