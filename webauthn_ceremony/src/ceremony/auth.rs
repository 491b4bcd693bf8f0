use super::client::CeremonyClient;
use super::state::{CeremonyOutcome, CeremonyState};

use crate::authenticator::{AssertionCredential, AssertionRequest, Authenticator, CredentialDescriptor};
use crate::codec::{base64url_decode, base64url_encode};
use crate::errors::CeremonyError;
use crate::types::{AuthenticationOptionsJson, AuthenticationSubmission, LoginRequest};

pub(crate) const LOGIN_PATH: &str = "/api/login";
pub(crate) const LOGIN_RESPONSE_PATH: &str = "/api/login/response";

impl<A: Authenticator> CeremonyClient<A> {
    /// Authenticate `name` with a previously registered credential.
    pub async fn authenticate(&mut self, name: &str) -> CeremonyOutcome {
        let result = self.run_authentication(name).await;
        self.conclude(result, "Successfully logged in.", "Failed to login.")
            .await
    }

    async fn run_authentication(&self, name: &str) -> Result<(), CeremonyError> {
        self.enter(CeremonyState::Requesting);

        let request = LoginRequest {
            name: name.to_string(),
        };
        let options: AuthenticationOptionsJson = self.fetch_options(LOGIN_PATH, &request).await?;
        tracing::debug!("Authentication options: {:?}", options);

        let assertion = assertion_request(&options)?;
        let credential = self
            .await_native(self.authenticator.get(&assertion), assertion.timeout)
            .await?;

        let submission = authentication_submission(name, credential);
        self.submit(LOGIN_RESPONSE_PATH, &submission).await
    }
}

/// Decode server-issued authentication options into the native request.
///
/// Every allowed credential id is decoded on its own; one bad id fails the
/// whole request.
pub(crate) fn assertion_request(
    options: &AuthenticationOptionsJson,
) -> Result<AssertionRequest, CeremonyError> {
    let challenge = base64url_decode(&options.challenge)
        .map_err(|e| CeremonyError::ChallengeFetch(format!("Invalid challenge: {e}")))?;

    let allow_credentials = options
        .allow_credentials
        .iter()
        .map(|descriptor| {
            let id = base64url_decode(&descriptor.id).map_err(|e| {
                CeremonyError::ChallengeFetch(format!(
                    "Invalid credential id {}: {e}",
                    descriptor.id
                ))
            })?;
            Ok(CredentialDescriptor {
                type_: descriptor.type_.clone(),
                id,
                transports: descriptor.transports.clone(),
            })
        })
        .collect::<Result<Vec<_>, CeremonyError>>()?;

    Ok(AssertionRequest {
        challenge,
        rp_id: options.rp_id.clone(),
        allow_credentials,
        timeout: super::timeout_from_millis(options.timeout),
        user_verification: options.user_verification.clone(),
    })
}

/// Encode an assertion for `POST /api/login/response`.
pub(crate) fn authentication_submission(
    name: &str,
    credential: AssertionCredential,
) -> AuthenticationSubmission {
    AuthenticationSubmission {
        name: name.to_string(),
        credential_id: super::credential_id(&credential.id, &credential.raw_id),
        authenticator_data: base64url_encode(&credential.response.authenticator_data),
        client_data_json: base64url_encode(&credential.response.client_data_json),
        signature: base64url_encode(&credential.response.signature),
    }
}
