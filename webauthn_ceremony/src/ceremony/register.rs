use super::client::CeremonyClient;
use super::state::{CeremonyOutcome, CeremonyState};

use crate::authenticator::{
    AttestationCredential, Authenticator, CreationRequest, CredentialParameter, RelyingParty,
    UserEntity,
};
use crate::codec::{base64url_decode, base64url_encode};
use crate::errors::CeremonyError;
use crate::types::{RegisterRequest, RegistrationOptionsJson, RegistrationSubmission};

pub(crate) const REGISTER_PATH: &str = "/api/register";
pub(crate) const REGISTER_RESPONSE_PATH: &str = "/api/register/response";

impl<A: Authenticator> CeremonyClient<A> {
    /// Register a new credential for `name`.
    pub async fn register(&mut self, name: &str, display_name: &str) -> CeremonyOutcome {
        let result = self.run_registration(name, display_name).await;
        self.conclude(result, "Successfully registered.", "Failed to register.")
            .await
    }

    async fn run_registration(&self, name: &str, display_name: &str) -> Result<(), CeremonyError> {
        self.enter(CeremonyState::Requesting);

        let request = RegisterRequest {
            name: name.to_string(),
            display_name: display_name.to_string(),
        };
        let options: RegistrationOptionsJson = self.fetch_options(REGISTER_PATH, &request).await?;
        tracing::debug!("Registration options: {:?}", options);

        let creation = creation_request(&options)?;
        let credential = self
            .await_native(self.authenticator.create(&creation), creation.timeout)
            .await?;

        let submission = registration_submission(&options.user.id, credential);
        self.submit(REGISTER_RESPONSE_PATH, &submission).await
    }
}

/// Decode server-issued registration options into the native request.
pub(crate) fn creation_request(
    options: &RegistrationOptionsJson,
) -> Result<CreationRequest, CeremonyError> {
    let challenge = base64url_decode(&options.challenge)
        .map_err(|e| CeremonyError::ChallengeFetch(format!("Invalid challenge: {e}")))?;
    let user_id = base64url_decode(&options.user.id)
        .map_err(|e| CeremonyError::ChallengeFetch(format!("Invalid user id: {e}")))?;

    Ok(CreationRequest {
        challenge,
        rp: RelyingParty {
            id: options.rp.id.clone(),
            name: options.rp.name.clone(),
        },
        user: UserEntity {
            id: user_id,
            name: options.user.name.clone(),
            display_name: options.user.display_name.clone(),
        },
        pub_key_cred_params: options
            .pub_key_cred_params
            .iter()
            .map(|p| CredentialParameter {
                type_: p.type_.clone(),
                alg: p.alg,
            })
            .collect(),
        timeout: super::timeout_from_millis(options.timeout),
        attestation: options.attestation.clone(),
    })
}

/// Encode a created credential for `POST /api/register/response`.
///
/// `user_id` is echoed in the server's own encoding, not re-encoded.
pub(crate) fn registration_submission(
    user_id: &str,
    credential: AttestationCredential,
) -> RegistrationSubmission {
    RegistrationSubmission {
        id: user_id.to_string(),
        credential_id: super::credential_id(&credential.id, &credential.raw_id),
        attestation_object: base64url_encode(&credential.response.attestation_object),
        client_data_json: base64url_encode(&credential.response.client_data_json),
    }
}
