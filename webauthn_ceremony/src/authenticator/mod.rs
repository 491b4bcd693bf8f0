//! The native credential ceremony as a capability.
//!
//! A [`CeremonyClient`](crate::CeremonyClient) never talks to a platform API
//! directly. It hands fully decoded, binary requests to an [`Authenticator`]
//! and gets back binary credentials, or nothing when the user or platform
//! declined.

mod soft;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use soft::SoftAuthenticator;

/// Failures reported by the platform itself, as opposed to a decline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticatorError {
    #[error("No supported public key algorithm offered: {0:?}")]
    UnsupportedAlgorithm(Vec<i64>),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialParameter {
    pub type_: String,
    pub alg: i64,
}

/// Decoded input for `navigator.credentials.create()`-style calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    pub timeout: Option<Duration>,
    pub attestation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub type_: String,
    pub id: Vec<u8>,
    pub transports: Vec<String>,
}

/// Decoded input for `navigator.credentials.get()`-style calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRequest {
    pub challenge: Vec<u8>,
    pub rp_id: Option<String>,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub timeout: Option<Duration>,
    pub user_verification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResponse {
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResponse {
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// A public key credential as returned by the platform.
///
/// `id` is the platform's display form of the credential id; `raw_id` holds
/// the bytes it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyCredential<R> {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub response: R,
}

pub type AttestationCredential = PublicKeyCredential<AttestationResponse>;
pub type AssertionCredential = PublicKeyCredential<AssertionResponse>;

/// Platform binding for the credential ceremony.
///
/// `Ok(None)` means no credential was produced: the user cancelled, the
/// platform refused, or no matching credential exists. `Err` is reserved for
/// the platform failing outright.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn create(
        &self,
        request: &CreationRequest,
    ) -> Result<Option<AttestationCredential>, AuthenticatorError>;

    async fn get(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<AssertionCredential>, AuthenticatorError>;
}

#[async_trait]
impl<A: Authenticator + ?Sized> Authenticator for std::sync::Arc<A> {
    async fn create(
        &self,
        request: &CreationRequest,
    ) -> Result<Option<AttestationCredential>, AuthenticatorError> {
        (**self).create(request).await
    }

    async fn get(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<AssertionCredential>, AuthenticatorError> {
        (**self).get(request).await
    }
}
