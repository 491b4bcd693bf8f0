//! JSON bodies exchanged with the relying-party server.
//!
//! One struct per endpoint and direction. Binary fields stay as base64url
//! text here; decoding into bytes happens when the native request is built.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/register`
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub display_name: String,
}

/// Body of `POST /api/login`
#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub name: String,
}

/// Challenge endpoints answer either with the options object itself or
/// wrapped as `{"publicKey": {...}}`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum OptionsEnvelope<T> {
    Wrapped {
        #[serde(rename = "publicKey")]
        public_key: T,
    },
    Bare(T),
}

impl<T> OptionsEnvelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { public_key } => public_key,
            Self::Bare(options) => options,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RelyingPartyJson {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    /// base64url user handle issued by the server
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    /// COSE algorithm identifier, e.g. -7 for ES256
    pub alg: i64,
}

/// Registration options issued by `POST /api/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptionsJson {
    pub challenge: String,
    pub rp: RelyingPartyJson,
    pub user: UserJson,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub attestation: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllowCredentialJson {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    #[serde(default)]
    pub transports: Vec<String>,
}

/// Authentication options issued by `POST /api/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptionsJson {
    pub challenge: String,
    #[serde(default)]
    pub allow_credentials: Vec<AllowCredentialJson>,
    /// Milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub rp_id: Option<String>,
    #[serde(default)]
    pub user_verification: Option<String>,
}

/// Body of `POST /api/register/response`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSubmission {
    /// User handle exactly as the server issued it
    pub id: String,
    pub credential_id: String,
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
}

/// Body of `POST /api/login/response`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSubmission {
    pub name: String,
    pub credential_id: String,
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
}
