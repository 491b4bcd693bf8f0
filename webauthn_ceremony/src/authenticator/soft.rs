use async_trait::async_trait;
use ciborium::value::Value as CborValue;
use ring::{
    digest,
    rand::{SecureRandom, SystemRandom},
    signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair},
};
use tokio::sync::Mutex;

use super::{
    AssertionCredential, AssertionRequest, AssertionResponse, AttestationCredential,
    AttestationResponse, Authenticator, AuthenticatorError, CreationRequest, PublicKeyCredential,
};
use crate::codec::base64url_encode;

const COSE_ALG_ES256: i64 = -7;

const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_USER_VERIFIED: u8 = 0x04;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

const CREDENTIAL_ID_LEN: usize = 32;

struct StoredCredential {
    id: Vec<u8>,
    rp_id: String,
    user_handle: Vec<u8>,
    pkcs8: Vec<u8>,
    sign_count: u32,
}

/// In-memory ES256 authenticator.
///
/// Keys live only as long as the instance. Produces `none` attestation and
/// real P-256 signatures, which is enough for a relying party to verify both
/// ceremonies end to end.
pub struct SoftAuthenticator {
    origin: String,
    declining: bool,
    rng: SystemRandom,
    credentials: Mutex<Vec<StoredCredential>>,
}

impl SoftAuthenticator {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            declining: false,
            rng: SystemRandom::new(),
            credentials: Mutex::new(Vec::new()),
        }
    }

    /// An authenticator whose user dismisses every prompt
    pub fn declining(origin: impl Into<String>) -> Self {
        Self {
            declining: true,
            ..Self::new(origin)
        }
    }

    pub async fn credential_count(&self) -> usize {
        self.credentials.lock().await.len()
    }

    fn client_data(&self, type_: &str, challenge: &[u8]) -> Result<Vec<u8>, AuthenticatorError> {
        serde_json::to_vec(&serde_json::json!({
            "type": type_,
            "challenge": base64url_encode(challenge),
            "origin": self.origin,
            "crossOrigin": false,
        }))
        .map_err(|e| AuthenticatorError::Encoding(e.to_string()))
    }

    fn default_rp_id(&self) -> Result<String, AuthenticatorError> {
        url::Url::parse(&self.origin)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| {
                AuthenticatorError::Platform(format!("Cannot derive RP ID from {}", self.origin))
            })
    }
}

#[async_trait]
impl Authenticator for SoftAuthenticator {
    async fn create(
        &self,
        request: &CreationRequest,
    ) -> Result<Option<AttestationCredential>, AuthenticatorError> {
        if self.declining {
            tracing::debug!("Soft authenticator declined credential creation");
            return Ok(None);
        }

        if !request
            .pub_key_cred_params
            .iter()
            .any(|p| p.type_ == "public-key" && p.alg == COSE_ALG_ES256)
        {
            return Err(AuthenticatorError::UnsupportedAlgorithm(
                request.pub_key_cred_params.iter().map(|p| p.alg).collect(),
            ));
        }

        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &self.rng)
            .map_err(|_| AuthenticatorError::Crypto("Failed to generate key pair".into()))?;
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &self.rng)
                .map_err(|e| AuthenticatorError::Crypto(e.to_string()))?;

        let mut credential_id = vec![0u8; CREDENTIAL_ID_LEN];
        self.rng
            .fill(&mut credential_id)
            .map_err(|_| AuthenticatorError::Crypto("Failed to generate credential id".into()))?;

        let cose_key = cose_es256_key(key_pair.public_key().as_ref())?;

        let mut auth_data = authenticator_data(
            &request.rp.id,
            FLAG_USER_PRESENT | FLAG_USER_VERIFIED | FLAG_ATTESTED_CREDENTIAL_DATA,
            0,
        );
        auth_data.extend_from_slice(&[0u8; 16]); // aaguid
        auth_data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        auth_data.extend_from_slice(&credential_id);
        auth_data.extend_from_slice(&cose_key);

        let attestation_object = to_cbor(&CborValue::Map(vec![
            (CborValue::Text("fmt".into()), CborValue::Text("none".into())),
            (CborValue::Text("attStmt".into()), CborValue::Map(vec![])),
            (CborValue::Text("authData".into()), CborValue::Bytes(auth_data)),
        ]))?;

        let client_data_json = self.client_data("webauthn.create", &request.challenge)?;

        self.credentials.lock().await.push(StoredCredential {
            id: credential_id.clone(),
            rp_id: request.rp.id.clone(),
            user_handle: request.user.id.clone(),
            pkcs8: pkcs8.as_ref().to_vec(),
            sign_count: 0,
        });

        tracing::debug!(
            "Soft authenticator created credential for {} on {}",
            request.user.name,
            request.rp.id
        );

        Ok(Some(PublicKeyCredential {
            id: base64url_encode(&credential_id),
            raw_id: credential_id,
            response: AttestationResponse {
                attestation_object,
                client_data_json,
            },
        }))
    }

    async fn get(
        &self,
        request: &AssertionRequest,
    ) -> Result<Option<AssertionCredential>, AuthenticatorError> {
        if self.declining {
            tracing::debug!("Soft authenticator declined assertion");
            return Ok(None);
        }

        let rp_id = match &request.rp_id {
            Some(rp_id) => rp_id.clone(),
            None => self.default_rp_id()?,
        };

        let mut credentials = self.credentials.lock().await;
        let Some(stored) = credentials.iter_mut().find(|c| {
            c.rp_id == rp_id
                && (request.allow_credentials.is_empty()
                    || request.allow_credentials.iter().any(|d| d.id == c.id))
        }) else {
            tracing::debug!("Soft authenticator has no matching credential for {}", rp_id);
            return Ok(None);
        };

        let sign_count = stored.sign_count.wrapping_add(1);
        let auth_data = authenticator_data(
            &rp_id,
            FLAG_USER_PRESENT | FLAG_USER_VERIFIED,
            sign_count,
        );
        let client_data_json = self.client_data("webauthn.get", &request.challenge)?;

        let client_data_hash = digest::digest(&digest::SHA256, &client_data_json);
        let mut signed_data = auth_data.clone();
        signed_data.extend_from_slice(client_data_hash.as_ref());

        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &stored.pkcs8, &self.rng)
                .map_err(|e| AuthenticatorError::Crypto(e.to_string()))?;
        let signature = key_pair
            .sign(&self.rng, &signed_data)
            .map_err(|_| AuthenticatorError::Crypto("Failed to sign assertion".into()))?;
        stored.sign_count = sign_count;

        Ok(Some(PublicKeyCredential {
            id: base64url_encode(&stored.id),
            raw_id: stored.id.clone(),
            response: AssertionResponse {
                authenticator_data: auth_data,
                client_data_json,
                signature: signature.as_ref().to_vec(),
                user_handle: Some(stored.user_handle.clone()),
            },
        }))
    }
}

/// rpIdHash (32) | flags (1) | signCount (4, big endian)
fn authenticator_data(rp_id: &str, flags: u8, sign_count: u32) -> Vec<u8> {
    let mut data = digest::digest(&digest::SHA256, rp_id.as_bytes())
        .as_ref()
        .to_vec();
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data
}

/// COSE_Key for an uncompressed SEC1 P-256 point (`0x04 | x | y`)
fn cose_es256_key(public_key: &[u8]) -> Result<Vec<u8>, AuthenticatorError> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(AuthenticatorError::Crypto(
            "Unexpected public key encoding".into(),
        ));
    }

    to_cbor(&CborValue::Map(vec![
        (CborValue::Integer(1i64.into()), CborValue::Integer(2i64.into())),
        (
            CborValue::Integer(3i64.into()),
            CborValue::Integer(COSE_ALG_ES256.into()),
        ),
        (CborValue::Integer((-1i64).into()), CborValue::Integer(1i64.into())),
        (
            CborValue::Integer((-2i64).into()),
            CborValue::Bytes(public_key[1..33].to_vec()),
        ),
        (
            CborValue::Integer((-3i64).into()),
            CborValue::Bytes(public_key[33..65].to_vec()),
        ),
    ]))
}

fn to_cbor(value: &CborValue) -> Result<Vec<u8>, AuthenticatorError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| AuthenticatorError::Encoding(e.to_string()))?;
    Ok(buf)
}
