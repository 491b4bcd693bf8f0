//! Axum-based mock relying-party server
//!
//! Every test spawns its own instance on an ephemeral port, so tests never
//! share state. The server serves the four ceremony endpoints, records each
//! request body it receives, and answers with configurable status codes.
//! In verifying mode it checks client data, attestation and signatures the
//! way a real relying party would.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
};
use ciborium::value::Value as CborValue;
use ring::{
    digest,
    signature::{ECDSA_P256_SHA256_ASN1, UnparsedPublicKey},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use webauthn_ceremony::base64url_decode;

pub const REGISTER_CHALLENGE: &str = "AQID";
pub const LOGIN_CHALLENGE: &str = "CQkJ";
pub const RP_ID: &str = "localhost";

/// A request body as the mock received it
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

#[derive(Clone, Debug)]
struct StoredCredential {
    credential_id: String,
    public_key: Vec<u8>,
}

/// Mutable behaviour of the mock; tweak before running a ceremony
#[derive(Debug)]
pub struct MockConfig {
    pub register_status: StatusCode,
    pub register_body: Value,
    pub register_response_status: StatusCode,
    pub login_status: StatusCode,
    pub login_body: Value,
    pub login_response_status: StatusCode,
    /// Verify submissions cryptographically instead of using fixed statuses
    pub verify: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            register_status: StatusCode::OK,
            register_body: registration_options(),
            register_response_status: StatusCode::OK,
            login_status: StatusCode::OK,
            login_body: authentication_options(&[]),
            login_response_status: StatusCode::OK,
            verify: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MockRpState {
    pub config: Arc<Mutex<MockConfig>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    credentials: Arc<Mutex<Vec<StoredCredential>>>,
}

impl MockRpState {
    fn record(&self, path: &str, body: &Value) {
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            body: body.clone(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .map(|r| r.body)
            .collect()
    }
}

/// Handle to a running mock server
pub struct MockRpServer {
    pub base_url: String,
    pub state: MockRpState,
}

impl MockRpServer {
    pub async fn start() -> Self {
        Self::start_with(MockConfig::default()).await
    }

    pub async fn start_with(config: MockConfig) -> Self {
        let state = MockRpState {
            config: Arc::new(Mutex::new(config)),
            ..Default::default()
        };

        let app = Router::new()
            .route("/api/register", post(register))
            .route("/api/register/response", post(register_response))
            .route("/api/login", post(login))
            .route("/api/login/response", post(login_response))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock server stopped unexpectedly");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn configure(&self, f: impl FnOnce(&mut MockConfig)) {
        f(&mut self.state.config.lock().unwrap());
    }
}

/// Registration options in the shape the sample server issues them
pub fn registration_options() -> Value {
    json!({
        "publicKey": {
            "challenge": REGISTER_CHALLENGE,
            "rp": {"id": RP_ID, "name": "Sample WebAuthn Server."},
            "user": {"id": "dXNlci1oYW5kbGU", "name": "user2", "displayName": "User2"},
            "pubKeyCredParams": [
                {"type": "public-key", "alg": -7},
                {"type": "public-key", "alg": -257}
            ],
            "timeout": 60000,
            "attestation": "none"
        }
    })
}

pub fn authentication_options(credential_ids: &[&str]) -> Value {
    let allow: Vec<Value> = credential_ids
        .iter()
        .map(|id| json!({"type": "public-key", "id": id, "transports": ["internal"]}))
        .collect();
    json!({
        "challenge": LOGIN_CHALLENGE,
        "allowCredentials": allow,
        "rpId": RP_ID
    })
}

async fn register(State(state): State<MockRpState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.record("/api/register", &body);
    let config = state.config.lock().unwrap();
    (config.register_status, Json(config.register_body.clone()))
}

async fn register_response(
    State(state): State<MockRpState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record("/api/register/response", &body);
    let (verify, status) = {
        let config = state.config.lock().unwrap();
        (config.verify, config.register_response_status)
    };

    if !verify {
        return (status, Json(json!({"status": "ok"})));
    }

    match verify_registration(&body) {
        Ok(credential) => {
            state.credentials.lock().unwrap().push(credential);
            (StatusCode::OK, Json(json!({"status": "ok"})))
        }
        Err(detail) => (StatusCode::BAD_REQUEST, Json(json!({"detail": detail}))),
    }
}

async fn login(State(state): State<MockRpState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.record("/api/login", &body);
    let config = state.config.lock().unwrap();
    if config.verify {
        let credentials = state.credentials.lock().unwrap();
        let ids: Vec<&str> = credentials
            .iter()
            .map(|c| c.credential_id.as_str())
            .collect();
        return (StatusCode::OK, Json(json!({"publicKey": authentication_options(&ids)})));
    }
    (config.login_status, Json(config.login_body.clone()))
}

async fn login_response(
    State(state): State<MockRpState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record("/api/login/response", &body);
    let (verify, status) = {
        let config = state.config.lock().unwrap();
        (config.verify, config.login_response_status)
    };

    if !verify {
        return (status, Json(json!({"status": "ok"})));
    }

    let credentials = state.credentials.lock().unwrap().clone();
    match verify_assertion(&body, &credentials) {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(detail) => (StatusCode::BAD_REQUEST, Json(json!({"detail": detail}))),
    }
}

fn field(body: &Value, name: &str) -> Result<Vec<u8>, String> {
    let text = body[name]
        .as_str()
        .ok_or_else(|| format!("Missing {name}"))?;
    base64url_decode(text).map_err(|e| format!("Bad {name}: {e}"))
}

fn check_client_data(raw: &[u8], type_: &str, challenge: &str) -> Result<(), String> {
    let client_data: Value = serde_json::from_slice(raw).map_err(|e| e.to_string())?;
    if client_data["type"] != type_ {
        return Err(format!("Invalid type {}", client_data["type"]));
    }
    if client_data["challenge"] != challenge {
        return Err("Invalid challenge".to_string());
    }
    Ok(())
}

fn cbor_get<'a>(map: &'a [(CborValue, CborValue)], key: CborValue) -> Result<&'a CborValue, String> {
    map.iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .ok_or_else(|| format!("Missing CBOR key {key:?}"))
}

fn verify_registration(body: &Value) -> Result<StoredCredential, String> {
    check_client_data(&field(body, "clientDataJSON")?, "webauthn.create", REGISTER_CHALLENGE)?;

    let attestation: CborValue =
        ciborium::de::from_reader(field(body, "attestationObject")?.as_slice())
            .map_err(|e| e.to_string())?;
    let CborValue::Map(attestation) = attestation else {
        return Err("Attestation object is not a map".to_string());
    };
    if cbor_get(&attestation, CborValue::Text("fmt".into()))? != &CborValue::Text("none".into()) {
        return Err("Unsupported attestation".to_string());
    }
    let CborValue::Bytes(auth_data) = cbor_get(&attestation, CborValue::Text("authData".into()))?
    else {
        return Err("authData is not bytes".to_string());
    };

    if auth_data[..32] != *digest::digest(&digest::SHA256, RP_ID.as_bytes()).as_ref() {
        return Err("RP ID hash mismatch".to_string());
    }

    let id_len = u16::from_be_bytes([auth_data[53], auth_data[54]]) as usize;
    let credential_id = auth_data[55..55 + id_len].to_vec();
    if credential_id != field(body, "credentialId")? {
        return Err("Credential id mismatch".to_string());
    }

    let cose: CborValue =
        ciborium::de::from_reader(&auth_data[55 + id_len..]).map_err(|e| e.to_string())?;
    let CborValue::Map(cose) = cose else {
        return Err("COSE key is not a map".to_string());
    };
    let (CborValue::Bytes(x), CborValue::Bytes(y)) = (
        cbor_get(&cose, CborValue::Integer((-2i64).into()))?,
        cbor_get(&cose, CborValue::Integer((-3i64).into()))?,
    ) else {
        return Err("Invalid COSE coordinates".to_string());
    };

    let mut public_key = vec![0x04];
    public_key.extend_from_slice(x);
    public_key.extend_from_slice(y);

    Ok(StoredCredential {
        credential_id: body["credentialId"].as_str().unwrap_or_default().to_string(),
        public_key,
    })
}

fn verify_assertion(body: &Value, credentials: &[StoredCredential]) -> Result<(), String> {
    let credential_id = body["credentialId"]
        .as_str()
        .ok_or_else(|| "Missing credentialId".to_string())?;
    let credential = credentials
        .iter()
        .find(|c| c.credential_id == credential_id)
        .ok_or_else(|| "Unknown credential".to_string())?;

    let client_data = field(body, "clientDataJSON")?;
    check_client_data(&client_data, "webauthn.get", LOGIN_CHALLENGE)?;

    let mut signed_data = field(body, "authenticatorData")?;
    signed_data.extend_from_slice(digest::digest(&digest::SHA256, &client_data).as_ref());

    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &credential.public_key)
        .verify(&signed_data, &field(body, "signature")?)
        .map_err(|_| "Invalid signature".to_string())
}
