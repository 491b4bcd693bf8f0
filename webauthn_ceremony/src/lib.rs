//! webauthn_ceremony - client side of the WebAuthn registration and authentication ceremonies
//!
//! This crate fetches challenge options from a relying-party server, decodes
//! them into binary requests for a platform [`Authenticator`], encodes the
//! resulting credential back to base64url JSON and submits it for
//! verification. Each ceremony ends in exactly one notice on a
//! [`NoticeBoard`].

mod authenticator;
mod ceremony;
mod codec;
mod config;
mod errors;
mod notice;
mod types;

pub use authenticator::{
    AssertionCredential, AssertionRequest, AssertionResponse, AttestationCredential,
    AttestationResponse, Authenticator, AuthenticatorError, CreationRequest,
    CredentialDescriptor, CredentialParameter, PublicKeyCredential, RelyingParty,
    SoftAuthenticator, UserEntity,
};

pub use ceremony::{CancelHandle, CeremonyClient, CeremonyOutcome, CeremonyState};

pub use codec::{DecodeError, base64url_decode, base64url_encode};

pub use config::{ClientConfig, ConfigError};

pub use errors::{CeremonyError, FailureReason};

pub use notice::{Notice, NoticeBoard, NoticeKind};

pub use types::{
    AllowCredentialJson, AuthenticationOptionsJson, AuthenticationSubmission, LoginRequest,
    PubKeyCredParam, RegisterRequest, RegistrationOptionsJson, RegistrationSubmission,
    RelyingPartyJson, UserJson,
};
