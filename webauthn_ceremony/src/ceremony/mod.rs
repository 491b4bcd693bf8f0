mod auth;
mod client;
mod register;
mod state;

use std::time::Duration;

use crate::codec::base64url_encode;

pub use client::CeremonyClient;
pub use state::{CancelHandle, CeremonyOutcome, CeremonyState};

/// Server timeouts are milliseconds; zero or absent means "use the default".
fn timeout_from_millis(timeout: Option<u64>) -> Option<Duration> {
    timeout.filter(|ms| *ms > 0).map(Duration::from_millis)
}

/// Canonical wire form of a credential id: the raw id, base64url encoded.
fn credential_id(display_id: &str, raw_id: &[u8]) -> String {
    let encoded = base64url_encode(raw_id);
    if display_id != encoded {
        tracing::warn!(
            "Credential display id {} differs from its raw id {}, submitting the raw id",
            display_id,
            encoded
        );
    }
    encoded
}
