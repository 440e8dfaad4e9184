//! Error taxonomy for inventory fetches.
//!
//! Every remote call made by the inventory cache either succeeds or fails with
//! one of the two kinds below. Neither kind is retried inside the cache; the
//! caller decides whether the failure is fatal.

use thiserror::Error;

/// Message shown to the user when the account cannot be reached.
pub const CREDENTIALS_HINT: &str =
    "Unable to locate AWS credentials. You can configure credentials by running 'aws configure'.";

/// A failed remote inventory query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The client could not authenticate (missing, invalid or expired credentials).
    #[error("{operation}: credentials rejected or unavailable: {message}")]
    Credentials {
        operation: &'static str,
        message: String,
    },

    /// Network or API failure unrelated to authentication.
    #[error("{operation}: request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
}

impl InventoryError {
    /// Builds an error for `operation`, deciding the kind from the service
    /// error code (if any) and the rendered error text.
    pub fn classify(operation: &'static str, code: Option<&str>, message: String) -> Self {
        if is_credentials_failure(code, &message) {
            Self::Credentials { operation, message }
        } else {
            Self::Transport { operation, message }
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Credentials { operation, .. } | Self::Transport { operation, .. } => operation,
        }
    }

    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials { .. })
    }
}

const CREDENTIAL_CODES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "ExpiredToken",
    "AccessDeniedException",
    "AccessDenied",
    "MissingAuthenticationToken",
];

const CREDENTIAL_MARKERS: &[&str] = &[
    "CredentialsNotLoaded",
    "no credentials",
    "failed to load credentials",
    "the credential provider was not enabled",
    "InvalidClientTokenId",
    "ExpiredToken",
];

fn is_credentials_failure(code: Option<&str>, message: &str) -> bool {
    if let Some(code) = code {
        if CREDENTIAL_CODES.contains(&code) {
            return true;
        }
    }
    let lowered = message.to_lowercase();
    CREDENTIAL_MARKERS
        .iter()
        .any(|marker| lowered.contains(&marker.to_lowercase()))
}
