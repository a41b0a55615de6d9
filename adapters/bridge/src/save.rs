//! Save codec for persistent progress.
//!
//! Saves are single-line strings of the form `stadium:v1:<payload>` where the
//! payload is unpadded base64 of a JSON document.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use stadium_wave_core::Progress;

const SAVE_DOMAIN: &str = "stadium";
const SAVE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded save payload.
pub const SAVE_HEADER: &str = "stadium:v1";
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while decoding save strings.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The provided string was empty or contained only whitespace.
    #[error("save payload was empty")]
    EmptyPayload,
    /// The encoded save did not contain a version segment.
    #[error("save string is missing the version")]
    MissingVersion,
    /// The encoded save did not include the payload segment.
    #[error("save string is missing the payload")]
    MissingPayload,
    /// The encoded save used an unexpected prefix segment.
    #[error("save prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded save used an unsupported version identifier.
    #[error("save version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode save payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse save payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Encodes progress into a single-line save string.
///
/// # Errors
///
/// Returns [`SaveError::InvalidPayload`] if the progress cannot be serialised.
pub fn encode(progress: &Progress) -> Result<String, SaveError> {
    let json = serde_json::to_vec(progress).map_err(SaveError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{SAVE_HEADER}{FIELD_DELIMITER}{encoded}"))
}

/// Decodes progress from a save string.
///
/// Fields missing from the payload take their defaults.
///
/// # Errors
///
/// Returns a [`SaveError`] describing the first malformed segment.
pub fn decode(value: &str) -> Result<Progress, SaveError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SaveError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(SaveError::MissingVersion)?;
    let payload = parts.next().ok_or(SaveError::MissingPayload)?;

    if domain != SAVE_DOMAIN {
        return Err(SaveError::InvalidPrefix(domain.to_owned()));
    }
    if version != SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SaveError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(SaveError::InvalidPayload)
}
