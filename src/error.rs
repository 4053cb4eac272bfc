use oci_spec::OciSpecError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::transport::NoResponse;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    //
    // Invalid user input
    //
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
    #[error("Invalid name for repository: {0}")]
    InvalidName(String),
    #[error("Invalid reference to image: {0}")]
    InvalidReference(String),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    //
    // Error from OCI registry
    //
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Authorization failed with HTTP status {0}")]
    Unauthorized(u16),
    #[error(transparent)]
    NoResponse(#[from] NoResponse),
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: Url },
    #[error("Stopped after following {limit} redirects (last URL: {url})")]
    TooManyRedirects { limit: usize, url: Url },
    #[error("Location header is missing in registry response")]
    MissingLocation,

    //
    // Invalid payload
    //
    #[error(transparent)]
    InvalidJson(#[from] serde_json::error::Error),
    #[error("Manifest codec failed: {0}")]
    ManifestCodec(String),
    #[error(transparent)]
    UnknownIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<OciSpecError> for Error {
    fn from(e: OciSpecError) -> Self {
        match e {
            OciSpecError::SerDe(e) => Error::InvalidJson(e),
            OciSpecError::Io(e) => Error::UnknownIo(e),
            other => Error::ManifestCodec(other.to_string()),
        }
    }
}

/// One reason entry of a structured registry error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the registry on certain 4xx failures:
///
/// ```json
/// {"errors": [{"code": "...", "message": "..."}, ...]}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub errors: Vec<ErrorEntry>,
}

/// The registry explicitly rejected a request and explained why.
#[derive(Debug, thiserror::Error)]
#[error("Tried to {action} but failed because: {}", reasons_oneline(.reasons))]
pub struct RegistryError {
    /// What the rejected request was trying to do
    pub action: String,
    /// Reason entries parsed from the response body
    pub reasons: Vec<ErrorEntry>,
}

fn reasons_oneline(reasons: &[ErrorEntry]) -> String {
    reasons
        .iter()
        .map(|entry| {
            if entry.message.is_empty() {
                entry.code.clone()
            } else {
                format!("{}: {}", entry.code, entry.message)
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_body() {
        let body = r#"{"errors":[{"code":"MANIFEST_UNKNOWN","message":"not found"}]}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.errors,
            vec![ErrorEntry {
                code: "MANIFEST_UNKNOWN".to_string(),
                message: "not found".to_string(),
            }]
        );

        // Entries without a message still parse
        let body = r#"{"errors":[{"code":"UNAUTHORIZED"}]}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.errors[0].message, "");
    }

    #[test]
    fn registry_error_message() {
        let err = RegistryError {
            action: "pull image manifest for registry.example.com/library/app:latest".to_string(),
            reasons: vec![
                ErrorEntry {
                    code: "MANIFEST_UNKNOWN".to_string(),
                    message: "not found".to_string(),
                },
                ErrorEntry {
                    code: "TAG_INVALID".to_string(),
                    message: "".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Tried to pull image manifest for registry.example.com/library/app:latest \
             but failed because: MANIFEST_UNKNOWN: not found | TAG_INVALID"
        );
    }
}
