//! Trigger service error abstractions.

use thiserror::Error;

/// A result type where the error is a `TriggerError`.
pub type TriggerResult<T> = std::result::Result<T, TriggerError>;

/// Pipeline error variants.
///
/// Errors are never recovered from locally. They surface to the serving edge unwrapped, which
/// reports the delivery as failed so that the delivery mechanism's own redelivery policy governs.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The inbound envelope could not be decoded.
    ///
    /// Covers a missing payload field, invalid base64 and payloads which are not well-formed JSON.
    #[error("error decoding trigger event: {0}")]
    Decode(anyhow::Error),
    /// The decoded payload is missing the expected job-completion field path.
    #[error("trigger payload is missing the load job destination table id")]
    Schema,
    /// The Dataform API rejected an operation.
    #[error("dataform API error: status {status}: {message}")]
    Remote {
        /// The HTTP status code returned by the API.
        status: u16,
        /// The response body returned with the rejection.
        message: String,
    },
    /// The Dataform API accepted an operation but returned a response missing a required field.
    #[error("malformed dataform API response: {0}")]
    MalformedResponse(&'static str),
    /// A transport-level failure while communicating with the Dataform API.
    #[error("error communicating with the dataform API: {0}")]
    Transport(#[from] reqwest::Error),
}
