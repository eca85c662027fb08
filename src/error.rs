use thiserror::Error;

use crate::urn::{Urn, UrnError};

/// Errors raised by catalog load operations.
///
/// Every variant propagates synchronously to the caller; the store never
/// retries and never commits partial state on failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API answered with a non-2xx status.
    #[error("request failed: {status} {status_text}")]
    Fetch { status: u16, status_text: String },

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not JSON, or not the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A response carried a malformed identifier.
    #[error(transparent)]
    Urn(#[from] UrnError),

    /// A batched resolution response omitted a record it was asked for.
    #[error("batched resolution response is missing a record for {urn}")]
    MissingRecord { urn: Urn },

    /// A child record named an identifier outside its parent.
    #[error("{urn} does not belong to {parent}")]
    ForeignUrn { urn: Urn, parent: Urn },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
