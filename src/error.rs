use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that can surface while fetching and assembling a response thread.
///
/// Nothing in the pipeline recovers locally; the first error aborts the whole
/// in-flight operation and propagates to the caller of [`crate::app::run`].
#[derive(Debug, Error)]
pub enum Error {
    /// The response body held no JSON document after the anti-hijacking
    /// prefix, or the document failed to parse.
    #[error("could not decode response body: {reason}")]
    Decode { reason: String },

    /// An expected field was absent while resolving post or comment identity.
    #[error("{field} missing from {context}")]
    NotFound {
        field: &'static str,
        context: String,
    },

    /// A fetched comment envelope could not be projected into a record.
    #[error("malformed comment record: {0}")]
    MalformedRecord(String),

    /// Network failure or non-success HTTP status, rate limiting included.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
