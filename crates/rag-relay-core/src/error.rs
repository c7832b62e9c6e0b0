//! Error types for the relay pipeline.
//!
//! Every stage of a request (authentication, parsing, retrieval, context
//! assembly, completion, relay) fails with a [`PipelineError`] variant so
//! the HTTP layer can map it to a status code without inspecting messages.

use thiserror::Error;

/// Errors raised by the relay pipeline, one variant per failing stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The signature header is not valid base64 or not a DER `(r, s)` sequence.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The signature is well-formed but does not verify against a trusted key.
    #[error("invalid payload signature")]
    Unauthorized,

    /// The request body or headers do not match the expected schema.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Two embedding vectors of different lengths were compared.
    #[error("embedding dimensions differ: query has {query}, candidate has {candidate}")]
    DimensionMismatch {
        /// Length of the query vector.
        query: usize,
        /// Length of the candidate vector.
        candidate: usize,
    },

    /// A retrieved document could not be read.
    #[error("failed to load document {reference}: {source}")]
    ContentLoad {
        /// Path of the document that failed to load.
        reference: String,
        #[source]
        source: std::io::Error,
    },

    /// The nearest-neighbor source failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The embedding service failed or returned an unusable vector.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The completion request could not be started.
    #[error("completion request failed: {0}")]
    Completion(String),

    /// The relay failed after streaming began.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl PipelineError {
    /// Machine-readable error code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedSignature(_) => "malformed_signature",
            Self::Unauthorized => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::ContentLoad { .. } => "content_load",
            Self::Retrieval(_) => "retrieval",
            Self::Embedding(_) => "embedding",
            Self::Completion(_) => "completion",
            Self::Relay(_) => "relay",
        }
    }

    /// HTTP status code for this error.
    ///
    /// Both signature failures map to `401`; only the body/header schema
    /// errors map to `400`; everything else is an internal `500`.
    pub fn status(&self) -> u16 {
        match self {
            Self::MalformedSignature(_) | Self::Unauthorized => 401,
            Self::BadRequest(_) => 400,
            _ => 500,
        }
    }
}

/// Failures of the streaming relay once the upstream stream is open.
///
/// Lines written before the failure stay written; callers must treat any
/// of these as "response incomplete".
#[derive(Debug, Error)]
pub enum RelayError {
    /// Reading the next line from the upstream stream failed.
    #[error("failed to read from stream: {0}")]
    Read(#[source] std::io::Error),

    /// Writing a line or its delimiter to the sink failed.
    #[error("failed to write to stream: {0}")]
    Write(#[source] std::io::Error),

    /// The caller went away before the upstream finished.
    #[error("relay cancelled by caller")]
    Cancelled,

    /// The relay deadline elapsed before the upstream finished.
    #[error("relay deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
}
