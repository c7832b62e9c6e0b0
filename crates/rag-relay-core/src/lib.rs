//! # rag-relay core
//!
//! Shared, I/O-free logic for rag-relay: chat data models, request
//! signature verification, cosine similarity and top-K ranking, and
//! retrieval context assembly.
//!
//! This crate contains no tokio, HTTP clients, or filesystem access.
//! Everything that touches the network or disk is reached through the
//! [`rank::NeighborSource`] and [`context::ContentLoader`] traits, which
//! the `rag-relay` app crate implements.

pub mod context;
pub mod error;
pub mod models;
pub mod rank;
pub mod signature;
pub mod similarity;

pub use error::{PipelineError, RelayError};
