//! Error types for the gateway's inference pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that can occur between receiving a valid chat request and
/// producing a completion. Auth and validation problems are rejected in the
/// handler before this type comes into play.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("llama.cpp executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Request timeout - model inference took too long")]
    Timeout,

    #[error("Inference process failed: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
