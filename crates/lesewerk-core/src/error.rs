// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.

use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Request errors --
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid page range {start}-{end} (valid pages: 1-{total})")]
    InvalidPageRange { start: u32, end: u32, total: u32 },

    // -- Conversion errors --
    #[error("format conversion failed: {0}")]
    ConversionFailure(String),

    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    // -- Document errors --
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    #[error("page {page} out of bounds (document has {total} pages)")]
    PageOutOfBounds { page: u32, total: u32 },

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Service errors --
    #[error("MCP transport failed: {0}")]
    Transport(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LesewerkError {
    /// Stable machine-readable code for the wire protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::InvalidPageRange { .. } => "INVALID_PAGE_RANGE",
            Self::ConversionFailure(_) => "CONVERSION_FAILURE",
            Self::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            Self::DocumentOpen(_) => "DOCUMENT_OPEN_FAILURE",
            Self::PageOutOfBounds { .. } => "PAGE_OUT_OF_BOUNDS",
            Self::Pdf(_) => "PDF_ERROR",
            Self::Recognition(_) => "RECOGNITION_FAILURE",
            Self::Transport(_) => "TRANSPORT_FAILURE",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Errors that reject the request itself, before any extraction work.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_) | Self::InvalidPageRange { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;
