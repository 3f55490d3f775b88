// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for page-range extraction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Doc,
    Docx,
    Epub,
    Mobi,
    Chm,
    PlainText,
}

impl DocumentFormat {
    /// Infer the format from a bare extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "epub" => Some(Self::Epub),
            "mobi" => Some(Self::Mobi),
            "chm" => Some(Self::Chm),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Infer the format from a file path, failing with `UnsupportedFormat`.
    ///
    /// Only the path is inspected; the file is never touched.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            LesewerkError::UnsupportedFormat(if ext.is_empty() {
                format!("{} has no file extension", path.display())
            } else {
                format!(".{ext}")
            })
        })
    }

    /// Canonical lower-case extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Epub => "epub",
            Self::Mobi => "mobi",
            Self::Chm => "chm",
            Self::PlainText => "txt",
        }
    }

    /// Word documents, converted to PDF through an office suite.
    pub fn is_word(&self) -> bool {
        matches!(self, Self::Doc | Self::Docx)
    }

    /// Legacy e-book containers, converted through the e-book tool.
    pub fn is_legacy_ebook(&self) -> bool {
        matches!(self, Self::Mobi | Self::Chm)
    }
}

/// Output format of an e-book conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EbookTarget {
    Pdf,
    Epub,
}

impl EbookTarget {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }
}

/// A validated, inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Resolve and validate a requested range against a document's page count.
    ///
    /// A missing `end` means "through the last page". Fails when
    /// `start < 1`, `end > total` or `start > end`.
    pub fn resolve(start: u32, end: Option<u32>, total: u32) -> Result<Self> {
        let end = end.unwrap_or(total);
        if start < 1 || end > total || start > end {
            return Err(LesewerkError::InvalidPageRange { start, end, total });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// A validated range always holds at least one page.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// One page-range extraction, immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub file_path: PathBuf,
    pub start_page: u32,
    #[serde(default)]
    pub end_page: Option<u32>,
    #[serde(default)]
    pub use_ocr: bool,
}

impl ExtractionRequest {
    pub fn new(file_path: impl Into<PathBuf>, start_page: u32, end_page: Option<u32>) -> Self {
        Self {
            file_path: file_path.into(),
            start_page,
            end_page,
            use_ocr: false,
        }
    }

    pub fn with_ocr(mut self, use_ocr: bool) -> Self {
        self.use_ocr = use_ocr;
        self
    }
}
