// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document — Page-range text extraction for e-books.
//
// Reads PDF, EPUB and plain text natively, converts Word, CHM and MOBI files
// to PDF through external tools, and recovers scanned pages with an image
// enhancement plus OCR pipeline. Assembled ranges are kept in a bounded,
// expiring cache.

pub mod cache;
pub mod convert;
pub mod epub;
pub mod extract;
pub mod ocr;
pub mod pdf;
pub mod txt;

// Re-export the primary structs so callers can use `lesewerk_document::DocumentExtractor` etc.
pub use cache::PageCache;
pub use convert::{ExternalConverter, FormatConverter};
pub use epub::EpubReader;
pub use extract::{needs_ocr, DocumentExtractor};
pub use ocr::{ImageInput, OcrPipeline, ScanEnhancer};
pub use pdf::PdfReader;
pub use txt::TextPages;
