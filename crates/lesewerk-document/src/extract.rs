// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page extraction engine.
//
// One request runs these steps in order: normalize the format (converting
// Word and legacy e-book files to PDF), consult the cache, count pages,
// validate the range, then extract each page and assemble the labelled
// result. Page-level failures degrade to empty page text; request-level
// failures are returned as errors.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{DocumentFormat, EbookTarget, ExtractionRequest, PageRange};
use lesewerk_core::LesewerkConfig;

use crate::cache::PageCache;
use crate::convert::{ExternalConverter, FormatConverter};
use crate::epub::EpubReader;
use crate::ocr::{ImageInput, OcrPipeline};
use crate::pdf::PdfReader;
use crate::txt::TextPages;

/// Pages whose trimmed text is shorter than this are sent to OCR.
pub const OCR_MIN_CHARS: usize = 50;
/// Pages where more than this share of characters lies above U+00FF are sent
/// to OCR; such text is usually glyph garbage from embedded fonts.
pub const OCR_WIDE_CHAR_RATIO: f64 = 0.3;
/// Raster resolution for image blocks unless configured otherwise.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Does a page with this extracted text need recognition?
pub fn needs_ocr(text: &str) -> bool {
    if text.trim().chars().count() < OCR_MIN_CHARS {
        return true;
    }
    let total = text.chars().count();
    let wide = text.chars().filter(|c| u32::from(*c) > 0xff).count();
    wide as f64 / total as f64 > OCR_WIDE_CHAR_RATIO
}

/// A document opened in its native reader.
enum OpenDocument {
    Pdf(PdfReader),
    /// A PDF that could not be opened; it reports zero pages.
    UnreadablePdf,
    Epub(EpubReader),
    Text(TextPages),
}

/// Extracts labelled page ranges from books, caching assembled results.
pub struct DocumentExtractor {
    cache: PageCache,
    /// Page count of every document extracted so far, so open-ended
    /// requests can be answered from the cache without reopening the file.
    page_totals: HashMap<PathBuf, u32>,
    converter: Box<dyn FormatConverter>,
    ocr: OcrPipeline,
    dpi: u32,
}

impl DocumentExtractor {
    pub fn new(cache: PageCache, converter: Box<dyn FormatConverter>, ocr: OcrPipeline) -> Self {
        Self {
            cache,
            page_totals: HashMap::new(),
            converter,
            ocr,
            dpi: DEFAULT_OCR_DPI,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Wire up the external converters, the configured OCR backend and a
    /// cache sized from `config`.
    pub fn from_config(config: &LesewerkConfig) -> Result<Self> {
        config.validate()?;
        let cache = PageCache::new(config.cache_max_size, config.cache_ttl());
        let converter = Box::new(ExternalConverter::from_config(config));
        let ocr = OcrPipeline::from_config(config)?;
        info!(
            cache_max_size = config.cache_max_size,
            cache_ttl_secs = config.cache_ttl_secs,
            dpi = config.ocr_dpi,
            "document extractor ready"
        );
        Ok(Self::new(cache, converter, ocr).with_dpi(config.ocr_dpi))
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Run an [`ExtractionRequest`].
    pub fn extract(&mut self, request: &ExtractionRequest) -> Result<String> {
        self.parse_ebook(
            &request.file_path,
            request.start_page,
            request.end_page,
            request.use_ocr,
        )
    }

    /// Extract pages `start_page..=end_page` (1-indexed; `None` means the
    /// last page) of the book at `file_path`.
    ///
    /// Each page becomes a block `=== Page {p}/{total} ===\n{text}` and the
    /// blocks are joined with newlines. Text pages whose content looks
    /// unusable, and every page when `use_ocr` is set, also get the
    /// recognized text of their image blocks.
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn parse_ebook(
        &mut self,
        file_path: impl AsRef<Path>,
        start_page: u32,
        end_page: Option<u32>,
        use_ocr: bool,
    ) -> Result<String> {
        let requested = file_path.as_ref();
        let format = DocumentFormat::from_path(requested)?;
        if !requested.exists() {
            return Err(LesewerkError::DocumentOpen(format!(
                "{} does not exist",
                requested.display()
            )));
        }

        // -- Normalize format --
        let (path, format) = self.normalize(requested, format)?;

        // -- Cache --
        if let Some(hit) = self.cached(&path, start_page, end_page, use_ocr) {
            return Ok(hit);
        }

        // -- Count pages --
        let document = open_document(&path, format)?;
        let total = match &document {
            OpenDocument::Pdf(reader) => reader.page_count(),
            OpenDocument::UnreadablePdf => 0,
            OpenDocument::Epub(reader) => reader.page_count(),
            OpenDocument::Text(pages) => pages.page_count(),
        };

        // -- Validate range --
        let range = PageRange::resolve(start_page, end_page, total)?;
        let key = cache_key(&path, range.start(), range.end(), use_ocr);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key, "serving cached extraction");
            return Ok(hit.to_string());
        }

        // -- Extract --
        info!(
            start = range.start(),
            end = range.end(),
            total,
            use_ocr,
            "extracting pages"
        );
        let mut blocks = Vec::with_capacity(range.len() as usize);
        for page in range.pages() {
            let text = self.page_text(&document, &path, page, use_ocr);
            blocks.push(format!("=== Page {page}/{total} ===\n{text}"));
        }

        let result = blocks.join("\n");
        self.cache.set(key, result.clone());
        self.page_totals.insert(path, total);
        Ok(result)
    }

    /// A cached result for the request, found without opening the document.
    /// An open-ended range resolves against the last page count seen for
    /// `path`.
    fn cached(&self, path: &Path, start_page: u32, end_page: Option<u32>, use_ocr: bool) -> Option<String> {
        let end_page = end_page.or_else(|| self.page_totals.get(path).copied())?;
        let key = cache_key(path, start_page, end_page, use_ocr);
        let hit = self.cache.get(&key)?;
        debug!(key, "serving cached extraction");
        Some(hit.to_string())
    }

    /// Swap Word and legacy e-book files for a converted PDF.
    fn normalize(&self, path: &Path, format: DocumentFormat) -> Result<(PathBuf, DocumentFormat)> {
        if format.is_word() {
            let pdf = self.converter.convert_to_pdf(path)?;
            debug!(pdf = %pdf.display(), "Word document normalized to PDF");
            Ok((pdf, DocumentFormat::Pdf))
        } else if format.is_legacy_ebook() {
            let pdf = self.converter.convert_ebook(path, EbookTarget::Pdf)?;
            debug!(pdf = %pdf.display(), "e-book normalized to PDF");
            Ok((pdf, DocumentFormat::Pdf))
        } else {
            Ok((path.to_path_buf(), format))
        }
    }

    /// Text of one page, or an empty string when the page cannot be read.
    fn page_text(&self, document: &OpenDocument, path: &Path, page: u32, use_ocr: bool) -> String {
        let extracted = match document {
            OpenDocument::Pdf(reader) => return self.pdf_page_text(reader, page, use_ocr),
            OpenDocument::UnreadablePdf => Err(LesewerkError::DocumentOpen(format!(
                "{} could not be opened",
                path.display()
            ))),
            OpenDocument::Epub(reader) => reader.page_text(page),
            OpenDocument::Text(pages) => pages.page_text(page),
        };
        extracted.unwrap_or_else(|err| {
            warn!(path = %path.display(), page, stage = "text", error = %err, "page unreadable, leaving it empty");
            String::new()
        })
    }

    fn pdf_page_text(&self, reader: &PdfReader, page: u32, use_ocr: bool) -> String {
        let path = reader.path().display();
        let mut text = match reader.page_text(page) {
            Ok(text) => text,
            Err(err @ LesewerkError::PageOutOfBounds { .. }) => {
                warn!(%path, page, stage = "text", error = %err, "page unreadable, leaving it empty");
                return String::new();
            }
            // Scanned pages often have no usable text layer; recognition may
            // still recover them.
            Err(err) => {
                warn!(%path, page, stage = "text", error = %err, "no text layer extracted");
                String::new()
            }
        };

        if !(use_ocr || needs_ocr(&text)) {
            return text;
        }

        debug!(%path, page, use_ocr, "running OCR on page images");
        let images = match reader.page_images(page, self.dpi) {
            Ok(images) => images,
            Err(err) => {
                warn!(%path, page, stage = "ocr", error = %err, "cannot collect page images");
                return text;
            }
        };
        for image in images {
            match self.ocr.process(ImageInput::Decoded(DynamicImage::ImageRgb8(image))) {
                Ok(recognized) => text.push_str(&recognized),
                Err(err) => {
                    warn!(%path, page, stage = "ocr", error = %err, "recognition failed, keeping extracted text");
                    break;
                }
            }
        }
        text
    }
}

fn open_document(path: &Path, format: DocumentFormat) -> Result<OpenDocument> {
    match format {
        DocumentFormat::Pdf => Ok(match PdfReader::open(path) {
            Ok(reader) => OpenDocument::Pdf(reader),
            Err(err) => {
                warn!(path = %path.display(), stage = "count", error = %err, "cannot open PDF, treating it as empty");
                OpenDocument::UnreadablePdf
            }
        }),
        DocumentFormat::Epub => EpubReader::open(path).map(OpenDocument::Epub),
        DocumentFormat::PlainText => TextPages::open(path).map(OpenDocument::Text),
        other => Err(LesewerkError::UnsupportedFormat(format!(
            ".{} cannot be read without conversion",
            other.extension()
        ))),
    }
}

/// `{path}-{start}-{end}-{ocr|text}`; the OCR flag keeps OCR and plain
/// results for the same range apart.
fn cache_key(path: &Path, start: u32, end: u32, use_ocr: bool) -> String {
    format!(
        "{}-{start}-{end}-{}",
        path.display(),
        if use_ocr { "ocr" } else { "text" }
    )
}
