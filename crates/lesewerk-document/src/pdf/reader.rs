// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: page count and page text through `lopdf`, image blocks
// rendered through MuPDF.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use lopdf::{Document, ObjectId};
use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Matrix, Pixmap, Rect, TextPageOptions};
use tracing::{debug, info, instrument};

use lesewerk_core::error::{LesewerkError, Result};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Read-only access to a PDF file.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path (for diagnostics).
    path: PathBuf,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path).map_err(|err| {
            LesewerkError::Pdf(format!("failed to open {}: {}", path.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page).copied().ok_or(LesewerkError::PageOutOfBounds {
            page,
            total: pages.len() as u32,
        })
    }

    // -- Extraction -----------------------------------------------------------

    /// Text of one page (1-indexed) as laid out by the content stream.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.document.extract_text(&[page]).map_err(|err| {
            LesewerkError::Pdf(format!("text extraction failed on page {page}: {err}"))
        })
    }

    /// Every image block drawn on `page`, rendered at `dpi` and cropped to
    /// its on-page bounds.
    ///
    /// MuPDF does the drawing, so every image filter (DCT, JPX, JBIG2,
    /// CCITT), inline images and images nested in Form XObjects are covered.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn page_images(&self, page: u32, dpi: u32) -> Result<Vec<RgbImage>> {
        self.page_id(page)?;
        let path = self.path.to_str().ok_or_else(|| {
            LesewerkError::Pdf(format!("{} is not a UTF-8 path", self.path.display()))
        })?;
        let document = mupdf::Document::open(path).map_err(|err| render_error(page, err))?;
        let rendered = document
            .load_page(page as i32 - 1)
            .map_err(|err| render_error(page, err))?;

        let text_page = rendered
            .to_text_page(TextPageOptions::PRESERVE_IMAGES)
            .map_err(|err| render_error(page, err))?;
        let blocks: Vec<Rect> = text_page
            .blocks()
            .filter(|block| matches!(block.r#type(), TextBlockType::Image))
            .map(|block| block.bounds())
            .collect();
        if blocks.is_empty() {
            debug!(page, "page has no image blocks");
            return Ok(Vec::new());
        }

        let scale = dpi as f32 / POINTS_PER_INCH;
        let pixmap = rendered
            .to_pixmap(&Matrix::new_scale(scale, scale), &Colorspace::device_rgb(), false, false)
            .map_err(|err| render_error(page, err))?;
        let canvas = pixmap_to_rgb(&pixmap)?;
        let origin = rendered.bounds().map_err(|err| render_error(page, err))?;

        let mut rasters = Vec::with_capacity(blocks.len());
        for bounds in blocks {
            match crop_block(&canvas, &origin, &bounds, scale) {
                Some(raster) => {
                    debug!(
                        page,
                        width = raster.width(),
                        height = raster.height(),
                        "image block rasterized"
                    );
                    rasters.push(raster);
                }
                None => debug!(page, ?bounds, "skipping image block outside the page"),
            }
        }

        info!(page, images = rasters.len(), "page images collected");
        Ok(rasters)
    }
}

fn render_error(page: u32, err: mupdf::Error) -> LesewerkError {
    LesewerkError::Pdf(format!("cannot render page {page}: {err}"))
}

/// Copy a MuPDF pixmap (gray or RGB, alpha ignored) into an RGB image.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    let samples = pixmap.samples();
    if n == 0 || samples.len() < width as usize * height as usize * n {
        return Err(LesewerkError::Pdf(format!(
            "rendered pixmap {width}x{height}x{n} has only {} samples",
            samples.len()
        )));
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let offset = (y as usize * width as usize + x as usize) * n;
        let pixel = &samples[offset..offset + n];
        if n < 3 {
            Rgb([pixel[0]; 3])
        } else {
            Rgb([pixel[0], pixel[1], pixel[2]])
        }
    }))
}

/// The part of `canvas` covered by `bounds`, or `None` when that part is
/// empty.
fn crop_block(canvas: &RgbImage, origin: &Rect, bounds: &Rect, scale: f32) -> Option<RgbImage> {
    let to_pixel = |value: f32, offset: f32, limit: u32| {
        ((value - offset) * scale).round().clamp(0.0, limit as f32) as u32
    };
    let x0 = to_pixel(bounds.x0, origin.x0, canvas.width());
    let x1 = to_pixel(bounds.x1, origin.x0, canvas.width());
    let y0 = to_pixel(bounds.y0, origin.y0, canvas.height());
    let y1 = to_pixel(bounds.y1, origin.y0, canvas.height());
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(image::imageops::crop_imm(canvas, x0, y0, x1 - x0, y1 - y0).to_image())
}
