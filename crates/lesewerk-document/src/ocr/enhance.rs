// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image enhancement ahead of text recognition. Stages run in a fixed order:
// adaptive binarization, speckle removal, sharpening, then contrast-limited
// histogram equalization of the lightness channel.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::filter::{filter3x3, gaussian_blur_f32};
use imageproc::morphology::{Mask, grayscale_open};
use tracing::{debug, instrument};

use super::color::LabPlanes;

/// Neighbourhood size of the adaptive threshold (pixels, odd).
pub const THRESHOLD_BLOCK_SIZE: u32 = 31;
/// Constant subtracted from the weighted local mean.
pub const THRESHOLD_OFFSET: i32 = 10;
/// CLAHE clip limit, relative to a flat histogram.
pub const CLAHE_CLIP_LIMIT: f32 = 3.0;
/// CLAHE tiles per axis.
pub const CLAHE_GRID: u32 = 8;

/// Center-weighted sharpening kernel, row-major.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
/// Side of the square opening element.
const OPENING_SIZE: u32 = 2;

/// Enhances page images so the recognizer sees crisp text.
///
/// Each step consumes `self` and returns the transformed image, so the
/// stages chain in order.
pub struct ScanEnhancer {
    /// The working image.
    image: DynamicImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the enhancer and return the result as RGB.
    pub fn into_rgb(self) -> RgbImage {
        match self.image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        }
    }

    // -- Pipeline -------------------------------------------------------------

    /// Run every stage with the fixed OCR settings:
    ///
    /// 1. Gaussian adaptive threshold (block 31, offset 10), inverted binary
    /// 2. Morphological opening
    /// 3. 3×3 sharpening
    /// 4. CLAHE on CIELAB lightness (clip 3.0, 8×8 tiles)
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn enhance_for_ocr(self) -> Self {
        self.binarize_gaussian(THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET)
            .despeckle()
            .sharpen()
            .equalize_lightness(CLAHE_CLIP_LIMIT, CLAHE_GRID)
    }

    // -- Stages ---------------------------------------------------------------

    /// Grayscale, then threshold every pixel against the Gaussian-weighted
    /// mean of its `block_size` neighbourhood minus `offset`.
    ///
    /// Output is inverted: pixels darker than the local threshold (ink)
    /// become white, everything else black.
    pub fn binarize_gaussian(self, block_size: u32, offset: i32) -> Self {
        let gray = self.image.to_luma8();
        let sigma = gaussian_sigma(block_size);
        let weighted_mean = gaussian_blur_f32(&gray, sigma);

        let mut output = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let threshold = weighted_mean.get_pixel(x, y).0[0] as i32 - offset;
            let value = if pixel.0[0] as i32 > threshold { 0u8 } else { 255u8 };
            output.put_pixel(x, y, Luma([value]));
        }

        debug!(block_size, offset, sigma, "adaptive threshold applied");
        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Morphological opening with a 2×2 square: specks narrower than two
    /// pixels vanish, strokes survive.
    pub fn despeckle(self) -> Self {
        let gray = self.image.to_luma8();
        let element = GrayImage::from_pixel(OPENING_SIZE, OPENING_SIZE, Luma([255u8]));
        let opened = grayscale_open(&gray, &Mask::from_image(&element, 1, 1));
        debug!(size = OPENING_SIZE, "speckle noise removed");
        Self {
            image: DynamicImage::ImageLuma8(opened),
        }
    }

    /// Convolve with the 3×3 center-weighted kernel. Borders replicate the
    /// edge pixels; results are clamped to `0..=255`.
    pub fn sharpen(self) -> Self {
        let gray = self.image.to_luma8();
        let output: GrayImage = filter3x3::<Luma<u8>, f32, u8>(&gray, &SHARPEN_KERNEL);
        debug!("sharpening applied");
        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Contrast-limited adaptive histogram equalization of the CIELAB
    /// lightness channel; chrominance is kept and the result returned as RGB.
    pub fn equalize_lightness(self, clip_limit: f32, grid: u32) -> Self {
        let rgb = self.image.to_rgb8();
        let mut planes = LabPlanes::from_rgb(&rgb);
        planes.lightness = clahe(&planes.lightness, clip_limit, grid);
        debug!(clip_limit, grid, "lightness equalized");
        Self {
            image: DynamicImage::ImageRgb8(planes.to_rgb()),
        }
    }
}

/// Standard deviation matching a Gaussian window of `block_size` pixels.
fn gaussian_sigma(block_size: u32) -> f32 {
    let size = block_size.max(3) as f32;
    0.3 * ((size - 1.0) * 0.5 - 1.0) + 0.8
}

// -- CLAHE --------------------------------------------------------------------

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into `grid × grid` tiles (fewer on tiny images). Each
/// tile gets its own equalization table from a histogram clipped at
/// `clip_limit × area / 256` with the excess spread evenly; every output pixel
/// blends the tables of its four nearest tile centres bilinearly.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tiles_x = grid.clamp(1, width);
    let tiles_y = grid.clamp(1, height);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = tile_bounds(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = tile_bounds(tx, tiles_x, width);
            luts.push(tile_lut(gray, x0..x1, y0..y1, clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;
    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, fx) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, fy) = neighbours(y, tile_h, tiles_y);
        let v = gray.get_pixel(x, y).0[0] as usize;

        let top = lut_at(tx0, ty0)[v] as f32 * (1.0 - fx) + lut_at(tx1, ty0)[v] as f32 * fx;
        let bottom = lut_at(tx0, ty1)[v] as f32 * (1.0 - fx) + lut_at(tx1, ty1)[v] as f32 * fx;
        Luma([(top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_bounds(index: u32, tiles: u32, len: u32) -> (u32, u32) {
    let start = (index as u64 * len as u64 / tiles as u64) as u32;
    let end = ((index as u64 + 1) * len as u64 / tiles as u64) as u32;
    (start, end.max(start + 1).min(len))
}

/// The two tile indices around `pos` and the blend weight of the second.
fn neighbours(pos: u32, tile_len: f32, tiles: u32) -> (u32, u32, f32) {
    let g = (pos as f32 + 0.5) / tile_len - 0.5;
    let lower = g.floor().clamp(0.0, (tiles - 1) as f32);
    let upper = (lower as u32 + 1).min(tiles - 1);
    let weight = if upper == lower as u32 {
        0.0
    } else {
        (g - lower).clamp(0.0, 1.0)
    };
    (lower as u32, upper, weight)
}

fn tile_lut(
    gray: &GrayImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    clip_limit: f32,
) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    let mut area = 0u32;
    for y in ys {
        for x in xs.clone() {
            histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
            area += 1;
        }
    }

    let mut lut = [0u8; 256];
    if area == 0 {
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = i as u8;
        }
        return lut;
    }

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let batch = excess / 256;
    let residual = (excess % 256) as usize;
    for count in histogram.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for i in (0..256).step_by(step).take(residual) {
            histogram[i] += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut cumulative = 0u32;
    for (i, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[i] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Tests --------------------------------------------------------------------
