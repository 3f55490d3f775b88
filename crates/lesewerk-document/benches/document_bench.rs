// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the lesewerk-document crate: the scan enhancement
// chain that runs before every OCR pass, and OCR text cleanup.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use lesewerk_document::ScanEnhancer;
use lesewerk_document::ocr::postprocess::postprocess;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Enhance a 200x200 synthetic page: light paper with dark text-like bars and
/// scattered single-pixel speckles.
fn bench_enhance_for_ocr(c: &mut Criterion) {
    let (width, height) = (200u32, 200u32);
    let mut img = RgbImage::from_pixel(width, height, Rgb([225, 220, 210]));
    for row in (20..180).step_by(16) {
        for y in row..row + 6 {
            for x in 20..180 {
                img.put_pixel(x, y, Rgb([30, 30, 35]));
            }
        }
    }
    for i in 0..200u32 {
        img.put_pixel((i * 37) % width, (i * 91) % height, Rgb([0, 0, 0]));
    }
    let dynamic = DynamicImage::ImageRgb8(img);

    c.bench_function("enhance_for_ocr (200x200)", |b| {
        b.iter(|| {
            let enhancer = ScanEnhancer::from_dynamic(black_box(dynamic.clone()));
            black_box(enhancer.enhance_for_ocr().into_rgb());
        });
    });
}

/// Clean up a raw OCR page with hyphenation, noise lines and ligatures.
fn bench_postprocess(c: &mut Criterion) {
    let paragraph = "The ﬁrst chap-\nter begins here\nand continues on\n|\nThe \
                     next para-\ngraph “quotes” the text\nx\n";
    let raw = paragraph.repeat(40);

    c.bench_function("postprocess (40 paragraphs)", |b| {
        b.iter(|| black_box(postprocess(black_box(&raw))));
    });
}

criterion_group!(benches, bench_enhance_for_ocr, bench_postprocess);
criterion_main!(benches);
