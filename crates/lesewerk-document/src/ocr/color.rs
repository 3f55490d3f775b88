// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sRGB <-> CIELAB conversion (D65 white point) in the 8-bit layout used by
// image toolkits: L scaled to 0..=255, a and b offset by 128.

use image::{GrayImage, Luma, Rgb, RgbImage};

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const EPSILON: f32 = 216.0 / 24389.0;
const KAPPA: f32 = 24389.0 / 27.0;

/// An RGB image split into CIELAB planes.
pub struct LabPlanes {
    pub lightness: GrayImage,
    pub a: GrayImage,
    pub b: GrayImage,
}

impl LabPlanes {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let mut lightness = GrayImage::new(width, height);
        let mut a = GrayImage::new(width, height);
        let mut b = GrayImage::new(width, height);

        for (x, y, pixel) in image.enumerate_pixels() {
            let [l8, a8, b8] = rgb_to_lab8(pixel.0);
            lightness.put_pixel(x, y, Luma([l8]));
            a.put_pixel(x, y, Luma([a8]));
            b.put_pixel(x, y, Luma([b8]));
        }

        Self { lightness, a, b }
    }

    /// Merge the planes back into RGB.
    pub fn to_rgb(&self) -> RgbImage {
        let (width, height) = self.lightness.dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            Rgb(lab8_to_rgb([
                self.lightness.get_pixel(x, y).0[0],
                self.a.get_pixel(x, y).0[0],
                self.b.get_pixel(x, y).0[0],
            ]))
        })
    }
}

pub fn rgb_to_lab8(rgb: [u8; 3]) -> [u8; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);

    [
        to_u8(l * 255.0 / 100.0),
        to_u8(a + 128.0),
        to_u8(bb + 128.0),
    ]
}

pub fn lab8_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l = lab[0] as f32 * 100.0 / 255.0;
    let a = lab[1] as f32 - 128.0;
    let b = lab[2] as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * WHITE_X;
    let y = if l > KAPPA * EPSILON {
        fy.powi(3)
    } else {
        l / KAPPA
    };
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl)]
}

fn srgb_to_linear(v: u8) -> f32 {
    let c = v as f32 / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    to_u8(v * 255.0)
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cube = f.powi(3);
    if cube > EPSILON {
        cube
    } else {
        (116.0 * f - 16.0) / KAPPA
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_hit_the_lightness_extremes() {
        assert_eq!(rgb_to_lab8([0, 0, 0]), [0, 128, 128]);
        let white = rgb_to_lab8([255, 255, 255]);
        assert_eq!(white[0], 255);
        assert!((white[1] as i32 - 128).abs() <= 1);
        assert!((white[2] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn grays_have_neutral_chroma() {
        let [_, a, b] = rgb_to_lab8([119, 119, 119]);
        assert!((a as i32 - 128).abs() <= 1 && (b as i32 - 128).abs() <= 1);
    }

    #[test]
    fn conversion_is_close_to_lossless() {
        for rgb in [[200, 30, 40], [12, 180, 90], [70, 70, 250], [128, 128, 128]] {
            let back = lab8_to_rgb(rgb_to_lab8(rgb));
            for c in 0..3 {
                assert!(
                    (back[c] as i32 - rgb[c] as i32).abs() <= 6,
                    "{rgb:?} came back as {back:?}"
                );
            }
        }
    }

    #[test]
    fn planes_preserve_dimensions() {
        let img = RgbImage::from_pixel(7, 3, Rgb([10, 20, 30]));
        let planes = LabPlanes::from_rgb(&img);
        assert_eq!(planes.lightness.dimensions(), (7, 3));
        assert_eq!(planes.to_rgb().dimensions(), (7, 3));
    }
}
