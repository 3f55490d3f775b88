// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The OCR adapter: normalize input, enhance, detect the script, recognize,
// clean up.

use std::time::Duration;

use image::{DynamicImage, RgbImage};
use tracing::{debug, info, instrument};

use lesewerk_core::config::OcrBackend;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::LesewerkConfig;

use super::enhance::ScanEnhancer;
use super::language::{detect_language, SAMPLE_CHARS};
use super::postprocess::postprocess;
use super::recognize::{RecognitionParams, TesseractCli, TextRecognizer, DEFAULT_TIMEOUT};

/// Image data accepted by [`OcrPipeline::process`].
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// An encoded image file (PNG, JPEG, ...).
    Encoded(Vec<u8>),
    /// Packed 8-bit RGB samples, row-major.
    Raster {
        width: u32,
        height: u32,
        samples: Vec<u8>,
    },
    /// An image already in memory.
    Decoded(DynamicImage),
}

impl ImageInput {
    /// Decode into a single RGB raster.
    pub fn into_rgb(self) -> Result<RgbImage> {
        match self {
            Self::Encoded(bytes) => image::load_from_memory(&bytes)
                .map(|img| img.to_rgb8())
                .map_err(|err| LesewerkError::Recognition(format!("cannot decode image: {err}"))),
            Self::Raster {
                width,
                height,
                samples,
            } => {
                let expected = width as usize * height as usize * 3;
                let actual = samples.len();
                RgbImage::from_raw(width, height, samples).ok_or_else(|| {
                    LesewerkError::Recognition(format!(
                        "unsupported raster: {width}x{height} RGB needs {expected} bytes, got {actual}"
                    ))
                })
            }
            Self::Decoded(img) => Ok(img.to_rgb8()),
        }
    }
}

/// Enhancement, language selection and recognition over one backend.
pub struct OcrPipeline {
    recognizer: Box<dyn TextRecognizer>,
    timeout: Duration,
}

impl OcrPipeline {
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the configured backend.
    pub fn from_config(config: &LesewerkConfig) -> Result<Self> {
        let recognizer: Box<dyn TextRecognizer> = match config.ocr_backend {
            OcrBackend::Tesseract => Box::new(TesseractCli::from_config(config)),
            #[cfg(feature = "ocrs")]
            OcrBackend::Ocrs => Box::new(super::ocrs_engine::OcrsRecognizer::from_optional_dir(
                config.ocrs_model_dir.as_deref(),
            )?),
            #[cfg(not(feature = "ocrs"))]
            OcrBackend::Ocrs => {
                return Err(LesewerkError::ConfigurationMissing(
                    "the ocrs backend was selected but this build lacks the `ocrs` feature".into(),
                ));
            }
        };
        info!(backend = ?config.ocr_backend, "OCR backend ready");
        Ok(Self::new(recognizer).with_timeout(config.ocr_timeout()))
    }

    /// Recognize the text in `input`.
    ///
    /// Any failure along the way is reported as [`LesewerkError::Recognition`];
    /// partial output is never returned.
    #[instrument(skip_all)]
    pub fn process(&self, input: ImageInput) -> Result<String> {
        self.run(input).map_err(|err| match err {
            LesewerkError::Recognition(_) => err,
            other => LesewerkError::Recognition(other.to_string()),
        })
    }

    fn run(&self, input: ImageInput) -> Result<String> {
        let image = input.into_rgb()?;
        let enhanced = ScanEnhancer::from_rgb(image).enhance_for_ocr().into_rgb();

        let detection = RecognitionParams::detection().with_timeout(self.timeout);
        let sample = self.recognizer.recognize(&enhanced, &detection)?;
        let sample: String = sample.chars().take(SAMPLE_CHARS).collect();
        let order = detect_language(&sample);

        let full = RecognitionParams::full(order).with_timeout(self.timeout);
        let raw = self.recognizer.recognize(&enhanced, &full)?;
        let text = postprocess(&raw);
        debug!(raw_chars = raw.chars().count(), chars = text.chars().count(), "OCR pass complete");
        Ok(text)
    }
}
