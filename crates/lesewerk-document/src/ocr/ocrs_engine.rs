// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust recognition backend using the `ocrs` crate, for hosts without
// Tesseract.
//
// # Feature Gate
//
// Only available with the `ocrs` feature:
//
// ```toml
// lesewerk-document = { path = "crates/lesewerk-document", features = ["ocrs"] }
// ```
//
// # Model Setup
//
// The engine needs two model files in one directory:
//
// - **Detection model** (`text-detection.rten`)
// - **Recognition model** (`text-recognition.rten`)
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default directory.
//
// The published models are Latin-script only, so the language order in
// `RecognitionParams` is ignored. Recognition runs in-process and is not
// interrupted by the timeout.

use std::path::{Path, PathBuf};

use image::RgbImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use lesewerk_core::error::{LesewerkError, Result};

use super::recognize::{RecognitionParams, TextRecognizer};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Recognizer running `ocrs` neural models.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
}

impl OcrsRecognizer {
    /// Load both models from `dir`. Model loading is the expensive step, so
    /// build one recognizer and reuse it.
    #[instrument(fields(dir = %dir.display()))]
    pub fn from_model_dir(dir: &Path) -> Result<Self> {
        let detection_path = dir.join(DETECTION_MODEL_FILENAME);
        let recognition_path = dir.join(RECOGNITION_MODEL_FILENAME);
        for path in [&detection_path, &recognition_path] {
            if !path.exists() {
                return Err(LesewerkError::Recognition(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }

        info!("loading OCR detection model");
        let detection_model = Model::load_file(&detection_path).map_err(|err| {
            LesewerkError::Recognition(format!(
                "failed to load detection model from {}: {err}",
                detection_path.display()
            ))
        })?;

        info!("loading OCR recognition model");
        let recognition_model = Model::load_file(&recognition_path).map_err(|err| {
            LesewerkError::Recognition(format!(
                "failed to load recognition model from {}: {err}",
                recognition_path.display()
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| LesewerkError::Recognition(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Load models from `dir`, or from [`default_model_dir`] when `None`.
    pub fn from_optional_dir(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_model_dir(dir),
            None => Self::from_model_dir(&default_model_dir()),
        }
    }
}

impl TextRecognizer for OcrsRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &RgbImage, _params: &RecognitionParams) -> Result<String> {
        let (width, height) = image.dimensions();
        let source = ImageSource::from_bytes(image.as_raw(), (width, height)).map_err(|err| {
            LesewerkError::Recognition(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| LesewerkError::Recognition(format!("OCR preprocessing failed: {err}")))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| LesewerkError::Recognition(format!("OCR text recognition failed: {err}")))?;

        debug!(lines = text.lines().count(), "ocrs recognition complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dir_ends_with_ocrs() {
        let dir = default_model_dir();
        assert!(dir.ends_with("ocrs") || dir.ends_with("ocrs-models"));
    }

    #[test]
    fn missing_models_are_reported() {
        let err = OcrsRecognizer::from_model_dir(Path::new("/nonexistent/ocr-models"))
            .err()
            .unwrap();
        assert!(matches!(err, LesewerkError::Recognition(ref m) if m.contains(DETECTION_MODEL_FILENAME)));
    }
}
