// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction service configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LesewerkError, Result};

/// Environment variable naming the e-book conversion executable.
pub const EBOOK_CONVERT_ENV: &str = "EBOOK_CONVERT_PATH";

/// Which OCR engine recognizes text in page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// The `tesseract` command-line program.
    #[default]
    Tesseract,
    /// The pure-Rust `ocrs` engine (needs the `ocrs` cargo feature).
    Ocrs,
}

impl FromStr for OcrBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ocrs" => Ok(Self::Ocrs),
            other => Err(format!("unknown OCR backend '{other}'")),
        }
    }
}

/// Settings for the extraction engine and its external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LesewerkConfig {
    /// Maximum number of cached page-range results.
    pub cache_max_size: usize,
    /// Lifetime of a cached result, in seconds.
    pub cache_ttl_secs: u64,
    /// Path to the e-book conversion executable (calibre's `ebook-convert`).
    pub ebook_convert_path: Option<PathBuf>,
    /// Office suite command used for DOC/DOCX to PDF conversion.
    pub office_command: String,
    /// Tesseract command.
    pub tesseract_command: String,
    /// Upper bound for a single recognition call, in seconds.
    pub ocr_timeout_secs: u64,
    /// Resolution at which page images are rasterized for OCR.
    pub ocr_dpi: u32,
    pub ocr_backend: OcrBackend,
    /// Model directory for the `ocrs` backend.
    pub ocrs_model_dir: Option<PathBuf>,
}

impl Default for LesewerkConfig {
    fn default() -> Self {
        Self {
            cache_max_size: 100,
            cache_ttl_secs: 3600,
            ebook_convert_path: None,
            office_command: "soffice".into(),
            tesseract_command: "tesseract".into(),
            ocr_timeout_secs: 30,
            ocr_dpi: 300,
            ocr_backend: OcrBackend::Tesseract,
            ocrs_model_dir: None,
        }
    }
}

impl LesewerkConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_lookup(|key| std::env::var(key).ok());
        config
    }

    /// Load a JSON configuration file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overlay values from a key lookup (normally the environment).
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = parsed(&lookup, "LESEWERK_CACHE_SIZE") {
            self.cache_max_size = v;
        }
        if let Some(v) = parsed(&lookup, "LESEWERK_CACHE_TTL") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = lookup(EBOOK_CONVERT_ENV).filter(|v| !v.trim().is_empty()) {
            self.ebook_convert_path = Some(PathBuf::from(v.trim()));
        }
        if let Some(v) = lookup("LESEWERK_SOFFICE").filter(|v| !v.trim().is_empty()) {
            self.office_command = v.trim().to_string();
        }
        if let Some(v) = lookup("LESEWERK_TESSERACT").filter(|v| !v.trim().is_empty()) {
            self.tesseract_command = v.trim().to_string();
        }
        if let Some(v) = parsed(&lookup, "LESEWERK_OCR_TIMEOUT") {
            self.ocr_timeout_secs = v;
        }
        if let Some(v) = parsed(&lookup, "LESEWERK_OCR_DPI") {
            self.ocr_dpi = v;
        }
        if let Some(v) = parsed(&lookup, "LESEWERK_OCR_BACKEND") {
            self.ocr_backend = v;
        }
        if let Some(v) = lookup("LESEWERK_OCRS_MODELS").filter(|v| !v.trim().is_empty()) {
            self.ocrs_model_dir = Some(PathBuf::from(v.trim()));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_max_size == 0 {
            return Err(LesewerkError::ConfigurationMissing(
                "cache_max_size must be at least 1".into(),
            ));
        }
        if self.ocr_timeout_secs == 0 {
            return Err(LesewerkError::ConfigurationMissing(
                "ocr_timeout_secs must be at least 1".into(),
            ));
        }
        if self.ocr_dpi == 0 {
            return Err(LesewerkError::ConfigurationMissing(
                "ocr_dpi must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}
