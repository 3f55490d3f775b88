// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image enhancement and text recognition for pages without usable text.

pub mod color;
pub mod enhance;
pub mod language;
#[cfg(feature = "ocrs")]
pub mod ocrs_engine;
pub mod pipeline;
pub mod postprocess;
pub mod recognize;

pub use enhance::ScanEnhancer;
pub use language::{detect_language, LanguageOrder};
pub use pipeline::{ImageInput, OcrPipeline};
pub use recognize::{RecognitionParams, TesseractCli, TextRecognizer};
