// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Script detection for choosing the recognizer's language preference.

use tracing::debug;

/// Characters of the quick detection pass that are inspected.
pub const SAMPLE_CHARS: usize = 100;

/// Share of CJK ideographs above which Chinese is preferred.
pub const CJK_THRESHOLD: f64 = 0.3;

/// Which of the two recognition languages is tried first.
///
/// Both are always loaded; only the order changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageOrder {
    ChineseFirst,
    EnglishFirst,
}

impl LanguageOrder {
    /// Tesseract `-l` argument.
    pub fn tesseract_languages(self) -> &'static str {
        match self {
            Self::ChineseFirst => "chi_sim+eng",
            Self::EnglishFirst => "eng+chi_sim",
        }
    }
}

/// Is `c` in the CJK Unified Ideographs block?
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Pick the language order from the text of a quick recognition pass.
///
/// Only the first [`SAMPLE_CHARS`] characters count. An empty sample falls
/// back to English first.
pub fn detect_language(sample: &str) -> LanguageOrder {
    let mut total = 0usize;
    let mut cjk = 0usize;
    for c in sample.chars().take(SAMPLE_CHARS) {
        total += 1;
        if is_cjk_ideograph(c) {
            cjk += 1;
        }
    }

    let ratio = if total == 0 {
        0.0
    } else {
        cjk as f64 / total as f64
    };
    let order = if ratio > CJK_THRESHOLD {
        LanguageOrder::ChineseFirst
    } else {
        LanguageOrder::EnglishFirst
    };
    debug!(sampled = total, cjk, ratio, ?order, "language detected");
    order
}
