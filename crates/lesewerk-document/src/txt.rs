// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain text paging: fixed windows of lines.

use std::path::Path;

use tracing::{debug, instrument};

use lesewerk_core::error::{LesewerkError, Result};

/// Lines that make up one page of a text file.
pub const LINES_PER_PAGE: usize = 50;

/// A text file split into lines, each keeping its terminator.
#[derive(Debug, Clone, Default)]
pub struct TextPages {
    lines: Vec<String>,
}

impl TextPages {
    /// Read `path`. Bytes that are not valid UTF-8 are replaced.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            LesewerkError::DocumentOpen(format!("{}: {err}", path.display()))
        })?;
        let pages = Self::from_text(&String::from_utf8_lossy(&bytes));
        debug!(lines = pages.lines.len(), pages = pages.page_count(), "text file read");
        Ok(pages)
    }

    /// Split into lines. `\r\n` and lone `\r` terminators become `\n`.
    pub fn from_text(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            lines: normalized.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// `ceil(lines / LINES_PER_PAGE)`; an empty file has no pages.
    pub fn page_count(&self) -> u32 {
        self.lines.len().div_ceil(LINES_PER_PAGE) as u32
    }

    /// Lines `(page-1)*50 .. page*50` joined verbatim.
    pub fn page_text(&self, page: u32) -> Result<String> {
        let total = self.page_count();
        if page == 0 || page > total {
            return Err(LesewerkError::PageOutOfBounds { page, total });
        }
        let start = (page as usize - 1) * LINES_PER_PAGE;
        let end = (start + LINES_PER_PAGE).min(self.lines.len());
        Ok(self.lines[start..end].concat())
    }
}
