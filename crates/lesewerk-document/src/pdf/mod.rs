// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF access: page text and rasterized image blocks.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod reader;

pub use reader::PdfReader;
