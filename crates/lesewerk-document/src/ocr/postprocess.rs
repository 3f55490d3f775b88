// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleanup of raw recognizer output.

use std::sync::LazyLock;

use regex::Regex;

/// Known misrecognitions and ligature artifacts, applied in order.
pub const CORRECTIONS: &[(&str, &str)] = &[
    ("\u{fb01}", "fi"),
    ("\u{fb02}", "fl"),
    ("$分刀", "分析"),
    ("′`", "'"),
    ("WS MEN", "Wittgenstein"),
];

/// A line shorter than this absorbs a following lowercase continuation.
pub const REFLOW_MAX_PREVIOUS: usize = 60;

static HYPHENATED_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-\s*\n\s*(\w)").expect("hyphenation pattern is valid"));

/// Run every cleanup step in order:
///
/// 1. Correction table
/// 2. Join words hyphenated across a line break
/// 3. Drop lines of at most one character (after trimming)
/// 4. Reflow broken sentences into paragraphs
/// 5. Curly double quotes become straight ones
pub fn postprocess(raw: &str) -> String {
    let corrected = apply_corrections(raw);
    let joined = merge_hyphenation(&corrected);
    let lines = drop_noise_lines(&joined);
    let text = reflow(lines).join("\n");
    normalize_quotes(&text)
}

pub fn apply_corrections(text: &str) -> String {
    CORRECTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

pub fn merge_hyphenation(text: &str) -> String {
    HYPHENATED_BREAK.replace_all(text, "$1$2").into_owned()
}

/// Trimmed lines longer than one character.
pub fn drop_noise_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| line.chars().count() > 1)
        .collect()
}

/// Append each line that does not start with an uppercase letter to a short
/// predecessor; otherwise start a new line.
pub fn reflow(lines: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        match out.last_mut() {
            Some(previous)
                if !starts_upper && previous.chars().count() < REFLOW_MAX_PREVIOUS =>
            {
                previous.push(' ');
                previous.push_str(line);
            }
            _ => out.push(line.to_string()),
        }
    }
    out
}

pub fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
}
