// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error descriptions for callers of the extraction tool.
//
// Every error is mapped to a plain summary with a concrete suggestion. The
// severity says who has to act: the caller, the operator, or nobody.

use crate::config::EBOOK_CONVERT_ENV;
use crate::error::LesewerkError;

/// Who can resolve an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request itself is wrong; resubmitting it unchanged fails again.
    InputRejected,
    /// Tooling or configuration on the host is missing or broken.
    Environment,
    /// Part of the document could not be read; other pages may still work.
    Degraded,
}

/// A readable error with a summary and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `LesewerkError` into a `HumanError`.
pub fn humanize_error(err: &LesewerkError) -> HumanError {
    match err {
        LesewerkError::UnsupportedFormat(detail) => HumanError {
            message: format!("This file type isn't supported ({detail})."),
            suggestion: "Use a PDF, EPUB, DOC, DOCX, MOBI, CHM or TXT file.".into(),
            severity: Severity::InputRejected,
        },

        LesewerkError::InvalidPageRange { total, .. } => HumanError {
            message: err.to_string(),
            suggestion: if *total == 0 {
                "The document has no readable pages.".into()
            } else {
                format!("Choose pages between 1 and {total}, with the start not after the end.")
            },
            severity: Severity::InputRejected,
        },

        LesewerkError::ConversionFailure(detail) => HumanError {
            message: "The document could not be converted for reading.".into(),
            suggestion: format!(
                "Check that LibreOffice (for Word files) or calibre (for MOBI/CHM) is installed and can open this file. ({detail})"
            ),
            severity: Severity::Environment,
        },

        LesewerkError::ConfigurationMissing(detail) => HumanError {
            message: "The reader is missing a required setting.".into(),
            suggestion: if detail.contains(EBOOK_CONVERT_ENV) {
                format!("Set {EBOOK_CONVERT_ENV} to the full path of calibre's ebook-convert program.")
            } else {
                format!("Review the service configuration. ({detail})")
            },
            severity: Severity::Environment,
        },

        LesewerkError::DocumentOpen(detail) => HumanError {
            message: "The document could not be opened.".into(),
            suggestion: format!("Check the path and that the file is not damaged. ({detail})"),
            severity: Severity::Degraded,
        },

        LesewerkError::PageOutOfBounds { total, .. } => HumanError {
            message: err.to_string(),
            suggestion: format!("The document only has {total} pages."),
            severity: Severity::Degraded,
        },

        LesewerkError::Pdf(detail) => HumanError {
            message: "The PDF could not be read.".into(),
            suggestion: format!("The file may be damaged or encrypted. ({detail})"),
            severity: Severity::Degraded,
        },

        LesewerkError::Recognition(detail) => HumanError {
            message: "Text recognition failed for a page image.".into(),
            suggestion: format!("Check that Tesseract and its chi_sim/eng language data are installed. ({detail})"),
            severity: Severity::Degraded,
        },

        LesewerkError::Transport(detail) => HumanError {
            message: "The MCP session with the client broke down.".into(),
            suggestion: format!("Restart the client; it must speak MCP over stdin and stdout. ({detail})"),
            severity: Severity::Environment,
        },

        LesewerkError::Io(io) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check that the file exists and is readable. ({io})"),
            severity: Severity::Environment,
        },

        LesewerkError::Serialization(detail) => HumanError {
            message: "A configuration or request document is malformed.".into(),
            suggestion: format!("Fix the JSON and try again. ({detail})"),
            severity: Severity::InputRejected,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_rejected_input() {
        let h = humanize_error(&LesewerkError::UnsupportedFormat(".rtf".into()));
        assert_eq!(h.severity, Severity::InputRejected);
        assert!(h.message.contains(".rtf"));
    }

    #[test]
    fn invalid_range_suggests_bounds() {
        let h = humanize_error(&LesewerkError::InvalidPageRange {
            start: 0,
            end: 3,
            total: 12,
        });
        assert_eq!(h.severity, Severity::InputRejected);
        assert!(h.suggestion.contains("1 and 12"));
    }

    #[test]
    fn missing_ebook_tool_names_the_variable() {
        let h = humanize_error(&LesewerkError::ConfigurationMissing(format!(
            "{EBOOK_CONVERT_ENV} is not set"
        )));
        assert_eq!(h.severity, Severity::Environment);
        assert!(h.suggestion.contains(EBOOK_CONVERT_ENV));
    }

    #[test]
    fn transport_failure_points_at_the_client() {
        let h = humanize_error(&LesewerkError::Transport("connection closed".into()));
        assert_eq!(h.severity, Severity::Environment);
        assert!(h.suggestion.contains("stdin"));
    }

    #[test]
    fn recognition_failure_is_degraded() {
        let h = humanize_error(&LesewerkError::Recognition("timed out after 30s".into()));
        assert_eq!(h.severity, Severity::Degraded);
    }
}
