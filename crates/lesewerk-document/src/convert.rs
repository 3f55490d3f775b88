// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format conversion gateway.
//
// Word documents go to PDF through a headless office suite; CHM and MOBI go
// to PDF or EPUB through calibre's `ebook-convert`. Converted files are left
// next to the source and double as an idempotency marker: when the target
// already exists, no tool is run.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, error, info, instrument, warn};

use lesewerk_core::config::EBOOK_CONVERT_ENV;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{DocumentFormat, EbookTarget};
use lesewerk_core::LesewerkConfig;

/// Capability to turn non-native formats into ones the readers understand.
pub trait FormatConverter: Send + Sync {
    /// Convert a DOC/DOCX file to PDF, returning the PDF path.
    fn convert_to_pdf(&self, doc_path: &Path) -> Result<PathBuf>;

    /// Convert a CHM/MOBI file to `target`, returning the output path.
    fn convert_ebook(&self, path: &Path, target: EbookTarget) -> Result<PathBuf>;
}

/// Converter backed by external command-line tools.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    /// Office suite executable (LibreOffice `soffice`).
    office_command: String,
    /// calibre `ebook-convert` executable, if configured.
    ebook_convert: Option<PathBuf>,
}

impl ExternalConverter {
    pub fn new(office_command: impl Into<String>, ebook_convert: Option<PathBuf>) -> Self {
        Self {
            office_command: office_command.into(),
            ebook_convert,
        }
    }

    pub fn from_config(config: &LesewerkConfig) -> Self {
        Self::new(
            config.office_command.clone(),
            config.ebook_convert_path.clone(),
        )
    }
}

impl FormatConverter for ExternalConverter {
    #[instrument(skip(self), fields(path = %doc_path.display()))]
    fn convert_to_pdf(&self, doc_path: &Path) -> Result<PathBuf> {
        let pdf_path = doc_path.with_extension("pdf");
        if pdf_path.exists() {
            debug!(pdf = %pdf_path.display(), "converted PDF already present, reusing it");
            return Ok(pdf_path);
        }

        let out_dir = match doc_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        info!(tool = %self.office_command, "converting Word document to PDF");
        let mut command = Command::new(&self.office_command);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&out_dir)
            .arg(doc_path);
        run_tool(&mut command, &self.office_command, doc_path)?;

        expect_output(pdf_path, doc_path)
    }

    #[instrument(skip(self), fields(path = %path.display(), target = target.extension()))]
    fn convert_ebook(&self, path: &Path, target: EbookTarget) -> Result<PathBuf> {
        let source = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension);
        if !matches!(source, Some(format) if format.is_legacy_ebook()) {
            warn!("e-book conversion only handles .chm and .mobi sources");
            return Err(LesewerkError::ConversionFailure(format!(
                "{} is not a CHM or MOBI file",
                path.display()
            )));
        }

        let output = path.with_extension(target.extension());
        if output.exists() {
            debug!(output = %output.display(), "converted e-book already present, reusing it");
            return Ok(output);
        }

        let Some(tool) = self.ebook_convert.as_deref() else {
            error!(variable = EBOOK_CONVERT_ENV, "e-book converter location is not configured");
            return Err(LesewerkError::ConfigurationMissing(format!(
                "{EBOOK_CONVERT_ENV} is not set; it must point at calibre's ebook-convert"
            )));
        };
        if !tool.exists() {
            error!(tool = %tool.display(), "e-book converter not found at configured path");
            return Err(LesewerkError::ConversionFailure(format!(
                "ebook-convert not found at {}",
                tool.display()
            )));
        }

        info!(tool = %tool.display(), "converting e-book");
        let mut command = Command::new(tool);
        command.arg(path).arg(&output);
        if target == EbookTarget::Pdf {
            command.arg("--pdf-add-toc");
        }
        run_tool(&mut command, &tool.display().to_string(), path)?;

        expect_output(output, path)
    }
}

/// Run a conversion tool to completion, mapping every failure mode to a
/// distinct `ConversionFailure`.
fn run_tool(command: &mut Command, tool: &str, source: &Path) -> Result<()> {
    let output = command.output().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            error!(tool, "conversion tool not found on PATH");
            LesewerkError::ConversionFailure(format!("{tool} not found: {err}"))
        } else {
            error!(tool, error = %err, "failed to launch conversion tool");
            LesewerkError::ConversionFailure(format!("failed to run {tool}: {err}"))
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr_tail(&stderr);
        error!(
            tool,
            source = %source.display(),
            code = ?output.status.code(),
            stderr = %tail,
            "conversion tool exited with failure"
        );
        return Err(LesewerkError::ConversionFailure(format!(
            "{tool} exited with {} while converting {}: {tail}",
            output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}")),
            source.display()
        )));
    }
    Ok(())
}

fn expect_output(output: PathBuf, source: &Path) -> Result<PathBuf> {
    if output.exists() {
        info!(output = %output.display(), "conversion complete");
        Ok(output)
    } else {
        error!(
            source = %source.display(),
            expected = %output.display(),
            "conversion tool succeeded but produced no output"
        );
        Err(LesewerkError::ConversionFailure(format!(
            "no output produced at {}",
            output.display()
        )))
    }
}

/// Last few lines of a tool's stderr, for log messages.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join(" | ")
}
