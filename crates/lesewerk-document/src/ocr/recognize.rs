// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backends.
//
// The default backend drives the Tesseract command-line program. Every call
// is bounded by a timeout; a recognizer that overruns is killed and the call
// fails.

use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};
use tracing::{debug, instrument, warn};

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::LesewerkConfig;

use super::language::LanguageOrder;

/// Upper bound on a single recognition call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters the recognizer must never emit; they only ever show up as noise.
pub const CHAR_BLACKLIST: &str = "|\\`~";

/// How often a running recognizer is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Anything that turns a page raster into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage, params: &RecognitionParams) -> Result<String>;
}

/// Settings for one recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionParams {
    pub languages: LanguageOrder,
    /// Page segmentation mode; engine default when `None`.
    pub page_segmentation: Option<u8>,
    /// Engine mode; engine default when `None`.
    pub engine_mode: Option<u8>,
    pub preserve_interword_spaces: bool,
    pub char_blacklist: Option<String>,
    pub timeout: Duration,
}

impl RecognitionParams {
    /// The quick sampling pass used for language detection: both languages,
    /// Chinese first, engine defaults otherwise.
    pub fn detection() -> Self {
        Self {
            languages: LanguageOrder::ChineseFirst,
            page_segmentation: None,
            engine_mode: None,
            preserve_interword_spaces: false,
            char_blacklist: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The full pass: a single uniform block of text, LSTM engine, spacing
    /// kept, noise characters blacklisted.
    pub fn full(languages: LanguageOrder) -> Self {
        Self {
            languages,
            page_segmentation: Some(6),
            engine_mode: Some(1),
            preserve_interword_spaces: true,
            char_blacklist: Some(CHAR_BLACKLIST.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// -- Tesseract ----------------------------------------------------------------

/// Recognizer backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
}

impl TesseractCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &LesewerkConfig) -> Self {
        Self::new(config.tesseract_command.clone())
    }

    /// Command-line arguments after the program name.
    fn arguments(input: &Path, output_base: &Path, params: &RecognitionParams) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.into(),
            output_base.into(),
            "-l".into(),
            params.languages.tesseract_languages().into(),
        ];
        if let Some(psm) = params.page_segmentation {
            args.push("--psm".into());
            args.push(psm.to_string().into());
        }
        if let Some(oem) = params.engine_mode {
            args.push("--oem".into());
            args.push(oem.to_string().into());
        }
        if params.preserve_interword_spaces {
            args.push("-c".into());
            args.push("preserve_interword_spaces=1".into());
        }
        if let Some(blacklist) = &params.char_blacklist {
            args.push("-c".into());
            args.push(format!("tessedit_char_blacklist={blacklist}").into());
        }
        args
    }
}

impl TextRecognizer for TesseractCli {
    #[instrument(skip_all, fields(
        width = image.width(),
        height = image.height(),
        languages = params.languages.tesseract_languages(),
    ))]
    fn recognize(&self, image: &RgbImage, params: &RecognitionParams) -> Result<String> {
        let workdir = tempfile::tempdir()
            .map_err(|err| recognition(format!("cannot create scratch directory: {err}")))?;
        let input = workdir.path().join("page.png");
        let output_base = workdir.path().join("page");

        image
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|err| recognition(format!("cannot write page raster: {err}")))?;
        let stderr_log = File::create(workdir.path().join("stderr.log"))
            .map_err(|err| recognition(format!("cannot create log file: {err}")))?;

        let mut child = Command::new(&self.command)
            .args(Self::arguments(&input, &output_base, params))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_log))
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    recognition(format!("{} not found: {err}", self.command))
                } else {
                    recognition(format!("failed to run {}: {err}", self.command))
                }
            })?;

        let status = wait_with_deadline(&mut child, params.timeout)?;
        if !status.success() {
            let stderr =
                std::fs::read_to_string(workdir.path().join("stderr.log")).unwrap_or_default();
            let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            warn!(code = ?status.code(), stderr = detail, "tesseract failed");
            return Err(recognition(format!(
                "{} exited with {status}: {detail}",
                self.command
            )));
        }

        let text = std::fs::read_to_string(output_base.with_extension("txt"))
            .map_err(|err| recognition(format!("no recognition output: {err}")))?;
        debug!(chars = text.chars().count(), "recognition complete");
        Ok(text)
    }
}

/// Wait for `child` to exit, killing it once `timeout` has elapsed.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!(?timeout, "recognizer overran its time limit, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(recognition(format!(
                    "timed out after {}s",
                    timeout.as_secs_f32()
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                return Err(recognition(format!("lost track of recognizer: {err}")));
            }
        }
    }
}

fn recognition(message: String) -> LesewerkError {
    LesewerkError::Recognition(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(params: &RecognitionParams) -> Vec<String> {
        TesseractCli::arguments(Path::new("in.png"), Path::new("out"), params)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn detection_pass_uses_engine_defaults() {
        assert_eq!(
            args_as_strings(&RecognitionParams::detection()),
            ["in.png", "out", "-l", "chi_sim+eng"]
        );
    }

    #[test]
    fn full_pass_carries_fixed_configuration() {
        let args = args_as_strings(&RecognitionParams::full(LanguageOrder::EnglishFirst));
        assert_eq!(
            args,
            [
                "in.png",
                "out",
                "-l",
                "eng+chi_sim",
                "--psm",
                "6",
                "--oem",
                "1",
                "-c",
                "preserve_interword_spaces=1",
                "-c",
                "tessedit_char_blacklist=|\\`~",
            ]
        );
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(RecognitionParams::full(LanguageOrder::ChineseFirst).timeout, DEFAULT_TIMEOUT);
        let quick = RecognitionParams::detection().with_timeout(Duration::from_secs(2));
        assert_eq!(quick.timeout, Duration::from_secs(2));
    }

    #[test]
    fn missing_executable_is_a_recognition_error() {
        let cli = TesseractCli::new("/nonexistent/tesseract");
        let image = RgbImage::new(4, 4);
        let err = cli
            .recognize(&image, &RecognitionParams::detection())
            .unwrap_err();
        assert!(matches!(err, LesewerkError::Recognition(ref m) if m.contains("not found")));
    }

    #[cfg(unix)]
    #[test]
    fn overrunning_process_is_killed() {
        let Ok(mut child) = Command::new("sleep").arg("5").spawn() else {
            return;
        };
        let started = Instant::now();
        let err = wait_with_deadline(&mut child, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, LesewerkError::Recognition(ref m) if m.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn finished_process_reports_status() {
        let Ok(mut child) = Command::new("true").spawn() else {
            return;
        };
        let status = wait_with_deadline(&mut child, Duration::from_secs(5)).unwrap();
        assert!(status.success());
    }
}
