// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk — extract page ranges from e-books.
//
// `lesewerk parse` prints one range and exits; `lesewerk serve` runs an MCP
// server on stdio with the `parse_ebook` tool. Logs go to stderr so stdout
// only ever carries results.

mod mcp;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lesewerk_core::error::Result;
use lesewerk_core::human_errors::humanize_error;
use lesewerk_core::LesewerkConfig;
use lesewerk_document::DocumentExtractor;

use crate::mcp::LesewerkServer;

#[derive(Debug, Parser)]
#[command(name = "lesewerk", author, version, about = "Page-range text extraction for e-books")]
struct Cli {
    /// JSON configuration file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the text of a page range
    Parse {
        /// PDF, EPUB, DOC, DOCX, MOBI, CHM or TXT file
        file: PathBuf,

        /// First page (1-indexed)
        #[arg(long, default_value_t = 1)]
        start: u32,

        /// Last page; defaults to the end of the document
        #[arg(long)]
        end: Option<u32>,

        /// Recognize images on every page, not only on pages without usable text
        #[arg(long)]
        ocr: bool,
    },

    /// Serve the `parse_ebook` tool over MCP on stdin and stdout
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is normal.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            error!(kind = err.kind(), error = %err, "lesewerk failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut extractor = DocumentExtractor::from_config(&config)?;

    match cli.command {
        Command::Parse {
            file,
            start,
            end,
            ocr,
        } => {
            let text = extractor.parse_ebook(&file, start, end, ocr)?;
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
            stdout.flush()?;
        }
        Command::Serve => {
            info!(version = env!("CARGO_PKG_VERSION"), "lesewerk starting");
            mcp::serve_stdio(LesewerkServer::new(extractor)).await?;
        }
    }
    Ok(())
}

/// Defaults, then the JSON file if given, then the environment.
fn load_config(path: Option<&Path>) -> Result<LesewerkConfig> {
    let mut config = match path {
        Some(path) => LesewerkConfig::from_json_file(path)?,
        None => LesewerkConfig::default(),
    };
    config.apply_lookup(|key| std::env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_arguments() {
        let cli = Cli::try_parse_from(["lesewerk", "parse", "book.pdf", "--start", "3", "--ocr"]).unwrap();
        match cli.command {
            Command::Parse {
                file,
                start,
                end,
                ocr,
            } => {
                assert_eq!(file, PathBuf::from("book.pdf"));
                assert_eq!(start, 3);
                assert_eq!(end, None);
                assert!(ocr);
            }
            Command::Serve => panic!("expected parse"),
        }
    }

    #[test]
    fn json_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesewerk.json");
        std::fs::write(&path, r#"{ "ocr_dpi": 150 }"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.ocr_dpi, 150);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/lesewerk.json"))).is_err());
    }
}
