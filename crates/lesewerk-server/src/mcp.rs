// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MCP server exposing the `parse_ebook` tool.
//
// Calls are served one at a time by a single extractor, so the page cache is
// shared across the whole session. Extraction is blocking work and runs off
// the async runtime.

use std::sync::Arc;

use rmcp::{
    ServerHandler, ServiceExt, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, schemars::JsonSchema, tool, tool_handler,
    tool_router,
};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::human_errors::humanize_error;
use lesewerk_document::DocumentExtractor;

/// Name reported to clients during the handshake.
pub const SERVER_NAME: &str = "lesewerk";
/// Longest accepted `file_path`, in characters.
pub const MAX_PATH_LEN: usize = 255;

/// Arguments of `parse_ebook`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ParseEbookParams {
    /// Path of the e-book file (PDF, EPUB, DOC, DOCX, MOBI, CHM or TXT)
    #[schemars(length(max = 255))]
    pub file_path: String,
    /// First page to extract, starting at 1
    #[schemars(range(min = 1))]
    pub start_page: u32,
    /// Last page to extract; omit to read to the end of the book
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub end_page: Option<u32>,
    /// Also recognize the images of every page, not only of pages without usable text
    #[serde(default)]
    pub use_ocr: bool,
}

#[derive(Clone)]
pub struct LesewerkServer {
    extractor: Arc<Mutex<DocumentExtractor>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LesewerkServer {
    pub fn new(extractor: DocumentExtractor) -> Self {
        Self {
            extractor: Arc::new(Mutex::new(extractor)),
            tool_router: Self::tool_router(),
        }
    }

    /// Extract a page range from an e-book as labelled plain text
    #[tool(
        description = "Parse a page range of an e-book in one of six formats (PDF/EPUB/Word/MOBI/TXT/CHM) and return its text. Each page starts with a `=== Page N/TOTAL ===` header. Scanned PDF pages are recognized with OCR; set use_ocr to recognize images on every page.",
        annotations(title = "E-book parser", read_only_hint = true, destructive_hint = false)
    )]
    async fn parse_ebook(
        &self,
        Parameters(params): Parameters<ParseEbookParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        if params.file_path.chars().count() > MAX_PATH_LEN {
            warn!(len = params.file_path.chars().count(), "file_path too long");
            return Err(ErrorData::invalid_params(
                format!("file_path must be at most {MAX_PATH_LEN} characters"),
                None,
            ));
        }
        debug!(
            path = %params.file_path,
            start = params.start_page,
            end = ?params.end_page,
            use_ocr = params.use_ocr,
            "parse_ebook"
        );

        let extractor = Arc::clone(&self.extractor);
        let outcome = tokio::task::spawn_blocking(move || {
            extractor.blocking_lock().parse_ebook(
                &params.file_path,
                params.start_page,
                params.end_page,
                params.use_ocr,
            )
        })
        .await
        .map_err(|err| ErrorData::internal_error(format!("extraction task failed: {err}"), None))?;

        Ok(match outcome {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(err) => {
                if err.is_input_error() {
                    warn!(kind = err.kind(), error = %err, "request rejected");
                } else {
                    error!(kind = err.kind(), error = %err, "extraction failed");
                }
                CallToolResult::error(vec![Content::text(failure_text(&err))])
            }
        })
    }
}

#[tool_handler]
impl ServerHandler for LesewerkServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Multi-format e-book reader: parse_ebook returns the text of a page range."
                    .into(),
            ),
        }
    }
}

/// The tool-error body: kind, what went wrong, and what to do about it.
fn failure_text(err: &LesewerkError) -> String {
    let human = humanize_error(err);
    format!(
        "failed to parse e-book [{}]: {err}\n{}\n{}",
        err.kind(),
        human.message,
        human.suggestion
    )
}

/// Serve one MCP session over `transport` until the client disconnects.
pub async fn serve<R, W>(server: LesewerkServer, transport: (R, W)) -> Result<()>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let service = server
        .serve(transport)
        .await
        .map_err(|err| LesewerkError::Transport(err.to_string()))?;
    info!("MCP session initialized");
    let reason = service
        .waiting()
        .await
        .map_err(|err| LesewerkError::Transport(err.to_string()))?;
    info!(?reason, "MCP session closed");
    Ok(())
}

/// Serve MCP on stdin and stdout.
pub async fn serve_stdio(server: LesewerkServer) -> Result<()> {
    info!("serving MCP on stdio");
    serve(server, rmcp::transport::io::stdio()).await
}
