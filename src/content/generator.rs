//! Produces the response body for a resolved source.

use std::io;
use std::path::Path;

use anyhow::Context;
use bytes::Bytes;

use crate::content::random::RandomSource;
use crate::content::resolver::ResolvedSource;
use crate::http::response::StatusCode;

pub const NOT_FOUND_BODY: &str = "<html><body><h1>404 Not Found</h1></body></html>";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Status and body for one request, built once and written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ResponsePayload {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::Ok,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NotFound,
            body: Bytes::from_static(NOT_FOUND_BODY.as_bytes()),
        }
    }

    pub fn internal_error() -> Self {
        Self {
            status: StatusCode::InternalServerError,
            body: Bytes::new(),
        }
    }
}

/// Wraps one CSV line as a page. The line is inserted verbatim, unescaped.
pub fn csv_page(line: &str) -> String {
    format!("<html><body><h1>{}</h1></body></html>", line)
}

/// Builds the payload for `source`. I/O failures become a `500` here and
/// never reach the caller.
pub async fn generate(source: ResolvedSource, random: &dyn RandomSource) -> ResponsePayload {
    match try_generate(&source, random).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(source = ?source, error = %format!("{:#}", e), "Content generation failed");
            ResponsePayload::internal_error()
        }
    }
}

/// Like [`generate`] but hands the failure back instead of mapping it to `500`.
pub async fn try_generate(
    source: &ResolvedSource,
    random: &dyn RandomSource,
) -> anyhow::Result<ResponsePayload> {
    match source {
        ResolvedSource::NotFound => Ok(ResponsePayload::not_found()),

        ResolvedSource::StaticFile(path) => {
            if !is_regular_file(path).await? {
                return Ok(ResponsePayload::not_found());
            }
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(ResponsePayload::ok(bytes))
        }

        ResolvedSource::RandomCsv(path) => {
            if path.as_os_str().is_empty() || !is_regular_file(path).await? {
                return Ok(ResponsePayload::not_found());
            }
            let raw = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let text = String::from_utf8_lossy(&raw);
            let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&text);
            let lines: Vec<&str> = text.lines().collect();
            if lines.is_empty() {
                anyhow::bail!("{} has no lines", path.display());
            }

            let line = lines[random.pick(lines.len())];
            Ok(ResponsePayload::ok(csv_page(line)))
        }
    }
}

/// `false` when nothing is at `path` or it is not a regular file.
async fn is_regular_file(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
