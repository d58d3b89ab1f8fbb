//! HTTP surface: upload form, result page and the upload handler.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/` | GET | upload form |
//! | `/result` | GET | empty result page |
//! | `/upload-photos` | POST | result page with the pipeline message |
//! | `/health` | GET | `{"status":"ok"}` |
//!
//! The upload handler answers 200 for rejected files and failed stages; only
//! a body over the configured size limit gets 413.

use crate::error::OcrBriefError;
use crate::orchestrator::Pipeline;
use crate::pipeline::validate::UploadedImage;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn};

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Build the router. The body limit comes from the pipeline's config.
pub fn router(pipeline: Pipeline) -> Router {
    let limit = pipeline.config().max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/result", get(result))
        .route("/health", get(health))
        .route("/upload-photos", post(upload_photos))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(pipeline)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(pipeline: Pipeline, addr: SocketAddr) -> Result<(), OcrBriefError> {
    let server_err = |source| OcrBriefError::Server {
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).await.map_err(server_err)?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(server_err)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn result() -> Html<String> {
    Html(result_page(""))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn upload_photos(State(pipeline): State<Pipeline>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Upload rejected: {}", e.body_text());
            return (StatusCode::PAYLOAD_TOO_LARGE, Html(result_page(""))).into_response();
        }
        Err(e) => {
            warn!("Malformed multipart body: {}", e.body_text());
            None
        }
    };

    let output = pipeline.process(upload).await;
    Html(result_page(&output.message)).into_response()
}

/// Pull the `file` field out of the form. Other fields are ignored.
///
/// A `file` field without a file name counts as no file.
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedImage>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Ok(None);
        };
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedImage::new(filename, bytes.to_vec())));
    }
    Ok(None)
}

// ── Pages ───────────────────────────────────────────────────────────────────

/// Escape text for HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The result page with `message` in the `msg` slot.
pub fn result_page(message: &str) -> String {
    RESULT_HTML.replace("{{msg}}", &escape_html(message))
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ocr-brief</title>
</head>
<body>
<h1>Upload a photo</h1>
<p>The printed text is extracted, summarised and translated.</p>
<form action="/upload-photos" method="post" enctype="multipart/form-data">
<input type="file" name="file" accept="image/*">
<button type="submit">Upload</button>
</form>
</body>
</html>
"#;

const RESULT_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ocr-brief result</title>
</head>
<body>
<h1>Result</h1>
<pre id="msg">{{msg}}</pre>
<p><a href="/">Upload another photo</a></p>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"A&B\"</b>"),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn result_page_fills_msg_slot() {
        let page = result_page("\nTOTAL <12.50>");
        assert!(page.contains("<pre id=\"msg\">\nTOTAL &lt;12.50&gt;</pre>"));
        assert!(!page.contains("{{msg}}"));
    }

    #[test]
    fn empty_result_page() {
        assert!(result_page("").contains("<pre id=\"msg\"></pre>"));
    }

    #[test]
    fn form_posts_file_field() {
        assert!(INDEX_HTML.contains("action=\"/upload-photos\""));
        assert!(INDEX_HTML.contains("name=\"file\""));
    }
}
