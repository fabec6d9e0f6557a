//! Stored file downloads

use std::io::ErrorKind;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
};
use sa_attachments::AttachmentError;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AppState;

/// GET /uploads/*path
///
/// Serves committed files only; staging and anything outside the uploads
/// directory answer 404.
pub async fn download(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let store = state.store();
    let rel = format!("{}/{}", store.layout().uploads_dir(), path);

    let absolute = store.locate(&rel).await.map_err(|e| match e {
        AttachmentError::PathTraversal(_) | AttachmentError::InvalidDestination(_) => {
            ApiError::not_found("File", &path)
        }
        AttachmentError::Io(io) if io.kind() == ErrorKind::NotFound => {
            ApiError::not_found("File", &path)
        }
        other => other.into(),
    })?;

    let body = tokio::fs::read(&absolute).await.map_err(|e| {
        ApiError::from(AttachmentError::Io(e))
    })?;
    let content_type = mime_guess::from_path(&absolute).first_or_octet_stream();

    debug!(path = %rel, size = body.len(), "Serving stored file");
    Ok((download_headers(&content_type), body))
}

/// Uploaded SVG can carry script, so it is only ever downloaded
fn download_headers(content_type: &mime_guess::Mime) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    if content_type.essence_str() == "image/svg+xml" {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        );
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_is_sandboxed() {
        let headers = download_headers(&mime_guess::from_path("logo.svg").first_or_octet_stream());
        assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment");
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "sandbox");

        let headers = download_headers(&mime_guess::from_path("tc.pdf").first_or_octet_stream());
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
    }
}
