//! Multipart form intake
//!
//! File fields are validated before their first byte is written, then
//! streamed into the staging directory under their per-category cap. Text
//! fields are collected into a JSON object that deserializes into the
//! record parameters. Whatever went wrong, nothing stays in staging.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use sa_attachments::{effective_mime, AttachmentStore, UploadBatch, UploadValidator};
use sa_services::AttachmentRequest;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{ApiError, ApiResult};

const REMOVED_FILES: &str = "removedFiles";

/// A parsed record form whose files are already staged
#[derive(Debug)]
pub struct UploadForm {
    pub fields: Map<String, Value>,
    pub uploads: UploadBatch,
    pub removed_files: Vec<String>,
}

impl UploadForm {
    /// Deserialize the text fields into `T`
    ///
    /// Staged files are discarded when the fields do not fit.
    pub async fn into_request<T: DeserializeOwned>(
        self,
        store: &AttachmentStore,
    ) -> ApiResult<(T, AttachmentRequest)> {
        match serde_json::from_value(Value::Object(self.fields)) {
            Ok(params) => Ok((
                params,
                AttachmentRequest::new(self.uploads, self.removed_files),
            )),
            Err(e) => {
                store.discard_all(&self.uploads.paths()).await;
                Err(ApiError::bad_request(format!("Invalid form fields: {}", e)))
            }
        }
    }
}

/// Read a multipart body, staging every file it carries
#[instrument(skip_all, fields(owner_type = %validator.owner_type()))]
pub async fn read_upload_form(
    mut multipart: Multipart,
    validator: &UploadValidator,
    store: &AttachmentStore,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm {
        fields: Map::new(),
        uploads: UploadBatch::new(),
        removed_files: Vec::new(),
    };

    if let Err(e) = read_fields(&mut multipart, validator, store, &mut form).await {
        store.discard_all(&form.uploads.paths()).await;
        return Err(e);
    }

    debug!(
        files = form.uploads.len(),
        fields = form.fields.len(),
        "Multipart form read"
    );
    Ok(form)
}

async fn read_fields(
    multipart: &mut Multipart,
    validator: &UploadValidator,
    store: &AttachmentStore,
    form: &mut UploadForm,
) -> ApiResult<()> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            // browsers send an empty part for a file input left blank
            Some(file_name) if file_name.is_empty() => {}
            Some(file_name) => {
                stage_field(field, name, file_name, validator, store, &mut form.uploads).await?;
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                collect_text(form, &name, value);
            }
        }
    }
    Ok(())
}

async fn stage_field(
    mut field: Field<'_>,
    name: String,
    file_name: String,
    validator: &UploadValidator,
    store: &AttachmentStore,
    batch: &mut UploadBatch,
) -> ApiResult<()> {
    let mime = effective_mime(field.content_type(), &file_name);
    let kind = validator.validate_and_classify(&name, &mime, None)?;
    batch.check_admit(&name, kind, validator.limits())?;

    let mut writer = store
        .staging_area()
        .begin(name, kind, file_name, mime, validator.max_size(kind))
        .await?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                writer.abort().await;
                return Err(multipart_error(e));
            }
        };
        if let Err(e) = writer.write_chunk(&chunk).await {
            writer.abort().await;
            return Err(e.into());
        }
    }

    batch.push(writer.finish().await?);
    Ok(())
}

fn collect_text(form: &mut UploadForm, name: &str, value: String) {
    let key = name.strip_suffix("[]").unwrap_or(name);
    if key == REMOVED_FILES {
        form.removed_files.extend(parse_removed_files(&value));
        return;
    }
    if value.trim().is_empty() {
        return;
    }
    form.fields.insert(key.to_string(), Value::String(value));
}

/// Accept a JSON array, a comma separated list or a single path
pub fn parse_removed_files(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if raw.starts_with('[') {
        if let Ok(paths) = serde_json::from_str::<Vec<String>>(raw) {
            return paths
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
    }
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::bad_request(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_removed_files() {
        assert_eq!(
            parse_removed_files(r#"["uploads/a.pdf", " uploads/b.pdf "]"#),
            vec!["uploads/a.pdf", "uploads/b.pdf"]
        );
        assert_eq!(
            parse_removed_files("uploads/a.pdf, uploads/b.pdf,"),
            vec!["uploads/a.pdf", "uploads/b.pdf"]
        );
        assert_eq!(parse_removed_files("uploads/a.pdf"), vec!["uploads/a.pdf"]);
        assert!(parse_removed_files("  ").is_empty());
        assert!(parse_removed_files("[]").is_empty());
    }

    #[test]
    fn test_collect_text() {
        let mut form = UploadForm {
            fields: Map::new(),
            uploads: UploadBatch::new(),
            removed_files: Vec::new(),
        };

        collect_text(&mut form, "fullName", "Asha".into());
        collect_text(&mut form, "mobile", "".into());
        collect_text(&mut form, "removedFiles[]", "uploads/a.pdf".into());
        collect_text(&mut form, "removedFiles[]", "uploads/b.pdf".into());

        assert_eq!(form.fields.get("fullName"), Some(&Value::String("Asha".into())));
        assert!(!form.fields.contains_key("mobile"));
        assert_eq!(form.removed_files, vec!["uploads/a.pdf", "uploads/b.pdf"]);
    }
}
