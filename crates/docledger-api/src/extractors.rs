//! # Multipart Extraction
//!
//! Uploads arrive as `multipart/form-data`. [`read_form`] buffers the whole
//! form, mapping rejections and stream errors to [`AppError::BadRequest`].
//! Handlers take `Result<Multipart, MultipartRejection>` so a wrong content
//! type produces the structured error body instead of axum's plain text.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use docledger_core::ContentDigest;

use crate::error::AppError;

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Parts always buffered as bytes, with or without a filename.
pub const FILE_PARTS: &[&str] = &["document", "archive"];

/// A file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename from the part's `Content-Disposition`, if any.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    /// Text field value, trimmed. Empty values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("missing form field '{name}'")))
    }

    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.files
            .remove(name)
            .ok_or_else(|| AppError::BadRequest(format!("missing file part '{name}'")))
    }

    /// Optional client-computed `content_hash` field.
    pub fn content_hash(&self) -> Result<Option<ContentDigest>, AppError> {
        self.text("content_hash")
            .map(|raw| raw.parse::<ContentDigest>().map_err(AppError::from))
            .transpose()
    }
}

/// Buffer every part of a multipart request.
///
/// Parts named in [`FILE_PARTS`] or carrying a filename are kept as bytes;
/// the rest are decoded as UTF-8 text. An empty filename counts as none.
pub async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> Result<UploadForm, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field
            .file_name()
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        if file_name.is_some() || FILE_PARTS.contains(&name.as_str()) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.files.insert(
                name,
                UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                },
            );
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}
