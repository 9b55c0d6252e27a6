//! Multipart form parsing helpers
//!
//! Extracts the uploaded image from a multipart/form-data request.

use axum::extract::Multipart;
use tracing::debug;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// An image uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart upload
#[derive(Debug, Default)]
pub struct MultipartFields {
    file: Option<FileField>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// The `file` field is validated for Content-Type and size; other fields
    /// are ignored.
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut file: Option<FileField> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name != FILE_FIELD {
                debug!(field = %name, "Ignoring unknown multipart field");
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let file_name = field.file_name().map(|s| s.to_string());
            validate_content_type(content_type.as_deref())?;

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                .to_vec();
            validate_file_size(data.len(), max_file_size)?;

            file = Some(FileField {
                data,
                content_type,
                file_name,
            });
        }

        Ok(Self { file })
    }

    /// Take the uploaded file
    ///
    /// Returns an error if no file was uploaded.
    pub fn require_file(self) -> Result<FileField, ApiError> {
        self.file.ok_or_else(|| {
            ApiError::bad_request("No file provided. Use 'file' field in multipart form.")
        })
    }
}
