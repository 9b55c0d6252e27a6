//! Request validation module
//!
//! Provides validation utilities for image uploads and image URIs.

use crate::error::ApiError;

/// Allowed MIME type prefixes for image uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// URI schemes the vision service can fetch from
const ALLOWED_URI_SCHEMES: &[&str] = &["https://", "http://", "gs://"];

/// Default max file size in bytes (15 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 15 * 1024 * 1024;

/// Validates the Content-Type of an uploaded image
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded image
///
/// Empty uploads are rejected too.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Validates an image URI passed to the vision proxy
pub fn validate_image_uri(uri: &str) -> Result<(), ApiError> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(ApiError::bad_request("imageUri is required"));
    }
    let lower = uri.to_lowercase();
    if ALLOWED_URI_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "imageUri must be an http(s):// or gs:// URI",
        ))
    }
}
