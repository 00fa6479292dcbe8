// src/validation.rs
//! Upload shape checks. The gateway runs all of them before forwarding; the
//! ingestion service only re-checks the extension.

use std::path::Path;

use crate::errors::ApiError;

/// Lower-cased extension including the leading dot, e.g. `.pdf`.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    match extension_of(filename) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

pub fn require_filename(filename: Option<&str>) -> Result<&str, ApiError> {
    match filename.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ApiError::ValidationError("Filename is required".into())),
    }
}

pub fn check_extension(filename: &str, allowed: &[String]) -> Result<(), ApiError> {
    if has_allowed_extension(filename, allowed) {
        Ok(())
    } else {
        Err(ApiError::ValidationError(format!(
            "File type not allowed. Allowed: {}",
            allowed.join(", ")
        )))
    }
}

pub fn check_size(size: usize, max_bytes: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::ValidationError("Empty file".into()));
    }
    if size > max_bytes {
        return Err(ApiError::PayloadTooLarge { max_bytes });
    }
    Ok(())
}

/// Filename checks, run before any body bytes are read.
pub fn check_upload_name(filename: Option<&str>, allowed: &[String]) -> Result<String, ApiError> {
    let name = require_filename(filename)?;
    check_extension(name, allowed)?;
    Ok(name.to_string())
}

/// The ingestion service's own check: the name must end in lower-case `.pdf`.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(".pdf")
}
