// src/multipart.rs
//! Reads the single `file` field of a multipart upload.

use actix_multipart::Multipart;
use futures_util::stream::StreamExt;
use tracing::warn;

use crate::errors::ApiError;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

fn malformed(err: actix_multipart::MultipartError) -> ApiError {
    warn!(error = %err, "Malformed multipart body");
    ApiError::ValidationError("Malformed multipart body".into())
}

/// Stream the `file` field into memory.
///
/// `check_name` sees the part's filename before any body bytes are read and
/// returns the name to keep. With `limit` set, reading stops with
/// [`ApiError::PayloadTooLarge`] as soon as the body grows past it. Other
/// fields are drained and ignored.
pub async fn read_upload<F>(
    payload: &mut Multipart,
    limit: Option<usize>,
    check_name: F,
) -> Result<Upload, ApiError>
where
    F: FnOnce(Option<&str>) -> Result<String, ApiError>,
{
    let mut check_name = Some(check_name);

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        if name.as_deref() != Some(FILE_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(malformed)?;
            }
            continue;
        }

        let check = match check_name.take() {
            Some(check) => check,
            // Only the first `file` part counts.
            None => continue,
        };
        let filename = check(filename.as_deref())?;

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk.map_err(malformed)?;
            if let Some(max_bytes) = limit {
                if data.len() + bytes.len() > max_bytes {
                    return Err(ApiError::PayloadTooLarge { max_bytes });
                }
            }
            data.extend_from_slice(&bytes);
        }

        return Ok(Upload {
            filename,
            data,
        });
    }

    Err(ApiError::ValidationError("No file provided".into()))
}
