//! Module `download`
//!
//! Streams a resolved file to the client, either whole or as the single byte
//! range named by a `Range` header. Dropping the response body (for example
//! when the client disconnects) drops the open file handle with it.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{debug, info};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{FileServerError, RangeError, StorageError};
use crate::transfer::range::parse_single_range;

const OCTET_STREAM: &str = "application/octet-stream";

/// Builds the response for downloading `path`.
///
/// `range` is the raw `Range` header, if one was sent; `None` streams the
/// whole file.
pub async fn respond(path: &Path, range: Option<&str>) -> Result<Response, FileServerError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let metadata = fs::metadata(path)
        .await
        .map_err(|_| StorageError::NotFound(name.clone()))?;
    if metadata.is_dir() {
        return Err(StorageError::IsDirectory(name).into());
    }
    let total_len = metadata.len();
    let mut headers = download_headers(&name);

    let Some(range) = range else {
        let file = File::open(path).await.map_err(StorageError::from)?;
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(total_len));
        info!("Download {} ({} bytes)", name, total_len);
        return Ok((
            StatusCode::OK,
            headers,
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response());
    };

    let range = match parse_single_range(range, total_len) {
        Ok(range) => range,
        Err(err) => return Ok(range_not_satisfiable(headers, total_len, err)),
    };

    let mut file = File::open(path).await.map_err(StorageError::from)?;
    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(StorageError::from)?;

    let length = range.len();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(value) = HeaderValue::from_str(&range.content_range(total_len)) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    info!(
        "Download {} bytes {}-{} ({} of {} bytes)",
        name, range.start, range.end, length, total_len
    );

    Ok((
        StatusCode::PARTIAL_CONTENT,
        headers,
        Body::from_stream(ReaderStream::new(file.take(length))),
    )
        .into_response())
}

fn download_headers(name: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));

    let sanitized: String = name.chars().filter(|c| *c != '"' && *c != '\\').collect();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{sanitized}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers
}

/// 416 with no body; the unsatisfied length is reported in `Content-Range`.
fn range_not_satisfiable(mut headers: HeaderMap, total_len: u64, err: RangeError) -> Response {
    debug!("Rejecting Range request: {}", err);
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{total_len}")) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    (StatusCode::RANGE_NOT_SATISFIABLE, headers).into_response()
}
