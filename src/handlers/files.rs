//! File management handlers
//!
//! Listing, upload, download, delete, create, and rename. Every client path
//! goes through [`Storage`](crate::storage::Storage) resolution before it
//! touches the filesystem.

use axum::extract::{Multipart, Query, State};
use axum::{Form, Json};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{debug, info};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::error::{FileServerError, StorageError};
use crate::server::state::AppState;
use crate::storage::{DirectoryListing, EntryKind, SortKey, SortOrder};
use crate::transfer;

/// Multipart field carrying uploaded files.
pub const UPLOAD_FIELD: &str = "files[]";

const XHR_HEADER: &str = "x-requested-with";
const XHR_VALUE: &str = "XMLHttpRequest";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub path: String,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateForm {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameForm {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
    #[serde(default)]
    pub path: String,
}

/// `GET /` and `GET /list`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DirectoryListing>, FileServerError> {
    let key = SortKey::from_query(query.sort.as_deref());
    let order = SortOrder::from_query(query.order.as_deref(), key);
    let listing = state.storage.list_directory(&query.path, key, order).await?;
    Ok(Json(listing))
}

/// `POST /upload?path=<dir>`: stores every `files[]` part in `dir`.
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<DirQuery>,
    mut multipart: Multipart,
) -> Result<&'static str, FileServerError> {
    let dir = state.storage.resolve(&query.path)?;
    let mut stored = 0usize;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| StorageError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let (pending, mut file) = state.storage.create_upload_target(&dir, &filename).await?;

        let written = async {
            let mut bytes = 0u64;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| StorageError::InvalidUpload(e.body_text()))?
            {
                file.write_all(&chunk).await.map_err(StorageError::Io)?;
                bytes += chunk.len() as u64;
            }
            file.flush().await.map_err(StorageError::Io)?;
            Ok::<u64, StorageError>(bytes)
        }
        .await;
        drop(file);

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                state.storage.discard_upload(&pending).await;
                return Err(e.into());
            }
        };
        state.storage.commit_upload(&pending).await?;
        info!(
            "Uploaded {} ({} bytes)",
            state.storage.display(&pending.target),
            bytes
        );
        stored += 1;
    }

    debug!("Upload request stored {} file(s)", stored);
    Ok("upload complete")
}

/// `GET /download?file=<name>&path=<dir>`, with optional single-range support.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Result<Response, FileServerError> {
    if query.file.is_empty() {
        return Err(StorageError::InvalidName("no file specified".into()).into());
    }
    let target = state.storage.resolve_entry(&query.path, &query.file)?;

    // An empty Range header counts as absent; one that is not valid text is
    // treated as malformed.
    let range = headers
        .get(header::RANGE)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_str().unwrap_or("bytes=?"));

    transfer::respond(&target, range).await
}

/// `GET|POST /delete?file=<name>&path=<dir>`
///
/// Script callers (`X-Requested-With: XMLHttpRequest`) get a plain 200;
/// everyone else is redirected back to the directory view.
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Result<Response, FileServerError> {
    state.storage.delete_entry(&query.path, &query.file).await?;

    let from_script = headers
        .get(XHR_HEADER)
        .is_some_and(|value| value.as_bytes() == XHR_VALUE.as_bytes());
    if from_script {
        return Ok((StatusCode::OK, "deleted").into_response());
    }

    let location = serde_urlencoded::to_string([("path", query.path.as_str())])
        .map(|q| format!("/?{q}"))
        .unwrap_or_else(|_| "/".to_string());
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// `POST /create` with form fields `type`, `name`, `path`.
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CreateForm>,
) -> Result<&'static str, FileServerError> {
    if form.name.is_empty() {
        return Err(StorageError::InvalidName("name cannot be empty".into()).into());
    }
    let kind = EntryKind::from_form(&form.kind)
        .ok_or_else(|| StorageError::InvalidName(format!("unknown type {:?}", form.kind)))?;

    state.storage.create_entry(&form.path, &form.name, kind).await?;
    Ok(match kind {
        EntryKind::File => "file created",
        EntryKind::Folder => "folder created",
    })
}

/// `POST /rename` with form fields `old`, `new`, `path`.
pub async fn rename(
    State(state): State<AppState>,
    Form(form): Form<RenameForm>,
) -> Result<&'static str, FileServerError> {
    state
        .storage
        .rename_entry(&form.path, &form.old, &form.new)
        .await?;
    Ok("renamed")
}
