//! Video library: importing user-picked files into app-managed storage and
//! serving them back to the webview over a restricted `media://` scheme.

use std::{
    borrow::Cow,
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::Serialize;
use tauri::{
    http::{header, Response, StatusCode},
    AppHandle, Manager, Runtime,
};
use tauri_plugin_dialog::DialogExt;

pub const MEDIA_SCHEME: &str = "media";
const VIDEOS_DIR: &str = "videos";
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedVideo {
    pub file_name: String,
    pub url: String,
}

/// Opens the native picker (videos only) and copies the selection into the
/// app-managed library. Returns `None` on cancel, leaving settings exactly
/// as they were; the frontend stores the returned URL via the settings
/// save.
#[tauri::command]
pub fn import_video(app_handle: AppHandle) -> Result<Option<ImportedVideo>, String> {
    let picked = app_handle
        .dialog()
        .file()
        .add_filter("Videos", &VIDEO_EXTENSIONS)
        .blocking_pick_file();
    let Some(picked) = picked else {
        return Ok(None);
    };
    let source = picked.into_path().map_err(|e| e.to_string())?;
    import_into_library(&app_handle, &source)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn import_into_library<R: Runtime>(
    app_handle: &AppHandle<R>,
    source: &Path,
) -> Result<ImportedVideo> {
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("selected file has no usable name"))?
        .to_string();

    let library = videos_dir(app_handle)?;
    fs::create_dir_all(&library)
        .with_context(|| format!("Failed to create video library at {}", library.display()))?;

    let destination = library.join(&file_name);
    fs::copy(source, &destination).with_context(|| {
        format!(
            "Failed to copy {} into {}",
            source.display(),
            destination.display()
        )
    })?;

    info!("imported video {}", destination.display());
    Ok(ImportedVideo {
        url: media_url(&file_name),
        file_name,
    })
}

fn videos_dir<R: Runtime>(app_handle: &AppHandle<R>) -> Result<PathBuf> {
    Ok(app_handle
        .path()
        .app_data_dir()
        .map_err(|err| anyhow!(err))?
        .join(VIDEOS_DIR))
}

pub fn media_url(file_name: &str) -> String {
    format!("{MEDIA_SCHEME}://localhost/{file_name}")
}

/// `media://` request handler. Read-only, and confined to the video
/// library: the request path must name a plain file inside it, so `..`,
/// nested paths, and absolute paths are all refused.
pub fn serve<R: Runtime>(
    app_handle: &AppHandle<R>,
    request: &tauri::http::Request<Vec<u8>>,
) -> Response<Cow<'static, [u8]>> {
    let root = match videos_dir(app_handle) {
        Ok(root) => root,
        Err(err) => {
            warn!("media request failed: {err}");
            return status_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let Some(path) = resolve_media_path(&root, request.uri().path()) else {
        warn!("media request refused: {}", request.uri());
        return status_response(StatusCode::FORBIDDEN);
    };

    match fs::read(&path) {
        Ok(bytes) => {
            let mut response = Response::new(Cow::Owned(bytes));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static(content_type_for(&path)),
            );
            response
        }
        Err(_) => status_response(StatusCode::NOT_FOUND),
    }
}

/// Maps a request path onto a file inside the library, or `None` when the
/// path tries to reach anywhere else.
fn resolve_media_path(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let name = uri_path.trim_start_matches('/');
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    let mut components = candidate.components();
    let only = components.next()?;
    if components.next().is_some() {
        return None;
    }
    match only {
        Component::Normal(file_name) => Some(root.join(file_name)),
        _ => None,
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

fn status_response(status: StatusCode) -> Response<Cow<'static, [u8]>> {
    const EMPTY: &[u8] = &[];
    let mut response = Response::new(Cow::Borrowed(EMPTY));
    *response.status_mut() = status;
    response
}
