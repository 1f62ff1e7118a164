//! Frontend bundle serving with client-side routing fallback.
//!
//! The built single-page app is read into memory once at startup. Requests
//! for files in the bundle get the file; anything else is redirected to `/`
//! so the app's router can take over.

use crate::api::AppState;
use crate::error::AssetError;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Document served for `/`.
pub const INDEX: &str = "index.html";

/// One file of the bundle.
#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Bytes,
    pub content_type: String,
    pub etag: String,
}

impl Asset {
    pub fn new(path: &str, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let digest = Sha256::digest(&bytes);
        let etag = format!("\"{}\"", hex::encode(&digest[..16]));

        Self {
            bytes,
            content_type,
            etag,
        }
    }

    /// Whether an `If-None-Match` header value matches this asset.
    fn matches(&self, if_none_match: &str) -> bool {
        if_none_match.trim() == "*"
            || if_none_match
                .split(',')
                .map(|tag| tag.trim().trim_start_matches("W/"))
                .any(|tag| tag == self.etag)
    }
}

/// Immutable set of frontend files keyed by `/`-separated relative path.
#[derive(Debug, Default)]
pub struct AssetBundle {
    files: HashMap<String, Asset>,
}

impl AssetBundle {
    /// Read every file under `dir`.
    pub async fn load(dir: &Path) -> Result<Self, AssetError> {
        let mut files = HashMap::new();
        let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await.map_err(io_err(&current))?;
            while let Some(entry) = entries.next_entry().await.map_err(io_err(&current))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(io_err(&path))?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = bundle_key(dir, &path) else {
                    continue;
                };
                let bytes = fs::read(&path).await.map_err(io_err(&path))?;
                debug!(path = %key, size = bytes.len(), "Loaded asset");
                files.insert(key.clone(), Asset::new(&key, bytes));
            }
        }

        if !files.contains_key(INDEX) {
            return Err(AssetError::MissingIndex(dir.to_path_buf()));
        }

        info!("Loaded {} frontend files from {:?}", files.len(), dir);
        Ok(Self { files })
    }

    /// Build a bundle from in-memory files.
    pub fn from_files<I, K, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<Bytes>,
    {
        let files = files
            .into_iter()
            .map(|(path, bytes)| {
                let path = path.into();
                let asset = Asset::new(&path, bytes);
                (path, asset)
            })
            .collect();
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Find the asset for a request path. A directory resolves to its
    /// `index.html`.
    pub fn resolve(&self, request_path: &str) -> Option<&Asset> {
        let path = normalize_path(request_path);
        self.files.get(path).or_else(|| {
            let dir = path.trim_end_matches('/');
            self.files.get(&format!("{}/{}", dir, INDEX))
        })
    }
}

/// Strip the leading separator; the root maps to `index.html`.
pub fn normalize_path(request_path: &str) -> &str {
    let path = request_path.strip_prefix('/').unwrap_or(request_path);
    if path.is_empty() {
        INDEX
    } else {
        path
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError {
    let path = path.to_path_buf();
    move |source| AssetError::Io { path, source }
}

fn bundle_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.iter().map(|p| p.to_str()).collect();
    Some(parts?.join("/"))
}

/// Serve a bundle file, or redirect to `/` when the path isn't in the bundle.
pub async fn serve_asset(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let asset = urlencoding::decode(uri.path())
        .ok()
        .and_then(|path| state.assets.resolve(&path).cloned());

    let Some(asset) = asset else {
        debug!(path = %uri.path(), "Not in bundle, redirecting to /");
        return (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response();
    };

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| asset.matches(v));

    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, asset.etag)]).into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::ETAG, asset.etag),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        asset.bytes,
    )
        .into_response()
}
