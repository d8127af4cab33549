//! Static content collection from a UI build directory.

use std::path::{Path, PathBuf};

use strata_common::error::{Result, StrataError};
use strata_common::types::StaticContent;
use walkdir::WalkDir;

use crate::hash::hash_file;

/// File names that are never uploaded.
const IGNORED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Scans `root` recursively into a content set.
///
/// Every regular file becomes one entry keyed by its path relative to
/// `root` with `/` separators. Entries come back sorted by key so that the
/// resources derived from them are declared in a stable order.
///
/// # Errors
///
/// Returns an I/O error if `root` cannot be walked or a file cannot be hashed.
pub fn scan_static_dir(root: &Path) -> Result<Vec<StaticContent>> {
    tracing::info!(root = %root.display(), "scanning static content");
    let root = std::path::absolute(root).map_err(|source| StrataError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(&root, e))?;
        if !entry.file_type().is_file() || is_ignored(entry.path()) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&root).unwrap_or(path);
        let relative_key = relative.to_string_lossy().replace('\\', "/");
        let content_hash = hash_file(path)?;
        tracing::debug!(key = %relative_key, hash = %content_hash, "collected static file");

        entries.push(StaticContent {
            content_type: path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(content_type_for)
                .map(str::to_string),
            relative_key,
            absolute_path: path.to_path_buf(),
            content_hash,
        });
    }

    entries.sort_by(|a, b| a.relative_key.cmp(&b.relative_key));
    tracing::info!(files = entries.len(), "static content collected");
    Ok(entries)
}

/// MIME type for a file extension, if it is a known web asset type.
#[must_use]
pub fn content_type_for(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" | "cjs" => "application/javascript",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "rss" => "application/rss+xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "apng" => "image/apng",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/vnd.microsoft.icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => return None,
    };
    Some(mime)
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| IGNORED_NAMES.contains(&name) || name.starts_with("._"))
}

fn walk_error(root: &Path, error: walkdir::Error) -> StrataError {
    let path = error.path().map_or_else(|| root.to_path_buf(), PathBuf::from);
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop while scanning"));
    StrataError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::hash::hash_bytes;

    fn build_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("static/js")).expect("mkdir");
        fs::write(dir.path().join("index.html"), "<html></html>").expect("write");
        fs::write(dir.path().join("static/js/main.js"), "console.log(1)").expect("write");
        fs::write(dir.path().join("static/blob.bin"), [0u8, 1, 2]).expect("write");
        fs::write(dir.path().join(".DS_Store"), "junk").expect("write");
        dir
    }

    #[test]
    fn scan_collects_sorted_relative_keys() {
        let dir = build_dir();
        let entries = scan_static_dir(dir.path()).expect("scan");
        let keys: Vec<&str> = entries.iter().map(|e| e.relative_key.as_str()).collect();
        assert_eq!(keys, vec!["index.html", "static/blob.bin", "static/js/main.js"]);
        assert!(entries.iter().all(|e| e.absolute_path.is_absolute()));
    }

    #[test]
    fn scan_assigns_content_types_and_hashes() {
        let dir = build_dir();
        let entries = scan_static_dir(dir.path()).expect("scan");
        let index = &entries[0];
        assert_eq!(index.content_type.as_deref(), Some("text/html"));
        assert_eq!(index.content_hash, hash_bytes(b"<html></html>"));
        assert_eq!(entries[1].content_type, None);
        assert_eq!(entries[2].content_type.as_deref(), Some("application/javascript"));
    }

    #[test]
    fn empty_dir_yields_no_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(scan_static_dir(dir.path()).expect("scan").is_empty());
    }

    #[test]
    fn missing_dir_is_io_error() {
        let err = scan_static_dir(Path::new("/nonexistent/build")).unwrap_err();
        assert!(matches!(err, StrataError::Io { .. }), "got: {err}");
    }

    #[test]
    fn content_type_lookup_ignores_case() {
        assert_eq!(content_type_for("PNG"), Some("image/png"));
        assert_eq!(content_type_for("unknown"), None);
    }

    #[test]
    fn content_type_covers_fonts_manifests_and_media() {
        for (extension, mime) in [
            ("webmanifest", "application/manifest+json"),
            ("otf", "font/otf"),
            ("eot", "application/vnd.ms-fontobject"),
            ("avif", "image/avif"),
            ("mp4", "video/mp4"),
            ("webm", "video/webm"),
            ("mp3", "audio/mpeg"),
            ("csv", "text/csv"),
        ] {
            assert_eq!(content_type_for(extension), Some(mime), "{extension}");
        }
    }
}
