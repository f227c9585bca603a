use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const NOT_FOUND: &str = "File not found";

/// Stream a finished audio file from the output directory as an attachment.
pub async fn file_handler(
    Extension(state): Extension<AxumAppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let output_dir = &state.server_deps.settings.output_dir;
    let path = resolve_artifact(output_dir, &filename)
        .await
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to open artifact");
        ApiError::not_found(NOT_FOUND)
    })?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        filename.replace(['"', '\r', '\n'], "")
    );

    let mut response = (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }

    Ok(response)
}

/// Resolve `filename` to a regular file directly inside `output_dir`.
///
/// Anything that is not a single plain path component, or that resolves
/// (through symlinks) outside the directory, is treated as missing.
pub async fn resolve_artifact(output_dir: &FsPath, filename: &str) -> Option<PathBuf> {
    if filename.contains(['/', '\\']) {
        return None;
    }
    let mut components = FsPath::new(filename).components();
    let name = match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name,
        _ => return None,
    };

    let root = tokio::fs::canonicalize(output_dir).await.ok()?;
    let resolved = tokio::fs::canonicalize(root.join(name)).await.ok()?;
    if !resolved.starts_with(&root) {
        return None;
    }

    let metadata = tokio::fs::metadata(&resolved).await.ok()?;
    metadata.is_file().then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("song.mp3"), b"audio").unwrap();

        let resolved = resolve_artifact(dir.path(), "song.mp3").await.unwrap();
        assert_eq!(resolved.file_name().unwrap(), "song.mp3");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_artifact(dir.path(), "nope.mp3").await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("downloads");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(root.path().join("secret.txt"), b"x").unwrap();

        for name in ["../secret.txt", "..", ".", "", "/etc/passwd", "a\\b", "sub/x.mp3"] {
            assert!(
                resolve_artifact(&output, name).await.is_none(),
                "{:?} should not resolve",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        assert!(resolve_artifact(dir.path(), "nested").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_escaping_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("downloads");
        std::fs::create_dir(&output).unwrap();
        let outside = root.path().join("outside.mp3");
        std::fs::write(&outside, b"x").unwrap();
        std::os::unix::fs::symlink(&outside, output.join("link.mp3")).unwrap();

        assert!(resolve_artifact(&output, "link.mp3").await.is_none());
    }
}
