use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

// Single-page UI embedded at compile time
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct UiAssets;

/// Serve the UI's index page
pub async fn serve_index() -> Response {
    serve_asset::<UiAssets>("index.html")
}

/// Serve any other embedded asset by path, 404 if absent
pub async fn serve_ui_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    serve_asset::<UiAssets>(path)
}

fn serve_asset<E: RustEmbed>(path: &str) -> Response {
    match E::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
