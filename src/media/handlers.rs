use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};

use super::services::{ext_from_mime, store_image};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadedMedia {
    pub url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /media/upload (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<UploadedMedia>)> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let Some(ext) = ext_from_mime(&content_type) else {
            warn!(%content_type, "unsupported upload type");
            return Err(AppError::validation(format!(
                "unsupported file type {content_type}; expected jpeg, png, webp or heic"
            )));
        };
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("could not read file: {e}")))?;
        if body.is_empty() {
            return Err(AppError::validation("file is empty"));
        }

        let url = store_image(state.storage.as_ref(), body, &content_type, ext).await?;
        return Ok((StatusCode::CREATED, Json(UploadedMedia { url })));
    }
    Err(AppError::validation("file is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart(field: &str, content_type: &str, data: &str) -> Body {
        Body::from(format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"a\"\r\n\
             Content-Type: {content_type}\r\n\r\n{data}\r\n--{BOUNDARY}--\r\n"
        ))
    }

    async fn send(body: Body) -> (StatusCode, serde_json::Value) {
        let app = crate::media::router().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn png_upload_returns_public_url() {
        let (status, body) = send(multipart("file", "image/png", "pngbytes")).await;
        assert_eq!(status, StatusCode::CREATED);
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("https://assets.fake.local/uploads/"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected() {
        let (status, body) = send(multipart("file", "text/plain", "hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported"));
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let (status, _) = send(multipart("other", "image/png", "x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
