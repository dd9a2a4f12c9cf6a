use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::storage::StorageClient;

/// Image types accepted for upload, by MIME type.
pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

pub fn object_key(ext: &str) -> String {
    format!("uploads/{}.{}", Uuid::new_v4(), ext)
}

/// Stores one image and returns its public URL.
pub async fn store_image(
    storage: &dyn StorageClient,
    body: Bytes,
    content_type: &str,
    ext: &str,
) -> anyhow::Result<String> {
    let key = object_key(ext);
    let size = body.len();
    storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;
    info!(%key, size, "image stored");
    Ok(storage.public_url(&key))
}
