use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::error::Error;

pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Parses a `data:image/<ext>;base64,<payload>` string.
pub fn parse_data_uri(input: &str) -> Result<DecodedImage, Error> {
    let rest = input
        .strip_prefix("data:image/")
        .ok_or_else(|| Error::Validation(String::from("Image must be a data URI")))?;

    let (extension, payload) = rest.split_once(";base64,").ok_or_else(|| {
        Error::Validation(String::from("Image data URI must carry a base64 payload"))
    })?;

    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Validation(String::from("Invalid image extension")));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| Error::Validation(String::from("Invalid base64 image payload")))?;

    Ok(DecodedImage {
        extension: extension.to_string(),
        bytes,
    })
}

pub async fn store_image(media_root: &Path, image: DecodedImage) -> Result<String, Error> {
    let directory = media_root.join("recipe").join("images");
    tokio::fs::create_dir_all(&directory).await.map_err(|e| {
        log::error!("Failed to create media directory: {e}");
        Error::Internal(format!("{e}"))
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    let path = directory.join(&file_name);
    tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
        log::error!("Failed to store image: {e}");
        Error::Internal(format!("{e}"))
    })?;

    Ok(format!("recipe/images/{file_name}"))
}

/// Resolves the image field of an incoming recipe payload to a stored path.
/// Data URIs are decoded and written out; anything else is taken to be a
/// path produced by an earlier raw upload.
pub async fn resolve_image(media_root: &Path, image: &str) -> Result<String, Error> {
    if image.starts_with("data:image/") {
        let decoded = parse_data_uri(image)?;
        return store_image(media_root, decoded).await;
    }

    Ok(image.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_decodes_extension_and_payload() {
        let image = parse_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn malformed_data_uris_are_rejected() {
        assert!(parse_data_uri("recipe/images/x.png").is_err());
        assert!(parse_data_uri("data:image/png,aGVsbG8=").is_err());
        assert!(parse_data_uri("data:image/;base64,aGVsbG8=").is_err());
        assert!(parse_data_uri("data:image/png;base64,###").is_err());
    }

    #[tokio::test]
    async fn stored_paths_pass_through_unchanged() {
        let media_root = std::env::temp_dir();
        let path = resolve_image(&media_root, "recipe/images/existing.png")
            .await
            .unwrap();
        assert_eq!(path, "recipe/images/existing.png");
    }

    #[tokio::test]
    async fn data_uris_are_stored_under_the_media_root() {
        let media_root = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let path = resolve_image(&media_root, "data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();
        assert!(path.starts_with("recipe/images/"));
        assert!(path.ends_with(".png"));

        let stored = tokio::fs::read(media_root.join(&path)).await.unwrap();
        assert_eq!(stored, b"hello");

        tokio::fs::remove_dir_all(&media_root).await.unwrap();
    }
}
