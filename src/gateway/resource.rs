use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;

/// Scheme of references that point at a locally stored transient image.
pub const TRANSIENT_SCHEME: &str = "blob:";

/// Owned handle to an image written to the temp directory.
///
/// The file is removed on [`TransientImage::release`] or when the handle is dropped.
#[derive(Debug)]
pub struct TransientImage {
    reference: String,
    path: PathBuf,
    released: bool,
}

impl TransientImage {
    /// Write image bytes to a uniquely named file and take ownership of it.
    pub async fn persist(dir: &Path, bytes: &[u8]) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .context("Failed to create temp directory")?;

        let id = uuid::Uuid::new_v4();
        let path = dir.join(format!("image_{}.png", id));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write transient image: {}", path.display()))?;

        log::info!("Transient image stored at {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            reference: format!("{}{}", TRANSIENT_SCHEME, id),
            path,
            released: false,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) {
        self.remove_file();
    }

    fn remove_file(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to remove transient image {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for TransientImage {
    fn drop(&mut self) {
        self.remove_file();
    }
}

/// Owned copy of where an image lives, safe to use after the session lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub reference: String,
    pub local: Option<PathBuf>,
}

impl ImageSource {
    /// The transient file is only attached when it backs `reference`.
    pub fn new(reference: &str, transient: Option<&TransientImage>) -> Self {
        Self {
            reference: reference.to_string(),
            local: transient
                .filter(|t| t.reference() == reference)
                .map(|t| t.path().to_path_buf()),
        }
    }
}

/// Resolve an image source to its bytes.
pub async fn load_image(source: &ImageSource, http: &reqwest::Client) -> Result<Vec<u8>> {
    let reference = source.reference.as_str();
    if reference.starts_with(TRANSIENT_SCHEME) {
        let path = source
            .local
            .as_deref()
            .context("Transient image is no longer available")?;
        return tokio::fs::read(path)
            .await
            .context("Transient image is no longer available");
    }

    if reference.starts_with("data:") {
        return decode_data_uri(reference);
    }

    let response = http
        .get(reference)
        .send()
        .await
        .context("Failed to download image")?;
    if !response.status().is_success() {
        anyhow::bail!("Image download failed ({})", response.status());
    }
    let bytes = response.bytes().await.context("Failed to read image body")?;
    Ok(bytes.to_vec())
}

pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri.split_once(',').context("Malformed data URI")?;
    if !header.ends_with(";base64") {
        anyhow::bail!("Unsupported data URI encoding: {}", header);
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("Invalid base64 image data")
}
