//! # rh-storage-placeholder
//!
//! `MediaStore` used until a real object store is wired in.
//! Uploaded bytes are discarded; every CAD file and thumbnail resolves to a
//! fixed URL so the rest of the upload flow can run end to end.

use async_trait::async_trait;
use rh_core::traits::{MediaKind, MediaStore, Upload};
use tracing::info;

pub struct PlaceholderMediaStore {
    file_url: String,
    thumbnail_url: String,
}

impl PlaceholderMediaStore {
    pub fn new(file_url: impl Into<String>, thumbnail_url: impl Into<String>) -> Self {
        Self {
            file_url: file_url.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }
}

#[async_trait]
impl MediaStore for PlaceholderMediaStore {
    async fn save_upload(&self, upload: Upload, kind: MediaKind) -> anyhow::Result<String> {
        let url = match kind {
            MediaKind::CadFile => &self.file_url,
            MediaKind::Thumbnail => &self.thumbnail_url,
        };
        info!(
            kind = ?kind,
            file_name = upload.file_name.as_deref().unwrap_or(""),
            content_type = %upload.content_type,
            size = upload.data.len(),
            url = %url,
            "upload discarded, placeholder url assigned"
        );
        Ok(url.clone())
    }
}
