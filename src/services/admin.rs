use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use slog::Logger;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{PartAdminUpdate, PartRecord},
    repositories::{BomRepository, PartRepository},
    services::images::{image_extension, ImageService, PART_IMAGE_EXTENSIONS},
    store::{Blob, BlobStore},
};

/// Admin surface: per-part metadata edits and image uploads
#[derive(Clone, Debug)]
pub struct AdminService {
    parts: Arc<PartRepository>,
    boms: Arc<BomRepository>,
    images: Arc<ImageService>,
    blobs: Arc<dyn BlobStore>,
    logger: Logger,
}

impl AdminService {
    pub fn new(
        parts: Arc<PartRepository>,
        boms: Arc<BomRepository>,
        images: Arc<ImageService>,
        blobs: Arc<dyn BlobStore>,
        logger: Logger,
    ) -> Self {
        Self {
            parts,
            boms,
            images,
            blobs,
            logger,
        }
    }

    /// Merges the present admin fields into the stored part and returns the result
    #[instrument(skip(self, update))]
    pub async fn update_part(
        &self,
        code: &str,
        update: PartAdminUpdate,
    ) -> Result<PartRecord, ServiceError> {
        update.validate()?;
        if update.is_empty() {
            return Err(ServiceError::ValidationError(
                "update contains no admin fields".to_string(),
            ));
        }

        let merged = self
            .parts
            .merge_admin(code, &update)
            .await
            .map_err(|e| {
                error!("Failed to merge admin fields for {}: {}", code, e);
                ServiceError::from(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", code)))?;

        counter!("admin.parts.updated", 1);
        slog::info!(self.logger, "part admin fields updated";
            "code" => code,
            "notes" => update.notes.is_some(),
            "year" => update.year.as_deref().unwrap_or("-"),
            "obsolete_date" => update.obsolete_date.as_deref().unwrap_or("-"),
            "alternatives" => merged.admin.alternatives.join(","));
        info!("Part updated: code={}", code);

        Ok(merged)
    }

    /// Stores `{code}.{ext}` and returns its URL. The part must exist.
    ///
    /// Images of the part under the other extensions are removed so the
    /// resolver, which prefers png over jpg over webp, serves the new upload.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_part_image(
        &self,
        code: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, ServiceError> {
        let ext = image_extension(content_type).ok_or_else(|| {
            ServiceError::InvalidInput(format!("unsupported image type {}", content_type))
        })?;
        if data.is_empty() {
            return Err(ServiceError::InvalidInput("image data is empty".to_string()));
        }
        if self.parts.find(code).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Part {} not found", code)));
        }

        let path = format!("{}.{}", code, ext);
        self.blobs
            .upload(
                &path,
                Blob {
                    content_type: content_type.to_string(),
                    data,
                },
            )
            .await
            .map_err(|e| {
                error!("Failed to upload part image {}: {}", path, e);
                ServiceError::from(e)
            })?;
        for stale in PART_IMAGE_EXTENSIONS.iter().filter(|other| **other != ext) {
            let stale_path = format!("{}.{}", code, stale);
            if let Err(e) = self.blobs.delete(&stale_path).await {
                warn!("Failed to remove superseded image {}: {}", stale_path, e);
            }
        }
        self.images.invalidate(code).await;

        counter!("admin.parts.images_uploaded", 1);
        slog::info!(self.logger, "part image uploaded"; "code" => code, "path" => path.as_str());

        Ok(self.blobs.public_url(&path))
    }

    /// Drops every cached catalogue, BoM and image snapshot
    #[instrument(skip(self))]
    pub async fn invalidate_caches(&self) {
        self.parts.invalidate().await;
        self.boms.invalidate().await;
        self.images.clear().await;
        slog::info!(self.logger, "caches invalidated");
    }
}
