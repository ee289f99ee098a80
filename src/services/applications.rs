use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use metrics::counter;
use slog::Logger;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{ApplicationStatus, ImageUpload, NewApplication, PartApplication},
    repositories::ApplicationRepository,
    services::images::image_extension,
    store::{Blob, BlobStore, APPLICATION_IMAGES_PREFIX},
};

/// Ticket workflow: submission and the read contract
#[derive(Clone, Debug)]
pub struct ApplicationService {
    repo: Arc<ApplicationRepository>,
    blobs: Arc<dyn BlobStore>,
    logger: Logger,
}

fn decode_image(image: &ImageUpload) -> Result<Blob, ServiceError> {
    if image_extension(&image.content_type).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "unsupported image type {}",
            image.content_type
        )));
    }
    let data = base64::engine::general_purpose::STANDARD
        .decode(image.data.trim())
        .map_err(|_| ServiceError::InvalidInput("image data is not valid base64".to_string()))?;
    if data.is_empty() {
        return Err(ServiceError::InvalidInput("image data is empty".to_string()));
    }
    Ok(Blob {
        content_type: image.content_type.clone(),
        data: Bytes::from(data),
    })
}

impl ApplicationService {
    pub fn new(repo: Arc<ApplicationRepository>, blobs: Arc<dyn BlobStore>, logger: Logger) -> Self {
        Self {
            repo,
            blobs,
            logger,
        }
    }

    /// Validates and persists a new ticket, returning its id.
    ///
    /// The id comes from the store's key generator and the creation time from
    /// the store's server timestamp. An attached image is uploaded first; the
    /// ticket itself is written in one `set`, so a failed submission leaves
    /// no record behind.
    #[instrument(skip(self, request), fields(requester = %request.requester))]
    pub async fn submit(&self, request: NewApplication) -> Result<String, ServiceError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            counter!("applications.rejected", 1);
            return Err(ServiceError::MissingFields(missing));
        }
        request.validate()?;
        let image = request.image.as_ref().map(decode_image).transpose()?;

        let id = self.repo.next_id();

        let image_path = match image {
            Some(blob) => {
                let path = format!("{}/{}.png", APPLICATION_IMAGES_PREFIX, id);
                self.blobs.upload(&path, blob).await.map_err(|e| {
                    error!("Failed to upload application image: {}", e);
                    ServiceError::from(e)
                })?;
                Some(path)
            }
            None => None,
        };

        self.repo
            .insert(&id, request.to_record(image_path.as_deref()))
            .await
            .map_err(|e| {
                error!("Failed to persist application: {}", e);
                ServiceError::from(e)
            })?;

        counter!("applications.submitted", 1);
        slog::info!(self.logger, "application submitted";
            "id" => id.as_str(),
            "requester" => request.requester.trim(),
            "department" => request.department.trim(),
            "urgency" => request.urgency.to_string(),
            "has_image" => image_path.is_some());
        info!("Application submitted: id={}", id);

        Ok(id)
    }

    /// Every ticket, most recently created first
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<PartApplication>, ServiceError> {
        Ok(self.repo.find_all().await?)
    }

    #[instrument(skip(self))]
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<PartApplication>, ServiceError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn status(&self, id: &str) -> Result<Option<ApplicationStatus>, ServiceError> {
        Ok(self.repo.find_by_id(id).await?.map(|ticket| ticket.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        DocumentStore, InMemoryBlobStore, InMemoryStore, MockBlobStore, StoreError,
    };
    use assert_matches::assert_matches;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn service_with(blobs: Arc<dyn BlobStore>) -> (ApplicationService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let repo = Arc::new(ApplicationRepository::new(store.clone()));
        (ApplicationService::new(repo, blobs, logger()), store)
    }

    fn bolt_request() -> NewApplication {
        NewApplication {
            requester: "Alice".into(),
            department: "Eng".into(),
            technical_specs: Some("bolt".into()),
            ..Default::default()
        }
    }

    fn png_upload() -> ImageUpload {
        ImageUpload {
            content_type: "image/png".into(),
            data: base64::engine::general_purpose::STANDARD.encode(b"\x89PNG fake"),
        }
    }

    #[tokio::test]
    async fn submitted_ticket_reads_back_pending() {
        let (service, _) = service_with(Arc::new(InMemoryBlobStore::new()));
        let id = service.submit(bolt_request()).await.unwrap();
        assert!(!id.is_empty());

        let ticket = service.fetch_by_id(&id).await.unwrap().unwrap();
        assert_eq!(ticket.requester, "Alice");
        assert_eq!(ticket.department, "Eng");
        assert_eq!(ticket.technical_specs.as_deref(), Some("bolt"));
        assert_eq!(ticket.status, ApplicationStatus::Pending);
        assert_eq!(
            service.status(&id).await.unwrap(),
            Some(ApplicationStatus::Pending)
        );
    }

    #[tokio::test]
    async fn missing_requester_persists_nothing() {
        let (service, _) = service_with(Arc::new(InMemoryBlobStore::new()));
        service.submit(bolt_request()).await.unwrap();
        let before = service.fetch_all().await.unwrap().len();

        let result = service
            .submit(NewApplication {
                requester: String::new(),
                ..bolt_request()
            })
            .await;
        assert_matches!(result, Err(ServiceError::MissingFields(fields)) if fields == vec!["requester".to_string()]);
        assert_eq!(service.fetch_all().await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn image_is_stored_under_ticket_id() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let (service, _) = service_with(blobs.clone());
        let id = service
            .submit(NewApplication {
                image: Some(png_upload()),
                ..bolt_request()
            })
            .await
            .unwrap();

        let expected = format!("applications/{id}.png");
        assert!(blobs.exists(&expected).await.unwrap());
        let ticket = service.fetch_by_id(&id).await.unwrap().unwrap();
        assert_eq!(ticket.image, Some(expected));
    }

    #[tokio::test]
    async fn failed_upload_writes_no_record() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .returning(|_, _| Err(StoreError::Status { status: 503, path: "x".into() }));
        let (service, store) = service_with(Arc::new(blobs));

        let result = service
            .submit(NewApplication {
                image: Some(png_upload()),
                ..bolt_request()
            })
            .await;
        assert_matches!(result, Err(ServiceError::RemoteStoreError(_)));
        assert!(store.get("applications-collection").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unsupported_image_type_is_rejected_before_writing() {
        let (service, store) = service_with(Arc::new(InMemoryBlobStore::new()));
        let result = service
            .submit(NewApplication {
                image: Some(ImageUpload {
                    content_type: "image/gif".into(),
                    data: "R0lGOD".into(),
                }),
                ..bolt_request()
            })
            .await;
        assert_matches!(result, Err(ServiceError::InvalidInput(_)));
        assert!(store.get("applications-collection").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_and_listing_is_newest_first() {
        let (service, _) = service_with(Arc::new(InMemoryBlobStore::new()));
        let first = service.submit(bolt_request()).await.unwrap();
        let second = service.submit(bolt_request()).await.unwrap();
        assert_ne!(first, second);

        let ids: Vec<String> = service
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }
}
