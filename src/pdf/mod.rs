//! PDF export of part application tickets.

use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use tracing::{debug, instrument, warn};

use crate::{
    errors::ServiceError,
    i18n::{labels, Language, Localizer},
    models::PartApplication,
    store::BlobStore,
};

pub mod layout;
pub mod render;

use layout::{Block, BlockBody, Document, Field};
use render::FontChoice;

/// A rendered export ready to be sent to the browser
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn export_filename(ticket_id: &str, lang: Language) -> String {
    format!("{}_{}.pdf", ticket_id, lang.code())
}

/// Builds the block list for a ticket. Optional fields that are absent are
/// left out, and so are blocks left with nothing in them.
pub fn ticket_document(
    ticket: &PartApplication,
    lang: Language,
    localizer: &Localizer,
    image_size: Option<(u32, u32)>,
) -> Document {
    let t = |text: &str| localizer.translate(text, lang).to_string();
    let field = |label: &str, value: String| Field {
        label: t(label),
        value,
    };

    let identification = vec![
        field(labels::APPLICATION_ID, ticket.id.clone()),
        field(
            labels::CREATED_AT,
            ticket.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        ),
        field(labels::STATUS, t(&ticket.status.to_string())),
    ];

    let mut part = Vec::new();
    if let Some(name) = &ticket.part_name {
        part.push(field(labels::PART_NAME, name.clone()));
    }
    if let Some(description) = &ticket.part_description {
        part.push(field(labels::PART_DESCRIPTION, description.clone()));
    }
    if let Some(model) = &ticket.vehicle_model {
        part.push(field(labels::VEHICLE_MODEL, model.clone()));
    }
    part.push(field(labels::QUANTITY, ticket.quantity.to_string()));
    if let Some(cost) = ticket.estimated_cost {
        part.push(field(labels::ESTIMATED_COST, cost.to_string()));
    }

    let request = vec![
        field(labels::REQUESTER, ticket.requester.clone()),
        field(labels::DEPARTMENT, ticket.department.clone()),
        field(labels::URGENCY, t(&ticket.urgency.to_string())),
    ];

    let mut blocks = vec![
        Block {
            heading: t(labels::IDENTIFICATION),
            body: BlockBody::Fields(identification),
        },
        Block {
            heading: t(labels::PART_INFORMATION),
            body: BlockBody::Fields(part),
        },
        Block {
            heading: t(labels::REQUEST_INFORMATION),
            body: BlockBody::Fields(request),
        },
    ];

    let optional_text = [
        (labels::TECHNICAL_SPECS, &ticket.technical_specs),
        (labels::JUSTIFICATION, &ticket.justification),
        (labels::NOTES, &ticket.notes),
    ];
    for (heading, text) in optional_text {
        if let Some(text) = text {
            blocks.push(Block {
                heading: t(heading),
                body: BlockBody::Text(text.clone()),
            });
        }
    }

    if let Some((width_px, height_px)) = image_size {
        blocks.push(Block {
            heading: t(labels::IMAGE),
            body: BlockBody::Image {
                width_px,
                height_px,
            },
        });
    }

    Document {
        title: t(labels::TITLE),
        blocks,
    }
}

/// Renders tickets to PDF, fetching attached images from the blob store
#[derive(Debug, Clone)]
pub struct PdfExporter {
    blobs: Arc<dyn BlobStore>,
    cjk_font: Option<Arc<Vec<u8>>>,
}

impl PdfExporter {
    pub fn new(blobs: Arc<dyn BlobStore>, cjk_font: Option<Vec<u8>>) -> Self {
        Self {
            blobs,
            cjk_font: cjk_font.map(Arc::new),
        }
    }

    /// Loads the font used for Chinese exports. An unreadable file is logged
    /// and Chinese exports fall back to the builtin font.
    pub fn with_font_file(blobs: Arc<dyn BlobStore>, path: Option<&Path>) -> Self {
        let font = path.and_then(|path| match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), "Could not read CJK font: {}", e);
                None
            }
        });
        Self::new(blobs, font)
    }

    /// Image attached to the ticket, or `None` when it cannot be fetched or decoded
    async fn load_image(&self, path: &str) -> Option<DynamicImage> {
        let blob = match self.blobs.fetch(path).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(path = %path, "Ticket image missing, skipping block");
                return None;
            }
            Err(e) => {
                warn!(path = %path, "Ticket image fetch failed, skipping block: {}", e);
                return None;
            }
        };
        match image_crate::load_from_memory(&blob.data) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(path = %path, "Ticket image could not be decoded, skipping block: {}", e);
                None
            }
        }
    }

    #[instrument(skip(self, ticket), fields(id = %ticket.id, lang = %lang))]
    pub async fn export(
        &self,
        ticket: &PartApplication,
        lang: Language,
    ) -> Result<ExportedPdf, ServiceError> {
        let missing = ticket.missing_mandatory_fields();
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }

        let image = match &ticket.image {
            Some(path) => self.load_image(path).await,
            None => None,
        };
        let document = ticket_document(
            ticket,
            lang,
            Localizer::global(),
            image.as_ref().map(|image| image.dimensions()),
        );
        let pages = layout::layout(&document);

        let fonts = match (lang, &self.cjk_font) {
            (Language::Zh, Some(font)) => FontChoice::Embedded(font.as_slice()),
            (Language::Zh, None) => {
                warn!("No CJK font configured, Chinese text may not render");
                FontChoice::Builtin
            }
            _ => FontChoice::Builtin,
        };
        let bytes = render::render(&document.title, &pages, fonts, image.as_ref())?;

        counter!("applications.pdf_exported", 1);
        Ok(ExportedPdf {
            filename: export_filename(&ticket.id, lang),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, Urgency};
    use crate::store::{Blob, InMemoryBlobStore};
    use assert_matches::assert_matches;
    use base64::Engine as _;
    use bytes::Bytes;
    use chrono::Utc;

    const ONE_PIXEL_WEBP: &str = "UklGRiIAAABXRUJQVlA4IBYAAAAwAQCdASoBAAEADsD+JaQAA3AAAAAA";

    fn ticket() -> PartApplication {
        PartApplication {
            id: "-Nabc123".into(),
            requester: "Alice".into(),
            department: "Eng".into(),
            urgency: Urgency::High,
            part_name: Some("Bracket".into()),
            part_description: None,
            quantity: 2,
            vehicle_model: None,
            technical_specs: None,
            justification: None,
            notes: Some("Needed for prototype".into()),
            estimated_cost: None,
            image: None,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn headings(document: &Document) -> Vec<&str> {
        document.blocks.iter().map(|b| b.heading.as_str()).collect()
    }

    #[test]
    fn absent_optional_blocks_are_omitted() {
        let document = ticket_document(&ticket(), Language::En, Localizer::global(), None);
        assert_eq!(
            headings(&document),
            vec![
                labels::IDENTIFICATION,
                labels::PART_INFORMATION,
                labels::REQUEST_INFORMATION,
                labels::NOTES
            ]
        );
    }

    #[test]
    fn chinese_document_translates_labels_and_values() {
        let document = ticket_document(&ticket(), Language::Zh, Localizer::global(), Some((10, 10)));
        assert_eq!(document.title, "新零件申请");
        assert_eq!(document.blocks.last().unwrap().heading, "图片");
        let BlockBody::Fields(request) = &document.blocks[2].body else {
            panic!("request block should hold fields");
        };
        assert_eq!(request[2].value, "高");
    }

    #[tokio::test]
    async fn export_produces_named_pdf() {
        let exporter = PdfExporter::new(Arc::new(InMemoryBlobStore::new()), None);
        let pdf = exporter.export(&ticket(), Language::En).await.unwrap();
        assert_eq!(pdf.filename, "-Nabc123_en.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn missing_image_is_skipped() {
        let exporter = PdfExporter::new(Arc::new(InMemoryBlobStore::new()), None);
        let with_image = PartApplication {
            image: Some("applications/gone.png".into()),
            ..ticket()
        };
        assert!(exporter.export(&with_image, Language::En).await.is_ok());
    }

    #[tokio::test]
    async fn webp_ticket_image_is_embedded() {
        let data = base64::engine::general_purpose::STANDARD
            .decode(ONE_PIXEL_WEBP)
            .unwrap();
        assert_eq!(
            image::guess_format(&data).unwrap(),
            image::ImageFormat::WebP
        );
        let blobs = Arc::new(InMemoryBlobStore::new());
        blobs
            .upload(
                "applications/-Nabc123.png",
                Blob {
                    content_type: "image/webp".into(),
                    data: Bytes::from(data),
                },
            )
            .await
            .unwrap();
        let exporter = PdfExporter::new(blobs, None);

        let image = exporter.load_image("applications/-Nabc123.png").await;
        assert_eq!(image.map(|image| image.dimensions()), Some((1, 1)));

        let with_image = PartApplication {
            image: Some("applications/-Nabc123.png".into()),
            ..ticket()
        };
        let pdf = exporter.export(&with_image, Language::En).await.unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn ticket_without_descriptive_fields_is_rejected() {
        let exporter = PdfExporter::new(Arc::new(InMemoryBlobStore::new()), None);
        let bare = PartApplication {
            part_name: None,
            ..ticket()
        };
        assert_matches!(
            exporter.export(&bare, Language::En).await,
            Err(ServiceError::MissingFields(_))
        );
    }
}
