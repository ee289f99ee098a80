use std::io::Cursor;

use printpdf::image_crate::DynamicImage;
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument};

use super::layout::{PageLayout, Placed, TextStyle, IMAGE_DPI, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::errors::ServiceError;

/// Font bytes embedded in place of the builtin Helvetica pair
#[derive(Debug, Clone, Copy)]
pub enum FontChoice<'a> {
    Builtin,
    Embedded(&'a [u8]),
}

fn pdf_error(err: printpdf::Error) -> ServiceError {
    ServiceError::PdfError(err.to_string())
}

/// Draws laid-out pages into a PDF byte stream. `image` is drawn wherever
/// the layout placed an image item.
pub fn render(
    title: &str,
    pages: &[PageLayout],
    fonts: FontChoice<'_>,
    image: Option<&DynamicImage>,
) -> Result<Vec<u8>, ServiceError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    let (regular, bold): (IndirectFontRef, IndirectFontRef) = match fonts {
        FontChoice::Builtin => (
            doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            doc.add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
        ),
        FontChoice::Embedded(bytes) => {
            let font = doc
                .add_external_font(Cursor::new(bytes))
                .map_err(pdf_error)?;
            (font.clone(), font)
        }
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        for item in &page.items {
            match item {
                Placed::Text {
                    x_mm,
                    baseline_mm,
                    text,
                    size_pt,
                    style,
                } => {
                    let font = match style {
                        TextStyle::Regular => &regular,
                        TextStyle::Bold => &bold,
                    };
                    layer.use_text(
                        text.as_str(),
                        *size_pt,
                        Mm(*x_mm),
                        Mm(PAGE_HEIGHT_MM - baseline_mm),
                        font,
                    );
                }
                Placed::Image {
                    x_mm,
                    top_mm,
                    height_mm,
                    scale,
                    ..
                } => {
                    if let Some(image) = image {
                        Image::from_dynamic_image(image).add_to_layer(
                            layer.clone(),
                            ImageTransform {
                                translate_x: Some(Mm(*x_mm)),
                                translate_y: Some(Mm(PAGE_HEIGHT_MM - top_mm - height_mm)),
                                scale_x: Some(*scale),
                                scale_y: Some(*scale),
                                dpi: Some(IMAGE_DPI),
                                ..Default::default()
                            },
                        );
                    }
                }
            }
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}
