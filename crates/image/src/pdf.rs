//! Image-to-PDF packaging.
//!
//! Every image becomes one A4 portrait page. The image is scaled to the page
//! width and anchored at the top; images too tall for that are scaled to the
//! page height and centred horizontally instead.
//!
//! The combined document reuses the JPEG stream of each single-page result
//! and only encodes a page again when a result carries no usable page.

use crate::codec::{Codec, EncodeOptions, ImageCodec};
use crate::{ImageError, ImageFormat, Result};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use snapimg_batch::{Artifact, ArtifactKind, BatchError, Package, ProcessedResult};
use tracing::debug;

/// A4 width in points.
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 height in points.
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Media type of generated documents.
pub const PDF_MIME: &str = "application/pdf";

/// A JPEG-encoded page image.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Baseline JPEG data (RGB)
    pub jpeg: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PdfPage {
    /// Encode `img` as a page image.
    pub fn from_image<C: Codec + ?Sized>(codec: &C, img: &DynamicImage, quality: u8) -> Result<Self> {
        if img.width() == 0 || img.height() == 0 {
            return Err(ImageError::InvalidData("Image has no pixels".into()));
        }
        let jpeg = codec.encode(img, &EncodeOptions::new(ImageFormat::Jpeg, quality))?;
        Ok(Self {
            jpeg,
            width: img.width(),
            height: img.height(),
        })
    }

    /// Recover the page image from a document written by [`build_pdf`].
    pub fn from_single_page_pdf(data: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(data)?;
        let stream = doc
            .objects
            .values()
            .find_map(|object| match object {
                Object::Stream(stream)
                    if name_of(&stream.dict, b"Subtype") == Some(b"Image".as_slice())
                        && name_of(&stream.dict, b"Filter") == Some(b"DCTDecode".as_slice()) =>
                {
                    Some(stream)
                }
                _ => None,
            })
            .ok_or_else(|| ImageError::Pdf("No JPEG page image found".into()))?;

        let dimension = |key: &[u8]| -> Result<u32> {
            let value = stream.dict.get(key).and_then(Object::as_i64)?;
            u32::try_from(value).map_err(|_| ImageError::Pdf(format!("Invalid image dimension {value}")))
        };

        Ok(Self {
            jpeg: stream.content.clone(),
            width: dimension(b"Width")?,
            height: dimension(b"Height")?,
        })
    }
}

fn name_of<'a>(dict: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    dict.get(key).and_then(Object::as_name).ok()
}

/// Where an image lands on the page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Drawn width
    pub width: f32,
    /// Drawn height
    pub height: f32,
}

/// Fit a `width` x `height` pixel image on an A4 page.
pub fn fit_to_page(width: u32, height: u32) -> Placement {
    let ratio = width as f32 / height as f32;
    let mut drawn_width = A4_WIDTH_PT;
    let mut drawn_height = drawn_width / ratio;

    if drawn_height > A4_HEIGHT_PT {
        drawn_height = A4_HEIGHT_PT;
        drawn_width = drawn_height * ratio;
    }

    Placement {
        x: (A4_WIDTH_PT - drawn_width) / 2.0,
        y: A4_HEIGHT_PT - drawn_height,
        width: drawn_width,
        height: drawn_height,
    }
}

/// Build a PDF with one page per entry of `pages`.
pub fn build_pdf(pages: &[PdfPage]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(ImageError::Pdf("A document needs at least one page".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(page.width as i64),
                "Height" => Object::Integer(page.height as i64),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            page.jpeg.clone(),
        ));

        let at = fit_to_page(page.width, page.height);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(at.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(at.height),
                        Object::Real(at.x),
                        Object::Real(at.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(A4_WIDTH_PT),
                Object::Real(A4_HEIGHT_PT),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| ImageError::Pdf(e.to_string()))?;
    debug!(pages = pages.len(), bytes = out.len(), "Built PDF");
    Ok(out)
}

/// Packager merging every result into one multi-page PDF.
///
/// Pages follow result order. A page comes from the result's own PDF when it
/// has one, otherwise from its source image.
pub struct CombinedPdf<C = ImageCodec> {
    name: String,
    quality: u8,
    codec: C,
}

impl CombinedPdf<ImageCodec> {
    /// Combined document called `name`
    pub fn new(name: impl Into<String>, quality: u8) -> Self {
        Self::with_codec(name, quality, ImageCodec)
    }
}

impl<C: Codec> CombinedPdf<C> {
    /// Combined document using a custom codec
    pub fn with_codec(name: impl Into<String>, quality: u8, codec: C) -> Self {
        Self {
            name: name.into(),
            quality,
            codec,
        }
    }

    fn page_for(&self, result: &ProcessedResult) -> Result<PdfPage> {
        if result.media_type == PDF_MIME {
            if let Ok(page) = PdfPage::from_single_page_pdf(&result.data) {
                return Ok(page);
            }
        }

        let decoded = self.codec.decode(result.source.data())?;
        let page = PdfPage::from_image(&self.codec, &decoded, self.quality);
        drop(decoded);
        page
    }
}

impl<C: Codec> Package for CombinedPdf<C> {
    fn package(&self, results: &[ProcessedResult]) -> snapimg_batch::Result<Artifact> {
        if results.is_empty() {
            return Err(BatchError::NothingToDownload);
        }

        let pages = results
            .iter()
            .map(|result| {
                self.page_for(result)
                    .map_err(|e| BatchError::Packaging(format!("{}: {}", result.source.name(), e)))
            })
            .collect::<snapimg_batch::Result<Vec<_>>>()?;
        let data = build_pdf(&pages).map_err(|e| BatchError::Packaging(e.to_string()))?;

        Ok(Artifact {
            name: self.name.clone(),
            media_type: PDF_MIME.to_string(),
            data,
            kind: ArtifactKind::Document,
            entries: results.len(),
        })
    }
}
