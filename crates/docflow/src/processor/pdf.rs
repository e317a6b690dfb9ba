use std::fmt::Write;
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use uuid::Uuid;

use crate::document::{DocumentFormat, ImageArtifact};
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, ExtractedContent};
use crate::store::StorageLayout;

/// PDF strategy: page-ordered text under `--- Page N ---` headers plus a
/// best-effort harvest of embedded raster images. Failures are contained at
/// the page/image level; only the accumulated results are returned.
pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for PdfProcessor {
    fn extract(
        &self,
        path: &Path,
        layout: &StorageLayout,
    ) -> Result<ExtractedContent, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        // An unloadable document degrades to an error-message text body with
        // no images; the record still completes.
        let doc = match Document::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to load PDF {}: {}", path.display(), e);
                return Ok(ExtractedContent {
                    text: format!("Error processing PDF: {}", e),
                    images: Vec::new(),
                });
            }
        };

        let mut text = String::new();
        let mut images = Vec::new();

        for (page_num, page_id) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) if !page_text.trim().is_empty() => {
                    let _ = write!(text, "\n--- Page {} ---\n{}\n", page_num, page_text);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Text extraction failed on page {}: {}", page_num, e);
                }
            }

            images.extend(extract_page_images(&doc, page_id, page_num, layout));
        }

        Ok(ExtractedContent { text, images })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// The page's `Resources -> XObject` dictionary, if it has one.
fn page_xobjects<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = resolve(doc, page.get(b"Resources").ok()?).as_dict().ok()?;
    resolve(doc, resources.get(b"XObject").ok()?).as_dict().ok()
}

fn is_image_xobject(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
}

fn extract_page_images(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
    layout: &StorageLayout,
) -> Vec<ImageArtifact> {
    let mut artifacts = Vec::new();

    let xobjects = match page_xobjects(doc, page_id) {
        Some(dict) => dict,
        None => return artifacts,
    };

    for (name, entry) in xobjects.iter() {
        let stream = match resolve(doc, entry).as_stream() {
            Ok(stream) => stream,
            Err(_) => continue,
        };
        if !is_image_xobject(stream) {
            continue;
        }

        match write_image_artifact(stream, page_num, layout) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => {
                tracing::warn!(
                    "Skipping image {} on page {}: {}",
                    String::from_utf8_lossy(name),
                    page_num,
                    e
                );
            }
        }
    }

    artifacts
}

fn write_image_artifact(
    stream: &Stream,
    page_num: u32,
    layout: &StorageLayout,
) -> Result<ImageArtifact, ProcessError> {
    let img = decode_image_stream(stream)?;

    let filename = format!("{}.png", Uuid::new_v4());
    let out_path = layout.image_path(&filename);
    img.save_with_format(&out_path, image::ImageFormat::Png)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to write PNG: {}", e)))?;

    Ok(ImageArtifact {
        path: out_path,
        page: page_num,
        filename,
    })
}

fn filter_names(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| match o {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_u32(stream: &Stream, key: &[u8]) -> Result<u32, ProcessError> {
    match stream.dict.get(key) {
        Ok(Object::Integer(v)) => u32::try_from(*v).ok(),
        _ => None,
    }
    .ok_or_else(|| {
        ProcessError::PdfProcessing(format!(
            "Missing {} in image dictionary",
            String::from_utf8_lossy(key)
        ))
    })
}

/// Decodes an image XObject into pixels. JPEG streams (`DCTDecode`) and any
/// stream the `image` crate recognizes are decoded directly; otherwise the
/// raw buffer is reconstructed from Width/Height for 8-bit `DeviceRGB` and
/// `DeviceGray`. Anything else is skipped by the caller.
fn decode_image_stream(stream: &Stream) -> Result<DynamicImage, ProcessError> {
    let filters = filter_names(stream);
    let is_jpeg = filters.iter().any(|f| f == b"DCTDecode");

    let data = if is_jpeg {
        stream.content.clone()
    } else {
        stream.decompressed_content().map_err(|e| {
            ProcessError::PdfProcessing(format!("Failed to decode image stream: {}", e))
        })?
    };

    if let Ok(img) = image::load_from_memory(&data) {
        return Ok(img);
    }

    let width = dict_u32(stream, b"Width")?;
    let height = dict_u32(stream, b"Height")?;
    let bits = match stream.dict.get(b"BitsPerComponent") {
        Ok(Object::Integer(v)) => *v,
        _ => 8,
    };
    if bits != 8 {
        return Err(ProcessError::PdfProcessing(format!(
            "Unsupported bit depth: {}",
            bits
        )));
    }

    let color_space = match stream.dict.get(b"ColorSpace") {
        Ok(Object::Name(name)) => Some(name.clone()),
        _ => None,
    };

    match color_space.as_deref() {
        Some(b"DeviceRGB") => {
            let expected = width as usize * height as usize * 3;
            if data.len() < expected {
                return Err(ProcessError::PdfProcessing("Truncated RGB image data".to_string()));
            }
            let mut data = data;
            data.truncate(expected);
            RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| ProcessError::PdfProcessing("Malformed RGB image data".to_string()))
        }
        Some(b"DeviceGray") => {
            let expected = width as usize * height as usize;
            if data.len() < expected {
                return Err(ProcessError::PdfProcessing("Truncated grayscale image data".to_string()));
            }
            let mut data = data;
            data.truncate(expected);
            GrayImage::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| {
                    ProcessError::PdfProcessing("Malformed grayscale image data".to_string())
                })
        }
        other => Err(ProcessError::PdfProcessing(format!(
            "Unsupported color space: {}",
            other.map(String::from_utf8_lossy).unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use tempfile::TempDir;

    fn layout(temp: &TempDir) -> StorageLayout {
        let layout = StorageLayout::new(temp.path().join("data"));
        layout.init().unwrap();
        layout
    }

    /// Single-page PDF with Courier text, optionally carrying one image
    /// XObject in the page resources.
    fn build_pdf(text: &str, image_stream: Option<Stream>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }),
        );

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if let Some(stream) = image_stream {
            let image_id = doc.add_object(Object::Stream(stream));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }
        doc.objects.insert(resources_id, Object::Dictionary(resources));

        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(dictionary! {}, content.into_bytes())),
        );

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }),
        );

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn raw_rgb_image_stream(width: u32, height: u32) -> Stream {
        let pixels = vec![127u8; (width * height * 3) as usize];
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            pixels,
        )
    }

    #[test]
    fn test_text_has_page_headers() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let path = temp.path().join("doc.pdf");
        std::fs::write(&path, build_pdf("Hello PDF", None)).unwrap();

        let processor = PdfProcessor::new();
        let content = processor.extract(&path, &layout).unwrap();

        assert!(content.text.contains("--- Page 1 ---"), "got: {}", content.text);
        assert!(content.text.contains("Hello PDF"));
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_corrupt_pdf_degrades_to_error_text() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"not a valid pdf at all").unwrap();

        let processor = PdfProcessor::new();
        let content = processor.extract(&path, &layout).unwrap();

        assert!(content.text.starts_with("Error processing PDF:"));
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_raw_rgb_image_is_harvested() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let path = temp.path().join("with_image.pdf");
        std::fs::write(&path, build_pdf("Figure below", Some(raw_rgb_image_stream(6, 4)))).unwrap();

        let processor = PdfProcessor::new();
        let content = processor.extract(&path, &layout).unwrap();

        assert_eq!(content.images.len(), 1);
        let artifact = &content.images[0];
        assert_eq!(artifact.page, 1);
        assert!(artifact.filename.ends_with(".png"));

        let reloaded = image::open(&artifact.path).unwrap();
        assert_eq!(reloaded.width(), 6);
        assert_eq!(reloaded.height(), 4);
    }

    #[test]
    fn test_embedded_jpeg_is_harvested() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, image::Rgb([10, 200, 30])))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 5,
                "Height" => 5,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );

        let path = temp.path().join("photo.pdf");
        std::fs::write(&path, build_pdf("Photo page", Some(stream))).unwrap();

        let processor = PdfProcessor::new();
        let content = processor.extract(&path, &layout).unwrap();

        assert_eq!(content.images.len(), 1);
        assert!(content.images[0].path.exists());
    }

    #[test]
    fn test_undecodable_image_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        // CMYK is outside the supported reconstruction set.
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceCMYK",
                "BitsPerComponent" => 8,
            },
            vec![0u8; 16],
        );

        let path = temp.path().join("odd.pdf");
        std::fs::write(&path, build_pdf("Still readable", Some(stream))).unwrap();

        let processor = PdfProcessor::new();
        let content = processor.extract(&path, &layout).unwrap();

        assert!(content.text.contains("Still readable"));
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_supports_only_pdf() {
        let processor = PdfProcessor::new();
        assert!(processor.supports(DocumentFormat::Pdf));
        assert!(!processor.supports(DocumentFormat::Image));
        assert!(!processor.supports(DocumentFormat::Text));
        assert!(!processor.supports(DocumentFormat::Office));
    }
}
