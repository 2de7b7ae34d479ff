use crate::processing::ImageProcessor;
use crate::utils::FormscanError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, RgbaImage};
use log::{debug, info};
use pdfium_render::prelude::*;
use std::path::Path;

// Base64 of the JPEG SOI marker and of "%PDF"
const JPEG_PREFIX: &str = "/9j";
const PDF_PREFIX: &str = "JVB";
const PDF_RENDER_DPI: f32 = 200.0;
const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Jpeg,
    Pdf,
}

impl DocumentKind {
    /// Identifies the document from the first characters of its base64 text.
    pub fn sniff(encoded: &str) -> Option<Self> {
        let encoded = encoded.trim_start();
        if encoded.starts_with(JPEG_PREFIX) {
            Some(DocumentKind::Jpeg)
        } else if encoded.starts_with(PDF_PREFIX) {
            Some(DocumentKind::Pdf)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Run the contrast/sharpness/brightness filters on decoded JPEG scans.
    pub enhance: bool,
}

pub struct DocumentDecoder;

impl DocumentDecoder {
    /// Reads a file from disk and returns its base64 text.
    pub fn encode_file<P: AsRef<Path>>(path: P) -> Result<String, FormscanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| FormscanError::Io(format!("Failed to read document {:?}: {}", path, e)))?;
        Ok(STANDARD.encode(bytes))
    }

    /// Turns base64 document text into a single raster image. For PDFs only
    /// the first page is rendered.
    pub fn decode(encoded: &str, options: &DecodeOptions) -> Result<DynamicImage, FormscanError> {
        let kind = DocumentKind::sniff(encoded).ok_or_else(|| {
            FormscanError::decode("Unsupported document encoding, no image produced (expected JPEG or PDF)")
        })?;

        let compact: String = encoded.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| FormscanError::decode(format!("Invalid base64 content: {}", e)))?;

        info!("Decoding {:?} document ({} bytes)", kind, bytes.len());
        match kind {
            DocumentKind::Jpeg => Self::decode_jpeg(&bytes, options),
            DocumentKind::Pdf => Self::render_first_page(&bytes),
        }
    }

    fn decode_jpeg(bytes: &[u8], options: &DecodeOptions) -> Result<DynamicImage, FormscanError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FormscanError::decode(format!("Failed to load image: {}", e)))?;
        let gray = ImageProcessor::to_grayscale(&image);
        let gray = if options.enhance {
            debug!("Applying scan enhancement filters");
            ImageProcessor::enhance(&gray)
        } else {
            gray
        };
        Ok(DynamicImage::ImageLuma8(gray))
    }

    /// Renders page one at [`PDF_RENDER_DPI`]. Later pages are never touched.
    fn render_first_page(bytes: &[u8]) -> Result<DynamicImage, FormscanError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| FormscanError::decode(format!("Failed to load PDF: {}", e)))?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(FormscanError::decode("PDF has no pages, no image produced"));
        }
        debug!("PDF has {} page(s), rendering page 1", pages.len());
        let page = pages
            .get(0)
            .map_err(|e| FormscanError::decode(format!("Failed to open PDF page 1: {}", e)))?;

        let scale = PDF_RENDER_DPI / POINTS_PER_INCH;
        let width_px = ((page.width().value * scale).round() as i32).max(1);
        let height_px = ((page.height().value * scale).round() as i32).max(1);
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| FormscanError::decode(format!("Failed to render PDF page 1: {}", e)))?;
        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        let page_image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            FormscanError::decode(format!("Rendered PDF page does not fill {}x{} pixels", width, height))
        })?;

        info!("Rendered PDF page 1 at {}x{}", width, height);
        Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(page_image).to_rgb8()))
    }
}

/// Binds the PDFium shared library from the working directory, the usual
/// library directories, then the system search path.
fn bind_pdfium() -> Result<Pdfium, FormscanError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib")))
        .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib")))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| FormscanError::decode(format!("Failed to initialize PDFium: {}", e)))?;
    Ok(Pdfium::new(bindings))
}
