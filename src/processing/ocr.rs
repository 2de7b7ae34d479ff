use crate::models::{Detection, ExtractionResult};
use crate::processing::merge::TokenMerger;
use crate::processing::region::FieldImages;
use crate::utils::FormscanError;
use image::{DynamicImage, ImageFormat};
use log::debug;
use tempfile::NamedTempFile;
use tesseract::Tesseract;

/// Recognition language. Fixed: templates describe English documents.
pub const OCR_LANGUAGE: &str = "eng";

// Word rows in tesseract's TSV output
const TSV_WORD_LEVEL: u32 = 5;

/// An engine that returns a region's text as one string.
pub trait TextRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, FormscanError>;
}

/// An engine that returns a region's tokens with their boxes.
pub trait BoxRecognizer {
    fn recognize_boxes(&self, image: &DynamicImage) -> Result<Vec<Detection>, FormscanError>;
}

/// Field-keyed text extraction over cropped regions. Engine failures are
/// returned unchanged; nothing is retried.
pub trait OcrEngine {
    fn extract(&self, regions: &FieldImages) -> Result<ExtractionResult, FormscanError>;
}

/// Returns the engine's raw string per field, unprocessed.
pub struct PlainTextExtractor<R> {
    recognizer: R,
}

impl<R: TextRecognizer> PlainTextExtractor<R> {
    pub fn new(recognizer: R) -> Self {
        PlainTextExtractor { recognizer }
    }
}

impl<R: TextRecognizer> OcrEngine for PlainTextExtractor<R> {
    fn extract(&self, regions: &FieldImages) -> Result<ExtractionResult, FormscanError> {
        let mut result = ExtractionResult::new();
        for (field, image) in regions {
            let text = self.recognizer.recognize_text(image)?;
            debug!("'{}' -> {:?}", field, text);
            result.insert(field.clone(), text);
        }
        Ok(result)
    }
}

/// Recognises tokens per field and merges them into lines.
pub struct BoxAwareExtractor<R> {
    recognizer: R,
    merger: TokenMerger,
}

impl<R: BoxRecognizer> BoxAwareExtractor<R> {
    pub fn new(recognizer: R, merger: TokenMerger) -> Self {
        BoxAwareExtractor { recognizer, merger }
    }
}

impl<R: BoxRecognizer> OcrEngine for BoxAwareExtractor<R> {
    fn extract(&self, regions: &FieldImages) -> Result<ExtractionResult, FormscanError> {
        let mut result = ExtractionResult::new();
        for (field, image) in regions {
            let detections = self.recognizer.recognize_boxes(image)?;
            let text = self.merger.merge_to_text(&detections);
            debug!("'{}' -> {} token(s) -> {:?}", field, detections.len(), text);
            result.insert(field.clone(), text);
        }
        Ok(result)
    }
}

/// Which extractor a request runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Text,
    Boxes,
}

impl EngineKind {
    pub fn build(self, recognizer: TesseractRecognizer, merger: TokenMerger) -> Box<dyn OcrEngine> {
        match self {
            EngineKind::Text => Box::new(PlainTextExtractor::new(recognizer)),
            EngineKind::Boxes => Box::new(BoxAwareExtractor::new(recognizer, merger)),
        }
    }
}

/// Tesseract bindings. Every region is written to a temporary PNG and
/// recognised by a fresh engine instance.
#[derive(Debug, Clone, Default)]
pub struct TesseractRecognizer {
    datapath: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(datapath: Option<String>) -> Self {
        TesseractRecognizer { datapath }
    }

    fn write_temp(image: &DynamicImage) -> Result<NamedTempFile, FormscanError> {
        let temp_file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| FormscanError::ocr(format!("Failed to create temp file: {}", e)))?;
        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| FormscanError::ocr(format!("Failed to write region image: {}", e)))?;
        Ok(temp_file)
    }

    fn engine_for(&self, temp_file: &NamedTempFile) -> Result<Tesseract, FormscanError> {
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| FormscanError::ocr("Failed to convert path to string"))?;
        Tesseract::new(self.datapath.as_deref(), Some(OCR_LANGUAGE))
            .map_err(|e| FormscanError::ocr(format!("Tesseract init error: {}", e)))?
            .set_image(path_str)
            .map_err(|e| FormscanError::ocr(format!("Tesseract set image error: {}", e)))
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, FormscanError> {
        let temp_file = Self::write_temp(image)?;
        self.engine_for(&temp_file)?
            .get_text()
            .map_err(|e| FormscanError::ocr(format!("Tesseract error: {}", e)))
    }
}

impl BoxRecognizer for TesseractRecognizer {
    fn recognize_boxes(&self, image: &DynamicImage) -> Result<Vec<Detection>, FormscanError> {
        let temp_file = Self::write_temp(image)?;
        let tsv = self
            .engine_for(&temp_file)?
            .recognize()
            .map_err(|e| FormscanError::ocr(format!("Tesseract recognition error: {}", e)))?
            .get_tsv_text(0)
            .map_err(|e| FormscanError::ocr(format!("Tesseract TSV error: {}", e)))?;
        Ok(parse_tsv(&tsv))
    }
}

/// Word rows of tesseract TSV output, in engine order.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Header and non-word rows are dropped.
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    let mut detections = Vec::new();
    for line in tsv.lines() {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        if fields[0].trim().parse::<u32>().ok() != Some(TSV_WORD_LEVEL) {
            continue;
        }
        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let geometry: Option<Vec<f32>> = fields[6..10].iter().map(|v| v.trim().parse().ok()).collect();
        if let Some(g) = geometry {
            detections.push(Detection::from_rect(text, g[0], g[1], g[2], g[3]));
        }
    }
    detections
}
