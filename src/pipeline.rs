use crate::models::{ExtractionResult, ScoreReport, TemplateRegistry};
use crate::processing::{DecodeOptions, DocumentDecoder, OcrEngine, RegionExtractor};
use crate::scoring::{GroundTruthStore, Scorer};
use crate::utils::FormscanError;
use image::DynamicImage;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Runs one document through decode, crop and OCR for a named template.
pub struct DocumentPipeline {
    registry: Arc<TemplateRegistry>,
    engine: Box<dyn OcrEngine>,
    decode_options: DecodeOptions,
}

impl DocumentPipeline {
    pub fn new(registry: Arc<TemplateRegistry>, engine: Box<dyn OcrEngine>) -> Self {
        DocumentPipeline {
            registry,
            engine,
            decode_options: DecodeOptions::default(),
        }
    }

    pub fn with_decode_options(mut self, decode_options: DecodeOptions) -> Self {
        self.decode_options = decode_options;
        self
    }

    /// Main entry point: base64 document text in, field texts out.
    pub fn process(&self, encoded: &str, template_name: &str) -> Result<ExtractionResult, FormscanError> {
        // Unknown templates fail before any decoding work
        self.registry.get(template_name)?;
        let image = DocumentDecoder::decode(encoded, &self.decode_options)?;
        self.extract_image(&image, template_name)
    }

    /// Crops and recognises every field of `template_name` on an already
    /// decoded image. Fields cropped away entirely come back as empty text.
    /// The result lists fields in template order.
    pub fn extract_image(&self, image: &DynamicImage, template_name: &str) -> Result<ExtractionResult, FormscanError> {
        let template = self.registry.get(template_name)?;
        info!(
            "Extracting {} field(s) for template '{}'",
            template.fields.len(),
            template_name
        );

        let crops = RegionExtractor::crop(image, &template.fields);
        let mut recognised = self.engine.extract(&crops.images)?;
        for field in &crops.skipped {
            warn!("Field '{}' produced no image, recording empty text", field);
        }
        Ok(template
            .fields
            .keys()
            .map(|field| {
                let text = recognised.shift_remove(field).unwrap_or_default();
                (field.clone(), text)
            })
            .collect())
    }

    /// Scores a result against the template's stored ground truth.
    pub fn score(
        &self,
        extracted: &ExtractionResult,
        template_name: &str,
        store: &GroundTruthStore,
    ) -> Result<ScoreReport, FormscanError> {
        let ground_truth = store.load(template_name)?;
        let report = Scorer::score(extracted, &ground_truth);
        info!(
            "Template '{}': {}/{} exact, similarity {:.3}",
            template_name, report.exact_matches, report.total_fields, report.overall_similarity
        );
        Ok(report)
    }
}

/// Writes the result as pretty-printed UTF-8 JSON and returns the path.
pub fn export_to_json<P: AsRef<Path>>(result: &ExtractionResult, path: P) -> Result<P, FormscanError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| FormscanError::Io(format!("Failed to serialize result: {}", e)))?;
    std::fs::write(path.as_ref(), json)
        .map_err(|e| FormscanError::Io(format!("Failed to write {:?}: {}", path.as_ref(), e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Detection, Point, Quad};
    use crate::processing::{BoxAwareExtractor, BoxRecognizer, TokenMerger};
    use crate::scoring::load_extraction;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::{GrayImage, ImageOutputFormat, Luma};
    use std::io::Cursor;

    const TEMPLATES: &str = r#"{
        "tnb_bill": {
            "off_page": {"x1": 300, "y1": 300, "x2": 340, "y2": 320},
            "account_no": {"x1": 10, "y1": 10, "x2": 50, "y2": 30},
            "address": {"bounding_box_actual": {"x1": 5, "y1": 40, "x2": 95, "y2": 70}}
        }
    }"#;

    fn quad(x1: f32, y1: f32, x2: f32, y2: f32) -> Quad {
        [
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ]
    }

    // Tells the fields apart by crop width: account_no is 46px, address 96px
    struct FakeBoxes;

    impl BoxRecognizer for FakeBoxes {
        fn recognize_boxes(&self, image: &DynamicImage) -> Result<Vec<Detection>, FormscanError> {
            match image.width() {
                46 => Ok(vec![
                    Detection::new("2200", quad(0.0, 0.0, 20.0, 10.0)),
                    Detection::new("1234", quad(22.0, 1.0, 44.0, 11.0)),
                ]),
                96 => Ok(vec![
                    Detection::new("Jalan", quad(0.0, 0.0, 30.0, 10.0)),
                    Detection::new("Ampang", quad(32.0, 0.0, 70.0, 10.0)),
                    Detection::new("Kuala", quad(0.0, 15.0, 30.0, 25.0)),
                    Detection::new("Lumpur", quad(32.0, 15.0, 70.0, 25.0)),
                ]),
                other => Err(FormscanError::ocr(format!("unexpected crop width {}", other))),
            }
        }
    }

    fn pipeline() -> DocumentPipeline {
        let registry = Arc::new(TemplateRegistry::from_json_str(TEMPLATES).unwrap());
        DocumentPipeline::new(
            registry,
            Box::new(BoxAwareExtractor::new(FakeBoxes, TokenMerger::default())),
        )
    }

    fn scan_base64() -> String {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 80, Luma([255])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Jpeg(90))
            .unwrap();
        STANDARD.encode(buffer)
    }

    #[test]
    fn test_process_document_end_to_end() {
        let result = pipeline().process(&scan_base64(), "tnb_bill").unwrap();
        assert_eq!(result["account_no"], "2200 1234");
        assert_eq!(result["address"], "Jalan Ampang Kuala Lumpur");
        assert_eq!(result["off_page"], "");
    }

    #[test]
    fn test_unknown_template_fails_before_decode() {
        let err = pipeline().process("not a document", "insurance_claim").unwrap_err();
        assert!(matches!(err, FormscanError::Configuration(_)));
    }

    #[test]
    fn test_undecodable_document() {
        let err = pipeline().process("iVBORw0KGgo=", "tnb_bill").unwrap_err();
        assert!(matches!(err, FormscanError::Decode(_)));
    }

    #[test]
    fn test_export_then_score() {
        let pipeline = pipeline();
        let result = pipeline.process(&scan_base64(), "tnb_bill").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let output = export_to_json(&result, dir.path().join("output.json")).unwrap();
        assert_eq!(load_extraction(&output).unwrap(), result);

        std::fs::write(
            dir.path().join("tnb_bill.json"),
            r#"{"account_no": "220012 34", "address": "Jalan Ampang, Kuala Lumpur", "off_page": "RM 10.00"}"#,
        )
        .unwrap();
        let store = GroundTruthStore::new(dir.path());
        let report = pipeline.score(&result, "tnb_bill", &store).unwrap();
        assert_eq!(report.total_fields, 3);
        assert_eq!(report.exact_matches, 2);
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_follows_template_order() {
        let result = pipeline().process(&scan_base64(), "tnb_bill").unwrap();
        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            vec!["off_page", "account_no", "address"]
        );

        let mut reordered = ExtractionResult::new();
        reordered.insert("total".to_string(), "RM 10.00".to_string());
        reordered.insert("account_no".to_string(), "2200 1234".to_string());
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_json(&reordered, dir.path().join("out.json")).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let total_at = written.find("\"total\"").unwrap();
        let account_at = written.find("\"account_no\"").unwrap();
        assert!(total_at < account_at);
        assert_eq!(
            load_extraction(&path).unwrap().keys().collect::<Vec<_>>(),
            vec!["total", "account_no"]
        );
    }

    #[test]
    fn test_export_keeps_non_ascii() {
        let mut result = ExtractionResult::new();
        result.insert("name".to_string(), "Zoë Müller".to_string());
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_json(&result, dir.path().join("out.json")).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("Zoë Müller"));
    }
}
