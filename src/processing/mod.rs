pub mod document;
pub mod image;
pub mod merge;
pub mod ocr;
pub mod region;

pub use document::{DecodeOptions, DocumentDecoder, DocumentKind};
pub use self::image::ImageProcessor;
pub use merge::{share_same_y, MergedGroup, TokenMerger, DEFAULT_LINE_THRESHOLD};
pub use ocr::{
    BoxAwareExtractor, BoxRecognizer, EngineKind, OcrEngine, PlainTextExtractor, TesseractRecognizer,
    TextRecognizer,
};
pub use region::{FieldImages, RegionCrops, RegionExtractor, PADDING};
