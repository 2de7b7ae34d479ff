pub mod models;
pub mod pipeline;
pub mod processing;
pub mod scoring;
pub mod utils;

pub use pipeline::{export_to_json, DocumentPipeline};
pub use utils::FormscanError;
