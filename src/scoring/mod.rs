pub mod normalize;
pub mod similarity;

pub use normalize::normalize;
pub use similarity::ratio;

use crate::models::{ExtractionResult, FieldScore, GroundTruth, ScoreReport};
use crate::utils::FormscanError;
use indexmap::IndexMap;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Compares extraction results against ground truth.
pub struct Scorer;

impl Scorer {
    /// Per-field similarity for every ground-truth field. Extracted fields
    /// without ground truth are ignored; missing extracted fields score 0.
    pub fn score_fields(extracted: &ExtractionResult, ground_truth: &GroundTruth) -> Vec<FieldScore> {
        ground_truth
            .iter()
            .map(|(field, expected)| {
                let (similarity, exact) = match extracted.get(field) {
                    None => (0.0, false),
                    Some(actual) => {
                        let actual = normalize(actual);
                        let expected = normalize(expected);
                        if actual == expected {
                            (1.0, true)
                        } else {
                            (ratio(&actual, &expected), false)
                        }
                    }
                };
                debug!("'{}': similarity {:.3}{}", field, similarity, if exact { " (exact)" } else { "" });
                FieldScore {
                    field: field.clone(),
                    similarity,
                    exact,
                }
            })
            .collect()
    }

    pub fn score(extracted: &ExtractionResult, ground_truth: &GroundTruth) -> ScoreReport {
        Self::summarize(&Self::score_fields(extracted, ground_truth))
    }

    /// Aggregates field scores. Both ratios are 0 when there are no fields.
    pub fn summarize(scores: &[FieldScore]) -> ScoreReport {
        let total_fields = scores.len();
        let exact_matches = scores.iter().filter(|s| s.exact).count();
        let (overall_similarity, accuracy) = if total_fields > 0 {
            let similarity_sum: f64 = scores.iter().map(|s| s.similarity).sum();
            (
                similarity_sum / total_fields as f64,
                exact_matches as f64 / total_fields as f64,
            )
        } else {
            (0.0, 0.0)
        };

        ScoreReport {
            exact_matches,
            total_fields,
            overall_similarity,
            accuracy,
        }
    }
}

/// Reads a flat JSON object of strings. The error is a descriptive message
/// naming the file and, for syntax errors, the line and column.
fn load_text_map(path: &Path) -> Result<IndexMap<String, String>, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => format!("File not found: {}.", path.display()),
        _ => format!(
            "An unexpected error occurred while loading {}: {}.",
            path.display(),
            e
        ),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        format!(
            "Error decoding JSON from {}: {}. Check JSON format. Error at line {}, column {}.",
            path.display(),
            e,
            e.line(),
            e.column()
        )
    })
}

pub fn load_ground_truth<P: AsRef<Path>>(path: P) -> Result<GroundTruth, FormscanError> {
    load_text_map(path.as_ref()).map_err(FormscanError::GroundTruth)
}

pub fn load_extraction<P: AsRef<Path>>(path: P) -> Result<ExtractionResult, FormscanError> {
    load_text_map(path.as_ref()).map_err(|msg| FormscanError::Io(format!("Error loading output JSON: {}", msg)))
}

/// One ground-truth record per template, stored as `<dir>/<template>.json`.
#[derive(Debug, Clone)]
pub struct GroundTruthStore {
    dir: PathBuf,
}

impl GroundTruthStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        GroundTruthStore { dir: dir.into() }
    }

    pub fn path_for(&self, template_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", template_name))
    }

    pub fn load(&self, template_name: &str) -> Result<GroundTruth, FormscanError> {
        load_ground_truth(self.path_for(template_name))
    }
}

/// Scores a saved extraction file against a ground-truth file. Any load
/// failure aborts scoring.
pub fn run_test<P: AsRef<Path>, Q: AsRef<Path>>(
    output_path: P,
    ground_truth_path: Q,
) -> Result<ScoreReport, FormscanError> {
    let extracted = load_extraction(output_path)?;
    let ground_truth = load_ground_truth(ground_truth_path)?;
    let report = Scorer::score(&extracted, &ground_truth);
    info!("Test results: {:?}", report);
    Ok(report)
}
