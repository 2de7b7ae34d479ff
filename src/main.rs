// Command line front end: extract fields from a scan and score them

use clap::{Args, Parser, Subcommand, ValueEnum};
use formscan::{
    export_to_json,
    models::TemplateCache,
    processing::{DecodeOptions, DocumentDecoder, EngineKind, TesseractRecognizer, TokenMerger, DEFAULT_LINE_THRESHOLD},
    scoring::{run_test, GroundTruthStore},
    DocumentPipeline, FormscanError,
};
use log::error;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "formscan", version, about = "Template-driven OCR field extraction and scoring")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every field of a template from a JPEG or PDF document
    Extract(ExtractArgs),
    /// Compare a saved extraction with a ground-truth file
    Score {
        #[arg(short, long, default_value = "output.json")]
        output: PathBuf,
        #[arg(short, long, default_value = "ground_truth.json")]
        ground_truth: PathBuf,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Document to process (raw JPEG/PDF, or base64 text with --base64)
    document: PathBuf,
    #[arg(short, long)]
    template: String,
    #[arg(long, env = "FORMSCAN_TEMPLATES", default_value = "templates.json")]
    templates: PathBuf,
    #[arg(long, value_enum, default_value_t = Engine::Text)]
    engine: Engine,
    /// Apply contrast, sharpness and brightness filters to JPEG scans
    #[arg(long)]
    enhance: bool,
    /// The document file already holds base64 text
    #[arg(long)]
    base64: bool,
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,
    #[arg(long, env = "FORMSCAN_GROUND_TRUTH_DIR", default_value = "ground_truth")]
    ground_truth_dir: PathBuf,
    /// Same-line tolerance in pixels for the box engine
    #[arg(long, default_value_t = DEFAULT_LINE_THRESHOLD)]
    threshold: f32,
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<String>,
    /// Skip the ground-truth comparison
    #[arg(long)]
    no_score: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    /// One string per region
    Text,
    /// Word boxes merged into lines
    Boxes,
}

impl From<Engine> for EngineKind {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Text => EngineKind::Text,
            Engine::Boxes => EngineKind::Boxes,
        }
    }
}

fn extract(args: ExtractArgs) -> Result<bool, FormscanError> {
    let registry = TemplateCache::load(&args.templates)?;
    let encoded = if args.base64 {
        std::fs::read_to_string(&args.document)
            .map_err(|e| FormscanError::Io(format!("Failed to read {:?}: {}", args.document, e)))?
    } else {
        DocumentDecoder::encode_file(&args.document)?
    };

    let engine = EngineKind::from(args.engine).build(
        TesseractRecognizer::new(args.tessdata.clone()),
        TokenMerger::new(args.threshold),
    );
    let pipeline = DocumentPipeline::new(registry, engine).with_decode_options(DecodeOptions {
        enhance: args.enhance,
    });

    let extracted = pipeline.process(&encoded, &args.template)?;
    export_to_json(&extracted, &args.output)?;

    let (test_results, scored) = if args.no_score {
        (None, true)
    } else {
        let store = GroundTruthStore::new(&args.ground_truth_dir);
        match pipeline.score(&extracted, &args.template, &store) {
            Ok(report) => (Some(report), true),
            Err(e) => {
                error!("{}", e);
                (None, false)
            }
        }
    };

    let response = json!({
        "extracted_text": extracted,
        "test_results": test_results,
    });
    println!("{}", serde_json::to_string_pretty(&response).unwrap_or_default());
    Ok(scored)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Extract(args) => extract(args),
        Command::Score { output, ground_truth } => run_test(&output, &ground_truth).map(|report| {
            println!("Test Results: {}", json!(report));
            true
        }),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
