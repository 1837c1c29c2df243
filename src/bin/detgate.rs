//! detgate - detector gateway CLI
//!
//! Analyze local media files against a detection provider.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use detector_gateway::types::DEFAULT_CONTENT_TYPE;
use detector_gateway::{Config, DetectorGateway, ErrorBody, ProviderKind};
use futures_util::future::join_all;
use serde_json::json;
use tracing::error;

/// Detector gateway CLI
#[derive(Parser)]
#[command(name = "detgate")]
#[command(version = detector_gateway::version::PKG_VERSION)]
#[command(about = "Resilient gateway for deepfake detection APIs")]
struct Args {
    /// Config file path
    #[arg(short, long, env = "DETGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream provider
    #[arg(short, long, value_enum, env = "DETGATE_PROVIDER")]
    provider: ProviderKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one or more media files
    Analyze {
        /// Files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Content type for every file (default: guessed from extension)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Print the effective settings (API key redacted)
    Settings,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "detgate failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every file was analyzed successfully.
async fn run(args: Args) -> detector_gateway::Result<bool> {
    let config = Config::load(args.config.as_deref())?;
    let settings = config.settings(args.provider)?;

    match args.command {
        Command::Settings => {
            println!("{settings:#?}");
            println!("endpoint: {}", settings.endpoint());
            Ok(true)
        }

        Command::Analyze {
            files,
            content_type,
        } => {
            let gateway = DetectorGateway::new(settings)?;
            let outcomes = join_all(
                files
                    .iter()
                    .map(|file| analyze_file(&gateway, file, content_type.as_deref())),
            )
            .await;
            gateway.close().await;

            let mut all_ok = true;
            for (file, outcome) in files.iter().zip(outcomes) {
                let line = match outcome {
                    Ok(result) => json!({
                        "file": file.display().to_string(),
                        "status": "ok",
                        "result": result,
                    }),
                    Err(e) => {
                        all_ok = false;
                        error!(file = %file.display(), error = %e, "analysis failed");
                        json!({
                            "file": file.display().to_string(),
                            "status": "error",
                            "code": e.status_code(),
                            "error": ErrorBody::from(&e),
                        })
                    }
                };
                println!("{line}");
            }
            Ok(all_ok)
        }
    }
}

async fn analyze_file(
    gateway: &DetectorGateway,
    path: &Path,
    content_type: Option<&str>,
) -> detector_gateway::Result<detector_gateway::AnalyzeResult> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        detector_gateway::DetectorError::Configuration(format!(
            "failed to read {}: {e}",
            path.display()
        ))
    })?;
    let content_type = content_type.unwrap_or_else(|| guess_content_type(path));
    gateway.analyze(&bytes, Some(content_type)).await
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
