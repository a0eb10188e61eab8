use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
#[cfg(feature = "gui")]
mod gui;
mod headless;
mod preprocessing;
mod preview;
mod recognizer;
mod session;

#[derive(Parser, Debug)]
#[command(name = "ocr-desk")]
#[command(about = "Open an image, extract its text with Tesseract and copy it")]
#[command(version)]
pub struct Args {
    /// Tesseract executable, looked up on PATH unless a path is given
    #[arg(long, env = "OCR_TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: PathBuf,

    /// Language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Recognize FILE without opening a window and print the text
    #[arg(long, value_name = "FILE")]
    pub recognize: Option<PathBuf>,

    /// Print the headless result as JSON
    #[arg(long, requires = "recognize")]
    pub json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let headless_file = args.recognize.clone();
    let json = args.json;
    let config = config::Config::from(args);

    tracing::info!("Starting ocr-desk v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Runtime::new()?;
    // Dialogs reach the desktop portal through the runtime
    let _guard = runtime.enter();

    let engine = match engines::detect(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("{}", e);
            report_setup_failure(headless_file.is_none());
            std::process::exit(1);
        }
    };

    let recognizer = recognizer::Recognizer::new(engine, runtime.handle().clone());

    match headless_file {
        Some(path) => {
            if !runtime.block_on(headless::run(recognizer, &path, json))? {
                std::process::exit(1);
            }
            Ok(())
        }
        None => run_window(recognizer),
    }
}

#[cfg(feature = "gui")]
fn run_window(recognizer: recognizer::Recognizer) -> anyhow::Result<()> {
    gui::run(recognizer)
}

#[cfg(not(feature = "gui"))]
fn run_window(_recognizer: recognizer::Recognizer) -> anyhow::Result<()> {
    anyhow::bail!("built without the `gui` feature; use --recognize <FILE>")
}

#[cfg(feature = "gui")]
fn report_setup_failure(interactive: bool) {
    eprintln!("{}", error::SETUP_INSTRUCTIONS);
    if interactive {
        gui::show_fatal(error::SETUP_INSTRUCTIONS);
    }
}

#[cfg(not(feature = "gui"))]
fn report_setup_failure(_interactive: bool) {
    eprintln!("{}", error::SETUP_INSTRUCTIONS);
}
