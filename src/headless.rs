//! Command-line mode: recognize one file and print the result

use crate::recognizer::Recognizer;
use crate::session::{ErrorReporter, EventPump, Session};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// JSON output for `--recognize FILE --json`
#[derive(Serialize)]
pub struct HeadlessOutput {
    pub file: String,
    pub text: String,
    pub has_text: bool,
    pub engine: String,
    pub engine_version: String,
    pub processing_time_ms: u64,
}

/// Nothing to repaint without a window
struct NoopPump;

impl EventPump for NoopPump {
    fn pump(&mut self) {}
}

#[derive(Default)]
struct StderrReporter {
    reported: usize,
}

impl ErrorReporter for StderrReporter {
    fn report(&mut self, title: &str, message: &str) {
        self.reported += 1;
        eprintln!("{}: {}", title, message);
    }
}

/// Recognize `path` and print the text. Returns false if the action failed.
pub async fn run(recognizer: Recognizer, path: &Path, json: bool) -> anyhow::Result<bool> {
    let start = Instant::now();
    let engine = recognizer.engine().name().to_string();
    let engine_version = recognizer.engine().version().to_string();

    let mut session = Session::new(recognizer);
    let mut reporter = StderrReporter::default();

    if session.open_path(path, &mut NoopPump, &mut reporter) {
        session.settle(&mut reporter).await;
    }

    if reporter.reported > 0 {
        return Ok(false);
    }

    let view = session.view();
    if json {
        let output = HeadlessOutput {
            file: path.display().to_string(),
            text: view.text.clone(),
            has_text: view.copy_enabled,
            engine,
            engine_version,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", view.text);
    }

    Ok(true)
}
