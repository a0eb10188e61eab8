//! Open → preprocess → recognize → display, independent of any window system
//!
//! Everything that touches the desktop (file dialog, clipboard, message boxes,
//! repainting) is passed in as a capability so the flow can be driven by the
//! egui window, by headless mode, or by tests.

use crate::engine::OcrResult;
use crate::error::OcrError;
use crate::preprocessing::Pipeline;
use crate::preview::PreviewImage;
use crate::recognizer::{RecognitionTask, Recognizer};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Extensions offered by the open dialog
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// How long the copy confirmation stays in the status bar
pub const COPY_STATUS_DURATION: Duration = Duration::from_secs(2);

/// Lets the user choose an image; `None` when cancelled
pub trait FileDialog {
    fn pick_image(&mut self) -> Option<PathBuf>;
}

/// Gives the interface a chance to redraw before long-running work starts
pub trait EventPump {
    fn pump(&mut self);
}

/// Plain-text clipboard
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), OcrError>;
}

/// Shows a failed action to the user
pub trait ErrorReporter {
    fn report(&mut self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ImageLoading,
    Preprocessing,
    Recognizing,
    Displaying,
}

/// Status bar text; the copy confirmation expires on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    expires_at: Option<Instant>,
}

impl StatusMessage {
    pub fn persistent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expires_at: None,
        }
    }

    pub fn transient(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Some(Instant::now() + duration),
        }
    }

    /// Text to show at `now`; empty once a transient message has expired
    pub fn text_at(&self, now: Instant) -> &str {
        match self.expires_at {
            Some(deadline) if now >= deadline => "",
            _ => &self.text,
        }
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// Everything the window displays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub preview: Option<PreviewImage>,
    /// Bumped whenever `preview` is replaced
    pub preview_generation: u64,
    pub text: String,
    pub copy_enabled: bool,
    pub status: StatusMessage,
}

/// A decoded image and the name of the file it came from
pub struct SourceImage {
    pub image: DynamicImage,
    pub file_name: String,
}

impl SourceImage {
    pub fn open(path: &Path) -> Result<Self, OcrError> {
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| OcrError::ImageLoadError(format!("{}: {}", path.display(), e)))?
            .decode()
            .map_err(|e| OcrError::ImageLoadError(format!("{}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { image, file_name })
    }
}

struct PendingRecognition {
    file_name: String,
    preview: PreviewImage,
    previous_status: StatusMessage,
    task: RecognitionTask,
}

pub struct Session {
    recognizer: Recognizer,
    pipeline: Pipeline,
    phase: Phase,
    view: View,
    pending: Option<PendingRecognition>,
}

impl Session {
    pub fn new(recognizer: Recognizer) -> Self {
        Self {
            recognizer,
            pipeline: Pipeline::new(),
            phase: Phase::Idle,
            view: View::default(),
            pending: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A recognition is running; opening another image is not allowed
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Ask for a file and start recognizing it. Returns true if recognition started.
    pub fn open_image(
        &mut self,
        dialog: &mut dyn FileDialog,
        pump: &mut dyn EventPump,
        reporter: &mut dyn ErrorReporter,
    ) -> bool {
        if self.is_busy() {
            tracing::debug!("Ignoring open request while recognition is running");
            return false;
        }

        match dialog.pick_image() {
            Some(path) => self.open_path(&path, pump, reporter),
            None => {
                tracing::debug!("Open dialog cancelled");
                false
            }
        }
    }

    /// Start recognizing the image at `path`
    pub fn open_path(
        &mut self,
        path: &Path,
        pump: &mut dyn EventPump,
        reporter: &mut dyn ErrorReporter,
    ) -> bool {
        if self.is_busy() {
            return false;
        }

        match self.begin(path, pump) {
            Ok(pending) => {
                self.pending = Some(pending);
                true
            }
            Err(e) => {
                self.phase = Phase::Idle;
                self.report(&e, reporter);
                false
            }
        }
    }

    fn begin(
        &mut self,
        path: &Path,
        pump: &mut dyn EventPump,
    ) -> Result<PendingRecognition, OcrError> {
        tracing::info!("Opening {}", path.display());

        self.phase = Phase::ImageLoading;
        let source = SourceImage::open(path)?;
        let preview = PreviewImage::from_image(&source.image);

        self.phase = Phase::Preprocessing;
        let processed = self.pipeline.process(source.image)?;
        for step in &processed.steps {
            tracing::trace!("{}: {}ms", step.name, step.time_ms);
        }
        tracing::debug!("Preprocessing took {}ms", processed.total_time_ms);

        self.phase = Phase::Recognizing;
        let previous_status = std::mem::replace(
            &mut self.view.status,
            StatusMessage::persistent("Processing..."),
        );
        pump.pump();

        let task = self.recognizer.submit(processed.image);

        Ok(PendingRecognition {
            file_name: source.file_name,
            preview,
            previous_status,
            task,
        })
    }

    /// Apply a finished recognition, if any. Returns true when the view changed.
    pub fn poll(&mut self, reporter: &mut dyn ErrorReporter) -> bool {
        let result = match self.pending.as_mut().and_then(|p| p.task.try_take()) {
            Some(result) => result,
            None => return false,
        };

        if let Some(pending) = self.pending.take() {
            self.finish(pending, result, reporter);
        }
        true
    }

    /// Wait for the running recognition, if any, and apply it
    pub async fn settle(&mut self, reporter: &mut dyn ErrorReporter) -> bool {
        let result = match self.pending.as_mut() {
            Some(pending) => pending.task.wait().await,
            None => return false,
        };

        if let Some(pending) = self.pending.take() {
            self.finish(pending, result, reporter);
        }
        true
    }

    fn finish(
        &mut self,
        pending: PendingRecognition,
        result: Result<OcrResult, OcrError>,
        reporter: &mut dyn ErrorReporter,
    ) {
        match result {
            Ok(ocr) => {
                self.phase = Phase::Displaying;
                tracing::info!(
                    "Recognized {} chars from {} in {}ms",
                    ocr.text.chars().count(),
                    pending.file_name,
                    ocr.recognition_time_ms
                );

                self.view.preview = Some(pending.preview);
                self.view.preview_generation += 1;
                self.view.copy_enabled = ocr.has_text();
                self.view.text = ocr.text;
                self.view.status =
                    StatusMessage::persistent(format!("Ready - {}", pending.file_name));
            }
            Err(e) => {
                self.view.status = pending.previous_status;
                self.report(&e, reporter);
            }
        }
        self.phase = Phase::Idle;
    }

    /// Put the displayed text on the clipboard
    pub fn copy_text(
        &mut self,
        clipboard: &mut dyn Clipboard,
        reporter: &mut dyn ErrorReporter,
    ) -> bool {
        if !self.view.copy_enabled {
            return false;
        }

        match clipboard.set_text(&self.view.text) {
            Ok(()) => {
                self.view.status = StatusMessage::transient("Text copied!", COPY_STATUS_DURATION);
                true
            }
            Err(e) => {
                self.report(&e, reporter);
                false
            }
        }
    }

    fn report(&self, error: &OcrError, reporter: &mut dyn ErrorReporter) {
        tracing::error!("{}", error);
        reporter.report("Error", &error.user_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OcrEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::runtime::Handle;

    struct FixedEngine {
        text: String,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn version(&self) -> &str {
            "test"
        }

        fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
            assert_eq!(image.color().channel_count(), 1);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OcrResult {
                text: self.text.clone(),
                recognition_time_ms: 1,
            })
        }
    }

    /// Succeeds once, then fails
    struct FlakyEngine {
        calls: AtomicUsize,
    }

    impl OcrEngine for FlakyEngine {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn version(&self) -> &str {
            "test"
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<OcrResult, OcrError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(OcrResult {
                    text: "first page".to_string(),
                    recognition_time_ms: 1,
                })
            } else {
                Err(OcrError::RecognitionError("engine exited with 1".to_string()))
            }
        }
    }

    struct Dialog(Option<PathBuf>);

    impl FileDialog for Dialog {
        fn pick_image(&mut self) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Pump(usize);

    impl EventPump for Pump {
        fn pump(&mut self) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct Board(Vec<String>);

    impl Clipboard for Board {
        fn set_text(&mut self, text: &str) -> Result<(), OcrError> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    struct BrokenBoard;

    impl Clipboard for BrokenBoard {
        fn set_text(&mut self, _text: &str) -> Result<(), OcrError> {
            Err(OcrError::ClipboardError("no display".to_string()))
        }
    }

    #[derive(Default)]
    struct Reports(Vec<(String, String)>);

    impl ErrorReporter for Reports {
        fn report(&mut self, title: &str, message: &str) {
            self.0.push((title.to_string(), message.to_string()));
        }
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_fn(40, 20, |x, _| {
            if x % 4 == 0 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 0, 0])
            }
        });
        img.save(&path).unwrap();
        path
    }

    fn session_with(engine: Arc<dyn OcrEngine>) -> Session {
        Session::new(Recognizer::new(engine, Handle::current()))
    }

    async fn open_and_settle(
        session: &mut Session,
        path: &Path,
        pump: &mut Pump,
        reports: &mut Reports,
    ) {
        let mut dialog = Dialog(Some(path.to_path_buf()));
        assert!(session.open_image(&mut dialog, pump, reports));
        assert!(session.is_busy());
        assert_eq!(session.view().status.text_at(Instant::now()), "Processing...");
        assert!(session.settle(reports).await);
    }

    #[tokio::test]
    async fn test_open_displays_text_and_enables_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let mut session = session_with(FixedEngine::new("Hello World"));
        let mut pump = Pump::default();
        let mut reports = Reports::default();

        open_and_settle(&mut session, &path, &mut pump, &mut reports).await;

        let view = session.view();
        assert_eq!(view.text, "Hello World");
        assert!(view.copy_enabled);
        assert_eq!(view.status.text_at(Instant::now()), "Ready - page.png");
        assert_eq!(view.preview.as_ref().map(|p| p.width()), Some(40));
        assert_eq!(view.preview_generation, 1);
        assert_eq!(pump.0, 1);
        assert!(reports.0.is_empty());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_whitespace_result_disables_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "blank.png");
        let mut session = session_with(FixedEngine::new("  \n \t"));
        let mut reports = Reports::default();

        open_and_settle(&mut session, &path, &mut Pump::default(), &mut reports).await;

        assert!(!session.view().copy_enabled);
        let mut board = Board::default();
        assert!(!session.copy_text(&mut board, &mut reports));
        assert!(board.0.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let engine = FixedEngine::new("Hello");
        let mut session = session_with(engine.clone());
        let mut pump = Pump::default();
        let mut reports = Reports::default();
        open_and_settle(&mut session, &path, &mut pump, &mut reports).await;
        let before = session.view().clone();

        let started = session.open_image(&mut Dialog(None), &mut pump, &mut reports);

        assert!(!started);
        assert_eq!(session.view(), &before);
        assert!(reports.0.is_empty());
        assert_eq!(pump.0, 1);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_file_reports_once_and_keeps_view() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png");
        let bad = dir.path().join("notes.png");
        std::fs::write(&bad, b"this is not an image").unwrap();

        let mut session = session_with(FixedEngine::new("Hello"));
        let mut pump = Pump::default();
        let mut reports = Reports::default();
        open_and_settle(&mut session, &good, &mut pump, &mut reports).await;
        let before = session.view().clone();

        let started = session.open_image(&mut Dialog(Some(bad)), &mut pump, &mut reports);

        assert!(!started);
        assert_eq!(reports.0.len(), 1);
        assert_eq!(reports.0[0].0, "Error");
        assert!(reports.0[0].1.starts_with("Failed to process image:\n"));
        assert_eq!(session.view(), &before);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(FixedEngine::new("Hello"));
        let mut reports = Reports::default();

        let started = session.open_path(
            &dir.path().join("gone.png"),
            &mut Pump::default(),
            &mut reports,
        );

        assert!(!started);
        assert_eq!(reports.0.len(), 1);
        assert_eq!(session.view(), &View::default());
    }

    #[tokio::test]
    async fn test_engine_failure_restores_previous_view() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "first.png");
        let second = write_png(dir.path(), "second.png");
        let mut session = session_with(Arc::new(FlakyEngine {
            calls: AtomicUsize::new(0),
        }));
        let mut pump = Pump::default();
        let mut reports = Reports::default();

        open_and_settle(&mut session, &first, &mut pump, &mut reports).await;
        let before = session.view().clone();
        open_and_settle(&mut session, &second, &mut pump, &mut reports).await;

        assert_eq!(reports.0.len(), 1);
        assert!(reports.0[0].1.contains("engine exited with 1"));
        assert_eq!(session.view(), &before);
        assert_eq!(
            session.view().status.text_at(Instant::now()),
            "Ready - first.png"
        );
    }

    #[tokio::test]
    async fn test_copy_puts_text_on_clipboard() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let mut session = session_with(FixedEngine::new("Line one\nLine two"));
        let mut reports = Reports::default();
        open_and_settle(&mut session, &path, &mut Pump::default(), &mut reports).await;

        let mut board = Board::default();
        assert!(session.copy_text(&mut board, &mut reports));

        assert_eq!(board.0, vec!["Line one\nLine two".to_string()]);
        let status = &session.view().status;
        assert_eq!(status.text_at(Instant::now()), "Text copied!");
        let later = Instant::now() + COPY_STATUS_DURATION + Duration::from_millis(10);
        assert_eq!(status.text_at(later), "");
    }

    #[tokio::test]
    async fn test_clipboard_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let mut session = session_with(FixedEngine::new("Hello"));
        let mut reports = Reports::default();
        open_and_settle(&mut session, &path, &mut Pump::default(), &mut reports).await;

        assert!(!session.copy_text(&mut BrokenBoard, &mut reports));
        assert_eq!(reports.0.len(), 1);
        assert_eq!(
            session.view().status.text_at(Instant::now()),
            "Ready - page.png"
        );
    }

    #[tokio::test]
    async fn test_open_is_refused_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let engine = FixedEngine::new("Hello");
        let mut session = session_with(engine.clone());
        let mut pump = Pump::default();
        let mut reports = Reports::default();

        let mut dialog = Dialog(Some(path.clone()));
        assert!(session.open_image(&mut dialog, &mut pump, &mut reports));
        assert!(!session.open_image(&mut dialog, &mut pump, &mut reports));
        session.settle(&mut reports).await;

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pump.0, 1);
    }

    #[tokio::test]
    async fn test_same_image_twice_gives_same_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let engine = FixedEngine::new("Invoice 12345");
        let mut session = session_with(engine.clone());
        let mut pump = Pump::default();
        let mut reports = Reports::default();

        open_and_settle(&mut session, &path, &mut pump, &mut reports).await;
        let first = session.view().text.clone();
        open_and_settle(&mut session, &path, &mut pump, &mut reports).await;

        assert_eq!(session.view().text, first);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.view().preview_generation, 2);
    }

    #[tokio::test]
    async fn test_poll_applies_result_without_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png");
        let mut session = session_with(FixedEngine::new("Polled"));
        let mut reports = Reports::default();

        assert!(session.open_path(&path, &mut Pump::default(), &mut reports));

        let mut applied = false;
        for _ in 0..200 {
            if session.poll(&mut reports) {
                applied = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(applied);
        assert_eq!(session.view().text, "Polled");
        assert!(!session.poll(&mut reports));
    }
}
