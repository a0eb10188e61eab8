//! Runs recognition off the UI thread
//!
//! The engine call blocks until the external process exits, so it is moved to
//! tokio's blocking pool. Callers get a [`RecognitionTask`] they can poll from
//! a frame loop or await directly.

use crate::engine::{OcrEngine, OcrResult};
use crate::error::OcrError;
use image::DynamicImage;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Callback fired on the worker thread once a result is available
pub type CompletionHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct Recognizer {
    engine: Arc<dyn OcrEngine>,
    runtime: Handle,
    on_complete: Option<CompletionHook>,
}

impl Recognizer {
    pub fn new(engine: Arc<dyn OcrEngine>, runtime: Handle) -> Self {
        Self {
            engine,
            runtime,
            on_complete: None,
        }
    }

    /// Register a callback run after every recognition finishes
    pub fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.engine
    }

    /// Start recognizing `image` in the background
    pub fn submit(&self, image: DynamicImage) -> RecognitionTask {
        let (tx, rx) = oneshot::channel();
        let engine = Arc::clone(&self.engine);
        let hook = self.on_complete.clone();

        self.runtime.spawn_blocking(move || {
            let result = engine.recognize(&image);
            if let Err(e) = &result {
                tracing::warn!("{} recognition failed: {}", engine.name(), e);
            }
            // Receiver gone means nobody is waiting for this result any more
            let _ = tx.send(result);
            if let Some(hook) = hook {
                hook();
            }
        });

        RecognitionTask { rx }
    }
}

/// Handle to one in-flight recognition
pub struct RecognitionTask {
    rx: oneshot::Receiver<Result<OcrResult, OcrError>>,
}

impl RecognitionTask {
    /// Non-blocking check; `None` while the engine is still running
    pub fn try_take(&mut self) -> Option<Result<OcrResult, OcrError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(worker_lost())),
        }
    }

    /// Wait for the result
    pub async fn wait(&mut self) -> Result<OcrResult, OcrError> {
        match (&mut self.rx).await {
            Ok(result) => result,
            Err(_) => Err(worker_lost()),
        }
    }
}

fn worker_lost() -> OcrError {
    OcrError::Internal("recognition task ended without a result".to_string())
}
