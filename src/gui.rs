//! Desktop window
//!
//! Thin eframe/egui shell around [`Session`]: native file and message
//! dialogs come from rfd, the clipboard from arboard.

use crate::error::OcrError;
use crate::recognizer::Recognizer;
use crate::session::{
    Clipboard, ErrorReporter, EventPump, FileDialog, Phase, Session, IMAGE_EXTENSIONS,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub const WINDOW_TITLE: &str = "OCR HIGH QUALITY";

/// Minimum height reserved for the preview above the buttons
const PREVIEW_AREA_HEIGHT: f32 = 400.0;

/// Open the main window and block until it is closed
pub fn run(recognizer: Recognizer) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([800.0, 760.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(OcrWindow::new(cc, recognizer)))),
    )
    .map_err(|e| anyhow::anyhow!("Window failed: {}", e))
}

/// Critical dialog shown when the application cannot start
pub fn show_fatal(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Error")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

struct OcrWindow {
    session: Session,
    /// Linux clipboards are served by the owning process; keep the handle alive
    clipboard: Option<arboard::Clipboard>,
    texture: Option<egui::TextureHandle>,
    texture_generation: u64,
}

impl OcrWindow {
    fn new(cc: &eframe::CreationContext<'_>, recognizer: Recognizer) -> Self {
        let ctx = cc.egui_ctx.clone();
        let recognizer = recognizer.with_completion_hook(Arc::new(move || ctx.request_repaint()));

        Self {
            session: Session::new(recognizer),
            clipboard: None,
            texture: None,
            texture_generation: 0,
        }
    }

    /// Upload the preview again whenever the session replaced it
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let view = self.session.view();
        if view.preview_generation == self.texture_generation {
            return;
        }
        self.texture_generation = view.preview_generation;

        self.texture = view.preview.as_ref().map(|preview| {
            let size = [preview.width() as usize, preview.height() as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, preview.pixels.as_raw());
            ctx.load_texture("preview", image, egui::TextureOptions::LINEAR)
        });
    }
}

impl eframe::App for OcrWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.poll(&mut MessageBoxReporter);
        self.sync_texture(ctx);

        let now = Instant::now();
        let busy = self.session.is_busy();
        let mut open_clicked = false;
        let mut copy_clicked = false;

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.session.phase() == Phase::Recognizing {
                    ui.spinner();
                }
                ui.label(self.session.view().status.text_at(now));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_min_height(PREVIEW_AREA_HEIGHT);
                match &self.texture {
                    Some(texture) => {
                        let max = egui::vec2(ui.available_width(), PREVIEW_AREA_HEIGHT);
                        ui.add(
                            egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                                .max_size(max),
                        );
                    }
                    None => {
                        ui.add_space(PREVIEW_AREA_HEIGHT / 2.0);
                        ui.label("Open an image to begin...");
                    }
                }
            });

            ui.separator();
            ui.horizontal(|ui| {
                open_clicked = ui
                    .add_enabled(!busy, egui::Button::new("Open Image"))
                    .clicked();
                copy_clicked = ui
                    .add_enabled(self.session.view().copy_enabled, egui::Button::new("Copy Text"))
                    .clicked();
            });
            ui.separator();

            let mut text = self.session.view().text.as_str();
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_sized(
                    ui.available_size(),
                    egui::TextEdit::multiline(&mut text).font(egui::TextStyle::Monospace),
                );
            });
        });

        if open_clicked {
            self.session
                .open_image(&mut NativeFileDialog, &mut RepaintPump(ctx), &mut MessageBoxReporter);
        }

        if copy_clicked {
            self.session
                .copy_text(&mut SystemClipboard(&mut self.clipboard), &mut MessageBoxReporter);
        }

        if let Some(deadline) = self.session.view().status.expires_at() {
            if deadline > now {
                ctx.request_repaint_after(deadline - now);
            }
        }
    }
}

struct NativeFileDialog;

impl FileDialog for NativeFileDialog {
    fn pick_image(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open Image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
    }
}

struct RepaintPump<'a>(&'a egui::Context);

impl EventPump for RepaintPump<'_> {
    fn pump(&mut self) {
        self.0.request_repaint();
    }
}

struct SystemClipboard<'a>(&'a mut Option<arboard::Clipboard>);

impl Clipboard for SystemClipboard<'_> {
    fn set_text(&mut self, text: &str) -> Result<(), OcrError> {
        let mut clipboard = match self.0.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()
                .map_err(|e| OcrError::ClipboardError(e.to_string()))?,
        };

        let result = clipboard
            .set_text(text)
            .map_err(|e| OcrError::ClipboardError(e.to_string()));
        *self.0 = Some(clipboard);
        result
    }
}

struct MessageBoxReporter;

impl ErrorReporter for MessageBoxReporter {
    fn report(&mut self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
