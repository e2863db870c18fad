use std::collections::HashMap;
use std::time::Duration;

use eframe::egui;
use photo_grid_adapters::decode_data_uri;
use photo_grid_application::{
    ApplicationService, CloseSavedCommand, GridCellsQuery, MeasureImageCommand,
    PollUploadCommand, SaveActiveCommand, SelectSavedCommand, ToggleSavedCommand,
    UploadImageCommand,
};
use photo_grid_domain::{CellRect, DataUri, ImageSize};
use tracing::warn;

const WINDOW_WIDTH: f32 = 1000.0;
const WINDOW_HEIGHT: f32 = 720.0;
const MAX_IMAGE_HEIGHT_RATIO: f32 = 0.8;
const SAVED_THUMB_WIDTH: f32 = 260.0;
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

struct ActiveTexture {
    image: DataUri,
    texture: egui::TextureHandle,
}

pub struct PhotoGridApp {
    service: ApplicationService,
    active: Option<ActiveTexture>,
    thumbnails: ThumbnailCache<egui::TextureHandle>,
    status: Option<String>,
}

impl PhotoGridApp {
    fn new(service: ApplicationService) -> Self {
        Self {
            service,
            active: None,
            thumbnails: ThumbnailCache::default(),
            status: None,
        }
    }

    fn poll_upload(&mut self, ctx: &egui::Context) {
        match self.service.poll_upload(PollUploadCommand) {
            Ok(true) => self.status = None,
            Ok(false) => {}
            Err(error) => self.status = Some(format!("Upload failed: {error}")),
        }
        if self.service.state().pending_read.is_some() {
            ctx.request_repaint_after(READ_POLL_INTERVAL);
        }
    }

    /// Keeps the texture in step with the active image and reports the
    /// natural size once it is known.
    fn sync_active_texture(&mut self, ctx: &egui::Context) {
        let Some(image) = self.service.state().active_image.clone() else {
            self.active = None;
            return;
        };
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.image == image)
        {
            return;
        }

        match decode_data_uri(&image) {
            Ok(decoded) => {
                let texture = ctx.load_texture(
                    "active-image",
                    to_color_image(decoded.width, decoded.height, &decoded.rgba),
                    egui::TextureOptions::LINEAR,
                );
                if let Err(error) = self.service.measure_image(MeasureImageCommand {
                    width: decoded.width as f32,
                    height: decoded.height as f32,
                }) {
                    warn!(%error, "failed to record image size");
                }
                self.active = Some(ActiveTexture { image, texture });
            }
            Err(error) => {
                warn!(%error, "active image cannot be displayed");
                self.status = Some(format!("Cannot display image: {error}"));
                self.active = None;
            }
        }
    }

    fn upload_from_picker(&mut self) {
        let path = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .set_title("Upload Image")
            .pick_file();
        if let Err(error) = self.service.upload_image(UploadImageCommand { path }) {
            self.status = Some(format!("Upload failed: {error}"));
        }
    }

    fn show_image(&mut self, ui: &mut egui::Ui) {
        let Some(active) = &self.active else {
            return;
        };
        let natural = active.texture.size_vec2();
        let available = egui::vec2(
            ui.available_width(),
            ui.ctx().screen_rect().height() * MAX_IMAGE_HEIGHT_RATIO,
        );
        let shown = fit_within(natural, available);
        let (rect, _) = ui.allocate_exact_size(shown, egui::Sense::hover());

        let painter = ui.painter_at(rect);
        painter.image(
            active.texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        // Drawn only once the natural size is measured.
        let Some(ImageSize { width, height }) = self.service.state().image_size else {
            return;
        };
        let cells = match self.service.grid_cells(GridCellsQuery) {
            Ok(cells) => cells,
            Err(error) => {
                warn!(%error, "grid overlay skipped");
                return;
            }
        };
        let stroke = egui::Stroke::new(1.0, egui::Color32::from_white_alpha(179));
        for cell in cells {
            let shown_cell = cell.scaled(rect.width() / width, rect.height() / height);
            painter.rect_stroke(
                to_screen_rect(rect.min, &shown_cell),
                0.0,
                stroke,
                egui::StrokeKind::Inside,
            );
        }
    }

    fn show_saved_window(&mut self, ctx: &egui::Context) {
        if !self.service.state().show_saved_modal {
            return;
        }

        let saved = &self.service.state().saved_images;
        let thumbnails = &mut self.thumbnails;

        let mut open = true;
        let mut clicked = None;
        egui::Window::new("Saved Images")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, [-20.0, 50.0])
            .show(ctx, |ui| {
                if saved.is_empty() {
                    ui.label("No saved images yet.");
                    return;
                }
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (index, image) in saved.iter().enumerate() {
                        let Some(texture) =
                            thumbnails.get_or_load(image, || load_thumbnail(ctx, index, image))
                        else {
                            ui.label(format!("Saved {index} (unreadable)"));
                            continue;
                        };
                        let response = ui.add(
                            egui::Image::new(texture)
                                .max_width(SAVED_THUMB_WIDTH)
                                .sense(egui::Sense::click()),
                        );
                        if response.on_hover_text(format!("Saved {index}")).clicked() {
                            clicked = Some(index);
                        }
                    }
                });
            });

        if let Some(index) = clicked {
            if let Err(error) = self.service.select_saved(SelectSavedCommand { index }) {
                self.status = Some(error.to_string());
            }
        } else if !open {
            self.service.close_saved(CloseSavedCommand);
        }
    }
}

impl eframe::App for PhotoGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_upload(ctx);
        self.sync_active_texture(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("photo-grid");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Saved Images").clicked() {
                        self.service.toggle_saved(ToggleSavedCommand);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if ui.button("Upload Image").clicked() {
                    self.upload_from_picker();
                }
                if self.service.state().pending_read.is_some() {
                    ui.spinner();
                }
                if let Some(status) = &self.status {
                    ui.colored_label(egui::Color32::LIGHT_RED, status);
                }

                if self.active.is_some() {
                    ui.add_space(20.0);
                    self.show_image(ui);
                    ui.add_space(20.0);
                    if ui.button("Save to Local Storage").clicked() {
                        self.service.save_active(SaveActiveCommand);
                    }
                }
            });
        });

        self.show_saved_window(ctx);
    }
}

/// Thumbnails keyed by image content, so an entry always matches the image
/// it was decoded from. Failed decodes are remembered as `None`.
struct ThumbnailCache<T> {
    entries: HashMap<DataUri, Option<T>>,
}

impl<T> Default for ThumbnailCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ThumbnailCache<T> {
    fn get_or_load(&mut self, image: &DataUri, load: impl FnOnce() -> Option<T>) -> Option<&T> {
        if !self.entries.contains_key(image) {
            let loaded = load();
            self.entries.insert(image.clone(), loaded);
        }
        self.entries.get(image).and_then(Option::as_ref)
    }
}

fn load_thumbnail(
    ctx: &egui::Context,
    index: usize,
    image: &DataUri,
) -> Option<egui::TextureHandle> {
    match decode_data_uri(image) {
        Ok(decoded) => Some(ctx.load_texture(
            format!("saved-{index}"),
            to_color_image(decoded.width, decoded.height, &decoded.rgba),
            egui::TextureOptions::LINEAR,
        )),
        Err(error) => {
            warn!(%error, index, "saved image cannot be displayed");
            None
        }
    }
}

fn to_color_image(width: u32, height: u32, rgba: &[u8]) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], rgba)
}

fn to_screen_rect(origin: egui::Pos2, cell: &CellRect) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(cell.left, cell.top),
        egui::vec2(cell.width, cell.height),
    )
}

/// Scales `natural` down to fit inside `bounds`, keeping its aspect ratio.
/// Images smaller than the bounds keep their size.
fn fit_within(natural: egui::Vec2, bounds: egui::Vec2) -> egui::Vec2 {
    if natural.x <= 0.0 || natural.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (bounds.x / natural.x).min(bounds.y / natural.y).min(1.0);
    natural * scale.max(0.0)
}

pub fn launch_window(service: ApplicationService) -> Result<(), String> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        "photo-grid",
        options,
        Box::new(|_cc| Ok(Box::new(PhotoGridApp::new(service)))),
    )
    .map_err(|error| format!("failed to start UI: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_images_shrink_to_fit() {
        let shown = fit_within(egui::vec2(2000.0, 1000.0), egui::vec2(1000.0, 800.0));
        assert_eq!(shown, egui::vec2(1000.0, 500.0));
    }

    #[test]
    fn small_images_keep_their_size() {
        let shown = fit_within(egui::vec2(200.0, 100.0), egui::vec2(1000.0, 800.0));
        assert_eq!(shown, egui::vec2(200.0, 100.0));
    }

    #[test]
    fn cell_maps_to_screen_from_image_origin() {
        let cell = CellRect {
            left: 250.0,
            top: 62.5,
            width: 125.0,
            height: 62.5,
        };
        let rect = to_screen_rect(egui::pos2(10.0, 20.0), &cell);
        assert_eq!(rect.min, egui::pos2(260.0, 82.5));
        assert_eq!(rect.max, egui::pos2(385.0, 145.0));
    }

    #[test]
    fn thumbnails_follow_image_content_not_position() {
        let first = DataUri::from_parts("image/png", "AAAA").expect("uri");
        let second = DataUri::from_parts("image/png", "BBBB").expect("uri");
        let mut cache = ThumbnailCache::default();

        assert_eq!(cache.get_or_load(&first, || Some("first")), Some(&"first"));
        // Same slot in a list that changed underneath: a new entry, not the old one.
        assert_eq!(cache.get_or_load(&second, || Some("second")), Some(&"second"));
        assert_eq!(cache.get_or_load(&first, || Some("reloaded")), Some(&"first"));
    }

    #[test]
    fn failed_thumbnail_is_not_retried() {
        let image = DataUri::from_parts("image/png", "AAAA").expect("uri");
        let mut cache: ThumbnailCache<u32> = ThumbnailCache::default();
        let mut loads = 0;

        for _ in 0..3 {
            assert_eq!(
                cache.get_or_load(&image, || {
                    loads += 1;
                    None
                }),
                None
            );
        }
        assert_eq!(loads, 1);
    }
}
