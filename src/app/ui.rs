use eframe::egui::{self, Button, Color32, Key, ProgressBar, RichText, Stroke};
use rfd::FileDialog;

use super::state::{UiMode, UploadStatus};
use super::DropUploader;
use crate::upload::FileHandle;

const ACCENT: Color32 = Color32::from_rgb(88, 140, 228);
const SUCCESS_GREEN: Color32 = Color32::from_rgb(0, 180, 0);
const FAILURE_RED: Color32 = Color32::from_rgb(220, 50, 50);

impl DropUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        // OS drops land anywhere on the window, but they only open a batch
        // while the select surface is showing, same as the picker path.
        if self.state.mode == UiMode::SelectFiles {
            let dropped = ctx.input(|i| i.raw.dropped_files.clone());
            if !dropped.is_empty() {
                self.add_files(dropped.iter().map(FileHandle::from_dropped).collect());
            }
        }
        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Batch File Uploader");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Drop files, name the batch, watch them upload")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);

                match self.state.mode {
                    UiMode::SelectFiles => self.render_drop_zone(ui, hovering_files),
                    UiMode::NameBatch => self.render_name_form(ui),
                }

                self.render_batches(ui);

                ui.add_space(20.0);
            });
        });
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui, hovering_files: bool) {
        let stroke = if hovering_files {
            Stroke::new(2.0, ACCENT)
        } else {
            Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
        };

        egui::Frame::none()
            .stroke(stroke)
            .rounding(6.0)
            .inner_margin(24.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("⬆").size(32.0).color(ACCENT));
                    ui.add_space(4.0);
                    ui.label(if hovering_files {
                        "Release to add the files"
                    } else {
                        "Drag and drop files here"
                    });
                    ui.add_space(8.0);
                    if ui.button("📁 Select files").clicked() {
                        if let Some(path) = FileDialog::new()
                            .add_filter("CSV files", &["csv"])
                            .pick_file()
                        {
                            self.add_files(vec![FileHandle::from_path(path)]);
                        }
                    }
                });
            });
    }

    fn render_name_form(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label("Name this batch");
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut self.state.name_input);
                let can_submit = !self.state.name_input.is_empty();

                let clicked = ui.add_enabled(can_submit, Button::new("Submit")).clicked();
                let entered =
                    response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

                if can_submit && (clicked || entered) {
                    self.submit_batch_name();
                }
            });
        });
    }

    fn render_batches(&self, ui: &mut egui::Ui) {
        for batch in self.state.batches.iter().filter(|batch| batch.is_named()) {
            ui.add_space(10.0);
            ui.group(|ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(format!("Batch: {}", batch.name)).strong());
                ui.add_space(6.0);

                for file in &batch.files {
                    ui.horizontal(|ui| {
                        ui.label(&file.name).on_hover_text(file.handle.origin());
                        match &file.status {
                            UploadStatus::Success => {
                                ui.colored_label(SUCCESS_GREEN, "✅");
                            }
                            UploadStatus::Failed(message) => {
                                ui.colored_label(FAILURE_RED, "❌")
                                    .on_hover_text(message.as_str());
                            }
                            UploadStatus::InProgress => {}
                        }
                    });

                    if !file.is_settled() {
                        ui.add(
                            ProgressBar::new(file.progress / 100.0)
                                .show_percentage()
                                .fill(ACCENT),
                        );
                    }
                    ui.add_space(4.0);
                }
            });
        }
    }
}
