//! Toolbar rendering for `RoomApp`.
//!
//! Draws the query field, the search button, the stats toggle and the
//! status line.

use eframe::egui;

use semantic_room::render::DriveMode;

use super::RoomApp;

impl RoomApp {
    /// Render the top toolbar strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);

            let searchable = !self.loading() && !self.room.is_empty();
            let hint = match self.room.drive_mode() {
                DriveMode::Layout => "Search for a word...",
                DriveMode::Physics => "Word to launch...",
            };

            let response = ui.add_enabled(
                searchable,
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text(hint)
                    .desired_width(ui.available_width() - 260.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.start_search(ctx);
            }

            if ui
                .add_enabled(searchable && !self.searching(), egui::Button::new("Search"))
                .clicked()
            {
                self.start_search(ctx);
            }

            if self.loading() || self.searching() {
                ui.spinner();
            }

            ui.checkbox(&mut self.show_stats, "Stats");

            if let Some(query) = &self.active_query {
                ui.label(
                    egui::RichText::new(format!("\u{201C}{query}\u{201D}"))
                        .color(egui::Color32::from_rgb(140, 200, 255)),
                );
            }
        });

        if let Some(err) = &self.error {
            ui.colored_label(egui::Color32::from_rgb(255, 110, 110), err);
        } else if self.loading() {
            ui.label("Embedding vocabulary...");
        }
    }
}
