use diagrammer::commands::{self, Category};
use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Keyboard Shortcuts")
        .open(open)
        .resizable(true)
        .default_width(480.0)
        .default_height(520.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for category in Category::ALL {
                    ui.label(egui::RichText::new(category.title()).strong());
                    for spec in commands::by_category(category) {
                        let shortcut = if spec.shortcut.is_empty() {
                            "palette"
                        } else {
                            spec.shortcut
                        };
                        help_row(ui, shortcut, spec.name);
                    }
                    ui.add_space(10.0);
                }

                ui.heading("Canvas");
                ui.separator();
                help_row(ui, "Ctrl+Shift+P", "Open command palette");
                help_row(ui, "Drag", "Move a shape, or pan on empty canvas");
                help_row(ui, "Middle drag", "Pan with any tool");
                help_row(ui, "Corner handle", "Resize the selected shape");
                help_row(ui, "Double-click", "Edit a shape's text");
                help_row(ui, "Scroll", "Pan the canvas");
                help_row(ui, "Ctrl+Scroll", "Zoom around the pointer");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Settings are read from ~/.config/diagrammer.toml or ./settings.toml:");
                ui.add_space(5.0);
                ui.code(
                    r##"nudge_step = 1.0
nudge_step_fast = 10.0
export_file_stem = "diagram"
export_scale = 2.0
background = "#ffffff""##,
                );
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [110.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}
