use std::path::Path;

use diagrammer::editor::CommandOutcome;
use diagrammer::export::images;
use diagrammer::{Command, ExportFormat};
use eframe::egui;
use futures::executor::block_on;

use super::DiagramApp;

impl DiagramApp {
    pub(super) fn run_command(&mut self, ctx: &egui::Context, command: Command) {
        match self.editor.execute(command) {
            Ok(CommandOutcome::Done | CommandOutcome::Ignored) => {}
            Ok(CommandOutcome::RequestSave) => self.save(),
            Ok(CommandOutcome::RequestImport) => self.import_dialog(),
            Ok(CommandOutcome::RequestExport(format)) => self.export_dialog(format),
            Ok(CommandOutcome::ShowShortcuts) => self.show_help = true,
            Err(e) => self.status = Some(e.to_string()),
        }
        ctx.request_repaint();
    }

    fn write_document(&mut self, path: &Path) {
        match self.editor.document().to_json_pretty() {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => {
                    self.unsaved.set(false);
                    self.status = Some(format!("Saved {}", path.display()));
                }
                Err(e) => self.status = Some(format!("Save failed: {e}")),
            },
            Err(e) => self.status = Some(format!("Serialize failed: {e}")),
        }
    }

    pub(super) fn save(&mut self) {
        match self.file_path.clone() {
            Some(path) => self.write_document(&path),
            None => self.save_as_dialog(),
        }
    }

    pub(super) fn save_as_dialog(&mut self) {
        let default_name = format!("{}.json", self.editor.settings().export_file_stem);
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.write_document(&path);
            self.file_path = Some(path);
        }
    }

    pub(super) fn import_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match self.editor.import_json(&json) {
                Ok(()) => self.status = Some(format!("Imported {}", path.display())),
                Err(e) => self.status = Some(format!("Import failed: {e}")),
            },
            Err(e) => self.status = Some(format!("Read failed: {e}")),
        }
    }

    pub(super) fn export_dialog(&mut self, format: ExportFormat) {
        let snapshot = self.editor.export_snapshot();
        let payload = match block_on(self.exporter.export(&snapshot, format, &self.images)) {
            Ok(payload) => payload,
            Err(e) => {
                self.status = Some(format!("Export failed: {e}"));
                return;
            }
        };
        let ext = format.extension();
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&payload.file_name)
            .add_filter(ext.to_uppercase(), &[ext])
            .save_file()
        {
            match std::fs::write(&path, &payload.bytes) {
                Ok(()) => self.status = Some(format!("Exported {}", path.display())),
                Err(e) => self.status = Some(format!("Export write failed: {e}")),
            }
        }
    }

    pub(super) fn pick_image(&mut self) {
        let uri = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
            .and_then(|path| {
                let mime = match path.extension().and_then(|e| e.to_str()) {
                    Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
                    _ => "image/jpeg",
                };
                match std::fs::read(&path) {
                    Ok(bytes) => Some(images::data_uri(mime, &bytes)),
                    Err(e) => {
                        self.status = Some(format!("Read failed: {e}"));
                        None
                    }
                }
            });
        self.editor.complete_image_placement(uri);
    }
}
