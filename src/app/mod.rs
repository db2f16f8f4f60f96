use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use diagrammer::export::{DefaultImageSource, Exporter, ImageSource, images};
use diagrammer::settings::{self, Settings};
use diagrammer::{Editor, Point, Size};
use eframe::egui;
use futures::executor::block_on;

mod actions;
mod command_palette;
mod help;
mod render;
mod update;

pub struct DiagramApp {
    editor: Editor,
    exporter: Exporter,
    images: DefaultImageSource,
    // Decoded image shapes keyed by URI; `None` marks a URI that failed to load.
    textures: HashMap<String, Option<egui::TextureHandle>>,
    command_palette: command_palette::CommandPalette,
    settings_path: PathBuf,
    file_path: Option<PathBuf>,
    unsaved: Rc<Cell<bool>>,
    status: Option<String>,
    show_help: bool,
    loaded: bool,
}

impl DiagramApp {
    fn config_path() -> PathBuf {
        let candidates = settings::search_paths();
        candidates
            .iter()
            .find(|p| p.exists())
            .or(candidates.last())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    pub fn new(_cc: &eframe::CreationContext<'_>, file_path: Option<PathBuf>) -> Self {
        let settings_path = Self::config_path();
        let settings = settings::load_settings(&settings_path).unwrap_or_default();
        let exporter = Exporter::new(&settings);

        let unsaved = Rc::new(Cell::new(false));
        let mut editor = Editor::new(settings);
        let flag = Rc::clone(&unsaved);
        editor.set_listener(move |_| flag.set(true));

        Self {
            editor,
            exporter,
            images: DefaultImageSource,
            textures: HashMap::new(),
            command_palette: command_palette::CommandPalette::default(),
            settings_path,
            file_path,
            unsaved,
            status: None,
            show_help: false,
            loaded: false,
        }
    }

    fn load_initial(&mut self, canvas: Size) {
        self.loaded = true;
        let doc = match &self.file_path {
            Some(path) => match std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|json| diagrammer::Document::from_json(&json).map_err(|e| e.to_string()))
            {
                Ok(doc) => {
                    self.status = Some(format!("Loaded {}", path.display()));
                    Some(doc)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not open diagram");
                    self.status = Some(format!("Open failed: {e}"));
                    None
                }
            },
            None => None,
        };
        self.editor.load(doc, canvas);
        self.unsaved.set(false);
    }

    fn reload_settings(&mut self) {
        let settings = settings::load_settings(&self.settings_path).unwrap_or_default();
        self.exporter = Exporter::new(&settings);
        self.editor.set_settings(settings);
        self.status = Some(format!("Settings reloaded from {}", self.settings_path.display()));
    }

    fn persist_settings(&mut self) {
        let snapshot: Settings = self.editor.settings().clone();
        match settings::save_settings(&self.settings_path, &snapshot) {
            Ok(()) => {
                self.status = Some(format!("Settings written to {}", self.settings_path.display()))
            }
            Err(e) => self.status = Some(format!("Settings save failed: {e}")),
        }
    }

    fn texture(&mut self, ctx: &egui::Context, uri: &str) -> Option<egui::TextureHandle> {
        if let Some(cached) = self.textures.get(uri) {
            return cached.clone();
        }
        let decoded = block_on(self.images.fetch(uri))
            .and_then(|bytes| images::decode_pixmap(&bytes, uri));
        let texture = match decoded {
            Ok(pixmap) => {
                let size = [pixmap.width() as usize, pixmap.height() as usize];
                let color = egui::ColorImage::from_rgba_premultiplied(size, pixmap.data());
                let name = format!("image-{}", self.textures.len());
                Some(ctx.load_texture(name, color, Default::default()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "image shape could not be decoded");
                None
            }
        };
        self.textures.insert(uri.to_string(), texture.clone());
        texture
    }
}

pub(super) fn to_point(p: egui::Pos2, origin: egui::Pos2) -> Point {
    Point::new(p.x - origin.x, p.y - origin.y)
}

pub(super) fn to_pos(p: Point, origin: egui::Pos2) -> egui::Pos2 {
    egui::pos2(origin.x + p.x, origin.y + p.y)
}
