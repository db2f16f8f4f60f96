use diagrammer::commands::{self, CommandSpec};
use diagrammer::{Command, Editor};
use eframe::egui;

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(editor: &Editor, command: Command) -> bool {
        if editor.editing().is_some() && command.blocked_while_editing() {
            return false;
        }
        let has_shape = editor.selection().shape_id().is_some();
        match command {
            Command::Undo => editor.can_undo(),
            Command::Redo => editor.can_redo(),
            Command::Delete => *editor.selection() != diagrammer::Selection::None,
            Command::Duplicate
            | Command::EditSelected
            | Command::FontIncrease
            | Command::FontDecrease
            | Command::MoveUp
            | Command::MoveDown
            | Command::MoveLeft
            | Command::MoveRight
            | Command::MoveUpLarge
            | Command::MoveDownLarge
            | Command::MoveLeftLarge
            | Command::MoveRightLarge => has_shape,
            Command::SelectNext | Command::SelectPrevious | Command::FitToView => {
                !editor.document().shapes.is_empty()
            }
            _ => true,
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, editor: &Editor) -> Option<Command> {
        if !self.open {
            return None;
        }
        let matches: Vec<&'static CommandSpec> = commands::search(&self.query);
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut run_selected = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let screen = ctx.content_rect();
        let width = 520.0;
        let height = 320.0;
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        egui::Area::new(egui::Id::new("command_palette"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(24, 24, 27, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(99, 102, 241)))
                    .inner_margin(10.0)
                    .corner_radius(egui::CornerRadius::same(8));
                frame.show(ui, |ui| {
                    ui.set_min_size(egui::vec2(width, height));
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Search commands"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(height - 64.0).show(ui, |ui| {
                        for (idx, spec) in matches.iter().take(24).enumerate() {
                            let enabled = Self::is_enabled(editor, spec.command);
                            ui.horizontal(|ui| {
                                let resp = ui.add_enabled(
                                    enabled,
                                    egui::Button::new(spec.name).selected(idx == self.selected),
                                );
                                if resp.clicked() {
                                    self.selected = idx;
                                    run_selected = true;
                                }
                                if !spec.shortcut.is_empty() {
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| ui.weak(spec.shortcut),
                                    );
                                }
                            });
                        }
                    });
                });
            });

        if run_selected {
            if let Some(spec) = matches.get(self.selected) {
                if Self::is_enabled(editor, spec.command) {
                    let command = spec.command;
                    self.close();
                    return Some(command);
                }
            }
        }
        None
    }
}
