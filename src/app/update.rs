use diagrammer::model::COLOR_PALETTE;
use diagrammer::{Command, PointerButton, Request, Selection, Size, Tool};
use eframe::egui;

use super::{DiagramApp, help, render, to_point, to_pos};

// Key bindings, shifted variants first: `consume_key` ignores an unlisted shift.
const SHORTCUTS: &[(egui::Modifiers, egui::Key, Command)] = {
    use egui::Key;
    const NONE: egui::Modifiers = egui::Modifiers::NONE;
    const SHIFT: egui::Modifiers = egui::Modifiers::SHIFT;
    const CMD: egui::Modifiers = egui::Modifiers::COMMAND;
    const CMD_SHIFT: egui::Modifiers = egui::Modifiers {
        shift: true,
        ..egui::Modifiers::COMMAND
    };
    &[
        (CMD_SHIFT, Key::Z, Command::Redo),
        (CMD_SHIFT, Key::E, Command::ExportPng),
        (CMD, Key::Z, Command::Undo),
        (CMD, Key::Y, Command::Redo),
        (CMD, Key::S, Command::Save),
        (CMD, Key::O, Command::Import),
        (CMD, Key::E, Command::ExportPdf),
        (CMD, Key::D, Command::Duplicate),
        (CMD, Key::Num0, Command::ZoomReset),
        (CMD, Key::Equals, Command::ZoomIn),
        (CMD, Key::Plus, Command::ZoomIn),
        (CMD, Key::Minus, Command::ZoomOut),
        (NONE, Key::Escape, Command::Cancel),
        (NONE, Key::Questionmark, Command::ShowShortcuts),
        (NONE, Key::V, Command::Tool(Tool::Select)),
        (NONE, Key::R, Command::Tool(Tool::Rectangle)),
        (NONE, Key::C, Command::Tool(Tool::Circle)),
        (NONE, Key::D, Command::Tool(Tool::Database)),
        (NONE, Key::T, Command::Tool(Tool::Text)),
        (NONE, Key::M, Command::Tool(Tool::Diamond)),
        (NONE, Key::I, Command::Tool(Tool::Image)),
        (NONE, Key::A, Command::Tool(Tool::Arrow)),
        (NONE, Key::F, Command::FitToView),
        (NONE, Key::Delete, Command::Delete),
        (NONE, Key::Backspace, Command::Delete),
        (NONE, Key::Enter, Command::EditSelected),
        (SHIFT, Key::Tab, Command::SelectPrevious),
        (NONE, Key::Tab, Command::SelectNext),
        (SHIFT, Key::ArrowUp, Command::MoveUpLarge),
        (SHIFT, Key::ArrowDown, Command::MoveDownLarge),
        (SHIFT, Key::ArrowLeft, Command::MoveLeftLarge),
        (SHIFT, Key::ArrowRight, Command::MoveRightLarge),
        (NONE, Key::ArrowUp, Command::MoveUp),
        (NONE, Key::ArrowDown, Command::MoveDown),
        (NONE, Key::ArrowLeft, Command::MoveLeft),
        (NONE, Key::ArrowRight, Command::MoveRight),
        (NONE, Key::OpenBracket, Command::FontDecrease),
        (NONE, Key::CloseBracket, Command::FontIncrease),
    ]
};

const BUTTONS: [(egui::PointerButton, PointerButton); 3] = [
    (egui::PointerButton::Primary, PointerButton::Primary),
    (egui::PointerButton::Middle, PointerButton::Middle),
    (egui::PointerButton::Secondary, PointerButton::Secondary),
];

impl DiagramApp {
    fn collect_shortcuts(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let editing = self.editor.editing().is_some();
        if self.command_palette.open || (ctx.wants_keyboard_input() && !editing) {
            return Vec::new();
        }
        ctx.input_mut(|i| {
            if !editing
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                self.command_palette.open("");
                return Vec::new();
            }
            SHORTCUTS
                .iter()
                .filter(|(_, _, command)| !(editing && command.blocked_while_editing()))
                .filter(|(modifiers, key, _)| i.consume_key(*modifiers, *key))
                .map(|(_, _, command)| *command)
                .collect()
        })
    }

    fn handle_canvas_input(
        &mut self,
        ctx: &egui::Context,
        origin: egui::Pos2,
        response: &egui::Response,
    ) {
        let (pos, presses, released, moving, scroll, zoom_modifier) = ctx.input(|i| {
            let presses: Vec<PointerButton> = BUTTONS
                .iter()
                .filter(|(egui_button, _)| i.pointer.button_pressed(*egui_button))
                .map(|(_, button)| *button)
                .collect();
            (
                i.pointer.interact_pos(),
                presses,
                i.pointer.any_released(),
                i.pointer.is_moving(),
                i.raw_scroll_delta,
                i.modifiers.command,
            )
        });
        let Some(pos) = pos else {
            return;
        };
        let screen = to_point(pos, origin);

        if response.hovered() {
            for button in presses {
                if self.editor.pointer_down(screen, button) == Some(Request::PickImage) {
                    self.pick_image();
                }
            }
            if response.double_clicked() {
                self.editor.double_click(screen);
            }
            if zoom_modifier && scroll.y != 0.0 {
                // egui reports scrolling up as positive
                self.editor.scroll_zoom(screen, -scroll.y);
            } else if scroll != egui::Vec2::ZERO {
                self.editor
                    .viewport_mut()
                    .pan_by(diagrammer::Point::new(scroll.x, scroll.y));
            }
        }

        if moving {
            self.editor.pointer_move(screen);
        }
        if released {
            self.editor.pointer_up();
        }
    }

    fn inline_text_editor(&mut self, ctx: &egui::Context, origin: egui::Pos2) {
        let Some(id) = self.editor.editing().map(str::to_string) else {
            return;
        };
        let Some(shape) = self.editor.document().shape(&id) else {
            return;
        };
        let view = self.editor.viewport();
        let bounds = shape.bounds();
        let min = to_pos(view.document_to_screen(bounds.min), origin);
        let max = to_pos(view.document_to_screen(bounds.max), origin);
        let rect = egui::Rect::from_min_max(min, max);
        let mut text = shape.label.clone();
        let font_size = shape.font_size() * view.zoom();

        egui::Area::new(egui::Id::new("inline_text_edit"))
            .fixed_pos(rect.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(4.0);
                frame.show(ui, |ui| {
                    ui.set_min_size(rect.size());
                    let response = ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .font(egui::FontId::proportional(font_size))
                            .desired_width((rect.width() - 8.0).max(40.0))
                            .frame(false),
                    );
                    response.request_focus();
                    if response.changed() {
                        self.editor.set_text(&id, text.clone());
                    }
                });
            });
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    for (label, command) in [
                        ("Save", Command::Save),
                        ("Import JSON…", Command::Import),
                        ("Export PNG…", Command::ExportPng),
                        ("Export PDF…", Command::ExportPdf),
                        ("Export JSON…", Command::ExportJson),
                    ] {
                        if ui.button(label).clicked() {
                            self.run_command(ctx, command);
                            ui.close();
                        }
                    }
                    if ui.button("Save As…").clicked() {
                        self.save_as_dialog();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Reload settings").clicked() {
                        self.reload_settings();
                        ui.close();
                    }
                    if ui.button("Write settings").clicked() {
                        self.persist_settings();
                        ui.close();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    for (label, command, enabled) in [
                        ("Undo", Command::Undo, self.editor.can_undo()),
                        ("Redo", Command::Redo, self.editor.can_redo()),
                        ("Duplicate", Command::Duplicate, true),
                        ("Delete", Command::Delete, true),
                    ] {
                        if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                            self.run_command(ctx, command);
                            ui.close();
                        }
                    }
                    let selected = self.editor.selection().shape_id().map(str::to_string);
                    ui.add_enabled_ui(selected.is_some(), |ui| {
                        ui.menu_button("Color", |ui| {
                            for hex in COLOR_PALETTE {
                                let swatch = egui::RichText::new("■").color(render::color32(hex));
                                if ui.button(swatch).on_hover_text(hex).clicked() {
                                    if let Some(id) = &selected {
                                        self.editor.set_color(id, hex);
                                    }
                                    ui.close();
                                }
                            }
                        });
                    });
                });
                ui.menu_button("View", |ui| {
                    for (label, command) in [
                        ("Zoom in", Command::ZoomIn),
                        ("Zoom out", Command::ZoomOut),
                        ("Reset zoom", Command::ZoomReset),
                        ("Fit to screen", Command::FitToView),
                    ] {
                        if ui.button(label).clicked() {
                            self.run_command(ctx, command);
                            ui.close();
                        }
                    }
                });
                if ui.button("Help").clicked() {
                    self.show_help = true;
                }
                ui.separator();
                for tool in Tool::ALL {
                    render::tool_button(ui, &mut self.editor, tool);
                }
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or("Ready"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.0}%", self.editor.viewport().zoom() * 100.0));
                    ui.separator();
                    let doc = self.editor.document();
                    ui.label(format!(
                        "Shapes: {}  Connections: {}",
                        doc.shapes.len(),
                        doc.connections.len()
                    ));
                    if self.unsaved.get() {
                        ui.separator();
                        ui.label("Unsaved");
                    }
                    if let Selection::Shape(id) = self.editor.selection() {
                        ui.separator();
                        ui.label(format!("Selected: {id}"));
                    }
                });
            });
        });
    }
}

impl eframe::App for DiagramApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for command in self.collect_shortcuts(ctx) {
            self.run_command(ctx, command);
        }

        self.top_bar(ctx);
        self.status_bar(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                let origin = rect.min;
                let canvas = Size::new(rect.width(), rect.height());
                if !self.loaded {
                    self.load_initial(canvas);
                }
                self.editor.set_canvas_size(canvas);
                self.handle_canvas_input(ctx, origin, &response);

                let uris: Vec<String> = self
                    .editor
                    .document()
                    .shapes
                    .iter()
                    .filter_map(|s| s.image_uri.clone())
                    .collect();
                for uri in uris {
                    self.texture(ctx, &uri);
                }

                let painter = ui.painter_at(rect);
                render::draw_background(&painter, rect, self.editor.viewport());
                render::draw_connections(&painter, origin, &self.editor);
                render::draw_shapes(&painter, origin, &self.editor, &self.textures);
                let pointer = ctx.input(|i| i.pointer.hover_pos());
                render::draw_overlays(&painter, origin, &self.editor, pointer);

                self.inline_text_editor(ctx, origin);
            });

        if let Some(command) = self.command_palette.ui(ctx, &self.editor) {
            self.run_command(ctx, command);
        }
        help::draw_help_window(ctx, &mut self.show_help);
    }
}
