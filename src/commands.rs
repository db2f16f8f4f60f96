//! Named editor operations shared by the keyboard layer, the command palette
//! and the shortcut reference.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::editor::Tool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Tool(Tool),
    Delete,
    Duplicate,
    EditSelected,
    SelectNext,
    SelectPrevious,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveUpLarge,
    MoveDownLarge,
    MoveLeftLarge,
    MoveRightLarge,
    FontIncrease,
    FontDecrease,
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    FitToView,
    Save,
    Import,
    ExportPng,
    ExportPdf,
    ExportJson,
    Cancel,
    ShowShortcuts,
}

impl Command {
    /// Commands that would fight with typing while a label is being edited.
    pub fn blocked_while_editing(self) -> bool {
        matches!(
            self,
            Command::Tool(_)
                | Command::Delete
                | Command::Duplicate
                | Command::EditSelected
                | Command::SelectNext
                | Command::SelectPrevious
                | Command::MoveUp
                | Command::MoveDown
                | Command::MoveLeft
                | Command::MoveRight
                | Command::MoveUpLarge
                | Command::MoveDownLarge
                | Command::MoveLeftLarge
                | Command::MoveRightLarge
                | Command::FontIncrease
                | Command::FontDecrease
                | Command::FitToView
                | Command::ShowShortcuts
        )
    }

    /// Commands that snapshot and change the document. These wait for the
    /// current drag, resize or pan to end.
    pub fn edits_document(self) -> bool {
        matches!(
            self,
            Command::Delete
                | Command::Duplicate
                | Command::EditSelected
                | Command::MoveUp
                | Command::MoveDown
                | Command::MoveLeft
                | Command::MoveRight
                | Command::MoveUpLarge
                | Command::MoveDownLarge
                | Command::MoveLeftLarge
                | Command::MoveRightLarge
                | Command::FontIncrease
                | Command::FontDecrease
        )
    }

    pub fn spec(self) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|c| c.command == self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Global,
    Tools,
    Editing,
    Selection,
    Movement,
    Styling,
    Canvas,
    File,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Global,
        Category::Tools,
        Category::Editing,
        Category::Selection,
        Category::Movement,
        Category::Styling,
        Category::Canvas,
        Category::File,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Global => "Global",
            Category::Tools => "Tools",
            Category::Editing => "Editing",
            Category::Selection => "Selection",
            Category::Movement => "Movement",
            Category::Styling => "Styling",
            Category::Canvas => "Canvas",
            Category::File => "File",
        }
    }
}

pub struct CommandSpec {
    pub command: Command,
    pub name: &'static str,
    pub search: &'static str,
    /// Display label only; key handling lives with the host.
    pub shortcut: &'static str,
    pub category: Category,
}

macro_rules! spec {
    ($command:expr, $category:ident, $name:literal, $search:literal, $shortcut:literal) => {
        CommandSpec {
            command: $command,
            name: $name,
            search: $search,
            shortcut: $shortcut,
            category: Category::$category,
        }
    };
}

#[rustfmt::skip]
pub const COMMANDS: &[CommandSpec] = &[
    spec!(Command::Undo, Global, "Edit: Undo", "undo", "Ctrl+Z"),
    spec!(Command::Redo, Global, "Edit: Redo", "redo", "Ctrl+Shift+Z"),
    spec!(Command::Save, Global, "File: Save", "save file json", "Ctrl+S"),
    spec!(Command::ShowShortcuts, Global, "Help: Keyboard shortcuts", "help keyboard shortcuts keys", "?"),
    spec!(Command::Cancel, Global, "Cancel", "cancel escape", "Esc"),
    spec!(Command::Tool(Tool::Select), Tools, "Tool: Select", "select tool v", "V"),
    spec!(Command::Tool(Tool::Rectangle), Tools, "Tool: Rectangle", "rectangle rect box tool r", "R"),
    spec!(Command::Tool(Tool::Circle), Tools, "Tool: Circle", "circle ellipse oval tool c", "C"),
    spec!(Command::Tool(Tool::Database), Tools, "Tool: Database", "database db cylinder storage tool d", "D"),
    spec!(Command::Tool(Tool::Text), Tools, "Tool: Text", "text label tool t", "T"),
    spec!(Command::Tool(Tool::Diamond), Tools, "Tool: Diamond", "diamond decision condition tool m", "M"),
    spec!(Command::Tool(Tool::Image), Tools, "Tool: Image", "image picture photo tool i", "I"),
    spec!(Command::Tool(Tool::Arrow), Tools, "Tool: Arrow", "arrow connector connection tool a", "A"),
    spec!(Command::Delete, Editing, "Edit: Delete", "delete remove", "Del"),
    spec!(Command::EditSelected, Editing, "Edit: Edit text", "edit text label rename", "Enter"),
    spec!(Command::Duplicate, Editing, "Edit: Duplicate", "duplicate clone copy", "Ctrl+D"),
    spec!(Command::SelectNext, Selection, "Select: Next shape", "select next shape", "Tab"),
    spec!(Command::SelectPrevious, Selection, "Select: Previous shape", "select previous shape", "Shift+Tab"),
    spec!(Command::MoveUp, Movement, "Move: Up", "move nudge up", "Up"),
    spec!(Command::MoveDown, Movement, "Move: Down", "move nudge down", "Down"),
    spec!(Command::MoveLeft, Movement, "Move: Left", "move nudge left", "Left"),
    spec!(Command::MoveRight, Movement, "Move: Right", "move nudge right", "Right"),
    spec!(Command::MoveUpLarge, Movement, "Move: Up (large)", "move nudge up large fast", "Shift+Up"),
    spec!(Command::MoveDownLarge, Movement, "Move: Down (large)", "move nudge down large fast", "Shift+Down"),
    spec!(Command::MoveLeftLarge, Movement, "Move: Left (large)", "move nudge left large fast", "Shift+Left"),
    spec!(Command::MoveRightLarge, Movement, "Move: Right (large)", "move nudge right large fast", "Shift+Right"),
    spec!(Command::FontDecrease, Styling, "Font: Decrease size", "font size smaller decrease", "["),
    spec!(Command::FontIncrease, Styling, "Font: Increase size", "font size larger increase", "]"),
    spec!(Command::ZoomReset, Canvas, "View: Reset zoom", "zoom reset 100", "Ctrl+0"),
    spec!(Command::ZoomIn, Canvas, "View: Zoom in", "zoom in magnify", "Ctrl+="),
    spec!(Command::ZoomOut, Canvas, "View: Zoom out", "zoom out", "Ctrl+-"),
    spec!(Command::FitToView, Canvas, "View: Fit to screen", "fit view screen frame all", "F"),
    spec!(Command::Import, File, "File: Import JSON", "import open load json", "Ctrl+O"),
    spec!(Command::ExportPdf, File, "File: Export PDF", "export pdf document", "Ctrl+E"),
    spec!(Command::ExportPng, File, "File: Export PNG", "export png image raster", "Ctrl+Shift+E"),
    spec!(Command::ExportJson, File, "File: Export JSON", "export json data", ""),
];

/// Fuzzy match over [`COMMANDS`], best score first. A blank query lists
/// everything in table order.
pub fn search(query: &str) -> Vec<&'static CommandSpec> {
    let q = query.trim();
    if q.is_empty() {
        return COMMANDS.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    let mut out: Vec<(&'static CommandSpec, i64)> = COMMANDS
        .iter()
        .filter_map(|c| matcher.fuzzy_match(c.search, q).map(|score| (c, score)))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
    out.into_iter().map(|(c, _)| c).collect()
}

pub fn by_category(category: Category) -> impl Iterator<Item = &'static CommandSpec> {
    COMMANDS.iter().filter(move |c| c.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_command_is_listed_once() {
        let mut seen = HashSet::new();
        for spec in COMMANDS {
            assert!(seen.insert(spec.command), "{} listed twice", spec.name);
        }
        for tool in Tool::ALL {
            assert!(Command::Tool(tool).spec().is_some());
        }
    }

    #[test]
    fn search_ranks_relevant_commands_first() {
        let hits = search("undo");
        assert_eq!(hits[0].command, Command::Undo);
        let hits = search("diamond");
        assert_eq!(hits[0].command, Command::Tool(Tool::Diamond));
        assert!(search("zzzzqqq").is_empty());
        assert_eq!(search("  ").len(), COMMANDS.len());
    }

    #[test]
    fn editing_blocks_tool_hotkeys_only() {
        assert!(Command::Tool(Tool::Rectangle).blocked_while_editing());
        assert!(Command::Delete.blocked_while_editing());
        assert!(!Command::Cancel.blocked_while_editing());
        assert!(!Command::Undo.blocked_while_editing());
    }

    #[test]
    fn document_edits_exclude_view_and_history() {
        assert!(Command::MoveRight.edits_document());
        assert!(Command::FontDecrease.edits_document());
        assert!(!Command::ZoomIn.edits_document());
        assert!(!Command::Undo.edits_document());
        assert!(!Command::Tool(Tool::Arrow).edits_document());
    }

    #[test]
    fn categories_cover_the_table() {
        let total: usize = Category::ALL.iter().map(|&c| by_category(c).count()).sum();
        assert_eq!(total, COMMANDS.len());
    }
}
