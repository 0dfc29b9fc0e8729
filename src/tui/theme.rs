// Colors used across the TUI

use ratatui::style::Color;
use ratatui::widgets::BorderType;

#[derive(Debug, Clone)]
pub struct Theme {
    pub foreground: Color,
    pub background: Color,
    pub muted: Color,
    pub border: Color,
    pub border_type: BorderType,
    /// Focus accents: modal borders, active title
    pub highlight: Color,
    /// Checkbox and count of selected rows
    pub selected: Color,
    /// Cursor row background
    pub cursor_bg: Color,
    pub error: Color,
    pub warning: Color,
    pub status_bar: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Color::Rgb(220, 223, 228),
            background: Color::Rgb(40, 44, 52),
            muted: Color::Rgb(127, 132, 142),
            border: Color::Rgb(92, 99, 112),
            border_type: BorderType::Rounded,
            highlight: Color::Rgb(97, 175, 239),
            selected: Color::Rgb(152, 195, 121),
            cursor_bg: Color::Rgb(62, 68, 81),
            error: Color::Rgb(224, 108, 117),
            warning: Color::Rgb(229, 192, 123),
            status_bar: Color::Rgb(171, 178, 191),
        }
    }
}
