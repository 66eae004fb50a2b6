//! Centralized style values, passed explicitly into every paint call so
//! views never read ambient global state.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Color used for the focus ring around the focused view.
    pub focus_color: Color,
    /// Thickness of the default focus ring in cells.
    pub focus_width: i32,
    /// Whether focus rings are drawn at all.
    pub focus_drawing: bool,
    /// Default window background.
    pub background: Color,
    /// Default text color.
    pub text: Color,
    /// Fill for interactive controls.
    pub control_back: Color,
    /// Frame for interactive controls.
    pub control_frame: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_color: Color::Yellow,
            focus_width: 1,
            focus_drawing: true,
            background: Color::Black,
            text: Color::White,
            control_back: Color::DarkGray,
            control_frame: Color::Gray,
        }
    }
}
