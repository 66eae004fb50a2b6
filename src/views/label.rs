//! Static single-line text view. Transparent by default so the parent
//! background shows through around the glyphs.

use ratatui::style::Color;

use crate::context::{DrawContext, DrawStyle};
use crate::geometry::Rect;
use crate::theme::Theme;
use crate::view::{SharedView, View, ViewCore, share};

pub struct Label {
    core: ViewCore,
    text: String,
    /// `None` uses the theme text color.
    color: Option<Color>,
}

impl Label {
    pub fn new(frame: Rect, text: impl Into<String>) -> Self {
        let mut core = ViewCore::new(frame);
        core.transparent = true;
        Self {
            core,
            text: text.into(),
            color: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.core.dirty = true;
        }
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
        self.core.dirty = true;
    }
}

impl View for Label {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext, _update_rect: Rect, theme: &Theme) {
        let frame = self.core.frame;
        if !self.core.transparent {
            ctx.set_fill_color(theme.background);
            ctx.draw_rect(frame, DrawStyle::Filled);
        }
        ctx.set_font_color(self.color.unwrap_or(theme.text));
        ctx.draw_string(&self.text, frame);
        self.core.dirty = false;
    }

    fn make_copy(&self) -> Option<SharedView> {
        Some(share(Label {
            core: self.core.duplicate(),
            text: self.text.clone(),
            color: self.color,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BufferContext;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect as BufRect;

    #[test]
    fn draws_text_and_clears_dirty() {
        let mut buf = Buffer::empty(BufRect::new(0, 0, 12, 2));
        let mut ctx = BufferContext::new(&mut buf);
        let mut label = Label::new(Rect::new(1, 0, 11, 1), "score");
        label.set_text("mines: 3");
        assert!(label.is_dirty());
        label.draw(&mut ctx, Rect::new(0, 0, 12, 2), &Theme::default());
        assert!(!label.is_dirty());
        assert_eq!(buf.cell((1u16, 0u16)).unwrap().symbol(), "m");
        assert_eq!(buf.cell((8u16, 0u16)).unwrap().symbol(), "3");
    }
}
