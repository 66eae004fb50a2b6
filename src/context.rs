//! The narrow drawing surface the view hierarchy paints into.
//!
//! Containers never talk to a terminal directly; they go through
//! [`DrawContext`] so the same paint protocol drives the ratatui buffer
//! backend in `backend.rs` and the buffers the tests assert against.

use ratatui::style::Color;

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Aliased,
    AntiAliased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    Filled,
    Stroked,
    FilledAndStroked,
}

/// A list of rectangles filled with even-odd parity. Two nested rects
/// produce a ring, which is how the default focus outline is built.
#[derive(Debug, Clone, Default)]
pub struct FocusPath {
    rects: Vec<Rect>,
}

impl FocusPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rect(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn bounding_box(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::default(), |acc, r| acc.union(*r))
    }

    /// Even-odd containment test for a single unit cell.
    pub fn contains(&self, p: Point) -> bool {
        let hits = self.rects.iter().filter(|r| r.contains(p)).count();
        hits % 2 == 1
    }
}

/// Drawing operations the container core needs from a backend.
///
/// Coordinates handed to draw calls are local to the view currently
/// painting; the context applies its origin offset. Clip rects are
/// expressed in the same local space, so a clip read back after the
/// origin moved is translated accordingly.
pub trait DrawContext {
    fn origin(&self) -> Point;
    fn set_origin(&mut self, origin: Point);

    /// Current clip in local coordinates.
    fn clip_rect(&self) -> Rect;
    fn set_clip_rect(&mut self, rect: Rect);

    fn set_fill_color(&mut self, color: Color);
    fn set_frame_color(&mut self, color: Color);
    fn set_font_color(&mut self, color: Color);
    fn set_draw_mode(&mut self, mode: DrawMode);

    fn global_alpha(&self) -> f32;
    fn set_global_alpha(&mut self, alpha: f32);

    fn draw_rect(&mut self, rect: Rect, style: DrawStyle);
    fn draw_string(&mut self, text: &str, rect: Rect);
    fn draw_focus_path(&mut self, path: &FocusPath, color: Color);
}
