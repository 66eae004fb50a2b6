//! [`DrawContext`] implementation over a ratatui [`Buffer`].
//!
//! One view coordinate unit is one terminal cell. The origin offset
//! moves as containers descend into children; the clip is stored in
//! absolute buffer coordinates and translated on the trait boundary so
//! views only ever see their own local space. Alpha below 1.0 maps to
//! the DIM modifier since cells have no real transparency.

use ratatui::buffer::{Buffer, Cell};
use ratatui::style::{Color, Modifier, Style};

use crate::context::{DrawContext, DrawMode, DrawStyle, FocusPath};
use crate::geometry::{Point, Rect};

pub struct BufferContext<'a> {
    buf: &'a mut Buffer,
    origin: Point,
    /// Absolute buffer coordinates.
    clip: Rect,
    fill_color: Color,
    frame_color: Color,
    font_color: Color,
    draw_mode: DrawMode,
    global_alpha: f32,
}

impl<'a> BufferContext<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        let area = buf.area;
        let bounds = Rect::new(
            area.x as i32,
            area.y as i32,
            (area.x + area.width) as i32,
            (area.y + area.height) as i32,
        );
        Self {
            buf,
            origin: Point::default(),
            clip: bounds,
            fill_color: Color::Reset,
            frame_color: Color::Reset,
            font_color: Color::Reset,
            draw_mode: DrawMode::Aliased,
            global_alpha: 1.0,
        }
    }

    fn bounds(&self) -> Rect {
        let area = self.buf.area;
        Rect::new(
            area.x as i32,
            area.y as i32,
            (area.x + area.width) as i32,
            (area.y + area.height) as i32,
        )
    }

    fn put(&mut self, local: Point, write: impl FnOnce(&mut Cell)) {
        let p = local + self.origin;
        if !self.clip.contains(p) || p.x < 0 || p.y < 0 {
            return;
        }
        let dimmed = self.global_alpha < 1.0;
        if let Some(cell) = self.buf.cell_mut((p.x as u16, p.y as u16)) {
            write(cell);
            if dimmed {
                cell.set_style(Style::default().add_modifier(Modifier::DIM));
            }
        }
    }
}

impl DrawContext for BufferContext<'_> {
    fn origin(&self) -> Point {
        self.origin
    }

    fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    fn clip_rect(&self) -> Rect {
        self.clip.offset(-self.origin.x, -self.origin.y)
    }

    fn set_clip_rect(&mut self, rect: Rect) {
        self.clip = rect.offset_point(self.origin).bound(self.bounds());
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    fn set_frame_color(&mut self, color: Color) {
        self.frame_color = color;
    }

    fn set_font_color(&mut self, color: Color) {
        self.font_color = color;
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }

    fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = alpha.clamp(0.0, 1.0);
    }

    fn draw_rect(&mut self, rect: Rect, style: DrawStyle) {
        if rect.is_empty() {
            return;
        }
        let fill = self.fill_color;
        let frame = self.frame_color;
        if matches!(style, DrawStyle::Filled | DrawStyle::FilledAndStroked) {
            for y in rect.top..rect.bottom {
                for x in rect.left..rect.right {
                    self.put(Point::new(x, y), |cell| {
                        cell.set_char(' ');
                        cell.set_bg(fill);
                    });
                }
            }
        }
        if matches!(style, DrawStyle::Stroked | DrawStyle::FilledAndStroked) {
            for x in rect.left..rect.right {
                self.put(Point::new(x, rect.top), |cell| {
                    cell.set_bg(frame);
                });
                self.put(Point::new(x, rect.bottom - 1), |cell| {
                    cell.set_bg(frame);
                });
            }
            for y in rect.top..rect.bottom {
                self.put(Point::new(rect.left, y), |cell| {
                    cell.set_bg(frame);
                });
                self.put(Point::new(rect.right - 1, y), |cell| {
                    cell.set_bg(frame);
                });
            }
        }
    }

    /// Writes `text` starting at the rect origin, truncated at the rect's
    /// right edge and the clip.
    fn draw_string(&mut self, text: &str, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let color = self.font_color;
        let mut x = rect.left;
        for ch in text.chars() {
            if x >= rect.right {
                break;
            }
            self.put(Point::new(x, rect.top), |cell| {
                cell.set_char(ch);
                cell.set_fg(color);
            });
            x += 1;
        }
    }

    /// Paints every cell on the even-odd interior of `path`.
    fn draw_focus_path(&mut self, path: &FocusPath, color: Color) {
        let bounds = path.bounding_box();
        for y in bounds.top..bounds.bottom {
            for x in bounds.left..bounds.right {
                let p = Point::new(x, y);
                if path.contains(p) {
                    self.put(p, |cell| {
                        cell.set_bg(color);
                    });
                }
            }
        }
    }
}
