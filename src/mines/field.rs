//! Grid view over the game [`Model`]. Each board cell is two terminal
//! cells wide to keep the field roughly square on screen.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::MouseButton;
use ratatui::style::Color;

use crate::context::{DrawContext, DrawStyle};
use crate::geometry::{Point, Rect};
use crate::mines::model::Model;
use crate::theme::Theme;
use crate::view::{MouseEvent, MouseResult, View, ViewCore};

pub const CELL_WIDTH: i32 = 2;

const CLOSED: char = '▒';
const FLAG: char = '⚑';
const QUESTION: char = '?';
const MINE: char = '*';
const TRAP: char = '✸';

fn digit_color(n: u8) -> Color {
    match n {
        1 => Color::Blue,
        2 => Color::Green,
        3 => Color::Red,
        4 => Color::Magenta,
        5 => Color::Cyan,
        _ => Color::White,
    }
}

pub struct FieldView {
    core: ViewCore,
    model: Rc<RefCell<Model>>,
}

impl FieldView {
    pub fn new(origin: Point, model: Rc<RefCell<Model>>) -> Self {
        let frame = {
            let m = model.borrow();
            Rect::with_size(
                origin.x,
                origin.y,
                m.cols() as i32 * CELL_WIDTH,
                m.rows() as i32,
            )
        };
        Self {
            core: ViewCore::new(frame),
            model,
        }
    }

    pub fn model(&self) -> Rc<RefCell<Model>> {
        self.model.clone()
    }

    /// Maps a point in the parent's space to a board cell.
    fn cell_at(&self, point: Point) -> Option<(u32, u32)> {
        if !self.core.frame.contains(point) {
            return None;
        }
        let local = point - self.core.frame.origin();
        Some((local.y as u32, (local.x / CELL_WIDTH) as u32))
    }

    fn glyph(&self, model: &Model, row: u32, col: u32) -> (char, Color) {
        let game_over = model.is_trapped();
        if model.is_open(row, col) {
            if model.is_trap_mine(row, col) {
                return (TRAP, Color::Red);
            }
            if model.is_mine(row, col) {
                return (MINE, Color::Red);
            }
            return match model.mines_nearby(row, col) {
                0 => (' ', Color::Reset),
                n => ((b'0' + n) as char, digit_color(n)),
            };
        }
        if game_over && model.is_mine(row, col) {
            return (MINE, Color::Red);
        }
        if model.is_flag(row, col) {
            return (FLAG, Color::Yellow);
        }
        if model.is_question(row, col) {
            return (QUESTION, Color::Cyan);
        }
        (CLOSED, Color::DarkGray)
    }
}

impl View for FieldView {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext, _update_rect: Rect, theme: &Theme) {
        let frame = self.core.frame;
        ctx.set_fill_color(theme.background);
        ctx.draw_rect(frame, DrawStyle::Filled);
        let model = self.model.borrow();
        for row in 0..model.rows() {
            for col in 0..model.cols() {
                let (glyph, color) = self.glyph(&model, row, col);
                let x = frame.left + col as i32 * CELL_WIDTH;
                let y = frame.top + row as i32;
                ctx.set_font_color(color);
                ctx.draw_string(&glyph.to_string(), Rect::new(x, y, x + 1, y + 1));
            }
        }
        self.core.dirty = false;
    }

    fn on_mouse_down(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        let Some((row, col)) = self.cell_at(point) else {
            return MouseResult::NotHandled;
        };
        {
            let mut model = self.model.borrow_mut();
            if model.is_trapped() || model.is_done() {
                return MouseResult::Handled;
            }
            match event.button {
                Some(MouseButton::Left) => model.open(row, col),
                Some(MouseButton::Right) => model.mark(row, col),
                _ => return MouseResult::NotHandled,
            }
        }
        self.core.dirty = true;
        MouseResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mines::model::SplitMix64;

    fn field() -> FieldView {
        let model = Model::new(4, 6, 3, &mut SplitMix64::new(21)).unwrap();
        FieldView::new(Point::new(3, 2), Rc::new(RefCell::new(model)))
    }

    #[test]
    fn frame_spans_the_board() {
        let f = field();
        assert_eq!(f.frame(), Rect::new(3, 2, 3 + 6 * CELL_WIDTH, 6));
    }

    #[test]
    fn cell_lookup_accounts_for_cell_width() {
        let f = field();
        assert_eq!(f.cell_at(Point::new(3, 2)), Some((0, 0)));
        assert_eq!(f.cell_at(Point::new(4, 2)), Some((0, 0)));
        assert_eq!(f.cell_at(Point::new(5, 3)), Some((1, 1)));
        assert_eq!(f.cell_at(Point::new(2, 2)), None);
    }

    #[test]
    fn right_click_flags_a_cell() {
        let mut f = field();
        let handled = f.on_mouse_down(Point::new(3, 2), &MouseEvent::right());
        assert_eq!(handled, MouseResult::Handled);
        assert!(f.model().borrow().is_flag(0, 0));
        assert!(f.is_dirty());
    }

    #[test]
    fn input_ignored_after_game_over() {
        let f = field();
        let model = f.model();
        let (rows, cols) = {
            let m = model.borrow();
            (m.rows(), m.cols())
        };
        let mine = (0..rows * cols)
            .map(|i| (i / cols, i % cols))
            .find(|&(r, c)| model.borrow().is_mine(r, c))
            .unwrap();
        model.borrow_mut().open(mine.0, mine.1);
        assert!(model.borrow().is_trapped());
        let mut f = f;
        f.on_mouse_down(Point::new(3, 2), &MouseEvent::right());
        assert!(!model.borrow().is_flag(0, 0));
    }
}
