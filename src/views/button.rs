//! Momentary push button with a control tag and listener.
//!
//! The value pulses to 1.0 and back to 0.0 on a completed click, with
//! the listener notified of both edges. Dragging off the button while
//! the mouse is down cancels the press.

use crate::context::{DrawContext, DrawStyle};
use crate::geometry::{Point, Rect};
use crate::theme::Theme;
use crate::view::{
    Control, MouseEvent, MouseResult, SharedControlListener, SharedView, View, ViewCore, share,
};

pub struct TextButton {
    core: ViewCore,
    title: String,
    tag: i32,
    value: f32,
    pressed: bool,
    listener: Option<SharedControlListener>,
}

impl TextButton {
    pub fn new(frame: Rect, title: impl Into<String>, tag: i32) -> Self {
        let mut core = ViewCore::new(frame);
        core.wants_focus = true;
        Self {
            core,
            title: title.into(),
            tag,
            value: 0.0,
            pressed: false,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Option<SharedControlListener>) {
        self.listener = listener;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.core.dirty = true;
    }

    fn notify(&self, value: f32) {
        if let Some(listener) = &self.listener {
            listener.borrow_mut().value_changed(self.tag, value);
        }
    }

    fn set_pressed(&mut self, pressed: bool) {
        if pressed != self.pressed {
            self.pressed = pressed;
            self.core.dirty = true;
        }
    }
}

impl Control for TextButton {
    fn tag(&self) -> i32 {
        self.tag
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    fn listener(&self) -> Option<SharedControlListener> {
        self.listener.clone()
    }
}

impl View for TextButton {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn as_control(&self) -> Option<&dyn Control> {
        Some(self)
    }

    fn as_control_mut(&mut self) -> Option<&mut dyn Control> {
        Some(self)
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext, _update_rect: Rect, theme: &Theme) {
        let frame = self.core.frame;
        let back = if self.pressed {
            theme.control_frame
        } else {
            theme.control_back
        };
        ctx.set_fill_color(back);
        ctx.set_frame_color(theme.control_frame);
        ctx.draw_rect(frame, DrawStyle::Filled);
        let width = frame.width();
        let len = self.title.chars().count() as i32;
        let x = frame.left + ((width - len).max(0)) / 2;
        ctx.set_font_color(theme.text);
        ctx.draw_string(&self.title, Rect::new(x, frame.top, frame.right, frame.top + 1));
        self.core.dirty = false;
    }

    fn on_mouse_down(&mut self, _point: Point, _event: &MouseEvent) -> MouseResult {
        self.set_pressed(true);
        MouseResult::Handled
    }

    fn on_mouse_moved(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        self.set_pressed(self.hit_test(point, event));
        MouseResult::Handled
    }

    fn on_mouse_up(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        if self.pressed && self.hit_test(point, event) {
            self.value = 1.0;
            self.notify(1.0);
            self.value = 0.0;
            self.notify(0.0);
        }
        self.set_pressed(false);
        MouseResult::Handled
    }

    fn took_focus(&mut self) {
        self.core.dirty = true;
    }

    fn lost_focus(&mut self) {
        self.core.dirty = true;
    }

    fn make_copy(&self) -> Option<SharedView> {
        Some(share(TextButton {
            core: self.core.duplicate(),
            title: self.title.clone(),
            tag: self.tag,
            value: self.value,
            pressed: false,
            listener: self.listener.clone(),
        }))
    }
}
