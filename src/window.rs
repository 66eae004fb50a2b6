//! The window root: owns the accumulated invalid region, the focus
//! view and the theme, and translates terminal events into hierarchy
//! dispatch.
//!
//! Event handlers never repaint directly; they mark views dirty and the
//! window converts dirty state into invalid rects after dispatch
//! returns. Focus changes requested mid-dispatch are queued on the
//! [`WindowCore`] and applied the same way, so no view is re-entered
//! while a dispatch borrow is still live.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};
use tracing::{debug, trace};

use crate::container::Container;
use crate::context::DrawContext;
use crate::geometry::{Point, Rect};
use crate::theme::Theme;
use crate::view::{
    DragPayload, MouseEvent, MouseResult, ParentLink, SharedView, View, WeakView, WheelAxis,
};

/// Shared window state views reach through their weak window link.
pub struct WindowCore {
    size: Rect,
    invalid: Vec<Rect>,
    focus: Option<WeakView>,
    pending_focus: Vec<Option<WeakView>>,
    theme: Theme,
}

impl WindowCore {
    fn new(size: Rect, theme: Theme) -> Self {
        Self {
            size,
            invalid: Vec::new(),
            focus: None,
            pending_focus: Vec::new(),
            theme,
        }
    }

    pub fn size(&self) -> Rect {
        self.size
    }

    /// Adds a window-space rect to the region repainted next frame.
    /// Rects already covered by an accumulated one are dropped.
    pub fn invalidate_rect(&mut self, rect: Rect) {
        let rect = rect.bound(self.size);
        if rect.is_empty() {
            return;
        }
        if self.invalid.iter().any(|r| covers(*r, rect)) {
            return;
        }
        self.invalid.retain(|r| !covers(rect, *r));
        self.invalid.push(rect);
    }

    pub fn focus_view(&self) -> Option<SharedView> {
        self.focus.as_ref().and_then(Weak::upgrade)
    }

    /// Queues a focus change. Views call this mid-dispatch; the window
    /// applies it once dispatch has unwound.
    pub fn set_focus_view(&mut self, view: Option<&SharedView>) {
        self.pending_focus.push(view.map(Rc::downgrade));
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

fn covers(outer: Rect, inner: Rect) -> bool {
    outer.left <= inner.left
        && outer.top <= inner.top
        && outer.right >= inner.right
        && outer.bottom >= inner.bottom
}

pub struct Window {
    core: Rc<RefCell<WindowCore>>,
    root: Rc<RefCell<Container>>,
}

impl Window {
    pub fn new(size: Rect, theme: Theme) -> Self {
        let core = Rc::new(RefCell::new(WindowCore::new(size, theme)));
        let root = Rc::new(RefCell::new(Container::new(size)));
        let root_view: SharedView = root.clone();
        root.borrow_mut().attached(
            ParentLink::Window(Rc::downgrade(&core)),
            Rc::downgrade(&core),
            &root_view,
        );
        core.borrow_mut().invalidate_rect(size);
        Self { core, root }
    }

    pub fn root(&self) -> Rc<RefCell<Container>> {
        self.root.clone()
    }

    pub fn core(&self) -> Rc<RefCell<WindowCore>> {
        self.core.clone()
    }

    pub fn size(&self) -> Rect {
        self.core.borrow().size
    }

    pub fn theme(&self) -> Theme {
        self.core.borrow().theme.clone()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.core.borrow_mut().theme = theme;
        self.invalidate_all();
    }

    pub fn focus_view(&self) -> Option<SharedView> {
        self.core.borrow().focus_view()
    }

    // --- invalid region ---------------------------------------------------

    pub fn invalidate_all(&self) {
        let size = self.size();
        self.core.borrow_mut().invalidate_rect(size);
    }

    /// Drains the accumulated repaint region.
    pub fn take_invalid_rects(&self) -> Vec<Rect> {
        std::mem::take(&mut self.core.borrow_mut().invalid)
    }

    /// Converts dirty descendants into invalid rects without waiting for
    /// an event.
    pub fn invalidate_dirty_views(&self) {
        self.root.borrow_mut().invalidate_dirty_views();
    }

    /// Repaints every accumulated invalid rect and clears the region.
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        self.invalidate_dirty_views();
        for rect in self.take_invalid_rects() {
            self.draw_rect(ctx, rect);
        }
    }

    /// Repaints a single window-space rect. The clip is narrowed to the
    /// update region for the duration of the paint.
    pub fn draw_rect(&self, ctx: &mut dyn DrawContext, update: Rect) {
        let theme = self.theme();
        trace!(?update, "window draw");
        let saved_clip = ctx.clip_rect();
        ctx.set_clip_rect(update.bound(saved_clip));
        self.root.borrow_mut().draw(ctx, update, &theme);
        ctx.set_clip_rect(saved_clip);
    }

    // --- window geometry ----------------------------------------------------

    pub fn resize(&self, size: Rect) {
        self.core.borrow_mut().size = size;
        self.root.borrow_mut().set_frame(size);
        self.invalidate_all();
    }

    // --- focus -----------------------------------------------------------

    /// Moves focus immediately: notifies the old and new view, erases
    /// the previously drawn ring and invalidates the ring area of the
    /// new focus.
    pub fn set_focus_view(&self, view: Option<&SharedView>) {
        let old = self.core.borrow().focus_view();
        let same = match (&old, view) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        self.core.borrow_mut().focus = view.map(Rc::downgrade);
        let focus_width = self.core.borrow().theme.focus_width;
        debug!(
            had_focus = old.is_some(),
            has_focus = view.is_some(),
            "focus changed"
        );
        if let Some(old) = old {
            old.borrow_mut().lost_focus();
            if let Some(parent) = parent_view(&old)
                && let Some(container) = parent.borrow_mut().as_container_mut()
            {
                container.focus_lost_child();
            }
        }
        if let Some(new) = view {
            new.borrow_mut().took_focus();
            if let Some(parent) = parent_view(new)
                && let Some(container) = parent.borrow_mut().as_container_mut()
            {
                container.focus_gained_child(new, focus_width);
            }
        }
    }

    /// Moves focus to the next (or previous) focus candidate after the
    /// current one, walking out of nested containers and wrapping around
    /// at the end. Returns false when the hierarchy has no candidate.
    pub fn advance_focus(&self, reverse: bool) -> bool {
        if let Some(focus) = self.focus_view() {
            let mut child = focus;
            loop {
                let Some(parent) = parent_view(&child) else {
                    break;
                };
                let next = parent
                    .borrow()
                    .as_container()
                    .and_then(|c| c.advance_focus(Some(&child), reverse));
                if let Some(next) = next {
                    self.set_focus_view(Some(&next));
                    return true;
                }
                child = parent;
            }
        }
        // wrap around to the first candidate
        let next = self.root.borrow().advance_focus(None, reverse);
        match next {
            Some(view) => {
                self.set_focus_view(Some(&view));
                true
            }
            None => false,
        }
    }

    /// Applies focus changes queued by views during dispatch.
    fn flush_pending_focus(&self) {
        loop {
            let next = {
                let mut core = self.core.borrow_mut();
                if core.pending_focus.is_empty() {
                    None
                } else {
                    Some(core.pending_focus.remove(0))
                }
            };
            let Some(request) = next else { break };
            let view = request.and_then(|w| w.upgrade());
            self.set_focus_view(view.as_ref());
        }
    }

    // --- event dispatch -----------------------------------------------------

    /// Feeds one terminal event into the hierarchy. Returns true when a
    /// view handled it.
    pub fn handle_event(&self, event: &Event) -> bool {
        let handled = match event {
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Tab => self.advance_focus(false),
                KeyCode::BackTab => self.advance_focus(true),
                _ => false,
            },
            Event::Resize(width, height) => {
                self.resize(Rect::new(0, 0, *width as i32, *height as i32));
                true
            }
            _ => false,
        };
        self.flush_pending_focus();
        self.invalidate_dirty_views();
        handled
    }

    fn handle_mouse(&self, mouse: &crossterm::event::MouseEvent) -> bool {
        let point = Point::new(mouse.column as i32, mouse.row as i32);
        let event = MouseEvent {
            button: None,
            modifiers: mouse.modifiers,
        };
        match mouse.kind {
            MouseEventKind::Down(button) => {
                let event = MouseEvent {
                    button: Some(button),
                    ..event
                };
                self.root.borrow_mut().on_mouse_down(point, &event) == MouseResult::Handled
            }
            MouseEventKind::Up(button) => {
                let event = MouseEvent {
                    button: Some(button),
                    ..event
                };
                self.root.borrow_mut().on_mouse_up(point, &event) == MouseResult::Handled
            }
            MouseEventKind::Drag(button) => {
                let event = MouseEvent {
                    button: Some(button),
                    ..event
                };
                self.root.borrow_mut().on_mouse_moved(point, &event) == MouseResult::Handled
            }
            MouseEventKind::Moved => {
                self.root.borrow_mut().on_mouse_moved(point, &event) == MouseResult::Handled
            }
            MouseEventKind::ScrollUp => {
                self.root
                    .borrow_mut()
                    .on_wheel(point, WheelAxis::Y, 1.0, &event)
            }
            MouseEventKind::ScrollDown => {
                self.root
                    .borrow_mut()
                    .on_wheel(point, WheelAxis::Y, -1.0, &event)
            }
            MouseEventKind::ScrollLeft => {
                self.root
                    .borrow_mut()
                    .on_wheel(point, WheelAxis::X, -1.0, &event)
            }
            MouseEventKind::ScrollRight => {
                self.root
                    .borrow_mut()
                    .on_wheel(point, WheelAxis::X, 1.0, &event)
            }
        }
    }

    // --- drag and drop ------------------------------------------------------

    pub fn drag_enter(&self, drag: &DragPayload, point: Point) {
        self.root.borrow_mut().on_drag_enter(drag, point);
        self.invalidate_dirty_views();
    }

    pub fn drag_move(&self, drag: &DragPayload, point: Point) {
        self.root.borrow_mut().on_drag_move(drag, point);
        self.invalidate_dirty_views();
    }

    pub fn drag_leave(&self, drag: &DragPayload, point: Point) {
        self.root.borrow_mut().on_drag_leave(drag, point);
        self.invalidate_dirty_views();
    }

    pub fn drop(&self, drag: &DragPayload, point: Point) -> bool {
        let result = self.root.borrow_mut().on_drop(drag, point);
        self.invalidate_dirty_views();
        result
    }
}

fn parent_view(view: &SharedView) -> Option<SharedView> {
    let link = view.borrow().core().parent.clone();
    match link {
        ParentLink::View(weak) => weak.upgrade(),
        _ => None,
    }
}
