//! The `View` trait and the shared handle type the hierarchy is built
//! from.
//!
//! Views are held as `Rc<RefCell<dyn View>>`: the owning container keeps
//! one strong reference, callers may keep their own, and dispatch loops
//! clone the handle before invoking callbacks so a view stays alive even
//! if it is unlinked mid-traversal.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use crossterm::event::{KeyModifiers, MouseButton};

use crate::container::Container;
use crate::context::{DrawContext, FocusPath};
use crate::geometry::{Point, Rect};
use crate::theme::Theme;
use crate::window::WindowCore;

pub type SharedView = Rc<RefCell<dyn View>>;
pub type WeakView = Weak<RefCell<dyn View>>;

/// Wraps a concrete view into the shared handle the hierarchy uses.
pub fn share<V: View + 'static>(view: V) -> SharedView {
    Rc::new(RefCell::new(view))
}

bitflags! {
    /// How a child reacts when its parent container is resized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Autosizing: u8 {
        const LEFT = 1 << 0;
        const TOP = 1 << 1;
        const RIGHT = 1 << 2;
        const BOTTOM = 1 << 3;
        /// Distribute width changes evenly across all children.
        const COLUMN = 1 << 4;
        /// Distribute height changes evenly across all children.
        const ROW = 1 << 5;
        const ALL = Self::LEFT.bits()
            | Self::TOP.bits()
            | Self::RIGHT.bits()
            | Self::BOTTOM.bits();
    }
}

/// Where invalidation requests bubble to.
#[derive(Clone, Default)]
pub enum ParentLink {
    #[default]
    None,
    View(WeakView),
    Window(Weak<RefCell<WindowCore>>),
}

impl std::fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentLink::None => write!(f, "None"),
            ParentLink::View(_) => write!(f, "View"),
            ParentLink::Window(_) => write!(f, "Window"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseResult {
    Handled,
    NotHandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAxis {
    X,
    Y,
}

/// Button and modifier state delivered with every mouse callback.
#[derive(Debug, Clone, Copy)]
pub struct MouseEvent {
    pub button: Option<MouseButton>,
    pub modifiers: KeyModifiers,
}

impl MouseEvent {
    pub fn left() -> Self {
        Self {
            button: Some(MouseButton::Left),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn right() -> Self {
        Self {
            button: Some(MouseButton::Right),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn none() -> Self {
        Self {
            button: None,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// True when any modifier key relevant to modifier-click dispatch is
    /// held.
    pub fn has_modifier_key(&self) -> bool {
        self.modifiers.intersects(
            KeyModifiers::ALT | KeyModifiers::SHIFT | KeyModifiers::CONTROL | KeyModifiers::SUPER,
        )
    }
}

/// Payload carried through a drag-and-drop gesture.
#[derive(Debug, Clone, Default)]
pub struct DragPayload {
    pub strings: Vec<String>,
}

/// State every view carries. Concrete views embed one and hand it out
/// through [`View::core`] / [`View::core_mut`], which gives them all the
/// defaulted accessors below.
#[derive(Debug)]
pub struct ViewCore {
    pub(crate) frame: Rect,
    pub(crate) mouse_area: Rect,
    pub(crate) visible: bool,
    pub(crate) mouse_enabled: bool,
    pub(crate) transparent: bool,
    pub(crate) dirty: bool,
    pub(crate) wants_focus: bool,
    pub(crate) alpha: f32,
    pub(crate) autosizing: Autosizing,
    pub(crate) parent: ParentLink,
    pub(crate) window: Weak<RefCell<WindowCore>>,
    pub(crate) attached: bool,
}

impl ViewCore {
    pub fn new(frame: Rect) -> Self {
        Self {
            frame,
            mouse_area: frame,
            visible: true,
            mouse_enabled: true,
            transparent: false,
            dirty: false,
            wants_focus: false,
            alpha: 1.0,
            autosizing: Autosizing::empty(),
            parent: ParentLink::None,
            window: Weak::new(),
            attached: false,
        }
    }

    /// Copy of the value state only; links and the attached flag reset.
    /// Used by `make_copy` implementations.
    pub fn duplicate(&self) -> Self {
        Self {
            frame: self.frame,
            mouse_area: self.mouse_area,
            visible: self.visible,
            mouse_enabled: self.mouse_enabled,
            transparent: self.transparent,
            dirty: false,
            wants_focus: self.wants_focus,
            alpha: self.alpha,
            autosizing: self.autosizing,
            parent: ParentLink::None,
            window: Weak::new(),
            attached: false,
        }
    }
}

/// Sends an already parent-local rect to whatever the view is linked to.
pub(crate) fn bubble_invalid_rect(core: &ViewCore, rect: Rect) {
    match &core.parent {
        ParentLink::View(weak) => {
            if let Some(parent) = weak.upgrade() {
                parent.borrow_mut().invalidate_rect(rect);
            }
        }
        ParentLink::Window(weak) => {
            if let Some(window) = weak.upgrade() {
                window.borrow_mut().invalidate_rect(rect);
            }
        }
        ParentLink::None => {}
    }
}

/// Listener attached to a control view.
pub trait ControlListener {
    fn value_changed(&mut self, tag: i32, value: f32);

    /// Offered before regular dispatch when a modifier key is held.
    /// Returning true consumes the click.
    fn control_modifier_clicked(&mut self, _tag: i32, _event: &MouseEvent) -> bool {
        false
    }
}

pub type SharedControlListener = Rc<RefCell<dyn ControlListener>>;

/// Optional capability for value-carrying interactive views.
pub trait Control {
    fn tag(&self) -> i32;
    fn value(&self) -> f32;
    fn set_value(&mut self, value: f32);
    fn listener(&self) -> Option<SharedControlListener>;
}

#[allow(unused_variables)]
pub trait View {
    fn core(&self) -> &ViewCore;
    fn core_mut(&mut self) -> &mut ViewCore;

    /// Paint into `ctx`. `update_rect` is in the parent's coordinate
    /// space, the same space as [`View::frame`].
    fn draw(&mut self, ctx: &mut dyn DrawContext, update_rect: Rect, theme: &Theme);

    // --- geometry ---------------------------------------------------

    fn frame(&self) -> Rect {
        self.core().frame
    }

    /// Moves/resizes the view, invalidating both the old and the new
    /// position.
    fn set_frame(&mut self, frame: Rect) {
        if frame == self.core().frame {
            return;
        }
        let old = self.core().frame;
        self.core_mut().frame = frame;
        self.core_mut().dirty = true;
        if self.core().attached && self.core().visible {
            bubble_invalid_rect(self.core(), old);
            bubble_invalid_rect(self.core(), frame);
        }
    }

    fn mouse_area(&self) -> Rect {
        self.core().mouse_area
    }

    fn set_mouse_area(&mut self, area: Rect) {
        self.core_mut().mouse_area = area;
    }

    /// Maps a point from this view's local space into window space by
    /// accumulating ancestor origins. Exact inverse of
    /// [`View::window_to_local`].
    fn local_to_window(&self, point: Point) -> Point {
        let point = point + self.core().frame.origin();
        match &self.core().parent {
            ParentLink::View(weak) => match weak.upgrade() {
                Some(parent) => parent.borrow().local_to_window(point),
                None => point,
            },
            _ => point,
        }
    }

    fn window_to_local(&self, point: Point) -> Point {
        let point = point - self.core().frame.origin();
        match &self.core().parent {
            ParentLink::View(weak) => match weak.upgrade() {
                Some(parent) => parent.borrow().window_to_local(point),
                None => point,
            },
            _ => point,
        }
    }

    // --- flags ------------------------------------------------------

    fn is_visible(&self) -> bool {
        self.core().visible
    }

    fn set_visible(&mut self, visible: bool) {
        if visible != self.core().visible {
            self.core_mut().visible = visible;
            self.core_mut().dirty = true;
        }
    }

    fn mouse_enabled(&self) -> bool {
        self.core().mouse_enabled
    }

    fn set_mouse_enabled(&mut self, enabled: bool) {
        self.core_mut().mouse_enabled = enabled;
    }

    fn transparent(&self) -> bool {
        self.core().transparent
    }

    fn set_transparent(&mut self, transparent: bool) {
        self.core_mut().transparent = transparent;
        self.core_mut().dirty = true;
    }

    fn wants_focus(&self) -> bool {
        self.core().wants_focus
    }

    fn set_wants_focus(&mut self, wants: bool) {
        self.core_mut().wants_focus = wants;
    }

    fn alpha(&self) -> f32 {
        self.core().alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if (alpha - self.core().alpha).abs() > f32::EPSILON {
            self.core_mut().alpha = alpha;
            self.invalidate();
        }
    }

    fn autosizing(&self) -> Autosizing {
        self.core().autosizing
    }

    fn set_autosizing(&mut self, flags: Autosizing) {
        self.core_mut().autosizing = flags;
    }

    fn is_attached(&self) -> bool {
        self.core().attached
    }

    // --- dirty state ------------------------------------------------

    fn is_dirty(&self) -> bool {
        self.core().dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.core_mut().dirty = dirty;
    }

    /// Marks the whole frame dirty and bubbles a repaint request toward
    /// the window root.
    fn invalidate(&mut self) {
        self.core_mut().dirty = true;
        if !self.core().visible || !self.core().attached {
            return;
        }
        let frame = self.core().frame;
        bubble_invalid_rect(self.core(), frame);
    }

    /// For a plain view `rect` is already in the parent's space (the
    /// same space the frame lives in) and bubbles unchanged. Containers
    /// override this to translate and clip.
    fn invalidate_rect(&mut self, rect: Rect) {
        self.core_mut().dirty = true;
        if !self.core().visible || !self.core().attached {
            return;
        }
        bubble_invalid_rect(self.core(), rect);
    }

    // --- hit testing and input ---------------------------------------

    /// Point containment against the mouse-sensitive area. `point` is in
    /// the parent's coordinate space.
    fn hit_test(&self, point: Point, event: &MouseEvent) -> bool {
        self.core().mouse_area.contains(point)
    }

    fn on_mouse_down(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        MouseResult::NotHandled
    }

    fn on_mouse_up(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        MouseResult::NotHandled
    }

    fn on_mouse_moved(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        MouseResult::NotHandled
    }

    fn on_wheel(&mut self, point: Point, axis: WheelAxis, distance: f32, event: &MouseEvent) -> bool {
        false
    }

    fn on_drag_enter(&mut self, drag: &DragPayload, point: Point) {}

    fn on_drag_move(&mut self, drag: &DragPayload, point: Point) {}

    fn on_drag_leave(&mut self, drag: &DragPayload, point: Point) {}

    fn on_drop(&mut self, drag: &DragPayload, point: Point) -> bool {
        false
    }

    // --- lifecycle ----------------------------------------------------

    /// Called by the new parent. `own` is this view's shared handle, so
    /// containers can hand children a weak link back to themselves.
    /// Fails when already attached.
    fn attached(
        &mut self,
        parent: ParentLink,
        window: Weak<RefCell<WindowCore>>,
        own: &SharedView,
    ) -> bool {
        if self.core().attached {
            return false;
        }
        let core = self.core_mut();
        core.parent = parent;
        core.window = window;
        core.attached = true;
        true
    }

    /// Called by the parent on removal. Fails when not attached.
    fn detached(&mut self) -> bool {
        if !self.core().attached {
            return false;
        }
        let core = self.core_mut();
        core.parent = ParentLink::None;
        core.window = Weak::new();
        core.attached = false;
        true
    }

    /// Notification that an ancestor changed size, delivered even when
    /// this view's own geometry did not change.
    fn parent_size_changed(&mut self) {}

    /// The view became the window's focus view.
    fn took_focus(&mut self) {}

    /// The view stopped being the window's focus view.
    fn lost_focus(&mut self) {}

    // --- optional capabilities ----------------------------------------

    fn as_container(&self) -> Option<&Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut Container> {
        None
    }

    fn as_control(&self) -> Option<&dyn Control> {
        None
    }

    fn as_control_mut(&mut self) -> Option<&mut dyn Control> {
        None
    }

    /// Polymorphic deep copy. Views without the capability are skipped
    /// when their container is copied.
    fn make_copy(&self) -> Option<SharedView> {
        None
    }

    /// Custom focus outline. `None` selects the default double-rect
    /// ring.
    fn focus_path(&self, theme: &Theme) -> Option<FocusPath> {
        None
    }

    /// When false, the focus ring is drawn underneath this view instead
    /// of on top of all children.
    fn draws_focus_on_top(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        core: ViewCore,
    }

    impl View for Plain {
        fn core(&self) -> &ViewCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ViewCore {
            &mut self.core
        }

        fn draw(&mut self, _ctx: &mut dyn DrawContext, _update: Rect, _theme: &Theme) {}
    }

    fn plain(frame: Rect) -> Plain {
        Plain {
            core: ViewCore::new(frame),
        }
    }

    #[test]
    fn hit_test_uses_mouse_area_not_frame() {
        let mut v = plain(Rect::new(0, 0, 10, 10));
        v.set_mouse_area(Rect::new(0, 0, 5, 5));
        assert!(v.hit_test(Point::new(4, 4), &MouseEvent::left()));
        assert!(!v.hit_test(Point::new(7, 7), &MouseEvent::left()));
    }

    #[test]
    fn set_frame_marks_dirty() {
        let mut v = plain(Rect::new(0, 0, 10, 10));
        assert!(!v.is_dirty());
        v.set_frame(Rect::new(5, 5, 15, 15));
        assert!(v.is_dirty());
        assert_eq!(v.frame(), Rect::new(5, 5, 15, 15));
    }

    #[test]
    fn attach_twice_fails() {
        let v = share(plain(Rect::new(0, 0, 4, 4)));
        let ok = v
            .borrow_mut()
            .attached(ParentLink::None, Weak::new(), &v.clone());
        assert!(ok);
        let again = v
            .borrow_mut()
            .attached(ParentLink::None, Weak::new(), &v.clone());
        assert!(!again);
        assert!(v.borrow_mut().detached());
        assert!(!v.borrow_mut().detached());
    }

    #[test]
    fn modifier_key_detection() {
        let e = MouseEvent::left().with_modifiers(KeyModifiers::SHIFT);
        assert!(e.has_modifier_key());
        assert!(!MouseEvent::left().has_modifier_key());
    }
}
