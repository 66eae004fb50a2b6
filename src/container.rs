//! The container view: an ordered list of shared child handles with
//! z-order control, autosizing layout, dirty-region bubbling, recursive
//! painting and mouse/drag/focus dispatch.
//!
//! List position is z-order: index 0 paints first (bottom), the last
//! index paints on top and is hit-tested first. Dispatch loops clone the
//! child handle before invoking callbacks, so a child unlinked during
//! the callback stays alive until the step completes.
//!
//! Invariant for every `&mut self` method here: children are mutated
//! through their cores directly and invalidation is issued by this
//! container itself. A child must never bubble back up into a parent
//! that is currently executing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ratatui::style::Color;
use tracing::{debug, trace};

use crate::context::{DrawContext, DrawMode, DrawStyle, FocusPath};
use crate::geometry::{Point, Rect};
use crate::theme::Theme;
use crate::view::{
    Autosizing, DragPayload, MouseEvent, MouseResult, ParentLink, SharedView, View, ViewCore,
    WeakView, WheelAxis, bubble_invalid_rect, share,
};
use crate::window::WindowCore;

/// Tiled glyph background, the terminal stand-in for a background image.
#[derive(Debug, Clone)]
pub struct BackgroundPattern {
    pub glyphs: String,
    pub color: Color,
    pub offset: Point,
}

pub struct Container {
    core: ViewCore,
    children: Vec<SharedView>,
    background_color: Color,
    background_pattern: Option<BackgroundPattern>,
    /// Child owning the active mouse gesture. Non-owning; cleared when
    /// the child is removed.
    mouse_down_view: Option<WeakView>,
    /// Child under the active drag operation. Non-owning.
    drag_target_view: Option<WeakView>,
    /// Bounding box of the focus ring painted last frame, in local
    /// coordinates. Invalidated when focus moves away.
    last_drawn_focus: Rect,
    /// Weak handle to ourselves, captured at attach so children can be
    /// linked back.
    self_weak: WeakView,
}

impl Container {
    pub fn new(frame: Rect) -> Self {
        Self {
            core: ViewCore::new(frame),
            children: Vec::new(),
            background_color: Color::Black,
            background_pattern: None,
            mouse_down_view: None,
            drag_target_view: None,
            last_drawn_focus: Rect::default(),
            self_weak: Weak::<RefCell<Container>>::new(),
        }
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
        self.core.dirty = true;
    }

    pub fn set_background_pattern(&mut self, pattern: Option<BackgroundPattern>) {
        self.background_pattern = pattern;
        self.core.dirty = true;
    }

    // --- child list ----------------------------------------------------

    /// Appends `view` at the top of the z-order. Fails when the view is
    /// already attached or already a child here.
    pub fn add_view(&mut self, view: &SharedView) -> bool {
        let at = self.children.len();
        self.insert_view(at, view)
    }

    /// Inserts `view` just below `before` in the z-order; appends when
    /// `before` is not a child.
    pub fn add_view_before(&mut self, view: &SharedView, before: &SharedView) -> bool {
        let at = self
            .children
            .iter()
            .position(|c| Rc::ptr_eq(c, before))
            .unwrap_or(self.children.len());
        self.insert_view(at, view)
    }

    pub fn add_view_with_area(
        &mut self,
        view: &SharedView,
        mouse_area: Rect,
        mouse_enabled: bool,
    ) -> bool {
        if !self.add_view(view) {
            return false;
        }
        let mut v = view.borrow_mut();
        v.set_mouse_area(mouse_area);
        v.set_mouse_enabled(mouse_enabled);
        true
    }

    fn insert_view(&mut self, at: usize, view: &SharedView) -> bool {
        if view.borrow().is_attached() || self.children.iter().any(|c| Rc::ptr_eq(c, view)) {
            return false;
        }
        self.children.insert(at, view.clone());
        debug!(index = at, count = self.children.len(), "view added");
        if self.core.attached {
            let link = ParentLink::View(self.self_weak.clone());
            view.borrow_mut().attached(link, self.core.window.clone(), view);
            let frame = view.borrow().frame();
            self.invalidate_rect(frame);
        }
        true
    }

    /// Unlinks `view`. The container's ownership share ends with the
    /// removal; handles held by callers stay valid.
    pub fn remove_view(&mut self, view: &SharedView) -> bool {
        self.clear_capture_for(view);
        let Some(at) = self.children.iter().position(|c| Rc::ptr_eq(c, view)) else {
            return false;
        };
        let child = self.children.remove(at);
        debug!(index = at, count = self.children.len(), "view removed");
        let (frame, visible) = {
            let c = child.borrow();
            (c.frame(), c.is_visible())
        };
        if visible {
            self.invalidate_rect(frame);
        }
        if self.core.attached {
            child.borrow_mut().detached();
        }
        true
    }

    /// Unlinks every child, clearing captured mouse/drag state first.
    pub fn remove_all(&mut self) -> bool {
        self.mouse_down_view = None;
        self.drag_target_view = None;
        let attached = self.core.attached;
        for child in self.children.drain(..) {
            if attached {
                child.borrow_mut().detached();
            }
        }
        debug!("all views removed");
        true
    }

    fn clear_capture_for(&mut self, view: &SharedView) {
        if let Some(weak) = &self.mouse_down_view
            && weak.upgrade().is_some_and(|v| Rc::ptr_eq(&v, view))
        {
            self.mouse_down_view = None;
        }
        if let Some(weak) = &self.drag_target_view
            && weak.upgrade().is_some_and(|v| Rc::ptr_eq(&v, view))
        {
            self.drag_target_view = None;
        }
    }

    /// Moves `view` to `index` in the z-order (clamped to the end),
    /// keeping the relative order of all other children. Fails with
    /// fewer than two children or when `view` is not a child.
    pub fn change_z_order(&mut self, view: &SharedView, index: usize) -> bool {
        if self.children.len() < 2 {
            return false;
        }
        let Some(at) = self.children.iter().position(|c| Rc::ptr_eq(c, view)) else {
            return false;
        };
        let child = self.children.remove(at);
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        debug!(from = at, to = index, "z-order changed");
        true
    }

    pub fn num_views(&self) -> usize {
        self.children.len()
    }

    pub fn view_at(&self, index: usize) -> Option<SharedView> {
        self.children.get(index).cloned()
    }

    pub fn is_child(&self, view: &SharedView, deep: bool) -> bool {
        for child in &self.children {
            if Rc::ptr_eq(child, view) {
                return true;
            }
            if deep {
                let c = child.borrow();
                if let Some(container) = c.as_container()
                    && container.is_child(view, true)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Topmost visible child whose mouse area contains `point` (given in
    /// parent coordinates). With `deep`, recurses into child containers.
    pub fn get_view_at(&self, point: Point, deep: bool) -> Option<SharedView> {
        let local = point - self.core.frame.origin();
        for child in self.children.iter().rev() {
            let c = child.borrow();
            if c.is_visible() && c.mouse_area().contains(local) {
                if deep && let Some(container) = c.as_container() {
                    return container.get_view_at(local, deep);
                }
                return Some(child.clone());
            }
        }
        None
    }

    // --- geometry -------------------------------------------------------

    /// Clips a local rect against this container and every ancestor,
    /// returning the portion actually visible, still in local
    /// coordinates.
    pub fn visible_area(&self, rect: Rect) -> Rect {
        let origin = self.core.frame.origin();
        let mut result = rect.offset_point(origin).bound(self.core.frame);
        match &self.core.parent {
            ParentLink::View(weak) => {
                if let Some(parent) = weak.upgrade() {
                    let p = parent.borrow();
                    if let Some(container) = p.as_container() {
                        result = container.visible_area(result);
                    }
                }
            }
            ParentLink::Window(weak) => {
                if let Some(window) = weak.upgrade() {
                    result = result.bound(window.borrow().size().to_local());
                }
            }
            ParentLink::None => {}
        }
        result.offset(-origin.x, -origin.y)
    }

    /// Shrinks/grows the frame to exactly enclose all visible children.
    /// Refused under row/column autosizing, where the target size is
    /// ambiguous.
    pub fn size_to_fit(&mut self) -> bool {
        if self
            .core
            .autosizing
            .intersects(Autosizing::COLUMN | Autosizing::ROW)
        {
            return false;
        }
        let mut bounds = Rect::default();
        for child in &self.children {
            let c = child.borrow();
            if c.is_visible() {
                bounds = bounds.union(c.frame());
            }
        }
        let frame = self.core.frame;
        let new = Rect::new(
            frame.left,
            frame.top,
            frame.left + bounds.right,
            frame.top + bounds.bottom,
        );
        self.set_frame(new);
        self.core.mouse_area = new;
        true
    }

    fn autosize_children(&mut self, width_delta: i32, height_delta: i32) {
        let count = self.children.len() as i32;
        if count == 0 {
            return;
        }
        let as_column = self.core.autosizing.contains(Autosizing::COLUMN);
        let as_row = self.core.autosizing.contains(Autosizing::ROW);
        let col_share = width_delta / count;
        let row_share = height_delta / count;
        for (counter, child) in self.children.iter().enumerate() {
            let mut c = child.borrow_mut();
            let flags = c.autosizing();
            let mut frame = c.frame();
            let mut area = c.mouse_area();
            if as_column {
                let shift = counter as i32 * col_share;
                frame = frame.offset(shift, 0);
                area = area.offset(shift, 0);
                frame.right += col_share;
                area.right += col_share;
            } else if width_delta != 0 && flags.contains(Autosizing::RIGHT) {
                frame.right += width_delta;
                area.right += width_delta;
                if flags.contains(Autosizing::LEFT) {
                    frame.left += width_delta;
                    area.left += width_delta;
                }
            }
            if as_row {
                let shift = counter as i32 * row_share;
                frame = frame.offset(0, shift);
                area = area.offset(0, shift);
                frame.bottom += row_share;
                area.bottom += row_share;
            } else if height_delta != 0 && flags.contains(Autosizing::BOTTOM) {
                frame.bottom += height_delta;
                area.bottom += height_delta;
                if flags.contains(Autosizing::TOP) {
                    frame.top += height_delta;
                    area.top += height_delta;
                }
            }
            if frame != c.frame() {
                // mutate the core directly; this container issues the
                // repaint for the whole resize
                let old = c.frame();
                c.core_mut().frame = frame;
                c.core_mut().mouse_area = area;
                c.core_mut().dirty = true;
                // a resized child container lays out its own children
                if let Some(container) = c.as_container_mut() {
                    let wd = frame.width() - old.width();
                    let hd = frame.height() - old.height();
                    if wd != 0 || hd != 0 {
                        container.autosize_children(wd, hd);
                    }
                }
            }
        }
    }

    // --- dirty regions ---------------------------------------------------

    /// Appends the minimal set of parent-space rects that must repaint,
    /// short-circuiting to the whole frame when this container itself is
    /// dirty.
    pub(crate) fn dirty_rects(&self, out: &mut Vec<Rect>) {
        if !self.core.visible {
            return;
        }
        if self.core.dirty {
            out.push(self.core.frame);
            return;
        }
        let origin = self.core.frame.origin();
        for child in &self.children {
            let c = child.borrow();
            if !c.is_dirty() || !c.is_visible() {
                continue;
            }
            let mut nested = Vec::new();
            if let Some(container) = c.as_container() {
                container.dirty_rects(&mut nested);
            } else {
                nested.push(c.frame());
            }
            for rect in nested {
                let rect = rect.offset_point(origin).bound(self.core.frame);
                if !rect.is_empty() {
                    out.push(rect);
                }
            }
        }
    }

    /// Walks dirty descendants and bubbles the minimal set of repaint
    /// rects toward the root.
    pub fn invalidate_dirty_views(&mut self) -> bool {
        let mut rects = Vec::new();
        self.dirty_rects(&mut rects);
        for rect in rects {
            bubble_invalid_rect(&self.core, rect);
        }
        true
    }

    // --- painting ----------------------------------------------------------

    fn draw_background(&mut self, ctx: &mut dyn DrawContext, update: Rect) {
        let bounds = self.core.frame.to_local();
        if let Some(pattern) = &self.background_pattern {
            let glyphs: Vec<char> = pattern.glyphs.chars().collect();
            if glyphs.is_empty() {
                return;
            }
            let old_clip = ctx.clip_rect();
            ctx.set_clip_rect(update.bound(old_clip));
            ctx.set_font_color(pattern.color);
            for y in bounds.top..bounds.bottom {
                let mut row = String::with_capacity(bounds.width() as usize);
                for x in bounds.left..bounds.right {
                    let phase = (x - pattern.offset.x + y - pattern.offset.y)
                        .rem_euclid(glyphs.len() as i32);
                    row.push(glyphs[phase as usize]);
                }
                ctx.draw_string(&row, Rect::new(bounds.left, y, bounds.right, y + 1));
            }
            ctx.set_clip_rect(old_clip);
        } else if !self.core.transparent {
            ctx.set_draw_mode(DrawMode::Aliased);
            ctx.set_fill_color(self.background_color);
            ctx.set_frame_color(self.background_color);
            ctx.draw_rect(bounds, DrawStyle::FilledAndStroked);
        }
    }

    /// The focused view, provided it is a direct, visible child that
    /// wants focus and focus drawing is on.
    fn focused_child(&self, theme: &Theme) -> Option<SharedView> {
        if !theme.focus_drawing {
            return None;
        }
        let window = self.core.window.upgrade()?;
        let focus = window.borrow().focus_view()?;
        if !self.children.iter().any(|c| Rc::ptr_eq(c, &focus)) {
            return None;
        }
        let f = focus.borrow();
        if f.is_visible() && f.wants_focus() {
            drop(f);
            Some(focus)
        } else {
            None
        }
    }

    fn default_focus_path(&self, child: &SharedView, theme: &Theme) -> FocusPath {
        let mut path = FocusPath::new();
        let visible = child.borrow().frame().bound(self.core.frame.to_local());
        if !visible.is_empty() {
            path.add_rect(visible);
            path.add_rect(visible.inset(-theme.focus_width, -theme.focus_width));
        }
        path
    }

    // --- event dispatch -----------------------------------------------------

    /// True when any enabled, visible child accepts the hit. Containers
    /// do not test their children from [`View::hit_test`]; callers opt
    /// in through this method.
    pub fn hit_test_children(&self, point: Point, event: &MouseEvent) -> bool {
        let local = point - self.core.frame.origin();
        self.children.iter().rev().any(|child| {
            let c = child.borrow();
            c.is_visible() && c.mouse_enabled() && c.hit_test(local, event)
        })
    }

    /// First focus candidate after `from` (or from the start when
    /// `from` is `None`), recursing into child containers. Returns the
    /// candidate instead of focusing it; the window root applies the
    /// change.
    pub fn advance_focus(&self, from: Option<&SharedView>, reverse: bool) -> Option<SharedView> {
        let mut found_from = from.is_none();
        let forward = self.children.iter();
        let backward = self.children.iter().rev();
        let iter: Box<dyn Iterator<Item = &SharedView>> = if reverse {
            Box::new(backward)
        } else {
            Box::new(forward)
        };
        for child in iter {
            if !found_from {
                if let Some(f) = from
                    && Rc::ptr_eq(child, f)
                {
                    found_from = true;
                }
                continue;
            }
            let c = child.borrow();
            if c.wants_focus() && c.mouse_enabled() && c.is_visible() {
                return Some(child.clone());
            }
            if let Some(container) = c.as_container()
                && let Some(hit) = container.advance_focus(None, reverse)
            {
                return Some(hit);
            }
        }
        None
    }

    /// Erases the focus ring painted last frame. Called by the window
    /// root when focus moves away from a child of this container.
    pub(crate) fn focus_lost_child(&mut self) {
        if !self.last_drawn_focus.is_empty() {
            let rect = self.last_drawn_focus;
            self.invalidate_rect(rect);
        }
        self.last_drawn_focus = Rect::default();
    }

    /// Repaints the ring area around a child that just gained focus.
    pub(crate) fn focus_gained_child(&mut self, child: &SharedView, focus_width: i32) {
        let rect = child.borrow().frame().inset(-focus_width, -focus_width);
        self.invalidate_rect(rect);
    }

    #[cfg(test)]
    pub(crate) fn last_drawn_focus(&self) -> Rect {
        self.last_drawn_focus
    }
}

impl View for Container {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn as_container(&self) -> Option<&Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut Container> {
        Some(self)
    }

    /// Resizes the container and re-layouts children according to their
    /// autosizing flags, then notifies every descendant.
    fn set_frame(&mut self, frame: Rect) {
        if frame == self.core.frame {
            return;
        }
        let old = self.core.frame;
        self.core.frame = frame;
        self.core.dirty = true;
        if self.core.attached && self.core.visible {
            bubble_invalid_rect(&self.core, old);
            bubble_invalid_rect(&self.core, frame);
        }
        let width_delta = frame.width() - old.width();
        let height_delta = frame.height() - old.height();
        if width_delta != 0 || height_delta != 0 {
            self.autosize_children(width_delta, height_delta);
        }
        self.parent_size_changed();
    }

    /// Resize notification: forwarded to every child so nested
    /// containers can re-layout even when their own geometry is
    /// unchanged.
    fn parent_size_changed(&mut self) {
        for child in self.children.clone() {
            child.borrow_mut().parent_size_changed();
        }
    }

    fn is_dirty(&self) -> bool {
        if self.core.dirty {
            return true;
        }
        let bounds = self.core.frame.to_local();
        self.children.iter().any(|child| {
            let c = child.borrow();
            c.is_dirty() && c.is_visible() && !c.frame().bound(bounds).is_empty()
        })
    }

    fn invalidate(&mut self) {
        self.core.dirty = true;
        if !self.core.visible || !self.core.attached {
            return;
        }
        let frame = self.core.frame;
        bubble_invalid_rect(&self.core, frame);
    }

    /// Clips `rect` (local coordinates) to the container bounds and
    /// bubbles it upward translated into the parent's space. Nothing
    /// bubbles when the clip is empty or the container is invisible.
    fn invalidate_rect(&mut self, rect: Rect) {
        if !self.core.visible || !self.core.attached {
            return;
        }
        let rect = rect
            .offset_point(self.core.frame.origin())
            .bound(self.core.frame);
        if rect.is_empty() {
            return;
        }
        bubble_invalid_rect(&self.core, rect);
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext, update_rect: Rect, theme: &Theme) {
        let saved_origin = ctx.origin();
        ctx.set_origin(saved_origin + self.core.frame.origin());

        let origin = self.core.frame.origin();
        let client = update_rect
            .bound(self.core.frame)
            .offset(-origin.x, -origin.y);
        let old_clip = ctx.clip_rect();
        let new_clip = client.bound(old_clip);
        ctx.set_clip_rect(new_clip);

        self.draw_background(ctx, client);

        let focus_child = self.focused_child(theme);
        // remaining ring to draw on top; taken early when the child opts
        // into under-drawing
        let mut pending_focus = focus_child.clone();

        for child in self.children.clone() {
            let mut c = child.borrow_mut();
            if !c.is_visible() {
                continue;
            }
            if let Some(focus) = &pending_focus
                && Rc::ptr_eq(focus, &child)
                && !c.draws_focus_on_top()
                && let Some(path) = c.focus_path(theme)
                && !path.bounding_box().is_empty()
            {
                self.last_drawn_focus = path.bounding_box();
                ctx.set_clip_rect(old_clip);
                ctx.set_draw_mode(DrawMode::AntiAliased);
                ctx.draw_focus_path(&path, theme.focus_color);
                ctx.set_clip_rect(new_clip);
                pending_focus = None;
            }
            if c.frame().intersects(client) {
                let child_clip = c.frame().bound(new_clip);
                if child_clip.is_empty() {
                    continue;
                }
                ctx.set_clip_rect(child_clip);
                let alpha = ctx.global_alpha();
                ctx.set_global_alpha(alpha * c.alpha());
                c.draw(ctx, client, theme);
                ctx.set_global_alpha(alpha);
            }
        }

        ctx.set_clip_rect(old_clip);

        if let Some(focus) = pending_focus {
            let path = {
                let f = focus.borrow();
                f.focus_path(theme)
            }
            .unwrap_or_else(|| self.default_focus_path(&focus, theme));
            self.last_drawn_focus = path.bounding_box();
            if !self.last_drawn_focus.is_empty() {
                ctx.set_draw_mode(DrawMode::AntiAliased);
                ctx.draw_focus_path(&path, theme.focus_color);
            }
        }

        ctx.set_origin(saved_origin);
        self.core.dirty = false;
    }

    fn on_mouse_down(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        let local = point - self.core.frame.origin();
        let pinned: Vec<SharedView> = self.children.iter().rev().cloned().collect();
        for child in pinned {
            let hit = {
                let c = child.borrow();
                c.is_visible() && c.mouse_enabled() && c.hit_test(local, event)
            };
            if !hit {
                continue;
            }
            if event.has_modifier_key() {
                let control = {
                    let c = child.borrow();
                    c.as_control().map(|ctl| (ctl.tag(), ctl.listener()))
                };
                if let Some((tag, Some(listener))) = control
                    && listener.borrow_mut().control_modifier_clicked(tag, event)
                {
                    trace!(tag, "modifier click consumed");
                    return MouseResult::Handled;
                }
            }
            let wants_focus = child.borrow().wants_focus();
            if wants_focus && let Some(window) = self.core.window.upgrade() {
                window.borrow_mut().set_focus_view(Some(&child));
            }
            let result = child.borrow_mut().on_mouse_down(local, event);
            if result == MouseResult::Handled {
                if Rc::strong_count(&child) > 1 {
                    trace!("mouse capture set");
                    self.mouse_down_view = Some(Rc::downgrade(&child));
                }
                return result;
            }
            // a non-transparent decliner stops dispatch; transparency
            // lets the event fall through to siblings beneath
            if !child.borrow().transparent() {
                return MouseResult::NotHandled;
            }
        }
        MouseResult::NotHandled
    }

    fn on_mouse_up(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        if let Some(weak) = self.mouse_down_view.take()
            && let Some(view) = weak.upgrade()
        {
            let local = point - self.core.frame.origin();
            view.borrow_mut().on_mouse_up(local, event);
            trace!("mouse capture cleared");
            return MouseResult::Handled;
        }
        MouseResult::NotHandled
    }

    fn on_mouse_moved(&mut self, point: Point, event: &MouseEvent) -> MouseResult {
        if let Some(weak) = self.mouse_down_view.clone()
            && let Some(view) = weak.upgrade()
        {
            let local = point - self.core.frame.origin();
            if view.borrow_mut().on_mouse_moved(local, event) != MouseResult::Handled {
                self.mouse_down_view = None;
                return MouseResult::NotHandled;
            }
            return MouseResult::Handled;
        }
        MouseResult::NotHandled
    }

    fn on_wheel(&mut self, point: Point, axis: WheelAxis, distance: f32, event: &MouseEvent) -> bool {
        let local = point - self.core.frame.origin();
        let pinned: Vec<SharedView> = self.children.iter().rev().cloned().collect();
        for child in pinned {
            let (visible, contains, transparent) = {
                let c = child.borrow();
                (c.is_visible(), c.mouse_area().contains(local), c.transparent())
            };
            if !visible || !contains {
                continue;
            }
            if child.borrow_mut().on_wheel(local, axis, distance, event) {
                return true;
            }
            if !transparent {
                return false;
            }
        }
        false
    }

    fn on_drag_enter(&mut self, drag: &DragPayload, point: Point) {
        if !self.core.attached {
            return;
        }
        let local = point - self.core.frame.origin();
        if let Some(old) = self.drag_target_view.take().and_then(|w| w.upgrade()) {
            old.borrow_mut().on_drag_leave(drag, local);
        }
        let target = self.get_view_at(point, false);
        self.drag_target_view = target.as_ref().map(Rc::downgrade);
        if let Some(target) = target {
            target.borrow_mut().on_drag_enter(drag, local);
        }
    }

    fn on_drag_move(&mut self, drag: &DragPayload, point: Point) {
        if !self.core.attached {
            return;
        }
        let local = point - self.core.frame.origin();
        let target = self.get_view_at(point, false);
        let current = self.drag_target_view.as_ref().and_then(Weak::upgrade);
        let same = match (&target, &current) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            if let Some(old) = current {
                old.borrow_mut().on_drag_leave(drag, local);
            }
            if let Some(new) = &target {
                new.borrow_mut().on_drag_enter(drag, local);
            }
            self.drag_target_view = target.as_ref().map(Rc::downgrade);
        } else if let Some(current) = current {
            current.borrow_mut().on_drag_move(drag, local);
        }
    }

    fn on_drag_leave(&mut self, drag: &DragPayload, point: Point) {
        if !self.core.attached {
            return;
        }
        let local = point - self.core.frame.origin();
        if let Some(current) = self.drag_target_view.take().and_then(|w| w.upgrade()) {
            current.borrow_mut().on_drag_leave(drag, local);
        }
    }

    fn on_drop(&mut self, drag: &DragPayload, point: Point) -> bool {
        if !self.core.attached {
            return false;
        }
        let local = point - self.core.frame.origin();
        let target = self.get_view_at(point, false);
        let current = self.drag_target_view.as_ref().and_then(Weak::upgrade);
        let same = match (&target, &current) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            if let Some(old) = current {
                old.borrow_mut().on_drag_leave(drag, local);
            }
            self.drag_target_view = target.as_ref().map(Rc::downgrade);
        }
        let mut result = false;
        if let Some(current) = self.drag_target_view.take().and_then(|w| w.upgrade()) {
            result = current.borrow_mut().on_drop(drag, local);
            current.borrow_mut().on_drag_leave(drag, local);
        }
        result
    }

    /// Records the window link, attaches every child, then marks itself
    /// attached.
    fn attached(
        &mut self,
        parent: ParentLink,
        window: Weak<RefCell<WindowCore>>,
        own: &SharedView,
    ) -> bool {
        if self.core.attached {
            return false;
        }
        self.self_weak = Rc::downgrade(own);
        self.core.parent = parent;
        self.core.window = window.clone();
        for child in self.children.clone() {
            let link = ParentLink::View(self.self_weak.clone());
            child.borrow_mut().attached(link, window.clone(), &child);
        }
        self.core.attached = true;
        debug!(children = self.children.len(), "container attached");
        true
    }

    /// Detaches children first, then itself.
    fn detached(&mut self) -> bool {
        if !self.core.attached {
            return false;
        }
        for child in self.children.clone() {
            child.borrow_mut().detached();
        }
        self.self_weak = Weak::<RefCell<Container>>::new();
        self.core.parent = ParentLink::None;
        self.core.window = Weak::new();
        self.core.attached = false;
        debug!("container detached");
        true
    }

    /// Deep copy: children are cloned through their own `make_copy`
    /// capability and appended in order. Capture state starts empty.
    fn make_copy(&self) -> Option<SharedView> {
        let mut copy = Container::new(self.core.frame);
        copy.core = self.core.duplicate();
        copy.background_color = self.background_color;
        copy.background_pattern = self.background_pattern.clone();
        let shared = share(copy);
        for child in &self.children {
            if let Some(cloned) = child.borrow().make_copy()
                && let Some(c) = shared.borrow_mut().as_container_mut()
            {
                c.add_view(&cloned);
            }
        }
        Some(shared)
    }
}
