use term_views::context::DrawContext;
use term_views::geometry::Rect;
use term_views::theme::Theme;
use term_views::view::{SharedView, View, ViewCore, share};
use term_views::views::TextButton;
use term_views::{Container, Window};

struct Leaf {
    core: ViewCore,
}

impl View for Leaf {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn draw(&mut self, _ctx: &mut dyn DrawContext, _update: Rect, _theme: &Theme) {}
}

fn leaf(frame: Rect) -> SharedView {
    share(Leaf {
        core: ViewCore::new(frame),
    })
}

/// window -> container at (20,20) -> leaf; handy for translation checks
fn nested() -> (Window, SharedView, SharedView) {
    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    let container = share(Container::new(Rect::new(20, 20, 80, 80)));
    let child = leaf(Rect::new(20, 20, 40, 40));
    w.root().borrow_mut().add_view(&container);
    container
        .borrow_mut()
        .as_container_mut()
        .unwrap()
        .add_view(&child);
    w.take_invalid_rects();
    (w, container, child)
}

#[test]
fn invalidate_translates_into_window_space() {
    let (w, _container, child) = nested();
    child.borrow_mut().invalidate();
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(40, 40, 60, 60)]);
}

#[test]
fn invalidate_rect_is_clipped_by_each_container() {
    let (w, _container, child) = nested();
    // extends past the container's right edge at 80
    child.borrow_mut().invalidate_rect(Rect::new(30, 30, 90, 50));
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(50, 50, 80, 70)]);
}

#[test]
fn invisible_container_swallows_invalidation() {
    let (w, container, child) = nested();
    container.borrow_mut().set_visible(false);
    w.take_invalid_rects();
    child.borrow_mut().invalidate();
    assert!(w.take_invalid_rects().is_empty());
}

#[test]
fn adding_a_view_invalidates_its_frame() {
    let (w, container, _child) = nested();
    let extra = leaf(Rect::new(0, 0, 10, 10));
    container
        .borrow_mut()
        .as_container_mut()
        .unwrap()
        .add_view(&extra);
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(20, 20, 30, 30)]);
}

#[test]
fn removing_a_view_invalidates_its_old_frame() {
    let (w, container, child) = nested();
    container
        .borrow_mut()
        .as_container_mut()
        .unwrap()
        .remove_view(&child);
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(40, 40, 60, 60)]);
    assert!(!child.borrow().is_attached());
}

#[test]
fn container_dirtiness_considers_clipped_children() {
    let (_w, container, child) = nested();
    assert!(!container.borrow().is_dirty());
    child.borrow_mut().set_dirty(true);
    assert!(container.borrow().is_dirty());
    // a dirty child fully outside the container bounds does not count
    child.borrow_mut().set_dirty(false);
    let outside = leaf(Rect::new(200, 200, 220, 220));
    container
        .borrow_mut()
        .as_container_mut()
        .unwrap()
        .add_view(&outside);
    outside.borrow_mut().set_dirty(true);
    assert!(!container.borrow().is_dirty());
}

#[test]
fn dirty_views_bubble_minimal_rects() {
    let (w, _container, child) = nested();
    child.borrow_mut().set_dirty(true);
    w.invalidate_dirty_views();
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(40, 40, 60, 60)]);
    // leaf dirty state stays until it draws
    assert!(child.borrow().is_dirty());
}

#[test]
fn dirty_container_short_circuits_to_whole_frame() {
    let (w, container, child) = nested();
    container.borrow_mut().set_dirty(true);
    child.borrow_mut().set_dirty(true);
    w.invalidate_dirty_views();
    assert_eq!(w.take_invalid_rects(), vec![Rect::new(20, 20, 80, 80)]);
}

#[test]
fn focus_change_invalidates_ring_areas() {
    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    let a = share(TextButton::new(Rect::new(10, 10, 20, 13), "a", 1));
    let b = share(TextButton::new(Rect::new(40, 10, 50, 13), "b", 2));
    w.root().borrow_mut().add_view(&a);
    w.root().borrow_mut().add_view(&b);
    w.take_invalid_rects();

    w.set_focus_view(Some(&a));
    // focus ring area around a, grown by the theme focus width
    let rects = w.take_invalid_rects();
    assert_eq!(rects, vec![Rect::new(9, 9, 21, 14)]);

    w.set_focus_view(Some(&b));
    let rects = w.take_invalid_rects();
    // new ring area around b; the old ring is erased once a ring was
    // actually drawn, which has not happened here
    assert!(rects.contains(&Rect::new(39, 9, 51, 14)));
}

#[test]
fn hidden_view_invalidate_marks_dirty_but_stays_silent() {
    let (w, _container, child) = nested();
    child.borrow_mut().set_visible(false);
    w.take_invalid_rects();
    child.borrow_mut().invalidate();
    assert!(child.borrow().is_dirty());
    assert!(w.take_invalid_rects().is_empty());
}
