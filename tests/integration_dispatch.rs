use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::KeyModifiers;
use term_views::context::DrawContext;
use term_views::geometry::{Point, Rect};
use term_views::theme::Theme;
use term_views::view::{
    ControlListener, DragPayload, MouseEvent, MouseResult, SharedView, View, ViewCore, WheelAxis,
    share,
};
use term_views::views::TextButton;
use term_views::{Container, Window};

type Log = Rc<RefCell<Vec<String>>>;

/// Leaf that records every callback it receives.
struct Probe {
    core: ViewCore,
    name: &'static str,
    log: Log,
    accept_mouse: bool,
    accept_wheel: bool,
}

impl Probe {
    fn new(name: &'static str, frame: Rect, log: Log) -> Self {
        Self {
            core: ViewCore::new(frame),
            name,
            log,
            accept_mouse: true,
            accept_wheel: false,
        }
    }

    fn push(&self, what: &str, p: Point) {
        self.log.borrow_mut().push(format!("{}:{}@{},{}", self.name, what, p.x, p.y));
    }
}

impl View for Probe {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn draw(&mut self, _ctx: &mut dyn DrawContext, _update: Rect, _theme: &Theme) {}

    fn on_mouse_down(&mut self, point: Point, _event: &MouseEvent) -> MouseResult {
        if !self.accept_mouse {
            return MouseResult::NotHandled;
        }
        self.push("down", point);
        MouseResult::Handled
    }

    fn on_mouse_moved(&mut self, point: Point, _event: &MouseEvent) -> MouseResult {
        self.push("moved", point);
        MouseResult::Handled
    }

    fn on_mouse_up(&mut self, point: Point, _event: &MouseEvent) -> MouseResult {
        self.push("up", point);
        MouseResult::Handled
    }

    fn on_wheel(&mut self, point: Point, _axis: WheelAxis, distance: f32, _event: &MouseEvent) -> bool {
        if !self.accept_wheel {
            return false;
        }
        self.log
            .borrow_mut()
            .push(format!("{}:wheel@{},{} d{}", self.name, point.x, point.y, distance));
        true
    }

    fn on_drag_enter(&mut self, _drag: &DragPayload, point: Point) {
        self.push("enter", point);
    }

    fn on_drag_move(&mut self, _drag: &DragPayload, point: Point) {
        self.push("dragmove", point);
    }

    fn on_drag_leave(&mut self, _drag: &DragPayload, point: Point) {
        self.push("leave", point);
    }

    fn on_drop(&mut self, _drag: &DragPayload, point: Point) -> bool {
        self.push("drop", point);
        true
    }
}

fn probe(name: &'static str, frame: Rect, log: &Log) -> SharedView {
    share(Probe::new(name, frame, log.clone()))
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn get_view_at_prefers_topmost_and_recurses() {
    let l = log();
    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    let bottom = probe("bottom", Rect::new(0, 0, 50, 50), &l);
    let top = probe("top", Rect::new(20, 20, 70, 70), &l);
    c.add_view(&bottom);
    c.add_view(&top);
    let hit = c.get_view_at(Point::new(30, 30), false).unwrap();
    assert!(Rc::ptr_eq(&hit, &top));
    // after removing the top view the bottom one is exposed again
    c.remove_view(&top);
    let hit = c.get_view_at(Point::new(30, 30), false).unwrap();
    assert!(Rc::ptr_eq(&hit, &bottom));

    let inner = share(Container::new(Rect::new(60, 60, 100, 100)));
    let deep = probe("deep", Rect::new(5, 5, 15, 15), &l);
    inner.borrow_mut().as_container_mut().unwrap().add_view(&deep);
    c.add_view(&inner);
    let hit = c.get_view_at(Point::new(67, 67), true).unwrap();
    assert!(Rc::ptr_eq(&hit, &deep));
}

#[test]
fn mouse_capture_routes_until_release() {
    let l = log();
    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    let root = w.root();
    let target = probe("t", Rect::new(10, 10, 30, 30), &l);
    root.borrow_mut().add_view(&target);

    let down = root
        .borrow_mut()
        .on_mouse_down(Point::new(15, 15), &MouseEvent::left());
    assert_eq!(down, MouseResult::Handled);
    // moves far outside the view still reach it through the capture
    root.borrow_mut()
        .on_mouse_moved(Point::new(90, 90), &MouseEvent::left());
    root.borrow_mut()
        .on_mouse_up(Point::new(90, 90), &MouseEvent::left());
    // capture is gone, further moves are not routed
    let moved = root
        .borrow_mut()
        .on_mouse_moved(Point::new(50, 50), &MouseEvent::none());
    assert_eq!(moved, MouseResult::NotHandled);
    assert_eq!(
        *l.borrow(),
        vec!["t:down@15,15", "t:moved@90,90", "t:up@90,90"]
    );
}

#[test]
fn transparent_decliner_lets_clicks_fall_through() {
    let l = log();
    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    let bottom = probe("bottom", Rect::new(0, 0, 60, 60), &l);
    let veil = share({
        let mut p = Probe::new("veil", Rect::new(0, 0, 60, 60), l.clone());
        p.accept_mouse = false;
        p.set_transparent(true);
        p
    });
    c.add_view(&bottom);
    c.add_view(&veil);
    let result = c.on_mouse_down(Point::new(5, 5), &MouseEvent::left());
    assert_eq!(result, MouseResult::Handled);
    assert_eq!(*l.borrow(), vec!["bottom:down@5,5"]);
}

#[test]
fn opaque_decliner_stops_dispatch() {
    let l = log();
    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    let bottom = probe("bottom", Rect::new(0, 0, 60, 60), &l);
    let wall = share({
        let mut p = Probe::new("wall", Rect::new(0, 0, 60, 60), l.clone());
        p.accept_mouse = false;
        p
    });
    c.add_view(&bottom);
    c.add_view(&wall);
    let result = c.on_mouse_down(Point::new(5, 5), &MouseEvent::left());
    assert_eq!(result, MouseResult::NotHandled);
    assert!(l.borrow().is_empty());
}

#[test]
fn wheel_ignores_mouse_enabled_but_respects_transparency() {
    let l = log();
    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    let scroller = share({
        let mut p = Probe::new("s", Rect::new(0, 0, 40, 40), l.clone());
        p.accept_wheel = true;
        p
    });
    // wheel dispatch does not consult mouse_enabled
    scroller.borrow_mut().set_mouse_enabled(false);
    c.add_view(&scroller);
    assert!(c.on_wheel(Point::new(5, 5), WheelAxis::Y, 1.0, &MouseEvent::none()));
    assert_eq!(*l.borrow(), vec!["s:wheel@5,5 d1"]);

    // an opaque non-scrolling view above swallows the wheel
    let wall = probe("wall", Rect::new(0, 0, 40, 40), &l);
    c.add_view(&wall);
    l.borrow_mut().clear();
    assert!(!c.on_wheel(Point::new(5, 5), WheelAxis::Y, 1.0, &MouseEvent::none()));
    assert!(l.borrow().is_empty());
}

struct ModClick {
    hits: Vec<i32>,
    consume: bool,
}

impl ControlListener for ModClick {
    fn value_changed(&mut self, _tag: i32, _value: f32) {}

    fn control_modifier_clicked(&mut self, tag: i32, _event: &MouseEvent) -> bool {
        self.hits.push(tag);
        self.consume
    }
}

#[test]
fn modifier_click_short_circuits_control_dispatch() {
    let listener = Rc::new(RefCell::new(ModClick {
        hits: Vec::new(),
        consume: true,
    }));
    let mut button = TextButton::new(Rect::new(0, 0, 10, 3), "b", 42);
    button.set_listener(Some(listener.clone()));
    let button: SharedView = share(button);

    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    c.add_view(&button);
    let event = MouseEvent::left().with_modifiers(KeyModifiers::SHIFT);
    let result = c.on_mouse_down(Point::new(2, 1), &event);
    assert_eq!(result, MouseResult::Handled);
    assert_eq!(listener.borrow().hits, vec![42]);
    // no capture was taken, so the release finds nothing
    let up = c.on_mouse_up(Point::new(2, 1), &event);
    assert_eq!(up, MouseResult::NotHandled);
}

#[test]
fn modifier_click_declined_falls_back_to_normal_dispatch() {
    let listener = Rc::new(RefCell::new(ModClick {
        hits: Vec::new(),
        consume: false,
    }));
    let mut button = TextButton::new(Rect::new(0, 0, 10, 3), "b", 42);
    button.set_listener(Some(listener.clone()));
    let button: SharedView = share(button);

    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    c.add_view(&button);
    let event = MouseEvent::left().with_modifiers(KeyModifiers::SHIFT);
    let result = c.on_mouse_down(Point::new(2, 1), &event);
    // the button handles the press itself
    assert_eq!(result, MouseResult::Handled);
    assert_eq!(listener.borrow().hits, vec![42]);
}

#[test]
fn drag_target_transitions_enter_move_leave_drop() {
    let l = log();
    let mut c = Container::new(Rect::new(0, 0, 100, 100));
    let a = probe("a", Rect::new(0, 0, 40, 40), &l);
    let b = probe("b", Rect::new(60, 0, 100, 40), &l);
    c.add_view(&a);
    c.add_view(&b);
    // attach so drag dispatch is live
    let shared = share(c);
    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    w.root().borrow_mut().add_view(&shared);
    let payload = DragPayload {
        strings: vec!["file".into()],
    };
    {
        let mut s = shared.borrow_mut();
        s.on_drag_enter(&payload, Point::new(5, 5));
        s.on_drag_move(&payload, Point::new(10, 5));
        // crossing into b leaves a first
        s.on_drag_move(&payload, Point::new(70, 5));
        assert!(s.on_drop(&payload, Point::new(70, 5)));
        // drop clears the target; a leave now reaches nobody
        s.on_drag_leave(&payload, Point::new(70, 5));
    }
    assert_eq!(
        *l.borrow(),
        vec![
            "a:enter@5,5",
            "a:dragmove@10,5",
            "a:leave@70,5",
            "b:enter@70,5",
            "b:drop@70,5",
            "b:leave@70,5",
        ]
    );
}

#[test]
fn advance_focus_descends_into_nested_containers() {
    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    let root = w.root();
    let first = share(TextButton::new(Rect::new(0, 0, 10, 2), "1", 1));
    let nested = share(Container::new(Rect::new(0, 10, 100, 40)));
    let inner = share(TextButton::new(Rect::new(0, 0, 10, 2), "2", 2));
    let last = share(TextButton::new(Rect::new(0, 50, 10, 52), "3", 3));
    nested.borrow_mut().as_container_mut().unwrap().add_view(&inner);
    root.borrow_mut().add_view(&first);
    root.borrow_mut().add_view(&nested);
    root.borrow_mut().add_view(&last);

    assert!(w.advance_focus(false));
    assert!(Rc::ptr_eq(&w.focus_view().unwrap(), &first));
    assert!(w.advance_focus(false));
    assert!(Rc::ptr_eq(&w.focus_view().unwrap(), &inner));
    assert!(w.advance_focus(false));
    assert!(Rc::ptr_eq(&w.focus_view().unwrap(), &last));

    // and back again
    assert!(w.advance_focus(true));
    assert!(Rc::ptr_eq(&w.focus_view().unwrap(), &inner));
}

#[test]
fn click_moves_focus_to_focusable_view() {
    use crossterm::event::{Event, MouseButton, MouseEventKind};

    let w = Window::new(Rect::new(0, 0, 100, 100), Theme::default());
    let root = w.root();
    let button = share(TextButton::new(Rect::new(10, 10, 20, 12), "b", 1));
    root.borrow_mut().add_view(&button);
    let click = crossterm::event::MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 12,
        row: 11,
        modifiers: KeyModifiers::NONE,
    };
    assert!(w.handle_event(&Event::Mouse(click)));
    assert!(Rc::ptr_eq(&w.focus_view().unwrap(), &button));
}
