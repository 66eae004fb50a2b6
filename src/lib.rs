//! A retained-mode view hierarchy for terminal UIs: containers with
//! z-ordered children, dirty-region repainting, hit-test dispatch,
//! focus traversal and drag-and-drop routing, rendered into ratatui
//! buffers.

pub mod backend;
pub mod container;
pub mod context;
pub mod geometry;
pub mod mines;
pub mod theme;
pub mod tracing_sub;
pub mod view;
pub mod views;
pub mod window;

pub use backend::BufferContext;
pub use container::Container;
pub use geometry::{Point, Rect};
pub use theme::Theme;
pub use view::{MouseEvent, MouseResult, SharedView, View, share};
pub use window::Window;
