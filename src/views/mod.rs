//! Concrete leaf views built on the [`View`](crate::view::View) trait.

pub mod button;
pub mod label;

pub use button::TextButton;
pub use label::Label;
