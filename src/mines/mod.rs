//! Minesweeper demo: the game model and the field view rendering it.

pub mod field;
pub mod model;

pub use field::FieldView;
pub use model::{Model, ModelError, SplitMix64};
