//! UI module for ecs-scope.
//!
//! - `render`: layout, styling and widget drawing
//! - `rows`: cell text for every table
//! - `utils`: text truncation and time formatting

pub mod render;
pub mod rows;
pub mod utils;

pub use render::draw;
