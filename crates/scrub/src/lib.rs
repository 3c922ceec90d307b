//! Scroll-coupled progress: maps scroll position to a normalized progress
//! value and turns that value into renderable frames along a path.

pub mod driver;
pub mod trigger;

pub use driver::*;
pub use trigger::*;
