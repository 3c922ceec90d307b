//! Browser host for scrollytelling sections.
//!
//! The DOM-facing pieces only build for `wasm32`; page wiring, listener
//! bookkeeping and canvas projection math are plain Rust and tested natively.

pub mod kitchen_sink;
pub mod listeners;
pub mod projection;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod net;
#[cfg(target_arch = "wasm32")]
pub mod scroll;
#[cfg(target_arch = "wasm32")]
pub mod surface;
#[cfg(target_arch = "wasm32")]
pub mod visibility;

#[cfg(target_arch = "wasm32")]
pub use app::*;
