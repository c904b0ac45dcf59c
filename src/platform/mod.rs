//! Platform abstraction layer
//!
//! Browser-only glue: capability probing, the JavaScript binding and sound
//! cue playback. Native hosts use the engine directly with a `StaticProbe`.

#[cfg(target_arch = "wasm32")]
pub mod synth;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use synth::CueSynth;
#[cfg(target_arch = "wasm32")]
pub use web::{BrowserProbe, WebMiniGame};
