//! showroom
//!
//! A single-window car configurator built on wgpu. It loads a glTF studio
//! model, paints the car's parts with physically based materials, lights
//! them with an HDR environment plus one rectangular area light and renders
//! through bloom, ACES tone mapping, a color lookup table and FXAA. Clicking
//! a numbered label flies the camera to that part and opens its color panel.
//!
//! Everything except the GPU layer is plain data, so the configurator can be
//! driven and inspected without a device through [`Showroom`].
//!
//! High-level modules
//! - `sketch`: the composition root, viewport and per-frame plan
//! - `camera`: camera, orbit controls, projection and their uniforms
//! - `tween`: eased camera transitions
//! - `annotation`: annotations, screen labels and color panels
//! - `post`: post-processing chain parameters
//! - `assets`: load state of the background asset fetches
//! - `config`: start-up configuration
//! - `data_structures`: meshes, materials, textures, scene graph, transforms
//! - `resources`: glTF, HDR and LUT loading
//! - `context`: window, surface and device
//! - `pipelines`: render pipelines and shaders
//! - `render`: per-frame GPU rendering
//! - `flow`: the winit event loop
//!

pub mod annotation;
pub mod assets;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod post;
pub mod render;
pub mod resources;
pub mod sketch;
pub mod tween;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::Config;
pub use data_structures::material::{Color, Part};
pub use flow::run;
pub use sketch::{FramePlan, Shortcut, Showroom, Viewport};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(Config::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
