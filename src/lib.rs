//! earth-globe
//!
//! A textured Earth with a translucent cloud layer, lit by a directional and
//! an ambient light, drawn over a starfield. Runs natively and in the browser
//! on top of wgpu and winit.
//!
//! High-level modules
//! - `camera`: perspective and orthographic cameras, uniforms and the orbit controller
//! - `config`: scene constants (sizes, colours, texture files, camera placement)
//! - `context`: window, surface, device and queue
//! - `data_structures`: geometry, meshes, materials, instances, textures and the scene graph
//! - `earth`: the globe scene and its two render layers
//! - `flow`: the winit event loop driving resize, input and redraws
//! - `pipelines`: Phong, transparent, background and copy pipelines with their shaders
//! - `render`: the effect composer chaining render and copy passes
//! - `resources`: texture loading and mesh upload
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod earth;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    flow::run(config::SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
