//! Data structures of the globe: geometry, models, textures, scenes, and instances.
//!
//! - `geometry` generates sphere and plane vertex data on the CPU
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-object transformation data
//! - `scene_graph` holds named meshes and lights

pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
