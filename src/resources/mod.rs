//! Loading of external files and their upload to the GPU.
//!
//! Assets are read from `./assets` natively and fetched from `<origin>/assets`
//! on the web. A missing or broken image never aborts startup, it is replaced
//! by a neutral placeholder and reported through `log`. A missing cloud map
//! leaves the cloud shell invisible.

use crate::{
    config::SceneConfig,
    data_structures::texture::{ColourSpace, Texture},
    resources::texture::{Fallback, load_texture_or},
};

pub mod mesh;
pub mod texture;

/// Every image the globe scene samples.
#[derive(Debug)]
pub struct SceneTextures {
    pub earth_diffuse: Texture,
    pub earth_normal: Texture,
    pub earth_specular: Texture,
    pub clouds: Texture,
    pub background: Texture,
}

/// Load the five scene textures concurrently.
pub async fn load_scene_textures(
    config: &SceneConfig,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> SceneTextures {
    let (earth_diffuse, earth_normal, earth_specular, clouds, background) = futures::join!(
        load_texture_or(
            &config.earth.diffuse_map,
            ColourSpace::Srgb,
            Fallback::White,
            device,
            queue
        ),
        load_texture_or(
            &config.earth.normal_map,
            ColourSpace::Linear,
            Fallback::FlatNormal,
            device,
            queue
        ),
        load_texture_or(
            &config.earth.specular_map,
            ColourSpace::Linear,
            Fallback::White,
            device,
            queue
        ),
        load_texture_or(
            &config.cloud.alpha_map,
            ColourSpace::Srgb,
            Fallback::Transparent,
            device,
            queue
        ),
        load_texture_or(
            &config.background.texture,
            ColourSpace::Srgb,
            Fallback::White,
            device,
            queue
        ),
    );
    SceneTextures {
        earth_diffuse,
        earth_normal,
        earth_specular,
        clouds,
        background,
    }
}
