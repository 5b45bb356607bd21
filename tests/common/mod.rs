#![cfg(feature = "integration-tests")]

use earth_globe::{
    context,
    data_structures::texture::{ColourSpace, Texture},
    resources::SceneTextures,
};

pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Device and queue without a window. Tests render into offscreen targets.
pub async fn headless() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("No graphics adapter available for integration tests");
    context::request_device(&adapter)
        .await
        .expect("Failed to open a device")
}

fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], space: ColourSpace) -> Texture {
    Texture::from_colour(device, queue, rgba, space, "test texture")
}

/// A white Earth with fully transparent clouds in front of a blue backdrop.
pub fn solid_textures(device: &wgpu::Device, queue: &wgpu::Queue) -> SceneTextures {
    SceneTextures {
        earth_diffuse: solid(device, queue, [255, 255, 255, 255], ColourSpace::Srgb),
        earth_normal: Texture::create_default_normal_map(device, queue),
        earth_specular: solid(device, queue, [0, 0, 0, 255], ColourSpace::Linear),
        clouds: solid(device, queue, [255, 255, 255, 0], ColourSpace::Srgb),
        background: solid(device, queue, BACKDROP, ColourSpace::Srgb),
    }
}

/// The placeholders used when no asset can be found, with a transparent
/// cloud shell.
pub fn placeholder_textures(device: &wgpu::Device, queue: &wgpu::Queue) -> SceneTextures {
    SceneTextures {
        earth_diffuse: solid(device, queue, [255; 4], ColourSpace::Srgb),
        earth_normal: solid(device, queue, [127, 127, 255, 255], ColourSpace::Linear),
        earth_specular: solid(device, queue, [255; 4], ColourSpace::Linear),
        clouds: solid(device, queue, [255, 255, 255, 0], ColourSpace::Srgb),
        background: solid(device, queue, [255; 4], ColourSpace::Srgb),
    }
}

pub const BACKDROP: [u8; 4] = [0, 0, 255, 255];

pub fn target(device: &wgpu::Device, width: u32, height: u32) -> Texture {
    Texture::create_render_target(device, [width, height], FORMAT, "test output")
}
