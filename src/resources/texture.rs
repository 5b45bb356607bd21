use anyhow::Context as _;

use crate::data_structures::texture::{self, ColourSpace};

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Diffuse, normal and specular map (texture + sampler each) followed by the
/// material uniform at binding 6.
pub fn phong_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
            texture_entry(4),
            sampler_entry(5),
            wgpu::BindGroupLayoutEntry {
                binding: 6,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("Phong material_bind_group_layout"),
    })
}

/// A single sampled texture. Used by the unlit background and the copy pass.
pub fn basic_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture_entry(0), sampler_entry(1)],
        label: Some("Basic material_bind_group_layout"),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    colour_space: ColourSpace,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str());
    texture::Texture::from_bytes(device, queue, &data, file_name, extension, colour_space)
        .with_context(|| format!("cannot decode {file_name}"))
}

/// Which neutral texture replaces a map that could not be loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// Opaque white, leaves the lit colour untouched.
    White,
    /// Flat tangent space normal.
    FlatNormal,
    /// Fully transparent, for alpha maps whose absence should hide the surface.
    Transparent,
}

impl Fallback {
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Fallback::White => [255, 255, 255, 255],
            Fallback::FlatNormal => [127, 127, 255, 255],
            Fallback::Transparent => [255, 255, 255, 0],
        }
    }
}

/// Load a texture, or log the failure and return a 1x1 stand-in.
pub async fn load_texture_or(
    file_name: &str,
    colour_space: ColourSpace,
    fallback: Fallback,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    match load_texture(file_name, colour_space, device, queue).await {
        Ok(texture) => {
            log::info!("Loaded texture {file_name}");
            texture
        }
        Err(e) => {
            log::error!("Texture {file_name} unavailable, using a placeholder: {e:#}");
            texture::Texture::from_colour(
                device,
                queue,
                fallback.rgba(),
                colour_space,
                &format!("{file_name} (fallback)"),
            )
        }
    }
}
