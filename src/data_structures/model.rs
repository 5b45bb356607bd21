//! Meshes, materials and the draw helpers that bind them.
//!
//! A [`Mesh`] is an uploaded vertex/index buffer pair. A [`Material`] is the
//! bind group a mesh is drawn with plus the flags the renderer needs to pick a
//! pipeline: Phong materials are lit and may be transparent, Basic materials
//! are unlit (the starfield).

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{config::Colour, data_structures::texture::Texture};

/// Describes how a vertex type is laid out in a GPU buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Tangent and bitangent
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Shading parameters of a Phong material as seen by `phong.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PhongUniform {
    pub specular: [f32; 3],
    pub shininess: f32,
    pub normal_scale: [f32; 2],
    pub opacity: f32,
    // 1.0 when a normal map is bound, the shader keeps the geometric normal otherwise
    pub use_normal_map: f32,
}

impl PhongUniform {
    pub fn new(specular: Colour, shininess: f32) -> Self {
        Self {
            specular: specular.to_array(),
            shininess,
            normal_scale: [1.0, 1.0],
            opacity: 1.0,
            use_normal_map: 0.0,
        }
    }

    pub fn with_normal_scale(mut self, normal_scale: cgmath::Vector2<f32>) -> Self {
        self.normal_scale = normal_scale.into();
        self.use_normal_map = 1.0;
        self
    }
}

/// Textures a Phong material samples. Missing maps are filled with neutral
/// fallbacks so a single shader serves every Phong mesh.
pub struct PhongMaps {
    pub diffuse: Texture,
    pub normal: Texture,
    pub specular: Texture,
}

#[derive(Debug)]
pub enum MaterialKind {
    Phong { transparent: bool },
    Basic,
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub bind_group: wgpu::BindGroup,
    // Kept alive for as long as the bind group references them
    #[allow(unused)]
    textures: Vec<Texture>,
    #[allow(unused)]
    uniform_buffer: Option<wgpu::Buffer>,
}

impl Material {
    pub fn new_phong(
        device: &wgpu::Device,
        name: &str,
        maps: PhongMaps,
        uniform: PhongUniform,
        transparent: bool,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} material uniform")),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let textures = [&maps.diffuse, &maps.normal, &maps.specular];
        let mut entries: Vec<wgpu::BindGroupEntry> = Vec::with_capacity(7);
        for (i, texture) in textures.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 * i as u32,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 * i as u32 + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: 6,
            resource: uniform_buffer.as_entire_binding(),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            kind: MaterialKind::Phong { transparent },
            bind_group,
            textures: vec![maps.diffuse, maps.normal, maps.specular],
            uniform_buffer: Some(uniform_buffer),
        }
    }

    pub fn new_basic(
        device: &wgpu::Device,
        name: &str,
        diffuse: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
            ],
            label: Some(name),
        });
        Self {
            name: name.to_string(),
            kind: MaterialKind::Basic,
            bind_group,
            textures: vec![diffuse],
            uniform_buffer: None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self.kind, MaterialKind::Phong { transparent: true })
    }
}

/// Draw calls for meshes on a render pass.
///
/// Bind group slots follow the pipeline layouts in [`crate::pipelines`]:
/// material at 0, camera at 1, lights at 2 (lit pipelines only).
pub trait DrawModel<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: Option<&'a wgpu::BindGroup>,
    );
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: Option<&'a wgpu::BindGroup>,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: Option<&'b wgpu::BindGroup>,
    ) {
        self.draw_mesh_instanced(mesh, material, 0..1, camera_bind_group, light_bind_group);
    }

    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: Option<&'b wgpu::BindGroup>,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        if let Some(light_bind_group) = light_bind_group {
            self.set_bind_group(2, light_bind_group, &[]);
        }
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_covers_every_field() {
        let desc = ModelVertex::desc();
        assert_eq!(desc.array_stride, std::mem::size_of::<ModelVertex>() as u64);
        assert_eq!(desc.attributes.len(), 5);
        let last = desc.attributes[4];
        assert_eq!(last.offset + 12, desc.array_stride);
    }

    #[test]
    fn phong_uniform_is_one_std140_block() {
        assert_eq!(std::mem::size_of::<PhongUniform>(), 32);
        let uniform = PhongUniform::new(Colour::from_hex(0x262626), 30.0)
            .with_normal_scale(cgmath::Vector2::new(0.5, 0.7));
        assert_eq!(uniform.normal_scale, [0.5, 0.7]);
        assert_eq!(uniform.use_normal_map, 1.0);
        assert_eq!(uniform.opacity, 1.0);
    }
}
