//! Render pipelines and the bind group layouts they are built from.
//!
//! Bind group slots for scene pipelines are fixed: material at 0, camera at
//! 1 and lights at 2. The copy pipeline used by the composer has its own
//! single group.

use crate::resources::texture::{basic_material_layout, phong_material_layout};

pub mod background;
pub mod basic;
pub mod copy;
pub mod light;
pub mod transparent;

/// Every pipeline a scene layer can be drawn with, plus the layouts materials
/// need to create their bind groups.
#[derive(Debug)]
pub struct Pipelines {
    pub phong: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub background: wgpu::RenderPipeline,
    pub phong_material_layout: wgpu::BindGroupLayout,
    pub basic_material_layout: wgpu::BindGroupLayout,
    pub light_bind_group_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let phong_material_layout = phong_material_layout(device);
        let basic_material_layout = basic_material_layout(device);
        let light_bind_group_layout = light::mk_bind_group_layout(device);
        let phong = basic::mk_phong_pipeline(
            device,
            color_format,
            &phong_material_layout,
            camera_bind_group_layout,
            &light_bind_group_layout,
        );
        let transparent = transparent::mk_transparent_pipeline(
            device,
            color_format,
            &phong_material_layout,
            camera_bind_group_layout,
            &light_bind_group_layout,
        );
        let background = background::mk_background_pipeline(
            device,
            color_format,
            &basic_material_layout,
            camera_bind_group_layout,
        );
        Self {
            phong,
            transparent,
            background,
            phong_material_layout,
            basic_material_layout,
            light_bind_group_layout,
        }
    }
}
