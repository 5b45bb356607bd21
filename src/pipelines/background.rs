use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/// Unlit textured pipeline for the starfield plane. Ignores depth entirely.
pub fn mk_background_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[material_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        Some(depth_state(false, wgpu::CompareFunction::Always)),
        None,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
