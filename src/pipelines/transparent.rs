use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/**
 * Lit pipeline for translucent meshes such as the cloud layer.
 *
 * Shares the Phong shader with the opaque pipeline and blends the result over
 * what is already in the target. Depth is tested but not written so the
 * surface below stays visible through every translucent layer.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transparent Pipeline Layout"),
        bind_group_layouts: &[
            material_bind_group_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Transparent Phong Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("phong.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(depth_state(false, wgpu::CompareFunction::Less)),
        Some(wgpu::Face::Back),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
