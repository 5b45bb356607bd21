use wgpu::util::DeviceExt;

use crate::config::Colour;

/// GPU resources for the light block of one scene.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        uniform: LightUniform,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group = mk_bind_group(device, bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    direction: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    colour: [f32; 3],
    _padding2: u32,
    ambient: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    /// `direction` points from the surface towards the light and must be normalised.
    pub fn new(direction: [f32; 3], colour: Colour, ambient: Colour) -> Self {
        Self {
            direction,
            _padding: 0,
            colour: colour.to_array(),
            _padding2: 0,
            ambient: ambient.to_array(),
            _padding3: 0,
        }
    }

    pub fn direction(&self) -> [f32; 3] {
        self.direction
    }

    pub fn colour(&self) -> [f32; 3] {
        self.colour
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.ambient
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_block_is_padded_to_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        let uniform = LightUniform::new([0.0, 1.0, 0.0], Colour::WHITE, Colour::BLACK);
        assert_eq!(uniform.colour(), [1.0; 3]);
        assert_eq!(uniform.direction(), [0.0, 1.0, 0.0]);
    }
}
