//! Post-processing composition.
//!
//! An [`EffectComposer`] runs an ordered list of [`Pass`]es over two offscreen
//! colour targets. Render passes draw a scene layer into the current read
//! target. Copy passes sample the read target into the write target and swap
//! the two afterwards, so the next pass reads what was just written. Whichever
//! enabled pass comes last draws straight into the frame handed to
//! [`EffectComposer::render`].
//!
//! The order of operations is planned by [`schedule`], which is pure and
//! independent of the GPU.

use crate::{
    data_structures::texture::Texture,
    pipelines::{
        Pipelines,
        copy::{CopyPipeline, CopyUniform},
    },
};

/// One stage of the composer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pass {
    /// Draw the layer at index `layer`. With `clear` unset the colour already
    /// in the target is kept and drawn over. Depth is always cleared.
    Render { layer: usize, clear: bool },
    /// Copy the read target to the destination, scaled by `opacity`.
    Copy { opacity: f32 },
}

/// Where a pass reads from or writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// One of the two offscreen buffers.
    Buffer(usize),
    /// The frame passed to `render`.
    Screen,
}

/// A planned pass: which pass runs, what it samples and where it draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub pass: usize,
    pub source: Option<Target>,
    pub destination: Target,
}

/// Plan the passes for one frame. Disabled passes are skipped and the last
/// enabled one draws to the screen.
pub fn schedule(passes: &[(Pass, bool)]) -> Vec<Step> {
    let last = passes.iter().rposition(|(_, enabled)| *enabled);
    let (mut read, mut write) = (0, 1);
    let mut steps = Vec::with_capacity(passes.len());
    for (i, (pass, enabled)) in passes.iter().enumerate() {
        if !enabled {
            continue;
        }
        let to_screen = Some(i) == last;
        match pass {
            Pass::Render { .. } => steps.push(Step {
                pass: i,
                source: None,
                destination: if to_screen {
                    Target::Screen
                } else {
                    Target::Buffer(read)
                },
            }),
            Pass::Copy { .. } => {
                steps.push(Step {
                    pass: i,
                    source: Some(Target::Buffer(read)),
                    destination: if to_screen {
                        Target::Screen
                    } else {
                        Target::Buffer(write)
                    },
                });
                std::mem::swap(&mut read, &mut write);
            }
        }
    }
    steps
}

/// Something a render pass can draw: a scene together with its camera and lights.
pub trait RenderLayer {
    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, pipelines: &'a Pipelines);
}

#[derive(Debug)]
struct CopyBinding {
    uniform: wgpu::Buffer,
    // one bind group per offscreen buffer it may read from
    bind_groups: [wgpu::BindGroup; 2],
}

#[derive(Debug)]
struct PassSlot {
    pass: Pass,
    enabled: bool,
    copy: Option<CopyBinding>,
}

#[derive(Debug)]
pub struct EffectComposer {
    passes: Vec<PassSlot>,
    targets: [Texture; 2],
    depth_texture: Texture,
    format: wgpu::TextureFormat,
    size: [u32; 2],
    copy: CopyPipeline,
    clear_colour: wgpu::Color,
}

impl EffectComposer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        clear_colour: wgpu::Color,
    ) -> Self {
        Self {
            passes: Vec::new(),
            targets: mk_targets(device, format, size),
            depth_texture: Texture::create_depth_texture(device, size, "composer depth"),
            format,
            size,
            copy: CopyPipeline::new(device, format),
            clear_colour,
        }
    }

    /// Append a pass and return its index.
    pub fn add_pass(&mut self, device: &wgpu::Device, pass: Pass) -> usize {
        let copy = match pass {
            Pass::Copy { opacity } => {
                let uniform = CopyPipeline::mk_uniform_buffer(device, CopyUniform::new(opacity));
                let bind_groups = self.mk_copy_bind_groups(device, &uniform);
                Some(CopyBinding {
                    uniform,
                    bind_groups,
                })
            }
            Pass::Render { .. } => None,
        };
        self.passes.push(PassSlot {
            pass,
            enabled: true,
            copy,
        });
        self.passes.len() - 1
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.passes.get_mut(index) {
            slot.enabled = enabled;
        }
    }

    pub fn set_clear_colour(&mut self, colour: wgpu::Color) {
        self.clear_colour = colour;
    }

    pub fn passes(&self) -> Vec<(Pass, bool)> {
        self.passes.iter().map(|s| (s.pass, s.enabled)).collect()
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Recreate the offscreen targets for a new output size.
    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        if size[0] == 0 || size[1] == 0 || size == self.size {
            return;
        }
        self.size = size;
        self.targets = mk_targets(device, self.format, size);
        self.depth_texture = Texture::create_depth_texture(device, size, "composer depth");
        let rebuilt: Vec<Option<[wgpu::BindGroup; 2]>> = self
            .passes
            .iter()
            .map(|slot| {
                slot.copy
                    .as_ref()
                    .map(|copy| self.mk_copy_bind_groups(device, &copy.uniform))
            })
            .collect();
        for (slot, bind_groups) in self.passes.iter_mut().zip(rebuilt) {
            if let (Some(copy), Some(bind_groups)) = (slot.copy.as_mut(), bind_groups) {
                copy.bind_groups = bind_groups;
            }
        }
        log::debug!("Composer targets resized to {}x{}", size[0], size[1]);
    }

    /// Record every enabled pass into `encoder`, ending on `screen`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        layers: &[&dyn RenderLayer],
        pipelines: &Pipelines,
        screen: &wgpu::TextureView,
    ) {
        for step in schedule(&self.passes()) {
            let slot = &self.passes[step.pass];
            let view = match step.destination {
                Target::Screen => screen,
                Target::Buffer(i) => &self.targets[i].view,
            };
            match slot.pass {
                Pass::Render { layer, clear } => {
                    let load = if clear {
                        wgpu::LoadOp::Clear(self.clear_colour)
                    } else {
                        wgpu::LoadOp::Load
                    };
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Composer Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            depth_slice: None,
                            ops: wgpu::Operations {
                                load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth_texture.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    match layers.get(layer) {
                        Some(layer) => layer.draw(&mut render_pass, pipelines),
                        None => log::warn!("Render pass {} refers to missing layer {layer}", step.pass),
                    }
                }
                Pass::Copy { .. } => {
                    let (Some(copy), Some(Target::Buffer(source))) = (&slot.copy, step.source) else {
                        continue;
                    };
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Composer Copy Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            depth_slice: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    render_pass.set_pipeline(&self.copy.pipeline);
                    render_pass.set_bind_group(0, &copy.bind_groups[source], &[]);
                    render_pass.draw(0..3, 0..1);
                }
            }
        }
    }

    fn mk_copy_bind_groups(&self, device: &wgpu::Device, uniform: &wgpu::Buffer) -> [wgpu::BindGroup; 2] {
        [
            self.copy.bind(device, &self.targets[0].view, uniform),
            self.copy.bind(device, &self.targets[1].view, uniform),
        ]
    }
}

fn mk_targets(device: &wgpu::Device, format: wgpu::TextureFormat, size: [u32; 2]) -> [Texture; 2] {
    [
        Texture::create_render_target(device, size, format, "composer read target"),
        Texture::create_render_target(device, size, format, "composer write target"),
    ]
}

/// Copy a colour texture back to the CPU. Rows are padded to wgpu's copy
/// alignment on the GPU and unpadded here.
#[cfg(feature = "integration-tests")]
pub async fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> anyhow::Result<image::RgbaImage> {
    let (width, height) = (texture.width(), texture.height());
    let u32_size = std::mem::size_of::<u32>() as u32;
    let unpadded = u32_size * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback buffer"),
        size: (padded * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(Some(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only goes away if the caller stopped waiting
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::Wait)?;
    rx.receive()
        .await
        .ok_or_else(|| anyhow::anyhow!("readback channel closed"))??;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    for row in data.chunks(padded as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    drop(data);
    output_buffer.unmap();
    image::RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("readback size does not match {width}x{height}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globe_passes() -> Vec<(Pass, bool)> {
        vec![
            (Pass::Render { layer: 0, clear: true }, true),
            (Pass::Render { layer: 1, clear: false }, true),
            (Pass::Copy { opacity: 1.0 }, true),
        ]
    }

    #[test]
    fn globe_passes_share_one_buffer_and_copy_to_screen() {
        let steps = schedule(&globe_passes());
        assert_eq!(
            steps,
            vec![
                Step {
                    pass: 0,
                    source: None,
                    destination: Target::Buffer(0),
                },
                Step {
                    pass: 1,
                    source: None,
                    destination: Target::Buffer(0),
                },
                Step {
                    pass: 2,
                    source: Some(Target::Buffer(0)),
                    destination: Target::Screen,
                },
            ]
        );
    }

    #[test]
    fn last_enabled_pass_draws_to_screen() {
        let mut passes = globe_passes();
        passes[2].1 = false;
        let steps = schedule(&passes);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].destination, Target::Buffer(0));
        assert_eq!(steps[1].destination, Target::Screen);
    }

    #[test]
    fn copies_swap_read_and_write() {
        let passes = vec![
            (Pass::Render { layer: 0, clear: true }, true),
            (Pass::Copy { opacity: 1.0 }, true),
            (Pass::Render { layer: 1, clear: false }, true),
            (Pass::Copy { opacity: 0.5 }, true),
        ];
        let steps = schedule(&passes);
        assert_eq!(steps[1].source, Some(Target::Buffer(0)));
        assert_eq!(steps[1].destination, Target::Buffer(1));
        // after the swap the next render draws over the copied image
        assert_eq!(steps[2].destination, Target::Buffer(1));
        assert_eq!(steps[3].source, Some(Target::Buffer(1)));
        assert_eq!(steps[3].destination, Target::Screen);
    }

    #[test]
    fn nothing_enabled_plans_nothing() {
        assert!(schedule(&[]).is_empty());
        let passes = vec![(Pass::Copy { opacity: 1.0 }, false)];
        assert!(schedule(&passes).is_empty());
    }
}
