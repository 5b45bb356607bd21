use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

/// Size of the drawable area in physical pixels. Never zero in either axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Adopt a new size. Zero sized requests (a minimised window) are ignored.
    /// Returns whether the size changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

/// Window, surface and GPU handles.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub viewport: Viewport,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height);

        // The instance is a handle to our GPU
        // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to this window")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour, so prefer an sRGB surface to get the
        // encoding for free. Anything else renders darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.width,
            height: viewport.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            viewport,
        })
    }

    /// Reconfigure the surface for a new window size. Returns whether anything
    /// changed; zero sizes leave the surface untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.viewport.resize(width, height) {
            return false;
        }
        self.config.width = self.viewport.width;
        self.config.height = self.viewport.height;
        self.configure_surface();
        true
    }

    pub fn configure_surface(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// Request a device with limits every target can satisfy.
pub async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    log::info!("Requesting device and queue");
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            }
            .using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("cannot open the graphics device")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_never_empty() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.size(), [1, 1]);
    }

    #[test]
    fn resize_adopts_new_sizes() {
        let mut viewport = Viewport::new(800, 600);
        assert!(viewport.resize(1024, 768));
        assert_eq!(viewport.size(), [1024, 768]);
        assert!((viewport.aspect() - 1024.0 / 768.0).abs() < 1e-6);
        assert!(!viewport.resize(1024, 768));
    }

    #[test]
    fn zero_sized_resizes_are_ignored() {
        let mut viewport = Viewport::new(800, 600);
        assert!(!viewport.resize(0, 600));
        assert!(!viewport.resize(800, 0));
        assert_eq!(viewport.size(), [800, 600]);
    }
}
