//! Application event loop.
//!
//! [`run`] opens a window (or binds to the `canvas` element on the web), builds
//! the GPU context and the [`EarthScene`], and then drives the scene from winit
//! events. Each redraw does the following:
//! 1. Measure the time since the previous frame
//! 2. Apply orbit input and upload the camera
//! 3. Acquire the next surface texture
//! 4. Run the composer into it
//! 5. Present and request the next redraw

use std::{fmt::Debug, iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{config::SceneConfig, context::Context, earth::EarthScene};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const WINDOW_TITLE: &str = "Earth";

/// GPU context, the scene drawn into it and surface status.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    scene: EarthScene,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        ctx.configure_surface();
        let scene = EarthScene::new(
            &ctx.device,
            &ctx.queue,
            ctx.config.format,
            ctx.viewport,
            config,
        )
        .await;
        Ok(Self {
            ctx,
            scene,
            is_surface_configured: true,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            // Minimised. Keep the old surface and skip frames until we get a size again
            self.is_surface_configured = false;
            return;
        }
        if !self.ctx.resize(width, height) {
            self.ctx.configure_surface();
        }
        self.is_surface_configured = true;
        self.scene
            .resize(&self.ctx.device, &self.ctx.queue, width, height);
    }

    fn render(&mut self, dt: instant::Duration) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.scene.update(&self.ctx.queue, dt);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.scene.render(&mut encoder, &view);
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(target_arch = "wasm32")]
    proxy: winit::event_loop::EventLoopProxy<GlobeEvent>,
    // Taken once the window exists
    config: Option<SceneConfig>,
    state: Option<AppState>,
    last_time: Instant,
}

impl App {
    // Only the web build talks back to the event loop through a proxy
    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn new(event_loop: &EventLoop<GlobeEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            #[cfg(target_arch = "wasm32")]
            proxy: event_loop.create_proxy(),
            config: Some(config),
            state: None,
            last_time: Instant::now(),
        })
    }
}

pub enum GlobeEvent {
    /// Sent by the web build once its asynchronous setup finished.
    #[allow(dead_code)]
    Initialized(Box<AppState>),
}

impl Debug for GlobeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
        }
    }
}

impl ApplicationHandler<GlobeEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again on some platforms. Only the first one builds the scene.
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(WINDOW_TITLE);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = AppState::new(window, config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(mut state) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                    state.ctx.window.request_redraw();
                    self.last_time = Instant::now();
                    self.state = Some(state);
                }
                Err(e) => {
                    log::error!("App initialization failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(state) => {
                        if proxy
                            .send_event(GlobeEvent::Initialized(Box::new(state)))
                            .is_err()
                        {
                            log::error!("Event loop closed before the globe was ready");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: GlobeEvent) {
        match event {
            GlobeEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let mut state = *state;

                // The canvas may have been laid out while we were loading
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.last_time = Instant::now();
                self.state = Some(state);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.scene.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(dt) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, shutting down");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and show the globe until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<GlobeEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    log::info!("Starting the event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
