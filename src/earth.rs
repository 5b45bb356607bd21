//! The globe: an Earth sphere under a translucent cloud shell, lit by one
//! directional and one ambient light, in front of a starfield.
//!
//! Two layers are composed every frame. The background layer is an
//! orthographic camera looking at a textured plane that covers the window.
//! The main layer is the orbiting perspective camera looking at the globe and
//! is drawn over the background without clearing it. A copy pass then puts
//! the result on screen.

use cgmath::Vector3;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    camera::{
        self, Camera, CameraResources, OrthographicProjection, PerspectiveProjection, Projection,
        orbit::OrbitController,
    },
    config::{SceneConfig, SphereConfig},
    context::Viewport,
    data_structures::{
        geometry::{PlaneGeometry, SphereGeometry},
        instance::Instance,
        model::{Material, PhongMaps, PhongUniform},
        scene_graph::{AmbientLight, DirectionalLight, MeshNode, Scene, SceneObject},
        texture::{ColourSpace, Texture},
    },
    pipelines::{Pipelines, light::LightResources},
    render::{EffectComposer, Pass, RenderLayer},
    resources::{self, SceneTextures, mesh, texture::Fallback},
};

pub const EARTH: &str = "earth";
pub const CLOUD: &str = "cloud";
pub const DIRECTIONAL_LIGHT: &str = "directionalLight";
pub const AMBIENT_LIGHT: &str = "ambientLight";
pub const BACKGROUND: &str = "background";

/// A scene with the camera and lights it is drawn with.
#[derive(Debug)]
pub struct SceneLayer {
    pub scene: Scene,
    pub camera: CameraResources,
    pub light: LightResources,
}

impl RenderLayer for SceneLayer {
    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, pipelines: &'a Pipelines) {
        self.scene.draw(
            render_pass,
            pipelines,
            &self.camera.bind_group,
            &self.light.bind_group,
        );
    }
}

#[derive(Debug)]
pub struct EarthScene {
    config: SceneConfig,
    pipelines: Pipelines,
    pub camera: Camera,
    pub projection: PerspectiveProjection,
    pub controller: OrbitController,
    pub main: SceneLayer,
    pub background_camera: Camera,
    pub background_projection: OrthographicProjection,
    pub background: SceneLayer,
    pub composer: EffectComposer,
    viewport: Viewport,
}

impl EarthScene {
    pub const BACKGROUND_LAYER: usize = 0;
    pub const MAIN_LAYER: usize = 1;

    /// Load the textures and build the scene for a `format` target of `viewport` size.
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        viewport: Viewport,
        config: SceneConfig,
    ) -> Self {
        let textures = resources::load_scene_textures(&config, device, queue).await;
        Self::with_textures(device, queue, format, viewport, config, textures)
    }

    pub fn with_textures(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        viewport: Viewport,
        config: SceneConfig,
        textures: SceneTextures,
    ) -> Self {
        let camera_bind_group_layout = camera::mk_bind_group_layout(device);
        let pipelines = Pipelines::new(device, format, &camera_bind_group_layout);

        // Main layer: the globe seen through the orbiting camera
        let camera = Camera::new(config.camera.position, config.camera.target);
        let projection = PerspectiveProjection::new(
            viewport.width,
            viewport.height,
            cgmath::Deg(config.camera.fov_y),
            config.camera.near,
            config.camera.far,
        );
        let controller =
            OrbitController::new(config.camera.target, config.orbit.clone(), viewport.height);

        let mut scene = Scene::new();
        let earth_material = Material::new_phong(
            device,
            EARTH,
            PhongMaps {
                diffuse: textures.earth_diffuse,
                normal: textures.earth_normal,
                specular: textures.earth_specular,
            },
            PhongUniform::new(config.earth.specular, config.earth.shininess)
                .with_normal_scale(config.earth.normal_scale),
            false,
            &pipelines.phong_material_layout,
        );
        let cloud_material = Material::new_phong(
            device,
            CLOUD,
            PhongMaps {
                diffuse: textures.clouds,
                normal: Texture::create_default_normal_map(device, queue),
                specular: Texture::from_colour(
                    device,
                    queue,
                    Fallback::White.rgba(),
                    ColourSpace::Linear,
                    "cloud specular",
                ),
            },
            PhongUniform::new(config.cloud.specular, config.cloud.shininess),
            true,
            &pipelines.phong_material_layout,
        );
        scene
            .add(
                EARTH,
                SceneObject::Mesh(sphere_node(device, EARTH, &config.earth.sphere, earth_material)),
            )
            .add(
                CLOUD,
                SceneObject::Mesh(sphere_node(device, CLOUD, &config.cloud.sphere, cloud_material)),
            )
            .add(
                DIRECTIONAL_LIGHT,
                SceneObject::DirectionalLight(DirectionalLight {
                    colour: config.light.directional_colour,
                    intensity: config.light.directional_intensity,
                    position: config.light.directional_position,
                    target: config.light.directional_target,
                }),
            )
            .add(
                AMBIENT_LIGHT,
                SceneObject::AmbientLight(AmbientLight {
                    colour: config.light.ambient_colour,
                    intensity: 1.0,
                }),
            );
        let main = SceneLayer {
            camera: CameraResources::new(device, &camera_bind_group_layout, &camera, &projection, "main"),
            light: LightResources::new(device, scene.light_uniform(), &pipelines.light_bind_group_layout),
            scene,
        };

        // Background layer: a window sized plane seen through an orthographic camera
        let background_camera = Camera::new(
            cgmath::Point3::new(0.0, 0.0, config.background.camera_z),
            cgmath::Point3::new(0.0, 0.0, config.background.plane_z),
        );
        let background_projection = OrthographicProjection::from_window(
            viewport.width,
            viewport.height,
            config.background.near,
            config.background.far,
        );
        let mut background_scene = Scene::new();
        let plane = MeshNode::new(
            device,
            mesh::upload(device, BACKGROUND, PlaneGeometry::new(1.0, 1.0).build()),
            Material::new_basic(
                device,
                BACKGROUND,
                textures.background,
                &pipelines.basic_material_layout,
            ),
            background_plane(&config, viewport),
        );
        background_scene.add(BACKGROUND, SceneObject::Mesh(plane));
        let background = SceneLayer {
            camera: CameraResources::new(
                device,
                &camera_bind_group_layout,
                &background_camera,
                &background_projection,
                "background",
            ),
            light: LightResources::new(
                device,
                background_scene.light_uniform(),
                &pipelines.light_bind_group_layout,
            ),
            scene: background_scene,
        };

        let mut composer =
            EffectComposer::new(device, format, viewport.size(), config.clear_colour.into());
        for pass in globe_passes(&config) {
            composer.add_pass(device, pass);
        }

        log::info!(
            "Globe scene ready: {} main nodes, {} background nodes",
            main.scene.len(),
            background.scene.len()
        );

        Self {
            config,
            pipelines,
            camera,
            projection,
            controller,
            main,
            background_camera,
            background_projection,
            background,
            composer,
            viewport,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Follow a new output size. Zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        if !self.viewport.resize(width, height) {
            return;
        }
        self.projection.resize(width, height);
        self.controller.resize(height);
        self.background_projection.resize(width, height);
        let plane = background_plane(&self.config, self.viewport);
        if let Some(node) = self.background.scene.mesh_mut(BACKGROUND) {
            node.set_instance(queue, plane);
        }
        self.main.camera.update(queue, &self.camera, &self.projection);
        self.background
            .camera
            .update(queue, &self.background_camera, &self.background_projection);
        self.composer.resize(device, self.viewport.size());
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        self.controller.handle_window_events(event)
    }

    /// Apply orbit input and upload the camera. Returns whether the camera moved.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: Duration) -> bool {
        let moved = self.controller.update(&mut self.camera, self.projection.fovy, dt);
        self.main.camera.update(queue, &self.camera, &self.projection);
        moved
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let layers: [&dyn RenderLayer; 2] = [&self.background, &self.main];
        self.composer.render(encoder, &layers, &self.pipelines, view);
    }
}

/// Background render, main render drawn over it, copy to screen.
pub fn globe_passes(config: &SceneConfig) -> [Pass; 3] {
    [
        Pass::Render {
            layer: EarthScene::BACKGROUND_LAYER,
            clear: true,
        },
        Pass::Render {
            layer: EarthScene::MAIN_LAYER,
            clear: false,
        },
        Pass::Copy {
            opacity: config.copy_opacity,
        },
    ]
}

/// The starfield plane scaled to twice the window in each axis so it fills
/// the orthographic view, whose bounds are plus and minus the window size.
pub fn background_plane(config: &SceneConfig, viewport: Viewport) -> Instance {
    Instance::new()
        .with_position(Vector3::new(0.0, 0.0, config.background.plane_z))
        .with_scale(Vector3::new(
            viewport.width as f32 * 2.0,
            viewport.height as f32 * 2.0,
            1.0,
        ))
}

fn sphere_node(
    device: &wgpu::Device,
    name: &str,
    sphere: &SphereConfig,
    material: Material,
) -> MeshNode {
    let geometry =
        SphereGeometry::new(sphere.radius, sphere.width_segments, sphere.height_segments).build();
    MeshNode::new(device, mesh::upload(device, name, geometry), material, Instance::new())
}

#[cfg(test)]
mod tests {
    use cgmath::{Point3, Transform};

    use super::*;
    use crate::render::{Target, schedule};

    #[test]
    fn background_plane_fills_the_orthographic_view() {
        let config = SceneConfig::default();
        let viewport = Viewport::new(800, 600);
        let plane = background_plane(&config, viewport);
        assert_eq!(plane.scale, Vector3::new(1600.0, 1200.0, 1.0));
        assert_eq!(plane.position.z, -100.0);

        let projection = OrthographicProjection::from_window(800, 600, -10000.0, 10000.0);
        let corner = plane.to_matrix().transform_point(Point3::new(0.5, 0.5, 0.0));
        assert_eq!((corner.x, corner.y), (projection.right, projection.top));
    }

    #[test]
    fn globe_is_composed_over_the_background() {
        let passes: Vec<(Pass, bool)> = globe_passes(&SceneConfig::default())
            .into_iter()
            .map(|p| (p, true))
            .collect();
        assert!(matches!(
            passes[1].0,
            Pass::Render {
                layer: EarthScene::MAIN_LAYER,
                clear: false
            }
        ));
        let steps = schedule(&passes);
        assert_eq!(steps[0].destination, steps[1].destination);
        assert_eq!(steps[2].source, Some(steps[1].destination));
        assert_eq!(steps[2].destination, Target::Screen);
    }
}
