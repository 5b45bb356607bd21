//! Scenes: named collections of meshes and lights.
//!
//! A [`Scene`] is flat. Nodes are kept in insertion order and addressed by
//! name, which is how the globe refers to its `"earth"` and `"cloud"` meshes
//! after construction. Lights are ordinary nodes; [`Scene::light_uniform`]
//! folds them into the single light block the Phong shader reads.

use cgmath::{InnerSpace, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    config::Colour,
    data_structures::{
        instance::Instance,
        model::{DrawModel, Material, MaterialKind, Mesh},
    },
    pipelines::{Pipelines, light::LightUniform},
};

/// Parallel light shining from `position` towards `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl DirectionalLight {
    /// Unit vector pointing from the lit surface towards the light.
    pub fn direction(&self) -> Vector3<f32> {
        let dir = self.position - self.target;
        if dir.magnitude2() == 0.0 {
            Vector3::unit_y()
        } else {
            dir.normalize()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: Colour,
    pub intensity: f32,
}

/// A mesh placed in the scene together with its material and transform.
#[derive(Debug)]
pub struct MeshNode {
    pub mesh: Mesh,
    pub material: Material,
    instance: Instance,
    instance_buffer: wgpu::Buffer,
}

impl MeshNode {
    pub fn new(device: &wgpu::Device, mesh: Mesh, material: Material, instance: Instance) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            mesh,
            material,
            instance,
            instance_buffer,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Replace the transform and upload it.
    pub fn set_instance(&mut self, queue: &wgpu::Queue, instance: Instance) {
        self.instance = instance;
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }
}

#[derive(Debug)]
pub enum SceneObject {
    Mesh(MeshNode),
    DirectionalLight(DirectionalLight),
    AmbientLight(AmbientLight),
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub object: SceneObject,
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Names should be unique, lookups return the first match.
    pub fn add(&mut self, name: &str, object: SceneObject) -> &mut Self {
        if self.get_object_by_name(name).is_some() {
            log::warn!("Scene already contains a node named {name}; lookups will return the first one");
        }
        self.nodes.push(SceneNode {
            name: name.to_string(),
            object,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &MeshNode> {
        self.nodes.iter().filter_map(|node| match &node.object {
            SceneObject::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| &node.object)
    }

    pub fn get_object_by_name_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.nodes
            .iter_mut()
            .find(|node| node.name == name)
            .map(|node| &mut node.object)
    }

    pub fn mesh_mut(&mut self, name: &str) -> Option<&mut MeshNode> {
        match self.get_object_by_name_mut(name) {
            Some(SceneObject::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Combine all lights into the shader's light block.
    ///
    /// Ambient lights add up. Only the first directional light is used, the
    /// Phong shader has a single directional slot.
    pub fn light_uniform(&self) -> LightUniform {
        let mut ambient = Colour::BLACK;
        let mut directional: Option<&DirectionalLight> = None;
        for node in &self.nodes {
            match &node.object {
                SceneObject::AmbientLight(light) => {
                    let c = light.colour.scaled(light.intensity);
                    ambient = Colour::new(ambient.r + c.r, ambient.g + c.g, ambient.b + c.b);
                }
                SceneObject::DirectionalLight(light) => {
                    if directional.is_some() {
                        log::warn!("Ignoring additional directional light {}", node.name);
                    } else {
                        directional = Some(light);
                    }
                }
                SceneObject::Mesh(_) => (),
            }
        }
        match directional {
            Some(light) => LightUniform::new(
                light.direction().into(),
                light.colour.scaled(light.intensity),
                ambient,
            ),
            None => LightUniform::new([0.0, 1.0, 0.0], Colour::BLACK, ambient),
        }
    }

    /// Record draw calls for every mesh: opaque meshes in insertion order,
    /// then transparent ones so they blend over what is already drawn.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pipelines: &'a Pipelines,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        let opaque = self.meshes().filter(|m| !m.material.is_transparent());
        let transparent = self.meshes().filter(|m| m.material.is_transparent());
        for node in opaque.chain(transparent) {
            let (pipeline, lights) = match node.material.kind {
                MaterialKind::Phong { transparent: false } => (&pipelines.phong, Some(light_bind_group)),
                MaterialKind::Phong { transparent: true } => {
                    (&pipelines.transparent, Some(light_bind_group))
                }
                MaterialKind::Basic => (&pipelines.background, None),
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_vertex_buffer(1, node.instance_buffer.slice(..));
            render_pass.draw_mesh(&node.mesh, &node.material, camera_bind_group, lights);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene
            .add(
                "directionalLight",
                SceneObject::DirectionalLight(DirectionalLight {
                    colour: Colour::WHITE,
                    intensity: 1.0,
                    position: Point3::new(20.0, 10.0, -10.0),
                    target: Point3::new(0.0, 0.0, 0.0),
                }),
            )
            .add(
                "ambientLight",
                SceneObject::AmbientLight(AmbientLight {
                    colour: Colour::from_hex(0x111111),
                    intensity: 1.0,
                }),
            );
        scene
    }

    #[test]
    fn nodes_are_found_by_name() {
        let scene = lit_scene();
        assert_eq!(scene.len(), 2);
        assert!(matches!(
            scene.get_object_by_name("ambientLight"),
            Some(SceneObject::AmbientLight(_))
        ));
        assert!(matches!(
            scene.get_object_by_name("directionalLight"),
            Some(SceneObject::DirectionalLight(_))
        ));
        assert!(scene.get_object_by_name("earth").is_none());
    }

    #[test]
    fn directional_light_points_from_target_to_position() {
        let light = DirectionalLight {
            colour: Colour::WHITE,
            intensity: 1.0,
            position: Point3::new(20.0, 10.0, -10.0),
            target: Point3::new(0.0, 0.0, 0.0),
        };
        let expected = Vector3::new(20.0, 10.0, -10.0).normalize();
        assert!((light.direction() - expected).magnitude() < 1e-6);
    }

    #[test]
    fn lights_are_folded_into_one_uniform() {
        let mut scene = lit_scene();
        scene.add(
            "fill",
            SceneObject::AmbientLight(AmbientLight {
                colour: Colour::from_hex(0x111111),
                intensity: 1.0,
            }),
        );
        let uniform = scene.light_uniform();
        let single = Colour::from_hex(0x111111).r;
        assert!((uniform.ambient()[0] - 2.0 * single).abs() < 1e-6);
        assert_eq!(uniform.colour(), [1.0, 1.0, 1.0]);
        let dir = Vector3::from(uniform.direction());
        assert!((dir.magnitude() - 1.0).abs() < 1e-6);
        assert!(dir.x > 0.0 && dir.y > 0.0 && dir.z < 0.0);
    }

    #[test]
    fn scene_without_lights_is_dark() {
        let uniform = Scene::new().light_uniform();
        assert_eq!(uniform.colour(), [0.0; 3]);
        assert_eq!(uniform.ambient(), [0.0; 3]);
    }
}
