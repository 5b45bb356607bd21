//! Cameras, projections and the uniform block shaders read them from.
//!
//! The globe uses two cameras: a perspective camera that orbits the Earth and
//! an orthographic camera for the starfield. Both feed the same
//! [`CameraUniform`] layout so every scene pipeline shares one bind group
//! layout for slot 1.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, perspective};
use wgpu::util::DeviceExt;

pub mod orbit;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Anything that yields a projection matrix in OpenGL clip conventions.
pub trait Projection {
    fn calc_matrix(&self) -> Matrix4<f32>;
    fn resize(&mut self, width: u32, height: u32);
}

/// A camera at `position` looking at `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            position,
            target,
            up: Vector3::unit_y(),
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        // Looking straight along the up axis would make the basis degenerate
        let forward = self.target - self.position;
        let up = if forward.magnitude2() > 0.0 && forward.normalize().cross(self.up).magnitude2() < 1e-10 {
            Vector3::unit_z()
        } else {
            self.up
        };
        Matrix4::look_at_rh(self.position, self.target, up)
    }

    /// Unit vectors pointing right and up in view space, expressed in world space.
    pub fn right_and_up(&self) -> (Vector3<f32>, Vector3<f32>) {
        let view = self.calc_matrix();
        (
            Vector3::new(view.x.x, view.y.x, view.z.x),
            Vector3::new(view.x.y, view.y.y, view.z.y),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveProjection {
    pub aspect: f32,
    /// Vertical field of view
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl PerspectiveProjection {
    pub fn new<F: Into<Deg<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }
}

impl Projection for PerspectiveProjection {
    fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Box shaped projection whose bounds follow the window size in pixels:
/// `(-width, width)` horizontally and `(-height, height)` vertically.
#[derive(Clone, Debug, PartialEq)]
pub struct OrthographicProjection {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl OrthographicProjection {
    pub fn from_window(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        let mut projection = Self {
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            znear,
            zfar,
        };
        projection.resize(width, height);
        projection
    }
}

impl Projection for OrthographicProjection {
    fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(self.left, self.right, self.bottom, self.top, self.znear, self.zfar)
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        self.left = -w;
        self.right = w;
        self.top = h;
        self.bottom = -h;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &impl Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// A camera's uniform together with its GPU buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera: &Camera,
        projection: &impl Projection,
        label: &str,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Camera Buffer")),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{label} camera_bind_group")),
        });

        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera, projection: &impl Projection) {
        self.uniform.update_view_proj(camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
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
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, Transform, Vector4};

    use super::*;

    #[test]
    fn resize_updates_the_aspect_ratio() {
        let mut projection = PerspectiveProjection::new(800, 600, Deg(70.0), 1.0, 1000.0);
        assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(1920, 1080);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn orthographic_bounds_follow_the_window() {
        let mut projection = OrthographicProjection::from_window(800, 600, -10000.0, 10000.0);
        assert_eq!(
            (projection.left, projection.right, projection.top, projection.bottom),
            (-800.0, 800.0, 600.0, -600.0)
        );
        projection.resize(1024, 768);
        assert_eq!(projection.right, 1024.0);
        assert_eq!(projection.bottom, -768.0);
    }

    #[test]
    fn orthographic_corners_map_to_clip_corners() {
        let projection = OrthographicProjection::from_window(800, 600, -10000.0, 10000.0);
        let camera = Camera::new(Point3::new(0.0, 0.0, 50.0), Point3::new(0.0, 0.0, -100.0));
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        let corner = view_proj * Vector4::new(800.0, 600.0, -100.0, 1.0);
        assert!((corner.x / corner.w - 1.0).abs() < 1e-5);
        assert!((corner.y / corner.w - 1.0).abs() < 1e-5);
        let depth = corner.z / corner.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn target_is_projected_to_the_centre() {
        let camera = Camera::new(Point3::new(25.0, 10.0, 23.0), Point3::origin());
        let projection = PerspectiveProjection::new(800, 600, Deg(70.0), 1.0, 1000.0);
        let centre = (projection.calc_matrix() * camera.calc_matrix())
            .transform_point(Point3::origin());
        assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
        assert!(centre.z > 0.0 && centre.z < 1.0);
    }

    #[test]
    fn right_and_up_are_orthonormal() {
        let camera = Camera::new(Point3::new(25.0, 10.0, 23.0), Point3::origin());
        let (right, up) = camera.right_and_up();
        assert!((right.magnitude() - 1.0).abs() < 1e-5);
        assert!((up.magnitude() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
        let forward = (camera.target - camera.position).normalize();
        assert!(right.dot(forward).abs() < 1e-5);
        assert!(up.y > 0.0);
    }

    #[test]
    fn looking_straight_down_stays_finite() {
        let camera = Camera::new(Point3::new(0.0, 10.0, 0.0), Point3::origin());
        let m = camera.calc_matrix();
        let values: [[f32; 4]; 4] = m.into();
        assert!(values.iter().flatten().all(|v| v.is_finite()));
    }
}
