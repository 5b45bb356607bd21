//! Pointer driven orbiting around a target point.
//!
//! Window events only record what the pointer did. [`OrbitController::update`]
//! applies the recorded motion once per frame: the camera offset from the
//! target is turned into spherical coordinates, rotated, scaled and clamped,
//! and written back to the camera.
//!
//! Left drag rotates, middle drag and the wheel zoom, right drag pans.

use std::f32::consts::PI;

use cgmath::{Deg, InnerSpace, Point3, Rad, Vector2, Vector3, Zero};
use instant::Duration;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::{camera::Camera, config::OrbitConfig};

const EPS: f32 = 1e-6;
// Smallest polar angle whose cosine still differs from 1 in f32
const POLAR_EPS: f32 = 1e-3;
// Pixel wheel deltas that make up one zoom step
const PIXELS_PER_ZOOM_STEP: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Dolly,
    Pan,
}

/// Offset from the target in spherical coordinates. `theta` is the azimuth
/// around +y measured from +z, `phi` the polar angle measured from +y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius < EPS {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep the polar angle away from the poles where the view basis flips.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(POLAR_EPS, PI - POLAR_EPS);
    }
}

#[derive(Debug)]
pub struct OrbitController {
    pub target: Point3<f32>,
    config: OrbitConfig,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pending_pan: Vector2<f32>,
    pan_offset: Vector3<f32>,
    drag: Drag,
    last_cursor: Option<Vector2<f32>>,
    viewport_height: f32,
}

impl OrbitController {
    pub fn new(target: Point3<f32>, config: OrbitConfig, viewport_height: u32) -> Self {
        Self {
            target,
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pending_pan: Vector2::zero(),
            pan_offset: Vector3::zero(),
            drag: Drag::None,
            last_cursor: None,
            viewport_height: viewport_height.max(1) as f32,
        }
    }

    pub fn resize(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    /// Record pointer input. Returns `true` if the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Rotate,
                    MouseButton::Middle => Drag::Dolly,
                    MouseButton::Right => Drag::Pan,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed if self.drag == Drag::None => self.drag = drag,
                    ElementState::Released if self.drag == drag => self.drag = Drag::None,
                    _ => (),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = Vector2::new(position.x as f32, position.y as f32);
                let delta = self
                    .last_cursor
                    .map_or(Vector2::zero(), |last| current - last);
                self.last_cursor = Some(current);
                match self.drag {
                    Drag::Rotate => self.rotate(delta.x, delta.y),
                    Drag::Pan => self.pan(delta.x, delta.y),
                    Drag::Dolly if delta.y > 0.0 => self.dolly(-1.0),
                    Drag::Dolly if delta.y < 0.0 => self.dolly(1.0),
                    _ => return false,
                }
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                self.drag = Drag::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom(wheel_steps(delta));
                true
            }
            _ => false,
        }
    }

    /// Rotate by a pointer movement of `dx`, `dy` pixels. A drag across the
    /// full viewport height turns the camera once around the target.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let turn = 2.0 * PI * self.config.rotate_speed / self.viewport_height;
        self.delta_theta -= turn * dx;
        self.delta_phi -= turn * dy;
    }

    /// Pan by a pointer movement of `dx`, `dy` pixels. Applied on the next
    /// `update` where the camera orientation is known.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pending_pan += Vector2::new(dx, dy) * self.config.pan_speed;
    }

    /// Zoom one step in for a positive direction, one step out for a negative.
    pub fn dolly(&mut self, direction: f32) {
        let step = 0.95f32.powf(self.config.zoom_speed);
        if direction > 0.0 {
            self.scale *= step;
        } else if direction < 0.0 {
            self.scale /= step;
        }
    }

    /// Zoom by `steps` wheel notches, in for positive values. Fractional
    /// steps come from trackpads reporting pixels.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95f32.powf(self.config.zoom_speed * steps);
    }

    /// Apply the recorded input to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera, fovy: Deg<f32>, dt: Duration) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.config.auto_rotate && self.drag == Drag::None {
            let angle = 2.0 * PI / 60.0 * self.config.auto_rotate_speed * dt.as_secs_f32();
            self.delta_theta -= angle;
        }

        self.apply_pending_pan(camera, spherical.radius, fovy);

        let factor = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        spherical.phi = spherical
            .phi
            .clamp(self.config.min_polar_angle, self.config.max_polar_angle);
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        let previous_position = camera.position;
        let previous_target = self.target;
        self.target += self.pan_offset * factor;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - factor;
            self.delta_phi *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - previous_position).magnitude2() > EPS
            || (self.target - previous_target).magnitude2() > EPS
    }

    /// Turn pixel motion into a world space offset in the camera plane. The
    /// scale makes the target follow the pointer at the target's depth.
    fn apply_pending_pan(&mut self, camera: &Camera, distance: f32, fovy: Deg<f32>) {
        if self.pending_pan == Vector2::zero() {
            return;
        }
        let half_fov: Rad<f32> = (fovy / 2.0).into();
        let target_distance = distance * half_fov.0.tan();
        let per_pixel = 2.0 * target_distance / self.viewport_height;
        let (right, up) = camera.right_and_up();
        self.pan_offset += right * (-self.pending_pan.x * per_pixel) + up * (self.pending_pan.y * per_pixel);
        self.pending_pan = Vector2::zero();
    }
}

/// Wheel motion in notches. Pixel deltas are spread over
/// [`PIXELS_PER_ZOOM_STEP`] so a trackpad gesture zooms like a few notches.
pub fn wheel_steps(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_ZOOM_STEP,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, MetricSpace};

    use super::*;

    const FOV: Deg<f32> = Deg(70.0);

    fn setup(config: OrbitConfig) -> (OrbitController, Camera) {
        let camera = Camera::new(Point3::new(25.0, 10.0, 23.0), Point3::origin());
        (OrbitController::new(Point3::origin(), config, 600), camera)
    }

    fn distance(camera: &Camera) -> f32 {
        camera.position.distance(Point3::origin())
    }

    #[test]
    fn spherical_round_trip_preserves_offset() {
        let offset = Vector3::new(25.0, 10.0, 23.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).magnitude() < 1e-4);
    }

    #[test]
    fn no_input_leaves_the_camera_alone() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let before = camera.position;
        assert!(!controller.update(&mut camera, FOV, Duration::from_millis(16)));
        assert!(camera.position.distance(before) < 1e-4);
    }

    #[test]
    fn rotating_keeps_the_distance() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let before = distance(&camera);
        controller.rotate(120.0, -40.0);
        assert!(controller.update(&mut camera, FOV, Duration::ZERO));
        assert!((distance(&camera) - before).abs() < 1e-3);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn full_height_drag_turns_once_around() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let before = camera.position;
        controller.rotate(600.0, 0.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!(camera.position.distance(before) < 1e-3);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        controller.rotate(0.0, 10_000.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        let spherical = Spherical::from_offset(camera.position - Point3::origin());
        assert!(spherical.phi > 0.0 && spherical.phi < PI);
        assert!(camera.position.x.is_finite());

        let config = OrbitConfig {
            min_polar_angle: PI / 4.0,
            max_polar_angle: PI / 2.0,
            ..OrbitConfig::default()
        };
        let (mut controller, mut camera) = setup(config);
        controller.rotate(0.0, -10_000.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        let spherical = Spherical::from_offset(camera.position - Point3::origin());
        assert!((spherical.phi - PI / 2.0).abs() < 1e-4);
    }

    #[test]
    fn wheel_scales_the_distance() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let before = distance(&camera);
        controller.dolly(1.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!((distance(&camera) - before * 0.95).abs() < 1e-3);

        controller.dolly(-1.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!((distance(&camera) - before).abs() < 1e-3);
    }

    #[test]
    fn camera_stays_off_the_pole() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        controller.rotate(0.0, 10_000.0);
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!(camera.position.x.abs() > 1e-3 || camera.position.z.abs() > 1e-3);
        // Another frame without input keeps the view where it was
        let before = camera.position;
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!(camera.position.distance(before) < 1e-2);
    }

    #[test]
    fn pixel_wheel_deltas_zoom_in_fractions_of_a_step() {
        let pixels = MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 10.0));
        assert!((wheel_steps(&pixels) - 0.1).abs() < 1e-6);
        assert_eq!(wheel_steps(&MouseScrollDelta::LineDelta(0.0, -1.0)), -1.0);

        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let before = distance(&camera);
        // Ten small trackpad events add up to one notch
        for _ in 0..10 {
            controller.zoom(wheel_steps(&pixels));
        }
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!((distance(&camera) - before * 0.95).abs() < 1e-3);
    }

    #[test]
    fn distance_is_clamped() {
        let config = OrbitConfig {
            min_distance: 20.0,
            max_distance: 40.0,
            ..OrbitConfig::default()
        };
        let (mut controller, mut camera) = setup(config);
        for _ in 0..100 {
            controller.dolly(1.0);
        }
        controller.update(&mut camera, FOV, Duration::ZERO);
        assert!((distance(&camera) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn panning_moves_target_and_camera_together() {
        let (mut controller, mut camera) = setup(OrbitConfig::default());
        let offset_before = camera.position - Point3::origin();
        controller.pan(50.0, 0.0);
        assert!(controller.update(&mut camera, FOV, Duration::ZERO));
        assert!(controller.target.distance(Point3::origin()) > 0.1);
        let offset_after = camera.position - controller.target;
        assert!((offset_after - offset_before).magnitude() < 1e-3);
        assert_eq!(camera.target, controller.target);
    }

    #[test]
    fn auto_rotate_advances_with_time() {
        let config = OrbitConfig {
            auto_rotate: true,
            ..OrbitConfig::default()
        };
        let (mut controller, mut camera) = setup(config);
        let before = Spherical::from_offset(camera.position - Point3::origin());
        assert!(controller.update(&mut camera, FOV, Duration::from_secs(1)));
        let after = Spherical::from_offset(camera.position - Point3::origin());
        // two turns per minute
        let expected = 2.0 * PI / 30.0;
        let turned = (before.theta - after.theta).rem_euclid(2.0 * PI);
        assert!((turned - expected).abs() < 1e-3);
    }

    #[test]
    fn damping_spreads_motion_over_frames() {
        let config = OrbitConfig {
            enable_damping: true,
            damping_factor: 0.1,
            ..OrbitConfig::default()
        };
        let (mut controller, mut camera) = setup(config);
        controller.rotate(60.0, 0.0);
        assert!(controller.update(&mut camera, FOV, Duration::ZERO));
        let first = camera.position;
        assert!(controller.update(&mut camera, FOV, Duration::ZERO));
        assert!(camera.position.distance(first) > 1e-3);
    }
}
