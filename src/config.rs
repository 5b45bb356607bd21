//! Scene parameters.
//!
//! Every literal the globe scene is built from lives in [`SceneConfig`]. The
//! `Default` implementation reproduces the classic scene: a 15 unit Earth with
//! a slightly larger cloud shell, lit by a white directional light from the
//! upper right and a dim ambient term, viewed through a 70° camera, in front of
//! a starfield. Callers can tweak single values through the `with_*` setters
//! before handing the config to [`crate::flow::run`].

use cgmath::{Point3, Vector2};

/// Linear RGB colour with components in `0.0..=1.0`. Hex literals are
/// treated as sRGB, see [`Colour::from_hex`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0);
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a 24-bit `0xRRGGBB` literal. Literals are display
    /// (sRGB) values and are decoded to linear here, so they come out of the
    /// sRGB surface as written.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// sRGB transfer function, decoding direction.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB transfer function, encoding direction. This is what an sRGB target
/// applies to the linear values shaders write.
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl From<Colour> for wgpu::Color {
    fn from(c: Colour) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

#[derive(Clone, Debug)]
pub struct SphereConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

#[derive(Clone, Debug)]
pub struct EarthConfig {
    pub sphere: SphereConfig,
    pub diffuse_map: String,
    pub normal_map: String,
    pub normal_scale: Vector2<f32>,
    pub specular_map: String,
    pub specular: Colour,
    pub shininess: f32,
}

#[derive(Clone, Debug)]
pub struct CloudConfig {
    pub sphere: SphereConfig,
    pub alpha_map: String,
    pub specular: Colour,
    pub shininess: f32,
}

#[derive(Clone, Debug)]
pub struct LightConfig {
    pub directional_colour: Colour,
    pub directional_intensity: f32,
    pub directional_position: Point3<f32>,
    pub directional_target: Point3<f32>,
    pub ambient_colour: Colour,
}

#[derive(Clone, Debug)]
pub struct BackgroundConfig {
    pub texture: String,
    /// z position of the orthographic background camera.
    pub camera_z: f32,
    pub near: f32,
    pub far: f32,
    /// z position of the background plane.
    pub plane_z: f32,
}

#[derive(Clone, Debug)]
pub struct OrbitConfig {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    /// Full turns per minute when `auto_rotate` is on.
    pub auto_rotate_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            enable_damping: false,
            damping_factor: 0.05,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub clear_colour: Colour,
    pub camera: CameraConfig,
    pub earth: EarthConfig,
    pub cloud: CloudConfig,
    pub light: LightConfig,
    pub background: BackgroundConfig,
    pub orbit: OrbitConfig,
    /// Opacity of the final copy-to-screen pass.
    pub copy_opacity: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_colour: Colour::BLACK,
            camera: CameraConfig {
                fov_y: 70.0,
                near: 1.0,
                far: 1000.0,
                position: Point3::new(25.0, 10.0, 23.0),
                target: Point3::new(0.0, 0.0, 0.0),
            },
            earth: EarthConfig {
                sphere: SphereConfig {
                    radius: 15.0,
                    width_segments: 30,
                    height_segments: 30,
                },
                diffuse_map: "earthmap4k.jpg".to_string(),
                normal_map: "earth_normalmap_flat4k.jpg".to_string(),
                normal_scale: Vector2::new(0.5, 0.7),
                specular_map: "earthspec4k.jpg".to_string(),
                specular: Colour::from_hex(0x262626),
                shininess: 30.0,
            },
            cloud: CloudConfig {
                sphere: SphereConfig {
                    radius: 15.25,
                    width_segments: 30,
                    height_segments: 30,
                },
                alpha_map: "fair_clouds_4k.png".to_string(),
                specular: Colour::from_hex(0x111111),
                shininess: 30.0,
            },
            light: LightConfig {
                directional_colour: Colour::from_hex(0xffffff),
                directional_intensity: 1.0,
                directional_position: Point3::new(20.0, 10.0, -10.0),
                directional_target: Point3::new(0.0, 0.0, 0.0),
                ambient_colour: Colour::from_hex(0x111111),
            },
            background: BackgroundConfig {
                texture: "starry_background.jpg".to_string(),
                camera_z: 50.0,
                near: -10000.0,
                far: 10000.0,
                plane_z: -100.0,
            },
            orbit: OrbitConfig::default(),
            copy_opacity: 1.0,
        }
    }
}

impl SceneConfig {
    pub fn with_camera_position(mut self, position: Point3<f32>) -> Self {
        self.camera.position = position;
        self
    }

    pub fn with_auto_rotate(mut self, turns_per_minute: f32) -> Self {
        self.orbit.auto_rotate = true;
        self.orbit.auto_rotate_speed = turns_per_minute;
        self
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.orbit.enable_damping = true;
        self.orbit.damping_factor = factor;
        self
    }

    pub fn with_clear_colour(mut self, colour: Colour) -> Self {
        self.clear_colour = colour;
        self
    }

    /// Texture file names in the order they are loaded at startup.
    pub fn texture_files(&self) -> [&str; 5] {
        [
            self.earth.diffuse_map.as_str(),
            self.earth.normal_map.as_str(),
            self.earth.specular_map.as_str(),
            self.cloud.alpha_map.as_str(),
            self.background.texture.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_are_split_into_channels() {
        let c = Colour::from_hex(0x262626);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);

        let c = Colour::from_hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 0.2158605).abs() < 1e-5);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn hex_colours_show_as_written_on_an_srgb_target() {
        let on_screen = |linear: f32| (linear_to_srgb(linear) * 255.0).round() as u8;
        let ambient = Colour::from_hex(0x111111);
        assert!(ambient.r < 0x11 as f32 / 255.0);
        assert_eq!(on_screen(ambient.r), 0x11);
        assert_eq!(on_screen(Colour::from_hex(0x262626).g), 0x26);
        for v in [0u32, 1, 10, 0x80, 0xfe, 0xff] {
            assert_eq!(on_screen(Colour::from_hex(v).b), v as u8);
        }
    }

    #[test]
    fn defaults_describe_the_globe_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.earth.sphere.radius, 15.0);
        assert_eq!(config.cloud.sphere.radius, 15.25);
        assert!(config.cloud.sphere.radius > config.earth.sphere.radius);
        assert_eq!(config.camera.fov_y, 70.0);
        assert_eq!(config.camera.position, Point3::new(25.0, 10.0, 23.0));
        assert_eq!(config.light.ambient_colour, Colour::from_hex(0x111111));
        assert_eq!(config.texture_files().len(), 5);
        assert!(!config.orbit.auto_rotate);
    }

    #[test]
    fn setters_override_single_values() {
        let config = SceneConfig::default()
            .with_auto_rotate(4.0)
            .with_clear_colour(Colour::WHITE);
        assert!(config.orbit.auto_rotate);
        assert_eq!(config.orbit.auto_rotate_speed, 4.0);
        assert_eq!(config.clear_colour, Colour::WHITE);
        assert_eq!(config.earth.shininess, 30.0);
    }
}
