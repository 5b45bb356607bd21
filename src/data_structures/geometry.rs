//! Procedural geometry: UV spheres and unit planes.
//!
//! Geometry lives on the CPU until [`crate::resources::mesh::upload`] turns it
//! into a [`crate::data_structures::model::Mesh`]. Tangents are left at zero
//! here and filled in during upload.

use std::f32::consts::PI;

use crate::data_structures::model::ModelVertex;

/// Indexed triangle list with counter-clockwise front faces.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A UV sphere centred at the origin.
///
/// Vertices form a `(width_segments + 1) x (height_segments + 1)` grid. The
/// seam column is duplicated so texture coordinates can run from 0 to 1 and
/// the poles collapse one row of vertices into a point each. Triangles that
/// would be degenerate at the poles are skipped.
#[derive(Clone, Debug)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn build(&self) -> Geometry {
        let w = self.width_segments;
        let h = self.height_segments;
        let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);

        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            // Shift the pole texels to the middle of their segment
            let u_offset = if iy == 0 {
                0.5 / w as f32
            } else if iy == h {
                -0.5 / w as f32
            } else {
                0.0
            };
            let theta = v * PI;
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let phi = u * 2.0 * PI;
                let position = [
                    -self.radius * phi.cos() * theta.sin(),
                    self.radius * theta.cos(),
                    self.radius * phi.sin() * theta.sin(),
                ];
                let length = self.radius.abs().max(f32::EPSILON);
                vertices.push(ModelVertex {
                    position,
                    // wgpu samples with v = 0 at the top row of the image
                    tex_coords: [u + u_offset, v],
                    normal: [
                        position[0] / length,
                        position[1] / length,
                        position[2] / length,
                    ],
                    tangent: [0.0; 3],
                    bitangent: [0.0; 3],
                });
            }
        }

        let row = w + 1;
        let mut indices = Vec::new();
        for iy in 0..h {
            for ix in 0..w {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Geometry { vertices, indices }
    }
}

/// A rectangle in the z = 0 plane facing +z, centred at the origin.
#[derive(Clone, Debug)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn build(&self) -> Geometry {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let corner = |x: f32, y: f32, u: f32, v: f32| ModelVertex {
            position: [x, y, 0.0],
            tex_coords: [u, v],
            normal: [0.0, 0.0, 1.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        };
        let vertices = vec![
            corner(-hw, hh, 0.0, 0.0),
            corner(hw, hh, 1.0, 0.0),
            corner(-hw, -hh, 0.0, 1.0),
            corner(hw, -hh, 1.0, 1.0),
        ];
        let indices = vec![0, 2, 1, 2, 3, 1];
        Geometry { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    fn face_normal(g: &Geometry, tri: &[u32]) -> Vector3<f32> {
        let p = |i: u32| Vector3::from(g.vertices[i as usize].position);
        let (p0, p1, p2) = (p(tri[0]), p(tri[1]), p(tri[2]));
        (p1 - p0).cross(p2 - p0)
    }

    #[test]
    fn sphere_grid_has_expected_counts() {
        let g = SphereGeometry::new(15.0, 30, 30).build();
        assert_eq!(g.vertices.len(), 31 * 31);
        // two triangles per cell except one per cell on the polar rows
        assert_eq!(g.triangle_count(), 30 * (2 * 30 - 2));
        assert!(g.indices.iter().all(|&i| (i as usize) < g.vertices.len()));
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let g = SphereGeometry::new(15.25, 30, 30).build();
        for v in &g.vertices {
            let p = Vector3::from(v.position);
            assert!((p.magnitude() - 15.25).abs() < 1e-3);
            let n = Vector3::from(v.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-4);
            assert!(v.tex_coords[1] >= 0.0 && v.tex_coords[1] <= 1.0);
            assert!(v.tex_coords[0] >= -0.5 / 30.0 && v.tex_coords[0] <= 1.0 + 0.5 / 30.0);
        }
    }

    #[test]
    fn sphere_poles_are_on_the_y_axis() {
        let g = SphereGeometry::new(2.0, 8, 6).build();
        let top = g.vertices[0].position;
        let bottom = g.vertices.last().map(|v| v.position).unwrap_or_default();
        assert!((top[1] - 2.0).abs() < 1e-5);
        assert!((bottom[1] + 2.0).abs() < 1e-5);
        assert_eq!(g.vertices[0].tex_coords[1], 0.0);
    }

    #[test]
    fn sphere_triangles_face_outwards() {
        let g = SphereGeometry::new(1.0, 12, 8).build();
        for tri in g.indices.chunks(3) {
            let n = face_normal(&g, tri);
            let centre = (Vector3::from(g.vertices[tri[0] as usize].position)
                + Vector3::from(g.vertices[tri[1] as usize].position)
                + Vector3::from(g.vertices[tri[2] as usize].position))
                / 3.0;
            assert!(n.dot(centre) > 0.0, "triangle {:?} faces inwards", tri);
        }
    }

    #[test]
    fn segment_counts_are_clamped() {
        let sphere = SphereGeometry::new(1.0, 1, 0);
        assert_eq!(sphere.width_segments, 3);
        assert_eq!(sphere.height_segments, 2);
        let g = sphere.build();
        assert_eq!(g.vertices.len(), 4 * 3);
        assert_eq!(g.triangle_count(), 3 * 2);
    }

    #[test]
    fn plane_faces_the_viewer() {
        let g = PlaneGeometry::new(1.0, 1.0).build();
        assert_eq!(g.vertices.len(), 4);
        assert_eq!(g.indices.len(), 6);
        for tri in g.indices.chunks(3) {
            assert!(face_normal(&g, tri).z > 0.0);
        }
        let xs: Vec<f32> = g.vertices.iter().map(|v| v.position[0]).collect();
        assert!(xs.iter().all(|x| x.abs() == 0.5));
    }
}
