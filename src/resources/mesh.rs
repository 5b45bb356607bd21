use wgpu::util::DeviceExt;

use crate::data_structures::{geometry::Geometry, model};

/**
 * Generated geometry doesn't come with tangents and bitangents so they have to be calculated
 * for normal maps to work correctly.
 */
pub fn compute_tangents(geometry: &mut Geometry) {
    let vertices = &mut geometry.vertices;
    let mut triangles_included = vec![0; vertices.len()];

    // Calculate tangents and bitangets. We're going to
    // use the triangles, so we need to loop through the
    // indices in chunks of 3
    for c in geometry.indices.chunks_exact(3) {
        let v0 = vertices[c[0] as usize];
        let v1 = vertices[c[1] as usize];
        let v2 = vertices[c[2] as usize];

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;

        // This will give us a direction to calculate the
        // tangent and bitangent
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving the following system of equations gives the tangent and bitangent:
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // We flip the bitangent to enable right-handed normal
        // maps with wgpu texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        // We'll use the same tangent/bitangent for each vertex in the triangle
        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
            // Used to average the tangents/bitangents
            triangles_included[i as usize] += 1;
        }
    }

    // Average the tangents/bitangents. The unused seam vertex at each pole keeps zeros.
    for (i, n) in triangles_included.into_iter().enumerate() {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        let v = &mut vertices[i];
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

/// Compute tangents and upload the geometry into vertex and index buffers.
pub fn upload(device: &wgpu::Device, name: &str, mut geometry: Geometry) -> model::Mesh {
    compute_tangents(&mut geometry);

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(&geometry.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(&geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: geometry.indices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;
    use crate::data_structures::geometry::{PlaneGeometry, SphereGeometry};

    #[test]
    fn plane_tangents_follow_the_texture_axes() {
        let mut plane = PlaneGeometry::new(2.0, 2.0).build();
        compute_tangents(&mut plane);
        for v in &plane.vertices {
            let t = Vector3::from(v.tangent).normalize();
            let b = Vector3::from(v.bitangent).normalize();
            assert!((t - Vector3::unit_x()).magnitude() < 1e-5, "{:?}", v.tangent);
            assert!((b - Vector3::unit_y()).magnitude() < 1e-5, "{:?}", v.bitangent);
        }
    }

    #[test]
    fn sphere_tangents_are_finite_and_tangential() {
        let mut sphere = SphereGeometry::new(15.0, 30, 30).build();
        compute_tangents(&mut sphere);
        for v in &sphere.vertices {
            let t = Vector3::from(v.tangent);
            assert!(t.x.is_finite() && t.y.is_finite() && t.z.is_finite());
            if t.magnitude() > 1e-3 {
                let n = Vector3::from(v.normal);
                assert!(t.normalize().dot(n).abs() < 0.2);
            }
        }
    }
}
