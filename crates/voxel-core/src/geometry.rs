//! The unit cube rasterized to start and end every ray.

use glam::Vec3;

/// Index triples for the 12 cube triangles, counter-clockwise when viewed
/// from outside the cube.
///
/// Vertex `i` sits at `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
const CUBE_INDICES: [u16; 36] = [
    1, 3, 7, 1, 7, 5, // +X
    0, 4, 6, 0, 6, 2, // -X
    2, 6, 7, 2, 7, 3, // +Y
    0, 1, 5, 0, 5, 4, // -Y
    4, 5, 7, 4, 7, 6, // +Z
    0, 2, 3, 0, 3, 1, // -Z
];

/// Bounding geometry of the volume: the cube `[0, 1]^3` in model space.
///
/// A vertex position doubles as the normalized volume coordinate it maps
/// to, so the rasterizer interpolates ray entry and exit points for free.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingGeometry {
    vertices: [Vec3; 8],
    indices: [u16; 36],
}

impl BoundingGeometry {
    /// Builds the unit cube.
    pub fn build() -> Self {
        let vertices = std::array::from_fn(|i| {
            Vec3::new(
                (i & 1) as f32,
                ((i >> 1) & 1) as f32,
                ((i >> 2) & 1) as f32,
            )
        });
        Self {
            vertices,
            indices: CUBE_INDICES,
        }
    }

    /// The 8 corner positions.
    pub fn vertices(&self) -> &[Vec3; 8] {
        &self.vertices
    }

    /// The 36 triangle indices.
    pub fn indices(&self) -> &[u16; 36] {
        &self.indices
    }

    /// Iterates over the 12 triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [0, 1, 2].map(|k| self.vertices[t[k] as usize]))
    }

    /// Unit normal implied by the winding of a triangle.
    pub fn outward_normal(tri: &[Vec3; 3]) -> Vec3 {
        (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero()
    }
}

impl Default for BoundingGeometry {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let cube = BoundingGeometry::build();
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.indices().len(), 36);
        assert_eq!(cube.triangles().count(), 12);
        assert!(cube.indices().iter().all(|&i| i < 8));
    }

    #[test]
    fn test_vertices_span_unit_cube() {
        let cube = BoundingGeometry::build();
        for v in cube.vertices() {
            for c in v.to_array() {
                assert!(c == 0.0 || c == 1.0);
            }
        }
        assert_eq!(cube.vertices()[0], Vec3::ZERO);
        assert_eq!(cube.vertices()[7], Vec3::ONE);
    }

    #[test]
    fn test_winding_is_outward() {
        let cube = BoundingGeometry::build();
        let center = Vec3::splat(0.5);
        for tri in cube.triangles() {
            let normal = BoundingGeometry::outward_normal(&tri);
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(normal.dot(centroid - center) > 0.0, "inward triangle {tri:?}");
            // Every triangle lies in one face plane.
            assert_eq!(normal.abs().max_element(), 1.0);
        }
    }

    #[test]
    fn test_each_face_has_two_triangles() {
        let cube = BoundingGeometry::build();
        let mut counts = std::collections::HashMap::new();
        for tri in cube.triangles() {
            let n = BoundingGeometry::outward_normal(&tri).to_array().map(|c| c as i32);
            *counts.entry(n).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&c| c == 2));
    }
}
