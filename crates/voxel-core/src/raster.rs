//! Edge-function triangle rasterizer.
//!
//! Follows the GPU rules closely enough that the two passes of the software
//! compositor cover exactly the same pixels: samples at pixel centers,
//! top-left fill rule, perspective-correct attribute interpolation and
//! screen-linear depth. Triangles with a vertex behind the eye are dropped
//! instead of clipped.

use glam::{Vec2, Vec3, Vec4};

use crate::pass::{CullFace, FrontFace};

/// Smallest clip-space `w` accepted for a vertex.
const MIN_CLIP_W: f32 = 1e-6;

/// Size of the pixel grid being rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Maps normalized device coordinates to window coordinates (origin at
    /// the top-left corner, y down).
    #[allow(clippy::cast_precision_loss)]
    pub fn to_window(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
        )
    }
}

/// A vertex after the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    /// Clip-space position.
    pub clip: Vec4,
    /// Interpolated attribute.
    pub attribute: Vec3,
}

/// A covered pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Pixel column.
    pub x: u32,
    /// Pixel row, counted from the top.
    pub y: u32,
    /// Depth in `[0, 1]`.
    pub depth: f32,
    /// Perspective-correct attribute.
    pub attribute: Vec3,
}

struct ScreenVertex {
    pos: Vec2,
    depth: f32,
    inv_w: f32,
    attribute_over_w: Vec3,
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Whether pixel centers exactly on the edge `a -> b` belong to the triangle.
fn owns_edge(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x < 0.0)
}

fn covers(w: f32, owned: bool) -> bool {
    w > 0.0 || (w == 0.0 && owned)
}

/// Rasterizes one triangle, calling `emit` for every covered pixel.
///
/// Facing is decided from the winding in normalized device coordinates
/// (y up), as on the GPU.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::similar_names
)]
pub fn rasterize_triangle(
    vertices: [ClipVertex; 3],
    viewport: Viewport,
    cull: CullFace,
    front_face: FrontFace,
    mut emit: impl FnMut(Fragment),
) {
    if viewport.width == 0 || viewport.height == 0 {
        return;
    }
    if vertices.iter().any(|v| !(v.clip.w > MIN_CLIP_W)) {
        return;
    }

    let ndc = vertices.map(|v| v.clip.truncate() / v.clip.w);
    let ndc_area = (ndc[1].truncate() - ndc[0].truncate())
        .perp_dot(ndc[2].truncate() - ndc[0].truncate());
    if ndc_area == 0.0 || !ndc_area.is_finite() {
        return;
    }
    let is_front = match front_face {
        FrontFace::Ccw => ndc_area > 0.0,
        FrontFace::Cw => ndc_area < 0.0,
    };
    let culled = match cull {
        CullFace::Front => is_front,
        CullFace::Back => !is_front,
    };
    if culled {
        return;
    }

    let mut screen: [ScreenVertex; 3] = std::array::from_fn(|i| {
        let inv_w = 1.0 / vertices[i].clip.w;
        ScreenVertex {
            pos: viewport.to_window(ndc[i].truncate()),
            depth: ndc[i].z,
            inv_w,
            attribute_over_w: vertices[i].attribute * inv_w,
        }
    });

    // Window space flips y; wind every kept triangle the same way so shared
    // silhouette edges produce identical coverage for front and back faces.
    let mut area = edge(screen[0].pos, screen[1].pos, screen[2].pos);
    if area < 0.0 {
        screen.swap(1, 2);
        area = -area;
    }
    let [v0, v1, v2] = &screen;

    let min = v0.pos.min(v1.pos).min(v2.pos);
    let max = v0.pos.max(v1.pos).max(v2.pos);
    let x_start = min.x.floor().max(0.0) as u32;
    let y_start = min.y.floor().max(0.0) as u32;
    let x_end = (max.x.ceil().max(0.0) as u32).min(viewport.width);
    let y_end = (max.y.ceil().max(0.0) as u32).min(viewport.height);

    let own0 = owns_edge(v1.pos, v2.pos);
    let own1 = owns_edge(v2.pos, v0.pos);
    let own2 = owns_edge(v0.pos, v1.pos);

    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(v1.pos, v2.pos, p);
            let w1 = edge(v2.pos, v0.pos, p);
            let w2 = edge(v0.pos, v1.pos, p);
            if !(covers(w0, own0) && covers(w1, own1) && covers(w2, own2)) {
                continue;
            }

            let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
            let depth = l0 * v0.depth + l1 * v1.depth + l2 * v2.depth;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            let inv_w = l0 * v0.inv_w + l1 * v1.inv_w + l2 * v2.inv_w;
            let attribute = (l0 * v0.attribute_over_w
                + l1 * v1.attribute_over_w
                + l2 * v2.attribute_over_w)
                / inv_w;

            emit(Fragment {
                x,
                y,
                depth,
                attribute,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn vertex(x: f32, y: f32) -> ClipVertex {
        ClipVertex {
            clip: Vec4::new(x, y, 0.5, 1.0),
            attribute: Vec3::new(x, y, 0.0),
        }
    }

    fn coverage(tris: &[[ClipVertex; 3]], cull: CullFace) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for tri in tris {
            rasterize_triangle(*tri, Viewport::new(16, 16), cull, FrontFace::Ccw, |f| {
                out.push((f.x, f.y));
            });
        }
        out
    }

    #[test]
    fn test_viewport_mapping() {
        let viewport = Viewport::new(100, 50);
        assert_eq!(viewport.to_window(Vec2::new(-1.0, 1.0)), Vec2::ZERO);
        assert_eq!(viewport.to_window(Vec2::new(1.0, -1.0)), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_culling_by_winding() {
        let ccw = [vertex(-1.0, -1.0), vertex(1.0, -1.0), vertex(-1.0, 1.0)];
        let cw = [ccw[0], ccw[2], ccw[1]];
        assert!(!coverage(&[ccw], CullFace::Back).is_empty());
        assert!(coverage(&[ccw], CullFace::Front).is_empty());
        assert!(coverage(&[cw], CullFace::Back).is_empty());
        assert!(!coverage(&[cw], CullFace::Front).is_empty());
    }

    #[test]
    fn test_shared_edge_covered_once() {
        // Full-screen quad split along the diagonal, which passes exactly
        // through pixel centers.
        let a = vertex(-1.0, -1.0);
        let b = vertex(1.0, -1.0);
        let c = vertex(1.0, 1.0);
        let d = vertex(-1.0, 1.0);
        let pixels = coverage(&[[a, b, c], [a, c, d]], CullFace::Back);
        let unique: HashSet<_> = pixels.iter().copied().collect();
        assert_eq!(pixels.len(), 256);
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_front_and_back_silhouettes_match() {
        let a = vertex(-0.6, -0.7);
        let b = vertex(0.8, -0.2);
        let c = vertex(0.1, 0.9);
        let front: HashSet<_> = coverage(&[[a, b, c]], CullFace::Back).into_iter().collect();
        let back: HashSet<_> = coverage(&[[a, c, b]], CullFace::Front).into_iter().collect();
        assert!(!front.is_empty());
        assert_eq!(front, back);
    }

    #[test]
    fn test_perspective_correct_attribute() {
        // Same triangle in NDC, but one vertex twice as far away.
        let mk = |x: f32, y: f32, w: f32, attr: f32| ClipVertex {
            clip: Vec4::new(x * w, y * w, 0.5 * w, w),
            attribute: Vec3::splat(attr),
        };
        let tri = [mk(-1.0, -1.0, 1.0, 0.0), mk(1.0, -1.0, 2.0, 1.0), mk(-1.0, 1.0, 1.0, 0.0)];
        let mut mid = None;
        rasterize_triangle(tri, Viewport::new(2, 2), CullFace::Back, FrontFace::Ccw, |f| {
            if (f.x, f.y) == (0, 1) {
                mid = Some(f.attribute.x);
            }
        });
        // Screen-space weight of the far vertex is 0.25; perspective pulls
        // the attribute below that.
        let value = mid.unwrap();
        assert!(value > 0.0 && value < 0.25, "{value}");
        assert!((value - 1.0 / 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_vertex_behind_eye_dropped() {
        let mut tri = [vertex(-1.0, -1.0), vertex(1.0, -1.0), vertex(-1.0, 1.0)];
        tri[1].clip.w = -1.0;
        assert!(coverage(&[tri], CullFace::Back).is_empty());
    }
}
