//! View frustum extracted from a view-projection matrix.

use glam::{Mat4, Vec3, Vec4};

/// Six normalized planes (left, right, bottom, top, near, far) facing inward.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Builds the frustum for a projection with 0..1 depth, as produced by
    /// `Mat4::perspective_lh`.
    pub fn from_view_proj(view_proj: &Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        let planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near
            r3 - r2, // far
        ]
        .map(normalize_plane);

        Self { planes }
    }

    /// True unless the sphere lies entirely outside one of the planes.
    pub fn sphere_visible(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > 0.0 {
        plane / len
    } else {
        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_z() -> Frustum {
        let view = Mat4::look_to_lh(Vec3::ZERO, Vec3::Z, Vec3::Y);
        let proj = Mat4::perspective_lh(89.0_f32.to_radians(), 16.0 / 9.0, 0.1, 80_000.0);
        Frustum::from_view_proj(&(proj * view))
    }

    #[test]
    fn test_sphere_in_front_is_visible() {
        let frustum = looking_down_z();
        assert!(frustum.sphere_visible(Vec3::new(0.0, 0.0, 100.0), 5.0));
    }

    #[test]
    fn test_sphere_behind_is_culled() {
        let frustum = looking_down_z();
        assert!(!frustum.sphere_visible(Vec3::new(0.0, 0.0, -100.0), 5.0));
    }

    #[test]
    fn test_sphere_straddling_edge_is_visible() {
        let frustum = looking_down_z();
        // Far off to the side but large enough to poke into view
        assert!(frustum.sphere_visible(Vec3::new(300.0, 0.0, 100.0), 250.0));
        assert!(!frustum.sphere_visible(Vec3::new(3000.0, 0.0, 100.0), 5.0));
    }

    #[test]
    fn test_beyond_far_plane_is_culled() {
        let frustum = looking_down_z();
        assert!(!frustum.sphere_visible(Vec3::new(0.0, 0.0, 90_000.0), 5.0));
    }
}
