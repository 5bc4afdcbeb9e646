use glam::{Mat4, Vec3};

pub const FIELD_OF_VIEW_DEGREES: f32 = 89.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 80_000.0;

/// First-person camera in a left-handed world with +y up. Yaw 0 looks down +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Camera at `position` looking along `heading` (need not be normalized).
    pub fn from_heading(position: Vec3, heading: Vec3) -> Self {
        let heading = heading.normalize_or_zero();
        if heading == Vec3::ZERO {
            return Self::new(position);
        }
        Self {
            position,
            yaw: heading.x.atan2(heading.z),
            pitch: heading.y.clamp(-1.0, 1.0).asin(),
        }
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-1.54, 1.54); // ~+-88 degrees
    }

    /// Unit view direction.
    pub fn heading(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, cy * cp)
    }

    /// Heading flattened onto the ground plane.
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(sy, 0.0, cy)
    }

    pub fn right(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(cy, 0.0, -sy)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_lh(self.position, self.heading(), Vec3::Y)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        projection(aspect) * self.view()
    }
}

pub fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_lh(FIELD_OF_VIEW_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

/// Fixed camera used for full-screen billboards and the HUD: at (0, 0, 1)
/// looking down -z.
pub fn overlay_view_proj(aspect: f32) -> Mat4 {
    projection(aspect) * Mat4::look_to_lh(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z, Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_round_trips() {
        let heading = Vec3::new(-0.07, -0.05, 1.0).normalize();
        let camera = Camera::from_heading(Vec3::ZERO, heading);
        assert!(camera.heading().distance(heading) < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(0.0, 10.0);
        assert_eq!(camera.pitch, 1.54);
        camera.rotate(0.0, -20.0);
        assert_eq!(camera.pitch, -1.54);
    }

    #[test]
    fn test_right_is_perpendicular_and_flat() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(0.7, 0.3);
        assert!(camera.right().dot(camera.forward()).abs() < 1e-6);
        assert_eq!(camera.right().y, 0.0);
        // Yaw 0 looks down +z, so right is +x
        assert_eq!(Camera::new(Vec3::ZERO).right(), Vec3::X);
    }

    #[test]
    fn test_view_places_target_in_front() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, -10.0));
        let p = camera.view_proj(1.0).project_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&p.z));
    }
}
