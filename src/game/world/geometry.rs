//! Hit-testing primitives for egg pickup.

use glam::{Vec2, Vec3};

/// A ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Distance along the ray to the first point inside the sphere, or `None`
    /// when the sphere is missed or lies entirely behind the origin.
    pub fn intersect_sphere(&self, sphere: &Sphere) -> Option<f32> {
        let to_center = sphere.center - self.origin;
        let c = to_center.length_squared() - sphere.radius * sphere.radius;
        if c <= 0.0 {
            // Origin inside the sphere
            return Some(0.0);
        }
        let b = to_center.dot(self.direction);
        if b < 0.0 {
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        Some(b - discriminant.sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Distance in the ground plane, ignoring height.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_on_axis_is_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 100.0), 10.0);
        let t = ray.intersect_sphere(&sphere).unwrap();
        assert!((t - 90.0).abs() < 1e-3);
        assert!(((ray.origin + ray.direction * t).z - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_sphere_off_axis_is_missed() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let sphere = Sphere::new(Vec3::new(20.0, 0.0, 100.0), 10.0);
        assert_eq!(ray.intersect_sphere(&sphere), None);
    }

    #[test]
    fn test_sphere_behind_is_missed() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -100.0), 10.0);
        assert_eq!(ray.intersect_sphere(&sphere), None);
    }

    #[test]
    fn test_origin_inside_is_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        let sphere = Sphere::new(Vec3::ZERO, 5.0);
        assert_eq!(ray.intersect_sphere(&sphere), Some(0.0));
    }

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 100.0, 0.0);
        let b = Vec3::new(3.0, -50.0, 4.0);
        assert_eq!(planar_distance(a, b), 5.0);
    }
}
