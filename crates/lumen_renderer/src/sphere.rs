//! Sphere primitive for ray tracing.

use crate::{HitRecord, Hittable, Material, Ray};
use lumen_math::{Interval, Vec3};

/// A sphere primitive.
pub struct Sphere<M: Material> {
    center: Vec3,
    radius: f32,
    material: M,
}

impl<M: Material> Sphere<M> {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32, material: M) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl<M: Material> Hittable for Sphere<M> {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 || self.radius == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Some(HitRecord::new(ray, root, outward_normal, &self.material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lambertian;

    fn unit_sphere_ahead() -> Sphere<Lambertian> {
        Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Lambertian::new(Vec3::new(0.5, 0.5, 0.5)),
        )
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = sphere
            .hit(&ray, Interval::from_min(0.001))
            .expect("ray points at the sphere");
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere_ahead();

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray, Interval::from_min(0.001)).is_none());
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -2.0));

        let rec = sphere.hit(&ray, Interval::from_min(0.001)).expect("exits the sphere");
        assert!((rec.t - 0.25).abs() < 1e-5);
        assert!(!rec.front_face);
        // Normal flipped to face back toward the origin
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_outside_interval() {
        let sphere = unit_sphere_ahead();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(sphere.hit(&ray, Interval::new(0.001, 0.4)).is_none());
    }

    #[test]
    fn test_negative_radius_is_clamped() {
        let sphere = Sphere::new(Vec3::ZERO, -2.0, Lambertian::new(Vec3::ONE));
        assert_eq!(sphere.radius(), 0.0);
        assert_eq!(sphere.center(), Vec3::ZERO);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(sphere.hit(&ray, Interval::from_min(0.001)).is_none());
    }
}
