//! Material trait for surface scattering.

use crate::sampling::{gen_f32, random_unit_vector};
use crate::{HitRecord, Ray};
use lumen_math::Vec3;
use rand::RngCore;

/// Color type alias (linear RGB, unbounded above zero)
pub type Color = Vec3;

/// Outcome of a scatter event that was not absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// Component-wise color multiplier for light arriving along `scattered`
    pub attenuation: Color,
    /// Outgoing ray leaving the hit point
    pub scattered: Ray,
}

impl ScatterResult {
    pub fn new(attenuation: Color, scattered: Ray) -> Self {
        Self {
            attenuation,
            scattered,
        }
    }
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed. Absorption is a normal outcome
    /// and terminates the path with zero radiance.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore)
        -> Option<ScatterResult>;
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult::new(self.albedo, Ray::new(rec.p, scatter_direction)))
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz can push the ray below the surface, which absorbs it
        if scattered_dir.dot(rec.normal) > 0.0 {
            Some(ScatterResult::new(self.albedo, Ray::new(rec.p, scattered_dir)))
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction =
            if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
                reflect(unit_direction, rec.normal)
            } else {
                refract(unit_direction, rec.normal, refraction_ratio)
            };

        Some(ScatterResult::new(Color::ONE, Ray::new(rec.p, direction)))
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn head_on_hit<'a>(material: &'a dyn Material, front_face: bool) -> (Ray, HitRecord<'a>) {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let outward = if front_face { Vec3::Z } else { -Vec3::Z };
        let rec = HitRecord::new(&ray, 1.0, outward, material);
        (ray, rec)
    }

    #[test]
    fn test_lambertian_scatters_into_hemisphere() {
        let material = Lambertian::new(Color::new(0.8, 0.3, 0.3));
        let (ray, rec) = head_on_hit(&material, true);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("diffuse never absorbs");
            assert_eq!(result.attenuation, Color::new(0.8, 0.3, 0.3));
            assert_eq!(result.scattered.origin(), rec.p);
            assert!(result.scattered.direction().dot(rec.normal) >= 0.0);
        }
    }

    #[test]
    fn test_perfect_metal_mirrors() {
        let material = Metal::new(Color::splat(0.9), 0.0);
        let (ray, rec) = head_on_hit(&material, true);
        let mut rng = StdRng::seed_from_u64(1);

        let result = material.scatter(&ray, &rec, &mut rng).expect("mirror reflects");
        assert!((result.scattered.direction() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_metal_absorbs_below_surface() {
        let material = Metal::new(Color::splat(0.9), 0.0);
        // Grazing ray along the surface reflects to zero normal component
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, &material);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(material.scatter(&ray, &rec, &mut rng).is_none());
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz, 1.0);
        assert_eq!(Metal::new(Color::ONE, -1.0).fuzz, 0.0);
    }

    #[test]
    fn test_dielectric_never_absorbs() {
        let material = Dielectric::new(1.5);
        let (ray, rec) = head_on_hit(&material, true);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("glass never absorbs");
            assert_eq!(result.attenuation, Color::ONE);
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Dielectric::new(1.5);
        // Leaving glass at a steep angle must reflect back inside
        let direction = Vec3::new(1.0, 0.2, 0.0);
        let ray = Ray::new(Vec3::ZERO, direction);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, &material);
        assert!(!rec.front_face);
        let mut rng = StdRng::seed_from_u64(3);

        let result = material.scatter(&ray, &rec, &mut rng).expect("reflects");
        assert!(result.scattered.direction().y < 0.0);
    }

    #[test]
    fn test_schlick_at_normal_incidence() {
        let r0 = Dielectric::reflectance(1.0, 1.5);
        assert!((r0 - 0.04).abs() < 1e-6);
    }
}
