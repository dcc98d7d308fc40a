//! Camera for ray generation.
//!
//! [`CameraSettings`] holds the user-facing parameters. Validating them with
//! [`CameraSettings::build`] produces a [`Camera`] whose derived viewport
//! state is fixed for the rest of the render.

use crate::sampling::{random_in_unit_disk, sample_square};
use crate::Ray;
use lumen_math::Vec3;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid camera or render parameters, reported before any rendering starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Image width must be at least 1 pixel")]
    ZeroWidth,

    #[error("Aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f32),

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("Vertical field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("Focus distance must be a positive finite number, got {0}")]
    InvalidFocusDistance(f32),

    #[error("Defocus angle must be in [0, 180) degrees, got {0}")]
    InvalidDefocusAngle(f32),

    #[error("Camera vector `{0}` has non-finite components")]
    NonFiniteVector(&'static str),

    #[error("Camera look_from and look_at must be distinct points a finite distance apart")]
    DegenerateView,

    #[error("Camera up vector is parallel to the view direction")]
    DegenerateUp,

    #[error("Worker count must be at least 1")]
    ZeroWorkers,
}

/// User-facing camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Count of random samples for each pixel
    pub samples_per_pixel: u32,
    /// Maximum number of ray bounces
    pub max_depth: u32,

    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,

    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 800,
            samples_per_pixel: 100,
            max_depth: 10,
            vfov: 90.0,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            defocus_angle: 0.0,
            focus_dist: 10.0,
        }
    }
}

impl CameraSettings {
    /// Set image width and aspect ratio; height is derived.
    pub fn with_image(mut self, width: u32, aspect_ratio: f32) -> Self {
        self.image_width = width;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Image height derived from width and aspect ratio, at least 1.
    ///
    /// Only meaningful for settings that pass [`validate`](Self::validate).
    pub fn image_height(&self) -> u32 {
        let height = (self.image_width as f32 / self.aspect_ratio).round();
        (height as u32).max(1)
    }

    /// Check every parameter without building the camera.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.image_width == 0 {
            return Err(ConfigurationError::ZeroWidth);
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigurationError::InvalidAspectRatio(self.aspect_ratio));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigurationError::ZeroSamples);
        }
        if !(self.vfov.is_finite() && self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(ConfigurationError::InvalidFieldOfView(self.vfov));
        }
        if !(self.focus_dist.is_finite() && self.focus_dist > 0.0) {
            return Err(ConfigurationError::InvalidFocusDistance(self.focus_dist));
        }
        if !(self.defocus_angle.is_finite()
            && self.defocus_angle >= 0.0
            && self.defocus_angle < 180.0)
        {
            return Err(ConfigurationError::InvalidDefocusAngle(self.defocus_angle));
        }

        for (name, vector) in [
            ("look_from", self.look_from),
            ("look_at", self.look_at),
            ("vup", self.vup),
        ] {
            if !vector.is_finite() {
                return Err(ConfigurationError::NonFiniteVector(name));
            }
        }

        let view = self.look_from - self.look_at;
        if view.length_squared() <= f32::EPSILON * f32::EPSILON {
            return Err(ConfigurationError::DegenerateView);
        }
        // Finite endpoints can still be far enough apart that the offset overflows
        let Some(w) = view.try_normalize() else {
            return Err(ConfigurationError::DegenerateView);
        };
        let Some(up) = self.vup.try_normalize() else {
            return Err(ConfigurationError::DegenerateUp);
        };
        if up.cross(w).length_squared() <= 1e-12 {
            return Err(ConfigurationError::DegenerateUp);
        }

        Ok(())
    }

    /// Validate the settings and derive the camera frame.
    pub fn build(&self) -> Result<Camera, ConfigurationError> {
        self.validate()?;
        Ok(Camera::from_settings(self))
    }
}

/// Camera for generating rays into the scene.
///
/// Immutable once built, so it can be shared by every render worker.
#[derive(Debug, Clone)]
pub struct Camera {
    image_width: u32,
    image_height: u32,
    samples_per_pixel: u32,
    max_depth: u32,
    samples_scale: f32,
    defocus_angle: f32,

    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    fn from_settings(settings: &CameraSettings) -> Self {
        let image_width = settings.image_width;
        let image_height = settings.image_height();
        let center = settings.look_from;

        // Calculate viewport dimensions
        let theta = settings.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * settings.focus_dist;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Calculate camera basis vectors
        let w = (settings.look_from - settings.look_at).normalize();
        let u = settings.vup.normalize().cross(w).normalize();
        let v = w.cross(u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left =
            center - settings.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = settings.focus_dist * (settings.defocus_angle / 2.0).to_radians().tan();

        Self {
            image_width,
            image_height,
            samples_per_pixel: settings.samples_per_pixel,
            max_depth: settings.max_depth,
            samples_scale: 1.0 / settings.samples_per_pixel as f32,
            defocus_angle: settings.defocus_angle,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
        }
    }

    /// Generate a ray for pixel (i, j) with random sub-pixel jitter.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Get the samples scale factor (1 / samples_per_pixel).
    pub fn samples_scale(&self) -> f32 {
        self.samples_scale
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Camera frame basis (u right, v up, w backward).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_settings_build() {
        let camera = CameraSettings::default().build().expect("defaults are valid");

        assert_eq!(camera.image_width(), 800);
        assert_eq!(camera.image_height(), 800);
        assert_eq!(camera.samples_per_pixel(), 100);
        assert_eq!(camera.max_depth(), 10);
        assert!((camera.samples_scale() - 0.01).abs() < 1e-7);
        assert_eq!(camera.center(), Vec3::ZERO);
    }

    #[test]
    fn test_image_height_derivation() {
        let settings = CameraSettings::default().with_image(400, 16.0 / 9.0);
        assert_eq!(settings.image_height(), 225);

        // Rounds to nearest
        let settings = CameraSettings::default().with_image(10, 3.0);
        assert_eq!(settings.image_height(), 3);
        let settings = CameraSettings::default().with_image(11, 2.0);
        assert_eq!(settings.image_height(), 6);

        // Never below one row
        let settings = CameraSettings::default().with_image(1, 100.0);
        assert_eq!(settings.image_height(), 1);
    }

    #[test]
    fn test_camera_basis_is_orthonormal() {
        let camera = CameraSettings::default()
            .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
            .build()
            .unwrap();
        let (u, v, w) = camera.basis();

        for axis in [u, v, w] {
            assert!((axis.length() - 1.0).abs() < 1e-5);
        }
        assert!(u.dot(v).abs() < 1e-5);
        assert!(v.dot(w).abs() < 1e-5);
        assert!(u.dot(w).abs() < 1e-5);
        // Right-handed: u x v = w
        assert!((u.cross(v) - w).length() < 1e-5);
        // v leans toward the requested up vector
        assert!(v.dot(Vec3::Y) > 0.0);
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = CameraSettings::default().build().unwrap();
        let (u, v, w) = camera.basis();

        assert!((u - Vec3::X).length() < 1e-6);
        assert!((v - Vec3::Y).length() < 1e-6);
        assert!((w - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_camera_ray_direction() {
        let camera = CameraSettings::default()
            .with_image(100, 1.0)
            .with_lens(90.0, 0.0, 1.0)
            .build()
            .unwrap();

        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = camera.get_ray(50, 50, &mut rng);
        assert_eq!(ray.origin(), Vec3::ZERO);
        assert!(ray.direction().z < 0.0);
        assert!(ray.direction().x.abs() < 0.05);
        assert!(ray.direction().y.abs() < 0.05);
    }

    #[test]
    fn test_corner_rays_span_field_of_view() {
        // 90 degree vfov at focus distance 1 gives a viewport 2 units tall
        let camera = CameraSettings::default()
            .with_image(2, 1.0)
            .with_lens(90.0, 0.0, 1.0)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let within = |x: f32, lo: f32, hi: f32| x >= lo - 1e-5 && x <= hi + 1e-5;

        for _ in 0..50 {
            let top_left = camera.get_ray(0, 0, &mut rng).direction();
            assert!(within(top_left.x, -1.0, 0.0));
            assert!(within(top_left.y, 0.0, 1.0));
            assert!((top_left.z + 1.0).abs() < 1e-6);

            let bottom_right = camera.get_ray(1, 1, &mut rng).direction();
            assert!(within(bottom_right.x, 0.0, 1.0));
            assert!(within(bottom_right.y, -1.0, 0.0));
        }
    }

    #[test]
    fn test_defocus_origins_stay_on_disk() {
        let camera = CameraSettings::default()
            .with_lens(90.0, 10.0, 3.4)
            .build()
            .unwrap();
        let radius = 3.4 * 5.0_f32.to_radians().tan();
        let mut rng = StdRng::seed_from_u64(11);

        let mut moved = false;
        for _ in 0..100 {
            let origin = camera.get_ray(400, 400, &mut rng).origin();
            assert!(origin.length() <= radius + 1e-5);
            assert!(origin.z.abs() < 1e-6);
            moved |= origin != Vec3::ZERO;
        }
        assert!(moved);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let base = CameraSettings::default();

        let cases = [
            (base.clone().with_image(0, 1.0), ConfigurationError::ZeroWidth),
            (
                base.clone().with_image(100, 0.0),
                ConfigurationError::InvalidAspectRatio(0.0),
            ),
            (
                base.clone().with_image(100, -2.0),
                ConfigurationError::InvalidAspectRatio(-2.0),
            ),
            (base.clone().with_quality(0, 10), ConfigurationError::ZeroSamples),
            (
                base.clone().with_lens(180.0, 0.0, 1.0),
                ConfigurationError::InvalidFieldOfView(180.0),
            ),
            (
                base.clone().with_lens(90.0, 0.0, 0.0),
                ConfigurationError::InvalidFocusDistance(0.0),
            ),
            (
                base.clone().with_lens(90.0, -1.0, 1.0),
                ConfigurationError::InvalidDefocusAngle(-1.0),
            ),
            (
                base.clone().with_position(Vec3::ONE, Vec3::ONE, Vec3::Y),
                ConfigurationError::DegenerateView,
            ),
            (
                base.clone().with_position(Vec3::Y, Vec3::ZERO, Vec3::Y),
                ConfigurationError::DegenerateUp,
            ),
            (
                base.clone().with_position(
                    Vec3::new(3.0e38, 0.0, 0.0),
                    Vec3::new(-3.0e38, 0.0, 0.0),
                    Vec3::Y,
                ),
                ConfigurationError::DegenerateView,
            ),
            (
                base.clone().with_position(Vec3::ZERO, Vec3::NEG_Z, Vec3::ZERO),
                ConfigurationError::DegenerateUp,
            ),
            (
                base.clone()
                    .with_position(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO, Vec3::Y),
                ConfigurationError::NonFiniteVector("look_from"),
            ),
        ];

        for (settings, expected) in cases {
            assert_eq!(settings.build().unwrap_err(), expected);
        }
    }

    #[test]
    fn test_max_depth_zero_is_valid() {
        let camera = CameraSettings::default().with_quality(1, 0).build().unwrap();
        assert_eq!(camera.max_depth(), 0);
    }

    #[test]
    fn test_build_is_repeatable() {
        let settings = CameraSettings::default().with_lens(40.0, 2.0, 5.0);
        let a = settings.build().unwrap();
        let b = settings.build().unwrap();

        assert_eq!(a.pixel00_loc, b.pixel00_loc);
        assert_eq!(a.defocus_disk_u, b.defocus_disk_u);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: CameraSettings =
            serde_json::from_str(r#"{ "image_width": 320, "vfov": 20.0 }"#).unwrap();

        assert_eq!(settings.image_width, 320);
        assert_eq!(settings.vfov, 20.0);
        assert_eq!(settings.samples_per_pixel, 100);
        assert_eq!(settings.look_at, Vec3::new(0.0, 0.0, -1.0));
    }
}
