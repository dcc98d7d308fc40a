//! Lumen Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer that renders spheres with diffuse, metallic
//! and glass materials into a 24-bit bitmap.
//!
//! The image is split into contiguous row sections that are rendered in
//! parallel and reassembled in row order, so a fixed seed always produces
//! the same bytes.

mod ray;
mod hittable;
mod material;
mod sampling;
mod sphere;
mod camera;
mod renderer;
mod partition;
mod bitmap;

pub use ray::Ray;
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Color, Dielectric, Lambertian, Material, Metal, ScatterResult};
pub use sampling::{gen_f32, random_in_unit_disk, random_unit_vector, sample_square};
pub use sphere::Sphere;
pub use camera::{Camera, CameraSettings, ConfigurationError};
pub use renderer::{
    color_to_bgr, linear_to_gamma, ray_color, render, render_pixel, render_section, row_rng,
    sky_gradient, write_color, PixelBuffer, RenderConfig, RenderError, RenderSettings,
    ScanlineProgress, BYTES_PER_PIXEL, T_MIN,
};
pub use partition::{default_worker_count, partition_rows, render_sections, RowRange};
pub use bitmap::{
    padded_row_size, save_bmp, save_image, save_png, write_bmp, BitmapError, BitmapResult,
    BMP_HEADER_SIZE,
};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Interval, Vec3};
