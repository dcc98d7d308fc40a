//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Iterative path tracing with a bounce limit
//! - Multi-sample anti-aliasing with per-row random streams
//! - Gamma correction and BGR byte encoding

use std::sync::atomic::{AtomicU32, Ordering};

use crate::partition::{default_worker_count, partition_rows, render_sections, RowRange};
use crate::{
    BitmapError, BitmapResult, Camera, CameraSettings, Color, ConfigurationError, Hittable, Ray,
};
use log::{debug, info};
use lumen_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::ThreadPoolBuildError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted hit parameter; avoids re-hitting the surface a ray
/// just left.
pub const T_MIN: f32 = 0.001;

/// Bytes per encoded pixel (blue, green, red).
pub const BYTES_PER_PIXEL: usize = 3;

/// Display intensities map into [0, 0.999] before scaling to a byte.
const INTENSITY: Interval = Interval::new(0.000, 0.999);

/// Errors that stop a render before any pixel is produced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to start render workers: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),

    #[error("Render produced a malformed image: {0}")]
    Image(#[from] BitmapError),
}

/// Render configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of row sections rendered in parallel; hardware parallelism when unset
    pub threads: Option<usize>,
    /// Base seed for the per-row generators; random when unset
    pub seed: Option<u64>,
}

impl RenderConfig {
    /// Resolve the worker count, falling back to hardware parallelism.
    pub fn worker_count(&self) -> Result<usize, ConfigurationError> {
        match self.threads {
            Some(0) => Err(ConfigurationError::ZeroWorkers),
            Some(n) => Ok(n),
            None => Ok(default_worker_count()),
        }
    }
}

/// Everything needed to describe a render, as loaded from a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub camera: CameraSettings,
    pub render: RenderConfig,
}

/// Compute the color seen by a ray.
///
/// Follows the ray through the scene, multiplying in the attenuation of every
/// surface it scatters off, until it escapes to the sky, is absorbed, or runs
/// out of bounces. The path is walked in a loop, so the bounce limit does not
/// bound stack depth.
pub fn ray_color(ray: &Ray, depth: u32, world: &dyn Hittable, rng: &mut dyn RngCore) -> Color {
    let mut ray = *ray;
    let mut attenuation = Color::ONE;

    for _ in 0..depth {
        let Some(rec) = world.hit(&ray, Interval::from_min(T_MIN)) else {
            return attenuation * sky_gradient(&ray);
        };

        match rec.material.scatter(&ray, &rec, rng) {
            Some(result) => {
                attenuation *= result.attenuation;
                ray = result.scattered;
            }
            None => return Color::ZERO,
        }
    }

    // Out of bounces: no more light is gathered
    Color::ZERO
}

/// Background seen by rays that escape the scene: white at the bottom
/// blending to sky blue at the top.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    (1.0 - a) * white + a * blue
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

#[inline]
fn to_byte(linear: f32) -> u8 {
    (256.0 * INTENSITY.clamp(linear_to_gamma(linear))) as u8
}

/// Encode a linear color as `[blue, green, red]` bytes.
pub fn color_to_bgr(color: Color) -> [u8; 3] {
    [to_byte(color.z), to_byte(color.y), to_byte(color.x)]
}

/// Append an encoded pixel to a section buffer in BMP channel order
/// (blue, green, red).
pub fn write_color(section: &mut Vec<u8>, color: Color) {
    section.extend_from_slice(&color_to_bgr(color));
}

/// Average `samples_per_pixel` jittered paths through pixel (i, j).
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    i: u32,
    j: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel() {
        let ray = camera.get_ray(i, j, rng);
        pixel_color += ray_color(&ray, camera.max_depth(), world, rng);
    }

    camera.samples_scale() * pixel_color
}

/// Generator for one image row.
///
/// Each row gets an independent stream derived from the base seed, so the
/// image only depends on the seed and not on how rows are split between
/// workers.
pub fn row_rng(seed: u64, row: u32) -> StdRng {
    let stream = u64::from(row).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed ^ stream)
}

/// Counts finished rows across workers for progress reporting.
#[derive(Debug)]
pub struct ScanlineProgress {
    remaining: AtomicU32,
}

impl ScanlineProgress {
    pub fn new(rows: u32) -> Self {
        Self {
            remaining: AtomicU32::new(rows),
        }
    }

    /// Mark one row finished and return how many are left.
    pub fn row_done(&self) -> u32 {
        let left = self
            .remaining
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        debug!("Scanlines remaining: {}", left);
        left
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Relaxed)
    }
}

/// Render rows `[range.start, range.end)` into an encoded BGR section buffer.
///
/// Pixels are appended left to right, top to bottom.
pub fn render_section(
    camera: &Camera,
    world: &dyn Hittable,
    range: &RowRange,
    seed: u64,
    progress: &ScanlineProgress,
) -> Vec<u8> {
    let width = camera.image_width() as usize;
    let mut section = Vec::with_capacity(range.len() as usize * width * BYTES_PER_PIXEL);

    for j in range.start..range.end {
        let mut rng = row_rng(seed, j);
        for i in 0..camera.image_width() {
            let color = render_pixel(camera, world, i, j, &mut rng);
            write_color(&mut section, color);
        }
        progress.row_done();
    }

    debug!(
        "Section {} finished (rows {}..{})",
        range.index, range.start, range.end
    );
    section
}

/// Encoded full-frame image: BGR triples in top-down row order, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap BGR bytes, checking they cover exactly `width * height` pixels.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> BitmapResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(BitmapError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Concatenate section buffers in the order given.
    pub fn from_sections(width: u32, height: u32, sections: Vec<Vec<u8>>) -> BitmapResult<Self> {
        Self::from_bgr(width, height, sections.concat())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGR bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} outside image of height {}", self.height);
        let stride = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// The `[blue, green, red]` triple at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Copy of the image with channels swapped to RGB order.
    pub fn to_rgb(&self) -> Vec<u8> {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect()
    }
}

/// Render the whole frame.
///
/// The image is split into one contiguous row section per worker, sections
/// are rendered in parallel, then stitched together in row order once every
/// worker has finished.
pub fn render(
    camera: &Camera,
    world: &dyn Hittable,
    config: &RenderConfig,
) -> Result<PixelBuffer, RenderError> {
    let workers = config.worker_count()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let width = camera.image_width();
    let height = camera.image_height();

    let ranges = partition_rows(height, workers);
    info!(
        "Rendering {}x{} @ {} spp, depth {}, {} sections, seed {}",
        width,
        height,
        camera.samples_per_pixel(),
        camera.max_depth(),
        ranges.len(),
        seed
    );

    let progress = ScanlineProgress::new(height);
    let sections = render_sections(&ranges, |range| {
        render_section(camera, world, range, seed, &progress)
    })?;

    // Sections arrive in chunk order regardless of which finished first
    let image = PixelBuffer::from_sections(width, height, sections)?;
    info!("Render finished");
    Ok(image)
}
