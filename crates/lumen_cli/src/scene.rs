//! Built-in demo scenes.

use lumen_math::Vec3;
use lumen_renderer::{CameraSettings, Color, Dielectric, HittableList, Lambertian, Metal, Sphere};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scenes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SceneKind {
    /// Ground plane, three large spheres and a field of small random ones
    Spheres,
    /// Ground plane and three spheres (diffuse, glass, metal)
    Three,
    /// Nothing but sky
    Empty,
}

impl SceneKind {
    /// Camera framing that suits the scene.
    pub fn default_camera(self) -> CameraSettings {
        match self {
            SceneKind::Spheres => CameraSettings::default()
                .with_image(1200, 16.0 / 9.0)
                .with_quality(100, 10)
                .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
                .with_lens(20.0, 0.6, 10.0),
            SceneKind::Three => CameraSettings::default()
                .with_image(400, 16.0 / 9.0)
                .with_quality(100, 50)
                .with_position(Vec3::new(-2.0, 2.0, 1.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
                .with_lens(20.0, 10.0, 3.4),
            SceneKind::Empty => CameraSettings::default(),
        }
    }
}

/// Build the requested scene. `seed` drives the random sphere layout.
pub fn build_scene(kind: SceneKind, seed: u64) -> HittableList {
    match kind {
        SceneKind::Spheres => random_spheres(seed),
        SceneKind::Three => three_spheres(),
        SceneKind::Empty => HittableList::new(),
    }
}

fn three_spheres() -> HittableList {
    let mut world = HittableList::new();

    world.add(Box::new(Sphere::new(
        Vec3::new(0.0, -100.5, -1.0),
        100.0,
        Lambertian::new(Color::new(0.8, 0.8, 0.0)),
    )));
    world.add(Box::new(Sphere::new(
        Vec3::new(0.0, 0.0, -1.2),
        0.5,
        Lambertian::new(Color::new(0.1, 0.2, 0.5)),
    )));
    world.add(Box::new(Sphere::new(
        Vec3::new(-1.0, 0.0, -1.0),
        0.5,
        Dielectric::new(1.5),
    )));
    // Air bubble inside the glass sphere
    world.add(Box::new(Sphere::new(
        Vec3::new(-1.0, 0.0, -1.0),
        0.4,
        Dielectric::new(1.0 / 1.5),
    )));
    world.add(Box::new(Sphere::new(
        Vec3::new(1.0, 0.0, -1.0),
        0.5,
        Metal::new(Color::new(0.8, 0.6, 0.2), 1.0),
    )));

    world
}

fn random_spheres(seed: u64) -> HittableList {
    let mut world = HittableList::new();
    let mut rng = StdRng::seed_from_u64(seed);

    // Ground
    world.add(Box::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Lambertian::new(Color::new(0.5, 0.5, 0.5)),
    )));

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            if choose_mat < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                world.add(Box::new(Sphere::new(center, 0.2, Lambertian::new(albedo))));
            } else if choose_mat < 0.95 {
                let albedo = Color::new(
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                );
                let fuzz = 0.5 * rng.gen::<f32>();
                world.add(Box::new(Sphere::new(center, 0.2, Metal::new(albedo, fuzz))));
            } else {
                world.add(Box::new(Sphere::new(center, 0.2, Dielectric::new(1.5))));
            }
        }
    }

    world.add(Box::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Dielectric::new(1.5),
    )));
    world.add(Box::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Lambertian::new(Color::new(0.4, 0.2, 0.1)),
    )));
    world.add(Box::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Metal::new(Color::new(0.7, 0.6, 0.5), 0.0),
    )));

    log::debug!("Built random sphere scene with {} objects", world.len());
    world
}
