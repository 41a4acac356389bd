use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::geometry::{Fp, Intersection, Ray, Renderable, Vec3f};
use crate::light::Light;
use crate::shader;

#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    /// recursion limit for mirror/dielectric bounces
    pub max_bounce: u32,
    pub samples_per_pixel: u32,
    /// shadow rays cast per light per shading point
    pub shadow_rays: u32,
    /// worker threads; 0 uses the rayon default
    pub threads: usize,
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            max_bounce: 5,
            samples_per_pixel: 4,
            shadow_rays: 1,
            threads: 0,
            seed: 0x5EED_1E55,
        }
    }
}

/// Owns everything the render needs. Renderables, lights and the camera are
/// read-only while `render` runs; rows of the frame buffer are written by
/// exactly one worker each.
pub struct Scene {
    pub camera: Camera,
    pub renderables: Vec<Renderable>,
    pub lights: Vec<Light>,
    pub background: Vec3f,
    pub settings: RenderSettings,
    frame: Vec<Vec3f>,
}

impl Scene {
    pub fn new(camera: Camera, background: Vec3f, settings: RenderSettings) -> Scene {
        Scene {
            camera,
            renderables: vec![],
            lights: vec![],
            background,
            settings,
            frame: vec![],
        }
    }

    pub fn add_renderable(&mut self, renderable: Renderable) {
        self.renderables.push(renderable);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Nearest hit over all top-level renderables; meshes delegate to their
    /// own BVH internally. This is the single query entry point the shadow,
    /// reflection and refraction rays use as well.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut nearest: Option<Intersection> = None;
        for renderable in &self.renderables {
            if let Some(hit) = renderable.intersect(ray) {
                match &nearest {
                    Some(best) if best.t <= hit.t => {}
                    _ => nearest = Some(hit),
                }
            }
        }
        nearest
    }

    /// Renders the full frame and returns the linear (un-gamma-corrected)
    /// row-major buffer.
    pub fn render(&mut self) -> &[Vec3f] {
        let width = self.camera.width();
        let height = self.camera.height();
        if self.frame.len() != width * height {
            self.frame = vec![Vec3f::zeros(); width * height];
        }
        let mut frame = std::mem::take(&mut self.frame);
        log::info!(
            "rendering {}x{}, {} renderables, {} lights, {} samples/pixel",
            width,
            height,
            self.renderables.len(),
            self.lights.len(),
            self.settings.samples_per_pixel
        );
        let started = std::time::Instant::now();
        if self.settings.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.threads)
                .build()
                .expect("failed to build rayon pool");
            pool.install(|| self.render_rows(&mut frame, width, height));
        } else {
            self.render_rows(&mut frame, width, height);
        }
        log::info!("render finished in {:.2?}", started.elapsed());
        self.frame = frame;
        &self.frame
    }

    pub fn frame(&self) -> &[Vec3f] {
        &self.frame
    }

    fn render_rows(&self, frame: &mut [Vec3f], width: usize, height: usize) {
        let bar = ProgressBar::new(height as u64).with_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} rows ({elapsed})")
                .expect("bad progress template"),
        );
        frame
            .par_chunks_mut(width)
            .enumerate()
            .progress_with(bar)
            .for_each(|(row, row_slots)| {
                // one generator per row keeps stochastic draws off shared state
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(
                    self.settings
                        .seed
                        .wrapping_add((row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                );
                for (col, slot) in row_slots.iter_mut().enumerate() {
                    *slot = self.render_pixel(row, col, &mut rng);
                }
            });
    }

    fn render_pixel(&self, row: usize, col: usize, rng: &mut Xoshiro256PlusPlus) -> Vec3f {
        let samples = self.settings.samples_per_pixel.max(1);
        let mut accumulated = Vec3f::zeros();
        for sample in 0..samples {
            let (row_jitter, col_jitter): (Fp, Fp) = if sample == 0 {
                // keep the first sample on the pixel center
                (0.0, 0.0)
            } else {
                (rng.gen::<Fp>() - 0.5, rng.gen::<Fp>() - 0.5)
            };
            let ray = self
                .camera
                .ray_through_film(row as Fp + row_jitter, col as Fp + col_jitter);
            accumulated += match self.intersect(&ray) {
                Some(hit) => shader::shade(self, &hit, 0, rng),
                None => self.background,
            };
        }
        accumulated / samples as Fp
    }
}
