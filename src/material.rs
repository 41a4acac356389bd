use std::sync::{Arc, OnceLock};

use image::RgbImage;

use crate::geometry::{Fp, Vec3f, EPS};

/// Reflectance bundle shared (via `Arc`) by every primitive that uses it.
/// `kf` doubles as the index of refraction; a value of zero means the
/// material is opaque.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub ka: Vec3f,
    pub kd: Vec3f,
    pub ks: Vec3f,
    /// shininess exponent for the specular term
    pub ne: Fp,
    pub ke: Vec3f,
    /// ideal mirror reflectance
    pub km: Vec3f,
    /// glossiness jitter for rough mirrors
    pub g: Fp,
    /// index of refraction; 0 for opaque materials
    pub kf: Fp,
    /// Beer-Lambert attenuation per channel inside the medium
    pub attenuation: Vec3f,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: String::new(),
            ka: Vec3f::new(1.0, 1.0, 1.0),
            kd: Vec3f::new(1.0, 1.0, 1.0),
            ks: Vec3f::new(1.0, 1.0, 1.0),
            ne: 100.0,
            ke: Vec3f::zeros(),
            km: Vec3f::zeros(),
            g: 0.05,
            kf: 0.0,
            attenuation: Vec3f::new(0.1, 0.1, 0.1),
        }
    }
}

impl Material {
    pub fn named(name: &str) -> Material {
        Material {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn is_mirror(&self) -> bool {
        self.km.norm() > EPS
    }

    pub fn is_transmissive(&self) -> bool {
        self.kf > EPS
    }

    pub fn is_emissive(&self) -> bool {
        self.ke.norm() > EPS
    }
}

/// Fallback for primitives constructed without an explicit material.
pub fn default_material() -> Arc<Material> {
    static DEFAULT: OnceLock<Arc<Material>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(Material::default())))
}

/// Decoded image as rows of normalized rgb, nearest-sample lookup.
pub struct Texture {
    width: u32,
    height: u32,
    samples: Vec<Vec3f>,
}

impl Texture {
    pub fn from_rgb8(image: &RgbImage) -> Texture {
        let samples = image
            .pixels()
            .map(|pixel| {
                Vec3f::new(
                    pixel.0[0] as Fp / 255.0,
                    pixel.0[1] as Fp / 255.0,
                    pixel.0[2] as Fp / 255.0,
                )
            })
            .collect();
        Texture {
            width: image.width(),
            height: image.height(),
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (u, v) in [0,1]^2, v = 0 at the image bottom.
    pub fn sample(&self, u: Fp, v: Fp) -> Vec3f {
        let col = (u.clamp(0.0, 1.0) * (self.width - 1) as Fp).round() as usize;
        let row = ((1.0 - v.clamp(0.0, 1.0)) * (self.height - 1) as Fp).round() as usize;
        self.samples[row * self.width as usize + col]
    }
}
