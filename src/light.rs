use rand::Rng;

use crate::geometry::{Fp, Vec3f, EPS, FP_INF};

/// What a light reports for one surface point. `direction` points from the
/// surface toward the light and is zero for ambient lights (the sentinel
/// that tells the shader to skip the shadow test). `distance` bounds the
/// shadow ray; it is infinite for parallel lights.
pub struct LightSample {
    pub intensity: Vec3f,
    pub direction: Vec3f,
    pub distance: Fp,
}

impl LightSample {
    pub fn is_ambient(&self) -> bool {
        self.direction.norm() < EPS
    }
}

#[derive(Clone, Debug)]
pub enum Light {
    Point {
        intensity: Vec3f,
        position: Vec3f,
    },
    Ambient {
        intensity: Vec3f,
    },
    Parallel {
        intensity: Vec3f,
        direction: Vec3f,
    },
    /// Parallelogram patch spanned by two edges; every query resamples a
    /// point on it, which is what produces soft shadows.
    Area {
        intensity: Vec3f,
        corner: Vec3f,
        edge_u: Vec3f,
        edge_v: Vec3f,
    },
}

impl Light {
    pub fn parallel(intensity: Vec3f, direction: Vec3f) -> Light {
        Light::Parallel {
            intensity,
            direction: direction.normalize(),
        }
    }

    /// Intensity and direction-to-light at `point`. Point and area lights
    /// fall off with the inverse square of the distance.
    pub fn illumination_at(&self, point: &Vec3f, rng: &mut impl Rng) -> LightSample {
        match self {
            Light::Point {
                intensity,
                position,
            } => to_source(intensity, position, point),
            Light::Ambient { intensity } => LightSample {
                intensity: *intensity,
                direction: Vec3f::zeros(),
                distance: 0.0,
            },
            Light::Parallel {
                intensity,
                direction,
            } => LightSample {
                intensity: *intensity,
                direction: -direction,
                distance: FP_INF,
            },
            Light::Area {
                intensity,
                corner,
                edge_u,
                edge_v,
            } => {
                let u: Fp = rng.gen();
                let v: Fp = rng.gen();
                let sampled = corner + edge_u * u + edge_v * v;
                to_source(intensity, &sampled, point)
            }
        }
    }
}

fn to_source(intensity: &Vec3f, source: &Vec3f, point: &Vec3f) -> LightSample {
    let offset = source - point;
    let distance = offset.norm();
    if distance < EPS {
        // surface point sits on the source, nothing meaningful to report
        return LightSample {
            intensity: Vec3f::zeros(),
            direction: Vec3f::zeros(),
            distance: 0.0,
        };
    }
    LightSample {
        intensity: intensity / (distance * distance),
        direction: offset / distance,
        distance,
    }
}
