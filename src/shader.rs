use rand::Rng;

use crate::geometry::{reflect_dir, refract_dir, Fp, Intersection, Ray, Vec3f, EPS, RAY_BIAS};
use crate::scene::Scene;

/// Exponent of the colored-shadow heuristic for transmissive occluders:
/// the light contribution is scaled by kf^-0.8 instead of being blocked.
const TRANSMISSIVE_SHADOW_EXPONENT: Fp = -0.8;

/// Whitted-style recursive shading. The scene is passed in only for its
/// `intersect` query (shadow, reflection and refraction rays); recursion
/// stops once `depth` reaches the configured bounce limit.
pub fn shade(scene: &Scene, hit: &Intersection, depth: u32, rng: &mut impl Rng) -> Vec3f {
    let material = &hit.material;
    let mut color = material.ke;

    // texture lookup overrides the diffuse coefficient
    let kd = match &hit.payload {
        Some(payload) => payload.texture.sample(payload.uv.0, payload.uv.1),
        None => material.kd,
    };

    let normal = hit.normal;
    let view = hit.view_dir;
    let shadow_samples = scene.settings.shadow_rays.max(1);
    for light in &scene.lights {
        let mut light_color = Vec3f::zeros();
        for _ in 0..shadow_samples {
            let sample = light.illumination_at(&hit.position, rng);
            if sample.is_ambient() {
                light_color += material.ka.component_mul(&sample.intensity);
                continue;
            }
            let visibility = shadow_factor(scene, hit, &sample.direction, sample.distance);
            if visibility <= 0.0 {
                continue;
            }
            let cos_theta = Fp::max(0.0, normal.dot(&sample.direction));
            let intensity = sample.intensity * visibility;
            light_color += kd.component_mul(&intensity) * cos_theta;
            let half = sample.direction + view;
            if half.norm() > EPS {
                let cos_alpha =
                    Fp::max(0.0, normal.dot(&half.normalize())).powf(material.ne);
                light_color += material.ks.component_mul(&intensity) * cos_alpha;
            }
        }
        color += light_color / shadow_samples as Fp;
    }

    if depth >= scene.settings.max_bounce {
        return color;
    }

    // mirror takes precedence over the dielectric response on purpose;
    // the two never blend
    if material.is_mirror() {
        let reflected = normal * (2.0 * normal.dot(&view)) - view;
        let direction = glossy_jitter(&reflected, material.g, rng);
        let ray = Ray::new(hit.position + direction * RAY_BIAS, direction);
        if let Some(bounce_hit) = scene.intersect(&ray) {
            let bounced = shade(scene, &bounce_hit, depth + 1, rng);
            color += material.km.component_mul(&bounced);
        }
    } else if material.is_transmissive() {
        let cos_theta = Fp::max(0.0, normal.dot(&view));
        let reflectance = schlick_reflectance(cos_theta, material.kf);

        let reflected = reflect_dir(&-view, &normal);
        let ray = Ray::new(hit.position + reflected * RAY_BIAS, reflected);
        let reflected_color = match scene.intersect(&ray) {
            Some(bounce_hit) => shade(scene, &bounce_hit, depth + 1, rng),
            None => scene.background,
        };
        color += reflected_color * reflectance;

        // entering the denser medium never totally reflects, but guard the
        // degenerate case anyway
        if let Some(refracted) = refract_dir(&-view, &normal, 1.0 / material.kf) {
            let transmitted = trace_inside(scene, &hit.position, &refracted, hit, depth, rng);
            color += transmitted * (1.0 - reflectance);
        }
    }

    color
}

/// 1.0 for an unobstructed shadow ray, 0.0 behind an opaque occluder, the
/// kf^-0.8 heuristic behind a transmissive one.
fn shadow_factor(scene: &Scene, hit: &Intersection, direction: &Vec3f, distance: Fp) -> Fp {
    let ray = Ray::new(hit.position + direction * RAY_BIAS, *direction);
    match scene.intersect(&ray) {
        Some(occluder) if occluder.t + RAY_BIAS < distance => {
            if occluder.material.is_transmissive() {
                occluder.material.kf.powf(TRANSMISSIVE_SHADOW_EXPONENT)
            } else {
                0.0
            }
        }
        _ => 1.0,
    }
}

/// Schlick's approximation of the Fresnel reflectance.
pub(crate) fn schlick_reflectance(cos_theta: Fp, ior: Fp) -> Fp {
    let r0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}

/// Uniform per-axis perturbation of a reflection target point, scaled by
/// the material roughness; zero roughness keeps the ideal mirror direction.
fn glossy_jitter(direction: &Vec3f, roughness: Fp, rng: &mut impl Rng) -> Vec3f {
    if roughness < EPS {
        return *direction;
    }
    let jittered = direction
        + Vec3f::new(
            roughness * rng.gen_range(-1.0..1.0),
            roughness * rng.gen_range(-1.0..1.0),
            roughness * rng.gen_range(-1.0..1.0),
        );
    if jittered.norm() < EPS {
        *direction
    } else {
        jittered.normalize()
    }
}

/// Follows a refracted ray while it stays inside the medium, accumulating
/// per-channel Beer-Lambert attenuation over the path length and turning
/// total internal reflection into further internal bounces. Exits either
/// into the background or into `shade` of whatever the ray hits outside.
fn trace_inside(
    scene: &Scene,
    entry_point: &Vec3f,
    entry_direction: &Vec3f,
    entry_hit: &Intersection,
    depth: u32,
    rng: &mut impl Rng,
) -> Vec3f {
    let material = &entry_hit.material;
    let mut transmittance = Vec3f::new(1.0, 1.0, 1.0);
    let mut origin = *entry_point;
    let mut direction = *entry_direction;
    let mut bounce = depth;
    loop {
        if bounce >= scene.settings.max_bounce {
            return Vec3f::zeros();
        }
        let ray = Ray::new(origin + direction * RAY_BIAS, direction);
        let Some(inner_hit) = scene.intersect(&ray) else {
            // open geometry, the ray escaped without crossing a surface
            return transmittance.component_mul(&scene.background);
        };
        let path_length = inner_hit.t;
        transmittance.x *= (-material.attenuation.x * path_length).exp();
        transmittance.y *= (-material.attenuation.y * path_length).exp();
        transmittance.z *= (-material.attenuation.z * path_length).exp();

        // the hit normal faces back into the medium; eta flips on the way out
        match refract_dir(&direction, &inner_hit.normal, material.kf) {
            Some(exit_direction) => {
                let exit_ray = Ray::new(
                    inner_hit.position + exit_direction * RAY_BIAS,
                    exit_direction,
                );
                let outside = match scene.intersect(&exit_ray) {
                    Some(outside_hit) => shade(scene, &outside_hit, bounce + 1, rng),
                    None => scene.background,
                };
                return transmittance.component_mul(&outside);
            }
            None => {
                // total internal reflection, keep bouncing inside
                direction = reflect_dir(&direction, &inner_hit.normal);
                origin = inner_hit.position;
                bounce += 1;
            }
        }
    }
}
