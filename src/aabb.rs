use crate::geometry::{Fp, Ray, Vec3f, FP_INF, FP_NEG_INF};

#[derive(Clone, Debug)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Default for Aabb {
    /// The empty box: any union with it yields the other operand.
    fn default() -> Self {
        Aabb {
            min: Vec3f::new(FP_INF, FP_INF, FP_INF),
            max: Vec3f::new(FP_NEG_INF, FP_NEG_INF, FP_NEG_INF),
        }
    }
}

impl Aabb {
    pub fn new(min: Vec3f, max: Vec3f) -> Aabb {
        Aabb { min, max }
    }

    pub fn around_sphere(center: &Vec3f, radius: Fp) -> Aabb {
        let r = Vec3f::new(radius, radius, radius);
        Aabb {
            min: center - r,
            max: center + r,
        }
    }

    pub fn around_points(points: &[Vec3f]) -> Aabb {
        let mut result = Aabb::default();
        for point in points {
            result.min = result.min.inf(point);
            result.max = result.max.sup(point);
        }
        result
    }

    pub fn extend_aabb(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn centroid_key(&self, axis: usize) -> Fp {
        self.min[axis] + self.max[axis]
    }

    /// Slab test. Divides by the direction components as-is: a zero
    /// component yields IEEE infinities (and a NaN when the origin lies
    /// exactly on a slab plane), and the max/min folding below treats
    /// either correctly as "no constraint from this axis". Boxes entirely
    /// behind the origin are rejected by clamping t_min at zero.
    pub fn intersects(&self, ray: &Ray) -> bool {
        let mut t_min: Fp = 0.0;
        let mut t_max = FP_INF;
        for axis in 0..3 {
            let inv = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = Fp::max(t_min, t0);
            t_max = Fp::min(t_max, t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}
