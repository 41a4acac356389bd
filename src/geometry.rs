use std::sync::Arc;

use arrayvec::ArrayVec;
use nalgebra::Vector3;

use crate::aabb::Aabb;
use crate::bvh::BvhTree;
use crate::material::{Material, Texture};

pub type Fp = f64;
pub type Vec3f = Vector3<Fp>;

pub const EPS: Fp = 1e-5;
/// Offset applied to secondary-ray origins so a surface does not shadow
/// or reflect itself at t ~ 0.
pub const RAY_BIAS: Fp = 1e-4;
pub const FP_INF: Fp = Fp::INFINITY;
pub const FP_NEG_INF: Fp = Fp::NEG_INFINITY;

#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Vec3f,
    pub direction: Vec3f,
}

impl Ray {
    /// The direction is normalized here and stays unit-length afterwards.
    pub fn new(origin: Vec3f, direction: Vec3f) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: Fp) -> Vec3f {
        self.origin + self.direction * t
    }
}

/// Barycentric + uv sample carried from a textured triangle hit to the
/// shading pass.
#[derive(Clone)]
pub struct TexturePayload {
    pub texture: Arc<Texture>,
    pub barycentric: Vec3f,
    pub uv: (Fp, Fp),
}

/// Produced per ray query; the nearest one (smallest t) wins when merging.
/// The normal is always oriented against the incoming ray.
#[derive(Clone)]
pub struct Intersection {
    pub t: Fp,
    pub position: Vec3f,
    pub normal: Vec3f,
    pub view_dir: Vec3f,
    pub material: Arc<Material>,
    pub payload: Option<TexturePayload>,
}

pub fn reflect_dir(incident: &Vec3f, normal: &Vec3f) -> Vec3f {
    incident - normal * (2.0 * incident.dot(normal))
}

/// Snell refraction of `incident` (pointing toward the surface) through a
/// surface whose `normal` faces against it. `eta` is n_from / n_to.
/// None means total internal reflection.
pub fn refract_dir(incident: &Vec3f, normal: &Vec3f, eta: Fp) -> Option<Vec3f> {
    let cos_i = -incident.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        None
    } else {
        Some(incident * eta + normal * (eta * cos_i - k.sqrt()))
    }
}

#[derive(Clone)]
pub struct Sphere {
    pub center: Vec3f,
    pub radius: Fp,
    pub material: Arc<Material>,
    aabb: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3f, radius: Fp, material: Arc<Material>) -> Sphere {
        Sphere {
            center,
            radius,
            material,
            aabb: Aabb::around_sphere(&center, radius),
        }
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        if !self.aabb.intersects(ray) {
            return None;
        }
        let o = ray.origin - self.center;
        let b = 2.0 * o.dot(&ray.direction);
        let c = o.dot(&o) - self.radius * self.radius;
        // direction is unit-length, so the quadratic coefficient is 1
        let discr = b * b - 4.0 * c;
        if discr < 0.0 {
            return None;
        }
        let mut roots = ArrayVec::<Fp, 2>::new();
        roots.push((-b - discr.sqrt()) / 2.0);
        roots.push((-b + discr.sqrt()) / 2.0);
        if roots[1] < EPS {
            return None;
        }
        // the near root is behind the origin when the ray starts inside
        let t = if roots[0] >= EPS { roots[0] } else { roots[1] };
        let position = ray.at(t);
        let mut normal = (position - self.center).normalize();
        if ray.direction.dot(&normal) > 0.0 {
            normal = -normal;
        }
        Some(Intersection {
            t,
            position,
            normal,
            view_dir: -ray.direction,
            material: Arc::clone(&self.material),
            payload: None,
        })
    }

    pub fn transform(&mut self, scale: Fp, translation: Vec3f) {
        self.center = self.center * scale + translation;
        self.radius *= scale;
        self.aabb = Aabb::around_sphere(&self.center, self.radius);
    }
}

#[derive(Clone)]
pub struct Triangle {
    pub vertices: [Vec3f; 3],
    pub vertex_normals: Option<[Vec3f; 3]>,
    pub vertex_uvs: Option<[(Fp, Fp); 3]>,
    pub material: Arc<Material>,
    pub texture: Option<Arc<Texture>>,
    face_normal: Vec3f,
    aabb: Aabb,
}

impl Triangle {
    pub fn new(vertices: [Vec3f; 3], material: Arc<Material>) -> Triangle {
        let face_normal = Self::face_normal_of(&vertices);
        let aabb = Aabb::around_points(&vertices);
        Triangle {
            vertices,
            vertex_normals: None,
            vertex_uvs: None,
            material,
            texture: None,
            face_normal,
            aabb,
        }
    }

    fn face_normal_of(v: &[Vec3f; 3]) -> Vec3f {
        let n = (v[1] - v[0]).cross(&(v[2] - v[0]));
        if n.norm() > EPS {
            n.normalize()
        } else {
            // degenerate triangle, the intersect determinant rejects it anyway
            Vec3f::new(0.0, 0.0, 1.0)
        }
    }

    pub fn set_vertex_normals(&mut self, normals: [Vec3f; 3]) {
        self.vertex_normals = Some(normals);
    }

    pub fn set_vertex_uvs(&mut self, uvs: [(Fp, Fp); 3]) {
        self.vertex_uvs = Some(uvs);
    }

    pub fn set_texture(&mut self, texture: Arc<Texture>) {
        self.texture = Some(texture);
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Moeller-Trumbore solve for (beta, gamma, t).
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let [v0, v1, v2] = self.vertices;
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let p = ray.direction.cross(&e2);
        let det = e1.dot(&p);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = ray.origin - v0;
        let beta = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&beta) {
            return None;
        }
        let q = s.cross(&e1);
        let gamma = ray.direction.dot(&q) * inv_det;
        if gamma < 0.0 || beta + gamma > 1.0 {
            return None;
        }
        let t = e2.dot(&q) * inv_det;
        if t < EPS {
            return None;
        }
        let alpha = 1.0 - beta - gamma;
        let mut normal = match &self.vertex_normals {
            Some([n0, n1, n2]) => (n0 * alpha + n1 * beta + n2 * gamma).normalize(),
            None => self.face_normal,
        };
        if ray.direction.dot(&normal) > 0.0 {
            normal = -normal;
        }
        let payload = match (&self.vertex_uvs, &self.texture) {
            (Some([uv0, uv1, uv2]), Some(texture)) => Some(TexturePayload {
                texture: Arc::clone(texture),
                barycentric: Vec3f::new(alpha, beta, gamma),
                uv: (
                    uv0.0 * alpha + uv1.0 * beta + uv2.0 * gamma,
                    uv0.1 * alpha + uv1.1 * beta + uv2.1 * gamma,
                ),
            }),
            _ => None,
        };
        Some(Intersection {
            t,
            position: ray.at(t),
            normal,
            view_dir: -ray.direction,
            material: Arc::clone(&self.material),
            payload,
        })
    }

    pub fn transform(&mut self, scale: Fp, translation: Vec3f) {
        for v in &mut self.vertices {
            *v = *v * scale + translation;
        }
        self.face_normal = Self::face_normal_of(&self.vertices);
        self.aabb = Aabb::around_points(&self.vertices);
    }
}

/// A triangle soup with its own BVH; built once, rebuilt on mutation.
pub struct Mesh {
    triangles: Vec<Triangle>,
    bvh: BvhTree,
    aabb: Aabb,
}

impl Mesh {
    pub fn new(mut triangles: Vec<Triangle>) -> Mesh {
        let bvh = BvhTree::build(&mut triangles);
        let aabb = triangles
            .iter()
            .fold(Aabb::default(), |acc, tri| acc.extend_aabb(tri.aabb()));
        Mesh {
            triangles,
            bvh,
            aabb,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.bvh.intersect(ray, &self.triangles)
    }

    pub fn transform(&mut self, scale: Fp, translation: Vec3f) {
        for tri in &mut self.triangles {
            tri.transform(scale, translation);
        }
        self.bvh = BvhTree::build(&mut self.triangles);
        self.aabb = self
            .triangles
            .iter()
            .fold(Aabb::default(), |acc, tri| acc.extend_aabb(tri.aabb()));
    }
}

pub enum Renderable {
    Sphere(Sphere),
    Triangle(Triangle),
    Mesh(Mesh),
}

impl Renderable {
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        match self {
            Renderable::Sphere(sphere) => sphere.intersect(ray),
            Renderable::Triangle(triangle) => triangle.intersect(ray),
            Renderable::Mesh(mesh) => mesh.intersect(ray),
        }
    }

    pub fn aabb(&self) -> &Aabb {
        match self {
            Renderable::Sphere(sphere) => sphere.aabb(),
            Renderable::Triangle(triangle) => triangle.aabb(),
            Renderable::Mesh(mesh) => mesh.aabb(),
        }
    }

    pub fn transform(&mut self, scale: Fp, translation: Vec3f) {
        match self {
            Renderable::Sphere(sphere) => sphere.transform(scale, translation),
            Renderable::Triangle(triangle) => triangle.transform(scale, translation),
            Renderable::Mesh(mesh) => mesh.transform(scale, translation),
        }
    }
}
