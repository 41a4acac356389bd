mod aabb;
mod bvh;
mod camera;
mod geometry;
mod light;
mod loaders;
mod material;
mod output;
mod scene;
mod shader;
mod utils;

use std::sync::Arc;

use anyhow::{bail, Context};

use crate::camera::{Camera, Projection};
use crate::geometry::{Fp, Renderable, Sphere, Triangle, Vec3f};
use crate::light::Light;
use crate::material::{default_material, Material};
use crate::scene::{RenderSettings, Scene};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <out.ppm> [model.obj [model.mtl [texture.png]]]", args[0]);
    }
    let out_path = &args[1];

    let camera = Camera::new(
        Vec3f::new(0.0, 5.0, 10.0),
        Vec3f::new(0.0, 1.0, 0.0),
        Vec3f::new(0.0, -0.5, -1.0),
        1.0,
        60.0,
        1024,
        768,
        Projection::Perspective,
    )
    .context("demo camera setup")?;
    let mut scene = Scene::new(
        camera,
        Vec3f::new(0.2, 0.3, 0.5),
        RenderSettings::default(),
    );
    populate_demo_scene(&mut scene);

    if args.len() >= 3 {
        let material = match args.get(3) {
            Some(mtl_path) => {
                let materials =
                    loaders::load_mtl(mtl_path).with_context(|| format!("loading {mtl_path}"))?;
                materials
                    .first()
                    .cloned()
                    .unwrap_or_else(default_material)
            }
            None => default_material(),
        };
        let texture = match args.get(4) {
            Some(texture_path) => Some(Arc::new(
                loaders::load_texture(texture_path)
                    .with_context(|| format!("loading {texture_path}"))?,
            )),
            None => None,
        };
        let obj_path = &args[2];
        let mesh = loaders::load_obj(obj_path, material, texture)
            .with_context(|| format!("loading {obj_path}"))?;
        let mut model = Renderable::Mesh(mesh);
        // scale the model into a ~4 unit box sitting left of the spheres
        let extent = model.aabb().max - model.aabb().min;
        let largest = extent.x.max(extent.y).max(extent.z);
        let center = (model.aabb().min + model.aabb().max) * 0.5;
        let scale = if largest > 0.0 { 4.0 / largest } else { 1.0 };
        model.transform(scale, Vec3f::new(-3.0, 1.0, -2.0) - center * scale);
        scene.add_renderable(model);
    }

    scene.render();
    output::write_ppm(
        out_path,
        scene.frame(),
        scene.camera.width(),
        scene.camera.height(),
    )
    .with_context(|| format!("writing {out_path}"))?;
    let png_path = format!("{out_path}.png");
    output::write_png(
        &png_path,
        scene.frame(),
        scene.camera.width(),
        scene.camera.height(),
    )
    .with_context(|| format!("writing {png_path}"))?;
    log::info!("wrote {out_path} and {png_path}");
    Ok(())
}

fn populate_demo_scene(scene: &mut Scene) {
    let floor_material = Arc::new(Material {
        name: "floor".to_string(),
        ka: Vec3f::new(0.1, 0.1, 0.1),
        kd: Vec3f::new(0.6, 0.6, 0.6),
        ks: Vec3f::new(0.1, 0.1, 0.1),
        ne: 10.0,
        ..Default::default()
    });
    let half: Fp = 30.0;
    let corners = [
        Vec3f::new(-half, 0.0, -half),
        Vec3f::new(half, 0.0, -half),
        Vec3f::new(half, 0.0, half),
        Vec3f::new(-half, 0.0, half),
    ];
    scene.add_renderable(Renderable::Triangle(Triangle::new(
        [corners[0], corners[1], corners[2]],
        Arc::clone(&floor_material),
    )));
    scene.add_renderable(Renderable::Triangle(Triangle::new(
        [corners[0], corners[2], corners[3]],
        floor_material,
    )));

    let matte = Arc::new(Material {
        name: "matte-red".to_string(),
        ka: Vec3f::new(0.05, 0.02, 0.02),
        kd: Vec3f::new(0.8, 0.2, 0.2),
        ks: Vec3f::new(0.3, 0.3, 0.3),
        ne: 50.0,
        ..Default::default()
    });
    scene.add_renderable(Renderable::Sphere(Sphere::new(
        Vec3f::new(2.5, 1.0, -1.0),
        1.0,
        matte,
    )));

    let mirror = Arc::new(Material {
        name: "mirror".to_string(),
        ka: Vec3f::new(0.02, 0.02, 0.02),
        kd: Vec3f::new(0.05, 0.05, 0.05),
        ks: Vec3f::new(0.6, 0.6, 0.6),
        ne: 300.0,
        km: Vec3f::new(0.9, 0.9, 0.9),
        g: 0.0,
        ..Default::default()
    });
    scene.add_renderable(Renderable::Sphere(Sphere::new(
        Vec3f::new(0.0, 1.5, -3.0),
        1.5,
        mirror,
    )));

    let glass = Arc::new(Material {
        name: "glass".to_string(),
        ka: Vec3f::new(0.01, 0.01, 0.01),
        kd: Vec3f::new(0.02, 0.02, 0.02),
        ks: Vec3f::new(0.5, 0.5, 0.5),
        ne: 200.0,
        kf: 1.5,
        attenuation: Vec3f::new(0.05, 0.02, 0.02),
        ..Default::default()
    });
    scene.add_renderable(Renderable::Sphere(Sphere::new(
        Vec3f::new(1.0, 1.0, 1.5),
        1.0,
        glass,
    )));

    scene.add_light(Light::Ambient {
        intensity: Vec3f::new(0.08, 0.08, 0.08),
    });
    scene.add_light(Light::Point {
        intensity: Vec3f::new(120.0, 120.0, 120.0),
        position: Vec3f::new(-4.0, 8.0, 4.0),
    });
    scene.add_light(Light::parallel(
        Vec3f::new(0.15, 0.15, 0.18),
        Vec3f::new(0.4, -1.0, -0.3),
    ));
    scene.add_light(Light::Area {
        intensity: Vec3f::new(60.0, 60.0, 55.0),
        corner: Vec3f::new(3.0, 7.0, 2.0),
        edge_u: Vec3f::new(2.0, 0.0, 0.0),
        edge_v: Vec3f::new(0.0, 0.0, 2.0),
    });
    scene.settings.shadow_rays = 4;
}
