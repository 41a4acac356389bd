use thiserror::Error;

use crate::geometry::{Fp, Ray, Vec3f, EPS};
use crate::utils::degree_to_radian;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera up and look directions are nearly parallel")]
    DegeneratePose,
    #[error("film resolution must be nonzero, got {width}x{height}")]
    EmptyFilm { width: usize, height: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// World-space film-plane layout derived from the camera settings. The
/// source kept this behind a dirty flag; every setter here just recomputes
/// it, so render-time ray queries are plain reads.
#[derive(Clone, Debug)]
struct FilmGeometry {
    forward: Vec3f,
    right: Vec3f,
    up: Vec3f,
    pixel_width: Fp,
    pixel_height: Fp,
    half_width: Fp,
    half_height: Fp,
}

#[derive(Clone, Debug)]
pub struct Camera {
    focal: Fp,
    hfov_degrees: Fp,
    position: Vec3f,
    up_hint: Vec3f,
    look: Vec3f,
    width: usize,
    height: usize,
    projection: Projection,
    film: FilmGeometry,
}

impl Camera {
    pub fn new(
        position: Vec3f,
        up: Vec3f,
        look: Vec3f,
        focal: Fp,
        hfov_degrees: Fp,
        width: usize,
        height: usize,
        projection: Projection,
    ) -> Result<Camera, CameraError> {
        let film = derive_film(&up, &look, focal, hfov_degrees, width, height)?;
        Ok(Camera {
            focal,
            hfov_degrees,
            position,
            up_hint: up,
            look,
            width,
            height,
            projection,
            film,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn position(&self) -> &Vec3f {
        &self.position
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_position(&mut self, position: Vec3f) {
        self.position = position;
    }

    pub fn set_pose(&mut self, up: Vec3f, look: Vec3f) -> Result<(), CameraError> {
        self.film = derive_film(
            &up,
            &look,
            self.focal,
            self.hfov_degrees,
            self.width,
            self.height,
        )?;
        self.up_hint = up;
        self.look = look;
        Ok(())
    }

    pub fn set_focal(&mut self, focal: Fp) -> Result<(), CameraError> {
        self.film = derive_film(
            &self.up_hint,
            &self.look,
            focal,
            self.hfov_degrees,
            self.width,
            self.height,
        )?;
        self.focal = focal;
        Ok(())
    }

    pub fn set_hfov_degrees(&mut self, hfov_degrees: Fp) -> Result<(), CameraError> {
        self.film = derive_film(
            &self.up_hint,
            &self.look,
            self.focal,
            hfov_degrees,
            self.width,
            self.height,
        )?;
        self.hfov_degrees = hfov_degrees;
        Ok(())
    }

    pub fn set_resolution(&mut self, width: usize, height: usize) -> Result<(), CameraError> {
        self.film = derive_film(
            &self.up_hint,
            &self.look,
            self.focal,
            self.hfov_degrees,
            width,
            height,
        )?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Ray through the film sample at (row, col). Fractional coordinates
    /// are sub-pixel offsets for antialiasing jitter; integer coordinates
    /// address the pixel center.
    pub fn ray_through_film(&self, row: Fp, col: Fp) -> Ray {
        let film = &self.film;
        let x = (col + 0.5) * film.pixel_width - film.half_width;
        let y = film.half_height - (row + 0.5) * film.pixel_height;
        match self.projection {
            Projection::Perspective => Ray::new(
                self.position,
                film.forward * self.focal + film.right * x + film.up * y,
            ),
            Projection::Orthographic => {
                Ray::new(self.position + film.right * x + film.up * y, film.forward)
            }
        }
    }
}

fn derive_film(
    up: &Vec3f,
    look: &Vec3f,
    focal: Fp,
    hfov_degrees: Fp,
    width: usize,
    height: usize,
) -> Result<FilmGeometry, CameraError> {
    if width == 0 || height == 0 {
        return Err(CameraError::EmptyFilm { width, height });
    }
    let forward = look.normalize();
    let right = forward.cross(up);
    if right.norm() < EPS {
        return Err(CameraError::DegeneratePose);
    }
    let right = right.normalize();
    let true_up = right.cross(&forward);
    let aspect = width as Fp / height as Fp;
    let half_width = focal * (degree_to_radian(hfov_degrees) * 0.5).tan();
    let half_height = half_width / aspect;
    Ok(FilmGeometry {
        forward,
        right,
        up: true_up,
        pixel_width: 2.0 * half_width / width as Fp,
        pixel_height: 2.0 * half_height / height as Fp,
        half_width,
        half_height,
    })
}
