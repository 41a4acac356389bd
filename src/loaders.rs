use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::geometry::{Fp, Mesh, Triangle, Vec3f};
use crate::material::{Material, Texture};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}

fn io_error(path: &str, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_string(),
        source,
    }
}

fn parse_error(path: &str, line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Parse {
        path: path.to_string(),
        line,
        message: message.into(),
    }
}

/// Parses the mtl subset the renderer consumes: `newmtl` plus the
/// Ka/Kd/Ks/Ke colors. Everything else (illum, d, Tr, Tf, map_*) is
/// skipped. Materials come back in order of first appearance.
pub fn load_mtl(path: impl AsRef<Path>) -> Result<Vec<Arc<Material>>, LoadError> {
    let label = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).map_err(|e| io_error(&label, e))?;
    parse_mtl(BufReader::new(file), &label)
}

pub fn parse_mtl(reader: impl BufRead, label: &str) -> Result<Vec<Arc<Material>>, LoadError> {
    let mut materials = Vec::new();
    let mut current: Option<Material> = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(label, e))?;
        let line_number = index + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "newmtl" => {
                if let Some(finished) = current.take() {
                    materials.push(Arc::new(finished));
                }
                let name = tokens.next().ok_or_else(|| {
                    parse_error(label, line_number, "newmtl without a material name")
                })?;
                current = Some(Material::named(name));
            }
            "Ka" | "Kd" | "Ks" | "Ke" => {
                let color = parse_vec3(&mut tokens, label, line_number)?;
                let material = current.as_mut().ok_or_else(|| {
                    parse_error(label, line_number, format!("{keyword} before any newmtl"))
                })?;
                match keyword {
                    "Ka" => material.ka = color,
                    "Kd" => material.kd = color,
                    "Ks" => material.ks = color,
                    _ => material.ke = color,
                }
            }
            // illum, d, Tr, Tf, map_* and friends are not consumed here
            _ => {}
        }
    }
    if let Some(finished) = current {
        materials.push(Arc::new(finished));
    }
    log::debug!("{label}: {} materials", materials.len());
    Ok(materials)
}

/// Parses the obj subset (`v`, `vt`, `vn`, triangular `f` with optional
/// vt/vn slots) into a mesh with its BVH already built. Every triangle
/// shares `material` and, when given, `texture`.
pub fn load_obj(
    path: impl AsRef<Path>,
    material: Arc<Material>,
    texture: Option<Arc<Texture>>,
) -> Result<Mesh, LoadError> {
    let label = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).map_err(|e| io_error(&label, e))?;
    parse_obj(BufReader::new(file), &label, material, texture)
}

pub fn parse_obj(
    reader: impl BufRead,
    label: &str,
    material: Arc<Material>,
    texture: Option<Arc<Texture>>,
) -> Result<Mesh, LoadError> {
    // dummy zeroth entries keep the obj 1-based indexing as-is
    let mut positions = vec![Vec3f::zeros()];
    let mut uvs = vec![(0.0, 0.0)];
    let mut normals = vec![Vec3f::zeros()];
    let mut triangles = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(label, e))?;
        let line_number = index + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => positions.push(parse_vec3(&mut tokens, label, line_number)?),
            "vt" => {
                let u = parse_fp(tokens.next(), label, line_number)?;
                let v = parse_fp(tokens.next(), label, line_number)?;
                uvs.push((u, v));
            }
            "vn" => normals.push(parse_vec3(&mut tokens, label, line_number)?),
            "f" => {
                let corners: Vec<&str> = tokens.collect();
                if corners.len() != 3 {
                    return Err(parse_error(
                        label,
                        line_number,
                        format!("face with {} vertices, only triangles supported", corners.len()),
                    ));
                }
                let mut vertex_indices = [0usize; 3];
                let mut uv_indices = [0usize; 3];
                let mut normal_indices = [0usize; 3];
                for (corner, token) in corners.iter().enumerate() {
                    let mut slots = token.split('/');
                    vertex_indices[corner] =
                        parse_index(slots.next(), label, line_number, positions.len())?;
                    uv_indices[corner] =
                        parse_optional_index(slots.next(), label, line_number, uvs.len())?;
                    normal_indices[corner] =
                        parse_optional_index(slots.next(), label, line_number, normals.len())?;
                }
                let mut triangle = Triangle::new(
                    [
                        positions[vertex_indices[0]],
                        positions[vertex_indices[1]],
                        positions[vertex_indices[2]],
                    ],
                    Arc::clone(&material),
                );
                if uv_indices.iter().all(|&i| i != 0) {
                    triangle.set_vertex_uvs([
                        uvs[uv_indices[0]],
                        uvs[uv_indices[1]],
                        uvs[uv_indices[2]],
                    ]);
                    if let Some(texture) = &texture {
                        triangle.set_texture(Arc::clone(texture));
                    }
                }
                if normal_indices.iter().all(|&i| i != 0) {
                    triangle.set_vertex_normals([
                        normals[normal_indices[0]],
                        normals[normal_indices[1]],
                        normals[normal_indices[2]],
                    ]);
                }
                triangles.push(triangle);
            }
            // mtllib/usemtl/o/g/s lines are handled by the caller's choice
            // of material, not here
            _ => {}
        }
    }
    if triangles.is_empty() {
        return Err(parse_error(label, 0, "no faces found"));
    }
    log::debug!("{label}: {} triangles", triangles.len());
    Ok(Mesh::new(triangles))
}

pub fn load_texture(path: impl AsRef<Path>) -> Result<Texture, LoadError> {
    let label = path.as_ref().display().to_string();
    let decoded = image::open(path.as_ref()).map_err(|e| LoadError::Image {
        path: label.clone(),
        source: e,
    })?;
    let texture = Texture::from_rgb8(&decoded.to_rgb8());
    log::debug!("{label}: texture {}x{}", texture.width(), texture.height());
    Ok(texture)
}

fn parse_fp(token: Option<&str>, label: &str, line: usize) -> Result<Fp, LoadError> {
    let token = token.ok_or_else(|| parse_error(label, line, "missing number"))?;
    token
        .parse::<Fp>()
        .map_err(|_| parse_error(label, line, format!("bad number {token:?}")))
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    label: &str,
    line: usize,
) -> Result<Vec3f, LoadError> {
    let x = parse_fp(tokens.next(), label, line)?;
    let y = parse_fp(tokens.next(), label, line)?;
    let z = parse_fp(tokens.next(), label, line)?;
    Ok(Vec3f::new(x, y, z))
}

fn parse_index(
    token: Option<&str>,
    label: &str,
    line: usize,
    limit: usize,
) -> Result<usize, LoadError> {
    let index = parse_optional_index(token, label, line, limit)?;
    if index == 0 {
        return Err(parse_error(label, line, "face without a vertex index"));
    }
    Ok(index)
}

/// Empty/absent slots come back as 0, the dummy entry.
fn parse_optional_index(
    token: Option<&str>,
    label: &str,
    line: usize,
    limit: usize,
) -> Result<usize, LoadError> {
    let Some(token) = token else {
        return Ok(0);
    };
    if token.is_empty() {
        return Ok(0);
    }
    let index = token
        .parse::<usize>()
        .map_err(|_| parse_error(label, line, format!("bad index {token:?}")))?;
    if index >= limit {
        return Err(parse_error(
            label,
            line,
            format!("index {index} out of range (have {})", limit - 1),
        ));
    }
    Ok(index)
}
