use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::RgbImage;

use crate::geometry::{Fp, Vec3f};

const GAMMA: Fp = 2.2;

/// Linear 0..1 channel to gamma-encoded 8-bit.
pub fn encode_channel(value: Fp) -> u8 {
    (value.clamp(0.0, 1.0).powf(1.0 / GAMMA) * 255.0).round() as u8
}

fn quantize(frame: &[Vec3f]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * 3);
    for color in frame {
        bytes.push(encode_channel(color.x));
        bytes.push(encode_channel(color.y));
        bytes.push(encode_channel(color.z));
    }
    bytes
}

/// Binary ppm: `P6\n<w> <h>\n255\n` followed by raw rgb bytes.
pub fn write_ppm(
    path: impl AsRef<Path>,
    frame: &[Vec3f],
    width: usize,
    height: usize,
) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    out.write_all(&quantize(frame))?;
    out.flush()
}

pub fn write_png(
    path: impl AsRef<Path>,
    frame: &[Vec3f],
    width: usize,
    height: usize,
) -> image::ImageResult<()> {
    let bytes = quantize(frame);
    let img = RgbImage::from_raw(width as u32, height as u32, bytes)
        .expect("frame buffer size does not match resolution");
    img.save_with_format(path, image::ImageFormat::Png)
}
