use std::f64::consts::PI;

use crate::geometry::Fp;

pub fn degree_to_radian(degrees: Fp) -> Fp {
    degrees * PI / 180.0
}
