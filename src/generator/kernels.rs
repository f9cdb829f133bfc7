//! Radial falloff kernels used to shape blobs.
//!
//! Each kernel maps an offset `(x, y)` from the blob centre, a radius and a
//! peak height to an integer contribution. Arithmetic is done in `f64` and
//! truncated toward zero. Every kernel is zero beyond Euclidean distance
//! `radius`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kernel {
    /// Full height at the centre only
    Delta,
    /// Linear in Chebyshev distance
    Pyramid,
    /// Linear in Euclidean distance
    Cone,
    /// Linear in Manhattan distance, clamped at zero
    Diamond,
    /// `3t² - 2t³`
    Smoothstep,
    /// `6t⁵ - 15t⁴ + 10t³`
    Smootherstep,
    /// `-20t⁷ + 70t⁶ - 84t⁵ + 35t⁴`
    Smootheststep,
}

impl Kernel {
    pub fn all() -> &'static [Kernel] {
        &[
            Kernel::Delta,
            Kernel::Pyramid,
            Kernel::Cone,
            Kernel::Diamond,
            Kernel::Smoothstep,
            Kernel::Smootherstep,
            Kernel::Smootheststep,
        ]
    }

    /// Parse from string (for CLI)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "delta" => Some(Self::Delta),
            "pyramid" => Some(Self::Pyramid),
            "cone" => Some(Self::Cone),
            "diamond" => Some(Self::Diamond),
            "smoothstep" => Some(Self::Smoothstep),
            "smootherstep" => Some(Self::Smootherstep),
            "smootheststep" => Some(Self::Smootheststep),
            _ => None,
        }
    }

    /// Contribution at offset `(x, y)` of a blob with the given radius and
    /// peak height. A non-positive radius only keeps the delta's centre.
    pub fn at(&self, x: i32, y: i32, radius: i32, height: i32) -> i32 {
        if let Kernel::Delta = self {
            return if x == 0 && y == 0 { height } else { 0 };
        }
        if radius <= 0 {
            return 0;
        }
        let (fx, fy, r) = (x as f64, y as f64, radius as f64);
        let euclidean = (fx * fx + fy * fy).sqrt() / r;
        if euclidean > 1.0 {
            return 0;
        }
        let factor = match self {
            Kernel::Delta => 0.0,
            Kernel::Pyramid => 1.0 - fx.abs().max(fy.abs()) / r,
            Kernel::Cone => 1.0 - euclidean,
            Kernel::Diamond => (1.0 - (fx.abs() + fy.abs()) / r).max(0.0),
            Kernel::Smoothstep => {
                let t = 1.0 - euclidean;
                t * t * (3.0 - 2.0 * t)
            }
            Kernel::Smootherstep => {
                let t = 1.0 - euclidean;
                t * t * t * (t * (6.0 * t - 15.0) + 10.0)
            }
            Kernel::Smootheststep => {
                let t = 1.0 - euclidean;
                let t4 = t * t * t * t;
                t4 * (t * (t * (-20.0 * t + 70.0) - 84.0) + 35.0)
            }
        };
        (factor * height as f64) as i32
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kernel::Delta => "delta",
            Kernel::Pyramid => "pyramid",
            Kernel::Cone => "cone",
            Kernel::Diamond => "diamond",
            Kernel::Smoothstep => "smoothstep",
            Kernel::Smootherstep => "smootherstep",
            Kernel::Smootheststep => "smootheststep",
        };
        write!(f, "{}", name)
    }
}
