//! World configuration.
//!
//! [`WorldParams`] is the user-facing, exponent-based description of a world
//! (what the CLI and JSON config files speak). [`TerrainParams`] is the
//! explicit grid it derives to, which is what [`crate::terrain::Terrain`] is
//! built from.

use std::path::Path;

use serde::{Deserialize, Serialize};

// =============================================================================
// TERRAIN SHAPE
// =============================================================================

/// Topology of the playable extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerrainShape {
    /// Bounded on both axes
    #[default]
    Flat,
    /// Wraps east-west
    Cylinder,
    /// Wraps on both axes
    Torus,
}

impl TerrainShape {
    pub fn all() -> &'static [TerrainShape] {
        &[TerrainShape::Flat, TerrainShape::Cylinder, TerrainShape::Torus]
    }

    /// Parse from string (for CLI)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flat" | "plane" => Some(Self::Flat),
            "cylinder" | "cylindrical" => Some(Self::Cylinder),
            "torus" | "toroidal" | "donut" => Some(Self::Torus),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Flat => "bounded rectangle, no wraparound",
            Self::Cylinder => "wraps horizontally",
            Self::Torus => "wraps horizontally and vertically",
        }
    }

    pub fn cycle_x(&self) -> bool {
        matches!(self, Self::Cylinder | Self::Torus)
    }

    pub fn cycle_y(&self) -> bool {
        matches!(self, Self::Torus)
    }
}

impl std::fmt::Display for TerrainShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Flat => "Flat",
            Self::Cylinder => "Cylinder",
            Self::Torus => "Torus",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// WORLD PARAMETERS
// =============================================================================

/// Exponent-based world description.
///
/// Chunk side is `2^plate_size_exponent - 1`. The theoretical world holds
/// `(2^(w-p+1) - 1) × (2^(w-p) - 1)` chunks, of which a square of
/// `2^(playable-p) - 1` chunks per side is materialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    pub seed: u64,
    pub shape: TerrainShape,
    pub plate_size_exponent: u32,
    pub world_size_exponent: u32,
    pub playable_size_exponent: u32,
    pub crust_thickness_factor: f64,
    pub sea_level_factor: f64,
    pub roughness_factor: f64,
    /// Seasonal swing of the sunlight angle
    pub axial_tilt: f64,
    pub distance_to_sun_factor: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 0,
            shape: TerrainShape::Flat,
            plate_size_exponent: 5,
            world_size_exponent: 10,
            playable_size_exponent: 8,
            crust_thickness_factor: 1.0,
            sea_level_factor: 1.0,
            roughness_factor: 8.0,
            axial_tilt: 0.15,
            distance_to_sun_factor: 1.0,
        }
    }
}

/// Largest exponent accepted for any size; keeps every world coordinate well
/// inside `i32`.
pub const MAX_SIZE_EXPONENT: u32 = 24;

const TEMPERATURE_DIFFERENCE: i32 = -60;
const HEIGHT_COOLING_FACTOR: f64 = -0.01;
const KELVIN_OFFSET: i32 = 273;

impl WorldParams {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ParamsError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ParamsError> {
        serde_json::to_string_pretty(self).map_err(|e| ParamsError::Parse(e.to_string()))
    }

    /// Derive the explicit grid description.
    pub fn terrain_params(&self) -> Result<TerrainParams, ParamsError> {
        for (name, value) in [
            ("plate_size_exponent", self.plate_size_exponent),
            ("world_size_exponent", self.world_size_exponent),
            ("playable_size_exponent", self.playable_size_exponent),
        ] {
            if value > MAX_SIZE_EXPONENT {
                return Err(ParamsError::InvalidExponent { name, value });
            }
        }
        if self.world_size_exponent <= self.plate_size_exponent {
            return Err(ParamsError::InvalidExponent {
                name: "world_size_exponent",
                value: self.world_size_exponent,
            });
        }
        if self.playable_size_exponent <= self.plate_size_exponent {
            return Err(ParamsError::InvalidExponent {
                name: "playable_size_exponent",
                value: self.playable_size_exponent,
            });
        }
        for (name, value) in [
            ("crust_thickness_factor", self.crust_thickness_factor),
            ("sea_level_factor", self.sea_level_factor),
            ("roughness_factor", self.roughness_factor),
            ("axial_tilt", self.axial_tilt),
        ] {
            if !value.is_finite() {
                return Err(ParamsError::InvalidFactor { name, value });
            }
        }
        if !(self.distance_to_sun_factor.is_finite() && self.distance_to_sun_factor > 0.0) {
            return Err(ParamsError::InvalidFactor {
                name: "distance_to_sun_factor",
                value: self.distance_to_sun_factor,
            });
        }

        let total_exponent = self.world_size_exponent - self.plate_size_exponent;
        let playable_exponent = self.playable_size_exponent - self.plate_size_exponent;
        let chunk_size = (1usize << self.plate_size_exponent) - 1;
        let playable_chunks = (1usize << playable_exponent) - 1;

        let params = TerrainParams {
            shape: self.shape,
            chunk_size,
            total_chunks_x: (1usize << (total_exponent + 1)) - 1,
            total_chunks_y: (1usize << total_exponent) - 1,
            playable_chunks_x: playable_chunks,
            playable_chunks_y: playable_chunks,
            crust_thickness: (chunk_size as f64 * self.crust_thickness_factor) as i32,
            sea_level: (chunk_size as f64 * self.sea_level_factor) as i32,
            roughness: (chunk_size as f64 * self.roughness_factor) as i32,
            axial_tilt: self.axial_tilt,
            base_temperature: (300.0 / self.distance_to_sun_factor) as i32 - KELVIN_OFFSET,
            temperature_difference: TEMPERATURE_DIFFERENCE,
            height_cooling_factor: HEIGHT_COOLING_FACTOR,
        };
        params.validate()?;
        Ok(params)
    }
}

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Explicit grid and climate constants of a terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    pub shape: TerrainShape,
    /// Side length `S` of every chunk, in tiles
    pub chunk_size: usize,
    pub total_chunks_x: usize,
    pub total_chunks_y: usize,
    pub playable_chunks_x: usize,
    pub playable_chunks_y: usize,
    pub crust_thickness: i32,
    pub sea_level: i32,
    pub roughness: i32,
    pub axial_tilt: f64,
    /// Equatorial temperature in °C
    pub base_temperature: i32,
    /// Temperature change from equator to pole
    pub temperature_difference: i32,
    /// Temperature change per unit of height
    pub height_cooling_factor: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            shape: TerrainShape::Flat,
            chunk_size: 31,
            total_chunks_x: 63,
            total_chunks_y: 31,
            playable_chunks_x: 7,
            playable_chunks_y: 7,
            crust_thickness: 31,
            sea_level: 31,
            roughness: 248,
            axial_tilt: 0.15,
            base_temperature: 27,
            temperature_difference: TEMPERATURE_DIFFERENCE,
            height_cooling_factor: HEIGHT_COOLING_FACTOR,
        }
    }
}

impl TerrainParams {
    /// Smallest chunk side the five-point curvature stencil fits in.
    pub const MIN_CHUNK_SIZE: usize = 4;

    /// Largest chunk side; every layer of a chunk allocates `S²` cells up front.
    pub const MAX_CHUNK_SIZE: usize = 4095;

    /// Small grid for tests and quick experiments.
    pub fn small(shape: TerrainShape, chunk_size: usize, chunks_x: usize, chunks_y: usize) -> Self {
        Self {
            shape,
            chunk_size,
            total_chunks_x: chunks_x * 2 + 1,
            total_chunks_y: chunks_y * 2 + 1,
            playable_chunks_x: chunks_x,
            playable_chunks_y: chunks_y,
            crust_thickness: chunk_size as i32,
            sea_level: chunk_size as i32,
            roughness: chunk_size as i32 * 8,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.chunk_size < Self::MIN_CHUNK_SIZE {
            return Err(ParamsError::ChunkTooSmall { size: self.chunk_size });
        }
        if self.chunk_size > Self::MAX_CHUNK_SIZE {
            return Err(ParamsError::ChunkTooLarge { size: self.chunk_size });
        }
        if self.total_chunks_x == 0
            || self.total_chunks_y == 0
            || self.playable_chunks_x == 0
            || self.playable_chunks_y == 0
        {
            return Err(ParamsError::EmptyGrid);
        }
        for (axis, playable, total) in [
            ('x', self.playable_chunks_x, self.total_chunks_x),
            ('y', self.playable_chunks_y, self.total_chunks_y),
        ] {
            if playable > total {
                return Err(ParamsError::PlayableExceedsTotal { axis, playable, total });
            }
            let tiles = total.checked_mul(self.chunk_size);
            if tiles.map_or(true, |t| t > (i32::MAX / 4) as usize) {
                return Err(ParamsError::TooLarge { axis, chunks: total });
            }
        }
        Ok(())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while loading or deriving world parameters.
#[derive(Debug)]
pub enum ParamsError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid JSON for [`WorldParams`]
    Parse(String),
    InvalidExponent { name: &'static str, value: u32 },
    InvalidFactor { name: &'static str, value: f64 },
    ChunkTooSmall { size: usize },
    ChunkTooLarge { size: usize },
    EmptyGrid,
    PlayableExceedsTotal { axis: char, playable: usize, total: usize },
    TooLarge { axis: char, chunks: usize },
}

impl std::fmt::Display for ParamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamsError::Io(e) => write!(f, "IO error: {}", e),
            ParamsError::Parse(e) => write!(f, "Config parse error: {}", e),
            ParamsError::InvalidExponent { name, value } => {
                write!(f, "Invalid {}: {}", name, value)
            }
            ParamsError::InvalidFactor { name, value } => write!(f, "Invalid {}: {}", name, value),
            ParamsError::ChunkTooSmall { size } => write!(
                f,
                "Chunk size {} is below the minimum of {}",
                size,
                TerrainParams::MIN_CHUNK_SIZE
            ),
            ParamsError::ChunkTooLarge { size } => write!(
                f,
                "Chunk size {} is above the maximum of {}",
                size,
                TerrainParams::MAX_CHUNK_SIZE
            ),
            ParamsError::EmptyGrid => write!(f, "Chunk counts must be at least 1"),
            ParamsError::PlayableExceedsTotal { axis, playable, total } => write!(
                f,
                "Playable extent of {} chunks exceeds total of {} on the {} axis",
                playable, total, axis
            ),
            ParamsError::TooLarge { axis, chunks } => {
                write!(f, "{} chunks on the {} axis is too large", chunks, axis)
            }
        }
    }
}

impl std::error::Error for ParamsError {}

impl From<std::io::Error> for ParamsError {
    fn from(e: std::io::Error) -> Self {
        ParamsError::Io(e)
    }
}
