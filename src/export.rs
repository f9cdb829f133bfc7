//! PNG rendering and JSON summaries of a generated terrain.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::params::TerrainParams;
use crate::terrain::{Terrain, TerrainStats};
use crate::tile::Tile;

/// Largest playable area rendered in one image.
pub const MAX_PIXELS: u64 = 100_000_000;

#[derive(Debug)]
pub enum ExportError {
    /// Playable area exceeds [`MAX_PIXELS`]
    ImageTooLarge { width: u64, height: u64 },
    Io(std::io::Error),
    /// Failed to encode or save the image
    SaveFailed(String),
    Serialization(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::ImageTooLarge { width, height } => write!(
                f,
                "Requested image size {}x{} ({} pixels) exceeds maximum {} pixels",
                width,
                height,
                width * height,
                MAX_PIXELS
            ),
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::SaveFailed(msg) => write!(f, "Failed to save image: {}", msg),
            ExportError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

fn to_channel(value: i32) -> u8 {
    0xFF - value.clamp(0, 0xFF) as u8
}

/// Colour of one tile, by whichever layer dominates: magma red, land green,
/// water blue (white when frozen), pollution black. Deeper excess renders
/// darker.
pub fn tile_color(tile: &Tile<'_>) -> [u8; 3] {
    let (magma, land, water, pollution) = (tile.magma(), tile.land(), tile.water(), tile.pollution());
    if magma >= land && magma >= water && magma >= pollution {
        [to_channel(magma - land.max(water)), 0, 0]
    } else if land >= magma && land >= water && land >= pollution {
        [0, to_channel(land), 0]
    } else if water >= magma && water >= land && water >= pollution {
        if tile.current_temperature() < 0 {
            [0xFF, 0xFF, 0xFF]
        } else {
            [0, 0, to_channel(water - magma.max(land))]
        }
    } else {
        [0, 0, 0]
    }
}

/// Render the playable area, one pixel per tile, highest y on the top row.
pub fn render_image(terrain: &Terrain) -> Result<RgbImage, ExportError> {
    let layout = terrain.layout();
    let width = layout.x.playable_size as u64;
    let height = layout.y.playable_size as u64;
    if width * height > MAX_PIXELS {
        return Err(ExportError::ImageTooLarge { width, height });
    }

    let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
    for (px, py, pixel) in img.enumerate_pixels_mut() {
        let world_x = layout.x.playable_min + px as i64;
        let world_y = layout.y.playable_max - py as i64;
        let color = terrain
            .tile(world_x as i32, world_y as i32)
            .map(|tile| tile_color(&tile))
            .unwrap_or([0, 0, 0]);
        *pixel = Rgb(color);
    }
    Ok(img)
}

pub fn render_png<P: AsRef<Path>>(terrain: &Terrain, path: P) -> Result<(), ExportError> {
    let img = render_image(terrain)?;
    img.save(path.as_ref()).map_err(|e| ExportError::SaveFailed(e.to_string()))?;
    log::info!("wrote {}x{} map to {}", img.width(), img.height(), path.as_ref().display());
    Ok(())
}

/// Parameters and aggregate statistics of a generated terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainSummary {
    pub params: TerrainParams,
    pub playable_x: (i64, i64),
    pub playable_y: (i64, i64),
    pub month: String,
    pub statistics: TerrainStats,
}

impl TerrainSummary {
    pub fn of(terrain: &Terrain) -> Self {
        let layout = terrain.layout();
        Self {
            params: terrain.params().clone(),
            playable_x: (layout.x.playable_min, layout.x.playable_max),
            playable_y: (layout.y.playable_min, layout.y.playable_max),
            month: terrain.month().to_string(),
            statistics: terrain.statistics(),
        }
    }
}

pub fn summary_json(terrain: &Terrain) -> Result<String, ExportError> {
    serde_json::to_string_pretty(&TerrainSummary::of(terrain))
        .map_err(|e| ExportError::Serialization(e.to_string()))
}

pub fn write_summary<P: AsRef<Path>>(terrain: &Terrain, path: P) -> Result<(), ExportError> {
    std::fs::write(path, summary_json(terrain)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{TerrainParams, TerrainShape};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn terrain() -> Terrain {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        Terrain::new(TerrainParams::small(TerrainShape::Flat, 4, 2, 3), &mut rng).unwrap()
    }

    #[test]
    fn test_image_covers_playable_area() {
        let t = terrain();
        let img = render_image(&t).unwrap();
        assert_eq!((img.width(), img.height()), (8, 12));
    }

    #[test]
    fn test_dominant_layer_colors() {
        let mut t = terrain();
        let layout = *t.layout();
        let (x0, y_top) = (layout.x.playable_min as i32, layout.y.playable_max as i32);

        // Empty tiles tie everywhere, so magma wins with no excess.
        assert_eq!(tile_color(&t.tile(x0, y_top).unwrap()), [0xFF, 0, 0]);

        {
            let mut tile = t.tile_mut(x0 + 1, y_top).unwrap();
            tile.set_land(10);
        }
        assert_eq!(tile_color(&t.tile(x0 + 1, y_top).unwrap()), [0, 0xFF - 10, 0]);

        {
            let mut tile = t.tile_mut(x0 + 2, y_top).unwrap();
            tile.set_land(5);
            tile.set_water(500);
        }
        let warm = t.tile(x0 + 2, y_top).unwrap();
        let expected = if warm.current_temperature() < 0 { [0xFF; 3] } else { [0, 0, 0] };
        assert_eq!(tile_color(&warm), expected);

        let img = render_image(&t).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [0, 0xFF - 10, 0]);
    }

    #[test]
    fn test_summary_json_has_statistics() {
        let t = terrain();
        let json = summary_json(&t).unwrap();
        let back: TerrainSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.statistics.tiles, 96);
        assert_eq!(back.params, *t.params());
    }

    #[test]
    fn test_too_large_error_message() {
        let err = ExportError::ImageTooLarge { width: 20_000, height: 10_000 };
        assert!(err.to_string().contains("200000000"));
    }
}
