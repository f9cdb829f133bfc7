use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::chunk::{FlowVector, ScalarLayer};
use crate::region::TileCursor;
use crate::terrain::Terrain;

use super::kernels::Kernel;

/// Humidity blob radius, in chunk sides.
pub const HUMIDITY_RADIUS: i32 = 1;
/// Humidity blob height, in chunk sides.
pub const HUMIDITY_MAGNITUDE: i32 = 1;

/// Tectonic generator: drifting chunks push magma up behind them and land up
/// ahead of them, then the low ground floods and moisture spreads inland.
pub struct BasicGenerator {
    rng: ChaCha8Rng,
    kernel: Kernel,
}

impl BasicGenerator {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Continue an existing random stream (e.g. the one that placed the
    /// playable window).
    pub fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            kernel: Kernel::Smoothstep,
        }
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Run every pass on a freshly constructed terrain.
    pub fn generate(&mut self, terrain: &mut Terrain) {
        self.seed_chunks(terrain);
        self.lay_base_levels(terrain);
        self.raise_relief(terrain);
        self.level_water(terrain);
        self.spread_humidity(terrain);
    }

    /// Give every chunk a fresh random flow vector in `[0, S) × [0, S)`.
    pub fn seed_chunks(&mut self, terrain: &mut Terrain) {
        log::info!("Seeding {} chunks", terrain.layout().chunk_count());
        let size = terrain.chunk_size() as i32;
        for pos in terrain.all_chunks() {
            let flow = FlowVector::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size));
            terrain.new_chunk(pos, flow, None);
        }
    }

    pub fn lay_base_levels(&mut self, terrain: &mut Terrain) {
        let (magma, land, water) = (terrain.base_magma(), terrain.base_height(), terrain.base_water());
        log::info!("Laying base levels (magma {}, land {}, water {})", magma, land, water);
        for pos in terrain.all_tiles().flatten() {
            if let Some(mut tile) = terrain.tile_at_mut(pos) {
                tile.add_magma(magma);
                tile.add_land(land);
                tile.add_water(water);
            }
        }
    }

    /// Magma blob behind each chunk's flow, land blob ahead of it.
    pub fn raise_relief(&mut self, terrain: &mut Terrain) {
        log::info!("Raising relief");
        let size = terrain.chunk_size() as i64;
        let roughness = terrain.base_roughness() as i64;
        let mut cursor = terrain.all_chunks();
        while let Ok(pos) = cursor.try_next() {
            let Some(flow) = terrain.chunk(pos).map(|c| c.flow) else {
                continue;
            };
            let radius = flow.magnitude();
            if radius == 0 {
                continue;
            }
            let height = (roughness * radius as i64 * 4 / (size * size)) as i32;
            let (cx, cy) = cursor.center();
            let (fx, fy) = (flow.x as i64, flow.y as i64);
            log::debug!("chunk {:?} flow ({}, {}) radius {} height {}", pos, fx, fy, radius, height);
            add_blob(terrain, ScalarLayer::Magma, self.kernel, cx - fx, cy - fy, radius, height);
            add_blob(terrain, ScalarLayer::Land, self.kernel, cx + fx, cy + fy, radius, height);
        }
    }

    /// Flood everything at or below the base water level to exactly that level.
    pub fn level_water(&mut self, terrain: &mut Terrain) {
        let base_water = terrain.base_water();
        let mut flooded = 0usize;
        for pos in terrain.all_tiles().flatten() {
            if let Some(mut tile) = terrain.tile_at_mut(pos) {
                if tile.land() <= base_water {
                    tile.set_water(base_water);
                    flooded += 1;
                }
            }
        }
        log::info!("Leveled water: {} tiles flooded", flooded);
    }

    /// Every flooded tile wets its surroundings. Tiles already flooded are
    /// left alone and a dry tile never becomes flooded: it is clamped to
    /// one below its land.
    pub fn spread_humidity(&mut self, terrain: &mut Terrain) {
        let size = terrain.chunk_size() as i32;
        let radius = size * HUMIDITY_RADIUS;
        let height = size * HUMIDITY_MAGNITUDE;
        log::info!("Spreading humidity (radius {}, height {})", radius, height);
        let mut sources = 0usize;
        let mut cursor = terrain.all_tiles();
        while let Some(step) = cursor.next() {
            let Some(pos) = step else { continue };
            let is_source = terrain.tile_at(pos).is_some_and(|t| t.is_flooded());
            if is_source {
                let (x, y) = cursor.current_coords();
                add_water_blob(terrain, self.kernel, x, y, radius, height);
                sources += 1;
            }
        }
        log::debug!("{} humidity sources", sources);
    }
}

fn blob_region(terrain: &Terrain, cx: i64, cy: i64, radius: i32) -> TileCursor {
    let r = radius as i64;
    TileCursor::new(*terrain.layout(), cx - r, cy - r, cx + r, cy + r)
}

/// Add a kernel-shaped blob to `layer`. Tiles outside the materialized
/// chunks are skipped.
pub fn add_blob(
    terrain: &mut Terrain,
    layer: ScalarLayer,
    kernel: Kernel,
    cx: i64,
    cy: i64,
    radius: i32,
    height: i32,
) {
    let mut cursor = blob_region(terrain, cx, cy, radius);
    while let Some(step) = cursor.next() {
        let Some(pos) = step else { continue };
        let (x, y) = cursor.current_coords();
        let delta = kernel.at((cx - x) as i32, (cy - y) as i32, radius, height);
        if delta == 0 {
            continue;
        }
        if let Some(mut tile) = terrain.tile_at_mut(pos) {
            tile.add(layer, delta);
        }
    }
}

/// Add a water blob that never floods a dry tile.
pub fn add_water_blob(terrain: &mut Terrain, kernel: Kernel, cx: i64, cy: i64, radius: i32, height: i32) {
    let mut cursor = blob_region(terrain, cx, cy, radius);
    while let Some(step) = cursor.next() {
        let Some(pos) = step else { continue };
        let (x, y) = cursor.current_coords();
        let Some(mut tile) = terrain.tile_at_mut(pos) else {
            continue;
        };
        if tile.water() >= tile.land() {
            continue;
        }
        tile.add_water(kernel.at((cx - x) as i32, (cy - y) as i32, radius, height));
        if tile.water() >= tile.land() {
            let land = tile.land();
            tile.set_water(land - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{TerrainParams, TerrainShape};

    fn terrain(shape: TerrainShape, seed: u64) -> Terrain {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Terrain::new(TerrainParams::small(shape, 7, 3, 3), &mut rng).unwrap()
    }

    #[test]
    fn test_flows_within_chunk_size() {
        let mut t = terrain(TerrainShape::Flat, 1);
        BasicGenerator::new(5).seed_chunks(&mut t);
        for chunk in t.chunks() {
            assert!((0..7).contains(&chunk.flow.x));
            assert!((0..7).contains(&chunk.flow.y));
        }
    }

    #[test]
    fn test_base_levels_applied_everywhere() {
        let mut t = terrain(TerrainShape::Flat, 1);
        BasicGenerator::new(5).lay_base_levels(&mut t);
        for pos in t.all_tiles().flatten() {
            let tile = t.tile_at(pos).unwrap();
            assert_eq!(tile.magma(), -14);
            assert_eq!(tile.land(), -7);
            assert_eq!(tile.water(), 0);
        }
    }

    #[test]
    fn test_blob_is_kernel_shaped() {
        let mut t = terrain(TerrainShape::Flat, 2);
        let layout = *t.layout();
        let (cx, cy) = (layout.x.playable_min + 10, layout.y.playable_min + 10);
        add_blob(&mut t, ScalarLayer::Land, Kernel::Cone, cx, cy, 4, 100);
        let land = |dx: i64, dy: i64| t.tile((cx + dx) as i32, (cy + dy) as i32).unwrap().land();
        assert_eq!(land(0, 0), 100);
        assert_eq!(land(2, 0), 50);
        assert_eq!(land(0, -4), 0);
        assert_eq!(land(3, 3), 0);
    }

    #[test]
    fn test_blob_skips_outside_flat_edge() {
        let mut t = terrain(TerrainShape::Flat, 2);
        let layout = *t.layout();
        let (cx, cy) = (layout.x.playable_min, layout.y.playable_min);
        add_blob(&mut t, ScalarLayer::Magma, Kernel::Smoothstep, cx, cy, 5, 40);
        assert_eq!(t.tile(cx as i32, cy as i32).unwrap().magma(), 40);
    }

    #[test]
    fn test_blob_wraps_on_torus() {
        let mut t = terrain(TerrainShape::Torus, 2);
        let layout = *t.layout();
        let (cx, cy) = (layout.x.playable_max, layout.y.playable_max);
        add_blob(&mut t, ScalarLayer::Land, Kernel::Cone, cx, cy, 4, 100);
        let wrapped = t
            .tile(layout.x.playable_min as i32 + 1, layout.y.playable_max as i32)
            .unwrap()
            .land();
        assert_eq!(wrapped, 50);
    }

    #[test]
    fn test_water_blob_never_floods_dry_tiles() {
        let mut t = terrain(TerrainShape::Flat, 3);
        let layout = *t.layout();
        let (cx, cy) = (layout.x.playable_min + 10, layout.y.playable_min + 10);
        for pos in t.all_tiles().flatten() {
            t.tile_at_mut(pos).unwrap().set_land(3);
        }
        add_water_blob(&mut t, Kernel::Cone, cx, cy, 5, 50);
        let centre = t.tile(cx as i32, cy as i32).unwrap();
        assert_eq!(centre.water(), 2);
        assert!(!centre.is_flooded());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut t = Terrain::new(TerrainParams::small(TerrainShape::Torus, 7, 3, 3), &mut rng).unwrap();
            BasicGenerator::from_rng(rng).generate(&mut t);
            t.all_tiles()
                .flatten()
                .map(|pos| {
                    let tile = t.tile_at(pos).unwrap();
                    (tile.magma(), tile.land(), tile.water())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
