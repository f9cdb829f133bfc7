//! The grid of chunks and the world ↔ chunk coordinate mapping.
//!
//! World coordinates are signed and centred on the theoretical world. Only a
//! randomly placed playable window of chunks is materialized; `base` shifts
//! world coordinates so that the window starts at array index 0:
//!
//! ```text
//! index  = world + base
//! chunk  = index / S,  local = index % S
//! world  = chunk * S - base + local
//! ```
//!
//! On a cyclic axis, indices are wrapped modulo the playable size before the
//! chunk lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkPos, FlowVector};
use crate::elements::Element;
use crate::ids::{CitizenId, SettlementId};
use crate::params::{ParamsError, TerrainParams};
use crate::region::{par_fold, ChunkCursor, TileCursor};
use crate::seasons::{Climate, Month};
use crate::tile::{Tile, TileMut};

// =============================================================================
// LAYOUT
// =============================================================================

/// Location of one tile: a chunk and an offset inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub chunk: ChunkPos,
    pub x: usize,
    pub y: usize,
}

impl TilePos {
    pub fn new(chunk: ChunkPos, x: usize, y: usize) -> Self {
        Self { chunk, x, y }
    }
}

/// Extents of one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub cyclic: bool,
    pub chunk_size: i64,
    /// Materialized chunks along this axis
    pub chunks: usize,
    pub total_size: i64,
    pub total_min: i64,
    pub total_max: i64,
    pub playable_size: i64,
    pub playable_min: i64,
    pub playable_max: i64,
    pub base: i64,
}

impl AxisLayout {
    /// Lay out one axis, placing the playable window uniformly at random
    /// inside the total extent.
    pub fn new<R: Rng>(
        cyclic: bool,
        chunk_size: usize,
        total_chunks: usize,
        playable_chunks: usize,
        rng: &mut R,
    ) -> Self {
        let chunk_size = chunk_size as i64;
        let total_size = total_chunks as i64 * chunk_size;
        let total_min = -(total_size - 1) / 2;
        let total_max = -total_min;
        let playable_size = playable_chunks as i64 * chunk_size;
        let highest_min = (total_max - playable_size + 1).max(total_min);
        let playable_min = rng.gen_range(total_min..=highest_min);
        Self {
            cyclic,
            chunk_size,
            chunks: playable_chunks,
            total_size,
            total_min,
            total_max,
            playable_size,
            playable_min,
            playable_max: playable_min + playable_size - 1,
            base: -playable_min,
        }
    }

    /// Array index of a world coordinate, wrapped on a cyclic axis. `None`
    /// outside the playable window of a bounded axis.
    pub fn index(&self, coordinate: i64) -> Option<i64> {
        let index = coordinate + self.base;
        if self.cyclic {
            Some(index.rem_euclid(self.playable_size))
        } else if (0..self.playable_size).contains(&index) {
            Some(index)
        } else {
            None
        }
    }

    /// `(chunk, local)` of a world coordinate.
    pub fn locate(&self, coordinate: i64) -> Option<(usize, usize)> {
        self.index(coordinate)
            .map(|i| ((i / self.chunk_size) as usize, (i % self.chunk_size) as usize))
    }

    pub fn coordinate(&self, chunk: usize, local: usize) -> i64 {
        chunk as i64 * self.chunk_size - self.base + local as i64
    }

    pub fn chunk_center(&self, chunk: usize) -> i64 {
        chunk as i64 * self.chunk_size + (self.chunk_size - 1) / 2 - self.base
    }
}

/// Geometry of a terrain. Cheap to copy, so cursors carry their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub chunk_size: usize,
    pub x: AxisLayout,
    pub y: AxisLayout,
}

impl Layout {
    pub fn new<R: Rng>(params: &TerrainParams, rng: &mut R) -> Self {
        Self {
            chunk_size: params.chunk_size,
            x: AxisLayout::new(
                params.shape.cycle_x(),
                params.chunk_size,
                params.total_chunks_x,
                params.playable_chunks_x,
                rng,
            ),
            y: AxisLayout::new(
                params.shape.cycle_y(),
                params.chunk_size,
                params.total_chunks_y,
                params.playable_chunks_y,
                rng,
            ),
        }
    }

    pub fn resolve(&self, world_x: i64, world_y: i64) -> Option<TilePos> {
        let (chunk_x, x) = self.x.locate(world_x)?;
        let (chunk_y, y) = self.y.locate(world_y)?;
        Some(TilePos::new(ChunkPos::new(chunk_x, chunk_y), x, y))
    }

    pub fn world_coords(&self, pos: TilePos) -> (i64, i64) {
        (
            self.x.coordinate(pos.chunk.x, pos.x),
            self.y.coordinate(pos.chunk.y, pos.y),
        )
    }

    pub fn chunk_center(&self, chunk: ChunkPos) -> (i64, i64) {
        (self.x.chunk_center(chunk.x), self.y.chunk_center(chunk.y))
    }

    pub fn chunk_count(&self) -> usize {
        self.x.chunks * self.y.chunks
    }

    pub fn contains_chunk(&self, chunk: ChunkPos) -> bool {
        chunk.x < self.x.chunks && chunk.y < self.y.chunks
    }
}

// =============================================================================
// TERRAIN
// =============================================================================

pub struct Terrain {
    params: TerrainParams,
    layout: Layout,
    climate: Climate,
    month: Month,
    /// Row-major, `layout.y.chunks` rows of `layout.x.chunks`
    chunks: Vec<Chunk>,

    pub(crate) buildings: Vec<Element>,
    pub(crate) features: Vec<Element>,
    pub(crate) units: Vec<Element>,
    pub(crate) citizens: Vec<CitizenId>,
    pub(crate) next_element_id: u64,
}

impl Terrain {
    /// Allocate an empty terrain. The playable window is drawn from `rng`
    /// once and never moves.
    pub fn new<R: Rng>(params: TerrainParams, rng: &mut R) -> Result<Self, ParamsError> {
        params.validate()?;
        let layout = Layout::new(&params, rng);
        let climate = Climate::new(&params, layout.y.total_max as i32);
        let chunks = (0..layout.y.chunks)
            .flat_map(|y| (0..layout.x.chunks).map(move |x| ChunkPos::new(x, y)))
            .map(|pos| Chunk::new(pos, FlowVector::default(), None, params.chunk_size))
            .collect();
        log::debug!(
            "terrain {} chunks of {}x{} tiles, playable x [{}, {}] y [{}, {}]",
            layout.chunk_count(),
            params.chunk_size,
            params.chunk_size,
            layout.x.playable_min,
            layout.x.playable_max,
            layout.y.playable_min,
            layout.y.playable_max
        );
        Ok(Self {
            params,
            layout,
            climate,
            month: Month::default(),
            chunks,
            buildings: Vec::new(),
            features: Vec::new(),
            units: Vec::new(),
            citizens: Vec::new(),
            next_element_id: 1,
        })
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn climate(&self) -> &Climate {
        &self.climate
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn set_month(&mut self, month: Month) {
        self.month = month;
    }

    pub fn chunk_size(&self) -> usize {
        self.layout.chunk_size
    }

    // ===== Base levels =====

    pub fn base_height(&self) -> i32 {
        -self.params.sea_level
    }

    pub fn base_magma(&self) -> i32 {
        self.base_height() - self.params.crust_thickness
    }

    pub fn base_roughness(&self) -> i32 {
        self.params.roughness
    }

    pub fn base_water(&self) -> i32 {
        0
    }

    // ===== Chunks =====

    fn chunk_index(&self, pos: ChunkPos) -> Option<usize> {
        self.layout
            .contains_chunk(pos)
            .then(|| pos.y * self.layout.x.chunks + pos.x)
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunk_index(pos).map(|i| &self.chunks[i])
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunk_index(pos).map(move |i| &mut self.chunks[i])
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Cursor over every materialized chunk.
    pub fn all_chunks(&self) -> ChunkCursor {
        ChunkCursor::new(self.layout)
    }

    /// Replace the chunk at `pos` with a fresh one. Returns `false` when `pos`
    /// is not materialized.
    pub fn new_chunk(&mut self, pos: ChunkPos, flow: FlowVector, owner: Option<SettlementId>) -> bool {
        let size = self.chunk_size();
        match self.chunk_mut(pos) {
            Some(chunk) => {
                *chunk = Chunk::new(pos, flow, owner, size);
                true
            }
            None => false,
        }
    }

    // ===== Tiles =====

    pub fn tile(&self, world_x: i32, world_y: i32) -> Option<Tile<'_>> {
        let pos = self.layout.resolve(world_x as i64, world_y as i64)?;
        self.tile_at(pos)
    }

    pub fn tile_mut(&mut self, world_x: i32, world_y: i32) -> Option<TileMut<'_>> {
        let pos = self.layout.resolve(world_x as i64, world_y as i64)?;
        self.tile_at_mut(pos)
    }

    pub fn tile_at(&self, pos: TilePos) -> Option<Tile<'_>> {
        let chunk = self.chunk(pos.chunk)?;
        chunk.local(pos.x as i64, pos.y as i64)?;
        Some(Tile::new(chunk, &self.layout, &self.climate, self.month, pos.x, pos.y))
    }

    pub fn tile_at_mut(&mut self, pos: TilePos) -> Option<TileMut<'_>> {
        let index = self.chunk_index(pos.chunk)?;
        let chunk = &mut self.chunks[index];
        chunk.local(pos.x as i64, pos.y as i64)?;
        Some(TileMut::new(chunk, &self.layout, &self.climate, self.month, pos.x, pos.y))
    }

    /// Tile at a local offset of a chunk, `None` outside `[0, S)`.
    pub fn chunk_tile(&self, chunk: ChunkPos, x: i64, y: i64) -> Option<Tile<'_>> {
        let (x, y) = self.chunk(chunk)?.local(x, y)?;
        self.tile_at(TilePos::new(chunk, x, y))
    }

    /// Cursor over the rectangle spanned by two world corners, in any order.
    pub fn tiles(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> TileCursor {
        TileCursor::new(self.layout, from_x as i64, from_y as i64, to_x as i64, to_y as i64)
    }

    /// Cursor over the whole playable window.
    pub fn all_tiles(&self) -> TileCursor {
        TileCursor::new(
            self.layout,
            self.layout.x.playable_min,
            self.layout.y.playable_min,
            self.layout.x.playable_max,
            self.layout.y.playable_max,
        )
    }

    pub fn squared_distance(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> i64 {
        let dx = to_x as i64 - from_x as i64;
        let dy = to_y as i64 - from_y as i64;
        dx * dx + dy * dy
    }

    pub fn distance(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> f64 {
        (self.squared_distance(from_x, from_y, to_x, to_y) as f64).sqrt()
    }

    // ===== Statistics =====

    /// Whole-window statistics, computed in parallel over split cursors.
    pub fn statistics(&self) -> TerrainStats {
        par_fold(
            self.all_tiles(),
            &StatsAccumulator::default,
            &|acc: StatsAccumulator, pos: TilePos| acc.with_tile(self, pos),
            &StatsAccumulator::merge,
        )
        .finish()
    }

    /// Same as [`Terrain::statistics`] on the calling thread only.
    pub fn statistics_sequential(&self) -> TerrainStats {
        self.all_tiles()
            .flatten()
            .fold(StatsAccumulator::default(), |acc, pos| acc.with_tile(self, pos))
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainStats {
    pub tiles: usize,
    pub flooded: usize,
    pub molten: usize,
    pub land_min: i32,
    pub land_max: i32,
    pub mean_land: f64,
    pub mean_water: f64,
    /// Average over non-molten tiles
    pub mean_temperature: f64,
}

impl TerrainStats {
    pub fn flooded_fraction(&self) -> f64 {
        if self.tiles == 0 {
            0.0
        } else {
            self.flooded as f64 / self.tiles as f64
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct StatsAccumulator {
    tiles: usize,
    flooded: usize,
    molten: usize,
    land_min: i32,
    land_max: i32,
    land_sum: i64,
    water_sum: i64,
    temperature_sum: i64,
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self {
            tiles: 0,
            flooded: 0,
            molten: 0,
            land_min: i32::MAX,
            land_max: i32::MIN,
            land_sum: 0,
            water_sum: 0,
            temperature_sum: 0,
        }
    }
}

impl StatsAccumulator {
    fn with_tile(mut self, terrain: &Terrain, pos: TilePos) -> Self {
        let Some(tile) = terrain.tile_at(pos) else {
            return self;
        };
        let land = tile.land();
        self.tiles += 1;
        self.land_min = self.land_min.min(land);
        self.land_max = self.land_max.max(land);
        self.land_sum += land as i64;
        self.water_sum += tile.water() as i64;
        if tile.is_flooded() {
            self.flooded += 1;
        }
        if tile.is_molten() {
            self.molten += 1;
        } else {
            self.temperature_sum += tile.average_temperature() as i64;
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            tiles: self.tiles + other.tiles,
            flooded: self.flooded + other.flooded,
            molten: self.molten + other.molten,
            land_min: self.land_min.min(other.land_min),
            land_max: self.land_max.max(other.land_max),
            land_sum: self.land_sum + other.land_sum,
            water_sum: self.water_sum + other.water_sum,
            temperature_sum: self.temperature_sum + other.temperature_sum,
        }
    }

    fn finish(self) -> TerrainStats {
        if self.tiles == 0 {
            return TerrainStats::default();
        }
        let solid = self.tiles - self.molten;
        TerrainStats {
            tiles: self.tiles,
            flooded: self.flooded,
            molten: self.molten,
            land_min: self.land_min,
            land_max: self.land_max,
            mean_land: self.land_sum as f64 / self.tiles as f64,
            mean_water: self.water_sum as f64 / self.tiles as f64,
            mean_temperature: if solid == 0 {
                0.0
            } else {
                self.temperature_sum as f64 / solid as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IntegerMatrix;
    use crate::params::TerrainShape;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn terrain(shape: TerrainShape, size: usize, chunks_x: usize, chunks_y: usize) -> Terrain {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        Terrain::new(TerrainParams::small(shape, size, chunks_x, chunks_y), &mut rng).unwrap()
    }

    #[test]
    fn test_layout_extents() {
        let t = terrain(TerrainShape::Flat, 5, 3, 2);
        let x = t.layout().x;
        assert_eq!(x.total_size, 35);
        assert_eq!(x.total_min, -17);
        assert_eq!(x.total_max, 17);
        assert_eq!(x.playable_size, 15);
        assert!(x.playable_min >= x.total_min);
        assert!(x.playable_max <= x.total_max);
        assert_eq!(x.base, -x.playable_min);
        assert_eq!(t.chunks().count(), 6);
    }

    #[test]
    fn test_coordinate_bijection() {
        let t = terrain(TerrainShape::Flat, 5, 3, 2);
        let layout = *t.layout();
        let mut seen = std::collections::HashSet::new();
        for y in layout.y.playable_min..=layout.y.playable_max {
            for x in layout.x.playable_min..=layout.x.playable_max {
                let tile = t.tile(x as i32, y as i32).unwrap();
                assert_eq!(tile.world_x(), x as i32);
                assert_eq!(tile.world_y(), y as i32);
                assert!(seen.insert(tile.pos()));
            }
        }
        assert_eq!(seen.len(), 15 * 10);
    }

    #[test]
    fn test_flat_edges_are_absent() {
        let t = terrain(TerrainShape::Flat, 5, 3, 2);
        let layout = *t.layout();
        let (min_x, max_x) = (layout.x.playable_min as i32, layout.x.playable_max as i32);
        let min_y = layout.y.playable_min as i32;
        assert!(t.tile(min_x - 1, min_y).is_none());
        assert!(t.tile(max_x + 1, min_y).is_none());
        assert!(t.tile(min_x, min_y - 1).is_none());
    }

    #[test]
    fn test_torus_wraps_both_axes() {
        let t = terrain(TerrainShape::Torus, 5, 3, 2);
        let n_x = t.layout().x.playable_size as i32;
        let n_y = t.layout().y.playable_size as i32;
        for (x, y) in [(0, 0), (-40, 3), (13, -9), (100, 100)] {
            let pos = t.tile(x, y).unwrap().pos();
            assert_eq!(t.tile(x + n_x, y).unwrap().pos(), pos);
            assert_eq!(t.tile(x - 2 * n_x, y).unwrap().pos(), pos);
            assert_eq!(t.tile(x, y + n_y).unwrap().pos(), pos);
        }
    }

    #[test]
    fn test_cylinder_wraps_x_only() {
        let t = terrain(TerrainShape::Cylinder, 5, 3, 2);
        let layout = *t.layout();
        let y = layout.y.playable_min as i32;
        let x = layout.x.playable_max as i32;
        assert_eq!(
            t.tile(x + 1, y).unwrap().pos(),
            t.tile(layout.x.playable_min as i32, y).unwrap().pos()
        );
        assert!(t.tile(x, y - 1).is_none());
    }

    #[test]
    fn test_chunk_tile_bounds() {
        let t = terrain(TerrainShape::Flat, 5, 2, 2);
        let pos = ChunkPos::new(1, 1);
        assert!(t.chunk_tile(pos, 4, 4).is_some());
        assert!(t.chunk_tile(pos, 5, 0).is_none());
        assert!(t.chunk_tile(pos, -1, 0).is_none());
        assert!(t.chunk_tile(ChunkPos::new(2, 0), 0, 0).is_none());
    }

    #[test]
    fn test_chunk_center() {
        let t = terrain(TerrainShape::Flat, 5, 2, 2);
        let layout = *t.layout();
        let (cx, cy) = layout.chunk_center(ChunkPos::new(1, 0));
        assert_eq!(cx, layout.x.playable_min + 5 + 2);
        assert_eq!(cy, layout.y.playable_min + 2);
    }

    #[test]
    fn test_tile_mut_writes_through() {
        let mut t = terrain(TerrainShape::Flat, 5, 2, 2);
        let (x, y) = (t.layout().x.playable_min as i32 + 6, t.layout().y.playable_min as i32);
        t.tile_mut(x, y).unwrap().set_land(1234);
        assert_eq!(t.tile(x, y).unwrap().land(), 1234);
        assert_eq!(t.chunk(ChunkPos::new(1, 0)).unwrap().land.get(1, 0), 1234);
    }

    #[test]
    fn test_new_chunk_replaces() {
        let mut t = terrain(TerrainShape::Flat, 5, 2, 2);
        let pos = ChunkPos::new(0, 1);
        t.chunk_mut(pos).unwrap().land.set(0, 0, 9);
        assert!(t.new_chunk(pos, FlowVector::new(3, 1), Some(SettlementId(4))));
        let chunk = t.chunk(pos).unwrap();
        assert_eq!(chunk.land.get(0, 0), 0);
        assert_eq!(chunk.flow, FlowVector::new(3, 1));
        assert_eq!(chunk.owner, Some(SettlementId(4)));
        assert!(!t.new_chunk(ChunkPos::new(5, 5), FlowVector::default(), None));
    }

    #[test]
    fn test_base_levels() {
        let t = terrain(TerrainShape::Flat, 7, 1, 1);
        assert_eq!(t.base_height(), -7);
        assert_eq!(t.base_magma(), -14);
        assert_eq!(t.base_water(), 0);
        assert_eq!(t.base_roughness(), 56);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = TerrainParams::small(TerrainShape::Flat, 3, 1, 1);
        assert!(Terrain::new(params, &mut rng).is_err());
    }

    #[test]
    fn test_statistics_on_empty_terrain() {
        let t = terrain(TerrainShape::Torus, 5, 2, 2);
        let stats = t.statistics();
        assert_eq!(stats.tiles, 100);
        assert_eq!(stats.flooded, 100);
        // magma, land and water all 0
        assert_eq!(stats.molten, 100);
        assert_eq!(stats, t.statistics_sequential());
    }

    #[test]
    fn test_hot_solid_tile_is_not_molten() {
        let params = TerrainParams {
            base_temperature: 1000,
            temperature_difference: 0,
            height_cooling_factor: 0.0,
            ..TerrainParams::small(TerrainShape::Flat, 5, 2, 2)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut t = Terrain::new(params, &mut rng).unwrap();
        let (x, y) = (t.layout().x.playable_min as i32, t.layout().y.playable_min as i32);
        {
            let mut tile = t.tile_mut(x, y).unwrap();
            tile.set_magma(-10);
            tile.set_land(5);
        }
        assert_eq!(t.tile(x, y).unwrap().average_temperature(), 1000);

        let stats = t.statistics();
        assert_eq!(stats.molten, 99);
        assert_eq!(stats.mean_temperature, 1000.0);
        assert_eq!(stats, t.statistics_sequential());
    }
}
