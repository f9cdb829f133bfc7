//! Per-tile accessors.
//!
//! A tile is never stored: [`Tile`] and [`TileMut`] are views pairing a chunk
//! with a local offset and the terrain's geometry. Derived quantities (slope,
//! curvature, temperature, pressure, soil colour) are computed on every call.
//!
//! Slope and curvature only look inside the tile's own chunk; at chunk edges
//! they fall back to one-sided differences.

use crate::chunk::{Chunk, ScalarLayer};
use crate::ids::{AnimalTypeId, ElementId, MineralTypeId, PlantTypeId, SettlementId, SoilTypeId};
use crate::matrix::IntegerMatrix;
use crate::seasons::{self, Climate, Month};
use crate::terrain::{Layout, TilePos};

#[derive(Clone, Copy)]
pub struct Tile<'a> {
    chunk: &'a Chunk,
    layout: &'a Layout,
    climate: &'a Climate,
    month: Month,
    x: usize,
    y: usize,
}

impl<'a> Tile<'a> {
    pub(crate) fn new(
        chunk: &'a Chunk,
        layout: &'a Layout,
        climate: &'a Climate,
        month: Month,
        x: usize,
        y: usize,
    ) -> Self {
        Self { chunk, layout, climate, month, x, y }
    }

    // ===== Location =====

    pub fn pos(&self) -> TilePos {
        TilePos::new(self.chunk.position, self.x, self.y)
    }

    pub fn chunk(&self) -> &'a Chunk {
        self.chunk
    }

    pub fn local_x(&self) -> usize {
        self.x
    }

    pub fn local_y(&self) -> usize {
        self.y
    }

    pub fn world_x(&self) -> i32 {
        self.layout.x.coordinate(self.chunk.position.x, self.x) as i32
    }

    pub fn world_y(&self) -> i32 {
        self.layout.y.coordinate(self.chunk.position.y, self.y) as i32
    }

    pub fn owner(&self) -> Option<SettlementId> {
        self.chunk.owner
    }

    /// Signed x offset from `other` to this tile.
    pub fn distance_to_x(&self, other: &Tile<'_>) -> i32 {
        self.world_x() - other.world_x()
    }

    pub fn distance_to_y(&self, other: &Tile<'_>) -> i32 {
        self.world_y() - other.world_y()
    }

    pub fn squared_distance_to(&self, other: &Tile<'_>) -> i64 {
        let dx = self.distance_to_x(other) as i64;
        let dy = self.distance_to_y(other) as i64;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Tile<'_>) -> f64 {
        (self.squared_distance_to(other) as f64).sqrt()
    }

    /// Whichever of `a` and `b` is nearer; ties go to `b`.
    pub fn closest_of<'b>(&self, a: Tile<'b>, b: Tile<'b>) -> Tile<'b> {
        if self.squared_distance_to(&a) < self.squared_distance_to(&b) {
            a
        } else {
            b
        }
    }

    // ===== Layers =====

    pub fn get(&self, layer: ScalarLayer) -> i32 {
        self.chunk.scalar(layer).get(self.x, self.y)
    }

    pub fn magma(&self) -> i32 {
        self.chunk.magma.get(self.x, self.y)
    }

    pub fn land(&self) -> i32 {
        self.chunk.land.get(self.x, self.y)
    }

    pub fn water(&self) -> i32 {
        self.chunk.water.get(self.x, self.y)
    }

    pub fn pollution(&self) -> i32 {
        self.chunk.pollution.get(self.x, self.y)
    }

    pub fn soil(&self) -> Option<SoilTypeId> {
        self.chunk.soil.get(self.x, self.y).copied()
    }

    pub fn mineral(&self) -> Option<MineralTypeId> {
        self.chunk.minerals.get(self.x, self.y).copied()
    }

    pub fn plant(&self) -> Option<PlantTypeId> {
        self.chunk.plants.get(self.x, self.y).copied()
    }

    pub fn animal(&self) -> Option<AnimalTypeId> {
        self.chunk.animals.get(self.x, self.y).copied()
    }

    pub fn element(&self) -> Option<ElementId> {
        self.chunk.elements.get(self.x, self.y).copied()
    }

    pub fn is_occupied(&self) -> bool {
        self.element().is_some()
    }

    /// Water at or above land.
    pub fn is_flooded(&self) -> bool {
        self.water() >= self.land()
    }

    pub fn is_molten(&self) -> bool {
        let magma = self.magma();
        magma >= self.land() && magma >= self.water()
    }

    pub fn humidity(&self) -> i32 {
        self.water() - self.land()
    }

    // ===== Relief =====

    fn land_at(&self, x: usize, y: usize) -> f64 {
        self.chunk.land.get(x, y) as f64
    }

    /// Land heights along the row or column through this tile.
    fn land_line(&self, along_x: bool) -> (usize, impl Fn(usize) -> f64 + '_) {
        let i = if along_x { self.x } else { self.y };
        let at = move |k: usize| {
            if along_x {
                self.land_at(k, self.y)
            } else {
                self.land_at(self.x, k)
            }
        };
        (i, at)
    }

    fn gradient_along(&self, along_x: bool) -> f64 {
        let last = self.chunk.size() - 1;
        let (i, at) = self.land_line(along_x);
        if i == 0 {
            at(1) - at(0)
        } else if i == last {
            at(last) - at(last - 1)
        } else {
            (at(i + 1) - at(i - 1)) / 2.0
        }
    }

    fn curvature_along(&self, along_x: bool) -> f64 {
        let last = self.chunk.size() - 1;
        let (i, at) = self.land_line(along_x);
        if i == 0 {
            (at(0) - 2.0 * at(1) + at(2)) / 2.0
        } else if i == 1 {
            (2.0 * at(0) - 3.0 * at(1) + at(3)) / 4.0
        } else if i == last - 1 {
            (at(i - 2) - 3.0 * at(i) + 2.0 * at(i + 1)) / 4.0
        } else if i == last {
            (at(i - 2) - 2.0 * at(i - 1) + at(i)) / 2.0
        } else {
            (at(i - 2) - 2.0 * at(i) + at(i + 2)) / 4.0
        }
    }

    /// Magnitude of the land height gradient.
    pub fn slope(&self) -> f64 {
        self.gradient_along(true).hypot(self.gradient_along(false))
    }

    /// Magnitude of the wide-stencil second difference of land height.
    pub fn curvature(&self) -> f64 {
        self.curvature_along(true).hypot(self.curvature_along(false))
    }

    // ===== Climate =====

    pub fn temperature(&self, delta_angle: f64) -> i32 {
        self.climate.temperature(
            self.world_y(),
            self.magma(),
            self.land(),
            self.water(),
            delta_angle,
        )
    }

    pub fn average_temperature(&self) -> i32 {
        self.temperature(0.0)
    }

    pub fn current_temperature(&self) -> i32 {
        self.temperature(self.climate.seasonal_delta(self.month))
    }

    pub fn monthly_temperatures(&self) -> [i32; 12] {
        Month::all().map(|month| self.temperature(self.climate.seasonal_delta(month)))
    }

    pub fn average_pressure(&self) -> i32 {
        seasons::pressure(self.average_temperature(), self.land())
    }

    pub fn current_pressure(&self) -> i32 {
        seasons::pressure(self.current_temperature(), self.land())
    }

    pub fn monthly_pressures(&self) -> [i32; 12] {
        let land = self.land();
        self.monthly_temperatures().map(|t| seasons::pressure(t, land))
    }

    /// Packed `0xAARRGGBB` soil colour for the current month.
    pub fn soil_color(&self) -> u32 {
        seasons::soil_color(self.current_temperature(), self.humidity())
    }

    pub fn is_frozen(&self) -> bool {
        !self.is_molten() && self.average_temperature() < 0
    }
}

impl PartialEq for Tile<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pos() == other.pos()
    }
}

impl Eq for Tile<'_> {}

impl std::fmt::Debug for Tile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("pos", &self.pos())
            .field("world", &(self.world_x(), self.world_y()))
            .finish()
    }
}

/// Mutable view of one tile.
pub struct TileMut<'a> {
    chunk: &'a mut Chunk,
    layout: &'a Layout,
    climate: &'a Climate,
    month: Month,
    x: usize,
    y: usize,
}

impl<'a> TileMut<'a> {
    pub(crate) fn new(
        chunk: &'a mut Chunk,
        layout: &'a Layout,
        climate: &'a Climate,
        month: Month,
        x: usize,
        y: usize,
    ) -> Self {
        Self { chunk, layout, climate, month, x, y }
    }

    /// Read-only view of the same tile.
    pub fn as_tile(&self) -> Tile<'_> {
        Tile::new(self.chunk, self.layout, self.climate, self.month, self.x, self.y)
    }

    pub fn pos(&self) -> TilePos {
        TilePos::new(self.chunk.position, self.x, self.y)
    }

    pub fn get(&self, layer: ScalarLayer) -> i32 {
        self.chunk.scalar(layer).get(self.x, self.y)
    }

    pub fn set(&mut self, layer: ScalarLayer, value: i32) {
        self.chunk.scalar_mut(layer).set(self.x, self.y, value);
    }

    pub fn add(&mut self, layer: ScalarLayer, delta: i32) {
        self.chunk.scalar_mut(layer).add(self.x, self.y, delta);
    }

    pub fn magma(&self) -> i32 {
        self.get(ScalarLayer::Magma)
    }

    pub fn set_magma(&mut self, value: i32) {
        self.set(ScalarLayer::Magma, value);
    }

    pub fn add_magma(&mut self, delta: i32) {
        self.add(ScalarLayer::Magma, delta);
    }

    pub fn land(&self) -> i32 {
        self.get(ScalarLayer::Land)
    }

    pub fn set_land(&mut self, value: i32) {
        self.set(ScalarLayer::Land, value);
    }

    pub fn add_land(&mut self, delta: i32) {
        self.add(ScalarLayer::Land, delta);
    }

    pub fn water(&self) -> i32 {
        self.get(ScalarLayer::Water)
    }

    pub fn set_water(&mut self, value: i32) {
        self.set(ScalarLayer::Water, value);
    }

    pub fn add_water(&mut self, delta: i32) {
        self.add(ScalarLayer::Water, delta);
    }

    pub fn pollution(&self) -> i32 {
        self.get(ScalarLayer::Pollution)
    }

    pub fn set_pollution(&mut self, value: i32) {
        self.set(ScalarLayer::Pollution, value);
    }

    pub fn add_pollution(&mut self, delta: i32) {
        self.add(ScalarLayer::Pollution, delta);
    }

    pub fn set_soil(&mut self, soil: Option<SoilTypeId>) {
        self.chunk.soil.replace(self.x, self.y, soil);
    }

    pub fn set_mineral(&mut self, mineral: Option<MineralTypeId>) {
        self.chunk.minerals.replace(self.x, self.y, mineral);
    }

    pub fn set_plant(&mut self, plant: Option<PlantTypeId>) {
        self.chunk.plants.replace(self.x, self.y, plant);
    }

    pub fn set_animal(&mut self, animal: Option<AnimalTypeId>) {
        self.chunk.animals.replace(self.x, self.y, animal);
    }

    pub fn set_element(&mut self, element: Option<ElementId>) {
        self.chunk.elements.replace(self.x, self.y, element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPos;
    use crate::params::{TerrainParams, TerrainShape};
    use crate::seasons::MOLTEN_TEMPERATURE;
    use crate::terrain::Terrain;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const S: usize = 7;

    fn terrain() -> Terrain {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        Terrain::new(TerrainParams::small(TerrainShape::Flat, S, 2, 2), &mut rng).unwrap()
    }

    fn pos(x: usize, y: usize) -> TilePos {
        TilePos::new(ChunkPos::new(0, 0), x, y)
    }

    /// Fill chunk (0, 0) land with `f(x, y)`.
    fn shape_land(t: &mut Terrain, f: impl Fn(usize, usize) -> i32) {
        for y in 0..S {
            for x in 0..S {
                t.tile_at_mut(pos(x, y)).unwrap().set_land(f(x, y));
            }
        }
    }

    #[test]
    fn test_slope_of_plane() {
        let mut t = terrain();
        shape_land(&mut t, |x, y| 3 * x as i32 + 4 * y as i32);
        for y in 0..S {
            for x in 0..S {
                let slope = t.tile_at(pos(x, y)).unwrap().slope();
                assert!((slope - 5.0).abs() < 1e-9, "slope at ({}, {}) = {}", x, y, slope);
            }
        }
    }

    #[test]
    fn test_slope_is_one_sided_at_chunk_edge() {
        let mut t = terrain();
        shape_land(&mut t, |x, _| (x * x) as i32);
        // x = 0 uses f(1) - f(0); interior uses (f(x+1) - f(x-1)) / 2
        assert_eq!(t.tile_at(pos(0, 3)).unwrap().slope(), 1.0);
        assert_eq!(t.tile_at(pos(3, 3)).unwrap().slope(), 6.0);
        assert_eq!(t.tile_at(pos(S - 1, 3)).unwrap().slope(), 11.0);
    }

    #[test]
    fn test_curvature_of_plane_is_zero() {
        let mut t = terrain();
        shape_land(&mut t, |x, y| 2 * x as i32 - 7 * y as i32);
        for y in 0..S {
            for x in 0..S {
                let c = t.tile_at(pos(x, y)).unwrap().curvature();
                assert!(c.abs() < 1e-9, "curvature at ({}, {}) = {}", x, y, c);
            }
        }
    }

    #[test]
    fn test_curvature_stencils() {
        let mut t = terrain();
        shape_land(&mut t, |x, _| (x * x) as i32);
        // f = x²: interior (f(x-2) - 2f(x) + f(x+2)) / 4 = 2
        assert_eq!(t.tile_at(pos(3, 0)).unwrap().curvature(), 2.0);
        // x = 0: (0 - 2 + 4) / 2
        assert_eq!(t.tile_at(pos(0, 0)).unwrap().curvature(), 1.0);
        // x = 6: (16 - 50 + 36) / 2
        assert_eq!(t.tile_at(pos(6, 0)).unwrap().curvature(), 1.0);
        // x = 1: (0 - 3 + 9) / 4
        assert_eq!(t.tile_at(pos(1, 0)).unwrap().curvature(), 1.5);
        // x = 5: (9 - 75 + 72) / 4
        assert_eq!(t.tile_at(pos(5, 0)).unwrap().curvature(), 1.5);
    }

    #[test]
    fn test_humidity_and_flooding() {
        let mut t = terrain();
        {
            let mut tile = t.tile_at_mut(pos(2, 2)).unwrap();
            tile.set_land(10);
            tile.set_water(4);
            tile.set_magma(-50);
            assert_eq!(tile.as_tile().humidity(), -6);
            assert!(!tile.as_tile().is_flooded());
            tile.add_water(6);
        }
        let tile = t.tile_at(pos(2, 2)).unwrap();
        assert!(tile.is_flooded());
        assert!(!tile.is_molten());
    }

    #[test]
    fn test_temperature_tracks_month() {
        let mut t = terrain();
        let (x, y) = {
            let layout = t.layout();
            (layout.x.playable_min as i32, layout.y.playable_max as i32)
        };
        {
            let mut tile = t.tile_mut(x, y).unwrap();
            tile.set_magma(-100);
            tile.set_land(5);
        }
        let monthly = t.tile(x, y).unwrap().monthly_temperatures();
        for month in Month::all() {
            t.set_month(month);
            let tile = t.tile(x, y).unwrap();
            assert_eq!(tile.current_temperature(), monthly[month.index()]);
        }
        let tile = t.tile(x, y).unwrap();
        assert_eq!(
            tile.monthly_pressures()[3],
            seasons::pressure(monthly[3], tile.land())
        );
    }

    #[test]
    fn test_molten_tile() {
        let t = terrain();
        let tile = t.tile_at(pos(0, 0)).unwrap();
        assert!(tile.is_molten());
        assert_eq!(tile.average_temperature(), MOLTEN_TEMPERATURE);
        assert!(!tile.is_frozen());
    }

    #[test]
    fn test_categorical_layers() {
        let mut t = terrain();
        {
            let mut tile = t.tile_at_mut(pos(1, 1)).unwrap();
            tile.set_soil(Some(SoilTypeId(3)));
            tile.set_plant(Some(PlantTypeId(1)));
            tile.set_element(Some(ElementId(42)));
        }
        let tile = t.tile_at(pos(1, 1)).unwrap();
        assert_eq!(tile.soil(), Some(SoilTypeId(3)));
        assert_eq!(tile.plant(), Some(PlantTypeId(1)));
        assert_eq!(tile.mineral(), None);
        assert!(tile.is_occupied());
        assert!(!t.tile_at(pos(1, 2)).unwrap().is_occupied());
    }

    #[test]
    fn test_distances_and_closest() {
        let t = terrain();
        let origin = t.tile_at(pos(0, 0)).unwrap();
        let near = t.tile_at(pos(3, 4)).unwrap();
        let far = t.tile_at(TilePos::new(ChunkPos::new(1, 1), 0, 0)).unwrap();
        assert_eq!(near.distance_to_x(&origin), 3);
        assert_eq!(near.squared_distance_to(&origin), 25);
        assert_eq!(near.distance_to(&origin), 5.0);
        assert_eq!(origin.closest_of(far, near), near);
        assert_eq!(far.distance_to_y(&origin), S as i32);
    }

    #[test]
    fn test_pollution_is_approximate_but_tracks_trend() {
        let mut t = terrain();
        for y in 0..S {
            for x in 0..S {
                t.tile_at_mut(pos(x, y)).unwrap().add_pollution(20);
            }
        }
        assert_eq!(t.tile_at(pos(2, 2)).unwrap().pollution(), 20);
    }
}
