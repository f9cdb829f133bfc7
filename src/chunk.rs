//! Fixed-size square block of tiles.
//!
//! A chunk owns one matrix per layer, all `S × S`. Magma, land and water are
//! exact; pollution is diffuse and kept at half resolution.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimalTypeId, ElementId, MineralTypeId, PlantTypeId, SettlementId, SoilTypeId};
use crate::matrix::{CompactMatrix, DownsampledMatrix, IntegerMatrix, ObjectMatrix};

/// Index of a chunk in the terrain's chunk array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: usize,
    pub y: usize,
}

impl ChunkPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Generation-time drift of a chunk, in tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowVector {
    pub x: i32,
    pub y: i32,
}

impl FlowVector {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean length truncated to an integer.
    pub fn magnitude(&self) -> i32 {
        let (x, y) = (self.x as f64, self.y as f64);
        (x * x + y * y).sqrt() as i32
    }
}

/// Scalar layers stored per tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarLayer {
    Magma,
    Land,
    Water,
    Pollution,
}

impl ScalarLayer {
    pub fn all() -> [ScalarLayer; 4] {
        [ScalarLayer::Magma, ScalarLayer::Land, ScalarLayer::Water, ScalarLayer::Pollution]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub position: ChunkPos,
    pub flow: FlowVector,
    pub owner: Option<SettlementId>,
    pub name: String,
    size: usize,
    unlocked: bool,

    pub magma: CompactMatrix,
    pub land: CompactMatrix,
    pub water: CompactMatrix,
    pub pollution: DownsampledMatrix,

    pub soil: ObjectMatrix<SoilTypeId>,
    pub minerals: ObjectMatrix<MineralTypeId>,
    pub plants: ObjectMatrix<PlantTypeId>,
    pub animals: ObjectMatrix<AnimalTypeId>,
    pub elements: ObjectMatrix<ElementId>,
}

impl Chunk {
    pub fn new(position: ChunkPos, flow: FlowVector, owner: Option<SettlementId>, size: usize) -> Self {
        Self {
            position,
            flow,
            owner,
            name: String::new(),
            size,
            unlocked: true,
            magma: CompactMatrix::new(size, size),
            land: CompactMatrix::new(size, size),
            water: CompactMatrix::new(size, size),
            pollution: DownsampledMatrix::new(size, size),
            soil: ObjectMatrix::new(size, size),
            minerals: ObjectMatrix::new(size, size),
            plants: ObjectMatrix::new(size, size),
            animals: ObjectMatrix::new(size, size),
            elements: ObjectMatrix::new(size, size),
        }
    }

    /// Side length `S`.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    pub fn unlock(&mut self) {
        self.unlocked = true;
    }

    /// Validate a local offset, `None` when outside `[0, S)`.
    pub fn local(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        let size = self.size as i64;
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }
        Some((x as usize, y as usize))
    }

    pub fn scalar(&self, layer: ScalarLayer) -> &dyn IntegerMatrix {
        match layer {
            ScalarLayer::Magma => &self.magma,
            ScalarLayer::Land => &self.land,
            ScalarLayer::Water => &self.water,
            ScalarLayer::Pollution => &self.pollution,
        }
    }

    pub fn scalar_mut(&mut self, layer: ScalarLayer) -> &mut dyn IntegerMatrix {
        match layer {
            ScalarLayer::Magma => &mut self.magma,
            ScalarLayer::Land => &mut self.land,
            ScalarLayer::Water => &mut self.water,
            ScalarLayer::Pollution => &mut self.pollution,
        }
    }
}
