//! Chunked planet terrain engine
//!
//! Memory-adaptive integer matrices, chunks and tiles over a flat, cylindrical
//! or toroidal world, splittable region cursors and a procedural generator.

pub mod chunk;
pub mod elements;
pub mod export;
pub mod generator;
pub mod ids;
pub mod matrix;
pub mod orientation;
pub mod params;
pub mod region;
pub mod seasons;
pub mod terrain;
pub mod tile;

pub use chunk::{Chunk, ChunkPos, FlowVector, ScalarLayer};
pub use generator::{generate_world, BasicGenerator, Kernel};
pub use params::{ParamsError, TerrainParams, TerrainShape, WorldParams};
pub use region::{ChunkCursor, RegionError, TileCursor};
pub use seasons::Month;
pub use terrain::{Terrain, TerrainStats, TilePos};
pub use tile::{Tile, TileMut};
