//! Procedural terrain generation.
//!
//! [`BasicGenerator`] runs five passes over a fresh terrain:
//!
//! 1. **Chunk seeding**: a random flow vector per chunk
//! 2. **Base levels**: constant magma, land and water everywhere
//! 3. **Relief**: per chunk, a magma blob behind the flow and a land blob ahead of it
//! 4. **Water leveling**: land at or below the base water level is flooded
//! 5. **Humidity**: flooded tiles wet nearby dry tiles without flooding them
//!
//! Passes run one after another; each relies on the previous one being complete.

mod basic;
mod kernels;

pub use basic::{add_blob, add_water_blob, BasicGenerator, HUMIDITY_MAGNITUDE, HUMIDITY_RADIUS};
pub use kernels::Kernel;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::params::{ParamsError, WorldParams};
use crate::terrain::Terrain;

/// Build and generate a terrain from world parameters. One random stream,
/// seeded from `params.seed`, places the playable window and then drives
/// generation.
pub fn generate_world(params: &WorldParams) -> Result<Terrain, ParamsError> {
    generate_world_with(params, Kernel::Smoothstep)
}

/// [`generate_world`] with a specific blob kernel.
pub fn generate_world_with(params: &WorldParams, kernel: Kernel) -> Result<Terrain, ParamsError> {
    let terrain_params = params.terrain_params()?;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut terrain = Terrain::new(terrain_params, &mut rng)?;
    log::info!("Generating {} terrain with {} blobs", terrain.params().shape, kernel);
    BasicGenerator::from_rng(rng).with_kernel(kernel).generate(&mut terrain);
    Ok(terrain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TerrainShape;

    fn small_world(seed: u64, shape: TerrainShape) -> WorldParams {
        WorldParams {
            seed,
            shape,
            plate_size_exponent: 3,
            world_size_exponent: 6,
            playable_size_exponent: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_flooding_only_where_leveled() {
        for shape in TerrainShape::all() {
            let terrain = generate_world(&small_world(17, *shape)).unwrap();
            let base_water = terrain.base_water();
            for pos in terrain.all_tiles().flatten() {
                let tile = terrain.tile_at(pos).unwrap();
                if tile.water() >= tile.land() {
                    assert!(tile.land() <= base_water, "{:?} flooded above base water", pos);
                    assert_eq!(tile.water(), base_water);
                } else {
                    assert!(tile.water() <= tile.land() - 1);
                }
            }
        }
    }

    #[test]
    fn test_generation_produces_relief() {
        let terrain = generate_world(&small_world(4, TerrainShape::Torus)).unwrap();
        let stats = terrain.statistics();
        assert_eq!(stats.tiles, 21 * 21);
        assert!(stats.land_max > stats.land_min);
        assert_eq!(stats, terrain.statistics_sequential());
    }

    #[test]
    fn test_kernel_changes_relief() {
        let params = small_world(8, TerrainShape::Flat);
        let smooth = generate_world(&params).unwrap();
        let delta = generate_world_with(&params, Kernel::Delta).unwrap();
        assert_eq!(smooth.layout(), delta.layout());
        assert_ne!(smooth.statistics(), delta.statistics());
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = generate_world(&small_world(8, TerrainShape::Cylinder)).unwrap();
        let b = generate_world(&small_world(8, TerrainShape::Cylinder)).unwrap();
        assert_eq!(a.layout(), b.layout());
        assert!(a.chunks().zip(b.chunks()).all(|(x, y)| x == y));
    }
}
