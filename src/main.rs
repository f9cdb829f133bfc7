use std::process;

use clap::Parser;

use tectonic_terrain::export;
use tectonic_terrain::generator::{generate_world_with, Kernel};
use tectonic_terrain::params::{TerrainShape, WorldParams};
use tectonic_terrain::seasons::Month;

#[derive(Parser, Debug)]
#[command(name = "tectonic_terrain")]
#[command(about = "Generate chunked planet terrain")]
struct Args {
    /// JSON file with world parameters; flags below override it
    #[arg(short, long)]
    config: Option<String>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Terrain shape: flat, cylinder or torus
    #[arg(long)]
    shape: Option<String>,

    /// Chunk side is 2^p - 1 tiles
    #[arg(long)]
    plate_size_exponent: Option<u32>,

    #[arg(long)]
    world_size_exponent: Option<u32>,

    #[arg(long)]
    playable_size_exponent: Option<u32>,

    #[arg(long)]
    crust_thickness_factor: Option<f64>,

    #[arg(long)]
    sea_level_factor: Option<f64>,

    #[arg(long)]
    roughness_factor: Option<f64>,

    #[arg(long)]
    axial_tilt: Option<f64>,

    #[arg(long)]
    distance_to_sun_factor: Option<f64>,

    /// Blob falloff: delta, pyramid, cone, diamond, smoothstep, smootherstep, smootheststep
    #[arg(short, long, default_value = "smoothstep")]
    kernel: String,

    /// Month used for current temperatures (0 = January)
    #[arg(long, default_value = "0")]
    month: usize,

    /// Export the playable area to PNG
    #[arg(long)]
    png: Option<String>,

    /// Export parameters and statistics to JSON
    #[arg(long)]
    summary: Option<String>,
}

fn world_params(args: &Args) -> Result<WorldParams, String> {
    let mut params = match &args.config {
        Some(path) => WorldParams::load(path).map_err(|e| format!("{}: {}", path, e))?,
        None => WorldParams::default(),
    };
    if let Some(seed) = args.seed {
        params.seed = seed;
    } else if args.config.is_none() {
        params.seed = rand::random();
    }
    if let Some(shape) = &args.shape {
        params.shape = TerrainShape::from_str(shape)
            .ok_or_else(|| format!("unknown shape '{}', expected flat, cylinder or torus", shape))?;
    }
    if let Some(v) = args.plate_size_exponent {
        params.plate_size_exponent = v;
    }
    if let Some(v) = args.world_size_exponent {
        params.world_size_exponent = v;
    }
    if let Some(v) = args.playable_size_exponent {
        params.playable_size_exponent = v;
    }
    if let Some(v) = args.crust_thickness_factor {
        params.crust_thickness_factor = v;
    }
    if let Some(v) = args.sea_level_factor {
        params.sea_level_factor = v;
    }
    if let Some(v) = args.roughness_factor {
        params.roughness_factor = v;
    }
    if let Some(v) = args.axial_tilt {
        params.axial_tilt = v;
    }
    if let Some(v) = args.distance_to_sun_factor {
        params.distance_to_sun_factor = v;
    }
    Ok(params)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let params = match world_params(&args) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let Some(kernel) = Kernel::from_str(&args.kernel) else {
        eprintln!("Error: unknown kernel '{}'", args.kernel);
        process::exit(1);
    };

    println!("Generating {} terrain with seed: {}", params.shape, params.seed);
    let mut terrain = match generate_world_with(&params, kernel) {
        Ok(terrain) => terrain,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    terrain.set_month(Month::from_index(args.month));

    let layout = terrain.layout();
    println!(
        "Playable area: {}x{} tiles in {} chunks of {}x{}",
        layout.x.playable_size,
        layout.y.playable_size,
        layout.chunk_count(),
        terrain.chunk_size(),
        terrain.chunk_size()
    );

    let stats = terrain.statistics();
    println!("Land range: {} to {} (mean {:.1})", stats.land_min, stats.land_max, stats.mean_land);
    println!(
        "Flooded: {} tiles ({:.1}%), molten: {} tiles",
        stats.flooded,
        100.0 * stats.flooded_fraction(),
        stats.molten
    );
    println!("Mean annual temperature: {:.1}°C", stats.mean_temperature);

    if let Some(path) = &args.png {
        println!("Exporting map to {}...", path);
        if let Err(e) = export::render_png(&terrain, path) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if let Some(path) = &args.summary {
        println!("Exporting summary to {}...", path);
        if let Err(e) = export::write_summary(&terrain, path) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    println!("Done!");
}
