// ============================================
// Highland CLI - Синтез геометрии уровня
// ============================================
// highland <level.json> [config.json] [out.hfz]

use std::env;
use std::process;

use highland::bake::save_height_field;
use highland::cliffs::CliffAtomType;
use highland::{LevelData, WorldConfig, WorldGeometry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <level.json> [config.json] [out.hfz]", args[0]);
        process::exit(1);
    }

    let level = LevelData::from_file(&args[1])?;
    let config = match args.get(2) {
        Some(path) => WorldConfig::from_file(path)?,
        None => WorldConfig::default(),
    };

    let world = WorldGeometry::build(&level, &config)?;

    let count = |atom: CliffAtomType| world.cliffs.iter().filter(|c| c.atom == atom).count();
    log::info!(
        "Cliff atoms: {} outer corners, {} edges, {} inner corners",
        count(CliffAtomType::AtomOne),
        count(CliffAtomType::AtomTwo),
        count(CliffAtomType::AtomThree)
    );
    for liquid in &world.liquids {
        log::info!(
            "Liquid type {}: {} cells at height {:.2}, {} vertices",
            liquid.liquid_type,
            liquid.cell_count,
            liquid.surface_height,
            liquid.mesh.vertex_count()
        );
    }

    if let Some(out) = args.get(3) {
        save_height_field(out, &world.height_field)?;
        log::info!("Saved height field to {}", out);
    }

    Ok(())
}
