// ============================================
// Level - Данные уровня и конвейер геометрии мира
// ============================================
// Загрузка уровня: classify -> height field -> cliffs,
// затем меш поверхности и жидкости.
// Правка тайла = полная перестройка (без инкрементальности).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cliffs::{cliff_support_mask, CliffAtomPlacement, CliffAtomPlacer, CliffEntities, CliffSpawner};
use crate::config::WorldConfig;
use crate::liquid::{LiquidSurface, LiquidSurfaceMesher};
use crate::mesh::Mesh;
use crate::terrain::geometry::build_decimated_surface;
use crate::terrain::{HeightField, HeightFieldBuilder, TerrainGrid, TerrainTypeId, TerrainTypeTable};

/// Ошибки загрузки уровня и конфига
#[derive(Debug)]
pub enum LevelError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(e) => write!(f, "io error: {}", e),
            LevelError::Parse(e) => write!(f, "parse error: {}", e),
            LevelError::Invalid(e) => write!(f, "invalid level: {}", e),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::Io(e)
    }
}

/// Описание уровня (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub rows: usize,
    pub cols: usize,
    /// Типы тайлов, row-major
    pub tiles: Vec<TerrainTypeId>,
    pub types: TerrainTypeTable,
    /// Тайлы с рампами [x, z]
    #[serde(default)]
    pub ramps: Vec<[i32; 2]>,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: LevelData = serde_json::from_str(json)
            .map_err(|e| LevelError::Parse(e.to_string()))?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.tiles.len() != self.rows * self.cols {
            return Err(LevelError::Invalid(format!(
                "{} tiles for a {}x{} grid",
                self.tiles.len(), self.rows, self.cols
            )));
        }
        if self.types.is_empty() {
            return Err(LevelError::Invalid("no terrain types".to_string()));
        }
        if let Some(&t) = self.tiles.iter().find(|&&t| t as usize >= self.types.len()) {
            return Err(LevelError::Invalid(format!("unknown terrain type {}", t)));
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<TerrainGrid, LevelError> {
        TerrainGrid::from_tiles(self.rows, self.cols, self.tiles.clone())
            .ok_or_else(|| LevelError::Invalid("tile count mismatch".to_string()))
    }

    pub fn ramp_set(&self) -> HashSet<(i32, i32)> {
        self.ramps.iter().map(|&[x, z]| (x, z)).collect()
    }
}

/// Вся синтезированная геометрия уровня
pub struct WorldGeometry {
    pub config: WorldConfig,
    pub grid: TerrainGrid,
    pub types: TerrainTypeTable,
    pub ramps: HashSet<(i32, i32)>,
    pub height_field: HeightField,
    pub cliffs: Vec<CliffAtomPlacement>,
    /// Тайлы под текстуру скал
    pub cliff_support: Vec<bool>,
    pub terrain_mesh: Mesh,
    pub liquids: Vec<LiquidSurface>,
}

impl WorldGeometry {
    /// Полный конвейер загрузки уровня
    pub fn build(level: &LevelData, config: &WorldConfig) -> Result<Self, LevelError> {
        let grid = level.grid()?;
        let mut world = Self {
            config: config.clone(),
            height_field: HeightField::new(0, 0, 0, 0.0),
            grid,
            types: level.types.clone(),
            ramps: level.ramp_set(),
            cliffs: Vec::new(),
            cliff_support: Vec::new(),
            terrain_mesh: Mesh::new(Vec::new(), Vec::new()),
            liquids: Vec::new(),
        };
        world.rebuild_terrain();
        world.rebuild_liquids();
        Ok(world)
    }

    /// Карта высот, утёсы и меш поверхности заново
    pub fn rebuild_terrain(&mut self) {
        let builder = HeightFieldBuilder::from_config(&self.config);
        self.height_field = builder.build(&self.grid, &self.types, self.config.grid_size);

        let placer = CliffAtomPlacer::for_grid(
            &self.grid,
            self.config.grid_size,
            self.config.extension_size,
            &self.types,
        );
        self.cliffs = placer.place_all(&self.grid, &self.ramps);
        self.cliff_support = cliff_support_mask(&self.grid);

        self.terrain_mesh = build_decimated_surface(
            &self.height_field,
            self.config.terrain_mesh_step,
            self.config.terrain_decimation,
        );

        let (lo, hi) = self.height_field.min_max();
        log::info!(
            "Terrain rebuilt: {}x{} height field ({:.1}..{:.1}), {} cliff atoms, {} surface triangles",
            self.height_field.width(),
            self.height_field.depth(),
            lo,
            hi,
            self.cliffs.len(),
            self.terrain_mesh.triangle_count()
        );
    }

    pub fn rebuild_liquids(&mut self) {
        let mesher = LiquidSurfaceMesher::for_grid(&self.grid, &self.config);
        self.liquids = mesher.build_all(&self.grid, &self.types, self.config.liquid_surface_offset);
        log::info!("Liquids rebuilt: {} surfaces", self.liquids.len());
    }

    /// Правка тайла: полная перестройка террейна и жидкостей
    pub fn set_tile(&mut self, x: usize, z: usize, id: TerrainTypeId) -> Result<(), LevelError> {
        if id as usize >= self.types.len() {
            return Err(LevelError::Invalid(format!("unknown terrain type {}", id)));
        }
        if self.grid.get(x as i32, z as i32).is_none() {
            return Err(LevelError::Invalid(format!("tile ({}, {}) outside grid", x, z)));
        }
        self.grid.set(x, z, id);
        self.rebuild_terrain();
        self.rebuild_liquids();
        Ok(())
    }

    /// Поставить/убрать рампу (перестраивает утёсы)
    pub fn set_ramp(&mut self, x: i32, z: i32, present: bool) {
        let changed = if present {
            self.ramps.insert((x, z))
        } else {
            self.ramps.remove(&(x, z))
        };
        if changed {
            self.rebuild_terrain();
        }
    }

    /// Отдать текущие атомы спавнеру (старые объекты уничтожаются)
    pub fn apply_cliffs<S: CliffSpawner>(&self, entities: &mut CliffEntities<S>) {
        entities.regenerate(&self.cliffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cliffs::CliffAtomType;

    const LEVEL: &str = r##"{
        "rows": 3,
        "cols": 3,
        "tiles": [0, 0, 0,
                  0, 2, 0,
                  0, 0, 0],
        "types": {
            "height_step": 10.0,
            "types": [
                { "name": "ground", "color": "#000000" },
                { "name": "water", "color": "#0000ff", "liquid": true },
                { "name": "plateau", "color": [200, 200, 200] }
            ]
        }
    }"##;

    fn config() -> WorldConfig {
        WorldConfig {
            grid_size: 4,
            extension_size: 2,
            resolution_divisor: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_unknown_type() {
        let json = LEVEL.replace("0, 2, 0", "0, 7, 0");
        assert!(matches!(LevelData::from_json(&json), Err(LevelError::Invalid(_))));
    }

    #[test]
    fn test_rejects_wrong_tile_count() {
        let json = LEVEL.replace("\"rows\": 3", "\"rows\": 4");
        assert!(LevelData::from_json(&json).is_err());
    }

    #[test]
    fn test_raised_center_pipeline() {
        let level = LevelData::from_json(LEVEL).unwrap();
        let world = WorldGeometry::build(&level, &config()).unwrap();

        assert_eq!(world.height_field.width(), 16);
        // Центральный тайл: тексели 6..10 с учётом бордюра
        assert_eq!(world.height_field.get(6, 7), Some(0.0));
        assert_eq!(world.height_field.get(7, 7), Some(20.0));
        assert_eq!(world.cliffs.len(), 4);
        assert!(world.cliffs.iter().all(|c| c.atom == CliffAtomType::AtomOne));
        assert_eq!(world.liquids.len(), 1);
        assert_eq!(world.liquids[0].cell_count, 0);
    }

    #[test]
    fn test_ramp_suppresses_center_cliffs() {
        let level = LevelData::from_json(LEVEL).unwrap();
        let mut world = WorldGeometry::build(&level, &config()).unwrap();
        world.set_ramp(1, 1, true);
        assert!(world.cliffs.is_empty());
        world.set_ramp(1, 1, false);
        assert_eq!(world.cliffs.len(), 4);
    }

    #[test]
    fn test_tile_edit_rebuilds() {
        let level = LevelData::from_json(LEVEL).unwrap();
        let mut world = WorldGeometry::build(&level, &config()).unwrap();
        world.set_tile(1, 1, 0).unwrap();
        assert!(world.cliffs.is_empty());
        assert!(world.height_field.values().iter().all(|&h| h == 0.0));
        world.set_tile(0, 0, 1).unwrap();
        assert_eq!(world.liquids[0].cell_count, 1);
        assert!(world.set_tile(5, 0, 1).is_err());
    }
}
