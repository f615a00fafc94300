// ============================================
// World Config - Параметры синтеза геометрии
// ============================================
// Data-Driven: загружается из JSON, все поля опциональны

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::level::LevelError;
use crate::terrain::TerrainTypeId;

/// Конфигурация мира
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Размер тайла в мировых единицах (= текселей растра на тайл)
    pub grid_size: u32,
    /// Ширина бордюра вокруг игровой зоны (мировые единицы)
    pub extension_size: u32,
    /// Шаг выборки соседей при сглаживании (в текселях)
    pub resolution_divisor: u32,
    /// Тип террейна за пределами игровой зоны
    pub extension_type: TerrainTypeId,
    /// Сэмплов карты высот на один квад меша террейна
    pub terrain_mesh_step: u32,
    /// Доля вершин, удаляемых из меша террейна (0 - без упрощения)
    pub terrain_decimation: f32,
    /// Вынос периметра жидкости наружу
    pub liquid_extension: f32,
    /// Смещение поверхности жидкости относительно высоты её типа
    pub liquid_surface_offset: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            extension_size: 8,
            resolution_divisor: 1,
            extension_type: 0,
            terrain_mesh_step: 1,
            terrain_decimation: 0.0,
            liquid_extension: 0.5,
            liquid_surface_offset: -0.1,
        }
    }
}

impl WorldConfig {
    /// Загрузить конфиг из JSON строки
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let config: WorldConfig = serde_json::from_str(json)
            .map_err(|e| LevelError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Загрузить конфиг из файла
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.grid_size == 0 {
            return Err(LevelError::Invalid("grid_size must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.terrain_decimation) {
            return Err(LevelError::Invalid(format!(
                "terrain_decimation must be in [0, 1), got {}",
                self.terrain_decimation
            )));
        }
        Ok(())
    }

    /// Шаг выборки соседей (0 трактуется как 1)
    #[inline]
    pub fn neighbor_stride(&self) -> u32 {
        self.resolution_divisor.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json(r#"{ "grid_size": 8 }"#).unwrap();
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.extension_size, WorldConfig::default().extension_size);
    }

    #[test]
    fn test_rejects_zero_grid_size() {
        assert!(WorldConfig::from_json(r#"{ "grid_size": 0 }"#).is_err());
    }

    #[test]
    fn test_zero_divisor_is_stride_one() {
        let config = WorldConfig { resolution_divisor: 0, ..Default::default() };
        assert_eq!(config.neighbor_stride(), 1);
    }
}
