// ============================================
// Terrain Module - Карта классификации и карта высот
// ============================================
//
// TerrainGrid (типы тайлов)
//   -> rasterize -> ColorRaster (цветовая карта)
//   -> TerrainClassifier (ближайший цвет, допуск 6)
//   -> HeightFieldBuilder (наивная высота + сглаживание минимумом)
//   -> HeightField (расширенное пространство с бордюром)
//   -> geometry (меш поверхности, упрощение)

mod types;
mod grid;
mod classifier;
mod height_field;
mod height_builder;
pub mod geometry;

pub use types::{ColorKey, TerrainTypeDef, TerrainTypeId, TerrainTypeTable};
pub use grid::TerrainGrid;
pub use classifier::{classify, ColorRaster, TerrainClassifier, COLOR_TOLERANCE_SQ};
pub use height_field::{tile_to_world, HeightField};
pub use height_builder::{GrayRaster, HeightFieldBuilder};
