// ============================================
// Highland - Синтез геометрии мира
// ============================================
// Карта высот из цветовой карты террейна, утёсы из атомов,
// упрощение мешей по квадрикам и поверхности жидкостей.
//
// Порядок конвейера:
// classify -> height field -> cliff analysis -> cliff placement
// Жидкости и упрощение мешей независимы.

pub mod config;
pub mod terrain;
pub mod cliffs;
pub mod mesh;
pub mod liquid;
pub mod level;
pub mod bake;

pub use config::WorldConfig;
pub use level::{LevelData, LevelError, WorldGeometry};
