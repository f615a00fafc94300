// ============================================
// Liquid Module - Поверхности жидкостей
// ============================================
// Зависит только от сетки типов: порядок относительно
// конвейера утёсов не важен.

mod mesher;

pub use mesher::{LiquidSurface, LiquidSurfaceMesher};
