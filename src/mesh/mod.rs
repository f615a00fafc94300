// ============================================
// Mesh Module - Треугольные меши и их упрощение
// ============================================
// Упрощение не знает о террейне: работает с любым
// индексированным мешем (позиции + индексы).

#[allow(clippy::module_inception)]
mod mesh;
mod quadric;
mod decimate;

pub use mesh::{Aabb, Mesh, MeshVertex};
pub use quadric::QuadricMatrix;
pub use decimate::{DecimateError, MeshDecimator};
