// ============================================
// Cliffs Module - Утёсы из атомов
// ============================================
//
// analysis: сигнатура перепада тайла (4 ребра + 4 угла)
// placer:   атомы по квадрантам (угол > внутренний угол > ребро)
// entities: уничтожить всё старое -> создать новое

mod analysis;
mod placer;
mod entities;

pub use analysis::{cliff_support_mask, CliffEdgeAnalyzer, HeightAnalysis};
pub use placer::{CliffAtomPlacement, CliffAtomPlacer, CliffAtomType, NoRamps, RampQuery};
pub use entities::{CliffEntities, CliffSpawner};
