// ============================================
// Cliff Edge Analysis - Сигнатура перепада высот тайла
// ============================================
// Сравниваем ярус тайла с 4 соседями по рёбрам и 4 по углам.
// Соседи за краем сетки считаются "не ниже": на внешней
// границе утёсы не строятся.
//
//   TL  T  TR
//   L   .  R        z растёт вниз (bot)
//   BL  B  BR

use crate::terrain::TerrainGrid;

/// Результат анализа тайла (не хранится, пересчитывается)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeightAnalysis {
    pub top_less: bool,
    pub bot_less: bool,
    pub left_less: bool,
    pub right_less: bool,
    pub corner_top_left_less: bool,
    pub corner_top_right_less: bool,
    pub corner_bot_left_less: bool,
    pub corner_bot_right_less: bool,
    /// Ярус высоты тайла (индекс типа)
    pub height_index: i32,
    pub neighbor_lower_count: u8,
    pub corner_lower_count: u8,
}

impl HeightAnalysis {
    /// Из флагов: рёбра [top, bot, left, right], углы [tl, tr, bl, br]
    pub fn from_flags(height_index: i32, edges: [bool; 4], corners: [bool; 4]) -> Self {
        Self {
            top_less: edges[0],
            bot_less: edges[1],
            left_less: edges[2],
            right_less: edges[3],
            corner_top_left_less: corners[0],
            corner_top_right_less: corners[1],
            corner_bot_left_less: corners[2],
            corner_bot_right_less: corners[3],
            height_index,
            neighbor_lower_count: edges.iter().filter(|&&b| b).count() as u8,
            corner_lower_count: corners.iter().filter(|&&b| b).count() as u8,
        }
    }

    /// Тайл участвует в построении утёсов
    #[inline]
    pub fn is_cliff(&self) -> bool {
        self.neighbor_lower_count > 0 || self.corner_lower_count > 0
    }
}

/// Анализатор перепадов по сетке тайлов
pub struct CliffEdgeAnalyzer<'a> {
    grid: &'a TerrainGrid,
}

impl<'a> CliffEdgeAnalyzer<'a> {
    pub fn new(grid: &'a TerrainGrid) -> Self {
        Self { grid }
    }

    /// Анализ тайла (None - тайл вне сетки)
    pub fn analyze(&self, x: i32, z: i32) -> Option<HeightAnalysis> {
        let h = self.grid.get(x, z)?;
        let less = |dx: i32, dz: i32| self.grid.get(x + dx, z + dz).is_some_and(|n| n < h);

        Some(HeightAnalysis::from_flags(
            h as i32,
            [less(0, -1), less(0, 1), less(-1, 0), less(1, 0)],
            [less(-1, -1), less(1, -1), less(-1, 1), less(1, 1)],
        ))
    }

    /// Маска тайлов у перепада (подложка текстуры скал)
    pub fn support_mask(&self) -> Vec<bool> {
        let (rows, cols) = (self.grid.rows(), self.grid.cols());
        let mut mask = Vec::with_capacity(rows * cols);
        for z in 0..rows as i32 {
            for x in 0..cols as i32 {
                mask.push(self.analyze(x, z).is_some_and(|a| a.is_cliff()));
            }
        }
        mask
    }
}

/// Маска тайлов, у которых есть более низкий сосед
pub fn cliff_support_mask(grid: &TerrainGrid) -> Vec<bool> {
    CliffEdgeAnalyzer::new(grid).support_mask()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center_grid() -> TerrainGrid {
        let mut grid = TerrainGrid::filled(3, 3, 0);
        grid.set(1, 1, 2);
        grid
    }

    #[test]
    fn test_raised_center_has_four_lower_neighbors() {
        let grid = center_grid();
        let a = CliffEdgeAnalyzer::new(&grid).analyze(1, 1).unwrap();
        assert_eq!(a.neighbor_lower_count, 4);
        assert_eq!(a.corner_lower_count, 4);
        assert_eq!(a.height_index, 2);
        assert!(a.top_less && a.bot_less && a.left_less && a.right_less);
    }

    #[test]
    fn test_low_tile_is_not_cliff() {
        let grid = center_grid();
        let a = CliffEdgeAnalyzer::new(&grid).analyze(0, 1).unwrap();
        assert!(!a.is_cliff());
    }

    #[test]
    fn test_grid_boundary_is_not_lower() {
        let grid = TerrainGrid::filled(2, 2, 3);
        let a = CliffEdgeAnalyzer::new(&grid).analyze(0, 0).unwrap();
        assert_eq!(a, HeightAnalysis::from_flags(3, [false; 4], [false; 4]));
        assert!(CliffEdgeAnalyzer::new(&grid).analyze(2, 0).is_none());
    }

    #[test]
    fn test_corner_only_neighbor() {
        let mut grid = TerrainGrid::filled(2, 2, 1);
        grid.set(1, 1, 0);
        let a = CliffEdgeAnalyzer::new(&grid).analyze(0, 0).unwrap();
        assert_eq!(a.neighbor_lower_count, 0);
        assert!(a.corner_bot_right_less);
        assert_eq!(a.corner_lower_count, 1);
    }

    #[test]
    fn test_support_mask() {
        let mask = cliff_support_mask(&center_grid());
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[4]);
    }
}
