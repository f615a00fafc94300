// ============================================
// Terrain Grid - Сетка типов террейна
// ============================================
// rows x cols, row-major, (0,0) = мировой тайл (0,0)

use super::classifier::{classify, ColorRaster};
use super::types::{TerrainTypeId, TerrainTypeTable, ERROR_COLOR};

/// Сетка индексов типов террейна (только чтение для синтеза)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    tiles: Vec<TerrainTypeId>,
}

impl TerrainGrid {
    /// Сетка, заполненная одним типом
    pub fn filled(rows: usize, cols: usize, id: TerrainTypeId) -> Self {
        Self { rows, cols, tiles: vec![id; rows * cols] }
    }

    /// Сетка из готовых данных (None при несовпадении размеров)
    pub fn from_tiles(rows: usize, cols: usize, tiles: Vec<TerrainTypeId>) -> Option<Self> {
        if tiles.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, tiles })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn tiles(&self) -> &[TerrainTypeId] {
        &self.tiles
    }

    /// Тип тайла по (x = столбец, z = строка)
    #[inline]
    pub fn get(&self, x: i32, z: i32) -> Option<TerrainTypeId> {
        if x < 0 || z < 0 || x as usize >= self.cols || z as usize >= self.rows {
            return None;
        }
        Some(self.tiles[z as usize * self.cols + x as usize])
    }

    pub fn set(&mut self, x: usize, z: usize, id: TerrainTypeId) {
        if x < self.cols && z < self.rows {
            self.tiles[z * self.cols + x] = id;
        }
    }

    /// Растеризация в цветовую карту: каждый тайл - квадрат grid_size x grid_size
    pub fn rasterize(&self, table: &TerrainTypeTable, grid_size: u32) -> ColorRaster {
        let g = grid_size.max(1) as usize;
        let width = self.cols * g;
        let depth = self.rows * g;
        let colors = table.color_table();
        let unknown = unmatched_color(&colors);
        let mut pixels = vec![[0u8; 3]; width * depth];

        for pz in 0..depth {
            for px in 0..width {
                let id = self.tiles[(pz / g) * self.cols + px / g];
                // Неизвестный тип - цвет, который классификатор не сопоставит
                pixels[pz * width + px] = colors.get(id as usize).copied().unwrap_or(unknown);
            }
        }

        ColorRaster::new(width, depth, pixels).unwrap_or_else(ColorRaster::empty)
    }
}

/// Цвет дальше допуска от всех цветов таблицы.
/// Сначала magenta, затем перебор с шагом 13 (> 2 * 6):
/// каждый цвет таблицы закрывает не больше одного кандидата.
fn unmatched_color(colors: &[[u8; 3]]) -> [u8; 3] {
    let free = |c: &[u8; 3]| classify(c[0], c[1], c[2], colors).is_none();
    if free(&ERROR_COLOR) {
        return ERROR_COLOR;
    }
    let axis = || (0..=255u8).step_by(13);
    axis()
        .flat_map(|r| axis().flat_map(move |g| axis().map(move |b| [r, g, b])))
        .find(free)
        .unwrap_or(ERROR_COLOR)
}
