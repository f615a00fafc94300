// ============================================
// Height Field Builder - Карта высот из карты классификации
// ============================================
// 1. Бордюр вне игровой зоны = высота extension-типа
// 2. Тексель игровой зоны -> тип -> наивная высота t * step
// 3. Сглаживание: 8 соседей с шагом resolution_divisor,
//    если хоть один сосед строго ниже по типу - берём
//    САМУЮ НИЗКУЮ высоту среди таких соседей
//    (но не выше собственной наивной высоты).
//    Так подножия утёсов гладкие, без висящих ступенек.
//
// Соседи за краем растра пропускаются (без зажатия и заворота).

use rayon::prelude::*;

use crate::config::WorldConfig;
use super::classifier::{ColorRaster, TerrainClassifier};
use super::grid::TerrainGrid;
use super::height_field::HeightField;
use super::types::{TerrainTypeId, TerrainTypeTable};

/// Смещения 8-соседства
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Отдельный растр высот в оттенках серого (row-major)
#[derive(Debug, Clone)]
pub struct GrayRaster {
    width: usize,
    depth: usize,
    values: Vec<u8>,
}

impl GrayRaster {
    pub fn new(width: usize, depth: usize, values: Vec<u8>) -> Option<Self> {
        if values.len() != width * depth {
            return None;
        }
        Some(Self { width, depth, values })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Построитель карты высот
#[derive(Debug, Clone, Copy)]
pub struct HeightFieldBuilder {
    extension_size: usize,
    stride: i64,
    extension_type: TerrainTypeId,
}

impl HeightFieldBuilder {
    pub fn new(extension_size: u32, resolution_divisor: u32, extension_type: TerrainTypeId) -> Self {
        Self {
            extension_size: extension_size as usize,
            stride: resolution_divisor.max(1) as i64,
            extension_type,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.extension_size, config.neighbor_stride(), config.extension_type)
    }

    /// Построить по сетке: растеризуем и классифицируем
    pub fn build(&self, grid: &TerrainGrid, table: &TerrainTypeTable, grid_size: u32) -> HeightField {
        let raster = grid.rasterize(table, grid_size);
        let g = grid_size.max(1) as usize;
        self.build_from_raster(Some(&raster), grid.cols() * g, grid.rows() * g, table)
    }

    /// Построить по цветовому растру игровой зоны terrain_width x terrain_depth.
    /// Отсутствующий или битый растр -> лог и плоский бордюрный уровень.
    pub fn build_from_raster(
        &self,
        raster: Option<&ColorRaster>,
        terrain_width: usize,
        terrain_depth: usize,
        table: &TerrainTypeTable,
    ) -> HeightField {
        let mut field = self.empty_field(terrain_width, terrain_depth, table);

        let raster = match raster {
            Some(r) if r.width() == terrain_width && r.depth() == terrain_depth && !r.is_empty() => r,
            Some(r) => {
                log::warn!(
                    "Terrain raster is {}x{}, expected {}x{}; using extension height",
                    r.width(), r.depth(), terrain_width, terrain_depth
                );
                return field;
            }
            None => {
                log::warn!("Terrain raster missing; using extension height");
                return field;
            }
        };

        let classifier = TerrainClassifier::new(table.color_table());
        let classes = classify_raster(&classifier, raster);
        let unknown = classes.iter().filter(|c| c.is_none()).count();
        if unknown > 0 {
            log::warn!("{} terrain texels did not match any terrain color", unknown);
        }

        let e = self.extension_size;
        let width = field.width();
        let stride = self.stride;
        let lowered: usize = field
            .values_mut()
            .par_chunks_mut(width)
            .enumerate()
            .map(|(z, row)| {
                if z < e || z >= e + terrain_depth {
                    return 0;
                }
                let pz = (z - e) as i64;
                let mut lowered = 0;
                for px in 0..terrain_width as i64 {
                    // Неизвестный тексель остаётся на высоте бордюра
                    let Some(t) = classes[pz as usize * terrain_width + px as usize] else {
                        continue;
                    };
                    let (height, smoothed) = smoothed_height(&classes, terrain_width, terrain_depth, px, pz, t, stride, table);
                    row[e + px as usize] = height;
                    if smoothed {
                        lowered += 1;
                    }
                }
                lowered
            })
            .sum();

        log::debug!(
            "Height field {}x{}: {} texels lowered by neighbor smoothing",
            field.width(), field.depth(), lowered
        );
        field
    }

    /// Построить по растру высот: value / 255 * scale, без сглаживания
    pub fn build_from_height_raster(
        &self,
        raster: Option<&GrayRaster>,
        terrain_width: usize,
        terrain_depth: usize,
        scale: f32,
        table: &TerrainTypeTable,
    ) -> HeightField {
        let mut field = self.empty_field(terrain_width, terrain_depth, table);

        let raster = match raster {
            Some(r) if r.width() == terrain_width && r.depth() == terrain_depth => r,
            _ => {
                log::warn!("Height raster missing or mismatched; using extension height");
                return field;
            }
        };

        let e = self.extension_size;
        for pz in 0..terrain_depth {
            for px in 0..terrain_width {
                let v = raster.values[pz * terrain_width + px];
                field.set(px + e, pz + e, v as f32 / 255.0 * scale);
            }
        }
        field
    }

    fn empty_field(&self, terrain_width: usize, terrain_depth: usize, table: &TerrainTypeTable) -> HeightField {
        let e = self.extension_size;
        HeightField::new(
            terrain_width + 2 * e,
            terrain_depth + 2 * e,
            e,
            table.height_of(self.extension_type),
        )
    }
}

/// Классификация всех текселей растра (по строкам параллельно)
fn classify_raster(classifier: &TerrainClassifier, raster: &ColorRaster) -> Vec<Option<TerrainTypeId>> {
    let width = raster.width();
    let mut classes = vec![None; width * raster.depth()];
    classes
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(z, row)| {
            for (x, c) in row.iter_mut().enumerate() {
                *c = classifier.classify_texel(raster, x as i64, z as i64);
            }
        });
    classes
}

/// Высота текселя после сглаживания и флаг "была понижена"
#[allow(clippy::too_many_arguments)]
fn smoothed_height(
    classes: &[Option<TerrainTypeId>],
    width: usize,
    depth: usize,
    px: i64,
    pz: i64,
    t: TerrainTypeId,
    stride: i64,
    table: &TerrainTypeTable,
) -> (f32, bool) {
    let mut lowest: Option<f32> = None;

    for (dx, dz) in NEIGHBOR_OFFSETS {
        let nx = px + dx * stride;
        let nz = pz + dz * stride;
        if nx < 0 || nz < 0 || nx >= width as i64 || nz >= depth as i64 {
            continue;
        }
        // Неизвестный сосед не считается ниже
        let Some(nt) = classes[nz as usize * width + nx as usize] else {
            continue;
        };
        if nt < t {
            let h = table.height_of(nt);
            if lowest.map_or(true, |l| h < l) {
                lowest = Some(h);
            }
        }
    }

    // Свой шаг высоты у типа может поднять "нижнего" соседа выше
    let naive = table.height_of(t);
    match lowest {
        Some(h) if h < naive => (h, true),
        _ => (naive, false),
    }
}
