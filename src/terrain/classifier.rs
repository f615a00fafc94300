// ============================================
// Terrain Classifier - Цвет текселя -> тип террейна
// ============================================
// Ближайший цвет в RGB с порогом допуска.
// Несопоставленный тексель = "неизвестно", НЕ тип 0.

use super::types::TerrainTypeId;

/// Квадрат допуска (евклидово расстояние <= 6 в единицах 0-255)
pub const COLOR_TOLERANCE_SQ: u32 = 36;

/// Цветовой растр карты классификации (row-major)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRaster {
    width: usize,
    depth: usize,
    pixels: Vec<[u8; 3]>,
}

impl ColorRaster {
    /// None при несовпадении размера буфера
    pub fn new(width: usize, depth: usize, pixels: Vec<[u8; 3]>) -> Option<Self> {
        if pixels.len() != width * depth {
            return None;
        }
        Some(Self { width, depth, pixels })
    }

    pub fn empty() -> Self {
        Self { width: 0, depth: 0, pixels: Vec::new() }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Тексель по координатам (None вне растра)
    #[inline]
    pub fn get(&self, x: i64, z: i64) -> Option<[u8; 3]> {
        if x < 0 || z < 0 || x as usize >= self.width || z as usize >= self.depth {
            return None;
        }
        Some(self.pixels[z as usize * self.width + x as usize])
    }
}

/// Классификатор с зарегистрированными цветами типов
#[derive(Debug, Clone)]
pub struct TerrainClassifier {
    colors: Vec<[u8; 3]>,
}

impl TerrainClassifier {
    pub fn new(colors: Vec<[u8; 3]>) -> Self {
        Self { colors }
    }

    /// Классифицировать цвет
    #[inline]
    pub fn classify(&self, r: u8, g: u8, b: u8) -> Option<TerrainTypeId> {
        classify(r, g, b, &self.colors)
    }

    /// Классифицировать тексель растра (вне растра - None)
    #[inline]
    pub fn classify_texel(&self, raster: &ColorRaster, x: i64, z: i64) -> Option<TerrainTypeId> {
        raster.get(x, z).and_then(|[r, g, b]| self.classify(r, g, b))
    }
}

/// Ближайший цвет из таблицы, если он в пределах допуска
pub fn classify(r: u8, g: u8, b: u8, color_table: &[[u8; 3]]) -> Option<TerrainTypeId> {
    let mut best: Option<(usize, u32)> = None;

    for (i, c) in color_table.iter().enumerate() {
        let dr = r as i32 - c[0] as i32;
        let dg = g as i32 - c[1] as i32;
        let db = b as i32 - c[2] as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;

        // При равенстве побеждает первый
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }

    match best {
        Some((i, dist)) if dist <= COLOR_TOLERANCE_SQ => TerrainTypeId::try_from(i).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [[u8; 3]; 3] = [[0, 0, 0], [100, 100, 100], [200, 50, 50]];

    #[test]
    fn test_exact_match() {
        assert_eq!(classify(100, 100, 100, &TABLE), Some(1));
        assert_eq!(classify(200, 50, 50, &TABLE), Some(2));
    }

    #[test]
    fn test_within_tolerance() {
        // dist^2 = 36
        assert_eq!(classify(106, 100, 100, &TABLE), Some(1));
    }

    #[test]
    fn test_too_far_is_unknown() {
        // dist^2 = 49 > 36
        assert_eq!(classify(107, 100, 100, &TABLE), None);
        assert_eq!(classify(50, 50, 50, &TABLE), None);
    }

    #[test]
    fn test_unmatched_is_not_type_zero() {
        assert_eq!(classify(255, 255, 255, &TABLE), None);
        assert_eq!(classify(0, 0, 0, &[]), None);
    }

    #[test]
    fn test_texel_outside_raster() {
        let raster = ColorRaster::new(1, 1, vec![[0, 0, 0]]).unwrap();
        let classifier = TerrainClassifier::new(TABLE.to_vec());
        assert_eq!(classifier.classify_texel(&raster, 0, 0), Some(0));
        assert_eq!(classifier.classify_texel(&raster, 1, 0), None);
    }
}
