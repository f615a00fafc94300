// ============================================
// Terrain Types - Таблица типов террейна
// ============================================
// Индекс типа = ярус высоты. Высота типа t = t * height_step

use serde::{Deserialize, Serialize};

/// ID типа террейна
pub type TerrainTypeId = u8;

/// Цвет типа на карте классификации (гибкий формат)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorKey {
    /// RGB массив [r, g, b]
    Rgb([u8; 3]),
    /// Hex строка "#RRGGBB"
    Hex(String),
}

impl ColorKey {
    pub fn to_rgb(&self) -> [u8; 3] {
        match self {
            ColorKey::Rgb(rgb) => *rgb,
            ColorKey::Hex(s) => parse_hex_rgb(s),
        }
    }
}

/// Цвет ошибки (битый hex)
pub const ERROR_COLOR: [u8; 3] = [255, 0, 255];

fn parse_hex_rgb(s: &str) -> [u8; 3] {
    let hex = s.trim_start_matches('#');
    // Только 6 ASCII hex-цифр: срез по байтам не попадёт внутрь символа
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        log::warn!("Invalid terrain color '{}', using magenta", s);
        return ERROR_COLOR;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(v) => [(v >> 16) as u8, (v >> 8) as u8, v as u8],
        Err(_) => ERROR_COLOR,
    }
}

/// Определение типа террейна
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainTypeDef {
    #[serde(default)]
    pub name: String,
    pub color: ColorKey,
    /// Собственный шаг высоты (иначе общий из таблицы)
    #[serde(default)]
    pub height_step: Option<f32>,
    /// Жидкость (вода, лава) - получает отдельный меш поверхности
    #[serde(default)]
    pub liquid: bool,
}

impl TerrainTypeDef {
    pub fn new(name: &str, color: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            color: ColorKey::Rgb(color),
            height_step: None,
            liquid: false,
        }
    }

    pub fn with_height_step(mut self, step: f32) -> Self {
        self.height_step = Some(step);
        self
    }

    pub fn as_liquid(mut self) -> Self {
        self.liquid = true;
        self
    }
}

/// Таблица типов: индекс -> {цвет, шаг высоты}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainTypeTable {
    /// Общий шаг высоты на ярус
    pub height_step: f32,
    pub types: Vec<TerrainTypeDef>,
}

impl TerrainTypeTable {
    pub fn new(height_step: f32, types: Vec<TerrainTypeDef>) -> Self {
        Self { height_step, types }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TerrainTypeId) -> Option<&TerrainTypeDef> {
        self.types.get(id as usize)
    }

    /// Шаг высоты для типа (с учётом переопределения)
    #[inline]
    pub fn step_of(&self, id: TerrainTypeId) -> f32 {
        self.get(id)
            .and_then(|t| t.height_step)
            .unwrap_or(self.height_step)
    }

    /// Наивная высота типа: t * step
    #[inline]
    pub fn height_of(&self, id: TerrainTypeId) -> f32 {
        id as f32 * self.step_of(id)
    }

    /// Цвета всех типов в порядке индексов
    pub fn color_table(&self) -> Vec<[u8; 3]> {
        self.types.iter().map(|t| t.color.to_rgb()).collect()
    }

    /// Индексы жидких типов
    pub fn liquid_types(&self) -> impl Iterator<Item = TerrainTypeId> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.liquid)
            .map(|(i, _)| i as TerrainTypeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_uses_override() {
        let table = TerrainTypeTable::new(10.0, vec![
            TerrainTypeDef::new("low", [0, 0, 0]),
            TerrainTypeDef::new("mid", [50, 50, 50]),
            TerrainTypeDef::new("high", [100, 100, 100]).with_height_step(4.0),
        ]);
        assert_eq!(table.height_of(0), 0.0);
        assert_eq!(table.height_of(1), 10.0);
        assert_eq!(table.height_of(2), 8.0);
    }

    #[test]
    fn test_hex_and_array_colors() {
        let json = r##"{ "height_step": 2.0, "types": [
            { "color": "#ff8000" },
            { "color": [1, 2, 3], "liquid": true }
        ] }"##;
        let table: TerrainTypeTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.color_table(), vec![[255, 128, 0], [1, 2, 3]]);
        assert_eq!(table.liquid_types().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_malformed_hex_falls_back_to_magenta() {
        // "1é234" - 6 байт, но не 6 символов
        let json = r##"{ "height_step": 1.0, "types": [
            { "color": "1é234" },
            { "color": "#12345g" },
            { "color": "+12345" },
            { "color": "#abc" }
        ] }"##;
        let table: TerrainTypeTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.color_table(), vec![ERROR_COLOR; 4]);
    }
}
