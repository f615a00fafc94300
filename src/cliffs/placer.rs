// ============================================
// Cliff Atom Placer - Расстановка атомов утёса
// ============================================
// Тайл делится на 4 квадранта: TL, TR, BL, BR.
// Приоритет:
// 1. Внешний угол (atom_one): оба ребра диагонали ниже
// 2. Внутренний угол (atom_three): ниже только угловой сосед
// 3. Прямое ребро (atom_two): два квадранта вдоль ребра,
//    если квадрант ещё не занят углом
//
// Повороты углов: TL = 0, TR = PI/2, BL = -PI/2, BR = PI
// Повороты рёбер: top = 0, right = PI/2, left = -PI/2, bot = PI
//
// Рампа на тайле полностью подавляет утёс.

use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::terrain::{tile_to_world, TerrainGrid, TerrainTypeId, TerrainTypeTable};
use super::analysis::{CliffEdgeAnalyzer, HeightAnalysis};

/// Тип атома утёса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CliffAtomType {
    /// Внешний угол
    AtomOne,
    /// Прямое ребро
    AtomTwo,
    /// Внутренний угол
    AtomThree,
}

/// Атом утёса в мировых координатах
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CliffAtomPlacement {
    #[serde(rename = "type")]
    pub atom: CliffAtomType,
    pub world_x: f32,
    pub world_y: f32,
    pub world_z: f32,
    pub rotation: f32,
}

/// Запрос "есть ли рампа на тайле"
pub trait RampQuery {
    fn has_ramp_at(&self, tile_x: i32, tile_z: i32) -> bool;
}

/// Рамп нет нигде
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRamps;

impl RampQuery for NoRamps {
    fn has_ramp_at(&self, _tile_x: i32, _tile_z: i32) -> bool {
        false
    }
}

impl RampQuery for HashSet<(i32, i32)> {
    fn has_ramp_at(&self, tile_x: i32, tile_z: i32) -> bool {
        self.contains(&(tile_x, tile_z))
    }
}

/// Квадрант тайла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    TopLeft,
    TopRight,
    BotLeft,
    BotRight,
}

impl Quadrant {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    /// Центр квадранта в долях тайла
    #[inline]
    fn center(self) -> (f32, f32) {
        match self {
            Quadrant::TopLeft => (0.25, 0.25),
            Quadrant::TopRight => (0.75, 0.25),
            Quadrant::BotLeft => (0.25, 0.75),
            Quadrant::BotRight => (0.75, 0.75),
        }
    }

    /// Поворот углового атома
    #[inline]
    fn corner_rotation(self) -> f32 {
        match self {
            Quadrant::TopLeft => 0.0,
            Quadrant::TopRight => FRAC_PI_2,
            Quadrant::BotLeft => -FRAC_PI_2,
            Quadrant::BotRight => PI,
        }
    }
}

/// Расстановщик атомов
#[derive(Debug, Clone)]
pub struct CliffAtomPlacer {
    grid_size: u32,
    extension_size: u32,
    extended_width: usize,
    extended_depth: usize,
    height_step: f32,
    /// Шаг высоты по индексу типа (пусто - везде height_step)
    type_steps: Vec<f32>,
}

impl CliffAtomPlacer {
    pub fn new(
        grid_size: u32,
        extension_size: u32,
        extended_width: usize,
        extended_depth: usize,
        height_step: f32,
    ) -> Self {
        Self {
            grid_size,
            extension_size,
            extended_width,
            extended_depth,
            height_step,
            type_steps: Vec::new(),
        }
    }

    /// Шаги высоты из таблицы типов (с переопределениями)
    pub fn with_type_table(mut self, table: &TerrainTypeTable) -> Self {
        self.height_step = table.height_step;
        self.type_steps = (0..table.len()).map(|id| table.step_of(id as TerrainTypeId)).collect();
        self
    }

    /// Расстановщик под сетку: расширенный размер = сетка + 2 бордюра
    pub fn for_grid(grid: &TerrainGrid, grid_size: u32, extension_size: u32, table: &TerrainTypeTable) -> Self {
        let extended_width = grid.cols() * grid_size as usize + 2 * extension_size as usize;
        let extended_depth = grid.rows() * grid_size as usize + 2 * extension_size as usize;
        Self::new(grid_size, extension_size, extended_width, extended_depth, table.height_step)
            .with_type_table(table)
    }

    /// Шаг высоты типа тайла
    #[inline]
    fn step_for(&self, height_index: i32) -> f32 {
        usize::try_from(height_index)
            .ok()
            .and_then(|i| self.type_steps.get(i).copied())
            .unwrap_or(self.height_step)
    }

    /// Высота подножия утёса (шаг - по типу самого тайла).
    /// Одиночный уступ без нижних соседей - на ярус выше.
    pub fn base_height(&self, analysis: &HeightAnalysis) -> f32 {
        let mut index = analysis.height_index - 2;
        if analysis.neighbor_lower_count == 0 && analysis.corner_lower_count == 0 {
            index += 1;
        }
        index as f32 * self.step_for(analysis.height_index)
    }

    /// Атомы для одного тайла
    pub fn place<R: RampQuery + ?Sized>(
        &self,
        tile_x: i32,
        tile_z: i32,
        analysis: &HeightAnalysis,
        ramps: &R,
    ) -> Vec<CliffAtomPlacement> {
        if ramps.has_ramp_at(tile_x, tile_z) {
            return Vec::new();
        }

        let a = analysis;
        let origin_x = tile_to_world(tile_x, self.grid_size, self.extension_size, self.extended_width);
        let origin_z = tile_to_world(tile_z, self.grid_size, self.extension_size, self.extended_depth);
        let world_y = self.base_height(a);
        let g = self.grid_size as f32;

        let mut placements = Vec::new();
        let mut occupied = [false; 4];
        let mut emit = |atom: CliffAtomType, quadrant: Quadrant, rotation: f32| {
            let (u, v) = quadrant.center();
            placements.push(CliffAtomPlacement {
                atom,
                world_x: origin_x + u * g,
                world_y,
                world_z: origin_z + v * g,
                rotation,
            });
        };

        // (квадрант, ребро A, ребро B, угловой сосед)
        let corners = [
            (Quadrant::TopLeft, a.top_less, a.left_less, a.corner_top_left_less),
            (Quadrant::TopRight, a.top_less, a.right_less, a.corner_top_right_less),
            (Quadrant::BotLeft, a.bot_less, a.left_less, a.corner_bot_left_less),
            (Quadrant::BotRight, a.bot_less, a.right_less, a.corner_bot_right_less),
        ];

        // 1. Внешние углы
        for &(q, edge_a, edge_b, _) in &corners {
            if edge_a && edge_b {
                emit(CliffAtomType::AtomOne, q, q.corner_rotation());
                occupied[q.index()] = true;
            }
        }

        // 2. Внутренние углы
        for &(q, edge_a, edge_b, corner) in &corners {
            if corner && !edge_a && !edge_b {
                emit(CliffAtomType::AtomThree, q, q.corner_rotation());
                occupied[q.index()] = true;
            }
        }

        // 3. Прямые рёбра в свободные квадранты
        let edges = [
            (a.top_less, [Quadrant::TopLeft, Quadrant::TopRight], 0.0),
            (a.right_less, [Quadrant::TopRight, Quadrant::BotRight], FRAC_PI_2),
            (a.left_less, [Quadrant::TopLeft, Quadrant::BotLeft], -FRAC_PI_2),
            (a.bot_less, [Quadrant::BotLeft, Quadrant::BotRight], PI),
        ];
        for (less, quadrants, rotation) in edges {
            if !less {
                continue;
            }
            for q in quadrants {
                if !occupied[q.index()] {
                    emit(CliffAtomType::AtomTwo, q, rotation);
                }
            }
        }

        placements
    }

    /// Все атомы сетки (свежий список, без диффа со старым)
    pub fn place_all<R: RampQuery + ?Sized>(&self, grid: &TerrainGrid, ramps: &R) -> Vec<CliffAtomPlacement> {
        let analyzer = CliffEdgeAnalyzer::new(grid);
        let mut placements = Vec::new();
        let mut suppressed = 0;

        for z in 0..grid.rows() as i32 {
            for x in 0..grid.cols() as i32 {
                let Some(analysis) = analyzer.analyze(x, z) else {
                    continue;
                };
                if !analysis.is_cliff() {
                    continue;
                }
                if ramps.has_ramp_at(x, z) {
                    suppressed += 1;
                    continue;
                }
                placements.extend(self.place(x, z, &analysis, ramps));
            }
        }

        log::debug!("Placed {} cliff atoms ({} tiles suppressed by ramps)", placements.len(), suppressed);
        placements
    }
}
