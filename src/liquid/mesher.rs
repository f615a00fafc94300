// ============================================
// Liquid Surface Mesher - Единый меш жидкости
// ============================================
// Все клетки одного жидкого типа -> один индексированный меш.
// Углы клеток свариваются по ключу позиции (не по допуску).
// Рёбра, соседние с НЕ той же жидкостью (и край сетки),
// выносят свои вершины наружу на extension_amount:
// меш чуть больше клеток и заходит на берег без щели.
//
// Результат - чистая функция (сетка, тип): без случайности.

use std::collections::HashMap;

use vob::Vob;

use crate::config::WorldConfig;
use crate::mesh::Mesh;
use crate::terrain::{tile_to_world, TerrainGrid, TerrainTypeId, TerrainTypeTable};

// Биты выноса вершины
const PUSH_NEG_X: u8 = 1;
const PUSH_POS_X: u8 = 2;
const PUSH_NEG_Z: u8 = 4;
const PUSH_POS_Z: u8 = 8;

/// Поверхность одной жидкости
#[derive(Debug, Clone)]
pub struct LiquidSurface {
    pub liquid_type: TerrainTypeId,
    pub surface_height: f32,
    pub cell_count: usize,
    pub mesh: Mesh,
}

/// Построитель мешей жидкостей
#[derive(Debug, Clone, Copy)]
pub struct LiquidSurfaceMesher {
    grid_size: f32,
    extension_amount: f32,
    /// Мировая точка угла (0,0) сетки
    origin: [f32; 2],
}

impl LiquidSurfaceMesher {
    pub fn new(grid_size: f32, extension_amount: f32, origin: [f32; 2]) -> Self {
        Self { grid_size, extension_amount, origin }
    }

    /// Мешер в мировых координатах уровня (как у утёсов)
    pub fn for_grid(grid: &TerrainGrid, config: &WorldConfig) -> Self {
        let g = config.grid_size;
        let e = config.extension_size;
        let width = grid.cols() * g as usize + 2 * e as usize;
        let depth = grid.rows() * g as usize + 2 * e as usize;
        Self::new(
            g as f32,
            config.liquid_extension,
            [tile_to_world(0, g, e, width), tile_to_world(0, g, e, depth)],
        )
    }

    /// Меш всех клеток liquid_type на высоте surface_height
    pub fn build(&self, grid: &TerrainGrid, liquid_type: TerrainTypeId, surface_height: f32) -> Mesh {
        let (rows, cols) = (grid.rows(), grid.cols());

        let mut matches = Vob::new();
        for &t in grid.tiles() {
            matches.push(t == liquid_type);
        }
        let is_liquid = |x: i64, z: i64| {
            x >= 0
                && z >= 0
                && (x as usize) < cols
                && (z as usize) < rows
                && matches.get(z as usize * cols + x as usize).unwrap_or(false)
        };

        let mut vertex_of: HashMap<(u32, u32), u32> = HashMap::new();
        let mut corners: Vec<(u32, u32)> = Vec::new();
        let mut push: Vec<u8> = Vec::new();
        let mut indices = Vec::new();

        for z in 0..rows {
            for x in 0..cols {
                if !is_liquid(x as i64, z as i64) {
                    continue;
                }
                let (cx, cz) = (x as u32, z as u32);
                let mut corner = |key: (u32, u32)| -> u32 {
                    *vertex_of.entry(key).or_insert_with(|| {
                        corners.push(key);
                        push.push(0);
                        (corners.len() - 1) as u32
                    })
                };
                let tl = corner((cx, cz));
                let tr = corner((cx + 1, cz));
                let bl = corner((cx, cz + 1));
                let br = corner((cx + 1, cz + 1));

                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);

                // Периметр: соседняя клетка не та же жидкость
                let (xi, zi) = (x as i64, z as i64);
                if !is_liquid(xi, zi - 1) {
                    push[tl as usize] |= PUSH_NEG_Z;
                    push[tr as usize] |= PUSH_NEG_Z;
                }
                if !is_liquid(xi, zi + 1) {
                    push[bl as usize] |= PUSH_POS_Z;
                    push[br as usize] |= PUSH_POS_Z;
                }
                if !is_liquid(xi - 1, zi) {
                    push[tl as usize] |= PUSH_NEG_X;
                    push[bl as usize] |= PUSH_NEG_X;
                }
                if !is_liquid(xi + 1, zi) {
                    push[tr as usize] |= PUSH_POS_X;
                    push[br as usize] |= PUSH_POS_X;
                }
            }
        }

        let u_max = cols.max(1) as f32;
        let v_max = rows.max(1) as f32;
        let mut positions = Vec::with_capacity(corners.len());
        let mut uvs = Vec::with_capacity(corners.len());
        for (&(cx, cz), &bits) in corners.iter().zip(push.iter()) {
            let dx = axis_push(bits, PUSH_NEG_X, PUSH_POS_X) * self.extension_amount;
            let dz = axis_push(bits, PUSH_NEG_Z, PUSH_POS_Z) * self.extension_amount;
            positions.push([
                self.origin[0] + cx as f32 * self.grid_size + dx,
                surface_height,
                self.origin[1] + cz as f32 * self.grid_size + dz,
            ]);
            uvs.push([cx as f32 / u_max, cz as f32 / v_max]);
        }

        Mesh::new(positions, indices).with_uvs(uvs)
    }

    /// По поверхности на каждый жидкий тип таблицы
    pub fn build_all(&self, grid: &TerrainGrid, table: &TerrainTypeTable, surface_offset: f32) -> Vec<LiquidSurface> {
        table
            .liquid_types()
            .map(|liquid_type| {
                let surface_height = table.height_of(liquid_type) + surface_offset;
                let mesh = self.build(grid, liquid_type, surface_height);
                let cell_count = mesh.triangle_count() / 2;
                log::debug!(
                    "Liquid type {}: {} cells, {} vertices",
                    liquid_type,
                    cell_count,
                    mesh.vertex_count()
                );
                LiquidSurface { liquid_type, surface_height, cell_count, mesh }
            })
            .collect()
    }
}

/// -1, 0 или +1 по оси (оба направления гасят друг друга)
#[inline]
fn axis_push(bits: u8, neg: u8, pos: u8) -> f32 {
    let n = (bits & neg != 0) as i32;
    let p = (bits & pos != 0) as i32;
    (p - n) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainTypeDef;

    fn mesher() -> LiquidSurfaceMesher {
        LiquidSurfaceMesher::new(1.0, 0.25, [0.0, 0.0])
    }

    #[test]
    fn test_adjacent_cells_share_vertices() {
        let grid = TerrainGrid::from_tiles(1, 2, vec![3, 3]).unwrap();
        let mesh = mesher().build(&grid, 3, 0.0);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_isolated_cell_extends_on_both_axes() {
        let grid = TerrainGrid::from_tiles(3, 3, vec![0, 0, 0, 0, 5, 0, 0, 0, 0]).unwrap();
        let mesh = mesher().build(&grid, 5, 2.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.positions[0], [0.75, 2.0, 0.75]);
        assert_eq!(mesh.positions[3], [2.25, 2.0, 2.25]);
    }

    #[test]
    fn test_interior_edges_do_not_extend() {
        let grid = TerrainGrid::from_tiles(1, 2, vec![3, 3]).unwrap();
        let mesh = mesher().build(&grid, 3, 0.0);
        // Общий верхний угол (1, 0): вынос только по -z
        assert_eq!(mesh.positions[1], [1.0, 0.0, -0.25]);
    }

    #[test]
    fn test_surface_faces_up() {
        let grid = TerrainGrid::filled(2, 2, 1);
        let mesh = mesher().build(&grid, 1, 0.0);
        assert!(mesh.normals.iter().all(|n| n[1] > 0.99));
    }

    #[test]
    fn test_no_matching_cells_gives_empty_mesh() {
        let grid = TerrainGrid::filled(2, 2, 1);
        let mesh = mesher().build(&grid, 4, 0.0);
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.indices().is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let grid = TerrainGrid::from_tiles(3, 4, vec![2, 2, 0, 2, 0, 2, 2, 2, 2, 0, 0, 2]).unwrap();
        let a = mesher().build(&grid, 2, 1.0);
        let b = mesher().build(&grid, 2, 1.0);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.indices(), b.indices());
    }

    #[test]
    fn test_build_all_uses_liquid_types() {
        let table = TerrainTypeTable::new(4.0, vec![
            TerrainTypeDef::new("ground", [0, 0, 0]),
            TerrainTypeDef::new("water", [0, 0, 255]).as_liquid(),
        ]);
        let grid = TerrainGrid::from_tiles(1, 3, vec![1, 0, 1]).unwrap();
        let surfaces = mesher().build_all(&grid, &table, -0.5);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].cell_count, 2);
        assert_eq!(surfaces[0].surface_height, 3.5);
        assert_eq!(surfaces[0].mesh.vertex_count(), 8);
    }
}
