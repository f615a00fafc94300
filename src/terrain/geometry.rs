// ============================================
// Terrain Geometry - Меш поверхности по карте высот
// ============================================
// Плотная сетка с шагом step сэмплов, затем (опционально)
// упрощение по квадрикам. Ошибка упрощения не роняет мир:
// остаётся неупрощённый меш.

use crate::mesh::Mesh;
use super::height_field::HeightField;

/// Сетка поверхности: вершина каждые step сэмплов (+ последний ряд)
pub fn build_surface_mesh(field: &HeightField, step: u32) -> Mesh {
    let step = step.max(1) as usize;
    let xs = sample_coords(field.width(), step);
    let zs = sample_coords(field.depth(), step);
    let nx = xs.len() as u32;

    let mut positions = Vec::with_capacity(xs.len() * zs.len());
    let mut uvs = Vec::with_capacity(xs.len() * zs.len());
    let u_max = field.width().saturating_sub(1).max(1) as f32;
    let v_max = field.depth().saturating_sub(1).max(1) as f32;

    for &z in &zs {
        for &x in &xs {
            let (wx, wz) = field.field_to_world(x as f32, z as f32);
            let h = field.get(x, z).unwrap_or(0.0);
            positions.push([wx, h, wz]);
            uvs.push([x as f32 / u_max, z as f32 / v_max]);
        }
    }

    let mut indices = Vec::new();
    for row in 0..(zs.len() as u32).saturating_sub(1) {
        for col in 0..nx.saturating_sub(1) {
            let i = row * nx + col;
            indices.extend_from_slice(&[i, i + nx, i + 1, i + 1, i + nx, i + nx + 1]);
        }
    }

    Mesh::new(positions, indices).with_uvs(uvs)
}

/// Поверхность с упрощением (reduction = 0 - без упрощения)
pub fn build_decimated_surface(field: &HeightField, step: u32, reduction: f32) -> Mesh {
    let mut mesh = build_surface_mesh(field, step);
    if reduction <= 0.0 {
        return mesh;
    }

    let before = mesh.triangle_count();
    match mesh.decimate(reduction) {
        Ok(removed) => {
            mesh.compact();
            log::info!(
                "Terrain surface decimated: {} -> {} triangles ({} removed)",
                before,
                mesh.triangle_count(),
                removed
            );
        }
        Err(e) => log::warn!("Terrain surface decimation skipped: {}", e),
    }
    mesh
}

fn sample_coords(size: usize, step: usize) -> Vec<usize> {
    if size == 0 {
        return Vec::new();
    }
    let mut coords: Vec<usize> = (0..size).step_by(step).collect();
    if coords.last() != Some(&(size - 1)) {
        coords.push(size - 1);
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_covers_field() {
        let mut field = HeightField::new(5, 5, 0, 0.0);
        field.set(4, 4, 3.0);
        let mesh = build_surface_mesh(&field, 2);
        // Сэмплы 0, 2, 4 по каждой оси
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.positions[8], [1.5, 3.0, 1.5]);
        assert_eq!(mesh.bounds().min, [-2.5, 0.0, -2.5]);
    }

    #[test]
    fn test_uneven_step_keeps_last_row() {
        assert_eq!(sample_coords(6, 4), vec![0, 4, 5]);
        assert_eq!(sample_coords(1, 4), vec![0]);
    }

    #[test]
    fn test_flat_surface_decimates() {
        let field = HeightField::new(9, 9, 0, 1.0);
        let dense = build_surface_mesh(&field, 1);
        let mesh = build_decimated_surface(&field, 1, 0.5);
        // 81 * 0.5 = 40.5, контур - 32 вершины
        assert!(mesh.vertex_count() <= 40);
        assert!(mesh.vertex_count() >= 32);
        assert!(mesh.triangle_count() > 0);
        assert!(mesh.triangle_count() < dense.triangle_count());
        assert_eq!(mesh.bounds(), dense.bounds());
    }

    #[test]
    fn test_heavy_decimation_keeps_outline() {
        let mut field = HeightField::new(9, 9, 0, 0.0);
        field.set(4, 4, 2.0);
        let dense = build_surface_mesh(&field, 1);
        let mesh = build_decimated_surface(&field, 1, 0.9);
        assert!(mesh.triangle_count() > 0);
        let (lo, hi) = (mesh.bounds(), dense.bounds());
        assert_eq!([lo.min[0], lo.min[2], lo.max[0], lo.max[2]], [hi.min[0], hi.min[2], hi.max[0], hi.max[2]]);
    }
}
