// ============================================
// Mesh Decimator - Упрощение по квадрикам ошибки
// ============================================
// 1. Карта рёбер (min, max) и треугольники каждой вершины
// 2. Квадрика вершины = сумма квадрик плоскостей её треугольников
// 3. Ошибка ребра = v^T (Q1 + Q2) v в СЕРЕДИНЕ ребра
//    (не оптимальная точка QEM - визуал настроен под середину)
// 4. Рёбра по возрастанию ошибки, жадное схлопывание:
//    пропуск если вершина уже удалена или у ребра < 2 живых треугольников
// 5. Перестройка индексов по цепочкам схлопываний,
//    выкидываем вырожденные треугольники
//
// Контур меша неподвижен: граничная вершина не двигается и не удаляется,
// ребро между двумя граничными вершинами не схлопывается.
// Перед схлопыванием проверяется link condition (общие соседи концов
// ребра = противолежащие вершины его треугольников), иначе меш рвётся.
//
// Если за проход цель не достигнута, а схлопывания были -
// топология и квадрики строятся заново и идёт следующий проход.
// Счётчик вершин = число вершин, на которые ссылаются индексы.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use ultraviolet::Vec3;
use vob::Vob;

use super::quadric::QuadricMatrix;

/// Ошибки упрощения (меш не трогается)
#[derive(Debug, Clone, PartialEq)]
pub enum DecimateError {
    /// Неиндексированная геометрия
    NotIndexed,
    /// Длина индексного буфера не кратна 3
    MalformedIndices(usize),
    IndexOutOfRange { index: u32, vertex_count: usize },
    InvalidReduction(f32),
}

impl fmt::Display for DecimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimateError::NotIndexed => write!(f, "decimation requires indexed geometry"),
            DecimateError::MalformedIndices(len) => {
                write!(f, "index buffer length {} is not a multiple of 3", len)
            }
            DecimateError::IndexOutOfRange { index, vertex_count } => {
                write!(f, "index {} out of range for {} vertices", index, vertex_count)
            }
            DecimateError::InvalidReduction(r) => {
                write!(f, "target reduction {} must be in [0, 1)", r)
            }
        }
    }
}

impl std::error::Error for DecimateError {}

/// Кандидат на схлопывание
#[derive(Debug, Clone, Copy)]
struct EdgeCandidate {
    v1: u32,
    v2: u32,
    error: f32,
}

/// Живая топология одного прохода
struct PassTopology {
    triangles: Vec<[u32; 3]>,
    alive: Vob,
    vertex_triangles: Vec<Vec<u32>>,
    /// Вершина лежит на граничном ребре (на начало прохода)
    boundary: Vob,
}

impl PassTopology {
    fn new(indices: &[u32], vertex_count: usize, edges: &BTreeMap<(u32, u32), u32>) -> Self {
        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        let mut vertex_triangles = vec![Vec::new(); vertex_count];
        for (t, tri) in triangles.iter().enumerate() {
            for &v in tri {
                vertex_triangles[v as usize].push(t as u32);
            }
        }

        let mut boundary = Vob::new();
        boundary.resize(vertex_count, false);
        for (&(a, b), &count) in edges {
            if count < 2 {
                boundary.set(a as usize, true);
                boundary.set(b as usize, true);
            }
        }

        let mut alive = Vob::new();
        alive.resize(triangles.len(), true);

        Self { triangles, alive, vertex_triangles, boundary }
    }

    #[inline]
    fn is_boundary(&self, v: u32) -> bool {
        self.boundary.get(v as usize).unwrap_or(false)
    }

    fn live_triangles(&self, v: u32) -> impl Iterator<Item = &[u32; 3]> + '_ {
        self.vertex_triangles[v as usize]
            .iter()
            .filter(|&&t| self.alive.get(t as usize).unwrap_or(false))
            .map(|&t| &self.triangles[t as usize])
    }

    fn neighbors(&self, v: u32) -> HashSet<u32> {
        self.live_triangles(v)
            .flat_map(|tri| tri.iter().copied())
            .filter(|&u| u != v)
            .collect()
    }

    /// Противолежащие вершины живых треугольников ребра
    fn edge_opposites(&self, v1: u32, v2: u32) -> Vec<u32> {
        self.live_triangles(v1)
            .filter(|tri| tri.contains(&v2))
            .filter_map(|tri| tri.iter().copied().find(|&u| u != v1 && u != v2))
            .collect()
    }

    /// Ребро можно схлопнуть, не порвав меш
    fn can_collapse(&self, v1: u32, v2: u32) -> bool {
        if self.is_boundary(v1) && self.is_boundary(v2) {
            return false;
        }
        let opposites = self.edge_opposites(v1, v2);
        // Граничное ребро
        if opposites.len() < 2 {
            return false;
        }
        let opposites: HashSet<u32> = opposites.into_iter().collect();
        let shared: HashSet<u32> = self
            .neighbors(v1)
            .intersection(&self.neighbors(v2))
            .copied()
            .collect();
        shared == opposites
    }

    /// lost -> keep во всех живых треугольниках lost
    fn collapse(&mut self, keep: u32, lost: u32) {
        let tris = std::mem::take(&mut self.vertex_triangles[lost as usize]);
        for t in tris {
            if !self.alive.get(t as usize).unwrap_or(false) {
                continue;
            }
            let tri = &mut self.triangles[t as usize];
            for v in tri.iter_mut() {
                if *v == lost {
                    *v = keep;
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                self.alive.set(t as usize, false);
            } else {
                self.vertex_triangles[keep as usize].push(t);
            }
        }
    }
}

/// Упрощатель мешей
#[derive(Debug)]
pub struct MeshDecimator {
    /// Родитель вершины после схлопывания (сама себе - жива)
    parent: Vec<u32>,
    removed: Vob,
    quadrics: Vec<QuadricMatrix>,
}

impl MeshDecimator {
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            removed: Vob::new(),
            quadrics: Vec::new(),
        }
    }

    /// Упростить меш. Позиции схлопнутых вершин меняются на месте,
    /// возвращается новый индексный буфер.
    pub fn decimate(
        &mut self,
        positions: &mut [[f32; 3]],
        indices: Option<&[u32]>,
        target_reduction: f32,
    ) -> Result<Vec<u32>, DecimateError> {
        let indices = indices.ok_or(DecimateError::NotIndexed)?;
        validate(indices, positions.len(), target_reduction)?;

        let original = positions.len();
        let target = (original as f32 * (1.0 - target_reduction)).floor() as usize;
        let mut vertex_count = referenced_count(indices);
        let mut current: Vec<u32> = indices.to_vec();

        self.parent = (0..original as u32).collect();
        self.removed = Vob::new();
        self.removed.resize(original, false);

        let mut passes = 0;
        while vertex_count > target {
            let collapsed = self.collapse_pass(positions, &current, vertex_count - target);
            current = self.remap_indices(&current);
            vertex_count = referenced_count(&current);
            passes += 1;
            if collapsed == 0 {
                break;
            }
        }

        log::debug!(
            "Decimated {} -> {} vertices, {} -> {} triangles in {} passes",
            original,
            vertex_count,
            indices.len() / 3,
            current.len() / 3,
            passes
        );
        Ok(current)
    }

    /// Один жадный проход (не больше budget схлопываний), возвращает их число
    fn collapse_pass(&mut self, positions: &mut [[f32; 3]], indices: &[u32], budget: usize) -> usize {
        let (edges, vertex_triangles) = build_topology(indices, positions.len());
        self.compute_quadrics(positions, indices, &vertex_triangles);
        let mut topology = PassTopology::new(indices, positions.len(), &edges);

        let mut candidates: Vec<EdgeCandidate> = edges
            .into_keys()
            .map(|(v1, v2)| {
                let mid = midpoint(positions, v1, v2);
                let q = self.quadrics[v1 as usize] + self.quadrics[v2 as usize];
                // + 0.0: -0.0 и 0.0 равны при сортировке
                EdgeCandidate { v1, v2, error: q.error(mid) + 0.0 }
            })
            .collect();
        candidates.sort_by(|a, b| a.error.total_cmp(&b.error));

        let mut collapsed = 0;
        for edge in candidates {
            if collapsed >= budget {
                break;
            }
            if self.is_removed(edge.v1) || self.is_removed(edge.v2) {
                continue;
            }
            if !topology.can_collapse(edge.v1, edge.v2) {
                continue;
            }

            // Граничная вершина остаётся на месте, иначе - середина ребра
            let (keep, lost) = if topology.is_boundary(edge.v2) {
                (edge.v2, edge.v1)
            } else {
                (edge.v1, edge.v2)
            };
            if !topology.is_boundary(keep) {
                let mid = midpoint(positions, edge.v1, edge.v2);
                positions[keep as usize] = mid.into();
            }

            let q = self.quadrics[lost as usize];
            self.quadrics[keep as usize] += q;
            self.removed.set(lost as usize, true);
            self.parent[lost as usize] = keep;
            topology.collapse(keep, lost);

            collapsed += 1;
        }
        collapsed
    }

    fn compute_quadrics(&mut self, positions: &[[f32; 3]], indices: &[u32], vertex_triangles: &[Vec<u32>]) {
        let triangle_quadrics: Vec<QuadricMatrix> = indices
            .chunks_exact(3)
            .map(|tri| {
                QuadricMatrix::from_triangle(
                    Vec3::from(positions[tri[0] as usize]),
                    Vec3::from(positions[tri[1] as usize]),
                    Vec3::from(positions[tri[2] as usize]),
                )
                .unwrap_or(QuadricMatrix::ZERO)
            })
            .collect();

        self.quadrics = vertex_triangles
            .iter()
            .map(|tris| {
                tris.iter()
                    .fold(QuadricMatrix::ZERO, |acc, &t| acc + triangle_quadrics[t as usize])
            })
            .collect();
    }

    #[inline]
    fn is_removed(&self, v: u32) -> bool {
        self.removed.get(v as usize).unwrap_or(false)
    }

    /// Конечная вершина цепочки схлопываний
    fn resolve(&self, mut v: u32) -> u32 {
        while self.parent[v as usize] != v {
            v = self.parent[v as usize];
        }
        v
    }

    fn remap_indices(&self, indices: &[u32]) -> Vec<u32> {
        let mut out = Vec::with_capacity(indices.len());
        for tri in indices.chunks_exact(3) {
            let a = self.resolve(tri[0]);
            let b = self.resolve(tri[1]);
            let c = self.resolve(tri[2]);
            if a == b || b == c || a == c {
                continue;
            }
            out.extend_from_slice(&[a, b, c]);
        }
        out
    }
}

impl Default for MeshDecimator {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(indices: &[u32], vertex_count: usize, target_reduction: f32) -> Result<(), DecimateError> {
    if indices.len() % 3 != 0 {
        return Err(DecimateError::MalformedIndices(indices.len()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(DecimateError::IndexOutOfRange { index, vertex_count });
    }
    if !(0.0..1.0).contains(&target_reduction) {
        return Err(DecimateError::InvalidReduction(target_reduction));
    }
    Ok(())
}

/// Рёбра (min, max) -> число треугольников, и треугольники каждой вершины
fn build_topology(indices: &[u32], vertex_count: usize) -> (BTreeMap<(u32, u32), u32>, Vec<Vec<u32>>) {
    let mut edges: BTreeMap<(u32, u32), u32> = BTreeMap::new();
    let mut vertex_triangles = vec![Vec::new(); vertex_count];

    for (t, tri) in indices.chunks_exact(3).enumerate() {
        for k in 0..3 {
            let a = tri[k];
            let b = tri[(k + 1) % 3];
            *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            vertex_triangles[a as usize].push(t as u32);
        }
    }

    (edges, vertex_triangles)
}

/// Число вершин, на которые ссылаются индексы
fn referenced_count(indices: &[u32]) -> usize {
    indices.iter().collect::<HashSet<_>>().len()
}

#[inline]
fn midpoint(positions: &[[f32; 3]], v1: u32, v2: u32) -> Vec3 {
    (Vec3::from(positions[v1 as usize]) + Vec3::from(positions[v2 as usize])) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Сетка n x n вершин
    fn grid_mesh(n: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
        let mut positions = Vec::new();
        for z in 0..n {
            for x in 0..n {
                positions.push([x as f32, ((x * z) % 3) as f32 * 0.1, z as f32]);
            }
        }
        let mut indices = Vec::new();
        for z in 0..n - 1 {
            for x in 0..n - 1 {
                let i = z * n + x;
                indices.extend_from_slice(&[i, i + n, i + 1, i + 1, i + n, i + n + 1]);
            }
        }
        (positions, indices)
    }

    fn extent(positions: &[[f32; 3]], indices: &[u32]) -> ([f32; 2], [f32; 2]) {
        let mut min = [f32::MAX; 2];
        let mut max = [f32::MIN; 2];
        for &i in indices {
            let p = positions[i as usize];
            min = [min[0].min(p[0]), min[1].min(p[2])];
            max = [max[0].max(p[0]), max[1].max(p[2])];
        }
        (min, max)
    }

    #[test]
    fn test_zero_reduction_keeps_triangles() {
        let (mut positions, indices) = grid_mesh(4);
        let before = positions.clone();
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.0).unwrap();
        assert_eq!(out.len(), indices.len());
        assert_eq!(positions, before);
    }

    #[test]
    fn test_reaches_target_vertex_count() {
        let (mut positions, indices) = grid_mesh(8);
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.3).unwrap();
        // 64 * 0.7 = 44.8
        assert!(referenced_count(&out) <= 44);
        assert!(!out.is_empty());
        assert!(out.len() < indices.len());
    }

    #[test]
    fn test_high_reduction_keeps_outline() {
        // 10 x 10: 36 граничных вершин, цель 100 * 0.4 = 40
        let (mut positions, indices) = grid_mesh(10);
        let before = extent(&positions, &indices);
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.6).unwrap();

        assert!(referenced_count(&out) <= 40);
        assert!(!out.is_empty());
        assert_eq!(extent(&positions, &out), before);
        // Все граничные вершины на месте и используются
        for z in 0..10u32 {
            for x in 0..10u32 {
                if x == 0 || z == 0 || x == 9 || z == 9 {
                    let v = z * 10 + x;
                    assert!(out.contains(&v), "boundary vertex {} dropped", v);
                    assert_eq!(positions[v as usize][0], x as f32);
                    assert_eq!(positions[v as usize][2], z as f32);
                }
            }
        }
    }

    #[test]
    fn test_extreme_reduction_stops_at_outline() {
        let (mut positions, indices) = grid_mesh(8);
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.9).unwrap();
        // Цель 6 недостижима: остаётся контур из 28 вершин
        assert_eq!(referenced_count(&out), 28);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_interior_edge_collapses_to_midpoint() {
        // Две внутренние вершины 0, 1 внутри ромба 2..5
        let mut positions = vec![
            [-0.5, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [-1.5, 0.0, 0.0],
            [0.0, 0.0, -1.0],
            [1.5, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let indices: [u32; 18] = [0, 1, 3, 1, 0, 5, 0, 3, 2, 0, 2, 5, 1, 4, 3, 1, 5, 4];
        // 6 * 0.9 = 5.4 -> одно схлопывание
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.1).unwrap();

        assert_eq!(positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(out.len(), 12);
        assert!(!out.contains(&1));
    }

    #[test]
    fn test_boundary_quad_is_untouched() {
        let mut positions = vec![[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [2.0, 0.0, 0.0], [2.0, 0.0, 2.0]];
        let indices: [u32; 6] = [0, 1, 2, 2, 1, 3];
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.25).unwrap();
        // Диагональ 1-2 соединяет две граничные вершины
        assert_eq!(out, indices.to_vec());
        assert_eq!(positions[1], [0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_no_triangle_is_degenerate() {
        let (mut positions, indices) = grid_mesh(6);
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.7).unwrap();
        for tri in out.chunks_exact(3) {
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
        }
    }

    #[test]
    fn test_no_edge_shared_by_three_triangles() {
        let (mut positions, indices) = grid_mesh(9);
        let out = MeshDecimator::new().decimate(&mut positions, Some(&indices[..]), 0.5).unwrap();
        let (edges, _) = build_topology(&out, positions.len());
        assert!(edges.values().all(|&count| count <= 2));
    }

    #[test]
    fn test_rejects_non_indexed() {
        let mut positions = vec![[0.0; 3]; 3];
        let result = MeshDecimator::new().decimate(&mut positions, None, 0.5);
        assert_eq!(result, Err(DecimateError::NotIndexed));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut positions = vec![[0.0; 3]; 3];
        let mut decimator = MeshDecimator::new();
        assert_eq!(
            decimator.decimate(&mut positions, Some(&[0u32, 1][..]), 0.5),
            Err(DecimateError::MalformedIndices(2))
        );
        assert_eq!(
            decimator.decimate(&mut positions, Some(&[0u32, 1, 5][..]), 0.5),
            Err(DecimateError::IndexOutOfRange { index: 5, vertex_count: 3 })
        );
        assert!(decimator.decimate(&mut positions, Some(&[0u32, 1, 2][..]), 1.0).is_err());
    }
}
